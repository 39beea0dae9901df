// region:    --- Imports
use auction_listings::config::Config;
use auction_listings::database::DatabaseManager;
use auction_listings::handlers::{self, AppState};
use auction_listings::identity::{InMemoryIdentityStore, PostgresIdentityStore};
use auction_listings::store::{InMemoryStore, PostgresStore};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info, warn};
// endregion: --- Imports

// region:    --- Main
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .without_time()
        .with_target(false)
        .init();

    let config = Config::from_env()?;

    let state = match &config.database {
        Some(db_config) => {
            let db_manager = Arc::new(DatabaseManager::new(db_config).await?);

            if db_config.initialize {
                if let Err(e) = db_manager.initialize_database().await {
                    error!("{:<12} --> database initialization failed: {:?}", "Main", e);
                    return Err(e.into());
                }
                info!("{:<12} --> database initialized", "Main");
            }

            AppState::new(
                PostgresStore::new_shared(Arc::clone(&db_manager)),
                Arc::new(PostgresIdentityStore::new(db_manager)),
            )
        }
        None => {
            warn!(
                "{:<12} --> DATABASE_URL not set, using in-memory store",
                "Main"
            );
            AppState::new(
                InMemoryStore::new_shared(),
                Arc::new(InMemoryIdentityStore::new()),
            )
        }
    };

    let routes_all = handlers::routes(state);

    let listener = TcpListener::bind(config.bind_addr).await?;
    info!(
        "{:<12} --> Web Server: Listening on {}",
        "Main",
        listener.local_addr()?
    );

    if let Err(err) = axum::serve(listener, routes_all.into_make_service()).await {
        error!("{:<12} --> Server error: {}", "Main", err);
    }
    Ok(())
}
// endregion: --- Main
