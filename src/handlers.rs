// region:    --- Imports
use crate::auction::lifecycle::AuctionLifecycle;
use crate::bidding::ledger::BidLedger;
use crate::comment::CommentLog;
use crate::error::Result;
use crate::identity::{CurrentUser, MaybeUser, SharedIdentityStore};
use crate::listing::model::{ListingId, ListingUpdate, NewListing};
use crate::listing::ListingCatalog;
use crate::store::SharedAuctionStore;
use crate::watchlist::WatchlistSet;
use axum::extract::{DefaultBodyLimit, FromRef, Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;
// endregion: --- Imports

// region:    --- State
#[derive(Clone)]
pub struct AppState {
    pub identity: SharedIdentityStore,
    pub catalog: ListingCatalog,
    pub ledger: BidLedger,
    pub lifecycle: AuctionLifecycle,
    pub comments: CommentLog,
    pub watchlist: WatchlistSet,
}

impl AppState {
    pub fn new(store: SharedAuctionStore, identity: SharedIdentityStore) -> Self {
        Self {
            identity,
            catalog: ListingCatalog::new(store.clone()),
            ledger: BidLedger::new(store.clone()),
            lifecycle: AuctionLifecycle::new(store.clone()),
            comments: CommentLog::new(store.clone()),
            watchlist: WatchlistSet::new(store),
        }
    }
}

impl FromRef<AppState> for SharedIdentityStore {
    fn from_ref(state: &AppState) -> Self {
        state.identity.clone()
    }
}
// endregion: --- State

// region:    --- Routes
pub fn routes(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/listings", get(handle_get_listings).post(handle_create_listing))
        .route(
            "/listings/:id",
            get(handle_get_listing)
                .patch(handle_update_listing)
                .delete(handle_delete_listing),
        )
        .route(
            "/listings/:id/bids",
            get(handle_get_bid_history).post(handle_place_bid),
        )
        .route("/listings/:id/close", post(handle_close_auction))
        .route("/listings/:id/winner", get(handle_get_winner))
        .route(
            "/listings/:id/comments",
            get(handle_get_comments).post(handle_post_comment),
        )
        .route("/watchlist", get(handle_get_watchlist).post(handle_watch))
        .route("/watchlist/:id", axum::routing::delete(handle_unwatch))
        .route("/categories", get(handle_get_categories))
        .route("/categories/:name", get(handle_get_category))
        .layer(cors)
        .layer(DefaultBodyLimit::max(1024 * 1024))
        .with_state(state)
}
// endregion: --- Routes

// region:    --- Request Bodies
#[derive(Debug, Deserialize)]
pub struct PlaceBidRequest {
    pub amount: Decimal,
}

#[derive(Debug, Deserialize)]
pub struct CommentRequest {
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct WatchRequest {
    pub listing_id: ListingId,
}
// endregion: --- Request Bodies

// region:    --- Command Handlers

pub async fn handle_create_listing(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(listing): Json<NewListing>,
) -> Result<impl IntoResponse> {
    info!("{:<12} --> create listing by {}", "Handler", user);
    let listing = state.catalog.create(user, listing).await?;
    Ok((StatusCode::CREATED, Json(listing)))
}

pub async fn handle_update_listing(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<ListingId>,
    Json(update): Json<ListingUpdate>,
) -> Result<impl IntoResponse> {
    info!("{:<12} --> update listing id: {}", "Handler", id);
    Ok(Json(state.catalog.update(id, user, update).await?))
}

pub async fn handle_delete_listing(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<ListingId>,
) -> Result<impl IntoResponse> {
    info!("{:<12} --> delete listing id: {}", "Handler", id);
    state.catalog.delete(id, user).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn handle_place_bid(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<ListingId>,
    Json(req): Json<PlaceBidRequest>,
) -> Result<impl IntoResponse> {
    info!("{:<12} --> place bid listing id: {}", "Handler", id);
    let bid = state.ledger.place_bid(id, user, req.amount).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Bid placed",
            "bid": bid,
            "current_price": bid.amount,
        })),
    ))
}

pub async fn handle_close_auction(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<ListingId>,
) -> Result<impl IntoResponse> {
    info!("{:<12} --> close auction listing id: {}", "Handler", id);
    let listing = state.lifecycle.close_auction(id, user).await?;
    let outcome = state.lifecycle.resolve_winner_of(&listing).await?;
    Ok(Json(json!({
        "listing": listing,
        "outcome": outcome,
    })))
}

pub async fn handle_post_comment(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<ListingId>,
    Json(req): Json<CommentRequest>,
) -> Result<impl IntoResponse> {
    info!("{:<12} --> post comment listing id: {}", "Handler", id);
    let comment = state.comments.post(id, user, &req.text).await?;
    Ok((StatusCode::CREATED, Json(comment)))
}

pub async fn handle_watch(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(req): Json<WatchRequest>,
) -> Result<impl IntoResponse> {
    info!("{:<12} --> watch listing id: {}", "Handler", req.listing_id);
    let outcome = state.watchlist.add(user, req.listing_id).await?;
    Ok(Json(json!({
        "outcome": outcome,
        "message": outcome.message(),
    })))
}

pub async fn handle_unwatch(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<ListingId>,
) -> Result<impl IntoResponse> {
    info!("{:<12} --> unwatch listing id: {}", "Handler", id);
    state.watchlist.remove(user, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// endregion: --- Command Handlers

// region:    --- Query Handlers

pub async fn handle_get_listings(State(state): State<AppState>) -> Result<impl IntoResponse> {
    info!("{:<12} --> get all listings", "Handler");
    Ok(Json(state.catalog.listings().await?))
}

pub async fn handle_get_listing(
    State(state): State<AppState>,
    MaybeUser(viewer): MaybeUser,
    Path(id): Path<ListingId>,
) -> Result<impl IntoResponse> {
    info!("{:<12} --> get listing id: {}", "Handler", id);
    Ok(Json(state.catalog.detail(id, viewer).await?))
}

pub async fn handle_get_bid_history(
    State(state): State<AppState>,
    Path(id): Path<ListingId>,
) -> Result<impl IntoResponse> {
    info!("{:<12} --> get bid history id: {}", "Handler", id);
    Ok(Json(state.ledger.history(id).await?))
}

pub async fn handle_get_winner(
    State(state): State<AppState>,
    MaybeUser(viewer): MaybeUser,
    Path(id): Path<ListingId>,
) -> Result<impl IntoResponse> {
    info!("{:<12} --> get winner id: {}", "Handler", id);
    let outcome = state.lifecycle.resolve_winner(id).await?;
    let mut body = json!({ "result": outcome });
    if let Some(user) = viewer {
        body["you_won"] = json!(state.lifecycle.is_winner(id, user).await?);
    }
    Ok(Json(body))
}

pub async fn handle_get_comments(
    State(state): State<AppState>,
    Path(id): Path<ListingId>,
) -> Result<impl IntoResponse> {
    info!("{:<12} --> get comments id: {}", "Handler", id);
    Ok(Json(state.comments.list(id).await?))
}

pub async fn handle_get_watchlist(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<impl IntoResponse> {
    info!("{:<12} --> get watchlist of {}", "Handler", user);
    Ok(Json(state.watchlist.list(user).await?))
}

pub async fn handle_get_categories(State(state): State<AppState>) -> Result<impl IntoResponse> {
    info!("{:<12} --> get categories", "Handler");
    Ok(Json(state.catalog.categories().await?))
}

pub async fn handle_get_category(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<impl IntoResponse> {
    info!("{:<12} --> get category: {}", "Handler", name);
    Ok(Json(state.catalog.in_category(&name).await?))
}

// endregion: --- Query Handlers
