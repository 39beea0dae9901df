//! Per-user set of followed listings.

use crate::error::Result;
use crate::identity::UserRef;
use crate::listing::model::{Listing, ListingId};
use crate::store::SharedAuctionStore;
use serde::Serialize;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WatchOutcome {
    Added,
    AlreadyWatched,
}

impl WatchOutcome {
    pub fn message(&self) -> &'static str {
        match self {
            WatchOutcome::Added => "Added to watchlist",
            WatchOutcome::AlreadyWatched => "Already added to watchlist",
        }
    }
}

#[derive(Clone)]
pub struct WatchlistSet {
    store: SharedAuctionStore,
}

impl WatchlistSet {
    pub fn new(store: SharedAuctionStore) -> Self {
        Self { store }
    }

    /// Adding a listing twice leaves the set unchanged and reports it.
    pub async fn add(&self, user: UserRef, listing_id: ListingId) -> Result<WatchOutcome> {
        let outcome = if self.store.watch(user, listing_id).await? {
            WatchOutcome::Added
        } else {
            WatchOutcome::AlreadyWatched
        };
        info!(
            "{:<12} --> {} watch listing {}: {:?}",
            "Command", user, listing_id, outcome
        );
        Ok(outcome)
    }

    /// Removing an absent entry is a no-op.
    pub async fn remove(&self, user: UserRef, listing_id: ListingId) -> Result<()> {
        if self.store.unwatch(user, listing_id).await? {
            info!("{:<12} --> {} unwatch listing {}", "Command", user, listing_id);
        }
        Ok(())
    }

    pub async fn list(&self, user: UserRef) -> Result<Vec<Listing>> {
        self.store.watchlist(user).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AuctionError;
    use crate::listing::model::NewListing;
    use crate::store::InMemoryStore;

    async fn setup() -> (WatchlistSet, SharedAuctionStore, ListingId) {
        let store = InMemoryStore::new_shared();
        let listing = store
            .create_listing(
                UserRef(1),
                NewListing {
                    title: "Lamp".to_string(),
                    description: String::new(),
                    starting_price: "5".parse().unwrap(),
                    category: "Home".to_string(),
                    image_ref: None,
                },
            )
            .await
            .unwrap();
        (WatchlistSet::new(store.clone()), store, listing.id)
    }

    #[tokio::test]
    async fn add_is_idempotent() {
        let (watchlist, _, id) = setup().await;
        let user = UserRef(2);

        assert_eq!(watchlist.add(user, id).await.unwrap(), WatchOutcome::Added);
        assert_eq!(
            watchlist.add(user, id).await.unwrap(),
            WatchOutcome::AlreadyWatched
        );
        assert_eq!(watchlist.list(user).await.unwrap().len(), 1);
        assert!(watchlist.list(UserRef(3)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn remove_absent_entry_is_noop() {
        let (watchlist, _, id) = setup().await;
        let user = UserRef(2);

        watchlist.remove(user, id).await.unwrap();
        watchlist.remove(user, 999).await.unwrap();

        watchlist.add(user, id).await.unwrap();
        watchlist.remove(user, id).await.unwrap();
        assert!(watchlist.list(user).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn unknown_listing_cannot_be_watched() {
        let (watchlist, _, _) = setup().await;
        assert!(matches!(
            watchlist.add(UserRef(2), 42).await,
            Err(AuctionError::ListingNotFound(42))
        ));
    }

    #[tokio::test]
    async fn closed_listings_stay_watched() {
        let (watchlist, store, id) = setup().await;
        watchlist.add(UserRef(2), id).await.unwrap();
        store.close_listing(id).await.unwrap();

        let watched = watchlist.list(UserRef(2)).await.unwrap();
        assert_eq!(watched.len(), 1);
        assert!(!watched[0].active);
    }
}
