pub mod model;

// region:    --- Imports
use self::model::{Listing, ListingId, ListingSummary, ListingUpdate, NewListing};
use crate::auction::lifecycle::{AuctionLifecycle, Outcome};
use crate::bidding::ledger::BidLedger;
use crate::comment::Comment;
use crate::error::{AuctionError, Result};
use crate::identity::UserRef;
use crate::store::SharedAuctionStore;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::info;
// endregion: --- Imports

/// Everything a listing page shows.
#[derive(Debug, Clone, Serialize)]
pub struct ListingDetail {
    #[serde(flatten)]
    pub listing: Listing,
    pub current_price: Decimal,
    pub bid_count: usize,
    pub comments: Vec<Comment>,
    /// Only set once the auction is closed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<Outcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub you_won: Option<bool>,
}

/// Listing creation, browsing, edits and removal.
#[derive(Clone)]
pub struct ListingCatalog {
    store: SharedAuctionStore,
    ledger: BidLedger,
    lifecycle: AuctionLifecycle,
}

impl ListingCatalog {
    pub fn new(store: SharedAuctionStore) -> Self {
        Self {
            ledger: BidLedger::new(store.clone()),
            lifecycle: AuctionLifecycle::new(store.clone()),
            store,
        }
    }

    pub async fn create(&self, owner: UserRef, listing: NewListing) -> Result<Listing> {
        let listing = self.store.create_listing(owner, listing.validated()?).await?;
        info!(
            "{:<12} --> listing {} created by {}",
            "Command", listing.id, owner
        );
        Ok(listing)
    }

    pub async fn get(&self, id: ListingId) -> Result<Listing> {
        self.store
            .get_listing(id)
            .await?
            .ok_or(AuctionError::ListingNotFound(id))
    }

    pub async fn listings(&self) -> Result<Vec<ListingSummary>> {
        let listings = self.store.list_listings().await?;
        self.summarize(listings).await
    }

    pub async fn categories(&self) -> Result<Vec<String>> {
        self.store.categories().await
    }

    pub async fn in_category(&self, category: &str) -> Result<Vec<ListingSummary>> {
        let listings = self.store.listings_in_category(category.trim()).await?;
        self.summarize(listings).await
    }

    pub async fn detail(&self, id: ListingId, viewer: Option<UserRef>) -> Result<ListingDetail> {
        let listing = self.get(id).await?;
        let bids = self.store.bids(id).await?;
        let current_price = self.ledger.current_price_of(&listing).await?;
        let comments = self.store.comments(id).await?;

        let outcome = if listing.active {
            None
        } else {
            Some(self.lifecycle.resolve_winner_of(&listing).await?)
        };
        let you_won = match (&outcome, viewer) {
            (Some(Outcome::Winner { user, .. }), Some(viewer)) => Some(*user == viewer),
            (Some(Outcome::NoBids), Some(_)) => Some(false),
            _ => None,
        };

        Ok(ListingDetail {
            listing,
            current_price,
            bid_count: bids.len(),
            comments,
            outcome,
            you_won,
        })
    }

    /// Owner edit of an open listing.
    pub async fn update(
        &self,
        id: ListingId,
        requester: UserRef,
        update: ListingUpdate,
    ) -> Result<Listing> {
        let listing = self.get(id).await?;
        if !listing.is_owned_by(&requester) {
            return Err(AuctionError::NotOwner);
        }
        if !listing.active {
            return Err(AuctionError::AuctionClosed(id));
        }
        let update = update.validated()?;
        if update.is_empty() {
            return Err(AuctionError::InvalidInput("nothing to update".to_string()));
        }

        let updated = self
            .store
            .update_listing(id, update)
            .await?
            .ok_or(AuctionError::ListingNotFound(id))?;
        info!("{:<12} --> listing {} updated", "Command", id);
        Ok(updated)
    }

    /// Owner removal together with bids, comments and watchlist entries.
    pub async fn delete(&self, id: ListingId, requester: UserRef) -> Result<()> {
        let listing = self.get(id).await?;
        if !listing.is_owned_by(&requester) {
            return Err(AuctionError::NotOwner);
        }
        if !self.store.delete_listing(id).await? {
            return Err(AuctionError::ListingNotFound(id));
        }
        info!("{:<12} --> listing {} deleted", "Command", id);
        Ok(())
    }

    async fn summarize(&self, listings: Vec<Listing>) -> Result<Vec<ListingSummary>> {
        let mut summaries = Vec::with_capacity(listings.len());
        for listing in listings {
            let current_price = self.ledger.current_price_of(&listing).await?;
            summaries.push(ListingSummary {
                listing,
                current_price,
            });
        }
        Ok(summaries)
    }
}
