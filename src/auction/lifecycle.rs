// region:    --- Imports
use crate::error::{AuctionError, Result};
use crate::identity::UserRef;
use crate::listing::model::{Listing, ListingId};
use crate::store::SharedAuctionStore;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;
// endregion: --- Imports

// region:    --- Model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuctionState {
    Active,
    /// Terminal
    Closed,
}

impl AuctionState {
    pub fn of(listing: &Listing) -> Self {
        if listing.active {
            AuctionState::Active
        } else {
            AuctionState::Closed
        }
    }
}

/// Result of a closed auction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Outcome {
    NoBids,
    Winner { user: UserRef, amount: Decimal },
}
// endregion: --- Model

// region:    --- Lifecycle
/// Drives the one-way `Active -> Closed` transition and reads the winner.
#[derive(Clone)]
pub struct AuctionLifecycle {
    store: SharedAuctionStore,
}

impl AuctionLifecycle {
    pub fn new(store: SharedAuctionStore) -> Self {
        Self { store }
    }

    /// Closes the auction on behalf of its owner. Closing twice is a no-op.
    pub async fn close_auction(&self, listing_id: ListingId, requester: UserRef) -> Result<Listing> {
        let listing = self.listing(listing_id).await?;
        if !listing.is_owned_by(&requester) {
            return Err(AuctionError::NotOwner);
        }
        if !listing.active {
            info!("{:<12} --> listing {} already closed", "Command", listing_id);
            return Ok(listing);
        }

        let closed = self
            .store
            .close_listing(listing_id)
            .await?
            .ok_or(AuctionError::ListingNotFound(listing_id))?;
        info!("{:<12} --> listing {} closed", "Command", listing_id);
        Ok(closed)
    }

    pub async fn state(&self, listing_id: ListingId) -> Result<AuctionState> {
        Ok(AuctionState::of(&self.listing(listing_id).await?))
    }

    /// Winner of a closed auction: the bidder of the highest bid.
    pub async fn resolve_winner(&self, listing_id: ListingId) -> Result<Outcome> {
        let listing = self.listing(listing_id).await?;
        self.resolve_winner_of(&listing).await
    }

    pub async fn resolve_winner_of(&self, listing: &Listing) -> Result<Outcome> {
        if listing.active {
            return Err(AuctionError::AuctionStillOpen(listing.id));
        }

        Ok(match self.store.highest_bid(listing.id).await? {
            None => Outcome::NoBids,
            Some(bid) => Outcome::Winner {
                user: bid.bidder,
                amount: bid.amount,
            },
        })
    }

    /// `false` for open auctions, never an error for them.
    pub async fn is_winner(&self, listing_id: ListingId, user: UserRef) -> Result<bool> {
        let listing = self.listing(listing_id).await?;
        if listing.active {
            return Ok(false);
        }
        Ok(matches!(
            self.resolve_winner_of(&listing).await?,
            Outcome::Winner { user: winner, .. } if winner == user
        ))
    }

    async fn listing(&self, listing_id: ListingId) -> Result<Listing> {
        self.store
            .get_listing(listing_id)
            .await?
            .ok_or(AuctionError::ListingNotFound(listing_id))
    }
}
// endregion: --- Lifecycle
