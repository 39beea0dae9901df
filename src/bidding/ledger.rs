// region:    --- Imports
use super::model::{self, Bid};
use crate::error::{AuctionError, Result};
use crate::identity::UserRef;
use crate::listing::model::{Listing, ListingId};
use crate::store::SharedAuctionStore;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{info, warn};
// endregion: --- Imports

/// Bid list with the price it implies.
#[derive(Debug, Clone, Serialize)]
pub struct BidHistory {
    pub current_price: Decimal,
    pub bids: Vec<Bid>,
}

/// Append-only bid record per listing.
///
/// Validation and append happen in one store call; the ledger itself keeps
/// no state between requests.
#[derive(Clone)]
pub struct BidLedger {
    store: SharedAuctionStore,
}

impl BidLedger {
    pub fn new(store: SharedAuctionStore) -> Self {
        Self { store }
    }

    pub async fn current_price(&self, listing_id: ListingId) -> Result<Decimal> {
        let listing = self.listing(listing_id).await?;
        self.current_price_of(&listing).await
    }

    /// Current price for a listing that was already loaded.
    pub async fn current_price_of(&self, listing: &Listing) -> Result<Decimal> {
        let highest = self.store.highest_bid(listing.id).await?;
        Ok(model::current_price(
            listing,
            highest.map(|bid| bid.amount),
        ))
    }

    pub async fn place_bid(
        &self,
        listing_id: ListingId,
        bidder: UserRef,
        amount: Decimal,
    ) -> Result<Bid> {
        info!(
            "{:<12} --> place bid listing: {}, bidder: {}, amount: {}",
            "Command", listing_id, bidder, amount
        );
        match self.store.append_bid(listing_id, bidder, amount).await {
            Ok(bid) => {
                info!(
                    "{:<12} --> bid {} accepted, current price {}",
                    "Command", bid.id, bid.amount
                );
                Ok(bid)
            }
            Err(e @ (AuctionError::BidTooLow { .. } | AuctionError::AuctionClosed(_))) => {
                warn!("{:<12} --> bid rejected: {}", "Command", e);
                Err(e)
            }
            Err(e) => Err(e),
        }
    }

    /// Accepted bids in acceptance order, which is also increasing amount.
    pub async fn bids(&self, listing_id: ListingId) -> Result<Vec<Bid>> {
        self.listing(listing_id).await?;
        self.store.bids(listing_id).await
    }

    /// The price is taken from the same snapshot as the bids.
    pub async fn history(&self, listing_id: ListingId) -> Result<BidHistory> {
        let listing = self.listing(listing_id).await?;
        let bids = self.store.bids(listing_id).await?;
        let current_price = model::current_price(&listing, bids.last().map(|bid| bid.amount));
        Ok(BidHistory {
            current_price,
            bids,
        })
    }

    pub async fn highest_bid(&self, listing_id: ListingId) -> Result<Option<Bid>> {
        self.store.highest_bid(listing_id).await
    }

    async fn listing(&self, listing_id: ListingId) -> Result<Listing> {
        self.store
            .get_listing(listing_id)
            .await?
            .ok_or(AuctionError::ListingNotFound(listing_id))
    }
}
