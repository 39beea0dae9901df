use crate::error::{AuctionError, Result};
use crate::identity::UserRef;
use crate::listing::model::{validate_price, Listing, ListingId};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

pub type BidId = i64;

// Bid model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Bid {
    pub id: BidId,
    pub listing_id: ListingId,
    pub bidder: UserRef,
    pub amount: Decimal,
    pub placed_at: DateTime<Utc>,
}

/// Highest bid amount, or the starting price when nobody has bid yet.
pub fn current_price(listing: &Listing, highest_bid: Option<Decimal>) -> Decimal {
    highest_bid.unwrap_or(listing.starting_price)
}

/// Acceptance rule for a new bid. Returns the amount to store.
///
/// The closed check comes first, then the price comparison, and only then
/// the column format of the amount.
///
/// Stores call this while holding the listing exclusively, so the price it
/// compares against cannot move before the bid is appended.
pub fn check_bid(
    listing: &Listing,
    highest_bid: Option<Decimal>,
    amount: Decimal,
) -> Result<Decimal> {
    if !listing.active {
        return Err(AuctionError::AuctionClosed(listing.id));
    }

    let current_price = current_price(listing, highest_bid);
    if amount <= current_price {
        return Err(AuctionError::BidTooLow {
            amount,
            current_price,
        });
    }
    validate_price(amount)
}
