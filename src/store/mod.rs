//! Persistence seam for listings, bids, comments and watchlists.
//!
//! Operations that must be atomic (bid append, listing edits, cascade
//! delete) are single trait methods so each backend can run them under its
//! own transaction or lock.

// region:    --- Imports
use crate::bidding::model::Bid;
use crate::comment::Comment;
use crate::error::Result;
use crate::identity::UserRef;
use crate::listing::model::{Listing, ListingId, ListingUpdate, NewListing};
use async_trait::async_trait;
use rust_decimal::Decimal;
use std::sync::Arc;
// endregion: --- Imports

mod memory;
mod postgres;

pub use self::memory::InMemoryStore;
pub use self::postgres::PostgresStore;

#[async_trait]
pub trait AuctionStore: Send + Sync {
    // -- Listings
    async fn create_listing(&self, owner: UserRef, listing: NewListing) -> Result<Listing>;
    async fn get_listing(&self, id: ListingId) -> Result<Option<Listing>>;
    async fn list_listings(&self) -> Result<Vec<Listing>>;
    async fn listings_in_category(&self, category: &str) -> Result<Vec<Listing>>;
    async fn categories(&self) -> Result<Vec<String>>;

    /// Applies `update` to an active listing unless it changes the starting
    /// price of a listing that already has bids. Returns `None` for unknown
    /// listings and `AuctionClosed` for closed ones.
    async fn update_listing(&self, id: ListingId, update: ListingUpdate)
        -> Result<Option<Listing>>;

    /// Sets `active = false`. Repeating it is a no-op.
    async fn close_listing(&self, id: ListingId) -> Result<Option<Listing>>;

    /// Removes the listing with its bids, comments and watchlist entries.
    async fn delete_listing(&self, id: ListingId) -> Result<bool>;

    // -- Bids
    /// Atomic compare-and-append of a bid.
    async fn append_bid(&self, id: ListingId, bidder: UserRef, amount: Decimal) -> Result<Bid>;
    async fn bids(&self, id: ListingId) -> Result<Vec<Bid>>;
    async fn highest_bid(&self, id: ListingId) -> Result<Option<Bid>>;

    // -- Comments
    async fn append_comment(&self, id: ListingId, author: UserRef, text: String)
        -> Result<Comment>;
    async fn comments(&self, id: ListingId) -> Result<Vec<Comment>>;

    // -- Watchlist
    /// Returns `false` when the pair was already present.
    async fn watch(&self, user: UserRef, id: ListingId) -> Result<bool>;
    /// Returns `false` when the pair was absent.
    async fn unwatch(&self, user: UserRef, id: ListingId) -> Result<bool>;
    async fn watchlist(&self, user: UserRef) -> Result<Vec<Listing>>;
}

pub type SharedAuctionStore = Arc<dyn AuctionStore>;
