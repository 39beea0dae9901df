use super::*;
use crate::database::DatabaseManager;
use crate::query::handlers as q;

/// Postgres-backed store. Atomic operations run in one transaction each.
pub struct PostgresStore {
    db_manager: Arc<DatabaseManager>,
}

impl PostgresStore {
    pub fn new(db_manager: Arc<DatabaseManager>) -> Self {
        Self { db_manager }
    }

    pub fn new_shared(db_manager: Arc<DatabaseManager>) -> SharedAuctionStore {
        Arc::new(Self::new(db_manager))
    }
}

#[async_trait]
impl AuctionStore for PostgresStore {
    async fn create_listing(&self, owner: UserRef, listing: NewListing) -> Result<Listing> {
        q::insert_listing(&self.db_manager, owner, listing).await
    }

    async fn get_listing(&self, id: ListingId) -> Result<Option<Listing>> {
        q::get_listing(&self.db_manager, id).await
    }

    async fn list_listings(&self) -> Result<Vec<Listing>> {
        q::get_all_listings(&self.db_manager).await
    }

    async fn listings_in_category(&self, category: &str) -> Result<Vec<Listing>> {
        q::get_listings_in_category(&self.db_manager, category).await
    }

    async fn categories(&self) -> Result<Vec<String>> {
        q::get_categories(&self.db_manager).await
    }

    async fn update_listing(
        &self,
        id: ListingId,
        update: ListingUpdate,
    ) -> Result<Option<Listing>> {
        q::update_listing(&self.db_manager, id, update).await
    }

    async fn close_listing(&self, id: ListingId) -> Result<Option<Listing>> {
        q::close_listing(&self.db_manager, id).await
    }

    async fn delete_listing(&self, id: ListingId) -> Result<bool> {
        q::delete_listing(&self.db_manager, id).await
    }

    async fn append_bid(&self, id: ListingId, bidder: UserRef, amount: Decimal) -> Result<Bid> {
        q::place_bid(&self.db_manager, id, bidder, amount).await
    }

    async fn bids(&self, id: ListingId) -> Result<Vec<Bid>> {
        q::get_bid_history(&self.db_manager, id).await
    }

    async fn highest_bid(&self, id: ListingId) -> Result<Option<Bid>> {
        q::get_highest_bid(&self.db_manager, id).await
    }

    async fn append_comment(
        &self,
        id: ListingId,
        author: UserRef,
        text: String,
    ) -> Result<Comment> {
        q::insert_comment(&self.db_manager, id, author, text).await
    }

    async fn comments(&self, id: ListingId) -> Result<Vec<Comment>> {
        q::get_comments(&self.db_manager, id).await
    }

    async fn watch(&self, user: UserRef, id: ListingId) -> Result<bool> {
        q::insert_watch(&self.db_manager, user, id).await
    }

    async fn unwatch(&self, user: UserRef, id: ListingId) -> Result<bool> {
        q::delete_watch(&self.db_manager, user, id).await
    }

    async fn watchlist(&self, user: UserRef) -> Result<Vec<Listing>> {
        q::get_watchlist(&self.db_manager, user).await
    }
}
