use super::*;
use crate::bidding::model::check_bid;
use crate::comment::CommentId;
use crate::error::AuctionError;
use chrono::Utc;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{Mutex, MutexGuard};
use tracing::debug;

#[derive(Debug, Default)]
struct State {
    next_listing_id: ListingId,
    next_bid_id: i64,
    next_comment_id: CommentId,
    listings: BTreeMap<ListingId, Listing>,
    bids: BTreeMap<ListingId, Vec<Bid>>,
    comments: BTreeMap<ListingId, Vec<Comment>>,
    watchlists: HashMap<UserRef, BTreeSet<ListingId>>,
}

impl State {
    fn highest_amount(&self, id: ListingId) -> Option<Decimal> {
        self.bids
            .get(&id)
            .and_then(|bids| bids.iter().map(|bid| bid.amount).max())
    }
}

/// Fake in-memory store.
///
/// Every operation runs under one mutex, which makes each trait method
/// atomic. Useful for unit-tests and for running without a database.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    state: Mutex<State>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_shared() -> SharedAuctionStore {
        Arc::new(Self::new())
    }

    fn lock(&self) -> Result<MutexGuard<'_, State>> {
        self.state
            .lock()
            .map_err(|_e| AuctionError::Internal("mutex poisoned".to_string()))
    }
}

#[async_trait]
impl AuctionStore for InMemoryStore {
    async fn create_listing(&self, owner: UserRef, listing: NewListing) -> Result<Listing> {
        let mut state = self.lock()?;
        state.next_listing_id += 1;
        let listing = Listing {
            id: state.next_listing_id,
            title: listing.title,
            description: listing.description,
            starting_price: listing.starting_price,
            category: listing.category,
            image_ref: listing.image_ref,
            owner,
            active: true,
            created_at: Utc::now(),
        };
        state.listings.insert(listing.id, listing.clone());
        Ok(listing)
    }

    async fn get_listing(&self, id: ListingId) -> Result<Option<Listing>> {
        Ok(self.lock()?.listings.get(&id).cloned())
    }

    async fn list_listings(&self) -> Result<Vec<Listing>> {
        Ok(self.lock()?.listings.values().cloned().collect())
    }

    async fn listings_in_category(&self, category: &str) -> Result<Vec<Listing>> {
        Ok(self
            .lock()?
            .listings
            .values()
            .filter(|listing| listing.category == category)
            .cloned()
            .collect())
    }

    async fn categories(&self) -> Result<Vec<String>> {
        let categories: BTreeSet<String> = self
            .lock()?
            .listings
            .values()
            .filter(|listing| !listing.category.is_empty())
            .map(|listing| listing.category.clone())
            .collect();
        Ok(categories.into_iter().collect())
    }

    async fn update_listing(
        &self,
        id: ListingId,
        update: ListingUpdate,
    ) -> Result<Option<Listing>> {
        let mut state = self.lock()?;
        let has_bids = state.bids.get(&id).is_some_and(|bids| !bids.is_empty());
        let Some(listing) = state.listings.get_mut(&id) else {
            return Ok(None);
        };
        if !listing.active {
            return Err(AuctionError::AuctionClosed(id));
        }

        if let Some(price) = update.starting_price {
            if has_bids && price != listing.starting_price {
                return Err(AuctionError::StartingPriceLocked(id));
            }
        }
        update.apply_to(listing);
        Ok(Some(listing.clone()))
    }

    async fn close_listing(&self, id: ListingId) -> Result<Option<Listing>> {
        let mut state = self.lock()?;
        Ok(state.listings.get_mut(&id).map(|listing| {
            listing.active = false;
            listing.clone()
        }))
    }

    async fn delete_listing(&self, id: ListingId) -> Result<bool> {
        let mut state = self.lock()?;
        if state.listings.remove(&id).is_none() {
            return Ok(false);
        }
        state.bids.remove(&id);
        state.comments.remove(&id);
        for watched in state.watchlists.values_mut() {
            watched.remove(&id);
        }
        debug!("{:<12} --> listing {} deleted with dependents", "Store", id);
        Ok(true)
    }

    async fn append_bid(&self, id: ListingId, bidder: UserRef, amount: Decimal) -> Result<Bid> {
        let mut state = self.lock()?;
        let listing = state
            .listings
            .get(&id)
            .ok_or(AuctionError::ListingNotFound(id))?;
        let amount = check_bid(listing, state.highest_amount(id), amount)?;

        state.next_bid_id += 1;
        let bid = Bid {
            id: state.next_bid_id,
            listing_id: id,
            bidder,
            amount,
            placed_at: Utc::now(),
        };
        state.bids.entry(id).or_default().push(bid.clone());
        Ok(bid)
    }

    async fn bids(&self, id: ListingId) -> Result<Vec<Bid>> {
        Ok(self.lock()?.bids.get(&id).cloned().unwrap_or_default())
    }

    async fn highest_bid(&self, id: ListingId) -> Result<Option<Bid>> {
        Ok(self
            .lock()?
            .bids
            .get(&id)
            .and_then(|bids| bids.iter().max_by_key(|bid| bid.amount).cloned()))
    }

    async fn append_comment(
        &self,
        id: ListingId,
        author: UserRef,
        text: String,
    ) -> Result<Comment> {
        let mut state = self.lock()?;
        if !state.listings.contains_key(&id) {
            return Err(AuctionError::ListingNotFound(id));
        }

        state.next_comment_id += 1;
        let comment = Comment {
            id: state.next_comment_id,
            listing_id: id,
            author,
            text,
            created_at: Utc::now(),
        };
        state.comments.entry(id).or_default().push(comment.clone());
        Ok(comment)
    }

    async fn comments(&self, id: ListingId) -> Result<Vec<Comment>> {
        Ok(self.lock()?.comments.get(&id).cloned().unwrap_or_default())
    }

    async fn watch(&self, user: UserRef, id: ListingId) -> Result<bool> {
        let mut state = self.lock()?;
        if !state.listings.contains_key(&id) {
            return Err(AuctionError::ListingNotFound(id));
        }
        Ok(state.watchlists.entry(user).or_default().insert(id))
    }

    async fn unwatch(&self, user: UserRef, id: ListingId) -> Result<bool> {
        Ok(self
            .lock()?
            .watchlists
            .get_mut(&user)
            .is_some_and(|watched| watched.remove(&id)))
    }

    async fn watchlist(&self, user: UserRef) -> Result<Vec<Listing>> {
        let state = self.lock()?;
        Ok(state
            .watchlists
            .get(&user)
            .map(|watched| {
                watched
                    .iter()
                    .filter_map(|id| state.listings.get(id).cloned())
                    .collect()
            })
            .unwrap_or_default())
    }
}
