// region:    --- Imports
use super::queries;
use crate::bidding::model::{check_bid, Bid};
use crate::comment::Comment;
use crate::database::DatabaseManager;
use crate::error::{AuctionError, Result};
use crate::identity::UserRef;
use crate::listing::model::{Listing, ListingId, ListingUpdate, NewListing};
use rust_decimal::Decimal;
use tracing::{debug, info};

// endregion: --- Imports

// region:    --- Listing Queries

/// Insert a listing owned by `owner`
pub async fn insert_listing(
    db_manager: &DatabaseManager,
    owner: UserRef,
    listing: NewListing,
) -> Result<Listing> {
    info!("{:<12} --> insert listing owner: {}", "Query", owner);
    let listing = sqlx::query_as::<_, Listing>(queries::INSERT_LISTING)
        .bind(listing.title)
        .bind(listing.description)
        .bind(listing.starting_price)
        .bind(listing.category)
        .bind(listing.image_ref)
        .bind(owner)
        .fetch_one(db_manager.pool())
        .await?;
    Ok(listing)
}

/// Listing by id
pub async fn get_listing(db_manager: &DatabaseManager, id: ListingId) -> Result<Option<Listing>> {
    info!("{:<12} --> get listing id: {}", "Query", id);
    let listing = sqlx::query_as::<_, Listing>(queries::GET_LISTING)
        .bind(id)
        .fetch_optional(db_manager.pool())
        .await?;
    Ok(listing)
}

/// All listings
pub async fn get_all_listings(db_manager: &DatabaseManager) -> Result<Vec<Listing>> {
    info!("{:<12} --> get all listings", "Query");
    let listings = sqlx::query_as::<_, Listing>(queries::GET_ALL_LISTINGS)
        .fetch_all(db_manager.pool())
        .await?;
    Ok(listings)
}

/// Listings tagged with `category`
pub async fn get_listings_in_category(
    db_manager: &DatabaseManager,
    category: &str,
) -> Result<Vec<Listing>> {
    info!("{:<12} --> get listings in category: {}", "Query", category);
    let listings = sqlx::query_as::<_, Listing>(queries::GET_LISTINGS_IN_CATEGORY)
        .bind(category)
        .fetch_all(db_manager.pool())
        .await?;
    Ok(listings)
}

/// Distinct non-empty categories
pub async fn get_categories(db_manager: &DatabaseManager) -> Result<Vec<String>> {
    info!("{:<12} --> get categories", "Query");
    let categories = sqlx::query_scalar::<_, String>(queries::GET_CATEGORIES)
        .fetch_all(db_manager.pool())
        .await?;
    Ok(categories)
}

/// Locks the listing, rejects closed ones, checks the starting price rule
/// and rewrites it.
pub async fn update_listing(
    db_manager: &DatabaseManager,
    id: ListingId,
    update: ListingUpdate,
) -> Result<Option<Listing>> {
    info!("{:<12} --> update listing id: {}", "Query", id);
    db_manager
        .transaction(move |tx| {
            Box::pin(async move {
                let Some(mut listing) =
                    sqlx::query_as::<_, Listing>(queries::GET_LISTING_FOR_UPDATE)
                        .bind(id)
                        .fetch_optional(&mut **tx)
                        .await?
                else {
                    return Ok(None);
                };
                if !listing.active {
                    return Err(AuctionError::AuctionClosed(id));
                }

                if let Some(price) = update.starting_price {
                    let bid_count = sqlx::query_scalar::<_, i64>(queries::COUNT_BIDS)
                        .bind(id)
                        .fetch_one(&mut **tx)
                        .await?;
                    if bid_count > 0 && price != listing.starting_price {
                        return Err(AuctionError::StartingPriceLocked(id));
                    }
                }
                update.apply_to(&mut listing);

                let listing = sqlx::query_as::<_, Listing>(queries::UPDATE_LISTING)
                    .bind(id)
                    .bind(listing.title)
                    .bind(listing.description)
                    .bind(listing.category)
                    .bind(listing.image_ref)
                    .bind(listing.starting_price)
                    .fetch_one(&mut **tx)
                    .await?;
                Ok::<_, AuctionError>(Some(listing))
            })
        })
        .await
}

/// Active -> Closed
pub async fn close_listing(db_manager: &DatabaseManager, id: ListingId) -> Result<Option<Listing>> {
    info!("{:<12} --> close listing id: {}", "Query", id);
    let listing = sqlx::query_as::<_, Listing>(queries::CLOSE_LISTING)
        .bind(id)
        .fetch_optional(db_manager.pool())
        .await?;
    Ok(listing)
}

/// Deletes the listing's bids, comments and watchers, then the listing.
pub async fn delete_listing(db_manager: &DatabaseManager, id: ListingId) -> Result<bool> {
    info!("{:<12} --> delete listing id: {}", "Query", id);
    db_manager
        .transaction(move |tx| {
            Box::pin(async move {
                let locked = sqlx::query_as::<_, Listing>(queries::GET_LISTING_FOR_UPDATE)
                    .bind(id)
                    .fetch_optional(&mut **tx)
                    .await?;
                if locked.is_none() {
                    return Ok(false);
                }

                for dependents in [
                    queries::DELETE_LISTING_BIDS,
                    queries::DELETE_LISTING_COMMENTS,
                    queries::DELETE_LISTING_WATCHERS,
                ] {
                    let removed = sqlx::query(dependents)
                        .bind(id)
                        .execute(&mut **tx)
                        .await?
                        .rows_affected();
                    debug!("{:<12} --> cascade removed {} rows", "Query", removed);
                }

                sqlx::query(queries::DELETE_LISTING)
                    .bind(id)
                    .execute(&mut **tx)
                    .await?;
                Ok::<_, AuctionError>(true)
            })
        })
        .await
}

// endregion: --- Listing Queries

// region:    --- Bid Queries

/// Atomic bid append
///
/// The listing row stays locked from the price check until commit, so two
/// bids on the same listing are serialized.
pub async fn place_bid(
    db_manager: &DatabaseManager,
    id: ListingId,
    bidder: UserRef,
    amount: Decimal,
) -> Result<Bid> {
    info!("{:<12} --> place bid id: {}, amount: {}", "Query", id, amount);
    db_manager
        .transaction(move |tx| {
            Box::pin(async move {
                let listing = sqlx::query_as::<_, Listing>(queries::GET_LISTING_FOR_UPDATE)
                    .bind(id)
                    .fetch_optional(&mut **tx)
                    .await?
                    .ok_or(AuctionError::ListingNotFound(id))?;

                let highest = sqlx::query_scalar::<_, Option<Decimal>>(queries::GET_HIGHEST_AMOUNT)
                    .bind(id)
                    .fetch_one(&mut **tx)
                    .await?;
                let amount = check_bid(&listing, highest, amount)?;

                let bid = sqlx::query_as::<_, Bid>(queries::INSERT_BID)
                    .bind(id)
                    .bind(bidder)
                    .bind(amount)
                    .fetch_one(&mut **tx)
                    .await?;
                Ok::<_, AuctionError>(bid)
            })
        })
        .await
}

/// Bid history
pub async fn get_bid_history(db_manager: &DatabaseManager, id: ListingId) -> Result<Vec<Bid>> {
    info!("{:<12} --> get bid history id: {}", "Query", id);
    let bids = sqlx::query_as::<_, Bid>(queries::GET_BID_HISTORY)
        .bind(id)
        .fetch_all(db_manager.pool())
        .await?;
    Ok(bids)
}

/// Highest bid
pub async fn get_highest_bid(db_manager: &DatabaseManager, id: ListingId) -> Result<Option<Bid>> {
    info!("{:<12} --> get highest bid id: {}", "Query", id);
    let bid = sqlx::query_as::<_, Bid>(queries::GET_HIGHEST_BID)
        .bind(id)
        .fetch_optional(db_manager.pool())
        .await?;
    Ok(bid)
}

// endregion: --- Bid Queries

// region:    --- Comment Queries

/// Insert a comment, failing when the listing is gone
pub async fn insert_comment(
    db_manager: &DatabaseManager,
    id: ListingId,
    author: UserRef,
    text: String,
) -> Result<Comment> {
    info!("{:<12} --> insert comment id: {}", "Query", id);
    db_manager
        .transaction(move |tx| {
            Box::pin(async move {
                sqlx::query_as::<_, Listing>(queries::GET_LISTING_FOR_UPDATE)
                    .bind(id)
                    .fetch_optional(&mut **tx)
                    .await?
                    .ok_or(AuctionError::ListingNotFound(id))?;

                let comment = sqlx::query_as::<_, Comment>(queries::INSERT_COMMENT)
                    .bind(id)
                    .bind(author)
                    .bind(text)
                    .fetch_one(&mut **tx)
                    .await?;
                Ok::<_, AuctionError>(comment)
            })
        })
        .await
}

/// Comments in posting order
pub async fn get_comments(db_manager: &DatabaseManager, id: ListingId) -> Result<Vec<Comment>> {
    info!("{:<12} --> get comments id: {}", "Query", id);
    let comments = sqlx::query_as::<_, Comment>(queries::GET_COMMENTS)
        .bind(id)
        .fetch_all(db_manager.pool())
        .await?;
    Ok(comments)
}

// endregion: --- Comment Queries

// region:    --- Watchlist Queries

/// Returns `false` when the pair already existed.
pub async fn insert_watch(db_manager: &DatabaseManager, user: UserRef, id: ListingId) -> Result<bool> {
    info!("{:<12} --> watch id: {}, user: {}", "Query", id, user);
    db_manager
        .transaction(move |tx| {
            Box::pin(async move {
                let exists = sqlx::query_scalar::<_, bool>(queries::LISTING_EXISTS)
                    .bind(id)
                    .fetch_one(&mut **tx)
                    .await?;
                if !exists {
                    return Err(AuctionError::ListingNotFound(id));
                }

                let inserted = sqlx::query_scalar::<_, ListingId>(queries::INSERT_WATCH)
                    .bind(user)
                    .bind(id)
                    .fetch_optional(&mut **tx)
                    .await?;
                Ok::<_, AuctionError>(inserted.is_some())
            })
        })
        .await
}

/// Returns `false` when the pair was absent.
pub async fn delete_watch(db_manager: &DatabaseManager, user: UserRef, id: ListingId) -> Result<bool> {
    info!("{:<12} --> unwatch id: {}, user: {}", "Query", id, user);
    let removed = sqlx::query_scalar::<_, ListingId>(queries::DELETE_WATCH)
        .bind(user)
        .bind(id)
        .fetch_optional(db_manager.pool())
        .await?;
    Ok(removed.is_some())
}

/// Listings watched by `user`
pub async fn get_watchlist(db_manager: &DatabaseManager, user: UserRef) -> Result<Vec<Listing>> {
    info!("{:<12} --> get watchlist user: {}", "Query", user);
    let listings = sqlx::query_as::<_, Listing>(queries::GET_WATCHLIST)
        .bind(user)
        .fetch_all(db_manager.pool())
        .await?;
    Ok(listings)
}

// endregion: --- Watchlist Queries
