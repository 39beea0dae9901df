//! Comment log. Append-only, ordered by posting time.

use crate::error::{AuctionError, Result};
use crate::identity::UserRef;
use crate::listing::model::ListingId;
use crate::store::SharedAuctionStore;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

pub type CommentId = i64;

pub const COMMENT_MAX_LEN: usize = 256;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Comment {
    pub id: CommentId,
    pub listing_id: ListingId,
    pub author: UserRef,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct CommentLog {
    store: SharedAuctionStore,
}

impl CommentLog {
    pub fn new(store: SharedAuctionStore) -> Self {
        Self { store }
    }

    pub async fn post(&self, listing_id: ListingId, author: UserRef, text: &str) -> Result<Comment> {
        let text = text.trim();
        if text.is_empty() {
            return Err(AuctionError::InvalidInput("comment must not be empty".to_string()));
        }
        if text.chars().count() > COMMENT_MAX_LEN {
            return Err(AuctionError::InvalidInput(format!(
                "comment must be at most {COMMENT_MAX_LEN} characters"
            )));
        }

        let comment = self
            .store
            .append_comment(listing_id, author, text.to_string())
            .await?;
        info!(
            "{:<12} --> comment {} added to listing {}",
            "Command", comment.id, listing_id
        );
        Ok(comment)
    }

    pub async fn list(&self, listing_id: ListingId) -> Result<Vec<Comment>> {
        if self.store.get_listing(listing_id).await?.is_none() {
            return Err(AuctionError::ListingNotFound(listing_id));
        }
        self.store.comments(listing_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::listing::model::NewListing;
    use crate::store::InMemoryStore;

    async fn setup() -> (CommentLog, ListingId) {
        let store = InMemoryStore::new_shared();
        let listing = store
            .create_listing(
                UserRef(1),
                NewListing {
                    title: "Guitar".to_string(),
                    description: String::new(),
                    starting_price: "50".parse().unwrap(),
                    category: "Music".to_string(),
                    image_ref: None,
                },
            )
            .await
            .unwrap();
        (CommentLog::new(store), listing.id)
    }

    #[tokio::test]
    async fn comments_keep_posting_order() {
        let (log, listing_id) = setup().await;
        log.post(listing_id, UserRef(2), "first").await.unwrap();
        log.post(listing_id, UserRef(3), "  second ").await.unwrap();

        let texts: Vec<_> = log
            .list(listing_id)
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.text)
            .collect();
        assert_eq!(texts, vec!["first", "second"]);
    }

    #[tokio::test]
    async fn blank_and_oversized_comments_are_rejected() {
        let (log, listing_id) = setup().await;
        assert!(matches!(
            log.post(listing_id, UserRef(2), "   ").await,
            Err(AuctionError::InvalidInput(_))
        ));
        let long = "a".repeat(COMMENT_MAX_LEN + 1);
        assert!(log.post(listing_id, UserRef(2), &long).await.is_err());
        assert!(log.list(listing_id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn unknown_listing() {
        let (log, _) = setup().await;
        assert!(matches!(
            log.post(99, UserRef(2), "hello").await,
            Err(AuctionError::ListingNotFound(99))
        ));
        assert!(matches!(
            log.list(99).await,
            Err(AuctionError::ListingNotFound(99))
        ));
    }
}
