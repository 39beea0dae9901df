// region:    --- Listings
/// Insert a listing
pub const INSERT_LISTING: &str = r#"
    INSERT INTO listings (title, description, starting_price, category, image_ref, owner)
    VALUES ($1, $2, $3, $4, $5, $6)
    RETURNING id, title, description, starting_price, category, image_ref, owner, active, created_at
"#;

/// Listing by id
pub const GET_LISTING: &str = "SELECT id, title, description, starting_price, category, image_ref, owner, active, created_at FROM listings WHERE id = $1";

/// Listing by id, row locked until the transaction ends
pub const GET_LISTING_FOR_UPDATE: &str = "SELECT id, title, description, starting_price, category, image_ref, owner, active, created_at FROM listings WHERE id = $1 FOR UPDATE";

/// All listings, oldest first
pub const GET_ALL_LISTINGS: &str =
    "SELECT id, title, description, starting_price, category, image_ref, owner, active, created_at FROM listings ORDER BY id ASC";

/// Listings of one category
pub const GET_LISTINGS_IN_CATEGORY: &str =
    "SELECT id, title, description, starting_price, category, image_ref, owner, active, created_at FROM listings WHERE category = $1 ORDER BY id ASC";

/// Distinct category tags
pub const GET_CATEGORIES: &str =
    "SELECT DISTINCT category FROM listings WHERE category <> '' ORDER BY category";

/// Rewrite of the editable columns
pub const UPDATE_LISTING: &str = r#"
    UPDATE listings
    SET title = $2, description = $3, category = $4, image_ref = $5, starting_price = $6
    WHERE id = $1
    RETURNING id, title, description, starting_price, category, image_ref, owner, active, created_at
"#;

/// Active -> Closed, a no-op when already closed
pub const CLOSE_LISTING: &str = r#"
    UPDATE listings SET active = FALSE
    WHERE id = $1
    RETURNING id, title, description, starting_price, category, image_ref, owner, active, created_at
"#;

pub const DELETE_LISTING_BIDS: &str = "DELETE FROM bids WHERE listing_id = $1";
pub const DELETE_LISTING_COMMENTS: &str = "DELETE FROM comments WHERE listing_id = $1";
pub const DELETE_LISTING_WATCHERS: &str = "DELETE FROM watchlist WHERE listing_id = $1";
pub const DELETE_LISTING: &str = "DELETE FROM listings WHERE id = $1";
// endregion: --- Listings

// region:    --- Bids
/// Highest bid
pub const GET_HIGHEST_BID: &str = r#"
    SELECT id, listing_id, bidder, amount, placed_at
    FROM bids
    WHERE listing_id = $1
    ORDER BY amount DESC, id DESC
    LIMIT 1
"#;

/// Highest amount only, NULL without bids
pub const GET_HIGHEST_AMOUNT: &str =
    "SELECT MAX(amount) AS highest_amount FROM bids WHERE listing_id = $1";

/// Bid history, in acceptance order
pub const GET_BID_HISTORY: &str = r#"
    SELECT id, listing_id, bidder, amount, placed_at
    FROM bids
    WHERE listing_id = $1
    ORDER BY id ASC
"#;

pub const COUNT_BIDS: &str = "SELECT COUNT(*) FROM bids WHERE listing_id = $1";

pub const INSERT_BID: &str = r#"
    INSERT INTO bids (listing_id, bidder, amount)
    VALUES ($1, $2, $3)
    RETURNING id, listing_id, bidder, amount, placed_at
"#;
// endregion: --- Bids

// region:    --- Comments
pub const INSERT_COMMENT: &str = r#"
    INSERT INTO comments (listing_id, author, text)
    VALUES ($1, $2, $3)
    RETURNING id, listing_id, author, text, created_at
"#;

pub const GET_COMMENTS: &str = r#"
    SELECT id, listing_id, author, text, created_at
    FROM comments
    WHERE listing_id = $1
    ORDER BY id ASC
"#;
// endregion: --- Comments

// region:    --- Watchlist
pub const LISTING_EXISTS: &str = "SELECT EXISTS (SELECT 1 FROM listings WHERE id = $1)";

/// Returns a row only when the pair was new
pub const INSERT_WATCH: &str = r#"
    INSERT INTO watchlist (user_id, listing_id)
    VALUES ($1, $2)
    ON CONFLICT (user_id, listing_id) DO NOTHING
    RETURNING listing_id
"#;

pub const DELETE_WATCH: &str =
    "DELETE FROM watchlist WHERE user_id = $1 AND listing_id = $2 RETURNING listing_id";

pub const GET_WATCHLIST: &str = r#"
    SELECT l.id, l.title, l.description, l.starting_price, l.category, l.image_ref, l.owner, l.active, l.created_at
    FROM listings l
    JOIN watchlist w ON w.listing_id = l.id
    WHERE w.user_id = $1
    ORDER BY l.id ASC
"#;
// endregion: --- Watchlist

// region:    --- Sessions
pub const GET_SESSION_USER: &str = "SELECT user_id FROM sessions WHERE token = $1";
// endregion: --- Sessions
