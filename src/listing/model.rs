use crate::error::{AuctionError, Result};
use crate::identity::UserRef;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

pub type ListingId = i64;

pub const TITLE_MAX_LEN: usize = 64;
pub const DESCRIPTION_MAX_LEN: usize = 256;
pub const CATEGORY_MAX_LEN: usize = 64;

/// Prices are stored as NUMERIC(10, 2).
pub const PRICE_MAX_SCALE: u32 = 2;
pub const PRICE_MAX_DIGITS: usize = 10;

// Listing model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Listing {
    pub id: ListingId,
    pub title: String,
    pub description: String,
    pub starting_price: Decimal,
    pub category: String,
    pub image_ref: Option<String>,
    pub owner: UserRef,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

impl Listing {
    pub fn is_owned_by(&self, user: &UserRef) -> bool {
        self.owner == *user
    }
}

/// Fields supplied by the owner when creating a listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewListing {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub starting_price: Decimal,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub image_ref: Option<String>,
}

impl NewListing {
    /// Trims text fields and checks every column limit.
    pub fn validated(self) -> Result<Self> {
        let title = validate_title(&self.title)?;
        let description = validate_text("description", &self.description, DESCRIPTION_MAX_LEN)?;
        let category = validate_text("category", &self.category, CATEGORY_MAX_LEN)?;
        let starting_price = validate_price(self.starting_price)?;

        Ok(Self {
            title,
            description,
            starting_price,
            category,
            image_ref: normalize_image_ref(self.image_ref),
        })
    }
}

/// Partial edit of a listing. `None` leaves the field untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListingUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub image_ref: Option<String>,
    pub starting_price: Option<Decimal>,
}

impl ListingUpdate {
    pub fn validated(self) -> Result<Self> {
        Ok(Self {
            title: self.title.as_deref().map(validate_title).transpose()?,
            description: self
                .description
                .as_deref()
                .map(|d| validate_text("description", d, DESCRIPTION_MAX_LEN))
                .transpose()?,
            category: self
                .category
                .as_deref()
                .map(|c| validate_text("category", c, CATEGORY_MAX_LEN))
                .transpose()?,
            image_ref: normalize_image_ref(self.image_ref),
            starting_price: self.starting_price.map(validate_price).transpose()?,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.category.is_none()
            && self.image_ref.is_none()
            && self.starting_price.is_none()
    }

    /// Applies the edit in place. Callers enforce the starting price rule.
    pub fn apply_to(&self, listing: &mut Listing) {
        if let Some(title) = &self.title {
            listing.title = title.clone();
        }
        if let Some(description) = &self.description {
            listing.description = description.clone();
        }
        if let Some(category) = &self.category {
            listing.category = category.clone();
        }
        if let Some(image_ref) = &self.image_ref {
            listing.image_ref = Some(image_ref.clone());
        }
        if let Some(price) = self.starting_price {
            listing.starting_price = price;
        }
    }
}

/// A listing together with its derived current price.
#[derive(Debug, Clone, Serialize)]
pub struct ListingSummary {
    #[serde(flatten)]
    pub listing: Listing,
    pub current_price: Decimal,
}

fn validate_title(title: &str) -> Result<String> {
    let title = title.trim();
    if title.is_empty() {
        return Err(AuctionError::InvalidInput("title is required".to_string()));
    }
    validate_text("title", title, TITLE_MAX_LEN)
}

fn validate_text(field: &str, value: &str, max_len: usize) -> Result<String> {
    let value = value.trim();
    if value.chars().count() > max_len {
        return Err(AuctionError::InvalidInput(format!(
            "{field} must be at most {max_len} characters"
        )));
    }
    Ok(value.to_string())
}

fn normalize_image_ref(image_ref: Option<String>) -> Option<String> {
    image_ref
        .map(|r| r.trim().to_string())
        .filter(|r| !r.is_empty())
}

/// Checks a money amount against the NUMERIC(10, 2) column and returns it
/// at the column's scale.
pub fn validate_price(price: Decimal) -> Result<Decimal> {
    if price.is_sign_negative() && !price.is_zero() {
        return Err(AuctionError::InvalidInput(
            "price must not be negative".to_string(),
        ));
    }
    let price = price.normalize();
    if price.scale() > PRICE_MAX_SCALE {
        return Err(AuctionError::InvalidInput(format!(
            "price must have at most {PRICE_MAX_SCALE} decimal places"
        )));
    }
    let integer_digits = price.trunc().abs().to_string().trim_start_matches('0').len();
    if integer_digits > PRICE_MAX_DIGITS - PRICE_MAX_SCALE as usize {
        return Err(AuctionError::InvalidInput(format!(
            "price must have at most {PRICE_MAX_DIGITS} digits"
        )));
    }
    let mut price = price;
    price.rescale(PRICE_MAX_SCALE);
    Ok(price)
}
