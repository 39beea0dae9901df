// region:    --- Imports
use crate::listing::model::ListingId;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use rust_decimal::Decimal;
use thiserror::Error;
use tracing::error;
// endregion: --- Imports

pub type Result<T, E = AuctionError> = std::result::Result<T, E>;

pub const INTERNAL_ERROR_MESSAGE: &str = "internal server error";

// region:    --- Error
/// Every recoverable condition raised by the auction core and its stores.
#[derive(Debug, Error)]
pub enum AuctionError {
    #[error("bid of {amount} must be higher than the current price {current_price}")]
    BidTooLow {
        amount: Decimal,
        current_price: Decimal,
    },
    #[error("auction for listing {0} is closed")]
    AuctionClosed(ListingId),
    #[error("listing {0} not found")]
    ListingNotFound(ListingId),
    #[error("authentication required")]
    AuthenticationRequired,
    #[error("only the listing owner may do this")]
    NotOwner,
    #[error("auction for listing {0} is still open")]
    AuctionStillOpen(ListingId),
    #[error("starting price of listing {0} cannot change once bids exist")]
    StartingPriceLocked(ListingId),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("internal error: {0}")]
    Internal(String),
}

impl AuctionError {
    /// Stable code sent to clients next to the message.
    pub fn code(&self) -> &'static str {
        match self {
            AuctionError::BidTooLow { .. } => "LOW_BID",
            AuctionError::AuctionClosed(_) => "ALREADY_ENDED",
            AuctionError::ListingNotFound(_) => "NOT_FOUND",
            AuctionError::AuthenticationRequired => "AUTH_REQUIRED",
            AuctionError::NotOwner => "NOT_OWNER",
            AuctionError::AuctionStillOpen(_) => "STILL_OPEN",
            AuctionError::StartingPriceLocked(_) => "PRICE_LOCKED",
            AuctionError::InvalidInput(_) => "INVALID_INPUT",
            AuctionError::Database(_) => "DATABASE",
            AuctionError::Internal(_) => "INTERNAL",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AuctionError::BidTooLow { .. }
            | AuctionError::AuctionClosed(_)
            | AuctionError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AuctionError::ListingNotFound(_) => StatusCode::NOT_FOUND,
            AuctionError::AuthenticationRequired => StatusCode::UNAUTHORIZED,
            AuctionError::NotOwner => StatusCode::FORBIDDEN,
            AuctionError::AuctionStillOpen(_) | AuctionError::StartingPriceLocked(_) => {
                StatusCode::CONFLICT
            }
            AuctionError::Database(_) | AuctionError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AuctionError {
    fn into_response(self) -> Response {
        let status = self.status();
        // Server-side detail stays in the log.
        let message = if status.is_server_error() {
            error!("{:<12} --> {:?}", "Error", self);
            INTERNAL_ERROR_MESSAGE.to_string()
        } else {
            self.to_string()
        };

        let mut body = serde_json::json!({
            "error": message,
            "code": self.code(),
        });
        if let AuctionError::BidTooLow { current_price, .. } = &self {
            body["current_price"] = serde_json::json!(current_price);
        }

        (status, Json(body)).into_response()
    }
}
// endregion: --- Error
