//! Auction state machine: `Active -> Closed`, then winner resolution.

pub mod lifecycle;
