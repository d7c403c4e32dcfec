//! Behaviour definitions for engine backends.
//!
//! A storage backend for the lost-and-found server implements the traits in this module. The SQLite implementation
//! in [`crate::sqlite`] is the canonical one; the traits exist so that route handlers and tests can run against
//! mocks without a database.

mod auction_management;
mod item_management;
mod settlement_management;

pub use auction_management::{AuctionApiError, AuctionManagement};
pub use item_management::{ItemApiError, ItemManagement};
pub use settlement_management::{SettlementApiError, SettlementManagement};
