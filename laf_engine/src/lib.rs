//! Lost-and-Found Engine
//!
//! The engine takes a found item from registration, through automatic matching against open lost reports, through an
//! optional competitive auction with monotonic bidding, to a finalized payment. This library contains the core logic;
//! it is HTTP-framework agnostic.
//!
//! The library is divided into two main sections:
//! 1. Database management and control ([`mod@sqlite`]). You should never need to access the database directly.
//!    Instead, use the public API provided by the engine. The exception is the data types used in the database. These
//!    are defined in the [`db_types`] module and are public.
//! 2. The engine public API ([`mod@laf_api`]). This provides the public-facing functionality: item registration and
//!    reconciliation, auction lifecycle management, the bid ledger, and payment settlement. Specific backends need to
//!    implement the traits in the [`traits`] module in order to act as a backend for the lost-and-found server.
//!
//! The engine also provides a set of events that can be subscribed to. These events are emitted when certain actions
//! occur within the engine, for example when a found item is reconciled against a lost report. A simple actor
//! framework is used so that you can easily hook into these events and perform custom actions.

pub mod db_types;
pub mod events;
pub mod matcher;
pub mod traits;

mod laf_api;

#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteDatabase;

pub use laf_api::{
    auction_api::AuctionApi,
    item_flow_api::ItemFlowApi,
    objects::{AuctionWindow, FoundItemSearchFilter, WonAuction},
    settlement_api::SettlementApi,
};
pub use traits::{
    AuctionApiError,
    AuctionManagement,
    ItemApiError,
    ItemManagement,
    SettlementApiError,
    SettlementManagement,
};
