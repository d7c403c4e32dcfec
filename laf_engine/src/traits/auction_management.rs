use laf_common::Money;
use thiserror::Error;

use crate::{
    db_types::{Auction, Bid, NewAuction, NewBid},
    laf_api::objects::AuctionWindow,
};

/// Auction lifecycle management and the bid ledger.
///
/// The single most safety-critical property of the engine lives here: every accepted bid strictly exceeds all
/// previously accepted bids for that auction (or the auction's base value when no bids exist), under arbitrary
/// concurrent submission. Implementations must make the floor check and the bid insert atomic.
#[allow(async_fn_in_trait)]
pub trait AuctionManagement {
    /// Creates an auction for a found item. Fails with [`AuctionApiError::AuctionAlreadyExists`] when an auction
    /// already exists for the item, and with [`AuctionApiError::ItemNotFound`] when the item is missing or no longer
    /// active.
    async fn create_auction(&self, auction: NewAuction) -> Result<Auction, AuctionApiError>;

    async fn fetch_auction(&self, id: i64) -> Result<Option<Auction>, AuctionApiError>;

    /// All auctions whose window places them in the requested bucket at the current instant. Boundary instants are
    /// inclusive: an auction is `Active` from `start_date` up to and including `end_date`.
    async fn fetch_auctions_in_window(&self, window: AuctionWindow) -> Result<Vec<Auction>, AuctionApiError>;

    /// Reactivates the auction. A no-op if it is already active.
    async fn start_auction(&self, id: i64) -> Result<Auction, AuctionApiError>;

    /// Deactivates the auction and stamps `end_date = now`. The auction is terminal after this.
    async fn end_auction(&self, id: i64) -> Result<Auction, AuctionApiError>;

    /// Appends a bid to the ledger. The bid is accepted only if the auction exists, is currently open for bidding,
    /// and `amount` strictly exceeds the current floor.
    async fn place_bid(&self, bid: NewBid) -> Result<Bid, AuctionApiError>;

    /// The full bid history for an auction, in no particular order. An empty ledger is not an error, but the
    /// auction itself must exist.
    async fn fetch_bids(&self, auction_id: i64) -> Result<Vec<Bid>, AuctionApiError>;

    /// The bid with the highest amount, or `None` when no bids have been placed. The auction must exist.
    async fn fetch_highest_bid(&self, auction_id: i64) -> Result<Option<Bid>, AuctionApiError>;
}

#[derive(Debug, Clone, Error)]
pub enum AuctionApiError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("The auction {0} does not exist")]
    AuctionNotFound(i64),
    #[error("The found item {0} does not exist or is no longer active")]
    ItemNotFound(i64),
    #[error("An auction already exists for found item {0}")]
    AuctionAlreadyExists(i64),
    #[error("The auction {0} is not open for bidding")]
    AuctionNotOpen(i64),
    #[error("Bid too low. The current floor is {floor}")]
    BidTooLow { floor: Money },
    #[error("Invalid input. {0}")]
    ValidationError(String),
}

impl From<sqlx::Error> for AuctionApiError {
    fn from(e: sqlx::Error) -> Self {
        AuctionApiError::DatabaseError(e.to_string())
    }
}
