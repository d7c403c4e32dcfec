use laf_common::Money;
use thiserror::Error;

use crate::{
    db_types::{NewPaymentIntent, PaymentIntent, SettledIntent},
    laf_api::objects::WonAuction,
};

/// The two-phase settlement protocol for winning bids.
///
/// Phase one creates a pending payment intent; phase two, driven by the external gateway's confirmation, settles it.
/// Both phases are idempotent so that page reloads and duplicate webhook deliveries are safe to retry.
#[allow(async_fn_in_trait)]
pub trait SettlementManagement {
    /// Creates a payment intent for the winning bid of an auction.
    ///
    /// When an unsettled intent already exists for the same `(auction_id, payer_id)` pair, that intent is returned
    /// unchanged and the second tuple element is `false`. A settled intent for the pair is a
    /// [`SettlementApiError::AlreadySettled`] conflict (double payment prevention).
    async fn create_payment_intent(&self, intent: NewPaymentIntent)
        -> Result<(PaymentIntent, bool), SettlementApiError>;

    async fn fetch_payment_intent(&self, id: i64) -> Result<Option<PaymentIntent>, SettlementApiError>;

    /// Settles the intent: `settled = true`, `settled_at = now`, and in the same transaction the auctioned item is
    /// closed out (`active = false`, `claimant_id = payer, claimed_at = now`). Settling an already-settled intent is
    /// a no-op that returns the existing settled state.
    async fn settle_intent(&self, id: i64) -> Result<SettledIntent, SettlementApiError>;

    /// Settled purchases for a payer: every intent the payer has settled, joined with the auction and item it paid
    /// for.
    async fn fetch_won_auctions(&self, payer_id: &str) -> Result<Vec<WonAuction>, SettlementApiError>;
}

#[derive(Debug, Clone, Error)]
pub enum SettlementApiError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("The auction {0} does not exist")]
    AuctionNotFound(i64),
    #[error("The auction {0} has no bids to settle")]
    NoBids(i64),
    #[error("The payment intent {0} does not exist")]
    IntentNotFound(i64),
    #[error("A settled payment already exists for auction {auction_id} and payer {payer_id}")]
    AlreadySettled { auction_id: i64, payer_id: String },
    #[error("The amount {given} does not match the winning bid of {expected}")]
    AmountMismatch { given: Money, expected: Money },
    #[error("Invalid input. {0}")]
    ValidationError(String),
}

impl From<sqlx::Error> for SettlementApiError {
    fn from(e: sqlx::Error) -> Self {
        SettlementApiError::DatabaseError(e.to_string())
    }
}
