use serde::{Deserialize, Serialize};

use crate::db_types::{Bid, FoundItem, LostReport, PaymentIntent};

/// Emitted when a newly registered found item closed an open lost report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMatchedEvent {
    pub item: FoundItem,
    pub report: LostReport,
}

impl ReportMatchedEvent {
    pub fn new(item: FoundItem, report: LostReport) -> Self {
        Self { item, report }
    }
}

/// Emitted for every accepted bid.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BidPlacedEvent {
    pub bid: Bid,
}

impl BidPlacedEvent {
    pub fn new(bid: Bid) -> Self {
        Self { bid }
    }
}

/// Emitted when a payment intent transitions to settled. Not emitted for idempotent replays.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntentSettledEvent {
    pub intent: PaymentIntent,
    /// The item that was closed out by the settlement.
    pub claimed_item: Option<FoundItem>,
}

impl IntentSettledEvent {
    pub fn new(intent: PaymentIntent, claimed_item: Option<FoundItem>) -> Self {
        Self { intent, claimed_item }
    }
}
