use std::fmt::Display;

use chrono::{DateTime, Utc};
use laf_common::Money;
use laf_engine::db_types::{GeoPoint, NewAuction, NewFoundItem, NewLostReport, PaymentIntent, UpdateLostReport};
use serde::{Deserialize, Serialize};

use crate::gateway::CheckoutSession;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonResponse {
    pub success: bool,
    pub message: String,
}

impl JsonResponse {
    pub fn success<S: Display>(message: S) -> Self {
        Self { success: true, message: message.to_string() }
    }

    pub fn failure<S: Display>(message: S) -> Self {
        Self { success: false, message: message.to_string() }
    }
}

/// Request body for filing a lost report. The owner is never taken from the body; it comes from the verified token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LostReportRequest {
    pub title: String,
    pub short_description: String,
    pub full_description: String,
    pub category: String,
    pub lost_at: DateTime<Utc>,
    pub location: GeoPoint,
}

impl LostReportRequest {
    pub fn into_new_report(self, owner_id: &str) -> NewLostReport {
        NewLostReport {
            title: self.title,
            short_description: self.short_description,
            full_description: self.full_description,
            category: self.category,
            lost_at: self.lost_at,
            location: self.location,
            owner_id: owner_id.to_string(),
        }
    }
}

/// Request body for editing a lost report. Absent fields keep their stored values.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LostReportUpdateRequest {
    pub title: Option<String>,
    pub short_description: Option<String>,
    pub full_description: Option<String>,
    pub category: Option<String>,
    pub lost_at: Option<DateTime<Utc>>,
    pub location: Option<GeoPoint>,
}

impl From<LostReportUpdateRequest> for UpdateLostReport {
    fn from(r: LostReportUpdateRequest) -> Self {
        UpdateLostReport {
            title: r.title,
            short_description: r.short_description,
            full_description: r.full_description,
            category: r.category,
            lost_at: r.lost_at,
            location: r.location,
        }
    }
}

/// Request body for registering a found item. The registering authority member comes from the verified token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FoundItemRequest {
    pub title: String,
    pub short_description: String,
    pub full_description: String,
    pub category: String,
    pub found_at: DateTime<Utc>,
    pub location: GeoPoint,
    pub claim_deadline: DateTime<Utc>,
    pub base_value: Option<Money>,
    pub image_url: Option<String>,
}

impl FoundItemRequest {
    pub fn into_new_item(self, registered_by: &str) -> NewFoundItem {
        NewFoundItem {
            title: self.title,
            short_description: self.short_description,
            full_description: self.full_description,
            category: self.category,
            found_at: self.found_at,
            location: self.location,
            claim_deadline: self.claim_deadline,
            base_value: self.base_value,
            image_url: self.image_url,
            registered_by: registered_by.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuctionRequest {
    pub found_item_id: i64,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub location: String,
    pub base_value: Money,
}

impl From<AuctionRequest> for NewAuction {
    fn from(r: AuctionRequest) -> Self {
        NewAuction {
            found_item_id: r.found_item_id,
            start_date: r.start_date,
            end_date: r.end_date,
            location: r.location,
            base_value: r.base_value,
        }
    }
}

/// Bid submission body. Only the amount: the auction comes from the path, the bidder from the token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BidRequest {
    pub amount: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryRequest {
    /// Subject id of the owner the item is being handed to.
    pub owner_id: String,
    /// Defaults to the current instant when omitted.
    pub delivery_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentIntentRequest {
    pub auction_id: i64,
    /// Must equal the winning bid amount. Protects against stale checkout pages paying the wrong price.
    pub amount: Money,
}

/// Response to intent creation: the stored intent plus the hosted checkout session to redirect the payer to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutResponse {
    pub intent: PaymentIntent,
    pub checkout: CheckoutSession,
}

/// Body of a settlement call or gateway confirmation webhook.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentCompleteRequest {
    pub intent_id: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchQuery {
    pub title: Option<String>,
    pub short_description: Option<String>,
    pub category: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuctionStatusQuery {
    pub status: Option<String>,
}
