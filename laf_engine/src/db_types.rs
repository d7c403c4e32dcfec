use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
use laf_common::Money;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use thiserror::Error;

//--------------------------------------        Role        ----------------------------------------------------------
/// Roles are claims supplied by the external identity provider. The engine trusts them unconditionally once the
/// bearer credential has been verified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// An ordinary citizen. May file lost reports, bid in auctions and pay for won items.
    User,
    /// A privileged role (e.g. a law-enforcement member). May register found items, manage auctions and register
    /// deliveries.
    Authority,
}

#[derive(Debug, Clone, Error)]
#[error("Invalid role: {0}")]
pub struct RoleParseError(String);

impl FromStr for Role {
    type Err = RoleParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "user" => Ok(Self::User),
            "authority" => Ok(Self::Authority),
            s => Err(RoleParseError(s.to_string())),
        }
    }
}

impl Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Authority => write!(f, "authority"),
        }
    }
}

/// The set of roles attached to a verified credential.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Roles(Vec<Role>);

impl Roles {
    pub fn new(roles: Vec<Role>) -> Self {
        Self(roles)
    }

    pub fn contains(&self, role: &Role) -> bool {
        self.0.contains(role)
    }

    pub fn is_authority(&self) -> bool {
        self.contains(&Role::Authority)
    }
}

impl From<Vec<Role>> for Roles {
    fn from(roles: Vec<Role>) -> Self {
        Self(roles)
    }
}

//--------------------------------------      GeoPoint      ----------------------------------------------------------
/// A WGS84 coordinate pair as supplied by clients. Coordinates are user-entered and subject to client-side rounding,
/// so equality comparisons go through [`crate::matcher`] rather than bitwise float comparison.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

impl Display for GeoPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.5}, {:.5})", self.lat, self.lon)
    }
}

//--------------------------------------     LostReport     ----------------------------------------------------------
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct LostReport {
    pub id: i64,
    pub title: String,
    pub short_description: String,
    pub full_description: String,
    pub category: String,
    pub lost_at: DateTime<Utc>,
    pub latitude: f64,
    pub longitude: f64,
    /// Subject id of the reporting user, as issued by the identity provider.
    pub owner_id: String,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl LostReport {
    pub fn location(&self) -> GeoPoint {
        GeoPoint::new(self.latitude, self.longitude)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewLostReport {
    pub title: String,
    pub short_description: String,
    pub full_description: String,
    pub category: String,
    pub lost_at: DateTime<Utc>,
    pub location: GeoPoint,
    pub owner_id: String,
}

/// A partial update of an open lost report. Absent fields keep their stored values.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateLostReport {
    pub title: Option<String>,
    pub short_description: Option<String>,
    pub full_description: Option<String>,
    pub category: Option<String>,
    pub lost_at: Option<DateTime<Utc>>,
    pub location: Option<GeoPoint>,
}

impl UpdateLostReport {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() &&
            self.short_description.is_none() &&
            self.full_description.is_none() &&
            self.category.is_none() &&
            self.lost_at.is_none() &&
            self.location.is_none()
    }
}

//--------------------------------------     FoundItem      ----------------------------------------------------------
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct FoundItem {
    pub id: i64,
    pub title: String,
    pub short_description: String,
    pub full_description: String,
    pub category: String,
    pub found_at: DateTime<Utc>,
    pub latitude: f64,
    pub longitude: f64,
    /// The last date on which the original owner can still claim the item.
    pub claim_deadline: DateTime<Utc>,
    pub active: bool,
    pub base_value: Option<Money>,
    pub image_url: Option<String>,
    /// Subject id of the authority member that registered the item.
    pub registered_by: String,
    pub claimant_id: Option<String>,
    pub claimed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FoundItem {
    pub fn location(&self) -> GeoPoint {
        GeoPoint::new(self.latitude, self.longitude)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewFoundItem {
    pub title: String,
    pub short_description: String,
    pub full_description: String,
    pub category: String,
    pub found_at: DateTime<Utc>,
    pub location: GeoPoint,
    pub claim_deadline: DateTime<Utc>,
    pub base_value: Option<Money>,
    pub image_url: Option<String>,
    pub registered_by: String,
}

impl NewFoundItem {
    /// A claim deadline before the find date is almost certainly a data-entry slip, but the reference platform
    /// accepts it, so it is surfaced as a warning rather than a hard validation error.
    pub fn deadline_precedes_find_date(&self) -> bool {
        self.claim_deadline < self.found_at
    }
}

//--------------------------------------      Auction       ----------------------------------------------------------
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Auction {
    pub id: i64,
    /// The found item being auctioned. At most one auction may ever exist per item.
    pub found_item_id: i64,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub location: String,
    /// The bid floor while no bids exist.
    pub base_value: Money,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Auction {
    /// The auction state is a pure function of the clock and the stored window; there are no background timers.
    /// An auction that was explicitly ended (`active == false`) is `Ended` regardless of its window.
    pub fn status_at(&self, now: DateTime<Utc>) -> AuctionStatus {
        if !self.active || now > self.end_date {
            AuctionStatus::Ended
        } else if now < self.start_date {
            AuctionStatus::Scheduled
        } else {
            AuctionStatus::Active
        }
    }

    pub fn is_open_for_bids(&self, now: DateTime<Utc>) -> bool {
        self.status_at(now) == AuctionStatus::Active
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewAuction {
    pub found_item_id: i64,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub location: String,
    pub base_value: Money,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuctionStatus {
    Scheduled,
    Active,
    Ended,
}

impl Display for AuctionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuctionStatus::Scheduled => write!(f, "Scheduled"),
            AuctionStatus::Active => write!(f, "Active"),
            AuctionStatus::Ended => write!(f, "Ended"),
        }
    }
}

//--------------------------------------        Bid         ----------------------------------------------------------
/// Bids are append-only. They are never mutated or deleted.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Bid {
    pub id: i64,
    pub auction_id: i64,
    pub bidder_id: String,
    pub amount: Money,
    pub placed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewBid {
    pub auction_id: i64,
    /// Always taken from the verified identity context, never from a request body, to prevent bid spoofing.
    pub bidder_id: String,
    pub amount: Money,
}

//--------------------------------------   PaymentIntent    ----------------------------------------------------------
/// A two-phase settlement record. Created `settled = false`; transitions once, irreversibly, to `settled = true`
/// when the external gateway confirms payment.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct PaymentIntent {
    pub id: i64,
    pub auction_id: i64,
    /// The winning bid this intent pays for.
    pub bid_id: i64,
    pub payer_id: String,
    pub amount: Money,
    pub settled: bool,
    pub settled_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewPaymentIntent {
    pub auction_id: i64,
    pub payer_id: String,
    pub amount: Money,
}

/// Result of a [`crate::traits::SettlementManagement::settle_intent`] call.
#[derive(Debug, Clone)]
pub struct SettledIntent {
    pub intent: PaymentIntent,
    /// False when the call was an idempotent replay of an already-settled intent.
    pub newly_settled: bool,
    /// The found item that was closed out by this settlement, when this call performed the transition.
    pub claimed_item: Option<FoundItem>,
}
