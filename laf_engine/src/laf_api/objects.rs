use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
use laf_common::Money;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use thiserror::Error;

//--------------------------------------   AuctionWindow    ----------------------------------------------------------
/// The status buckets callers can list auctions by. Derived from the auction window relative to the current instant,
/// with inclusive boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuctionWindow {
    /// `start_date <= now <= end_date`
    Active,
    /// `start_date > now`
    Upcoming,
    /// `end_date < now`
    Past,
}

#[derive(Debug, Clone, Error)]
#[error("Invalid auction status: {0}. Expected one of 'active', 'upcoming' or 'past'")]
pub struct InvalidAuctionWindow(String);

impl FromStr for AuctionWindow {
    type Err = InvalidAuctionWindow;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(Self::Active),
            "upcoming" => Ok(Self::Upcoming),
            "past" => Ok(Self::Past),
            s => Err(InvalidAuctionWindow(s.to_string())),
        }
    }
}

impl Display for AuctionWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuctionWindow::Active => write!(f, "active"),
            AuctionWindow::Upcoming => write!(f, "upcoming"),
            AuctionWindow::Past => write!(f, "past"),
        }
    }
}

//------------------------------------ FoundItemSearchFilter ---------------------------------------------------------
/// Fragment search over the open found items. Every present field becomes a case-insensitive `LIKE` filter.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FoundItemSearchFilter {
    pub title: Option<String>,
    pub short_description: Option<String>,
    pub category: Option<String>,
}

impl FoundItemSearchFilter {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.short_description.is_none() && self.category.is_none()
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_short_description(mut self, description: impl Into<String>) -> Self {
        self.short_description = Some(description.into());
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }
}

//--------------------------------------    WonAuction      ----------------------------------------------------------
/// One settled purchase in a user's "bought at auction" history: the settled intent joined with the auction and the
/// item it paid for.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct WonAuction {
    pub intent_id: i64,
    pub auction_id: i64,
    pub found_item_id: i64,
    pub title: String,
    pub short_description: String,
    pub amount: Money,
    pub settled_at: DateTime<Utc>,
}
