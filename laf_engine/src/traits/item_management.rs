use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::{
    db_types::{FoundItem, LostReport, NewFoundItem, NewLostReport, UpdateLostReport},
    laf_api::objects::FoundItemSearchFilter,
    matcher::MatchCriteria,
};

/// Management of lost reports and found items, including the reconciliation step that links the two.
#[allow(async_fn_in_trait)]
pub trait ItemManagement {
    /// Stores a new lost report. The report starts out `active` and stays open until it is matched, closed by its
    /// owner, or closed by an authority.
    async fn insert_lost_report(&self, report: NewLostReport) -> Result<LostReport, ItemApiError>;

    async fn fetch_lost_report(&self, id: i64) -> Result<Option<LostReport>, ItemApiError>;

    async fn fetch_open_lost_reports(&self) -> Result<Vec<LostReport>, ItemApiError>;

    /// Closes the lost report with the given id on behalf of `subject`. Only the reporting user or an authority may
    /// close a report; anyone else receives [`ItemApiError::Forbidden`].
    async fn close_lost_report(&self, id: i64, subject: &str, is_authority: bool)
        -> Result<LostReport, ItemApiError>;

    /// Applies a partial update to an open lost report on behalf of `subject`. The same permission rule as
    /// [`ItemManagement::close_lost_report`] applies. A closed report can no longer be edited.
    async fn update_lost_report(
        &self,
        id: i64,
        update: UpdateLostReport,
        subject: &str,
        is_authority: bool,
    ) -> Result<LostReport, ItemApiError>;

    /// Deletes the lost report outright, as opposed to closing it, which keeps the record around. The same
    /// permission rule as [`ItemManagement::close_lost_report`] applies.
    async fn delete_lost_report(&self, id: i64, subject: &str, is_authority: bool) -> Result<(), ItemApiError>;

    /// Registers a found item and, in the same transaction, runs the reconciliation matcher against the open lost
    /// reports. On a match, the matched report is closed. At most one report is closed per registration; when
    /// several match, the earliest `lost_at` (then lowest id) wins.
    ///
    /// Returns the stored item and the report that was closed, if any. A missing match is not an error.
    async fn register_found_item(
        &self,
        item: NewFoundItem,
        criteria: &MatchCriteria,
    ) -> Result<(FoundItem, Option<LostReport>), ItemApiError>;

    async fn fetch_found_item(&self, id: i64) -> Result<Option<FoundItem>, ItemApiError>;

    async fn fetch_found_items(&self) -> Result<Vec<FoundItem>, ItemApiError>;

    /// Fragment search over the open found items. At least one filter field must be present; the caller validates
    /// this before calling.
    async fn search_found_items(&self, filter: FoundItemSearchFilter) -> Result<Vec<FoundItem>, ItemApiError>;

    /// Marks the item delivered to its owner, in a single transaction: the item becomes inactive with
    /// `claimant_id = owner_id` and `claimed_at = delivery_date`. Fails with [`ItemApiError::ItemNotFound`] when the
    /// item does not exist or is already inactive. The caller is responsible for having verified that the requester
    /// is an authority.
    async fn register_delivery(
        &self,
        item_id: i64,
        owner_id: &str,
        delivery_date: DateTime<Utc>,
    ) -> Result<FoundItem, ItemApiError>;
}

#[derive(Debug, Clone, Error)]
pub enum ItemApiError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("The lost report {0} does not exist")]
    ReportNotFound(i64),
    #[error("The found item {0} does not exist or is no longer active")]
    ItemNotFound(i64),
    #[error("Operation not permitted. {0}")]
    Forbidden(String),
    #[error("Invalid input. {0}")]
    ValidationError(String),
}

impl From<sqlx::Error> for ItemApiError {
    fn from(e: sqlx::Error) -> Self {
        ItemApiError::DatabaseError(e.to_string())
    }
}
