use std::fmt::Debug;

use chrono::{DateTime, Utc};
use log::*;

use crate::{
    db_types::{FoundItem, LostReport, NewFoundItem, NewLostReport, UpdateLostReport},
    events::{EventProducers, ReportMatchedEvent},
    laf_api::objects::FoundItemSearchFilter,
    matcher::MatchCriteria,
    traits::{ItemApiError, ItemManagement},
};

/// `ItemFlowApi` handles the lost-report and found-item flows, including the reconciliation step that closes a lost
/// report when a matching found item is registered.
pub struct ItemFlowApi<B> {
    db: B,
    criteria: MatchCriteria,
    producers: EventProducers,
}

impl<B> Debug for ItemFlowApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ItemFlowApi")
    }
}

impl<B> ItemFlowApi<B> {
    pub fn new(db: B, criteria: MatchCriteria, producers: EventProducers) -> Self {
        Self { db, criteria, producers }
    }
}

impl<B> ItemFlowApi<B>
where B: ItemManagement
{
    pub async fn create_lost_report(&self, report: NewLostReport) -> Result<LostReport, ItemApiError> {
        let report = self.db.insert_lost_report(report).await?;
        debug!("🔄️🧾️ Lost report #{} ({}) filed by {}", report.id, report.short_description, report.owner_id);
        Ok(report)
    }

    pub async fn lost_report(&self, id: i64) -> Result<Option<LostReport>, ItemApiError> {
        self.db.fetch_lost_report(id).await
    }

    pub async fn open_lost_reports(&self) -> Result<Vec<LostReport>, ItemApiError> {
        self.db.fetch_open_lost_reports().await
    }

    /// Closes a lost report on behalf of `subject`. Only the reporting user or an authority may do this.
    pub async fn close_lost_report(
        &self,
        id: i64,
        subject: &str,
        is_authority: bool,
    ) -> Result<LostReport, ItemApiError> {
        let report = self.db.close_lost_report(id, subject, is_authority).await?;
        debug!("🔄️🧾️ Lost report #{id} closed by {subject}");
        Ok(report)
    }

    /// Applies a partial update to an open lost report. Only the reporting user or an authority may edit a report,
    /// and a closed report is immutable. An update with no fields set is rejected.
    pub async fn update_lost_report(
        &self,
        id: i64,
        update: UpdateLostReport,
        subject: &str,
        is_authority: bool,
    ) -> Result<LostReport, ItemApiError> {
        if update.is_empty() {
            return Err(ItemApiError::ValidationError("At least one field to update is required".to_string()));
        }
        let report = self.db.update_lost_report(id, update, subject, is_authority).await?;
        debug!("🔄️🧾️ Lost report #{id} updated by {subject}");
        Ok(report)
    }

    /// Deletes a lost report outright. Only the reporting user or an authority may do this.
    pub async fn delete_lost_report(&self, id: i64, subject: &str, is_authority: bool) -> Result<(), ItemApiError> {
        self.db.delete_lost_report(id, subject, is_authority).await?;
        info!("🔄️🧾️ Lost report #{id} deleted by {subject}");
        Ok(())
    }

    /// Registers a found item and reconciles it against the open lost reports. On a match, the matched report is
    /// closed in the same transaction and subscribers of the report-matched hook are notified.
    pub async fn register_found_item(
        &self,
        item: NewFoundItem,
    ) -> Result<(FoundItem, Option<LostReport>), ItemApiError> {
        if item.base_value.is_some_and(|v| !v.is_positive()) {
            return Err(ItemApiError::ValidationError(
                "The base value of an item must be a positive amount".to_string(),
            ));
        }
        if item.deadline_precedes_find_date() {
            warn!(
                "🔄️📦️ Found item '{}' has a claim deadline ({}) before its find date ({}). Accepting it anyway.",
                item.title, item.claim_deadline, item.found_at
            );
        }
        let (item, matched) = self.db.register_found_item(item, &self.criteria).await?;
        match &matched {
            Some(report) => {
                info!("🔄️📦️ Found item #{} reconciled against lost report #{}", item.id, report.id);
                self.call_report_matched_hook(&item, report).await;
            },
            None => debug!("🔄️📦️ Found item #{} registered; no open lost report matched", item.id),
        }
        Ok((item, matched))
    }

    async fn call_report_matched_hook(&self, item: &FoundItem, report: &LostReport) {
        for emitter in &self.producers.report_matched_producer {
            debug!("🔄️📦️ Notifying report-matched hook subscribers");
            let event = ReportMatchedEvent::new(item.clone(), report.clone());
            emitter.publish_event(event).await;
        }
    }

    pub async fn found_item(&self, id: i64) -> Result<Option<FoundItem>, ItemApiError> {
        self.db.fetch_found_item(id).await
    }

    pub async fn found_items(&self) -> Result<Vec<FoundItem>, ItemApiError> {
        self.db.fetch_found_items().await
    }

    pub async fn search_found_items(&self, filter: FoundItemSearchFilter) -> Result<Vec<FoundItem>, ItemApiError> {
        if filter.is_empty() {
            return Err(ItemApiError::ValidationError(
                "At least one of title, description or category is required".to_string(),
            ));
        }
        self.db.search_found_items(filter).await
    }

    /// Marks a found item as delivered to its owner without an auction. Authority checks happen at the route
    /// boundary; the item update itself is transactional.
    pub async fn register_delivery(
        &self,
        item_id: i64,
        owner_id: &str,
        delivery_date: DateTime<Utc>,
    ) -> Result<FoundItem, ItemApiError> {
        let item = self.db.register_delivery(item_id, owner_id, delivery_date).await?;
        info!("🔄️📦️ Found item #{item_id} delivered to {owner_id}");
        Ok(item)
    }
}
