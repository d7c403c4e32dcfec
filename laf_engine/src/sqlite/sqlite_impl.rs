//! `SqliteDatabase` is a concrete implementation of the lost-and-found engine backend.
//!
//! Unsurprisingly, it uses SQLite as the backend and implements all the traits defined in the [`crate::traits`]
//! module.
use std::fmt::Debug;

use chrono::{DateTime, Utc};
use log::*;
use sqlx::SqlitePool;

use super::db::{auctions, bids, db_url, found_items, lost_reports, new_pool, payment_intents};
use crate::{
    db_types::{
        Auction,
        Bid,
        FoundItem,
        LostReport,
        NewAuction,
        NewBid,
        NewFoundItem,
        NewLostReport,
        NewPaymentIntent,
        PaymentIntent,
        SettledIntent,
        UpdateLostReport,
    },
    laf_api::objects::{AuctionWindow, FoundItemSearchFilter, WonAuction},
    matcher::MatchCriteria,
    traits::{
        AuctionApiError,
        AuctionManagement,
        ItemApiError,
        ItemManagement,
        SettlementApiError,
        SettlementManagement,
    },
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl ItemManagement for SqliteDatabase {
    async fn insert_lost_report(&self, report: NewLostReport) -> Result<LostReport, ItemApiError> {
        let mut tx = self.pool.begin().await?;
        let report = lost_reports::insert_lost_report(report, &mut tx).await?;
        tx.commit().await?;
        Ok(report)
    }

    async fn fetch_lost_report(&self, id: i64) -> Result<Option<LostReport>, ItemApiError> {
        let mut conn = self.pool.acquire().await?;
        let report = lost_reports::fetch_lost_report_by_id(id, &mut conn).await?;
        Ok(report)
    }

    async fn fetch_open_lost_reports(&self) -> Result<Vec<LostReport>, ItemApiError> {
        let mut conn = self.pool.acquire().await?;
        let reports = lost_reports::fetch_open_reports(&mut conn).await?;
        Ok(reports)
    }

    async fn close_lost_report(
        &self,
        id: i64,
        subject: &str,
        is_authority: bool,
    ) -> Result<LostReport, ItemApiError> {
        let mut tx = self.pool.begin().await?;
        let report =
            lost_reports::fetch_lost_report_by_id(id, &mut tx).await?.ok_or(ItemApiError::ReportNotFound(id))?;
        if !is_authority && report.owner_id != subject {
            return Err(ItemApiError::Forbidden(format!("Only the reporting user may close report #{id}")));
        }
        lost_reports::close_report(id, Utc::now(), &mut tx).await?;
        let report =
            lost_reports::fetch_lost_report_by_id(id, &mut tx).await?.ok_or(ItemApiError::ReportNotFound(id))?;
        tx.commit().await?;
        debug!("🗃️ Lost report #{id} closed by [{subject}]");
        Ok(report)
    }

    async fn update_lost_report(
        &self,
        id: i64,
        update: UpdateLostReport,
        subject: &str,
        is_authority: bool,
    ) -> Result<LostReport, ItemApiError> {
        let mut tx = self.pool.begin().await?;
        let report =
            lost_reports::fetch_lost_report_by_id(id, &mut tx).await?.ok_or(ItemApiError::ReportNotFound(id))?;
        if !is_authority && report.owner_id != subject {
            return Err(ItemApiError::Forbidden(format!("Only the reporting user may edit report #{id}")));
        }
        if !report.active {
            return Err(ItemApiError::ValidationError(format!(
                "Lost report {id} has been closed and can no longer be edited"
            )));
        }
        let report = lost_reports::update_report(id, update, Utc::now(), &mut tx)
            .await?
            .ok_or(ItemApiError::ReportNotFound(id))?;
        tx.commit().await?;
        debug!("🗃️ Lost report #{id} updated by [{subject}]");
        Ok(report)
    }

    async fn delete_lost_report(&self, id: i64, subject: &str, is_authority: bool) -> Result<(), ItemApiError> {
        let mut tx = self.pool.begin().await?;
        let report =
            lost_reports::fetch_lost_report_by_id(id, &mut tx).await?.ok_or(ItemApiError::ReportNotFound(id))?;
        if !is_authority && report.owner_id != subject {
            return Err(ItemApiError::Forbidden(format!("Only the reporting user may delete report #{id}")));
        }
        lost_reports::delete_report(id, &mut tx).await?;
        tx.commit().await?;
        debug!("🗃️ Lost report #{id} deleted by [{subject}]");
        Ok(())
    }

    /// Stores the item and runs the matcher inside one transaction, so a report cannot be claimed by a concurrent
    /// close while it is being matched here.
    async fn register_found_item(
        &self,
        item: NewFoundItem,
        criteria: &MatchCriteria,
    ) -> Result<(FoundItem, Option<LostReport>), ItemApiError> {
        let mut tx = self.pool.begin().await?;
        let candidates =
            lost_reports::fetch_match_candidates(&item.short_description, &item.category, &mut tx).await?;
        let matched = candidates.into_iter().find(|report| criteria.is_match(report, &item));
        let stored = found_items::insert_found_item(item, &mut tx).await?;
        let matched = match matched {
            Some(report) => {
                lost_reports::close_report(report.id, Utc::now(), &mut tx).await?;
                debug!("🗃️ Found item #{} matched and closed lost report #{}", stored.id, report.id);
                lost_reports::fetch_lost_report_by_id(report.id, &mut tx).await?
            },
            None => None,
        };
        tx.commit().await?;
        Ok((stored, matched))
    }

    async fn fetch_found_item(&self, id: i64) -> Result<Option<FoundItem>, ItemApiError> {
        let mut conn = self.pool.acquire().await?;
        let item = found_items::fetch_found_item_by_id(id, &mut conn).await?;
        Ok(item)
    }

    async fn fetch_found_items(&self) -> Result<Vec<FoundItem>, ItemApiError> {
        let mut conn = self.pool.acquire().await?;
        let items = found_items::fetch_found_items(&mut conn).await?;
        Ok(items)
    }

    async fn search_found_items(&self, filter: FoundItemSearchFilter) -> Result<Vec<FoundItem>, ItemApiError> {
        let mut conn = self.pool.acquire().await?;
        let items = found_items::search_found_items(filter, &mut conn).await?;
        Ok(items)
    }

    async fn register_delivery(
        &self,
        item_id: i64,
        owner_id: &str,
        delivery_date: DateTime<Utc>,
    ) -> Result<FoundItem, ItemApiError> {
        let mut tx = self.pool.begin().await?;
        let item = found_items::mark_claimed(item_id, owner_id, delivery_date, &mut tx)
            .await?
            .ok_or(ItemApiError::ItemNotFound(item_id))?;
        tx.commit().await?;
        debug!("🗃️ Found item #{item_id} delivered to its owner [{owner_id}]");
        Ok(item)
    }
}

impl AuctionManagement for SqliteDatabase {
    async fn create_auction(&self, auction: NewAuction) -> Result<Auction, AuctionApiError> {
        let mut tx = self.pool.begin().await?;
        let item_id = auction.found_item_id;
        let item = found_items::fetch_found_item_by_id(item_id, &mut tx).await?;
        if !item.map(|i| i.active).unwrap_or(false) {
            return Err(AuctionApiError::ItemNotFound(item_id));
        }
        if auctions::auction_id_for_item(item_id, &mut tx).await?.is_some() {
            return Err(AuctionApiError::AuctionAlreadyExists(item_id));
        }
        let auction = auctions::insert_auction(auction, &mut tx).await?;
        tx.commit().await?;
        Ok(auction)
    }

    async fn fetch_auction(&self, id: i64) -> Result<Option<Auction>, AuctionApiError> {
        let mut conn = self.pool.acquire().await?;
        let auction = auctions::fetch_auction_by_id(id, &mut conn).await?;
        Ok(auction)
    }

    async fn fetch_auctions_in_window(&self, window: AuctionWindow) -> Result<Vec<Auction>, AuctionApiError> {
        let mut conn = self.pool.acquire().await?;
        let auctions = auctions::fetch_auctions_in_window(window, Utc::now(), &mut conn).await?;
        Ok(auctions)
    }

    async fn start_auction(&self, id: i64) -> Result<Auction, AuctionApiError> {
        let mut tx = self.pool.begin().await?;
        let auction = auctions::set_active(id, &mut tx).await?.ok_or(AuctionApiError::AuctionNotFound(id))?;
        tx.commit().await?;
        Ok(auction)
    }

    async fn end_auction(&self, id: i64) -> Result<Auction, AuctionApiError> {
        let mut tx = self.pool.begin().await?;
        let auction =
            auctions::end_auction(id, Utc::now(), &mut tx).await?.ok_or(AuctionApiError::AuctionNotFound(id))?;
        tx.commit().await?;
        debug!("🗃️ Auction #{id} has been ended");
        Ok(auction)
    }

    /// The open-window and floor checks happen inside [`bids::guarded_insert`]'s single atomic statement, so two
    /// racing bids of the same amount cannot both be accepted. The insert is the transaction's first statement;
    /// diagnosing a rejected bid happens afterwards on the snapshot the insert saw.
    async fn place_bid(&self, bid: NewBid) -> Result<Bid, AuctionApiError> {
        let mut tx = self.pool.begin().await?;
        let auction_id = bid.auction_id;
        let now = Utc::now();
        let accepted = bids::guarded_insert(bid, now, &mut tx).await?;
        let bid = match accepted {
            Some(bid) => bid,
            None => {
                let auction = auctions::fetch_auction_by_id(auction_id, &mut tx)
                    .await?
                    .ok_or(AuctionApiError::AuctionNotFound(auction_id))?;
                if !auction.is_open_for_bids(now) {
                    return Err(AuctionApiError::AuctionNotOpen(auction_id));
                }
                let floor = bids::current_floor(auction_id, &mut tx).await?;
                return Err(AuctionApiError::BidTooLow { floor });
            },
        };
        tx.commit().await?;
        debug!("🗃️ Bid #{} of {} accepted on auction #{auction_id}", bid.id, bid.amount);
        Ok(bid)
    }

    async fn fetch_bids(&self, auction_id: i64) -> Result<Vec<Bid>, AuctionApiError> {
        let mut conn = self.pool.acquire().await?;
        if auctions::fetch_auction_by_id(auction_id, &mut conn).await?.is_none() {
            return Err(AuctionApiError::AuctionNotFound(auction_id));
        }
        let bids = bids::fetch_bids_for_auction(auction_id, &mut conn).await?;
        Ok(bids)
    }

    async fn fetch_highest_bid(&self, auction_id: i64) -> Result<Option<Bid>, AuctionApiError> {
        let mut conn = self.pool.acquire().await?;
        if auctions::fetch_auction_by_id(auction_id, &mut conn).await?.is_none() {
            return Err(AuctionApiError::AuctionNotFound(auction_id));
        }
        let bid = bids::fetch_highest_bid(auction_id, &mut conn).await?;
        Ok(bid)
    }
}

impl SettlementManagement for SqliteDatabase {
    /// Creates a payment intent for the auction's winning bid, in a single transaction:
    /// * the auction must exist and have at least one bid,
    /// * the given amount must equal the winning bid amount,
    /// * an existing unsettled intent for the `(auction, payer)` pair short-circuits and is returned as-is,
    /// * a settled intent for the pair is a hard conflict.
    ///
    /// Two concurrent creations for the same pair both pass the short-circuit check; the unique index on
    /// `(auction_id, payer_id)` stops the second insert, and the loser re-reads the pair and returns the
    /// intent the winner stored.
    async fn create_payment_intent(
        &self,
        intent: NewPaymentIntent,
    ) -> Result<(PaymentIntent, bool), SettlementApiError> {
        let mut tx = self.pool.begin().await?;
        let auction_id = intent.auction_id;
        if auctions::fetch_auction_by_id(auction_id, &mut tx).await?.is_none() {
            return Err(SettlementApiError::AuctionNotFound(auction_id));
        }
        let winning = bids::fetch_highest_bid(auction_id, &mut tx)
            .await?
            .ok_or(SettlementApiError::NoBids(auction_id))?;
        if intent.amount != winning.amount {
            return Err(SettlementApiError::AmountMismatch { given: intent.amount, expected: winning.amount });
        }
        let existing = payment_intents::fetch_intents_for_pair(auction_id, &intent.payer_id, &mut tx).await?;
        if let Some(settled) = existing.iter().find(|i| i.settled) {
            return Err(SettlementApiError::AlreadySettled {
                auction_id,
                payer_id: settled.payer_id.clone(),
            });
        }
        if let Some(pending) = existing.into_iter().next() {
            debug!("🗃️ Returning existing pending intent #{} for auction #{auction_id}", pending.id);
            return Ok((pending, false));
        }
        let payer_id = intent.payer_id.clone();
        let intent = match payment_intents::insert_intent(intent, winning.id, &mut tx).await {
            Ok(intent) => intent,
            Err(e) => {
                // A concurrent creation got there first. Roll back and return whatever it stored.
                tx.rollback().await?;
                let mut conn = self.pool.acquire().await?;
                let existing = payment_intents::fetch_intents_for_pair(auction_id, &payer_id, &mut conn).await?;
                if let Some(settled) = existing.iter().find(|i| i.settled) {
                    return Err(SettlementApiError::AlreadySettled {
                        auction_id,
                        payer_id: settled.payer_id.clone(),
                    });
                }
                return match existing.into_iter().next() {
                    Some(pending) => {
                        debug!("🗃️ Lost an intent creation race on auction #{auction_id}; returning intent #{}", pending.id);
                        Ok((pending, false))
                    },
                    None => Err(e.into()),
                };
            },
        };
        tx.commit().await?;
        Ok((intent, true))
    }

    async fn fetch_payment_intent(&self, id: i64) -> Result<Option<PaymentIntent>, SettlementApiError> {
        let mut conn = self.pool.acquire().await?;
        let intent = payment_intents::fetch_intent_by_id(id, &mut conn).await?;
        Ok(intent)
    }

    /// Settles the intent and closes the auctioned item out in the same transaction. The `settled = FALSE` guard in
    /// [`payment_intents::mark_settled`] makes the transition happen exactly once; a replayed confirmation falls
    /// through to the stored settled row and touches nothing.
    async fn settle_intent(&self, id: i64) -> Result<SettledIntent, SettlementApiError> {
        let mut tx = self.pool.begin().await?;
        let now = Utc::now();
        let settled = payment_intents::mark_settled(id, now, &mut tx).await?;
        let result = match settled {
            Some(intent) => {
                let auction = auctions::fetch_auction_by_id(intent.auction_id, &mut tx)
                    .await?
                    .ok_or(SettlementApiError::AuctionNotFound(intent.auction_id))?;
                let claimed_item =
                    found_items::mark_claimed(auction.found_item_id, &intent.payer_id, now, &mut tx).await?;
                debug!("🗃️ Intent #{id} settled; found item #{} closed out", auction.found_item_id);
                SettledIntent { intent, newly_settled: true, claimed_item }
            },
            None => {
                let intent = payment_intents::fetch_intent_by_id(id, &mut tx)
                    .await?
                    .ok_or(SettlementApiError::IntentNotFound(id))?;
                debug!("🗃️ Intent #{id} was already settled. Replay is a no-op.");
                SettledIntent { intent, newly_settled: false, claimed_item: None }
            },
        };
        tx.commit().await?;
        Ok(result)
    }

    async fn fetch_won_auctions(&self, payer_id: &str) -> Result<Vec<WonAuction>, SettlementApiError> {
        let mut conn = self.pool.acquire().await?;
        let won = payment_intents::fetch_won_auctions(payer_id, &mut conn).await?;
        Ok(won)
    }
}

impl SqliteDatabase {
    /// Creates a new database API object
    pub async fn new(max_connections: u32) -> Result<Self, sqlx::Error> {
        let url = db_url();
        SqliteDatabase::new_with_url(url.as_str(), max_connections).await
    }

    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        trace!("Creating new database connection pool with url {url}");
        let pool = new_pool(url, max_connections).await?;
        let url = url.to_string();
        Ok(Self { url, pool })
    }

    /// Returns a reference to the database connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn url(&self) -> &str {
        self.url.as_str()
    }
}
