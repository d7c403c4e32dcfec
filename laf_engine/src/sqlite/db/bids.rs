use chrono::{DateTime, Utc};
use laf_common::Money;
use sqlx::SqliteConnection;

use crate::db_types::{Bid, NewBid};

/// Appends a bid to the ledger if and only if the auction is open for bids at `placed_at` and the amount strictly
/// exceeds the current floor (highest accepted bid, or the auction's base value when no bids exist).
///
/// All checks and the insert are a single statement. SQLite serialises writers and re-evaluates the guard at write
/// time, so under concurrent submission at most one of two equal bids is accepted. Returns `None` when the guard was
/// not cleared; callers diagnose the reason afterwards.
pub async fn guarded_insert(
    bid: NewBid,
    placed_at: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<Option<Bid>, sqlx::Error> {
    let bid = sqlx::query_as(
        r#"
            INSERT INTO bids (auction_id, bidder_id, amount, placed_at)
            SELECT $1, $2, $3, $4
            WHERE EXISTS (
                SELECT 1 FROM auctions
                WHERE id = $1 AND active = TRUE AND start_date <= $4 AND end_date >= $4
            )
            AND $3 > COALESCE(
                (SELECT MAX(amount) FROM bids WHERE auction_id = $1),
                (SELECT base_value FROM auctions WHERE id = $1)
            )
            RETURNING *;
        "#,
    )
    .bind(bid.auction_id)
    .bind(bid.bidder_id)
    .bind(bid.amount.value())
    .bind(placed_at)
    .fetch_optional(conn)
    .await?;
    Ok(bid)
}

/// The minimum strictly-exceeding amount a new bid must clear: the highest accepted bid, or the auction's base value
/// when the ledger is empty.
pub async fn current_floor(auction_id: i64, conn: &mut SqliteConnection) -> Result<Money, sqlx::Error> {
    let floor: i64 = sqlx::query_scalar(
        r#"
            SELECT COALESCE(
                (SELECT MAX(amount) FROM bids WHERE auction_id = $1),
                (SELECT base_value FROM auctions WHERE id = $1)
            );
        "#,
    )
    .bind(auction_id)
    .fetch_one(conn)
    .await?;
    Ok(Money::from(floor))
}

pub async fn fetch_bids_for_auction(auction_id: i64, conn: &mut SqliteConnection) -> Result<Vec<Bid>, sqlx::Error> {
    let bids = sqlx::query_as("SELECT * FROM bids WHERE auction_id = $1").bind(auction_id).fetch_all(conn).await?;
    Ok(bids)
}

pub async fn fetch_highest_bid(auction_id: i64, conn: &mut SqliteConnection) -> Result<Option<Bid>, sqlx::Error> {
    let bid = sqlx::query_as("SELECT * FROM bids WHERE auction_id = $1 ORDER BY amount DESC, placed_at LIMIT 1")
        .bind(auction_id)
        .fetch_optional(conn)
        .await?;
    Ok(bid)
}
