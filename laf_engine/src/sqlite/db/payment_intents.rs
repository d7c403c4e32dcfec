use chrono::{DateTime, Utc};
use log::debug;
use sqlx::SqliteConnection;

use crate::{
    db_types::{NewPaymentIntent, PaymentIntent},
    laf_api::objects::WonAuction,
};

pub async fn insert_intent(
    intent: NewPaymentIntent,
    bid_id: i64,
    conn: &mut SqliteConnection,
) -> Result<PaymentIntent, sqlx::Error> {
    let intent: PaymentIntent = sqlx::query_as(
        r#"
            INSERT INTO payment_intents (auction_id, bid_id, payer_id, amount)
            VALUES ($1, $2, $3, $4) RETURNING *;
        "#,
    )
    .bind(intent.auction_id)
    .bind(bid_id)
    .bind(intent.payer_id)
    .bind(intent.amount.value())
    .fetch_one(conn)
    .await?;
    debug!("📝️ Payment intent #{} recorded for auction #{}", intent.id, intent.auction_id);
    Ok(intent)
}

pub async fn fetch_intent_by_id(id: i64, conn: &mut SqliteConnection) -> Result<Option<PaymentIntent>, sqlx::Error> {
    let intent =
        sqlx::query_as("SELECT * FROM payment_intents WHERE id = $1").bind(id).fetch_optional(conn).await?;
    Ok(intent)
}

/// All intents for the `(auction, payer)` pair, settled or not. The pending-pair unique index guarantees at most one
/// of these is unsettled.
pub async fn fetch_intents_for_pair(
    auction_id: i64,
    payer_id: &str,
    conn: &mut SqliteConnection,
) -> Result<Vec<PaymentIntent>, sqlx::Error> {
    let intents = sqlx::query_as("SELECT * FROM payment_intents WHERE auction_id = $1 AND payer_id = $2")
        .bind(auction_id)
        .bind(payer_id)
        .fetch_all(conn)
        .await?;
    Ok(intents)
}

/// Marks an intent settled. The guard on `settled = FALSE` makes the transition happen exactly once; a replay returns
/// `None` and the caller falls back to the already-settled row.
pub async fn mark_settled(
    id: i64,
    settled_at: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<Option<PaymentIntent>, sqlx::Error> {
    let intent = sqlx::query_as(
        r#"
            UPDATE payment_intents SET settled = TRUE, settled_at = $2, updated_at = $2
            WHERE id = $1 AND settled = FALSE RETURNING *;
        "#,
    )
    .bind(id)
    .bind(settled_at)
    .fetch_optional(conn)
    .await?;
    Ok(intent)
}

pub async fn fetch_won_auctions(payer_id: &str, conn: &mut SqliteConnection) -> Result<Vec<WonAuction>, sqlx::Error> {
    let won = sqlx::query_as(
        r#"
            SELECT
                pi.id AS intent_id,
                pi.auction_id AS auction_id,
                a.found_item_id AS found_item_id,
                fi.title AS title,
                fi.short_description AS short_description,
                pi.amount AS amount,
                pi.settled_at AS settled_at
            FROM payment_intents pi
            JOIN auctions a ON a.id = pi.auction_id
            JOIN found_items fi ON fi.id = a.found_item_id
            WHERE pi.payer_id = $1 AND pi.settled = TRUE
            ORDER BY pi.settled_at DESC;
        "#,
    )
    .bind(payer_id)
    .fetch_all(conn)
    .await?;
    Ok(won)
}
