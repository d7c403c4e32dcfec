use chrono::{DateTime, Utc};
use log::debug;
use sqlx::SqliteConnection;

use crate::{
    db_types::{Auction, NewAuction},
    laf_api::objects::AuctionWindow,
    traits::AuctionApiError,
};

/// Inserts a new auction. Callers must have verified that no auction exists for the item yet; the unique index on
/// `found_item_id` backstops that check.
pub async fn insert_auction(auction: NewAuction, conn: &mut SqliteConnection) -> Result<Auction, AuctionApiError> {
    let auction: Auction = sqlx::query_as(
        r#"
            INSERT INTO auctions (found_item_id, start_date, end_date, location, base_value)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *;
        "#,
    )
    .bind(auction.found_item_id)
    .bind(auction.start_date)
    .bind(auction.end_date)
    .bind(auction.location)
    .bind(auction.base_value.value())
    .fetch_one(conn)
    .await?;
    debug!("📝️ Auction for item #{} inserted with id {}", auction.found_item_id, auction.id);
    Ok(auction)
}

pub async fn fetch_auction_by_id(id: i64, conn: &mut SqliteConnection) -> Result<Option<Auction>, sqlx::Error> {
    let auction = sqlx::query_as("SELECT * FROM auctions WHERE id = $1").bind(id).fetch_optional(conn).await?;
    Ok(auction)
}

/// Returns the id of the auction tied to the given found item, if one exists.
pub async fn auction_id_for_item(found_item_id: i64, conn: &mut SqliteConnection) -> Result<Option<i64>, sqlx::Error> {
    let id = sqlx::query_scalar("SELECT id FROM auctions WHERE found_item_id = $1")
        .bind(found_item_id)
        .fetch_optional(conn)
        .await?;
    Ok(id)
}

/// Lists auctions whose window puts them in the requested bucket at instant `now`. Boundaries are inclusive for
/// `Active`.
pub async fn fetch_auctions_in_window(
    window: AuctionWindow,
    now: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<Vec<Auction>, sqlx::Error> {
    let query = match window {
        AuctionWindow::Active => "SELECT * FROM auctions WHERE start_date <= $1 AND end_date >= $1 ORDER BY end_date",
        AuctionWindow::Upcoming => "SELECT * FROM auctions WHERE start_date > $1 ORDER BY start_date",
        AuctionWindow::Past => "SELECT * FROM auctions WHERE end_date < $1 ORDER BY end_date DESC",
    };
    let auctions = sqlx::query_as(query).bind(now).fetch_all(conn).await?;
    Ok(auctions)
}

/// Reactivates the auction. A no-op when it is already active.
pub async fn set_active(id: i64, conn: &mut SqliteConnection) -> Result<Option<Auction>, sqlx::Error> {
    let auction = sqlx::query_as("UPDATE auctions SET active = TRUE, updated_at = $2 WHERE id = $1 RETURNING *")
        .bind(id)
        .bind(Utc::now())
        .fetch_optional(conn)
        .await?;
    Ok(auction)
}

/// Ends the auction: deactivates it and stamps `end_date = now`.
pub async fn end_auction(
    id: i64,
    now: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<Option<Auction>, sqlx::Error> {
    let auction = sqlx::query_as(
        "UPDATE auctions SET active = FALSE, end_date = $2, updated_at = $2 WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(now)
    .fetch_optional(conn)
    .await?;
    Ok(auction)
}
