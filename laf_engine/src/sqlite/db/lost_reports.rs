use chrono::{DateTime, Utc};
use log::debug;
use sqlx::{QueryBuilder, SqliteConnection};

use crate::{
    db_types::{LostReport, NewLostReport, UpdateLostReport},
    traits::ItemApiError,
};

pub async fn insert_lost_report(
    report: NewLostReport,
    conn: &mut SqliteConnection,
) -> Result<LostReport, ItemApiError> {
    let report: LostReport = sqlx::query_as(
        r#"
            INSERT INTO lost_reports (
                title,
                short_description,
                full_description,
                category,
                lost_at,
                latitude,
                longitude,
                owner_id
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *;
        "#,
    )
    .bind(report.title)
    .bind(report.short_description)
    .bind(report.full_description)
    .bind(report.category)
    .bind(report.lost_at)
    .bind(report.location.lat)
    .bind(report.location.lon)
    .bind(report.owner_id)
    .fetch_one(conn)
    .await?;
    debug!("📝️ Lost report [{}] inserted with id {}", report.short_description, report.id);
    Ok(report)
}

pub async fn fetch_lost_report_by_id(
    id: i64,
    conn: &mut SqliteConnection,
) -> Result<Option<LostReport>, sqlx::Error> {
    let report = sqlx::query_as("SELECT * FROM lost_reports WHERE id = $1").bind(id).fetch_optional(conn).await?;
    Ok(report)
}

pub async fn fetch_open_reports(conn: &mut SqliteConnection) -> Result<Vec<LostReport>, sqlx::Error> {
    let reports = sqlx::query_as("SELECT * FROM lost_reports WHERE active = TRUE ORDER BY lost_at, id")
        .fetch_all(conn)
        .await?;
    Ok(reports)
}

/// Fetches the open reports that agree with the given found-item description and category, ignoring case. The
/// location check needs the haversine distance and happens in Rust; candidates are returned oldest-first so that the
/// deterministic "earliest `lost_at` wins" tie-break is a plain take-first over this result.
pub async fn fetch_match_candidates(
    short_description: &str,
    category: &str,
    conn: &mut SqliteConnection,
) -> Result<Vec<LostReport>, sqlx::Error> {
    let candidates = sqlx::query_as(
        r#"
            SELECT * FROM lost_reports
            WHERE active = TRUE
              AND LOWER(short_description) = LOWER($1)
              AND LOWER(category) = LOWER($2)
            ORDER BY lost_at, id;
        "#,
    )
    .bind(short_description)
    .bind(category)
    .fetch_all(conn)
    .await?;
    Ok(candidates)
}

/// Applies a partial update to an open report. Returns `None` when the report is missing or already closed.
pub async fn update_report(
    id: i64,
    update: UpdateLostReport,
    now: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<Option<LostReport>, sqlx::Error> {
    let mut builder = QueryBuilder::new("UPDATE lost_reports SET updated_at = ");
    builder.push_bind(now);
    if let Some(title) = update.title {
        builder.push(", title = ").push_bind(title);
    }
    if let Some(short_description) = update.short_description {
        builder.push(", short_description = ").push_bind(short_description);
    }
    if let Some(full_description) = update.full_description {
        builder.push(", full_description = ").push_bind(full_description);
    }
    if let Some(category) = update.category {
        builder.push(", category = ").push_bind(category);
    }
    if let Some(lost_at) = update.lost_at {
        builder.push(", lost_at = ").push_bind(lost_at);
    }
    if let Some(location) = update.location {
        builder.push(", latitude = ").push_bind(location.lat);
        builder.push(", longitude = ").push_bind(location.lon);
    }
    builder.push(" WHERE id = ").push_bind(id).push(" AND active = TRUE RETURNING *");
    let report = builder.build_query_as().fetch_optional(conn).await?;
    Ok(report)
}

/// Removes the report outright. Returns `false` when there was nothing to delete.
pub async fn delete_report(id: i64, conn: &mut SqliteConnection) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM lost_reports WHERE id = $1").bind(id).execute(conn).await?;
    Ok(result.rows_affected() > 0)
}

/// Closes the report. Returns `false` when the report was already inactive (or absent), so callers can distinguish
/// a real transition from a no-op.
pub async fn close_report(id: i64, now: DateTime<Utc>, conn: &mut SqliteConnection) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("UPDATE lost_reports SET active = FALSE, updated_at = $2 WHERE id = $1 AND active = TRUE")
        .bind(id)
        .bind(now)
        .execute(conn)
        .await?;
    Ok(result.rows_affected() > 0)
}
