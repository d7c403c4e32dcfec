use chrono::{DateTime, Utc};
use log::debug;
use sqlx::{QueryBuilder, SqliteConnection};

use crate::{
    db_types::{FoundItem, NewFoundItem},
    laf_api::objects::FoundItemSearchFilter,
    traits::ItemApiError,
};

pub async fn insert_found_item(item: NewFoundItem, conn: &mut SqliteConnection) -> Result<FoundItem, ItemApiError> {
    let item: FoundItem = sqlx::query_as(
        r#"
            INSERT INTO found_items (
                title,
                short_description,
                full_description,
                category,
                found_at,
                latitude,
                longitude,
                claim_deadline,
                base_value,
                image_url,
                registered_by
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING *;
        "#,
    )
    .bind(item.title)
    .bind(item.short_description)
    .bind(item.full_description)
    .bind(item.category)
    .bind(item.found_at)
    .bind(item.location.lat)
    .bind(item.location.lon)
    .bind(item.claim_deadline)
    .bind(item.base_value.map(|v| v.value()))
    .bind(item.image_url)
    .bind(item.registered_by)
    .fetch_one(conn)
    .await?;
    debug!("📝️ Found item [{}] inserted with id {}", item.short_description, item.id);
    Ok(item)
}

pub async fn fetch_found_item_by_id(id: i64, conn: &mut SqliteConnection) -> Result<Option<FoundItem>, sqlx::Error> {
    let item = sqlx::query_as("SELECT * FROM found_items WHERE id = $1").bind(id).fetch_optional(conn).await?;
    Ok(item)
}

pub async fn fetch_found_items(conn: &mut SqliteConnection) -> Result<Vec<FoundItem>, sqlx::Error> {
    let items = sqlx::query_as("SELECT * FROM found_items ORDER BY found_at, id").fetch_all(conn).await?;
    Ok(items)
}

/// Fragment search over the open items according to the criteria in the `FoundItemSearchFilter`.
pub async fn search_found_items(
    filter: FoundItemSearchFilter,
    conn: &mut SqliteConnection,
) -> Result<Vec<FoundItem>, sqlx::Error> {
    let mut builder = QueryBuilder::new("SELECT * FROM found_items WHERE active = TRUE");
    if let Some(title) = filter.title {
        builder.push(" AND title LIKE ");
        builder.push_bind(format!("%{title}%"));
    }
    if let Some(description) = filter.short_description {
        builder.push(" AND short_description LIKE ");
        builder.push_bind(format!("%{description}%"));
    }
    if let Some(category) = filter.category {
        builder.push(" AND category LIKE ");
        builder.push_bind(format!("%{category}%"));
    }
    let items = builder.build_query_as().fetch_all(conn).await?;
    Ok(items)
}

/// Closes the item out as claimed, whether by direct delivery or auction settlement. The guard on `active` makes the
/// update a single atomic claim: exactly one caller can transition the item, everyone else gets `None` back.
pub async fn mark_claimed(
    item_id: i64,
    claimant_id: &str,
    claimed_at: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<Option<FoundItem>, sqlx::Error> {
    let item = sqlx::query_as(
        r#"
            UPDATE found_items
            SET active = FALSE, claimant_id = $2, claimed_at = $3, updated_at = $4
            WHERE id = $1 AND active = TRUE
            RETURNING *;
        "#,
    )
    .bind(item_id)
    .bind(claimant_id)
    .bind(claimed_at)
    .bind(Utc::now())
    .fetch_optional(conn)
    .await?;
    Ok(item)
}
