//! Shared scaffolding for the engine integration tests: a throwaway SQLite database per test, with migrations
//! applied.
#![allow(dead_code)]

use chrono::{DateTime, Duration, Utc};
use laf_common::Money;
use laf_engine::{
    db_types::{GeoPoint, NewAuction, NewFoundItem, NewLostReport},
    SqliteDatabase,
};
use log::*;
use sqlx::{migrate, migrate::MigrateDatabase, Sqlite};

pub fn random_db_path() -> String {
    format!("sqlite://{}/laf_test_{}.db", std::env::temp_dir().display(), rand::random::<u64>())
}

pub async fn prepare_test_env(url: &str) -> SqliteDatabase {
    let _ = env_logger::try_init();
    debug!("🚀️ Logging initialised");
    if let Err(e) = Sqlite::drop_database(url).await {
        warn!("Error dropping database {url}: {e:?}");
    }
    Sqlite::create_database(url).await.expect("Error creating database");
    let db = SqliteDatabase::new_with_url(url, 5).await.expect("Error creating connection to database");
    migrate!("./src/sqlite/migrations").run(db.pool()).await.expect("Error running DB migrations");
    info!("🚀️ Migrations complete");
    db
}

// Coordinates of the Praça do Comércio, used as the canonical "same place" in these tests.
pub const PLAZA: GeoPoint = GeoPoint { lat: 38.70775, lon: -9.13659 };

pub fn lost_wallet(owner: &str) -> NewLostReport {
    NewLostReport {
        title: "Lost wallet".to_string(),
        short_description: "Brown leather wallet".to_string(),
        full_description: "Brown leather wallet with a broken zip, lost near the riverside plaza".to_string(),
        category: "accessories".to_string(),
        lost_at: Utc::now() - Duration::days(2),
        location: PLAZA,
        owner_id: owner.to_string(),
    }
}

pub fn found_wallet(registered_by: &str) -> NewFoundItem {
    NewFoundItem {
        title: "Wallet handed in".to_string(),
        short_description: "Brown leather wallet".to_string(),
        full_description: "Handed in at the riverside station, contains no documents".to_string(),
        category: "accessories".to_string(),
        found_at: Utc::now() - Duration::days(1),
        location: PLAZA,
        claim_deadline: Utc::now() + Duration::days(30),
        base_value: Some(Money::from_euros(10)),
        image_url: None,
        registered_by: registered_by.to_string(),
    }
}

pub fn auction_for(found_item_id: i64, start: DateTime<Utc>, end: DateTime<Utc>) -> NewAuction {
    NewAuction {
        found_item_id,
        start_date: start,
        end_date: end,
        location: "Police station auction hall".to_string(),
        base_value: Money::from_euros(10),
    }
}

/// An auction that is open for bids right now.
pub fn open_auction_for(found_item_id: i64) -> NewAuction {
    let now = Utc::now();
    auction_for(found_item_id, now - Duration::hours(1), now + Duration::hours(1))
}
