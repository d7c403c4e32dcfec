//! SQLite database module for the lost-and-found engine.
mod sqlite_impl;

pub mod db;
pub use sqlite_impl::SqliteDatabase;
