//! # SQLite Database methods
//!
//! This module contains the "low-level" SQLite database interactions, and [`SqliteDatabase`], which implements every
//! backend trait on top of them.
//!
//! The interactions are simple functions (rather than stateful structs) that accept a `&mut SqliteConnection`
//! argument. Callers can obtain a connection from a pool, or open an atomic transaction as the need arises and call
//! through to the functions without any other changes.
use std::{env, str::FromStr, time::Duration};

use log::info;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    SqlitePool,
};

mod errors;
mod sqlite_impl;

pub mod orders;
pub mod products;
pub mod reservations;
pub mod transactions;
pub mod users;

pub use errors::SqliteDatabaseError;
pub use sqlite_impl::SqliteDatabase;

const SQLITE_DB_URL: &str = "sqlite://data/coffee_store.db";

pub fn db_url() -> String {
    let result = env::var("COFFEE_DATABASE_URL").unwrap_or_else(|_| {
        info!("🗃️ COFFEE_DATABASE_URL is not set. Using the default.");
        SQLITE_DB_URL.to_string()
    });
    info!("🗃️ Using database URL: {result}");
    result
}

pub async fn new_pool(url: &str, max_connections: u32) -> Result<SqlitePool, SqliteDatabaseError> {
    let options = SqliteConnectOptions::from_str(url)?
        .create_if_missing(true)
        .foreign_keys(true)
        .busy_timeout(Duration::from_secs(30));
    let pool = SqlitePoolOptions::new().max_connections(max_connections).connect_with(options).await?;
    Ok(pool)
}
