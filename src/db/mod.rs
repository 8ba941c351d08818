pub mod models;
pub mod schema;

pub mod clans;
pub mod commands;
pub mod events;
pub mod guilds;
pub mod players;
pub mod seasons;

mod migrations;

pub use migrations::run_migrations;

use dotenvy::dotenv;

use diesel::connection::SimpleConnection;
use diesel::sqlite::SqliteConnection;
use diesel::prelude::*;

use crate::env_str;
use crate::error::{TrackerError, Result};

/// Creates a connection to the tracker database.
pub fn db_conn() -> Result<SqliteConnection> {
    dotenv().ok();

    let database_url = env_str("DATABASE_URL")?;
    let mut conn = SqliteConnection::establish(&database_url)
        .map_err(TrackerError::from)?;

    // Background loops and gateway events each hold their own connection
    conn.batch_execute("PRAGMA busy_timeout = 5000; PRAGMA foreign_keys = ON;")?;

    Ok(conn)
}

/// Fresh in-memory database with every migration applied.
#[cfg(test)]
pub(crate) fn test_conn() -> SqliteConnection {
    let mut conn = SqliteConnection::establish(":memory:")
        .expect("in-memory sqlite");
    run_migrations(&mut conn).expect("migrations apply");
    conn
}
