use diesel::backend::Backend;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};

use crate::error::{TrackerError, Result};

const MIGRATIONS: EmbeddedMigrations = embed_migrations!();

pub fn run_migrations<DB: Backend>(conn: &mut impl MigrationHarness<DB>) -> Result<()> {

    let applied = conn.run_pending_migrations(MIGRATIONS)
        .map_err(TrackerError::MigrationError)?;

    for version in applied {
        tracing::info!("Applied migration {}", version);
    }

    Ok(())
}
