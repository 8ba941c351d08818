use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;

use crate::db::models::NewDbGuild;
use crate::error::{TrackerError, Result};
use crate::schema;

/// Records a guild the bot has joined. Returns false if it was known.
pub fn add_guild(conn: &mut SqliteConnection, guild: i64) -> Result<bool> {
    use schema::guilds::dsl::*;

    diesel::insert_into(guilds)
        .values(&NewDbGuild { guild_id: guild })
        .on_conflict(guild_id)
        .do_nothing()
        .execute(conn)
        .map(|inserted| inserted > 0)
        .map_err(TrackerError::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_conn;

    #[test]
    fn guilds_are_recorded_once() {
        let conn = &mut test_conn();
        assert!(add_guild(conn, 691779140059267084).unwrap());
        assert!(!add_guild(conn, 691779140059267084).unwrap());
    }
}
