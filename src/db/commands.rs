use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;

use crate::db::models::NewCommandUse;
use crate::error::{TrackerError, Result};
use crate::schema;

/// Appends one row to the command usage log.
pub fn log_command_use(conn: &mut SqliteConnection, usage: &NewCommandUse) -> Result<usize> {
    use schema::commands::dsl::*;

    diesel::insert_into(commands)
        .values(usage)
        .execute(conn)
        .map_err(TrackerError::from)
}

/// How often each command has been used, most popular first.
pub fn command_counts(conn: &mut SqliteConnection) -> Result<Vec<(String, i64)>> {
    use schema::commands::dsl::*;
    use diesel::dsl::count_star;

    commands
        .group_by(command)
        .select((command, count_star()))
        .order_by(count_star().desc())
        .load(conn)
        .map_err(TrackerError::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use crate::db::test_conn;

    #[test]
    fn usage_is_counted_per_command() {
        let conn = &mut test_conn();
        for name in ["board add", "stats donations", "stats donations"] {
            let usage = NewCommandUse {
                guild_id: Some(1),
                channel_id: 2,
                author_id: 3,
                used: Utc::now().naive_utc(),
                prefix: "+",
                command: name,
            };
            log_command_use(conn, &usage).unwrap();
        }

        let counts = command_counts(conn).unwrap();
        assert_eq!(counts[0], ("stats donations".to_string(), 2));
        assert_eq!(counts.len(), 2);
    }
}
