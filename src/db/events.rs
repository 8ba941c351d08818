use chrono::NaiveDateTime;
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;

use crate::db::models::{DbEvent, NewDbEvent};
use crate::error::{TrackerError, Result};
use crate::schema;

impl DbEvent {

    pub fn create(
        conn: &mut SqliteConnection,
        guild: i64,
        name: &str,
        starts: NaiveDateTime,
        finishes: NaiveDateTime,
        channel: Option<i64>,
    ) -> Result<Self> {
        use schema::events::dsl::*;

        let new_event = NewDbEvent {
            guild_id: guild,
            event_name: name,
            start: starts,
            finish: finishes,
            channel_id: channel,
        };

        diesel::insert_into(events)
            .values(&new_event)
            .returning(Self::as_returning())
            .get_result(conn)
            .map_err(TrackerError::from)
    }

    /// The guild's events, soonest first.
    pub fn in_guild(conn: &mut SqliteConnection, guild: i64) -> Result<Vec<Self>> {
        use schema::events::dsl::*;

        events
            .filter(guild_id.eq(guild))
            .order_by(start.asc())
            .select(Self::as_select())
            .load(conn)
            .map_err(TrackerError::from)
    }

    /// The event running in the guild at `now`, if any.
    pub fn live(conn: &mut SqliteConnection, guild: i64, now: NaiveDateTime) -> Result<Option<Self>> {
        use schema::events::dsl::*;

        events
            .filter(guild_id.eq(guild))
            .filter(start.le(now))
            .filter(finish.gt(now))
            .order_by(start.desc())
            .select(Self::as_select())
            .first(conn)
            .optional()
            .map_err(TrackerError::from)
    }

    pub fn remove_by_name(conn: &mut SqliteConnection, guild: i64, name: &str) -> Result<usize> {
        use schema::events::dsl::*;

        diesel::delete(events)
            .filter(guild_id.eq(guild))
            .filter(event_name.eq(name))
            .execute(conn)
            .map_err(TrackerError::from)
    }

    pub fn delete(conn: &mut SqliteConnection, event: i32) -> Result<usize> {
        use schema::events::dsl::*;

        diesel::delete(events.find(event))
            .execute(conn)
            .map_err(TrackerError::from)
    }
}
