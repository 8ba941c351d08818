use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;

use crate::db::models::{DbClan, NewDbClan};
use crate::error::{TrackerError, Result};
use crate::schema;

impl DbClan {

    /// Links `tag` to a channel. Returns false if it was already linked.
    pub fn add(
        conn: &mut SqliteConnection,
        guild: i64,
        channel: i64,
        tag: &str,
        name: &str,
    ) -> Result<bool> {
        use schema::clans::dsl::*;

        let new_clan = NewDbClan {
            guild_id: guild,
            channel_id: channel,
            clan_tag: tag,
            clan_name: name,
        };

        diesel::insert_into(clans)
            .values(&new_clan)
            .on_conflict((clan_tag, channel_id))
            .do_nothing()
            .execute(conn)
            .map(|inserted| inserted > 0)
            .map_err(TrackerError::from)
    }

    pub fn remove(conn: &mut SqliteConnection, tag: &str, channel: i64) -> Result<usize> {
        use schema::clans::dsl::*;

        diesel::delete(clans)
            .filter(clan_tag.eq(tag))
            .filter(channel_id.eq(channel))
            .execute(conn)
            .map_err(TrackerError::from)
    }

    pub fn in_channel(conn: &mut SqliteConnection, channel: i64) -> Result<Vec<Self>> {
        use schema::clans::dsl::*;

        clans
            .filter(channel_id.eq(channel))
            .order_by(clan_name.asc())
            .select(Self::as_select())
            .load(conn)
            .map_err(TrackerError::from)
    }

    pub fn in_guild(conn: &mut SqliteConnection, guild: i64) -> Result<Vec<Self>> {
        use schema::clans::dsl::*;

        clans
            .filter(guild_id.eq(guild))
            .order_by((channel_id.asc(), clan_name.asc()))
            .select(Self::as_select())
            .load(conn)
            .map_err(TrackerError::from)
    }

    /// Every clan tag tracked anywhere.
    pub fn distinct_tags(conn: &mut SqliteConnection) -> Result<Vec<String>> {
        use schema::clans::dsl::*;

        clans
            .select(clan_tag)
            .distinct()
            .order_by(clan_tag.asc())
            .load(conn)
            .map_err(TrackerError::from)
    }

    pub fn set_name(conn: &mut SqliteConnection, tag: &str, name: &str) -> Result<usize> {
        use schema::clans::dsl::*;

        diesel::update(clans)
            .filter(clan_tag.eq(tag))
            .filter(clan_name.ne(name))
            .set(clan_name.eq(name))
            .execute(conn)
            .map_err(TrackerError::from)
    }

    pub fn delete_channel(conn: &mut SqliteConnection, channel: i64) -> Result<usize> {
        use schema::clans::dsl::*;

        diesel::delete(clans)
            .filter(channel_id.eq(channel))
            .execute(conn)
            .map_err(TrackerError::from)
    }
}
