use chrono::NaiveDateTime;
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;

use crate::db::models::{DbPlayer, NewDbPlayer};
use crate::error::{TrackerError, Result};
use crate::schema;

/// A player's numbers as reported by the game API.
#[derive(Debug, Clone)]
pub struct PlayerStats<'a> {
    pub tag: &'a str,
    pub name: &'a str,
    pub clan_tag: &'a str,
    pub donations: i32,
    pub received: i32,
    pub trophies: i32,
}

/// Outcome of [`DbPlayer::record`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerChange {
    New,
    Updated { trophies_changed: bool },
    Unchanged,
}

impl PlayerChange {
    pub fn is_change(self) -> bool {
        self != PlayerChange::Unchanged
    }

    /// Whether attack/defense wins are worth refreshing.
    pub fn needs_wins(self) -> bool {
        matches!(self, PlayerChange::New | PlayerChange::Updated { trophies_changed: true })
    }
}

/// Columns the stats tables can rank by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatColumn {
    Donations,
    Gain,
    AttackWins,
    DefenseWins,
}

/// Which clans a stats lookup covers.
#[derive(Debug, Clone)]
pub enum StatScope<'a> {
    Channel(i64),
    /// Clan tag, or a clan name `LIKE` pattern
    Clan { tag: &'a str, name: &'a str },
}

impl DbPlayer {

    pub fn get(conn: &mut SqliteConnection, tag: &str, season: i32) -> Result<Option<Self>> {
        use schema::players::dsl::*;

        players
            .filter(player_tag.eq(tag))
            .filter(season_id.eq(season))
            .select(Self::as_select())
            .first(conn)
            .optional()
            .map_err(TrackerError::from)
    }

    /// Finds a player this season by tag, or failing that by exact name.
    pub fn find(conn: &mut SqliteConnection, tag_or_name: &str, season: i32) -> Result<Option<Self>> {
        use schema::players::dsl::*;

        players
            .filter(season_id.eq(season))
            .filter(player_tag.eq(tag_or_name).or(player_name.eq(tag_or_name)))
            .order_by(player_tag.eq(tag_or_name).desc())
            .select(Self::as_select())
            .first(conn)
            .optional()
            .map_err(TrackerError::from)
    }

    /// Upserts this season's row for `stats`.
    ///
    /// New rows start their trophy gain from the current trophy count.
    /// The last-activity timestamp only moves when donations or
    /// received troops go up.
    pub fn record(
        conn: &mut SqliteConnection,
        stats: &PlayerStats,
        season: i32,
        now: NaiveDateTime,
    ) -> Result<PlayerChange> {
        use schema::players::dsl::*;

        conn.transaction(|conn| {
            let Some(existing) = Self::get(conn, stats.tag, season)? else {
                let new_player = NewDbPlayer {
                    player_tag: stats.tag,
                    player_name: stats.name,
                    clan_tag: stats.clan_tag,
                    season_id: season,
                    donations: stats.donations,
                    received: stats.received,
                    trophies: stats.trophies,
                    start_trophies: stats.trophies,
                    last_updated: now,
                };
                diesel::insert_into(players)
                    .values(&new_player)
                    .execute(conn)?;
                return Ok(PlayerChange::New)
            };

            let active = stats.donations > existing.donations || stats.received > existing.received;
            let trophies_changed = stats.trophies != existing.trophies;
            let changed = active
                || trophies_changed
                || stats.donations != existing.donations
                || stats.received != existing.received
                || stats.name != existing.player_name
                || stats.clan_tag != existing.clan_tag;

            if !changed {
                return Ok(PlayerChange::Unchanged)
            }

            let seen = if active { now } else { existing.last_updated };
            diesel::update(players.find(existing.id))
                .set((
                    player_name.eq(stats.name),
                    clan_tag.eq(stats.clan_tag),
                    donations.eq(stats.donations),
                    received.eq(stats.received),
                    trophies.eq(stats.trophies),
                    last_updated.eq(seen),
                ))
                .execute(conn)?;

            Ok(PlayerChange::Updated { trophies_changed })
        })
    }

    pub fn set_wins(
        conn: &mut SqliteConnection,
        tag: &str,
        season: i32,
        attacks: i32,
        defenses: i32,
    ) -> Result<usize> {
        use schema::players::dsl::*;

        diesel::update(players)
            .filter(player_tag.eq(tag))
            .filter(season_id.eq(season))
            .set((attack_wins.eq(attacks), defense_wins.eq(defenses)))
            .execute(conn)
            .map_err(TrackerError::from)
    }

    /// Links (or with `None`, unlinks) a discord user to a player.
    pub fn set_user(
        conn: &mut SqliteConnection,
        tag: &str,
        season: i32,
        user: Option<i64>,
    ) -> Result<usize> {
        use schema::players::dsl::*;

        diesel::update(players)
            .filter(player_tag.eq(tag))
            .filter(season_id.eq(season))
            .set(user_id.eq(user))
            .execute(conn)
            .map_err(TrackerError::from)
    }

    /// Removes a player's rows from every season.
    pub fn delete_all(conn: &mut SqliteConnection, tag: &str) -> Result<usize> {
        use schema::players::dsl::*;

        diesel::delete(players.filter(player_tag.eq(tag)))
            .execute(conn)
            .map_err(TrackerError::from)
    }

    /// This season's players in `scope`, best first by `column`.
    pub fn ranked(
        conn: &mut SqliteConnection,
        scope: &StatScope,
        season: i32,
        column: StatColumn,
    ) -> Result<Vec<Self>> {
        use schema::{clans, players};

        let mut query = players::table
            .inner_join(clans::table.on(clans::clan_tag.eq(players::clan_tag)))
            .filter(players::season_id.eq(season))
            .select(Self::as_select())
            .distinct()
            .into_boxed();

        query = match scope {
            StatScope::Channel(channel) => query.filter(clans::channel_id.eq(*channel)),
            StatScope::Clan { tag, name } => query.filter(
                clans::clan_tag.eq(*tag).or(clans::clan_name.like(*name))
            ),
        };

        query = match column {
            StatColumn::Donations => query.order_by(players::donations.desc()),
            StatColumn::Gain => query.order_by((players::trophies - players::start_trophies).desc()),
            StatColumn::AttackWins => query.order_by(players::attack_wins.desc()),
            StatColumn::DefenseWins => query.order_by(players::defense_wins.desc()),
        };

        query
            .then_order_by(players::player_tag.asc())
            .load(conn)
            .map_err(TrackerError::from)
    }

    pub fn gain(&self) -> i32 {
        self.trophies - self.start_trophies
    }
}
