use diesel::prelude::*;
use diesel::sql_query;
use diesel::sql_types::{BigInt, Double, Integer, Nullable, Text};
use diesel::sqlite::{Sqlite, SqliteConnection};
use serenity::all::ChannelId;

use crate::error::{TrackerError, Result};

use super::cursor::PageWindow;
use super::SortKey;

/// Which clans a board covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoardScope {
    /// The clans linked to one channel
    Channel(ChannelId),
    /// Every tracked clan
    Global,
}

/// One row of a rendered board.
#[derive(Debug, Clone, PartialEq)]
pub struct BoardPlayer {
    pub rank: i64,
    pub name: String,
    pub donations: i32,
    pub received: i32,
    pub trophies: i32,
    /// Seconds since the player last donated or received
    pub last_online: i64,
    pub ratio: Option<f64>,
    pub gain: i32,
}

#[derive(QueryableByName)]
struct BoardRow {
    #[diesel(sql_type = Text)]
    player_name: String,
    #[diesel(sql_type = Integer)]
    donations: i32,
    #[diesel(sql_type = Integer)]
    received: i32,
    #[diesel(sql_type = Integer)]
    trophies: i32,
    #[diesel(sql_type = BigInt)]
    last_online: i64,
    #[diesel(sql_type = Nullable<Double>)]
    ratio: Option<f64>,
    #[diesel(sql_type = Integer)]
    gain: i32,
}

/// A ranking query over one season of player stats.
#[derive(Debug, Clone, Copy)]
pub struct LeaderboardQuery {
    pub scope: BoardScope,
    pub season: i32,
    pub sort: SortKey,
    pub limit: i64,
    pub offset: i64,
}

impl LeaderboardQuery {
    pub fn new(scope: BoardScope, season: i32, sort: SortKey, window: &PageWindow) -> Self {
        Self {
            scope,
            season,
            sort,
            limit: window.limit,
            offset: window.offset,
        }
    }

    pub fn sql(&self) -> String {
        let channel_filter = match self.scope {
            BoardScope::Channel(_) => "AND clans.channel_id = ?",
            BoardScope::Global => "",
        };

        format!(
            "SELECT DISTINCT players.player_name AS player_name, \
                    players.donations AS donations, \
                    players.received AS received, \
                    players.trophies AS trophies, \
                    CAST(strftime('%s', 'now') - strftime('%s', players.last_updated) AS INTEGER) AS last_online, \
                    CAST(players.donations AS REAL) / NULLIF(players.received, 0) AS ratio, \
                    players.trophies - players.start_trophies AS gain \
             FROM players \
             INNER JOIN clans ON clans.clan_tag = players.clan_tag \
             WHERE players.season_id = ? {} \
             ORDER BY {} \
             LIMIT ? OFFSET ?",
            channel_filter,
            self.sort.order_clause(),
        )
    }

    pub fn load(&self, conn: &mut SqliteConnection) -> Result<Vec<BoardPlayer>> {
        let mut query = sql_query(self.sql())
            .into_boxed::<Sqlite>()
            .bind::<Integer, _>(self.season);

        if let BoardScope::Channel(channel) = self.scope {
            query = query.bind::<BigInt, _>(channel.get() as i64);
        }

        let rows: Vec<BoardRow> = query
            .bind::<BigInt, _>(self.limit)
            .bind::<BigInt, _>(self.offset)
            .load(conn)
            .map_err(TrackerError::from)?;

        Ok(rows
            .into_iter()
            .enumerate()
            .map(|(i, row)| BoardPlayer {
                rank: self.offset + i as i64 + 1,
                name: row.player_name,
                donations: row.donations,
                received: row.received,
                trophies: row.trophies,
                last_online: row.last_online,
                ratio: row.ratio,
                gain: row.gain,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use crate::board::cursor::{Navigation, PageCursor};
    use crate::db::models::{DbClan, DbSeason};
    use crate::db::players::PlayerStats;
    use crate::db::models::DbPlayer;
    use crate::db::test_conn;

    const CHANNEL: ChannelId = ChannelId::new(663683345108172830);

    fn seed(conn: &mut SqliteConnection) -> i32 {
        let now = Utc::now().naive_utc();
        let season = DbSeason::ensure_current(conn, now - Duration::days(1)).unwrap().id;

        DbClan::add(conn, 1, CHANNEL.get() as i64, "#ZULU", "Zulu").unwrap();
        DbClan::add(conn, 1, 999, "#ELEPH", "Elephino").unwrap();

        let rows = [
            ("#A", "alpha", "#ZULU", 100, 50, 3000, 3100, 60),
            ("#B", "bravo", "#ZULU", 300, 0, 2000, 2500, 3600),
            ("#C", "charlie", "#ZULU", 200, 400, 4000, 3900, 10),
            ("#D", "delta", "#ELEPH", 900, 100, 5000, 5000, 7200),
        ];
        for (tag, name, clan, donations, received, start, trophies, seen_ago) in rows {
            let seen = now - Duration::seconds(seen_ago);
            let stats = PlayerStats { tag, name, clan_tag: clan, donations: 0, received: 0, trophies: start };
            DbPlayer::record(conn, &stats, season, seen).unwrap();
            let stats = PlayerStats { donations, received, trophies, ..stats };
            DbPlayer::record(conn, &stats, season, seen).unwrap();
        }
        season
    }

    fn names(players: &[BoardPlayer]) -> Vec<&str> {
        players.iter().map(|p| p.name.as_str()).collect()
    }

    fn query(season: i32, scope: BoardScope, sort: SortKey) -> LeaderboardQuery {
        LeaderboardQuery { scope, season, sort, limit: 15, offset: 0 }
    }

    #[test]
    fn sort_column_comes_from_the_enum() {
        let sql = query(1, BoardScope::Global, SortKey::LastOnline).sql();
        assert!(sql.contains("ORDER BY last_online ASC NULLS LAST, player_name"));
        assert!(!sql.contains("clans.channel_id = ?"));

        let sql = query(1, BoardScope::Channel(CHANNEL), SortKey::Ratio).sql();
        assert!(sql.contains("ORDER BY ratio DESC NULLS LAST"));
        assert!(sql.contains("clans.channel_id = ?"));
    }

    #[test]
    fn channel_boards_rank_by_each_sort() {
        let conn = &mut test_conn();
        let season = seed(conn);
        let scope = BoardScope::Channel(CHANNEL);

        let by_donations = query(season, scope, SortKey::Donations).load(conn).unwrap();
        assert_eq!(names(&by_donations), ["bravo", "charlie", "alpha"]);
        assert_eq!(by_donations[0].rank, 1);

        let by_trophies = query(season, scope, SortKey::Trophies).load(conn).unwrap();
        assert_eq!(names(&by_trophies), ["charlie", "alpha", "bravo"]);

        // bravo has received nothing, so no ratio, and sorts last
        let by_ratio = query(season, scope, SortKey::Ratio).load(conn).unwrap();
        assert_eq!(names(&by_ratio), ["alpha", "charlie", "bravo"]);
        assert_eq!(by_ratio[0].ratio, Some(2.0));
        assert_eq!(by_ratio[2].ratio, None);

        let by_gain = query(season, scope, SortKey::Gain).load(conn).unwrap();
        assert_eq!(names(&by_gain), ["bravo", "alpha", "charlie"]);
        assert_eq!(by_gain[0].gain, 500);
        assert_eq!(by_gain[2].gain, -100);

        let by_seen = query(season, scope, SortKey::LastOnline).load(conn).unwrap();
        assert_eq!(names(&by_seen), ["charlie", "alpha", "bravo"]);
        assert!(by_seen[2].last_online >= 3600);
    }

    #[test]
    fn global_board_covers_every_clan() {
        let conn = &mut test_conn();
        let season = seed(conn);

        let players = query(season, BoardScope::Global, SortKey::Donations).load(conn).unwrap();
        assert_eq!(names(&players), ["delta", "bravo", "charlie", "alpha"]);
    }

    #[test]
    fn window_limits_and_ranks() {
        let conn = &mut test_conn();
        let season = seed(conn);

        let window = PageCursor::first(season)
            .advance(Navigation::STAY, 2, season)
            .unwrap();
        let first = LeaderboardQuery::new(BoardScope::Global, season, SortKey::Donations, &window)
            .load(conn)
            .unwrap();
        assert_eq!(names(&first), ["delta", "bravo"]);

        let window = window.cursor.advance(Navigation::pages(1), 2, season).unwrap();
        let second = LeaderboardQuery::new(BoardScope::Global, season, SortKey::Donations, &window)
            .load(conn)
            .unwrap();
        assert_eq!(names(&second), ["charlie", "alpha"]);
        assert_eq!(second[0].rank, 3);

        let window = window.cursor.advance(Navigation::pages(1), 2, season).unwrap();
        let empty = LeaderboardQuery::new(BoardScope::Global, season, SortKey::Donations, &window)
            .load(conn)
            .unwrap();
        assert!(empty.is_empty());
    }

    #[test]
    fn other_seasons_are_excluded() {
        let conn = &mut test_conn();
        let season = seed(conn);

        let players = query(season + 1, BoardScope::Global, SortKey::Donations).load(conn).unwrap();
        assert!(players.is_empty());
    }
}
