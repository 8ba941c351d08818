use std::str::FromStr;

use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use serenity::all::{ChannelId, GuildId, MessageId};

use crate::db::models::{DbBoard, NewDbBoard};
use crate::error::{TrackerError, Result};
use crate::schema::{boards, clans};

use super::{BoardType, SortKey};

/// A board's stored settings, with the text columns parsed.
#[derive(Debug, Clone, PartialEq)]
pub struct BoardConfig {
    pub id: i32,
    pub guild_id: GuildId,
    pub channel_id: ChannelId,
    pub message_id: Option<MessageId>,
    pub board_type: BoardType,
    pub sort_by: SortKey,
    /// 0 means pages grow as you scroll
    pub per_page: i32,
    pub toggle: bool,
    pub icon_url: Option<String>,
    pub title: Option<String>,
}

impl TryFrom<DbBoard> for BoardConfig {
    type Error = TrackerError;

    fn try_from(row: DbBoard) -> Result<Self> {
        let board_type = BoardType::from_str(&row.board_type)
            .map_err(|_| TrackerError::InvalidBoardConfig {
                id: row.id,
                field: "board_type",
                value: row.board_type.clone(),
            })?;
        let sort_by = SortKey::from_str(&row.sort_by)
            .map_err(|_| TrackerError::InvalidBoardConfig {
                id: row.id,
                field: "sort_by",
                value: row.sort_by.clone(),
            })?;

        Ok(Self {
            id: row.id,
            guild_id: GuildId::new(row.guild_id as u64),
            channel_id: ChannelId::new(row.channel_id as u64),
            message_id: row.message_id.map(|id| MessageId::new(id as u64)),
            board_type,
            sort_by,
            per_page: row.per_page,
            toggle: row.toggle,
            icon_url: row.icon_url,
            title: row.title,
        })
    }
}

fn snowflake(id: impl Into<u64>) -> i64 {
    id.into() as i64
}

fn parse_all(rows: Vec<DbBoard>) -> Result<Vec<BoardConfig>> {
    rows.into_iter().map(BoardConfig::try_from).collect()
}

impl BoardConfig {

    pub fn title(&self) -> &str {
        self.title.as_deref().unwrap_or(self.board_type.default_title())
    }

    /// Creates a board, or returns the one already in the channel.
    pub fn create(
        conn: &mut SqliteConnection,
        guild: GuildId,
        channel: ChannelId,
        board_type: BoardType,
        title: Option<&str>,
    ) -> Result<Self> {
        let sort = board_type.default_sort().to_string();
        let kind = board_type.to_string();
        let new_board = NewDbBoard {
            guild_id: snowflake(guild),
            channel_id: snowflake(channel),
            board_type: &kind,
            sort_by: &sort,
            title,
        };

        diesel::insert_into(boards::table)
            .values(&new_board)
            .on_conflict((boards::channel_id, boards::board_type))
            .do_nothing()
            .execute(conn)?;

        Self::by_channel(conn, channel, board_type)?
            .ok_or_else(|| TrackerError::Other(format!("Board in {} vanished after insert", channel)))
    }

    #[cfg(test)]
    pub fn by_id(conn: &mut SqliteConnection, board: i32) -> Result<Option<Self>> {
        boards::table
            .find(board)
            .select(DbBoard::as_select())
            .first(conn)
            .optional()?
            .map(Self::try_from)
            .transpose()
    }

    pub fn by_message(conn: &mut SqliteConnection, message: MessageId) -> Result<Option<Self>> {
        boards::table
            .filter(boards::message_id.eq(snowflake(message)))
            .select(DbBoard::as_select())
            .first(conn)
            .optional()?
            .map(Self::try_from)
            .transpose()
    }

    pub fn by_channel(
        conn: &mut SqliteConnection,
        channel: ChannelId,
        board_type: BoardType,
    ) -> Result<Option<Self>> {
        boards::table
            .filter(boards::channel_id.eq(snowflake(channel)))
            .filter(boards::board_type.eq(board_type.to_string()))
            .select(DbBoard::as_select())
            .first(conn)
            .optional()?
            .map(Self::try_from)
            .transpose()
    }

    pub fn in_channel(conn: &mut SqliteConnection, channel: ChannelId) -> Result<Vec<Self>> {
        let rows = boards::table
            .filter(boards::channel_id.eq(snowflake(channel)))
            .order_by(boards::id.asc())
            .select(DbBoard::as_select())
            .load(conn)?;
        parse_all(rows)
    }

    pub fn in_guild(conn: &mut SqliteConnection, guild: GuildId) -> Result<Vec<Self>> {
        let rows = boards::table
            .filter(boards::guild_id.eq(snowflake(guild)))
            .order_by(boards::id.asc())
            .select(DbBoard::as_select())
            .load(conn)?;
        parse_all(rows)
    }

    /// Boards in channels that track any of `tags`.
    pub fn for_clan_tags(conn: &mut SqliteConnection, tags: &[String]) -> Result<Vec<Self>> {
        if tags.is_empty() {
            return Ok(vec![])
        }

        let rows = boards::table
            .inner_join(clans::table.on(clans::channel_id.eq(boards::channel_id)))
            .filter(clans::clan_tag.eq_any(tags))
            .select(DbBoard::as_select())
            .distinct()
            .load(conn)?;
        parse_all(rows)
    }

    pub fn set_message_id(&mut self, conn: &mut SqliteConnection, message: Option<MessageId>) -> Result<()> {
        diesel::update(boards::table.find(self.id))
            .set(boards::message_id.eq(message.map(snowflake)))
            .execute(conn)?;
        self.message_id = message;
        Ok(())
    }

    pub fn set_sort(&mut self, conn: &mut SqliteConnection, sort: SortKey) -> Result<()> {
        diesel::update(boards::table.find(self.id))
            .set(boards::sort_by.eq(sort.to_string()))
            .execute(conn)?;
        self.sort_by = sort;
        Ok(())
    }

    pub fn set_per_page(&mut self, conn: &mut SqliteConnection, per_page: i32) -> Result<()> {
        diesel::update(boards::table.find(self.id))
            .set(boards::per_page.eq(per_page))
            .execute(conn)?;
        self.per_page = per_page;
        Ok(())
    }

    pub fn set_icon_url(&mut self, conn: &mut SqliteConnection, url: Option<String>) -> Result<()> {
        diesel::update(boards::table.find(self.id))
            .set(boards::icon_url.eq(url.as_deref()))
            .execute(conn)?;
        self.icon_url = url;
        Ok(())
    }

    pub fn clear_icon_url(&mut self, conn: &mut SqliteConnection) -> Result<()> {
        self.set_icon_url(conn, None)
    }

    pub fn set_title(&mut self, conn: &mut SqliteConnection, title: Option<String>) -> Result<()> {
        diesel::update(boards::table.find(self.id))
            .set(boards::title.eq(title.as_deref()))
            .execute(conn)?;
        self.title = title;
        Ok(())
    }

    pub fn set_toggle(&mut self, conn: &mut SqliteConnection, toggle: bool) -> Result<()> {
        diesel::update(boards::table.find(self.id))
            .set(boards::toggle.eq(toggle))
            .execute(conn)?;
        self.toggle = toggle;
        Ok(())
    }

    pub fn delete(self, conn: &mut SqliteConnection) -> Result<usize> {
        diesel::delete(boards::table.find(self.id))
            .execute(conn)
            .map_err(TrackerError::from)
    }

    /// Turns off every board in a channel we can no longer post to.
    pub fn disable_channel(conn: &mut SqliteConnection, channel: ChannelId) -> Result<usize> {
        diesel::update(boards::table)
            .filter(boards::channel_id.eq(snowflake(channel)))
            .set(boards::toggle.eq(false))
            .execute(conn)
            .map_err(TrackerError::from)
    }

    pub fn delete_channel(conn: &mut SqliteConnection, channel: ChannelId) -> Result<usize> {
        diesel::delete(boards::table)
            .filter(boards::channel_id.eq(snowflake(channel)))
            .execute(conn)
            .map_err(TrackerError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::DbClan;
    use crate::db::test_conn;

    const GUILD: GuildId = GuildId::new(691779140059267084);
    const CHANNEL: ChannelId = ChannelId::new(663683345108172830);

    #[test]
    fn create_is_idempotent_and_defaults_sort() {
        let conn = &mut test_conn();

        let board = BoardConfig::create(conn, GUILD, CHANNEL, BoardType::Trophy, None).unwrap();
        assert_eq!(board.sort_by, SortKey::Trophies);
        assert_eq!(board.per_page, 0);
        assert!(board.toggle);
        assert_eq!(board.title(), "Trophy Leaderboard");

        let again = BoardConfig::create(conn, GUILD, CHANNEL, BoardType::Trophy, Some("ignored")).unwrap();
        assert_eq!(again.id, board.id);

        let donation = BoardConfig::create(conn, GUILD, CHANNEL, BoardType::Donation, Some("Zulu")).unwrap();
        assert_ne!(donation.id, board.id);
        assert_eq!(donation.title(), "Zulu");
        assert_eq!(BoardConfig::in_channel(conn, CHANNEL).unwrap().len(), 2);
    }

    #[test]
    fn lookups_by_message_and_clan() {
        let conn = &mut test_conn();
        let mut board = BoardConfig::create(conn, GUILD, CHANNEL, BoardType::Donation, None).unwrap();
        let message = MessageId::new(700000000000000001);

        assert!(BoardConfig::by_message(conn, message).unwrap().is_none());
        board.set_message_id(conn, Some(message)).unwrap();
        assert_eq!(BoardConfig::by_message(conn, message).unwrap().unwrap().id, board.id);

        DbClan::add(conn, snowflake(GUILD), snowflake(CHANNEL), "#P0LYJC8C", "Zulu").unwrap();
        DbClan::add(conn, snowflake(GUILD), snowflake(CHANNEL), "#JY9J2Y99", "Elephino").unwrap();

        let tags = vec!["#P0LYJC8C".to_string(), "#JY9J2Y99".to_string()];
        let found = BoardConfig::for_clan_tags(conn, &tags).unwrap();
        assert_eq!(found.len(), 1);
        assert!(BoardConfig::for_clan_tags(conn, &["#NOPE".to_string()]).unwrap().is_empty());
        assert!(BoardConfig::for_clan_tags(conn, &[]).unwrap().is_empty());
    }

    #[test]
    fn mutations_persist() {
        let conn = &mut test_conn();
        let mut board = BoardConfig::create(conn, GUILD, CHANNEL, BoardType::Donation, None).unwrap();

        board.set_sort(conn, SortKey::Ratio).unwrap();
        board.set_per_page(conn, 10).unwrap();
        board.set_icon_url(conn, Some("https://example.com/icon.png".into())).unwrap();
        board.set_title(conn, Some("Reddit".into())).unwrap();

        let stored = BoardConfig::by_id(conn, board.id).unwrap().unwrap();
        assert_eq!(stored, board);

        assert_eq!(BoardConfig::disable_channel(conn, CHANNEL).unwrap(), 1);
        assert!(!BoardConfig::by_id(conn, board.id).unwrap().unwrap().toggle);

        assert_eq!(BoardConfig::delete_channel(conn, CHANNEL).unwrap(), 1);
        assert!(BoardConfig::by_id(conn, board.id).unwrap().is_none());
    }

    #[test]
    fn unknown_sort_is_reported() {
        let conn = &mut test_conn();
        let board = BoardConfig::create(conn, GUILD, CHANNEL, BoardType::Donation, None).unwrap();
        diesel::update(boards::table.find(board.id))
            .set(boards::sort_by.eq("received"))
            .execute(conn)
            .unwrap();

        let err = BoardConfig::by_id(conn, board.id).unwrap_err();
        assert!(matches!(err, TrackerError::InvalidBoardConfig { field: "sort_by", .. }));
    }
}
