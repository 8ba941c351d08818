use chrono::NaiveDateTime;
use diesel::prelude::*;

use crate::schema::{boards, clans, commands, events, guilds, players, seasons};

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = boards)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct DbBoard {
    pub id: i32,
    pub guild_id: i64,
    pub channel_id: i64,
    pub message_id: Option<i64>,
    pub board_type: String,
    pub sort_by: String,
    pub per_page: i32,
    pub toggle: bool,
    pub icon_url: Option<String>,
    pub title: Option<String>,
}

#[derive(Insertable)]
#[diesel(table_name = boards)]
pub struct NewDbBoard<'a> {
    pub guild_id: i64,
    pub channel_id: i64,
    pub board_type: &'a str,
    pub sort_by: &'a str,
    pub title: Option<&'a str>,
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = clans)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct DbClan {
    pub id: i32,
    pub guild_id: i64,
    pub channel_id: i64,
    pub clan_tag: String,
    pub clan_name: String,
    pub in_event: bool,
}

#[derive(Insertable)]
#[diesel(table_name = clans)]
pub struct NewDbClan<'a> {
    pub guild_id: i64,
    pub channel_id: i64,
    pub clan_tag: &'a str,
    pub clan_name: &'a str,
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = players)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct DbPlayer {
    pub id: i32,
    pub player_tag: String,
    pub player_name: String,
    pub clan_tag: String,
    pub season_id: i32,
    pub donations: i32,
    pub received: i32,
    pub trophies: i32,
    pub start_trophies: i32,
    pub attack_wins: i32,
    pub defense_wins: i32,
    pub user_id: Option<i64>,
    pub last_updated: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = players)]
pub struct NewDbPlayer<'a> {
    pub player_tag: &'a str,
    pub player_name: &'a str,
    pub clan_tag: &'a str,
    pub season_id: i32,
    pub donations: i32,
    pub received: i32,
    pub trophies: i32,
    pub start_trophies: i32,
    pub last_updated: NaiveDateTime,
}

#[derive(Debug, Clone, Copy, Queryable, Selectable, Insertable)]
#[diesel(table_name = seasons)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct DbSeason {
    pub id: i32,
    pub start: NaiveDateTime,
    pub finish: NaiveDateTime,
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = events)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct DbEvent {
    pub id: i32,
    pub guild_id: i64,
    pub event_name: String,
    pub start: NaiveDateTime,
    pub finish: NaiveDateTime,
    pub channel_id: Option<i64>,
}

#[derive(Insertable)]
#[diesel(table_name = events)]
pub struct NewDbEvent<'a> {
    pub guild_id: i64,
    pub event_name: &'a str,
    pub start: NaiveDateTime,
    pub finish: NaiveDateTime,
    pub channel_id: Option<i64>,
}

#[derive(Insertable)]
#[diesel(table_name = guilds)]
pub struct NewDbGuild {
    pub guild_id: i64,
}

#[derive(Insertable)]
#[diesel(table_name = commands)]
pub struct NewCommandUse<'a> {
    pub guild_id: Option<i64>,
    pub channel_id: i64,
    pub author_id: i64,
    pub used: NaiveDateTime,
    pub prefix: &'a str,
    pub command: &'a str,
}
