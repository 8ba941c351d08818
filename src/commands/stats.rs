use poise::CreateReply;
use serenity::all::{CreateEmbed, CreateEmbedFooter};

use crate::coc::correct_tag;
use crate::db::db_conn;
use crate::db::players::{StatColumn, StatScope};
use crate::error::Result;
use crate::models::{DbPlayer, DbSeason};
use crate::table::TextTable;

use super::Context;

const PER_PAGE: usize = 20;

fn title(column: StatColumn) -> &'static str {
    match column {
        StatColumn::Donations => "Top Donations",
        StatColumn::Gain => "Top Trophy Gains",
        StatColumn::AttackWins => "Attack Wins",
        StatColumn::DefenseWins => "Defense Wins",
    }
}

fn headers(column: StatColumn) -> &'static [&'static str] {
    match column {
        StatColumn::Donations => &["#", "Player", "Don", "Rec"],
        StatColumn::Gain => &["#", "Player", "Gain", "Trophies"],
        StatColumn::AttackWins => &["#", "Player", "Attacks"],
        StatColumn::DefenseWins => &["#", "Player", "Defenses"],
    }
}

fn row(column: StatColumn, rank: usize, player: &DbPlayer) -> Vec<String> {
    let mut cells = vec![rank.to_string(), player.player_name.clone()];
    match column {
        StatColumn::Donations => {
            cells.push(player.donations.to_string());
            cells.push(player.received.to_string());
        },
        StatColumn::Gain => {
            cells.push(format!("{:+}", player.gain()));
            cells.push(player.trophies.to_string());
        },
        StatColumn::AttackWins => cells.push(player.attack_wins.to_string()),
        StatColumn::DefenseWins => cells.push(player.defense_wins.to_string()),
    }
    cells
}

/// One page of the table, with the page actually shown and the page count.
fn stats_page(column: StatColumn, players: &[DbPlayer], page: usize) -> (String, usize, usize) {
    let pages = players.len().div_ceil(PER_PAGE).max(1);
    let page = page.clamp(1, pages);
    let offset = (page - 1) * PER_PAGE;

    let mut table = TextTable::new(headers(column).iter().copied());
    for (i, player) in players.iter().enumerate().skip(offset).take(PER_PAGE) {
        table.add_row(row(column, i + 1, player));
    }
    (table.render(), page, pages)
}

async fn show_stats(
    ctx: Context<'_>,
    column: StatColumn,
    clan: Option<String>,
    page: Option<u32>,
) -> Result<()> {
    let tag = clan.as_deref().map(correct_tag);
    let scope = match (clan.as_deref(), tag.as_deref()) {
        (Some(name), Some(tag)) => StatScope::Clan { tag, name },
        _ => StatScope::Channel(ctx.channel_id().get() as i64),
    };

    let players = {
        let conn = &mut db_conn()?;
        let season = DbSeason::current_id(conn)?;
        DbPlayer::ranked(conn, &scope, season, column)?
    };

    if players.is_empty() {
        let reply = match clan {
            Some(clan) => format!("No players found for `{}` this season.", clan),
            None => "No clans are tracked in this channel. Add one with `clan add`.".to_string(),
        };
        ctx.say(reply).await?;
        return Ok(())
    }

    let (table, page, pages) = stats_page(column, &players, page.unwrap_or(1) as usize);
    let embed = CreateEmbed::new()
        .title(title(column))
        .description(table)
        .footer(CreateEmbedFooter::new(format!("Page {}/{}", page, pages)));
    ctx.send(CreateReply::default().embed(embed)).await?;
    Ok(())
}

/// Season stats for a clan, or the clans tracked in this channel
#[poise::command(
    slash_command,
    prefix_command,
    guild_only,
    subcommands("stats_donations", "stats_gains", "stats_attacks", "stats_defenses"),
    subcommand_required
)]
pub async fn stats(_: Context<'_>) -> Result<()> { Ok(()) }

/// Top donators
#[poise::command(slash_command, prefix_command, rename = "donations", aliases("donation", "donors"))]
async fn stats_donations(
    ctx: Context<'_>,
    #[description = "Clan tag or name (defaults to this channel's clans)"] clan: Option<String>,
    #[description = "Page"] #[min = 1] page: Option<u32>,
) -> Result<()> {
    show_stats(ctx, StatColumn::Donations, clan, page).await
}

/// Top trophy gainers
#[poise::command(slash_command, prefix_command, rename = "gains", aliases("gain", "trophies"))]
async fn stats_gains(
    ctx: Context<'_>,
    #[description = "Clan tag or name (defaults to this channel's clans)"] clan: Option<String>,
    #[description = "Page"] #[min = 1] page: Option<u32>,
) -> Result<()> {
    show_stats(ctx, StatColumn::Gain, clan, page).await
}

/// Top attack wins
#[poise::command(slash_command, prefix_command, rename = "attacks")]
async fn stats_attacks(
    ctx: Context<'_>,
    #[description = "Clan tag or name (defaults to this channel's clans)"] clan: Option<String>,
    #[description = "Page"] #[min = 1] page: Option<u32>,
) -> Result<()> {
    show_stats(ctx, StatColumn::AttackWins, clan, page).await
}

/// Top defense wins
#[poise::command(slash_command, prefix_command, rename = "defenses", aliases("defense", "defences", "defence"))]
async fn stats_defenses(
    ctx: Context<'_>,
    #[description = "Clan tag or name (defaults to this channel's clans)"] clan: Option<String>,
    #[description = "Page"] #[min = 1] page: Option<u32>,
) -> Result<()> {
    show_stats(ctx, StatColumn::DefenseWins, clan, page).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn player(i: usize) -> DbPlayer {
        DbPlayer {
            id: i as i32,
            player_tag: format!("#P{}", i),
            player_name: format!("player{}", i),
            clan_tag: "#P0LYJC8C".to_string(),
            season_id: 1,
            donations: 1000 - i as i32,
            received: 10,
            trophies: 5000,
            start_trophies: 4900,
            attack_wins: 3,
            defense_wins: 1,
            user_id: None,
            last_updated: NaiveDate::from_ymd_opt(2024, 6, 10).unwrap().and_hms_opt(0, 0, 0).unwrap(),
        }
    }

    #[test]
    fn pages_hold_twenty_rows() {
        let players: Vec<_> = (0..45).map(player).collect();

        let (table, page, pages) = stats_page(StatColumn::Donations, &players, 1);
        assert_eq!((page, pages), (1, 3));
        // code fences, header, rows
        assert_eq!(table.lines().count(), 2 + 1 + 20);

        let (table, page, _) = stats_page(StatColumn::Donations, &players, 3);
        assert_eq!(page, 3);
        assert_eq!(table.lines().count(), 2 + 1 + 5);
        assert!(table.contains("41  player40"));
    }

    #[test]
    fn out_of_range_pages_are_clamped() {
        let players: Vec<_> = (0..3).map(player).collect();
        assert_eq!(stats_page(StatColumn::AttackWins, &players, 9).1, 1);
        assert_eq!(stats_page(StatColumn::AttackWins, &[], 0).2, 1);
    }

    #[test]
    fn gain_rows_are_signed() {
        assert_eq!(row(StatColumn::Gain, 1, &player(0)), ["1", "player0", "+100", "5000"]);
        assert_eq!(row(StatColumn::DefenseWins, 2, &player(1)), ["2", "player1", "1"]);
    }
}
