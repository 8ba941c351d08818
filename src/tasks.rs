//! Background loops: pulling stats from the game API, and pushing
//! the changes out to the boards.

use std::time::Duration;

use chrono::Utc;
use serenity::all::Context;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::board::{update_board, BoardConfig, Navigation};
use crate::coc::CocClient;
use crate::db::db_conn;
use crate::db::players::PlayerStats;
use crate::error::Result;
use crate::models::{DbClan, DbPlayer, DbSeason};
use crate::subsystems::{BoardUpdates, Tracker};

/// Starts every loop on its own task.
pub fn spawn_loops(ctx: &Context, sync_every: Duration, board_every: Duration, global_every: Duration) {
    let sync_ctx = ctx.clone();
    tokio::spawn(async move {
        let mut timer = interval(sync_every);
        timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            timer.tick().await;
            if let Err(e) = sync_clans(&sync_ctx).await {
                error!("Stats sync failed: {}", e);
            }
        }
    });

    let board_ctx = ctx.clone();
    tokio::spawn(async move {
        let mut timer = interval(board_every);
        timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            timer.tick().await;
            if let Err(e) = update_changed_boards(&board_ctx).await {
                error!("Board loop failed: {}", e);
            }
        }
    });

    let global_ctx = ctx.clone();
    tokio::spawn(async move {
        let mut timer = interval(global_every);
        timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            timer.tick().await;
            if let Err(e) = update_global_boards(&global_ctx).await {
                error!("Global board loop failed: {}", e);
            }
        }
    });

    info!(
        sync_secs = sync_every.as_secs(),
        board_secs = board_every.as_secs(),
        global_secs = global_every.as_secs(),
        "Started background loops"
    );
}

/// Fetches every tracked clan and records its members for the
/// current season. Changed clans are queued for the board loop.
pub async fn sync_clans(ctx: &Context) -> Result<()> {
    let state = Tracker::get(ctx).await?;

    let (season, tags) = {
        let conn = &mut db_conn()?;
        let season = DbSeason::ensure_current(conn, Utc::now().naive_utc())?;
        (season.id, DbClan::distinct_tags(conn)?)
    };

    let mut changed = vec![];
    for tag in tags {
        match sync_clan(&state.coc, &tag, season).await {
            Ok(true) => changed.push(tag),
            Ok(false) => {},
            Err(e) => warn!("Unable to sync clan {}: {}", tag, e),
        }
    }

    debug!("{} clans changed in season {}", changed.len(), season);
    BoardUpdates::push(ctx, changed).await
}

/// Returns whether anything about the clan's members changed.
async fn sync_clan(coc: &CocClient, tag: &str, season: i32) -> Result<bool> {
    let clan = coc.get_clan(tag).await?;
    let now = Utc::now().naive_utc();

    let mut changed = false;
    let mut stale_wins = vec![];
    {
        let conn = &mut db_conn()?;
        DbClan::set_name(conn, tag, &clan.name)?;

        for member in &clan.member_list {
            let stats = PlayerStats {
                tag: &member.tag,
                name: &member.name,
                clan_tag: tag,
                donations: member.donations,
                received: member.donations_received,
                trophies: member.trophies,
            };
            let change = DbPlayer::record(conn, &stats, season, now)?;
            changed |= change.is_change();
            if change.needs_wins() {
                stale_wins.push(member.tag.clone());
            }
        }
    }

    // Wins aren't in the clan member list
    for player_tag in stale_wins {
        match coc.get_player(&player_tag).await {
            Ok(player) => {
                let conn = &mut db_conn()?;
                DbPlayer::set_wins(conn, &player_tag, season, player.attack_wins, player.defense_wins)?;
            },
            Err(e) => warn!("Unable to fetch player {}: {}", player_tag, e),
        }
    }

    Ok(changed)
}

/// Drains the batch buffer and updates every board tracking a
/// changed clan.
pub async fn update_changed_boards(ctx: &Context) -> Result<()> {
    let tags = BoardUpdates::drain(ctx).await?;
    if tags.is_empty() {
        return Ok(())
    }

    let boards = {
        let conn = &mut db_conn()?;
        BoardConfig::for_clan_tags(conn, &tags)?
    };
    debug!("{} clans changed, updating {} boards", tags.len(), boards.len());

    for board in boards {
        let (id, channel) = (board.id, board.channel_id);
        match update_board(ctx, board, Navigation::STAY).await {
            Ok(()) => BoardUpdates::mark_channel(ctx, channel).await?,
            Err(e) => error!("Failed to update board {} in {}: {}", id, channel, e),
        }
    }

    Ok(())
}

/// Resets the boards in the global board channel back to page 1.
pub async fn update_global_boards(ctx: &Context) -> Result<()> {
    let state = Tracker::get(ctx).await?;
    let Some(channel) = state.config.global_board_channel else {
        return Ok(())
    };

    let boards = {
        let conn = &mut db_conn()?;
        BoardConfig::in_channel(conn, channel)?
    };

    for board in boards {
        let id = board.id;
        match update_board(ctx, board, Navigation::RESET).await {
            Ok(()) => BoardUpdates::mark_channel(ctx, channel).await?,
            Err(e) => error!("Failed to update global board {}: {}", id, e),
        }
    }

    Ok(())
}
