use diesel::sqlite::SqliteConnection;
use serenity::all::UserId;
use tracing::info;

use crate::coc::correct_tag;
use crate::db::db_conn;
use crate::error::Result;
use crate::models::{DbPlayer, DbSeason};

use super::Context;

/// Tags start with `#`; anything else is looked up as a name.
fn lookup_key(player: &str) -> String {
    let player = player.trim();
    if player.starts_with('#') {
        correct_tag(player)
    } else {
        player.to_string()
    }
}

async fn find_player(ctx: Context<'_>, player: &str) -> Result<Option<(DbPlayer, i32)>> {
    let found = {
        let conn = &mut db_conn()?;
        let season = DbSeason::current_id(conn)?;
        DbPlayer::find(conn, &lookup_key(player), season)?.map(|p| (p, season))
    };

    if found.is_none() {
        ctx.say(format!("I couldn't find `{}` in any tracked clan this season.", player)).await?;
    }
    Ok(found)
}

/// Whether the author may act for other players: owners, and
/// members with Manage Server.
async fn can_manage(ctx: Context<'_>) -> bool {
    if ctx.framework().options().owners.contains(&ctx.author().id) {
        return true
    }
    let Some(member) = ctx.author_member().await else { return false };
    let manage = ctx.guild()
        .map(|guild| guild.member_permissions(&member).manage_guild())
        .unwrap_or(false);
    manage
}

/// Links a player to your discord account
#[poise::command(slash_command, prefix_command, guild_only)]
pub async fn claim(
    ctx: Context<'_>,
    #[description = "Player tag or name"] player: String,
) -> Result<()> {
    let Some((found, season)) = find_player(ctx, &player).await? else { return Ok(()) };
    let author = ctx.author().id;

    if let Some(owner) = found.user_id.map(|id| UserId::new(id as u64)) {
        let reply = if owner == author {
            format!("You have already claimed **{}**.", found.player_name)
        } else {
            format!("**{}** is already claimed by <@{}>.", found.player_name, owner)
        };
        ctx.say(reply).await?;
        return Ok(())
    }

    {
        let conn = &mut db_conn()?;
        DbPlayer::set_user(conn, &found.player_tag, season, Some(author.get() as i64))?;
    }
    info!("{} claimed {}", author, found.player_tag);

    ctx.say(format!("**{}** (`{}`) is now linked to you.", found.player_name, found.player_tag)).await?;
    Ok(())
}

/// Unlinks a player. Unlinking someone else's needs Manage Server.
#[poise::command(slash_command, prefix_command, guild_only)]
pub async fn unclaim(
    ctx: Context<'_>,
    #[description = "Player tag or name"] player: String,
) -> Result<()> {
    let Some((found, season)) = find_player(ctx, &player).await? else { return Ok(()) };

    let Some(owner) = found.user_id.map(|id| UserId::new(id as u64)) else {
        ctx.say(format!("**{}** isn't claimed.", found.player_name)).await?;
        return Ok(())
    };
    if owner != ctx.author().id && !can_manage(ctx).await {
        ctx.say(format!("**{}** belongs to <@{}>, only they or a server manager can unclaim it.", found.player_name, owner)).await?;
        return Ok(())
    }

    {
        let conn = &mut db_conn()?;
        DbPlayer::set_user(conn, &found.player_tag, season, None)?;
    }
    info!("{} unclaimed {}", ctx.author().id, found.player_tag);

    ctx.say(format!("**{}** is no longer linked to <@{}>.", found.player_name, owner)).await?;
    Ok(())
}

/// Deletes every season's rows of the player `key` names, resolving a
/// name through this season. Returns the tag and how many rows went.
fn remove_player_rows(conn: &mut SqliteConnection, key: &str, season: i32) -> Result<(String, usize)> {
    let tag = match DbPlayer::find(conn, key, season)? {
        Some(player) => player.player_tag,
        None => key.to_string(),
    };
    let removed = DbPlayer::delete_all(conn, &tag)?;
    Ok((tag, removed))
}

/// Removes a player from the database
#[poise::command(prefix_command, owners_only, hide_in_help, rename = "removeplayer")]
pub async fn remove_player(
    ctx: Context<'_>,
    #[description = "Player tag or name"]
    #[rest]
    player: String,
) -> Result<()> {
    let (tag, removed) = {
        let conn = &mut db_conn()?;
        let season = DbSeason::current_id(conn)?;
        remove_player_rows(conn, &lookup_key(&player), season)?
    };

    if removed == 0 {
        ctx.say(format!("`{}` was not found in the database.", player)).await?;
        return Ok(())
    }
    info!("{} removed {} ({} rows)", ctx.author().id, tag, removed);

    ctx.say(format!("Removed `{}` from {} season(s).", tag, removed)).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use crate::db::players::PlayerStats;
    use crate::db::test_conn;

    #[test]
    fn tags_are_corrected_and_names_kept() {
        assert_eq!(lookup_key(" #2ppo "), "#2PP0");
        assert_eq!(lookup_key("mathsman"), "mathsman");
        assert_eq!(lookup_key("Oscar"), "Oscar");
    }

    #[test]
    fn removing_a_player_clears_every_season() {
        let conn = &mut test_conn();
        let now = Utc::now().naive_utc();
        let season = DbSeason::ensure_current(conn, now - Duration::days(1)).unwrap().id;

        let stats = PlayerStats {
            tag: "#P0LYJC8C",
            name: "mathsman",
            clan_tag: "#ZULU",
            donations: 10,
            received: 5,
            trophies: 3000,
        };
        DbPlayer::record(conn, &stats, season, now).unwrap();
        DbPlayer::record(conn, &PlayerStats { tag: "#2PP0", name: "bravo", ..stats.clone() }, season, now).unwrap();

        let (tag, removed) = remove_player_rows(conn, "mathsman", season).unwrap();
        assert_eq!((tag.as_str(), removed), ("#P0LYJC8C", 1));
        assert!(DbPlayer::get(conn, "#P0LYJC8C", season).unwrap().is_none());
        assert!(DbPlayer::get(conn, "#2PP0", season).unwrap().is_some());

        let (_, removed) = remove_player_rows(conn, "#NOPE", season).unwrap();
        assert_eq!(removed, 0);
    }
}
