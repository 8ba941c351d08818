use serenity::all::{CreateEmbed, GuildChannel};
use poise::CreateReply;
use tracing::info;

use crate::coc::correct_tag;
use crate::db::db_conn;
use crate::error::Result;
use crate::models::DbClan;

use super::{require_guild, target_channel, Context};

/// Link clans to channels so their boards and stats track them
#[poise::command(
    slash_command,
    prefix_command,
    guild_only,
    subcommands("clan_add", "clan_remove", "clan_list"),
    subcommand_required
)]
pub async fn clan(_: Context<'_>) -> Result<()> { Ok(()) }

/// Tracks a clan in a channel
#[poise::command(slash_command, prefix_command, rename = "add", required_permissions = "MANAGE_GUILD")]
async fn clan_add(
    ctx: Context<'_>,
    #[description = "Clan tag"] tag: String,
    #[description = "Channel (defaults to this one)"] channel: Option<GuildChannel>,
) -> Result<()> {
    let guild_id = require_guild(ctx)?;
    let channel_id = target_channel(ctx, channel);
    let tag = correct_tag(&tag);

    let clan = ctx.data().state.coc.get_clan(&tag).await?;

    let added = {
        let conn = &mut db_conn()?;
        DbClan::add(conn, guild_id.get() as i64, channel_id.get() as i64, &tag, &clan.name)?
    };

    let reply = if added {
        info!("Tracking {} ({}) in {}", clan.name, tag, channel_id);
        format!("Now tracking **{}** (`{}`) in <#{}>.", clan.name, tag, channel_id)
    } else {
        format!("**{}** is already tracked in <#{}>.", clan.name, channel_id)
    };
    ctx.say(reply).await?;
    Ok(())
}

/// Stops tracking a clan in a channel
#[poise::command(slash_command, prefix_command, rename = "remove", required_permissions = "MANAGE_GUILD")]
async fn clan_remove(
    ctx: Context<'_>,
    #[description = "Clan tag"] tag: String,
    #[description = "Channel (defaults to this one)"] channel: Option<GuildChannel>,
) -> Result<()> {
    let channel_id = target_channel(ctx, channel);
    let tag = correct_tag(&tag);

    let removed = {
        let conn = &mut db_conn()?;
        DbClan::remove(conn, &tag, channel_id.get() as i64)?
    };

    let reply = match removed {
        0 => format!("`{}` isn't tracked in <#{}>.", tag, channel_id),
        _ => format!("Stopped tracking `{}` in <#{}>.", tag, channel_id),
    };
    ctx.say(reply).await?;
    Ok(())
}

fn clan_lines(clans: &[DbClan]) -> String {
    clans.iter()
        .map(|c| format!("**{}** `{}` in <#{}>", c.clan_name, c.clan_tag, c.channel_id))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Lists the clans tracked in this server
#[poise::command(slash_command, prefix_command, rename = "list")]
async fn clan_list(ctx: Context<'_>) -> Result<()> {
    let guild_id = require_guild(ctx)?;
    let clans = {
        let conn = &mut db_conn()?;
        DbClan::in_guild(conn, guild_id.get() as i64)?
    };

    if clans.is_empty() {
        ctx.say("No clans are tracked here yet. Add one with `clan add`.").await?;
        return Ok(())
    }

    let embed = CreateEmbed::new()
        .title("Tracked clans")
        .description(clan_lines(&clans));
    ctx.send(CreateReply::default().embed(embed)).await?;
    Ok(())
}
