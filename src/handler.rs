use serenity::all::{
    ChannelId, CreateMessage, Guild, GuildChannel, GuildId, Message, MessageId, Reaction,
    UnavailableGuild,
};
use serenity::async_trait;
use serenity::prelude::*;
use tracing::{error, info, warn};

use crate::board::updater::replace_message;
use crate::board::{handle_reaction, BoardConfig};
use crate::db::db_conn;
use crate::db::guilds::add_guild;
use crate::error::{TrackerError, Result};
use crate::models::DbClan;
use crate::subsystems::{BoardUpdates, PendingDeletes};

const WELCOME: &str = "Hi there! Thanks for adding me. My prefix is `+`, and slash commands work too. \
    To get started, link a clan to a channel with `/clan add`, then put a leaderboard \
    in that channel with `/board add`. `/help` lists everything else.";

/// Gateway events the boards need to react to.
pub struct BoardHandler;

#[async_trait]
impl EventHandler for BoardHandler {
    async fn reaction_add(&self, ctx: Context, reaction: Reaction) {
        if let Err(e) = handle_reaction(&ctx, &reaction).await {
            log_error("reaction add", e);
        }
    }

    async fn reaction_remove(&self, ctx: Context, reaction: Reaction) {
        if let Err(e) = handle_reaction(&ctx, &reaction).await {
            log_error("reaction remove", e);
        }
    }

    async fn channel_delete(&self, ctx: Context, channel: GuildChannel, _messages: Option<Vec<Message>>) {
        if let Err(e) = forget_channel(&ctx, channel.id).await {
            log_error("channel delete", e);
        }
    }

    async fn message_delete(
        &self,
        ctx: Context,
        _channel_id: ChannelId,
        message_id: MessageId,
        _guild_id: Option<GuildId>,
    ) {
        if let Err(e) = message_deleted(&ctx, message_id).await {
            log_error("message delete", e);
        }
    }

    async fn message_delete_bulk(
        &self,
        ctx: Context,
        _channel_id: ChannelId,
        message_ids: Vec<MessageId>,
        _guild_id: Option<GuildId>,
    ) {
        for message_id in message_ids {
            if let Err(e) = message_deleted(&ctx, message_id).await {
                log_error("bulk message delete", e);
            }
        }
    }

    async fn guild_create(&self, ctx: Context, guild: Guild, is_new: Option<bool>) {
        if is_new != Some(true) {
            return
        }
        if let Err(e) = guild_joined(&ctx, &guild).await {
            log_error("guild create", e);
        }
    }

    async fn guild_delete(&self, _ctx: Context, incomplete: UnavailableGuild, full: Option<Guild>) {
        if incomplete.unavailable {
            return
        }
        let name = full.map(|g| g.name).unwrap_or_default();
        info!("Left guild {} ({})", name, incomplete.id);
    }
}

fn log_error(event: &str, err: TrackerError) {
    error!("[{}] {}", event, err);
}

async fn forget_channel(ctx: &Context, channel: ChannelId) -> Result<()> {
    let (boards, clans) = {
        let conn = &mut db_conn()?;
        (
            BoardConfig::delete_channel(conn, channel)?,
            DbClan::delete_channel(conn, channel.get() as i64)?,
        )
    };
    BoardUpdates::forget_channel(ctx, channel).await?;

    if boards + clans > 0 {
        info!("Channel {} deleted: removed {} boards and {} clans", channel, boards, clans);
    }
    Ok(())
}

async fn message_deleted(ctx: &Context, message_id: MessageId) -> Result<()> {
    if PendingDeletes::take(ctx, message_id).await? {
        return Ok(())
    }
    replace_message(ctx, message_id).await
}

async fn guild_joined(ctx: &Context, guild: &Guild) -> Result<()> {
    let added = {
        let conn = &mut db_conn()?;
        add_guild(conn, guild.id.get() as i64)?
    };
    info!("Joined guild {} ({}), {} members", guild.name, guild.id, guild.member_count);

    if !added {
        return Ok(())
    }
    if let Some(channel) = guild.system_channel_id {
        if let Err(e) = channel.send_message(ctx, CreateMessage::new().content(WELCOME)).await {
            warn!("Unable to welcome guild {}: {}", guild.id, e);
        }
    }
    Ok(())
}
