//! Chat commands, prefix and slash.

mod board;
mod claim;
mod clan;
mod event;
mod meta;
mod stats;

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use serenity::all::{ChannelId, GuildChannel, GuildId};
use tracing::{error, info, warn};

use crate::db::commands::log_command_use;
use crate::db::db_conn;
use crate::error::{TrackerError, Result};
use crate::models::NewCommandUse;
use crate::subsystems::TrackerState;
use crate::tasks::spawn_loops;

pub struct Data {
    pub state: Arc<TrackerState>,
}
pub type Context<'a> = poise::Context<'a, Data, TrackerError>;

/// The channel given as an argument, or the one the command was used in.
fn target_channel(ctx: Context<'_>, channel: Option<GuildChannel>) -> ChannelId {
    channel.map(|c| c.id).unwrap_or_else(|| ctx.channel_id())
}

fn require_guild(ctx: Context<'_>) -> Result<GuildId> {
    ctx.guild_id()
        .ok_or_else(|| TrackerError::Other("This command only works in a server".to_string()))
}

/// Message shown to the user for errors they can do something about.
fn user_message(err: &TrackerError) -> Option<String> {
    match err {
        TrackerError::CocNotFoundError(tag) => Some(format!("`{}` was not found in Clash of Clans.", tag)),
        TrackerError::NoSeasonError => Some("Stats haven't been collected yet, try again in a few minutes.".to_string()),
        TrackerError::Other(message) => Some(message.clone()),
        _ => None,
    }
}

async fn error_handler(error: poise::FrameworkError<'_, Data, TrackerError>) {
    match error {
        poise::FrameworkError::Command { error, ctx, .. } => {
            let reply = match user_message(&error) {
                Some(message) => message,
                None => {
                    error!("Command `{}` failed: {:?}", ctx.command().qualified_name, error);
                    "Oh noes, something went wrong running that command.".to_string()
                },
            };
            if let Err(e) = ctx.say(reply).await {
                error!("Unable to send error reply: {}", e);
            }
        },
        other => {
            if let Err(e) = poise::builtins::on_error(other).await {
                error!("Error while handling error: {}", e);
            }
        },
    }
}

async fn log_usage(ctx: Context<'_>) {
    let command = ctx.command().qualified_name.clone();
    info!(command = %command, author = %ctx.author().id, "Command invoked");

    let usage = NewCommandUse {
        guild_id: ctx.guild_id().map(|g| g.get() as i64),
        channel_id: ctx.channel_id().get() as i64,
        author_id: ctx.author().id.get() as i64,
        used: Utc::now().naive_utc(),
        prefix: ctx.prefix(),
        command: &command,
    };

    let logged = db_conn().and_then(|mut conn| log_command_use(&mut conn, &usage));
    if let Err(e) = logged {
        warn!("Unable to record use of `{}`: {}", command, e);
    }
}

/// Wrapper for the framework building
pub fn tracker_framework(state: Arc<TrackerState>) -> poise::Framework<Data, TrackerError> {

    let mut owners = HashSet::new();
    if let Some(owner) = state.config.owner {
        owners.insert(owner);
    }

    let options = poise::FrameworkOptions {
        commands: vec![
            meta::help(),
            meta::ping(),
            meta::invite(),
            meta::usage(),
            board::board(),
            board::forceboard(),
            clan::clan(),
            event::event(),
            stats::stats(),
            claim::claim(),
            claim::unclaim(),
            claim::remove_player(),
        ],
        prefix_options: poise::PrefixFrameworkOptions {
            prefix: Some(state.config.prefix.clone()),
            ..Default::default()
        },
        owners,
        on_error: |error| Box::pin(error_handler(error)),
        pre_command: |ctx| Box::pin(log_usage(ctx)),
        ..Default::default()
    };

    poise::Framework::builder()
        .options(options)
        .setup(move |ctx, ready, framework| {
            Box::pin(async move {
                let commands = &framework.options().commands;
                match state.config.dev_guild {
                    Some(guild_id) => poise::builtins::register_in_guild(ctx, commands, guild_id).await?,
                    None => poise::builtins::register_globally(ctx, commands).await?,
                }
                info!("{} is connected, {} commands registered", ready.user.name, commands.len());

                spawn_loops(
                    ctx,
                    state.config.sync_interval,
                    state.config.board_interval,
                    state.config.global_board_interval,
                );

                Ok(Data { state })
            })
        })
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_actionable_errors_reach_the_user() {
        let not_found = TrackerError::CocNotFoundError("#P0LYJC8C".to_string());
        assert_eq!(
            user_message(&not_found).unwrap(),
            "`#P0LYJC8C` was not found in Clash of Clans."
        );
        assert!(user_message(&TrackerError::NoSeasonError).is_some());
        assert!(user_message(&TrackerError::TypeMapMissingKeyError("Tracker".into())).is_none());
    }
}
