use std::time::Instant;

use poise::builtins::HelpConfiguration;
use poise::CreateReply;
use serenity::all::{Permissions, UserId};

use crate::db::commands::command_counts;
use crate::db::db_conn;
use crate::error::Result;
use crate::table::TextTable;

use super::Context;

/// Permissions the boards need: posting, attaching images and
/// managing the reaction controls.
fn invite_permissions() -> Permissions {
    Permissions::VIEW_CHANNEL
        | Permissions::SEND_MESSAGES
        | Permissions::MANAGE_MESSAGES
        | Permissions::EMBED_LINKS
        | Permissions::ATTACH_FILES
        | Permissions::READ_MESSAGE_HISTORY
        | Permissions::ADD_REACTIONS
        | Permissions::USE_EXTERNAL_EMOJIS
}

fn invite_url(bot_id: UserId) -> String {
    format!(
        "https://discord.com/oauth2/authorize?client_id={}&scope=bot%20applications.commands&permissions={}",
        bot_id,
        invite_permissions().bits(),
    )
}

#[poise::command(slash_command, prefix_command)]
pub async fn ping(ctx: Context<'_>) -> Result<()> {
    let started = Instant::now();
    let reply = ctx.say("Pong!").await?;
    let content = format!("Pong! {}ms", started.elapsed().as_millis());
    reply.edit(ctx, CreateReply::default().content(content)).await?;
    Ok(())
}

fn help_footer(prefix: &str) -> String {
    format!(
        "Type {p}help <command> for more about a command. \
         A board shows the clans linked to its channel: set one up with \
         {p}board add, then {p}clan add #CLANTAG in the same channel.",
        p = prefix,
    )
}

/// Shows what the bot can do, or more about one command
#[poise::command(slash_command, prefix_command)]
pub async fn help(
    ctx: Context<'_>,
    #[description = "Command to explain"] command: Option<String>,
) -> Result<()> {
    let footer = help_footer(&ctx.data().state.config.prefix);
    let config = HelpConfiguration {
        extra_text_at_bottom: &footer,
        ..Default::default()
    };

    poise::builtins::help(ctx, command.as_deref(), config).await?;
    Ok(())
}

/// Get an invite to add the bot to your server
#[poise::command(slash_command, prefix_command, aliases("join"))]
pub async fn invite(ctx: Context<'_>) -> Result<()> {
    let url = invite_url(ctx.framework().bot_id);
    ctx.say(format!("<{}>", url)).await?;
    Ok(())
}

/// How often each command has been used
#[poise::command(prefix_command, owners_only, hide_in_help)]
pub async fn usage(ctx: Context<'_>) -> Result<()> {
    let counts = {
        let conn = &mut db_conn()?;
        command_counts(conn)?
    };

    let mut table = TextTable::new(["Command", "Uses"]);
    for (command, uses) in counts {
        table.add_row([command, uses.to_string()]);
    }
    ctx.say(table.render()).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invite_asks_for_board_permissions() {
        let url = invite_url(UserId::new(427301910291415051));
        assert!(url.contains("client_id=427301910291415051"));

        let perms = invite_permissions();
        assert!(perms.attach_files() && perms.add_reactions() && perms.manage_messages());
        assert!(!perms.administrator());
        assert!(url.ends_with(&format!("permissions={}", perms.bits())));
    }

    #[test]
    fn help_footer_uses_the_prefix() {
        let footer = help_footer("+");
        assert!(footer.starts_with("Type +help <command>"));
        assert!(footer.contains("+board add"));
        assert!(footer.contains("+clan add #CLANTAG"));
    }
}
