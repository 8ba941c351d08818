use chrono::Utc;
use poise::CreateReply;
use serenity::all::{CreateEmbed, GuildChannel, MessageId};
use tracing::{info, warn};

use crate::ago;
use crate::board::{refresh_channel, update_board, BoardConfig, BoardType, Navigation};
use crate::db::db_conn;
use crate::models::DbClan;
use crate::error::Result;
use crate::subsystems::{BoardUpdates, PendingDeletes};

use super::{require_guild, target_channel, Context};

const ICON_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "gif"];

#[derive(Debug, Clone, Copy, poise::ChoiceParameter)]
pub enum BoardKind {
    #[name = "donation"]
    Donation,
    #[name = "trophy"]
    Trophy,
}

impl From<BoardKind> for BoardType {
    fn from(kind: BoardKind) -> Self {
        match kind {
            BoardKind::Donation => BoardType::Donation,
            BoardKind::Trophy => BoardType::Trophy,
        }
    }
}

/// Whether `url` points at an image the board renderer can decode.
fn valid_icon_url(url: &str) -> bool {
    let Ok(parsed) = reqwest::Url::parse(url) else { return false };
    if !matches!(parsed.scheme(), "http" | "https") {
        return false
    }
    let path = parsed.path().to_lowercase();
    ICON_EXTENSIONS.iter().any(|ext| path.ends_with(&format!(".{}", ext)))
}

/// One line per linked clan with how long ago its stats last changed.
fn clan_updates(clans: &[(String, Option<i64>)]) -> String {
    if clans.is_empty() {
        return "none linked, use `clan add`".to_string()
    }
    clans.iter()
        .map(|(name, seconds)| match seconds {
            Some(seconds) => format!("{}: {} ago", name, ago(*seconds)),
            None => format!("{}: no changes since start-up", name),
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// `updated` is how many seconds ago the board was last redrawn.
fn describe(config: &BoardConfig, updated: Option<i64>, clans: &str) -> CreateEmbed {
    let per_page = match config.per_page {
        0 => "growing".to_string(),
        n => n.to_string(),
    };
    let message = match config.message_id {
        Some(id) => format!(
            "https://discord.com/channels/{}/{}/{}",
            config.guild_id, config.channel_id, id
        ),
        None => "none yet".to_string(),
    };
    let updated = match updated {
        Some(seconds) => format!("{} ago", ago(seconds)),
        None => "not since start-up".to_string(),
    };

    CreateEmbed::new()
        .title(config.title())
        .colour(config.board_type.colour(false))
        .field("Type", config.board_type.to_string(), true)
        .field("Channel", format!("<#{}>", config.channel_id), true)
        .field("Enabled", if config.toggle { "yes" } else { "no" }, true)
        .field("Sort", config.sort_by.to_string(), true)
        .field("Per page", per_page, true)
        .field("Icon", config.icon_url.as_deref().unwrap_or("none"), true)
        .field("Last update", updated, true)
        .field("Message", message, false)
        .field("Clans", clans, false)
}

/// Loads a board, telling the user when there isn't one.
async fn find_board(
    ctx: Context<'_>,
    kind: BoardKind,
    channel: Option<GuildChannel>,
) -> Result<Option<BoardConfig>> {
    let channel_id = target_channel(ctx, channel);
    let board_type = BoardType::from(kind);
    let config = {
        let conn = &mut db_conn()?;
        BoardConfig::by_channel(conn, channel_id, board_type)?
    };

    if config.is_none() {
        ctx.say(format!("There is no {} board in <#{}>.", board_type, channel_id)).await?;
    }
    Ok(config)
}

/// Manage the leaderboards in this server
#[poise::command(
    slash_command,
    prefix_command,
    guild_only,
    required_permissions = "MANAGE_GUILD",
    subcommands(
        "board_add",
        "board_remove",
        "board_info",
        "board_refresh",
        "board_perpage",
        "board_icon",
        "board_title",
        "board_toggle"
    ),
    subcommand_required
)]
pub async fn board(_: Context<'_>) -> Result<()> { Ok(()) }

/// Puts a leaderboard in a channel. Link clans to the channel with `clan add`.
#[poise::command(slash_command, prefix_command, rename = "add")]
async fn board_add(
    ctx: Context<'_>,
    #[description = "Board type"] kind: BoardKind,
    #[description = "Channel (defaults to this one)"] channel: Option<GuildChannel>,
    #[description = "Board title"] title: Option<String>,
) -> Result<()> {
    let guild_id = require_guild(ctx)?;
    let channel_id = target_channel(ctx, channel);
    let board_type = BoardType::from(kind);

    let config = {
        let conn = &mut db_conn()?;
        BoardConfig::create(conn, guild_id, channel_id, board_type, title.as_deref())?
    };
    info!("Board {} ({}) set up in {}", config.id, board_type, channel_id);

    if let Err(e) = refresh_channel(ctx.serenity_context(), channel_id, board_type, Navigation::RESET).await {
        warn!("First render of board {} failed: {}", config.id, e);
    }

    ctx.say(format!(
        "{} board set up in <#{}>. It fills in as soon as its clans have stats.",
        board_type, channel_id
    )).await?;
    Ok(())
}

/// Removes a leaderboard and its message
#[poise::command(slash_command, prefix_command, rename = "remove")]
async fn board_remove(
    ctx: Context<'_>,
    #[description = "Board type"] kind: BoardKind,
    #[description = "Channel (defaults to this one)"] channel: Option<GuildChannel>,
) -> Result<()> {
    let Some(config) = find_board(ctx, kind, channel).await? else { return Ok(()) };

    if let Some(message_id) = config.message_id {
        PendingDeletes::mark(ctx.serenity_context(), message_id).await?;
        if let Err(e) = config.channel_id.delete_message(ctx.serenity_context(), message_id).await {
            warn!("Unable to delete board message {}: {}", message_id, e);
            PendingDeletes::take(ctx.serenity_context(), message_id).await?;
        }
    }

    let (board_type, channel_id) = (config.board_type, config.channel_id);
    {
        let conn = &mut db_conn()?;
        config.delete(conn)?;
    }

    ctx.say(format!("Removed the {} board from <#{}>.", board_type, channel_id)).await?;
    Ok(())
}

/// Shows the settings of the boards in a channel
#[poise::command(slash_command, prefix_command, rename = "info")]
async fn board_info(
    ctx: Context<'_>,
    #[description = "Channel (defaults to this one)"] channel: Option<GuildChannel>,
) -> Result<()> {
    let channel_id = target_channel(ctx, channel);
    let (boards, clans) = {
        let conn = &mut db_conn()?;
        let boards = BoardConfig::in_channel(conn, channel_id)?;
        let clans = DbClan::in_channel(conn, channel_id.get() as i64)?;
        (boards, clans)
    };

    if boards.is_empty() {
        ctx.say(format!("There are no boards in <#{}>.", channel_id)).await?;
        return Ok(())
    }

    let now = Utc::now();
    let updated = BoardUpdates::channel_updated(ctx.serenity_context(), channel_id).await?
        .map(|at| (now - at).num_seconds());

    let mut clan_times = Vec::with_capacity(clans.len());
    for clan in clans {
        let changed = BoardUpdates::tag_updated(ctx.serenity_context(), &clan.clan_tag).await?
            .map(|at| (now - at).num_seconds());
        clan_times.push((clan.clan_name, changed));
    }
    let clans = clan_updates(&clan_times);

    let mut reply = CreateReply::default();
    for config in &boards {
        reply = reply.embed(describe(config, updated, &clans));
    }
    ctx.send(reply).await?;
    Ok(())
}

/// Re-renders a board from page 1
#[poise::command(slash_command, prefix_command, rename = "refresh")]
async fn board_refresh(
    ctx: Context<'_>,
    #[description = "Board type"] kind: BoardKind,
    #[description = "Channel (defaults to this one)"] channel: Option<GuildChannel>,
) -> Result<()> {
    let Some(config) = find_board(ctx, kind, channel).await? else { return Ok(()) };
    let channel_id = config.channel_id;

    ctx.defer().await?;
    refresh_channel(ctx.serenity_context(), channel_id, config.board_type, Navigation::RESET).await?;
    ctx.say(format!("Refreshed the {} board in <#{}>.", config.board_type, channel_id)).await?;
    Ok(())
}

/// Sets how many players each page shows. 0 makes pages grow as you scroll.
#[poise::command(slash_command, prefix_command, rename = "perpage")]
async fn board_perpage(
    ctx: Context<'_>,
    #[description = "Board type"] kind: BoardKind,
    #[description = "Players per page"]
    #[min = 0]
    #[max = 100]
    per_page: i32,
    #[description = "Channel (defaults to this one)"] channel: Option<GuildChannel>,
) -> Result<()> {
    let Some(mut config) = find_board(ctx, kind, channel).await? else { return Ok(()) };
    let per_page = per_page.clamp(0, 100);
    {
        let conn = &mut db_conn()?;
        config.set_per_page(conn, per_page)?;
    }

    let channel_id = config.channel_id;
    update_board(ctx.serenity_context(), config, Navigation::RESET).await?;
    ctx.say(format!("Board in <#{}> now shows {} players per page.", channel_id, match per_page {
        0 => "a growing number of".to_string(),
        n => n.to_string(),
    })).await?;
    Ok(())
}

/// Sets the icon drawn on a board. Leave the url out to remove it.
#[poise::command(slash_command, prefix_command, rename = "icon")]
async fn board_icon(
    ctx: Context<'_>,
    #[description = "Board type"] kind: BoardKind,
    #[description = "Image url (png, jpg or gif)"] url: Option<String>,
    #[description = "Channel (defaults to this one)"] channel: Option<GuildChannel>,
) -> Result<()> {
    if let Some(url) = &url {
        if !valid_icon_url(url) {
            ctx.say("That doesn't look like a link to a png, jpg or gif image.").await?;
            return Ok(())
        }
    }

    let Some(mut config) = find_board(ctx, kind, channel).await? else { return Ok(()) };
    let removed = url.is_none();
    {
        let conn = &mut db_conn()?;
        config.set_icon_url(conn, url)?;
    }

    update_board(ctx.serenity_context(), config, Navigation::STAY).await?;
    ctx.say(if removed { "Icon removed." } else { "Icon set." }).await?;
    Ok(())
}

/// Sets a board's title. Leave it out to go back to the default.
#[poise::command(slash_command, prefix_command, rename = "title")]
async fn board_title(
    ctx: Context<'_>,
    #[description = "Board type"] kind: BoardKind,
    #[description = "New title"] title: Option<String>,
    #[description = "Channel (defaults to this one)"] channel: Option<GuildChannel>,
) -> Result<()> {
    let Some(mut config) = find_board(ctx, kind, channel).await? else { return Ok(()) };
    {
        let conn = &mut db_conn()?;
        config.set_title(conn, title)?;
    }

    let reply = format!("Board title set to **{}**.", config.title());
    update_board(ctx.serenity_context(), config, Navigation::STAY).await?;
    ctx.say(reply).await?;
    Ok(())
}

/// Turns a board's updates on or off
#[poise::command(slash_command, prefix_command, rename = "toggle")]
async fn board_toggle(
    ctx: Context<'_>,
    #[description = "Board type"] kind: BoardKind,
    #[description = "Channel (defaults to this one)"] channel: Option<GuildChannel>,
) -> Result<()> {
    let Some(mut config) = find_board(ctx, kind, channel).await? else { return Ok(()) };
    let toggle = !config.toggle;
    {
        let conn = &mut db_conn()?;
        config.set_toggle(conn, toggle)?;
    }

    let reply = format!(
        "The {} board in <#{}> is now {}.",
        config.board_type,
        config.channel_id,
        if toggle { "enabled" } else { "disabled" },
    );
    if toggle {
        update_board(ctx.serenity_context(), config, Navigation::RESET).await?;
    }
    ctx.say(reply).await?;
    Ok(())
}

/// Discord ids are never 0.
fn parse_message_id(id: u64) -> Option<MessageId> {
    (id != 0).then(|| MessageId::new(id))
}

/// Re-renders one board message, or every board in this server
#[poise::command(prefix_command, owners_only, hide_in_help)]
pub async fn forceboard(
    ctx: Context<'_>,
    #[description = "Board message id"] message_id: Option<u64>,
) -> Result<()> {
    let message = match message_id {
        Some(id) => match parse_message_id(id) {
            Some(message) => Some(message),
            None => {
                ctx.say(format!("`{}` isn't a message id.", id)).await?;
                return Ok(())
            },
        },
        None => None,
    };

    let boards: Vec<BoardConfig> = {
        let conn = &mut db_conn()?;
        match message {
            Some(message) => BoardConfig::by_message(conn, message)?.into_iter().collect(),
            None => BoardConfig::in_guild(conn, require_guild(ctx)?)?,
        }
    };

    let count = boards.len();
    for config in boards {
        update_board(ctx.serenity_context(), config, Navigation::RESET).await?;
    }
    ctx.say(format!("Updated {} boards.", count)).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn icon_urls_must_be_images() {
        assert!(valid_icon_url("https://api-assets.clashofclans.com/badges/512/a.png"));
        assert!(valid_icon_url("http://example.com/Icon.JPG"));
        assert!(valid_icon_url("https://example.com/a.gif?size=512"));
        assert!(!valid_icon_url("https://example.com/page.html"));
        assert!(!valid_icon_url("ftp://example.com/a.png"));
        assert!(!valid_icon_url("not a url"));
    }

    #[test]
    fn describe_mentions_growing_pages() {
        use serenity::all::{ChannelId, GuildId};
        use crate::board::SortKey;

        let config = BoardConfig {
            id: 1,
            guild_id: GuildId::new(691779140059267084),
            channel_id: ChannelId::new(663683345108172830),
            message_id: None,
            board_type: BoardType::Donation,
            sort_by: SortKey::Donations,
            per_page: 0,
            toggle: true,
            icon_url: None,
            title: None,
        };
        // Builders serialize to the payload discord receives
        let embed = serde_json::to_value(describe(&config, Some(125), "Reddit Zulu: 1m ago")).unwrap();
        assert_eq!(embed["title"], "Donation Leaderboard");
        assert_eq!(embed["fields"][4]["value"], "growing");
        assert_eq!(embed["fields"][6]["value"], "2m ago");
        assert_eq!(embed["fields"][8]["name"], "Clans");
        assert_eq!(embed["fields"][8]["value"], "Reddit Zulu: 1m ago");

        let embed = serde_json::to_value(describe(&config, None, "")).unwrap();
        assert_eq!(embed["fields"][6]["value"], "not since start-up");
    }

    #[test]
    fn clan_update_lines() {
        let clans = [
            ("Reddit Zulu".to_string(), Some(3 * 60 + 5)),
            ("Reddit Elephino".to_string(), None),
        ];
        assert_eq!(
            clan_updates(&clans),
            "Reddit Zulu: 3m ago\nReddit Elephino: no changes since start-up"
        );
        assert_eq!(clan_updates(&[]), "none linked, use `clan add`");
    }

    #[test]
    fn zero_is_not_a_message_id() {
        assert_eq!(parse_message_id(0), None);
        assert_eq!(parse_message_id(1255), Some(MessageId::new(1255)));
    }
}
