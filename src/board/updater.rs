//! The board update cycle: read the cursor back out of the board
//! message, query the next window, render it and edit the message.

use std::time::Instant;

use chrono::Utc;
use diesel::sqlite::SqliteConnection;
use serenity::all::{
    ChannelId, Context, CreateAttachment, CreateEmbed, CreateEmbedFooter, CreateMessage,
    EditAttachments, EditMessage, Message, MessageId, Reaction, Timestamp,
};
use tracing::{debug, info, warn};

use crate::db::db_conn;
use crate::models::{DbEvent, DbSeason};
use crate::error::{TrackerError, Result};
use crate::subsystems::{BoardUpdates, Tracker};

use super::image::{load_icon, BoardImage};
use super::{BoardConfig, BoardReaction, BoardScope, BoardType, LeaderboardQuery, Navigation, PageCursor};

const PLACEHOLDER: &str = "Placeholder.... do not delete me!";

/// HTTP status of a failed discord request, if it got that far.
fn status_of(err: &serenity::Error) -> Option<u16> {
    match err {
        serenity::Error::Http(e) => e.status_code().map(|status| status.as_u16()),
        _ => None,
    }
}

/// The message (or its channel) no longer exists.
fn is_gone(status: Option<u16>) -> bool {
    status == Some(404)
}

/// Discord refused because the channel is gone or off limits.
fn is_unreachable(status: Option<u16>) -> bool {
    matches!(status, Some(403 | 404))
}

/// Whether a board gets redrawn for `nav`. Switched off boards never do,
/// and the global board only moves on reactions and resets.
pub fn should_update(config: &BoardConfig, nav: Navigation, global: bool) -> bool {
    config.toggle && !(global && nav.is_passive())
}

/// The board's message, posting a fresh one (with its controls) when
/// the old one was deleted. `None` when the channel can't be posted in,
/// in which case the channel's boards are switched off.
async fn board_message(ctx: &Context, config: &mut BoardConfig) -> Result<Option<Message>> {
    if let Some(message_id) = config.message_id {
        match config.channel_id.message(ctx, message_id).await {
            Ok(message) => return Ok(Some(message)),
            Err(e) if is_gone(status_of(&e)) => {
                debug!("Board message {} in {} is gone: {}", message_id, config.channel_id, e)
            },
            Err(e) => return Err(e.into()),
        }
    }

    let builder = CreateMessage::new().content(PLACEHOLDER);
    let message = match config.channel_id.send_message(ctx, builder).await {
        Ok(message) => message,
        Err(e) if is_unreachable(status_of(&e)) => {
            warn!("Cannot post in {}, disabling its boards: {}", config.channel_id, e);
            let conn = &mut db_conn()?;
            BoardConfig::disable_channel(conn, config.channel_id)?;
            return Ok(None)
        },
        Err(e) => return Err(e.into()),
    };

    for control in BoardReaction::controls(config.board_type) {
        message.react(ctx, control.reaction_type()).await?;
    }

    let conn = &mut db_conn()?;
    config.set_message_id(conn, Some(message.id))?;
    info!("Posted new {} board message {} in {}", config.board_type, message.id, config.channel_id);

    Ok(Some(message))
}

/// Whether a failed icon fetch means the url itself is bad, as opposed
/// to the host having a bad moment.
fn icon_is_broken(err: &TrackerError) -> bool {
    match err {
        TrackerError::ImageError(_) => true,
        TrackerError::HttpError(e) => e.status().is_some_and(|status| status.is_client_error()),
        _ => false,
    }
}

async fn fetch_icon(http: &reqwest::Client, url: &str) -> Result<image::RgbaImage> {
    let bytes = http.get(url)
        .send()
        .await?
        .error_for_status()?
        .bytes()
        .await?;
    load_icon(&bytes)
}

/// Renders `config`'s board after applying `nav`, and edits it into
/// the board message.
pub async fn update_board(ctx: &Context, mut config: BoardConfig, nav: Navigation) -> Result<()> {
    let state = Tracker::get(ctx).await?;

    let global = state.config.is_global_board(config.channel_id);
    if !should_update(&config, nav, global) {
        return Ok(())
    }

    let started = Instant::now();

    let Some(mut message) = board_message(ctx, &mut config).await? else {
        return Ok(())
    };

    let footer = message.embeds.first()
        .and_then(|embed| embed.footer.as_ref())
        .and_then(|footer| PageCursor::decode(&footer.text));

    let scope = if global {
        BoardScope::Global
    } else {
        BoardScope::Channel(config.channel_id)
    };

    let (window, players, season, in_event) = {
        let conn = &mut db_conn()?;
        let current = DbSeason::current_id(conn)?;
        let cursor = footer.unwrap_or(PageCursor::first(current));

        let Some(window) = cursor.advance(nav, config.per_page, current) else {
            debug!("Board {} is already on page {}", config.id, cursor.page);
            return Ok(())
        };

        let players = LeaderboardQuery::new(scope, window.cursor.season, config.sort_by, &window)
            .load(conn)?;
        if players.is_empty() {
            debug!("Board {} scrolled too far (page {})", config.id, window.cursor.page);
            return Ok(())
        }

        let season = DbSeason::get(conn, window.cursor.season)?
            .ok_or(TrackerError::NoSeasonError)?;
        let now = Utc::now().naive_utc();
        let in_event = DbEvent::live(conn, config.guild_id.get() as i64, now)?.is_some();

        (window, players, season, in_event)
    };

    let icon = match config.icon_url.clone() {
        Some(url) => match fetch_icon(&state.http, &url).await {
            Ok(icon) => Some(icon),
            Err(e) if icon_is_broken(&e) => {
                warn!("Dropping icon {} of board {}: {}", url, config.id, e);
                let conn = &mut db_conn()?;
                config.clear_icon_url(conn)?;
                None
            },
            Err(e) => {
                warn!("Icon {} of board {} unavailable, drawing without it: {}", url, config.id, e);
                None
            },
        },
        None => None,
    };

    let mut board = BoardImage::new(config.board_type, config.title(), icon, season.start, season.finish);
    board.add_players(players);

    let font = state.font.clone();
    let png = tokio::task::spawn_blocking(move || board.render(font.as_ref())).await??;

    let file_name = config.board_type.file_name();
    let embed = CreateEmbed::new()
        .colour(config.board_type.colour(in_event))
        .image(format!("attachment://{}", file_name))
        .footer(CreateEmbedFooter::new(window.cursor.encode()))
        .timestamp(Timestamp::now());
    let attachments = EditAttachments::new()
        .add(CreateAttachment::bytes(png, file_name));

    message.edit(ctx, EditMessage::new().content("").embed(embed).attachments(attachments)).await?;

    info!(
        board = config.id,
        channel = %config.channel_id,
        page = window.cursor.page,
        season = window.cursor.season,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Updated board"
    );

    Ok(())
}

/// Runs a plain update of one channel's board, if it has one and it is on.
pub async fn refresh_channel(ctx: &Context, channel: ChannelId, board_type: BoardType, nav: Navigation) -> Result<()> {
    let config = {
        let conn = &mut db_conn()?;
        BoardConfig::by_channel(conn, channel, board_type)?
    };

    match config {
        Some(config) if config.toggle => {
            update_board(ctx, config, nav).await?;
            BoardUpdates::mark_channel(ctx, channel).await
        },
        _ => Ok(()),
    }
}

/// Finds the board `message` belongs to and saves the sort `control`
/// asks for. `None` when the message isn't a board.
pub fn apply_reaction(
    conn: &mut SqliteConnection,
    message: MessageId,
    control: BoardReaction,
) -> Result<Option<(BoardConfig, Navigation)>> {
    let Some(mut config) = BoardConfig::by_message(conn, message)? else {
        return Ok(None)
    };

    let action = control.action(config.board_type);
    if let Some(sort) = action.sort {
        if sort != config.sort_by {
            config.set_sort(conn, sort)?;
        }
    }
    Ok(Some((config, action.nav)))
}

/// Reacting to (or un-reacting from) a board message.
pub async fn handle_reaction(ctx: &Context, reaction: &Reaction) -> Result<()> {
    if reaction.user_id == Some(ctx.cache.current_user().id) {
        return Ok(())
    }
    let Some(control) = BoardReaction::from_reaction(&reaction.emoji) else {
        return Ok(())
    };

    let applied = {
        let conn = &mut db_conn()?;
        apply_reaction(conn, reaction.message_id, control)?
    };
    let Some((config, nav)) = applied else {
        return Ok(())
    };

    debug!("{:?} on board {}", control, config.id);
    update_board(ctx, config, nav).await
}

/// A board message was deleted by someone else: post a new one.
pub async fn replace_message(ctx: &Context, message_id: MessageId) -> Result<()> {
    let config = {
        let conn = &mut db_conn()?;
        let Some(mut config) = BoardConfig::by_message(conn, message_id)? else {
            return Ok(())
        };
        config.set_message_id(conn, None)?;
        config
    };

    info!("Board message {} in {} was deleted, replacing it", message_id, config.channel_id);
    update_board(ctx, config, Navigation::RESET).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::time::Duration;

    use serenity::all::GuildId;

    use crate::board::SortKey;
    use crate::db::test_conn;
    use crate::subsystems::tracker::client_builder;

    const GUILD: GuildId = GuildId::new(691779140059267084);
    const CHANNEL: ChannelId = ChannelId::new(663683345108172830);

    fn board(conn: &mut SqliteConnection, board_type: BoardType) -> BoardConfig {
        let mut config = BoardConfig::create(conn, GUILD, CHANNEL, board_type, None).unwrap();
        config.set_message_id(conn, Some(MessageId::new(1255))).unwrap();
        config
    }

    fn test_client(timeout: Duration) -> reqwest::Client {
        client_builder(timeout).no_proxy().build().unwrap()
    }

    /// Answers one request with `response` and hangs up.
    fn serve_once(response: String) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        std::thread::spawn(move || {
            if let Ok((mut stream, _)) = listener.accept() {
                let mut request = [0u8; 2048];
                let _ = stream.read(&mut request);
                let _ = stream.write_all(response.as_bytes());
            }
        });
        format!("http://{}/icon.png", addr)
    }

    #[test]
    fn global_board_skips_plain_refreshes() {
        let conn = &mut test_conn();
        let config = board(conn, BoardType::Donation);

        assert!(should_update(&config, Navigation::STAY, false));
        assert!(!should_update(&config, Navigation::STAY, true));
        assert!(should_update(&config, Navigation::RESET, true));
        assert!(should_update(&config, Navigation::pages(1), true));
    }

    #[test]
    fn unreachable_channel_switches_its_boards_off() {
        let conn = &mut test_conn();
        board(conn, BoardType::Donation);
        board(conn, BoardType::Trophy);

        assert!(is_unreachable(Some(403)));
        assert!(is_unreachable(Some(404)));
        assert!(!is_unreachable(Some(429)));
        assert!(!is_unreachable(Some(502)));
        assert!(!is_unreachable(None));

        BoardConfig::disable_channel(conn, CHANNEL).unwrap();
        for config in BoardConfig::in_channel(conn, CHANNEL).unwrap() {
            assert!(!config.toggle);
            assert!(!should_update(&config, Navigation::RESET, false));
        }
    }

    #[test]
    fn only_a_missing_message_is_reposted() {
        assert!(is_gone(Some(404)));
        assert!(!is_gone(Some(403)));
        assert!(!is_gone(Some(429)));
        assert!(!is_gone(Some(500)));
        assert!(!is_gone(None));
    }

    #[test]
    fn reaction_sort_is_saved_before_the_update() {
        let conn = &mut test_conn();
        board(conn, BoardType::Donation);

        let (config, nav) = apply_reaction(conn, MessageId::new(1255), BoardReaction::Percentage)
            .unwrap()
            .unwrap();
        assert_eq!(config.sort_by, SortKey::Ratio);
        assert_eq!(nav, Navigation::STAY);

        let stored = BoardConfig::by_message(conn, MessageId::new(1255)).unwrap().unwrap();
        assert_eq!(stored.sort_by, SortKey::Ratio);

        // Refresh puts the default sort back and starts over
        let (config, nav) = apply_reaction(conn, MessageId::new(1255), BoardReaction::Refresh)
            .unwrap()
            .unwrap();
        assert_eq!(config.sort_by, SortKey::Donations);
        assert!(nav.reset);

        // Paging leaves the sort alone
        let (config, _) = apply_reaction(conn, MessageId::new(1255), BoardReaction::Right)
            .unwrap()
            .unwrap();
        assert_eq!(config.sort_by, SortKey::Donations);
    }

    #[test]
    fn reactions_on_other_messages_do_nothing() {
        let conn = &mut test_conn();
        board(conn, BoardType::Trophy);

        let applied = apply_reaction(conn, MessageId::new(42), BoardReaction::Gain).unwrap();
        assert!(applied.is_none());
        let stored = BoardConfig::by_message(conn, MessageId::new(1255)).unwrap().unwrap();
        assert_eq!(stored.sort_by, SortKey::Trophies);
    }

    #[tokio::test]
    async fn silent_icon_host_times_out() {
        // Connections queue in the backlog but nothing ever answers
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}/icon.png", listener.local_addr().unwrap());
        let http = test_client(Duration::from_millis(300));

        let fetched = tokio::time::timeout(Duration::from_secs(5), fetch_icon(&http, &url))
            .await
            .expect("icon fetch should give up on its own");
        let err = fetched.unwrap_err();

        assert!(matches!(&err, TrackerError::HttpError(e) if e.is_timeout()));
        assert!(!icon_is_broken(&err));
        drop(listener);
    }

    #[tokio::test]
    async fn missing_icon_is_broken_but_server_errors_are_not() {
        let http = test_client(Duration::from_secs(5));

        let url = serve_once("HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\nConnection: close\r\n\r\n".to_string());
        let err = fetch_icon(&http, &url).await.unwrap_err();
        assert!(icon_is_broken(&err));

        let url = serve_once("HTTP/1.1 503 Service Unavailable\r\nContent-Length: 0\r\nConnection: close\r\n\r\n".to_string());
        let err = fetch_icon(&http, &url).await.unwrap_err();
        assert!(!icon_is_broken(&err));

        let body = "<html>not an image</html>";
        let response = format!(
            "HTTP/1.1 200 OK\r\nContent-Type: text/html\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            body.len(),
            body,
        );
        let url = serve_once(response);
        let err = fetch_icon(&http, &url).await.unwrap_err();
        assert!(icon_is_broken(&err));
    }
}
