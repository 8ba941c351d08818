use std::time::Duration;

use chrono::{NaiveDate, NaiveDateTime, Utc};
use serenity::all::{GuildChannel, ReactionType};
use tracing::info;

use crate::db::db_conn;
use crate::error::Result;
use crate::models::DbEvent;

use super::{require_guild, Context};

const PICK_TIMEOUT: Duration = Duration::from_secs(60);
const MAX_PICKS: usize = 10;
const DATE_FORMAT: &str = "%d-%b-%Y %H:%M";

/// `2024-06-10 18:00`, or a bare date for midnight. Times are UTC.
fn parse_when(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M")
        .ok()
        .or_else(|| NaiveDate::parse_from_str(text, "%Y-%m-%d").ok()?.and_hms_opt(0, 0, 0))
}

/// The `i`th keycap emoji, 1 through 10.
fn keycap(i: usize) -> Option<String> {
    match i {
        0..=8 => Some(format!("{}\u{FE0F}\u{20E3}", i + 1)),
        9 => Some("\u{1F51F}".to_string()),
        _ => None,
    }
}

fn keycap_index(emoji: &ReactionType) -> Option<usize> {
    let ReactionType::Unicode(name) = emoji else { return None };
    let name = name.replace('\u{FE0F}', "");
    (0..MAX_PICKS).find(|&i| keycap(i).is_some_and(|k| k.replace('\u{FE0F}', "") == name))
}

fn describe(event: &DbEvent, now: NaiveDateTime) -> String {
    let live = if event.start <= now && now < event.finish { " (live)" } else { "" };
    let channel = event.channel_id.map(|c| format!(" in <#{}>", c)).unwrap_or_default();
    format!(
        "**{}** from {} to {}{}{}",
        event.event_name,
        event.start.format(DATE_FORMAT),
        event.finish.format(DATE_FORMAT),
        channel,
        live,
    )
}

/// Schedule events. Boards change colour while an event is running.
#[poise::command(
    slash_command,
    prefix_command,
    guild_only,
    required_permissions = "MANAGE_GUILD",
    subcommands("event_add", "event_list", "event_remove"),
    subcommand_required
)]
pub async fn event(_: Context<'_>) -> Result<()> { Ok(()) }

/// Schedules an event. Dates look like 2024-06-10 or 2024-06-10 18:00 (UTC).
#[poise::command(slash_command, prefix_command, rename = "add")]
async fn event_add(
    ctx: Context<'_>,
    #[description = "Event name"] name: String,
    #[description = "Start, e.g. 2024-06-10 18:00"] start: String,
    #[description = "Finish, e.g. 2024-06-17 18:00"] finish: String,
    #[description = "Channel for the event"] channel: Option<GuildChannel>,
) -> Result<()> {
    let guild_id = require_guild(ctx)?;

    let (Some(starts), Some(finishes)) = (parse_when(&start), parse_when(&finish)) else {
        ctx.say("I couldn't read those dates. Use `YYYY-MM-DD` or `YYYY-MM-DD HH:MM`.").await?;
        return Ok(())
    };
    if finishes <= starts {
        ctx.say("The event has to finish after it starts.").await?;
        return Ok(())
    }

    let event = {
        let conn = &mut db_conn()?;
        let channel = channel.map(|c| c.id.get() as i64);
        DbEvent::create(conn, guild_id.get() as i64, &name, starts, finishes, channel)?
    };
    info!("Event {} ({}) scheduled in {}", event.id, event.event_name, guild_id);

    ctx.say(format!("Scheduled {}.", describe(&event, Utc::now().naive_utc()))).await?;
    Ok(())
}

/// Lists this server's events
#[poise::command(slash_command, prefix_command, rename = "list")]
async fn event_list(ctx: Context<'_>) -> Result<()> {
    let guild_id = require_guild(ctx)?;
    let events = {
        let conn = &mut db_conn()?;
        DbEvent::in_guild(conn, guild_id.get() as i64)?
    };

    if events.is_empty() {
        ctx.say("No events are scheduled.").await?;
        return Ok(())
    }

    let now = Utc::now().naive_utc();
    let lines: Vec<String> = events.iter().map(|e| describe(e, now)).collect();
    ctx.say(lines.join("\n")).await?;
    Ok(())
}

/// Removes an event by name, or pick one from a list
#[poise::command(slash_command, prefix_command, rename = "remove")]
async fn event_remove(
    ctx: Context<'_>,
    #[description = "Event name"] name: Option<String>,
) -> Result<()> {
    let guild_id = require_guild(ctx)?.get() as i64;

    if let Some(name) = name {
        let removed = {
            let conn = &mut db_conn()?;
            DbEvent::remove_by_name(conn, guild_id, &name)?
        };
        let reply = match removed {
            0 => format!("There is no event called **{}**.", name),
            n => format!("Removed {} event(s) called **{}**.", n, name),
        };
        ctx.say(reply).await?;
        return Ok(())
    }

    let events = {
        let conn = &mut db_conn()?;
        DbEvent::in_guild(conn, guild_id)?
    };

    let event = match events.len() {
        0 => {
            ctx.say("No events are scheduled.").await?;
            return Ok(())
        },
        1 => &events[0],
        _ => match pick_event(ctx, &events).await? {
            Some(event) => event,
            None => {
                ctx.say("No event picked, nothing was removed.").await?;
                return Ok(())
            },
        },
    };

    {
        let conn = &mut db_conn()?;
        DbEvent::delete(conn, event.id)?;
    }
    ctx.say(format!("Removed **{}**.", event.event_name)).await?;
    Ok(())
}

/// Lists the events with a keycap each, and waits for the author to react.
async fn pick_event<'e>(ctx: Context<'_>, events: &'e [DbEvent]) -> Result<Option<&'e DbEvent>> {
    let shown = &events[..events.len().min(MAX_PICKS)];
    let now = Utc::now().naive_utc();

    let listing: Vec<String> = shown.iter()
        .enumerate()
        .map(|(i, e)| format!("{} {}", keycap(i).unwrap_or_default(), describe(e, now)))
        .collect();
    let handle = ctx.say(format!("Which event should be removed?\n{}", listing.join("\n"))).await?;
    let message = handle.message().await?;

    for i in 0..shown.len() {
        if let Some(emoji) = keycap(i) {
            message.react(ctx.serenity_context(), ReactionType::Unicode(emoji)).await?;
        }
    }

    let reaction = message
        .await_reaction(ctx.serenity_context())
        .author_id(ctx.author().id)
        .timeout(PICK_TIMEOUT)
        .await;

    Ok(reaction
        .and_then(|r| keycap_index(&r.emoji))
        .and_then(|i| shown.get(i)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dates_with_and_without_times() {
        let day = NaiveDate::from_ymd_opt(2024, 6, 10).unwrap();
        assert_eq!(parse_when("2024-06-10"), day.and_hms_opt(0, 0, 0));
        assert_eq!(parse_when(" 2024-06-10 18:30 "), day.and_hms_opt(18, 30, 0));
        assert_eq!(parse_when("10/06/2024"), None);
        assert_eq!(parse_when("tomorrow"), None);
    }

    #[test]
    fn keycaps_map_back_to_their_index() {
        for i in 0..MAX_PICKS {
            let emoji = ReactionType::Unicode(keycap(i).unwrap());
            assert_eq!(keycap_index(&emoji), Some(i));
        }
        assert_eq!(keycap(MAX_PICKS), None);

        // Without the variation selector
        let bare = ReactionType::Unicode("3\u{20E3}".to_string());
        assert_eq!(keycap_index(&bare), Some(2));
        assert_eq!(keycap_index(&ReactionType::Unicode("\u{1F44D}".to_string())), None);
    }

    #[test]
    fn live_events_are_marked() {
        let day = |d| NaiveDate::from_ymd_opt(2024, 6, d).unwrap().and_hms_opt(0, 0, 0).unwrap();
        let event = DbEvent {
            id: 1,
            guild_id: 1,
            event_name: "Summer push".to_string(),
            start: day(10),
            finish: day(20),
            channel_id: None,
        };
        assert_eq!(
            describe(&event, day(15)),
            "**Summer push** from 10-Jun-2024 00:00 to 20-Jun-2024 00:00 (live)"
        );
        assert!(!describe(&event, day(21)).ends_with("(live)"));
    }
}
