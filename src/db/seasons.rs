use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, Utc};
use diesel::prelude::*;
use diesel::dsl::max;
use diesel::sqlite::SqliteConnection;

use crate::db::models::DbSeason;
use crate::error::{TrackerError, Result};
use crate::schema;

/// Seasons roll over at 05:00 UTC.
const SEASON_END_HOUR: u32 = 5;

fn last_monday(year: i32, month: u32) -> Option<NaiveDate> {
    let (next_year, next_month) = if month == 12 { (year + 1, 1) } else { (year, month + 1) };
    let last_day = NaiveDate::from_ymd_opt(next_year, next_month, 1)?.pred_opt()?;
    let back = last_day.weekday().num_days_from_monday() as i64;
    last_day.checked_sub_signed(Duration::days(back))
}

/// The first season boundary (last Monday of a month) strictly after `now`.
pub fn season_end_after(now: NaiveDateTime) -> Option<NaiveDateTime> {
    let end_of = |year, month| last_monday(year, month)?.and_hms_opt(SEASON_END_HOUR, 0, 0);

    let this_month = end_of(now.year(), now.month())?;
    if this_month > now {
        return Some(this_month)
    }

    let (year, month) = if now.month() == 12 { (now.year() + 1, 1) } else { (now.year(), now.month() + 1) };
    end_of(year, month)
}

impl DbSeason {

    pub fn get(conn: &mut SqliteConnection, season_id: i32) -> Result<Option<Self>> {
        use schema::seasons::dsl::*;

        seasons
            .find(season_id)
            .select(Self::as_select())
            .first(conn)
            .optional()
            .map_err(TrackerError::from)
    }

    /// The latest season that has started by `now`.
    pub fn current(conn: &mut SqliteConnection, now: NaiveDateTime) -> Result<Option<Self>> {
        use schema::seasons::dsl::*;

        seasons
            .filter(start.le(now))
            .order_by(start.desc())
            .select(Self::as_select())
            .first(conn)
            .optional()
            .map_err(TrackerError::from)
    }

    pub fn current_id(conn: &mut SqliteConnection) -> Result<i32> {
        Self::current(conn, Utc::now().naive_utc())?
            .map(|season| season.id)
            .ok_or(TrackerError::NoSeasonError)
    }

    /// Returns the season covering `now`, opening a new one if the
    /// latest season has already finished.
    pub fn ensure_current(conn: &mut SqliteConnection, now: NaiveDateTime) -> Result<Self> {
        use schema::seasons::dsl::*;

        conn.transaction(|conn| {
            let latest = Self::current(conn, now)?;
            if let Some(season) = latest {
                if season.finish > now {
                    return Ok(season)
                }
            }

            let next_id = seasons
                .select(max(id))
                .first::<Option<i32>>(conn)?
                .unwrap_or(0) + 1;

            let new_start = match latest {
                Some(season) if season.finish <= now => season.finish,
                _ => now,
            };
            let new_finish = season_end_after(now)
                .ok_or_else(|| TrackerError::Other(format!("No season end after {}", now)))?;

            let season = Self { id: next_id, start: new_start, finish: new_finish };
            diesel::insert_into(seasons)
                .values(&season)
                .execute(conn)?;

            tracing::info!("Opened season {} ({} to {})", season.id, season.start, season.finish);
            Ok(season)
        })
    }
}
