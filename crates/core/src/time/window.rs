use anyhow::{bail, Context};
use chrono::{DateTime, Datelike, Duration, FixedOffset, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

// Reference clock for "today" (UTC+8, Asia/Shanghai). Window arithmetic uses
// this market-local calendar date regardless of where the process runs.
const MARKET_TZ_OFFSET_SECS: i32 = 8 * 3600;

/// Inclusive reporting window. Both boundaries are weekdays by construction:
/// `start` is a Monday (CurrentWeek) or a Friday (TrailingFridays), `end` is
/// always a Friday.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WindowPolicy {
    /// Monday open through Friday close of the current trading week.
    #[default]
    CurrentWeek,
    /// Previous Friday close through this week's Friday close.
    TrailingFridays,
}

/// Which bar price anchors the start of the window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundaryPrice {
    Open,
    Close,
}

impl WindowPolicy {
    pub fn start_anchor(self) -> BoundaryPrice {
        match self {
            Self::CurrentWeek => BoundaryPrice::Open,
            Self::TrailingFridays => BoundaryPrice::Close,
        }
    }
}

impl fmt::Display for WindowPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::CurrentWeek => "current-week",
            Self::TrailingFridays => "trailing-fridays",
        };
        f.write_str(s)
    }
}

impl std::str::FromStr for WindowPolicy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "current-week" => Ok(Self::CurrentWeek),
            "trailing-fridays" => Ok(Self::TrailingFridays),
            other => bail!("unknown window policy: {other} (expected current-week | trailing-fridays)"),
        }
    }
}

/// Resolves the reporting window for the given instant.
///
/// Weekend rule (both policies): Saturday and Sunday resolve to the
/// just-completed trading week, i.e. "today" rolls back to the most recent
/// Friday before any weekday arithmetic.
pub fn resolve_window(policy: WindowPolicy, now_utc: DateTime<Utc>) -> anyhow::Result<ReportWindow> {
    let market = FixedOffset::east_opt(MARKET_TZ_OFFSET_SECS).context("invalid market offset")?;
    let mut today = now_utc.with_timezone(&market).date_naive();

    while is_weekend(today) {
        today = today - Duration::days(1);
    }

    // After the rollback, weekday is 0..=4.
    let weekday = i64::from(today.weekday().num_days_from_monday());
    let window = match policy {
        WindowPolicy::CurrentWeek => {
            let start = today - Duration::days(weekday);
            ReportWindow {
                start,
                end: start + Duration::days(4),
            }
        }
        WindowPolicy::TrailingFridays => {
            let end = today + Duration::days(4 - weekday);
            ReportWindow {
                start: end - Duration::days(7),
                end,
            }
        }
    };

    Ok(window)
}

/// UTC instant for "noon, market time" of the given date; used when a caller
/// pins the run to an explicit as-of date instead of the wall clock.
pub fn as_of_noon_utc(date: NaiveDate) -> anyhow::Result<DateTime<Utc>> {
    let market = FixedOffset::east_opt(MARKET_TZ_OFFSET_SECS).context("invalid market offset")?;
    let noon = NaiveTime::from_hms_opt(12, 0, 0).context("invalid noon time")?;
    let local = market
        .from_local_datetime(&date.and_time(noon))
        .single()
        .context("ambiguous as-of instant")?;
    Ok(local.with_timezone(&Utc))
}

pub fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), chrono::Weekday::Sat | chrono::Weekday::Sun)
}
