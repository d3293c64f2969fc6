// ⏰ Temporal queries - named periods relative to "now"
//
// All calendar comparisons happen in the timezone of the `now` value the
// caller passes in (the local clock in production, a fixed instant in tests).
//
// Period rules:
// - day:   same calendar date as now
// - week:  date >= now - 7 calendar days (timestamp comparison, inclusive)
// - month: date >= midnight of the 1st of the current month
// - all:   no filtering

use crate::expense::Expense;
use chrono::{DateTime, Datelike, Days, Duration, NaiveDate, NaiveDateTime, TimeZone};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    Day,
    Week,
    Month,
    #[default]
    All,
}

impl Period {
    pub fn as_str(&self) -> &'static str {
        match self {
            Period::Day => "day",
            Period::Week => "week",
            Period::Month => "month",
            Period::All => "all",
        }
    }

    /// Lenient parse: anything unrecognized means "all"
    pub fn parse_or_all(s: &str) -> Period {
        s.parse().unwrap_or(Period::All)
    }

    /// Number of days the daily spending chart covers for this period
    pub fn chart_window(&self) -> u32 {
        match self {
            Period::Month => 30,
            _ => 7,
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Period {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "day" | "today" => Ok(Period::Day),
            "week" => Ok(Period::Week),
            "month" => Ok(Period::Month),
            "all" => Ok(Period::All),
            other => Err(format!("unknown period: {other}")),
        }
    }
}

// ============================================================================
// DATE PARSING
// ============================================================================

/// Parse a stored expense date into `tz`.
///
/// Accepts RFC 3339 timestamps (`2024-01-05T10:00:00.000Z`), offset-less
/// date-times (read as wall-clock time in `tz`), and bare dates
/// (`2024-01-05`, read as midnight in `tz`).
pub fn parse_expense_date<Tz: TimeZone>(raw: &str, tz: &Tz) -> Option<DateTime<Tz>> {
    let raw = raw.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(tz));
    }

    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return resolve_local(naive, tz);
        }
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| start_of_day(date, tz))
}

/// First instant of a calendar date in `tz`
pub fn start_of_day<Tz: TimeZone>(date: NaiveDate, tz: &Tz) -> Option<DateTime<Tz>> {
    resolve_local(date.and_hms_opt(0, 0, 0)?, tz)
}

/// Wall-clock time in `tz`. Ambiguous times take the earlier instant; times
/// inside a DST gap move forward to the first valid quarter hour.
fn resolve_local<Tz: TimeZone>(naive: NaiveDateTime, tz: &Tz) -> Option<DateTime<Tz>> {
    (0..=GAP_SEARCH_STEPS).find_map(|step| {
        let shifted = naive.checked_add_signed(Duration::minutes(15 * step))?;
        tz.from_local_datetime(&shifted).earliest()
    })
}

// Real-world gaps are at most a couple of hours
const GAP_SEARCH_STEPS: i64 = 4 * 3;

// ============================================================================
// PERIOD FILTERING
// ============================================================================

/// True when the expense date falls on `day` in `tz`
pub fn is_on_day<Tz: TimeZone>(expense: &Expense, day: NaiveDate, tz: &Tz) -> bool {
    expense
        .date_in(tz)
        .map_or(false, |dt| dt.date_naive() == day)
}

/// Inclusive lower bound for a period, `None` for `All`
pub fn period_start<Tz: TimeZone>(period: Period, now: &DateTime<Tz>) -> Option<DateTime<Tz>> {
    let tz = now.timezone();
    match period {
        Period::Day => start_of_day(now.date_naive(), &tz),
        Period::Week => now.clone().checked_sub_days(Days::new(7)),
        Period::Month => {
            let first = NaiveDate::from_ymd_opt(now.year(), now.month(), 1)?;
            start_of_day(first, &tz)
        }
        Period::All => None,
    }
}

/// Does this expense belong to `period` as seen from `now`?
///
/// Unparseable dates only match `All`.
pub fn matches_period<Tz: TimeZone>(expense: &Expense, period: Period, now: &DateTime<Tz>) -> bool {
    let tz = now.timezone();
    match period {
        Period::All => true,
        Period::Day => is_on_day(expense, now.date_naive(), &tz),
        Period::Week | Period::Month => {
            let Some(start) = period_start(period, now) else {
                return false;
            };
            expense.date_in(&tz).map_or(false, |dt| dt >= start)
        }
    }
}

/// Filter preserving input order
pub fn filter_by_period<Tz: TimeZone>(
    expenses: &[Expense],
    period: Period,
    now: &DateTime<Tz>,
) -> Vec<Expense> {
    expenses
        .iter()
        .filter(|e| matches_period(e, period, now))
        .cloned()
        .collect()
}

/// The `days` calendar dates ending today, oldest first
pub fn trailing_days<Tz: TimeZone>(days: u32, now: &DateTime<Tz>) -> Vec<NaiveDate> {
    let today = now.date_naive();
    (0..days)
        .rev()
        .filter_map(|offset| today.checked_sub_days(Days::new(u64::from(offset))))
        .collect()
}
