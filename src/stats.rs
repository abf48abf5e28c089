//! Derived statistics over a timer's records.
//!
//! Every function here is pure and lenient: empty input yields zero or
//! `None`, never an error.
//!
//! Ties: `minimum`, `maximum` and `nearest_record` keep the first record
//! encountered in iteration order. With the ascending projection returned
//! by [`filtered_records`] that is the oldest of the tied records.

use chrono::{
    DateTime, Days, Duration, Local, LocalResult, Months, NaiveDateTime, Offset, TimeZone, Utc,
};
use clap::ValueEnum;
use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::model::{Record, Timer};
use crate::time_series::ChartPoint;
use crate::util::mean;

/// Window used to filter records before aggregation
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum, strum_macros::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum TimeRange {
    #[default]
    Week,
    Month,
    Year,
    All,
}

impl TimeRange {
    pub const ALL: [TimeRange; 4] = [
        TimeRange::Week,
        TimeRange::Month,
        TimeRange::Year,
        TimeRange::All,
    ];

    /// Earliest timestamp still inside the window, `None` only for `All`.
    ///
    /// The offset is applied to the local wall clock, so a week back from
    /// noon is noon seven calendar days earlier even across a DST change.
    pub fn cutoff<Tz: TimeZone>(self, now: &DateTime<Tz>) -> Option<DateTime<Tz>> {
        let local = now.naive_local();
        let shifted = match self {
            TimeRange::Week => local.checked_sub_days(Days::new(7)),
            TimeRange::Month => local.checked_sub_months(Months::new(1)),
            TimeRange::Year => local.checked_sub_months(Months::new(12)),
            TimeRange::All => return None,
        };
        let tz = now.timezone();
        Some(match shifted {
            Some(wall) => resolve_wall_clock(&tz, wall),
            None => DateTime::<Utc>::MIN_UTC.with_timezone(&tz),
        })
    }

    pub fn next(self) -> Self {
        match self {
            TimeRange::Week => TimeRange::Month,
            TimeRange::Month => TimeRange::Year,
            TimeRange::Year => TimeRange::All,
            TimeRange::All => TimeRange::Week,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            TimeRange::Week => "Week",
            TimeRange::Month => "Month",
            TimeRange::Year => "Year",
            TimeRange::All => "All",
        }
    }
}

/// How dates on the chart's x axis are printed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AxisDateFormat {
    DayMonth,
    MonthYear,
}

impl AxisDateFormat {
    pub fn pattern(self) -> &'static str {
        match self {
            AxisDateFormat::DayMonth => "%d %b",
            AxisDateFormat::MonthYear => "%b %Y",
        }
    }

    pub fn format(self, dt: &DateTime<Local>) -> String {
        dt.format(self.pattern()).to_string()
    }
}

/// Pin a wall-clock time to an instant in `tz`.
///
/// An ambiguous time (clocks turned back) takes the earlier instant. A time
/// skipped by clocks turning forward is read with the offset in force just
/// before the jump, which lands the same distance past it.
fn resolve_wall_clock<Tz: TimeZone>(tz: &Tz, wall: NaiveDateTime) -> DateTime<Tz> {
    match tz.from_local_datetime(&wall) {
        LocalResult::Single(dt) => dt,
        LocalResult::Ambiguous(earliest, _) => earliest,
        LocalResult::None => {
            let before = wall.checked_sub_signed(Duration::days(1)).unwrap_or(wall);
            let offset = tz.offset_from_utc_datetime(&before).fix();
            tz.from_utc_datetime(&(wall - offset))
        }
    }
}

/// Records of `timer` inside `range`, sorted ascending by timestamp.
/// A record exactly at the cutoff is included.
pub fn filtered_records<Tz: TimeZone>(
    timer: &Timer,
    range: TimeRange,
    now: DateTime<Tz>,
) -> Vec<Record> {
    let cutoff = range.cutoff(&now);
    timer
        .records
        .iter()
        .filter(|r| cutoff.as_ref().map_or(true, |c| r.timestamp >= *c))
        .sorted_by_key(|r| r.timestamp)
        .cloned()
        .collect()
}

pub fn average(records: &[Record]) -> f64 {
    let durations: Vec<f64> = records.iter().map(|r| r.duration).collect();
    mean(&durations).unwrap_or(0.0)
}

pub fn minimum(records: &[Record]) -> f64 {
    first_extreme(records, |candidate, best| candidate < best)
}

pub fn maximum(records: &[Record]) -> f64 {
    first_extreme(records, |candidate, best| candidate > best)
}

// Iterator::max_by keeps the last of equal elements, so fold explicitly
// to keep the first one for both extremes.
fn first_extreme(records: &[Record], better: impl Fn(f64, f64) -> bool) -> f64 {
    records
        .iter()
        .map(|r| r.duration)
        .fold(None, |best: Option<f64>, d| match best {
            Some(b) if !better(d, b) => Some(b),
            _ => Some(d),
        })
        .unwrap_or(0.0)
}

/// Record whose timestamp is closest to `target`
pub fn nearest_record(records: &[Record], target: DateTime<Local>) -> Option<&Record> {
    // min_by_key returns the first of equally distant records
    records
        .iter()
        .min_by_key(|r| (r.timestamp - target).abs())
}

pub fn axis_date_format(range: TimeRange) -> AxisDateFormat {
    match range {
        TimeRange::Week | TimeRange::Month => AxisDateFormat::DayMonth,
        TimeRange::Year | TimeRange::All => AxisDateFormat::MonthYear,
    }
}

/// Summary row shown under the trend chart
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Summary {
    pub count: usize,
    pub average: f64,
    pub minimum: f64,
    pub maximum: f64,
}

impl Summary {
    pub fn of(records: &[Record]) -> Self {
        Self {
            count: records.len(),
            average: average(records),
            minimum: minimum(records),
            maximum: maximum(records),
        }
    }
}

/// Points plotted on the trend chart: the first `limit` records of the
/// ascending projection
pub fn chart_points(records: &[Record], limit: usize) -> Vec<ChartPoint> {
    records.iter().take(limit).map(ChartPoint::from).collect()
}
