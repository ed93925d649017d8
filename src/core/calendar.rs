//! Calendar helpers: sales granularities, seasons and month arithmetic.

use chrono::{Datelike, NaiveDate, NaiveDateTime, Weekday};
use std::fmt;

/// Time-bucket size of a sales file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Granularity {
    Hourly,
    Daily,
    Weekly,
    Monthly,
}

impl Granularity {
    pub const ALL: [Granularity; 4] = [
        Granularity::Hourly,
        Granularity::Daily,
        Granularity::Weekly,
        Granularity::Monthly,
    ];

    /// The fixed `datum` format for this granularity.
    pub fn date_format(&self) -> &'static str {
        match self {
            Granularity::Hourly => "%m/%d/%Y %H:%M",
            Granularity::Daily | Granularity::Weekly => "%m/%d/%Y",
            Granularity::Monthly => "%Y-%m-%d",
        }
    }

    /// Conventional file name of the sales export.
    pub fn file_name(&self) -> &'static str {
        match self {
            Granularity::Hourly => "saleshourly.csv",
            Granularity::Daily => "salesdaily.csv",
            Granularity::Weekly => "salesweekly.csv",
            Granularity::Monthly => "salesmonthly.csv",
        }
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Granularity::Hourly => "Hourly",
            Granularity::Daily => "Daily",
            Granularity::Weekly => "Weekly",
            Granularity::Monthly => "Monthly",
        };
        f.write_str(name)
    }
}

/// Meteorological season label.
///
/// Months are binned with edges `0, 2, 5, 8, 11, 12` (lowest edge inclusive),
/// so December and January/February share `Winter`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Season {
    Winter,
    Spring,
    Summer,
    Fall,
}

impl Season {
    /// Display order used by seasonal charts.
    pub const ALL: [Season; 4] = [Season::Winter, Season::Spring, Season::Summer, Season::Fall];

    /// Bin a month number (1-12). Returns `None` outside `0..=12`.
    pub fn from_month(month: u32) -> Option<Season> {
        match month {
            1..=2 => Some(Season::Winter),
            3..=5 => Some(Season::Spring),
            6..=8 => Some(Season::Summer),
            9..=11 => Some(Season::Fall),
            12 => Some(Season::Winter),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Season::Winter => "Winter",
            Season::Spring => "Spring",
            Season::Summer => "Summer",
            Season::Fall => "Fall",
        }
    }
}

/// Weekdays in chart order.
pub const WEEKDAYS: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

/// Full English day name.
pub fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

/// Midnight on the given date.
pub fn midnight(date: NaiveDate) -> NaiveDateTime {
    date.and_time(chrono::NaiveTime::MIN)
}

/// First day of the month at midnight.
pub fn month_start(year: i32, month: u32) -> Option<NaiveDateTime> {
    NaiveDate::from_ymd_opt(year, month, 1).map(midnight)
}

/// Last day of the month at midnight.
pub fn month_end(year: i32, month: u32) -> Option<NaiveDateTime> {
    let (next_year, next_month) = next_month(year, month);
    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|d| d.pred_opt())
        .map(midnight)
}

fn next_month(year: i32, month: u32) -> (i32, u32) {
    if month >= 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    }
}

/// `periods` month starts strictly after `last`.
pub fn month_starts_after(last: NaiveDateTime, periods: usize) -> Vec<NaiveDateTime> {
    let (mut year, mut month) = next_month(last.year(), last.month());
    let mut out = Vec::with_capacity(periods);
    while out.len() < periods {
        if let Some(ts) = month_start(year, month) {
            out.push(ts);
        }
        (year, month) = next_month(year, month);
    }
    out
}

/// `periods` month ends strictly after `last`.
pub fn month_ends_after(last: NaiveDateTime, periods: usize) -> Vec<NaiveDateTime> {
    let (mut year, mut month) = (last.year(), last.month());
    let mut out = Vec::with_capacity(periods);
    while out.len() < periods {
        if let Some(ts) = month_end(year, month) {
            if ts > last {
                out.push(ts);
            }
        }
        (year, month) = next_month(year, month);
    }
    out
}
