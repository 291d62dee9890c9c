//! Coarse periods of the day used to group people and hangouts

use chrono::{DateTime, Duration, TimeZone, Timelike};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Part of the day, by local hour
///
/// The wire form is always lowercase; [`Period::label`] is for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    /// 00:00 - 11:59
    Morning,
    /// 12:00 - 16:59
    Afternoon,
    /// 17:00 - 20:59
    Evening,
    /// 21:00 - 23:59
    Night,
}

impl Period {
    pub const ALL: [Period; 4] = [
        Period::Morning,
        Period::Afternoon,
        Period::Evening,
        Period::Night,
    ];

    pub fn from_hour(hour: u32) -> Self {
        match hour {
            0..=11 => Period::Morning,
            12..=16 => Period::Afternoon,
            17..=20 => Period::Evening,
            _ => Period::Night,
        }
    }

    /// Bucket an instant by its hour in its own time zone
    pub fn of<Tz: TimeZone>(instant: &DateTime<Tz>) -> Self {
        Self::from_hour(instant.hour())
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Period::Morning => "morning",
            Period::Afternoon => "afternoon",
            Period::Evening => "evening",
            Period::Night => "night",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "morning" => Some(Period::Morning),
            "afternoon" => Some(Period::Afternoon),
            "evening" => Some(Period::Evening),
            "night" | "tonight" => Some(Period::Night),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Period::Morning => "Morning",
            Period::Afternoon => "Afternoon",
            Period::Evening => "Evening",
            Period::Night => "Night",
        }
    }

    /// Range shown on the time view. Morning is advertised from 6am even
    /// though earlier hours still bucket into it.
    pub fn time_range(&self) -> &'static str {
        match self {
            Period::Morning => "6am - 12pm",
            Period::Afternoon => "12pm - 5pm",
            Period::Evening => "5pm - 9pm",
            Period::Night => "9pm - 12am",
        }
    }

    /// Hour a hangout planned "in the morning" etc. starts at
    pub fn display_start_hour(&self) -> u32 {
        match self {
            Period::Morning => 6,
            Period::Afternoon => 12,
            Period::Evening => 17,
            Period::Night => 21,
        }
    }
}

/// Every period touched by the local interval `[start, end)`.
///
/// Returned in day order without duplicates. An empty or inverted interval
/// yields the period of `start`.
pub fn periods_spanned<Tz: TimeZone>(start: &DateTime<Tz>, end: &DateTime<Tz>) -> Vec<Period> {
    let first = Period::of(start);
    if end <= start {
        return vec![first];
    }

    let end_local = end.naive_local();
    let mut seen = vec![first];
    let mut boundary = start
        .naive_local()
        .with_minute(0)
        .and_then(|t| t.with_second(0))
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or_else(|| start.naive_local())
        + Duration::hours(1);

    // One full day covers every period
    for _ in 0..24 {
        if boundary >= end_local || seen.len() == Period::ALL.len() {
            break;
        }
        let period = Period::from_hour(boundary.hour());
        if !seen.contains(&period) {
            seen.push(period);
        }
        boundary += Duration::hours(1);
    }

    seen.sort();
    seen
}

/// Group items by the period of a timestamp key, in day order
pub fn group_by_period<T, I, F>(items: I, key: F) -> BTreeMap<Period, Vec<T>>
where
    I: IntoIterator<Item = T>,
    F: Fn(&T) -> Period,
{
    let mut groups: BTreeMap<Period, Vec<T>> = BTreeMap::new();
    for item in items {
        groups.entry(key(&item)).or_default().push(item);
    }
    groups
}
