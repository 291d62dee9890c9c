//! Time range resolution for the coarse browsing filters
//!
//! Every view that lets people pick "today", "tomorrow", "weekend" or
//! "custom" goes through [`resolve_range`], so they all agree on where a day
//! starts and ends.

use chrono::{DateTime, Datelike, Duration, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc, Weekday};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

/// Coarse time filter offered by the browsing views
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeFilter {
    #[default]
    Today,
    Tomorrow,
    Weekend,
    /// Fallback week-long range, not a real picker
    Custom,
}

impl TimeFilter {
    pub const ALL: [TimeFilter; 4] = [
        TimeFilter::Today,
        TimeFilter::Tomorrow,
        TimeFilter::Weekend,
        TimeFilter::Custom,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TimeFilter::Today => "today",
            TimeFilter::Tomorrow => "tomorrow",
            TimeFilter::Weekend => "weekend",
            TimeFilter::Custom => "custom",
        }
    }

    /// Button label
    pub fn label(&self) -> &'static str {
        match self {
            TimeFilter::Today => "Today",
            TimeFilter::Tomorrow => "Tomorrow",
            TimeFilter::Weekend => "Weekend",
            TimeFilter::Custom => "Custom",
        }
    }

    /// Phrase used in empty states ("No hangouts happening ...")
    pub fn phrase(&self) -> &'static str {
        match self {
            TimeFilter::Today => "today",
            TimeFilter::Tomorrow => "tomorrow",
            TimeFilter::Weekend => "this weekend",
            TimeFilter::Custom => "this week",
        }
    }
}

/// How "weekend" behaves when asked on a Saturday or Sunday
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeekendPolicy {
    /// Always the next Saturday strictly after today. On a Saturday this is
    /// seven days out.
    #[default]
    Next,
    /// The weekend in progress when today is Saturday or Sunday
    Current,
}

/// Inclusive `[start, end]` bounds in local time
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimeRange {
    pub start: DateTime<Tz>,
    pub end: DateTime<Tz>,
}

impl TimeRange {
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.start <= instant && instant <= self.end
    }

    /// Whether the half-open block `[start, end)` overlaps this range
    pub fn overlaps(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        start <= self.end && end > self.start
    }

    pub fn start_timestamp(&self) -> i64 {
        self.start.timestamp()
    }

    pub fn end_timestamp(&self) -> i64 {
        self.end.timestamp()
    }

    pub fn timezone(&self) -> Tz {
        self.start.timezone()
    }
}

/// Resolve a filter against the current local instant.
///
/// Never fails: every filter maps to a well-formed range with
/// `start <= end`. Local midnights that fall into a DST gap resolve to the
/// first valid instant after the gap.
pub fn resolve_range(filter: TimeFilter, now: DateTime<Tz>, weekend: WeekendPolicy) -> TimeRange {
    let tz = now.timezone();
    let today = now.date_naive();

    let (first, last) = match filter {
        TimeFilter::Today => (today, today),
        TimeFilter::Tomorrow => {
            let day = today + Duration::days(1);
            (day, day)
        }
        TimeFilter::Weekend => {
            let saturday = weekend_start(today, weekend);
            (saturday, saturday + Duration::days(1))
        }
        TimeFilter::Custom => (today, today + Duration::days(7)),
    };

    TimeRange {
        start: start_of_day(&tz, first),
        end: end_of_day(&tz, last),
    }
}

fn weekend_start(today: NaiveDate, policy: WeekendPolicy) -> NaiveDate {
    match (policy, today.weekday()) {
        (WeekendPolicy::Current, Weekday::Sat) => today,
        (WeekendPolicy::Current, Weekday::Sun) => today - Duration::days(1),
        _ => {
            let from_monday = i64::from(today.weekday().num_days_from_monday());
            let ahead = (5 - from_monday).rem_euclid(7);
            today + Duration::days(if ahead == 0 { 7 } else { ahead })
        }
    }
}

/// Local midnight at the start of `date`
pub fn start_of_day(tz: &Tz, date: NaiveDate) -> DateTime<Tz> {
    local_instant(tz, date.and_time(NaiveTime::MIN))
}

/// 23:59:59.999 local on `date`
pub fn end_of_day(tz: &Tz, date: NaiveDate) -> DateTime<Tz> {
    start_of_day(tz, date + Duration::days(1)) - Duration::milliseconds(1)
}

/// `hour`:00 local on `date`
pub fn at_hour(tz: &Tz, date: NaiveDate, hour: u32) -> DateTime<Tz> {
    let naive = date
        .and_hms_opt(hour.min(23), 0, 0)
        .unwrap_or_else(|| date.and_time(NaiveTime::MIN));
    local_instant(tz, naive)
}

/// Map a wall-clock time to an instant, picking the earlier reading when the
/// clock repeats and skipping forward when it does not exist.
pub fn local_instant(tz: &Tz, naive: NaiveDateTime) -> DateTime<Tz> {
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(dt) => dt,
        LocalResult::Ambiguous(earliest, _) => earliest,
        LocalResult::None => {
            let mut probe = naive;
            for _ in 0..24 * 4 {
                probe += Duration::minutes(15);
                if let Some(dt) = tz.from_local_datetime(&probe).earliest() {
                    return dt;
                }
            }
            tz.from_utc_datetime(&naive)
        }
    }
}
