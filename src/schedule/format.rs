//! Human-readable "when" labels

use chrono::{DateTime, Duration, Utc};
use chrono_tz::Tz;

/// Label a hangout start relative to `now`.
///
/// "Today, 3:00 PM", "Tomorrow, 7:00 PM", "Tue, Jan 16, 7:00 PM", or
/// "Time TBD" when no start is set.
pub fn when_label(start: Option<DateTime<Utc>>, now: &DateTime<Tz>) -> String {
    let Some(start) = start else {
        return "Time TBD".to_string();
    };

    let local = start.with_timezone(&now.timezone());
    let today = now.date_naive();
    let time = local.format("%-I:%M %p");

    if local.date_naive() == today {
        format!("Today, {}", time)
    } else if local.date_naive() == today + Duration::days(1) {
        format!("Tomorrow, {}", time)
    } else {
        local.format("%a, %b %-d, %-I:%M %p").to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_when_label() {
        let now = Tz::UTC.with_ymd_and_hms(2024, 1, 15, 9, 0, 0).unwrap();
        let at = |d, h| Some(Utc.with_ymd_and_hms(2024, 1, d, h, 0, 0).unwrap());

        assert_eq!(when_label(at(15, 15), &now), "Today, 3:00 PM");
        assert_eq!(when_label(at(16, 19), &now), "Tomorrow, 7:00 PM");
        assert_eq!(when_label(at(18, 9), &now), "Thu, Jan 18, 9:00 AM");
        assert_eq!(when_label(None, &now), "Time TBD");
    }

    #[test]
    fn test_when_label_uses_viewer_zone() {
        let now = chrono_tz::America::New_York
            .with_ymd_and_hms(2024, 1, 15, 20, 0, 0)
            .unwrap();
        // 03:00 UTC on the 16th is still the 15th in New York
        let start = Some(Utc.with_ymd_and_hms(2024, 1, 16, 3, 0, 0).unwrap());
        assert_eq!(when_label(start, &now), "Today, 10:00 PM");
    }
}
