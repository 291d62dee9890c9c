//! Home screen: quick starts, what's happening, who's free

use super::create::{create_link, CreateSlot};
use super::hangouts::{Catalog, HangoutCard};
use super::people::{ChipGroup, FriendAvailability};
use crate::config::ScheduleConfig;
use crate::db::{AvailabilityStatus, Database};
use crate::schedule::{resolve_range, Period, TimeFilter, TimeRange};
use crate::session::Session;
use chrono::DateTime;
use chrono_tz::Tz;
use serde::Serialize;
use tracing::debug;

/// One-tap shortcuts into the create form
pub const QUICK_HANGOUTS: [(&str, &str, &str); 9] = [
    ("gym", "🏋️", "Gym"),
    ("walk", "🚶", "Walk"),
    ("coffee", "☕", "Coffee"),
    ("library", "📚", "Library"),
    ("chill", "😌", "Chill"),
    ("lunch", "🍽️", "Lunch"),
    ("movie", "🎬", "Movie"),
    ("games", "🎮", "Games"),
    ("study", "📖", "Study"),
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuickHangout {
    pub id: &'static str,
    pub icon: &'static str,
    pub label: &'static str,
    pub link: String,
}

/// Friends free during one period
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FreeGroup {
    pub period: Period,
    pub label: &'static str,
    pub time_range: &'static str,
    #[serde(flatten)]
    pub people: ChipGroup,
    /// Create a hangout in this period
    pub plan_link: String,
}

#[derive(Debug, Serialize)]
pub struct HomeView {
    pub filter: TimeFilter,
    pub range: TimeRange,
    /// "Free around now" or "Free this weekend" etc.
    pub heading: String,
    pub quick: Vec<QuickHangout>,
    pub happening: Vec<HangoutCard>,
    pub free_now: Vec<FreeGroup>,
    pub degraded: Vec<&'static str>,
}

pub fn quick_hangouts() -> Vec<QuickHangout> {
    QUICK_HANGOUTS
        .iter()
        .map(|&(id, icon, label)| QuickHangout {
            id,
            icon,
            label,
            link: create_link(Some(label), None),
        })
        .collect()
}

pub async fn load(
    db: &Database,
    schedule: &ScheduleConfig,
    session: &Session,
    filter: TimeFilter,
    now: DateTime<Tz>,
) -> HomeView {
    let range = resolve_range(filter, now, schedule.weekend);
    debug!(filter = filter.as_str(), start = %range.start, end = %range.end, "resolved home range");

    let mut degraded = Vec::new();
    let catalog = Catalog::fetch(db, session, &range, &mut degraded).await;
    let mut discoverable = catalog.partition(session, &range).discoverable;
    discoverable.truncate(schedule.happening_limit);
    let happening = catalog.cards(&discoverable, &now);

    let availability = FriendAvailability::fetch(db, session, &range, &mut degraded).await;
    let free_now = availability
        .by_period(AvailabilityStatus::Available, &range)
        .into_iter()
        .filter(|(_, people)| !people.is_empty())
        .map(|(period, people)| FreeGroup {
            period,
            label: period.label(),
            time_range: period.time_range(),
            people: ChipGroup::capped(people, schedule.avatar_limit),
            plan_link: create_link(None, Some(CreateSlot::from(period))),
        })
        .collect();

    let heading = match filter {
        TimeFilter::Today => "Free around now".to_string(),
        other => format!("Free {}", other.phrase()),
    };

    HomeView {
        filter,
        range,
        heading,
        quick: quick_hangouts(),
        happening,
        free_now,
        degraded,
    }
}
