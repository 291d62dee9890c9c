//! "My time": the day split into periods, with who is free and what's planned

use super::create::{create_link, CreateSlot};
use super::hangouts::{Catalog, HangoutCard};
use super::people::{FriendAvailability, PersonChip};
use crate::config::ScheduleConfig;
use crate::db::{AvailabilityStatus, Database};
use crate::schedule::{group_by_period, resolve_range, Period, TimeFilter, TimeRange};
use crate::session::Session;
use chrono::DateTime;
use chrono_tz::Tz;
use serde::Serialize;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SlotView {
    pub period: Period,
    pub label: &'static str,
    pub time_range: &'static str,
    pub free: Vec<PersonChip>,
    pub maybe: Vec<PersonChip>,
    /// Your own and joined hangouts starting in this period
    pub planned: Vec<HangoutCard>,
    pub plan_link: String,
}

#[derive(Debug, Serialize)]
pub struct TimeView {
    pub filter: TimeFilter,
    pub range: TimeRange,
    pub slots: Vec<SlotView>,
    pub degraded: Vec<&'static str>,
}

pub async fn load(
    db: &Database,
    schedule: &ScheduleConfig,
    session: &Session,
    filter: TimeFilter,
    now: DateTime<Tz>,
) -> TimeView {
    let range = resolve_range(filter, now, schedule.weekend);
    debug!(filter = filter.as_str(), start = %range.start, end = %range.end, "resolved time range");
    let tz = range.timezone();

    let mut degraded = Vec::new();
    let availability = FriendAvailability::fetch(db, session, &range, &mut degraded).await;
    let mut free = availability.by_period(AvailabilityStatus::Available, &range);
    let mut maybe = availability.by_period(AvailabilityStatus::Maybe, &range);

    let catalog = Catalog::fetch(db, session, &range, &mut degraded).await;
    let buckets = catalog.partition(session, &range);
    let dated = buckets
        .mine
        .into_iter()
        .chain(buckets.joined)
        .filter_map(|h| Some((h, h.start_time.filter(|&s| range.contains(s))?)));
    let mut planned = group_by_period(dated, |(_, start)| Period::of(&start.with_timezone(&tz)));

    let slots = Period::ALL
        .into_iter()
        .map(|period| {
            let mut hangouts = planned.remove(&period).unwrap_or_default();
            hangouts.sort_by_key(|(_, start)| *start);
            SlotView {
                period,
                label: period.label(),
                time_range: period.time_range(),
                free: free.remove(&period).unwrap_or_default(),
                maybe: maybe.remove(&period).unwrap_or_default(),
                planned: hangouts.into_iter().map(|(h, _)| catalog.card(h, &now)).collect(),
                plan_link: create_link(None, Some(CreateSlot::from(period))),
            }
        })
        .collect();

    TimeView {
        filter,
        range,
        slots,
        degraded,
    }
}
