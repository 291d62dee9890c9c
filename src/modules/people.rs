//! Friends, and who among them is free when

use super::or_empty;
use crate::db::{AvailabilityBlock, AvailabilityStatus, Database, Profile};
use crate::error::Result;
use crate::schedule::{group_by_period, periods_spanned, Period, TimeRange};
use crate::session::Session;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

/// A person as shown in avatar rows
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PersonChip {
    pub id: String,
    pub name: String,
    pub initial: String,
    pub avatar_url: Option<String>,
}

impl From<&Profile> for PersonChip {
    fn from(profile: &Profile) -> Self {
        Self {
            id: profile.id.clone(),
            name: profile.display_name(),
            initial: profile.initial(),
            avatar_url: profile.avatar_url.clone(),
        }
    }
}

/// A row of chips with "+N" for whoever did not fit
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ChipGroup {
    pub people: Vec<PersonChip>,
    pub overflow: usize,
}

impl ChipGroup {
    pub fn capped(mut people: Vec<PersonChip>, limit: usize) -> Self {
        let overflow = people.len().saturating_sub(limit);
        people.truncate(limit);
        Self { people, overflow }
    }
}

/// Accepted friends' profiles and their availability blocks in one range
#[derive(Debug, Default)]
pub struct FriendAvailability {
    pub profiles: HashMap<String, Profile>,
    pub blocks: Vec<AvailabilityBlock>,
}

impl FriendAvailability {
    pub async fn fetch(db: &Database, session: &Session, range: &TimeRange, degraded: &mut Vec<&'static str>) -> Self {
        let friend_ids = or_empty(db.get_friend_ids(session.user_id()).await, "friends", degraded);
        if friend_ids.is_empty() {
            return Self::default();
        }

        let profiles = or_empty(db.get_profiles(&friend_ids).await, "friends", degraded)
            .into_iter()
            .map(|p| (p.id.clone(), p))
            .collect();
        let blocks = or_empty(
            db.get_availability(&friend_ids, range.start_timestamp(), range.end_timestamp())
                .await,
            "availability",
            degraded,
        );

        Self { profiles, blocks }
    }

    /// Friends with a block of `status` in each period of `range`.
    ///
    /// Blocks are clipped to the range first, so a block running past
    /// midnight only counts for the periods inside the range. Each person
    /// appears at most once per period, ordered by name.
    pub fn by_period(&self, status: AvailabilityStatus, range: &TimeRange) -> BTreeMap<Period, Vec<PersonChip>> {
        let tz = range.timezone();
        let mut pairs: Vec<(Period, &str)> = Vec::new();

        for block in self.blocks.iter().filter(|b| b.status == status) {
            if !range.overlaps(block.start_time, block.end_time) {
                continue;
            }
            let start = block.start_time.with_timezone(&tz).max(range.start);
            let end = block.end_time.with_timezone(&tz).min(range.end);
            if end <= start {
                continue;
            }
            for period in periods_spanned(&start, &end) {
                pairs.push((period, block.user_id.as_str()));
            }
        }
        pairs.sort();
        pairs.dedup();

        group_by_period(pairs, |(period, _)| *period)
            .into_iter()
            .map(|(period, users)| {
                let mut chips: Vec<PersonChip> = users
                    .into_iter()
                    .filter_map(|(_, id)| self.profiles.get(id))
                    .map(PersonChip::from)
                    .collect();
                chips.sort_by(|a, b| a.name.cmp(&b.name));
                (period, chips)
            })
            .collect()
    }
}

/// Everyone the user has an accepted friendship with, by name
pub async fn friends(db: &Database, session: &Session) -> Result<Vec<PersonChip>> {
    let ids = db.get_friend_ids(session.user_id()).await?;
    let mut chips: Vec<PersonChip> = db.get_profiles(&ids).await?.iter().map(PersonChip::from).collect();
    chips.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(chips)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::FriendshipStatus;
    use crate::schedule::{resolve_range, TimeFilter, WeekendPolicy};
    use chrono::{DateTime, TimeZone, Utc};
    use chrono_tz::Tz;
    use pretty_assertions::assert_eq;

    fn today() -> TimeRange {
        let now = Tz::UTC.with_ymd_and_hms(2024, 1, 17, 9, 0, 0).unwrap();
        resolve_range(TimeFilter::Today, now, WeekendPolicy::Next)
    }

    fn at(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, day, hour, 0, 0).unwrap()
    }

    fn block(user: &str, start: DateTime<Utc>, end: DateTime<Utc>, status: AvailabilityStatus) -> AvailabilityBlock {
        AvailabilityBlock {
            id: format!("{}-{}", user, start.timestamp()),
            user_id: user.to_string(),
            start_time: start,
            end_time: end,
            status,
            created_at: start,
        }
    }

    fn people() -> HashMap<String, Profile> {
        [("b", "bea@example.com", "Bea"), ("a", "ari@example.com", "Ari")]
            .into_iter()
            .map(|(id, email, name)| (id.to_string(), Profile::new(id, email, Some(name.to_string()))))
            .collect()
    }

    #[test]
    fn test_capped_chip_group() {
        let chips: Vec<PersonChip> = people().values().map(PersonChip::from).collect();
        let group = ChipGroup::capped(chips.clone(), 1);
        assert_eq!(group.people.len(), 1);
        assert_eq!(group.overflow, 1);

        let roomy = ChipGroup::capped(chips, 6);
        assert_eq!(roomy.people.len(), 2);
        assert_eq!(roomy.overflow, 0);
    }

    #[test]
    fn test_by_period_groups_and_dedups() {
        let availability = FriendAvailability {
            profiles: people(),
            blocks: vec![
                // 10:00-13:00 spans morning and afternoon
                block("b", at(17, 10), at(17, 13), AvailabilityStatus::Available),
                block("b", at(17, 11), at(17, 12), AvailabilityStatus::Available),
                block("a", at(17, 9), at(17, 10), AvailabilityStatus::Available),
                block("a", at(17, 18), at(17, 19), AvailabilityStatus::Maybe),
            ],
        };

        let free = availability.by_period(AvailabilityStatus::Available, &today());
        let names = |p: Period| -> Vec<String> { free[&p].iter().map(|c| c.name.clone()).collect() };
        assert_eq!(names(Period::Morning), vec!["Ari", "Bea"]);
        assert_eq!(names(Period::Afternoon), vec!["Bea"]);
        assert!(!free.contains_key(&Period::Evening));

        let maybe = availability.by_period(AvailabilityStatus::Maybe, &today());
        assert_eq!(maybe.keys().copied().collect::<Vec<_>>(), vec![Period::Evening]);
    }

    #[test]
    fn test_by_period_clips_to_range() {
        let availability = FriendAvailability {
            profiles: people(),
            // Yesterday 22:00 until today 02:00 only counts as this morning
            blocks: vec![block("a", at(16, 22), at(17, 2), AvailabilityStatus::Available)],
        };
        let free = availability.by_period(AvailabilityStatus::Available, &today());
        assert_eq!(free.keys().copied().collect::<Vec<_>>(), vec![Period::Morning]);
    }

    #[test]
    fn test_block_ending_at_midnight_is_not_free_today() {
        let availability = FriendAvailability {
            profiles: people(),
            blocks: vec![block("a", at(16, 22), at(17, 0), AvailabilityStatus::Available)],
        };
        let free = availability.by_period(AvailabilityStatus::Available, &today());
        assert!(free.is_empty());
    }

    #[tokio::test]
    async fn test_friends_lists_accepted_only() {
        let db = Database::open_in_memory().await.unwrap();
        db.migrate().await.unwrap();
        for (id, name) in [("me", "Me"), ("b", "Bea"), ("a", "Ari"), ("z", "Zed")] {
            let profile = Profile::new(id, format!("{}@example.com", id), Some(name.to_string()));
            db.upsert_profile(profile).await.unwrap();
        }
        db.set_friendship("me", "b", FriendshipStatus::Accepted).await.unwrap();
        db.set_friendship("a", "me", FriendshipStatus::Accepted).await.unwrap();
        db.set_friendship("me", "z", FriendshipStatus::Pending).await.unwrap();

        let chips = friends(&db, &Session::new("me")).await.unwrap();
        let names: Vec<_> = chips.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Ari", "Bea"]);
    }
}
