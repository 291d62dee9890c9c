//! Which hangouts a user sees, and under which heading

use super::range::TimeRange;
use crate::db::{Hangout, Participant};
use serde::Serialize;

/// Where a hangout shows up for a given user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Bucket {
    /// Created by the user and still open
    Mine,
    /// Someone else's open hangout the user accepted or might attend
    Joined,
    /// Cancelled or completed, and the user was involved
    Past,
    /// Public, open, starting in range, and the user has no participation
    Discoverable,
    /// Not shown
    Excluded,
}

/// Classify one hangout for `user_id`.
///
/// `participants` may contain rows for other hangouts; only rows matching
/// the hangout id count. The hangout status decides between the open and
/// closed buckets before anything else, so a creator's own hangout is Mine
/// or Past by status alone.
pub fn classify(user_id: &str, hangout: &Hangout, participants: &[Participant], range: &TimeRange) -> Bucket {
    let is_creator = hangout.creator_id == user_id;
    let participation = participants
        .iter()
        .find(|p| p.hangout_id == hangout.id && p.user_id == user_id)
        .map(|p| p.status);
    let attending = participation.is_some_and(|s| s.is_attending());

    if !hangout.status.is_open() {
        return if is_creator || attending {
            Bucket::Past
        } else {
            Bucket::Excluded
        };
    }

    if is_creator {
        return Bucket::Mine;
    }
    if attending {
        return Bucket::Joined;
    }

    let starts_in_range = hangout.start_time.is_some_and(|start| range.contains(start));
    if hangout.is_public && participation.is_none() && starts_in_range {
        Bucket::Discoverable
    } else {
        Bucket::Excluded
    }
}

/// Hangouts split into their visible buckets, input order preserved
#[derive(Debug, Default)]
pub struct Partitioned<'a> {
    pub mine: Vec<&'a Hangout>,
    pub joined: Vec<&'a Hangout>,
    pub past: Vec<&'a Hangout>,
    pub discoverable: Vec<&'a Hangout>,
}

pub fn partition<'a>(
    user_id: &str,
    hangouts: &'a [Hangout],
    participants: &[Participant],
    range: &TimeRange,
) -> Partitioned<'a> {
    let mut out = Partitioned::default();
    for hangout in hangouts {
        match classify(user_id, hangout, participants, range) {
            Bucket::Mine => out.mine.push(hangout),
            Bucket::Joined => out.joined.push(hangout),
            Bucket::Past => out.past.push(hangout),
            Bucket::Discoverable => out.discoverable.push(hangout),
            Bucket::Excluded => {}
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{HangoutStatus, ParticipantStatus};
    use crate::schedule::{resolve_range, TimeFilter, WeekendPolicy};
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use chrono_tz::Tz;
    use pretty_assertions::assert_eq;

    fn now() -> DateTime<Tz> {
        Tz::UTC.with_ymd_and_hms(2024, 1, 17, 9, 0, 0).unwrap()
    }

    fn today() -> TimeRange {
        resolve_range(TimeFilter::Today, now(), WeekendPolicy::Next)
    }

    fn hangout(id: &str, creator: &str, status: HangoutStatus, is_public: bool) -> Hangout {
        Hangout {
            id: id.to_string(),
            title: format!("Hangout {}", id),
            description: None,
            creator_id: creator.to_string(),
            start_time: Some(now().with_timezone(&Utc) + Duration::hours(6)),
            end_time: None,
            status,
            is_public,
            location: None,
            vibe: None,
            max_people: 4,
            created_at: now().with_timezone(&Utc),
        }
    }

    fn participant(hangout_id: &str, user_id: &str, status: ParticipantStatus) -> Participant {
        Participant {
            hangout_id: hangout_id.to_string(),
            user_id: user_id.to_string(),
            status,
            updated_at: now().with_timezone(&Utc),
        }
    }

    #[test]
    fn test_own_confirmed_is_mine_never_discoverable() {
        let h = hangout("h1", "u", HangoutStatus::Confirmed, true);
        assert_eq!(classify("u", &h, &[], &today()), Bucket::Mine);
    }

    #[test]
    fn test_status_decides_for_creator() {
        let done = hangout("h1", "u", HangoutStatus::Completed, false);
        let cancelled = hangout("h2", "u", HangoutStatus::Cancelled, true);
        assert_eq!(classify("u", &done, &[], &today()), Bucket::Past);
        assert_eq!(classify("u", &cancelled, &[], &today()), Bucket::Past);
    }

    #[test]
    fn test_joined_requires_attending_status() {
        let h = hangout("h1", "a", HangoutStatus::Planning, false);
        let accepted = [participant("h1", "u", ParticipantStatus::Accepted)];
        let maybe = [participant("h1", "u", ParticipantStatus::Maybe)];
        let invited = [participant("h1", "u", ParticipantStatus::Invited)];
        assert_eq!(classify("u", &h, &accepted, &today()), Bucket::Joined);
        assert_eq!(classify("u", &h, &maybe, &today()), Bucket::Joined);
        assert_eq!(classify("u", &h, &invited, &today()), Bucket::Excluded);
    }

    #[test]
    fn test_joined_public_is_not_discoverable() {
        let h = hangout("h1", "a", HangoutStatus::Confirmed, true);
        let rows = [participant("h1", "u", ParticipantStatus::Accepted)];
        assert_eq!(classify("u", &h, &rows, &today()), Bucket::Joined);
    }

    #[test]
    fn test_declined_public_is_hidden() {
        let h = hangout("h1", "a", HangoutStatus::Confirmed, true);
        let rows = [participant("h1", "u", ParticipantStatus::Declined)];
        assert_eq!(classify("u", &h, &rows, &today()), Bucket::Excluded);
    }

    #[test]
    fn test_discoverable_needs_public_and_range() {
        let public = hangout("h1", "a", HangoutStatus::Planning, true);
        let private = hangout("h2", "a", HangoutStatus::Planning, false);
        let mut later = hangout("h3", "a", HangoutStatus::Planning, true);
        later.start_time = Some(now().with_timezone(&Utc) + Duration::days(2));
        let mut undated = hangout("h4", "a", HangoutStatus::Planning, true);
        undated.start_time = None;

        assert_eq!(classify("u", &public, &[], &today()), Bucket::Discoverable);
        assert_eq!(classify("u", &private, &[], &today()), Bucket::Excluded);
        assert_eq!(classify("u", &later, &[], &today()), Bucket::Excluded);
        assert_eq!(classify("u", &undated, &[], &today()), Bucket::Excluded);
    }

    #[test]
    fn test_other_users_rows_are_ignored() {
        let h = hangout("h1", "a", HangoutStatus::Planning, true);
        let rows = [
            participant("h1", "someone", ParticipantStatus::Accepted),
            participant("h2", "u", ParticipantStatus::Accepted),
        ];
        assert_eq!(classify("u", &h, &rows, &today()), Bucket::Discoverable);
    }

    #[test]
    fn test_past_participation() {
        let h = hangout("h1", "a", HangoutStatus::Completed, true);
        let went = [participant("h1", "u", ParticipantStatus::Accepted)];
        let skipped = [participant("h1", "u", ParticipantStatus::Declined)];
        assert_eq!(classify("u", &h, &went, &today()), Bucket::Past);
        assert_eq!(classify("u", &h, &skipped, &today()), Bucket::Excluded);
        assert_eq!(classify("u", &h, &[], &today()), Bucket::Excluded);
    }

    #[test]
    fn test_partition_keeps_order() {
        let hangouts = vec![
            hangout("h1", "u", HangoutStatus::Planning, false),
            hangout("h2", "a", HangoutStatus::Planning, true),
            hangout("h3", "u", HangoutStatus::Confirmed, true),
            hangout("h4", "a", HangoutStatus::Cancelled, true),
        ];
        let split = partition("u", &hangouts, &[], &today());
        let ids = |v: &[&Hangout]| v.iter().map(|h| h.id.clone()).collect::<Vec<_>>();
        assert_eq!(ids(&split.mine), vec!["h1", "h3"]);
        assert_eq!(ids(&split.discoverable), vec!["h2"]);
        assert!(split.joined.is_empty());
        assert!(split.past.is_empty());
    }
}
