//! Hangouts view and participation actions

use super::or_empty;
use crate::config::ScheduleConfig;
use crate::db::{Database, Hangout, HangoutStatus, Participant, ParticipantStatus, Profile, Vibe};
use crate::error::{PeerpoolError, Result};
use crate::schedule::{partition, resolve_range, when_label, Partitioned, TimeFilter, TimeRange};
use crate::session::Session;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, info};

/// A hangout as rendered in lists
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HangoutCard {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub status: HangoutStatus,
    pub is_public: bool,
    pub location: Option<String>,
    pub vibe: Option<Vibe>,
    pub max_people: i64,
    pub creator_id: String,
    pub creator_name: String,
    /// Creator plus everyone accepted or maybe
    pub participant_count: usize,
    pub when: String,
}

/// Everything a user can see for one range: their own hangouts, the ones
/// they take part in, and public ones starting in range.
#[derive(Debug, Default)]
pub(crate) struct Catalog {
    pub hangouts: Vec<Hangout>,
    pub participants: Vec<Participant>,
    pub creators: HashMap<String, Profile>,
}

impl Catalog {
    pub async fn fetch(db: &Database, session: &Session, range: &TimeRange, degraded: &mut Vec<&'static str>) -> Self {
        let mut hangouts = or_empty(db.get_user_hangouts(session.user_id()).await, "hangouts", degraded);
        let public = or_empty(
            db.get_public_hangouts(range.start_timestamp(), range.end_timestamp())
                .await,
            "discover",
            degraded,
        );
        for hangout in public {
            if !hangouts.iter().any(|h| h.id == hangout.id) {
                hangouts.push(hangout);
            }
        }

        let ids: Vec<String> = hangouts.iter().map(|h| h.id.clone()).collect();
        let participants = or_empty(db.get_participants(&ids).await, "participants", degraded);

        let mut creator_ids: Vec<String> = hangouts.iter().map(|h| h.creator_id.clone()).collect();
        creator_ids.sort();
        creator_ids.dedup();
        let creators = or_empty(db.get_profiles(&creator_ids).await, "profiles", degraded)
            .into_iter()
            .map(|p| (p.id.clone(), p))
            .collect();

        Self {
            hangouts,
            participants,
            creators,
        }
    }

    pub fn partition(&self, session: &Session, range: &TimeRange) -> Partitioned<'_> {
        partition(session.user_id(), &self.hangouts, &self.participants, range)
    }

    /// Open hangouts the user was invited to and has not answered yet
    pub fn invitations(&self, session: &Session) -> Vec<&Hangout> {
        let user_id = session.user_id();
        self.hangouts
            .iter()
            .filter(|h| h.status.is_open() && h.creator_id != user_id)
            .filter(|h| {
                self.participants.iter().any(|p| {
                    p.hangout_id == h.id && p.user_id == user_id && p.status == ParticipantStatus::Invited
                })
            })
            .collect()
    }

    pub fn card(&self, hangout: &Hangout, now: &DateTime<Tz>) -> HangoutCard {
        let attending = self
            .participants
            .iter()
            .filter(|p| p.hangout_id == hangout.id && p.status.is_attending())
            .count();
        let creator_name = self
            .creators
            .get(&hangout.creator_id)
            .map(Profile::display_name)
            .unwrap_or_else(|| "Someone".to_string());

        HangoutCard {
            id: hangout.id.clone(),
            title: hangout.title.clone(),
            description: hangout.description.clone(),
            start_time: hangout.start_time,
            end_time: hangout.end_time,
            status: hangout.status,
            is_public: hangout.is_public,
            location: hangout.location.clone(),
            vibe: hangout.vibe,
            max_people: hangout.max_people,
            creator_id: hangout.creator_id.clone(),
            creator_name,
            participant_count: 1 + attending,
            when: when_label(hangout.start_time, now),
        }
    }

    pub fn cards(&self, hangouts: &[&Hangout], now: &DateTime<Tz>) -> Vec<HangoutCard> {
        hangouts.iter().map(|h| self.card(h, now)).collect()
    }
}

#[derive(Debug, Serialize)]
pub struct HangoutsView {
    pub filter: TimeFilter,
    pub range: TimeRange,
    /// Planned by you
    pub mine: Vec<HangoutCard>,
    pub joined: Vec<HangoutCard>,
    /// Waiting on your answer
    pub invited: Vec<HangoutCard>,
    pub past: Vec<HangoutCard>,
    /// Find more
    pub discover: Vec<HangoutCard>,
    pub degraded: Vec<&'static str>,
}

/// Build the hangouts view for `session` at `now`
pub async fn load(
    db: &Database,
    schedule: &ScheduleConfig,
    session: &Session,
    filter: TimeFilter,
    now: DateTime<Tz>,
) -> HangoutsView {
    let range = resolve_range(filter, now, schedule.weekend);
    debug!(filter = filter.as_str(), start = %range.start, end = %range.end, "resolved hangouts range");

    let mut degraded = Vec::new();
    let catalog = Catalog::fetch(db, session, &range, &mut degraded).await;
    let buckets = catalog.partition(session, &range);

    HangoutsView {
        filter,
        mine: catalog.cards(&buckets.mine, &now),
        joined: catalog.cards(&buckets.joined, &now),
        invited: catalog.cards(&catalog.invitations(session), &now),
        past: catalog.cards(&buckets.past, &now),
        discover: catalog.cards(&buckets.discoverable, &now),
        range,
        degraded,
    }
}

/// What a user can do with someone else's hangout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParticipationAction {
    Join,
    Interested,
    Pass,
}

impl ParticipationAction {
    pub fn status(&self) -> ParticipantStatus {
        match self {
            ParticipationAction::Join => ParticipantStatus::Accepted,
            ParticipationAction::Interested => ParticipantStatus::Maybe,
            ParticipationAction::Pass => ParticipantStatus::Declined,
        }
    }
}

/// Record the user's response to a hangout.
///
/// Repeating an action is a no-op. Fails for the creator, for closed
/// hangouts, for private hangouts without an invitation, and for joining or
/// marking interest in a hangout that is already full.
pub async fn respond(db: &Database, session: &Session, hangout_id: &str, action: ParticipationAction) -> Result<()> {
    let user_id = session.user_id();
    let hangout = db
        .get_hangout(hangout_id)
        .await?
        .ok_or_else(|| PeerpoolError::NotFound(format!("hangout {}", hangout_id)))?;

    if hangout.creator_id == user_id {
        return Err(PeerpoolError::validation("You're hosting this hangout"));
    }
    if !hangout.status.is_open() {
        return Err(PeerpoolError::validation("This hangout is no longer open"));
    }

    let participants = db.get_participants(&[hangout.id.clone()]).await?;
    let mine = participants.iter().find(|p| p.user_id == user_id);
    if !hangout.is_public && mine.is_none() {
        return Err(PeerpoolError::Forbidden("You weren't invited to this hangout".to_string()));
    }

    if action.status().is_attending() && !mine.is_some_and(|p| p.status.is_attending()) {
        let going = 1 + participants.iter().filter(|p| p.status.is_attending()).count();
        if going as i64 >= hangout.max_people {
            return Err(PeerpoolError::validation("This hangout is full"));
        }
    }

    db.set_participation(&hangout.id, user_id, action.status()).await?;
    info!(hangout = %hangout.id, user = user_id, action = ?action, "participation updated");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::NewHangout;
    use chrono::{Duration, TimeZone};
    use pretty_assertions::assert_eq;
    use tokio_test::assert_err;

    fn now() -> DateTime<Tz> {
        Tz::UTC.with_ymd_and_hms(2024, 1, 17, 9, 0, 0).unwrap()
    }

    async fn db() -> Database {
        let db = Database::open_in_memory().await.unwrap();
        db.migrate().await.unwrap();
        for (id, name) in [("ana", "Ana"), ("ben", "Ben"), ("cy", "Cy")] {
            let profile = Profile::new(id, format!("{}@example.com", id), Some(name.to_string()));
            db.upsert_profile(profile).await.unwrap();
        }
        db
    }

    async fn host(db: &Database, creator: &str, hours_from_now: i64, is_public: bool, max_people: i64) -> Hangout {
        db.create_hangout(NewHangout {
            title: "Climbing".to_string(),
            description: None,
            creator_id: creator.to_string(),
            start_time: Some(now().with_timezone(&Utc) + Duration::hours(hours_from_now)),
            end_time: None,
            is_public,
            location: None,
            vibe: Some(Vibe::Active),
            max_people,
        })
        .await
        .unwrap()
    }

    fn ids(cards: &[HangoutCard]) -> Vec<&str> {
        cards.iter().map(|c| c.id.as_str()).collect()
    }

    #[tokio::test]
    async fn test_view_buckets() {
        let db = db().await;
        let schedule = ScheduleConfig::default();
        let own = host(&db, "ana", 3, false, 4).await;
        let public = host(&db, "ben", 4, true, 4).await;
        let tomorrow = host(&db, "ben", 26, true, 4).await;
        let done = host(&db, "ana", 1, false, 4).await;
        db.set_hangout_status(&done.id, HangoutStatus::Completed).await.unwrap();

        let ana = Session::new("ana");
        let view = load(&db, &schedule, &ana, TimeFilter::Today, now()).await;
        assert_eq!(ids(&view.mine), vec![own.id.as_str()]);
        assert_eq!(ids(&view.past), vec![done.id.as_str()]);
        assert_eq!(ids(&view.discover), vec![public.id.as_str()]);
        assert!(view.joined.is_empty());
        assert!(view.degraded.is_empty());

        let card = &view.discover[0];
        assert_eq!(card.creator_name, "Ben");
        assert_eq!(card.participant_count, 1);
        assert_eq!(card.when, "Today, 1:00 PM");

        let later = load(&db, &schedule, &ana, TimeFilter::Tomorrow, now()).await;
        assert_eq!(ids(&later.discover), vec![tomorrow.id.as_str()]);
        assert_eq!(ids(&later.mine), vec![own.id.as_str()]);
    }

    #[tokio::test]
    async fn test_join_moves_to_joined() {
        let db = db().await;
        let schedule = ScheduleConfig::default();
        let public = host(&db, "ben", 4, true, 4).await;
        let ana = Session::new("ana");

        respond(&db, &ana, &public.id, ParticipationAction::Join).await.unwrap();
        respond(&db, &ana, &public.id, ParticipationAction::Join).await.unwrap();
        assert_eq!(db.get_participants(&[public.id.clone()]).await.unwrap().len(), 1);

        let view = load(&db, &schedule, &ana, TimeFilter::Today, now()).await;
        assert_eq!(ids(&view.joined), vec![public.id.as_str()]);
        assert!(view.discover.is_empty());
        assert_eq!(view.joined[0].participant_count, 2);
    }

    #[tokio::test]
    async fn test_pass_hides_from_discover() {
        let db = db().await;
        let public = host(&db, "ben", 4, true, 4).await;
        let ana = Session::new("ana");

        respond(&db, &ana, &public.id, ParticipationAction::Pass).await.unwrap();
        let view = load(&db, &ScheduleConfig::default(), &ana, TimeFilter::Today, now()).await;
        assert!(view.discover.is_empty());
        assert!(view.joined.is_empty());
    }

    #[tokio::test]
    async fn test_invitation_until_answered() {
        let db = db().await;
        let schedule = ScheduleConfig::default();
        let private = host(&db, "ben", 30, false, 4).await;
        db.invite_users(&private.id, &["ana".to_string(), "cy".to_string()]).await.unwrap();

        let ana = Session::new("ana");
        let view = load(&db, &schedule, &ana, TimeFilter::Today, now()).await;
        assert_eq!(ids(&view.invited), vec![private.id.as_str()]);
        assert!(view.joined.is_empty() && view.discover.is_empty());

        respond(&db, &ana, &private.id, ParticipationAction::Interested).await.unwrap();
        let view = load(&db, &schedule, &ana, TimeFilter::Today, now()).await;
        assert!(view.invited.is_empty());
        assert_eq!(ids(&view.joined), vec![private.id.as_str()]);

        respond(&db, &Session::new("cy"), &private.id, ParticipationAction::Pass).await.unwrap();
        let view = load(&db, &schedule, &Session::new("cy"), TimeFilter::Today, now()).await;
        assert!(view.invited.is_empty());

        let host_view = load(&db, &schedule, &Session::new("ben"), TimeFilter::Today, now()).await;
        assert!(host_view.invited.is_empty());
    }

    #[tokio::test]
    async fn test_respond_rejections() {
        let db = db().await;
        let ana = Session::new("ana");
        let own = host(&db, "ana", 2, true, 4).await;
        let private = host(&db, "ben", 2, false, 4).await;
        let closed = host(&db, "ben", 2, true, 4).await;
        db.set_hangout_status(&closed.id, HangoutStatus::Cancelled).await.unwrap();

        let err = respond(&db, &ana, &own.id, ParticipationAction::Join).await.unwrap_err();
        assert!(matches!(err, PeerpoolError::Validation(_)));
        let err = respond(&db, &ana, &private.id, ParticipationAction::Join).await.unwrap_err();
        assert!(matches!(err, PeerpoolError::Forbidden(_)));
        let err = respond(&db, &ana, &closed.id, ParticipationAction::Interested).await.unwrap_err();
        assert!(matches!(err, PeerpoolError::Validation(_)));
        let err = respond(&db, &ana, "missing", ParticipationAction::Pass).await.unwrap_err();
        assert!(matches!(err, PeerpoolError::NotFound(_)));

        // An invitation opens up a private hangout
        db.invite_users(&private.id, &["ana".to_string()]).await.unwrap();
        respond(&db, &ana, &private.id, ParticipationAction::Interested).await.unwrap();
    }

    #[tokio::test]
    async fn test_join_full_hangout() {
        let db = db().await;
        let pair = host(&db, "ben", 2, true, 2).await;

        respond(&db, &Session::new("cy"), &pair.id, ParticipationAction::Join).await.unwrap();
        assert_err!(respond(&db, &Session::new("ana"), &pair.id, ParticipationAction::Join).await);
        // Already going, so joining again still succeeds
        respond(&db, &Session::new("cy"), &pair.id, ParticipationAction::Join).await.unwrap();
    }

    #[tokio::test]
    async fn test_interested_counts_against_capacity() {
        let db = db().await;
        let pair = host(&db, "ben", 2, true, 2).await;

        respond(&db, &Session::new("cy"), &pair.id, ParticipationAction::Interested).await.unwrap();
        let err = respond(&db, &Session::new("ana"), &pair.id, ParticipationAction::Interested)
            .await
            .unwrap_err();
        assert!(matches!(err, PeerpoolError::Validation(_)));

        // Passing never needs a seat, and a maybe can firm up to a join
        respond(&db, &Session::new("ana"), &pair.id, ParticipationAction::Pass).await.unwrap();
        respond(&db, &Session::new("cy"), &pair.id, ParticipationAction::Join).await.unwrap();

        let view = load(&db, &ScheduleConfig::default(), &Session::new("cy"), TimeFilter::Today, now()).await;
        assert_eq!(view.joined[0].participant_count, 2);
    }
}
