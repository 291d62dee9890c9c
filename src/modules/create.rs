//! Creating hangouts

use super::or_empty;
use super::people::{friends, PersonChip};
use crate::db::{Database, Hangout, NewHangout, Vibe};
use crate::error::{PeerpoolError, Result};
use crate::schedule::range::{at_hour, local_instant};
use crate::schedule::Period;
use crate::session::Session;
use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use tracing::info;

pub const MAX_DESCRIPTION_CHARS: usize = 200;
pub const MIN_PEOPLE: i64 = 2;
pub const MAX_PEOPLE: i64 = 20;
pub const DEFAULT_MAX_PEOPLE: i64 = 4;

const CUSTOM_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M";

/// When, roughly, a new hangout happens
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CreateSlot {
    Morning,
    Afternoon,
    Evening,
    Tonight,
    /// An exact local date and time
    Custom,
}

impl CreateSlot {
    pub const ALL: [CreateSlot; 5] = [
        CreateSlot::Morning,
        CreateSlot::Afternoon,
        CreateSlot::Evening,
        CreateSlot::Tonight,
        CreateSlot::Custom,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CreateSlot::Morning => "morning",
            CreateSlot::Afternoon => "afternoon",
            CreateSlot::Evening => "evening",
            CreateSlot::Tonight => "tonight",
            CreateSlot::Custom => "custom",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|slot| slot.as_str() == s.trim())
    }

    pub fn label(&self) -> &'static str {
        match self {
            CreateSlot::Morning => "Morning",
            CreateSlot::Afternoon => "Afternoon",
            CreateSlot::Evening => "Evening",
            CreateSlot::Tonight => "Tonight",
            CreateSlot::Custom => "Custom",
        }
    }

    pub fn period(&self) -> Option<Period> {
        match self {
            CreateSlot::Morning => Some(Period::Morning),
            CreateSlot::Afternoon => Some(Period::Afternoon),
            CreateSlot::Evening => Some(Period::Evening),
            CreateSlot::Tonight => Some(Period::Night),
            CreateSlot::Custom => None,
        }
    }
}

impl From<Period> for CreateSlot {
    fn from(period: Period) -> Self {
        match period {
            Period::Morning => CreateSlot::Morning,
            Period::Afternoon => CreateSlot::Afternoon,
            Period::Evening => CreateSlot::Evening,
            Period::Night => CreateSlot::Tonight,
        }
    }
}

/// Who gets to see a new hangout
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    /// Only the friends picked in the form
    Selected,
    #[default]
    AllFriends,
    /// Anyone can find and join
    Public,
}

/// Link into the create form, prefilled
pub fn create_link(title: Option<&str>, time: Option<CreateSlot>) -> String {
    let mut params = Vec::new();
    if let Some(title) = title {
        params.push(format!("title={}", urlencoding::encode(title)));
    }
    if let Some(slot) = time {
        params.push(format!("time={}", slot.as_str()));
    }

    if params.is_empty() {
        "/create".to_string()
    } else {
        format!("/create?{}", params.join("&"))
    }
}

/// Query parameters accepted by the create form
#[derive(Debug, Default, Deserialize)]
pub struct DraftQuery {
    pub title: Option<String>,
    pub time: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VibeOption {
    pub vibe: Vibe,
    pub icon: &'static str,
}

/// Create form state before the user submits it
#[derive(Debug, Serialize)]
pub struct CreateDraft {
    pub title: String,
    pub time: Option<CreateSlot>,
    pub slots: Vec<CreateSlot>,
    pub vibes: Vec<VibeOption>,
    pub max_people: i64,
    pub visibility: Visibility,
    /// Candidates for the "selected friends" step
    pub friends: Vec<PersonChip>,
    pub degraded: Vec<&'static str>,
}

/// Prefill the create form. Unknown `time` values are dropped.
pub async fn draft(db: &Database, session: &Session, query: DraftQuery) -> CreateDraft {
    let mut degraded = Vec::new();
    let friends = or_empty(friends(db, session).await.map_err(anyhow::Error::from), "friends", &mut degraded);

    CreateDraft {
        title: query.title.unwrap_or_default(),
        time: query.time.as_deref().and_then(CreateSlot::from_str),
        slots: CreateSlot::ALL.to_vec(),
        vibes: Vibe::ALL
            .iter()
            .map(|&vibe| VibeOption { vibe, icon: vibe.icon() })
            .collect(),
        max_people: DEFAULT_MAX_PEOPLE,
        visibility: Visibility::default(),
        friends,
        degraded,
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateHangoutRequest {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub vibe: Option<Vibe>,
    #[serde(default)]
    pub time: Option<CreateSlot>,
    /// `YYYY-MM-DDTHH:MM` local time, used with the custom slot
    #[serde(default)]
    pub custom_time: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default = "default_max_people")]
    pub max_people: i64,
    #[serde(default)]
    pub visibility: Visibility,
    /// Friends to invite when visibility is `selected`
    #[serde(default)]
    pub friend_ids: Vec<String>,
}

fn default_max_people() -> i64 {
    DEFAULT_MAX_PEOPLE
}

#[derive(Debug, Serialize)]
pub struct CreatedHangout {
    pub hangout: Hangout,
    pub invited: usize,
    pub redirect: &'static str,
}

/// Start instant for a slot picked at `now`.
///
/// Period slots start at the period's usual hour today, or tomorrow once
/// that hour has passed.
pub fn slot_start(slot: CreateSlot, custom_time: Option<&str>, now: &DateTime<Tz>) -> Result<DateTime<Tz>> {
    let tz = now.timezone();
    match slot.period() {
        Some(period) => {
            let hour = period.display_start_hour();
            let today = at_hour(&tz, now.date_naive(), hour);
            if today > *now {
                Ok(today)
            } else {
                Ok(at_hour(&tz, now.date_naive() + Duration::days(1), hour))
            }
        }
        None => {
            let raw = custom_time
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .ok_or_else(|| PeerpoolError::validation("Pick a date and time"))?;
            let naive = NaiveDateTime::parse_from_str(raw, CUSTOM_TIME_FORMAT)
                .map_err(|_| PeerpoolError::validation(format!("Invalid date and time: {}", raw)))?;
            Ok(local_instant(&tz, naive))
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// Validate and store a new hangout, inviting friends per its visibility
pub async fn create(db: &Database, session: &Session, request: CreateHangoutRequest, now: DateTime<Tz>) -> Result<CreatedHangout> {
    let title = request.title.trim().to_string();
    if title.is_empty() {
        return Err(PeerpoolError::validation("Please add a title"));
    }

    let description = non_empty(request.description);
    if description
        .as_ref()
        .is_some_and(|d| d.chars().count() > MAX_DESCRIPTION_CHARS)
    {
        return Err(PeerpoolError::validation(format!(
            "Description must be at most {} characters",
            MAX_DESCRIPTION_CHARS
        )));
    }

    let start_time = match request.time {
        Some(slot) => Some(slot_start(slot, request.custom_time.as_deref(), &now)?.with_timezone(&Utc)),
        None => None,
    };

    let hangout = db
        .create_hangout(NewHangout {
            title,
            description,
            creator_id: session.user_id().to_string(),
            start_time,
            end_time: None,
            is_public: request.visibility == Visibility::Public,
            location: non_empty(request.location),
            vibe: request.vibe,
            max_people: request.max_people.clamp(MIN_PEOPLE, MAX_PEOPLE),
        })
        .await?;

    let invitees = match request.visibility {
        Visibility::Public => Vec::new(),
        Visibility::AllFriends => db.get_friend_ids(session.user_id()).await?,
        Visibility::Selected => {
            let friend_ids = db.get_friend_ids(session.user_id()).await?;
            request
                .friend_ids
                .into_iter()
                .filter(|id| friend_ids.contains(id))
                .collect()
        }
    };
    let invited = db.invite_users(&hangout.id, &invitees).await?;

    info!(
        hangout = %hangout.id,
        creator = session.user_id(),
        visibility = ?request.visibility,
        invited,
        "hangout created"
    );

    Ok(CreatedHangout {
        hangout,
        invited,
        redirect: "/hangouts",
    })
}
