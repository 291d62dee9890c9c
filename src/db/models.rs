//! Database models for Peerpool

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};

/// Text-backed enum stored as its lowercase name
macro_rules! text_enum {
    ($ty:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $ty {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($ty::$variant => $text),+
                }
            }

            pub fn from_str(s: &str) -> Option<Self> {
                match s.to_lowercase().as_str() {
                    $($text => Some($ty::$variant),)+
                    _ => None,
                }
            }
        }

        impl rusqlite::types::ToSql for $ty {
            fn to_sql(&self) -> rusqlite::Result<rusqlite::types::ToSqlOutput<'_>> {
                Ok(self.as_str().into())
            }
        }

        impl rusqlite::types::FromSql for $ty {
            fn column_result(value: rusqlite::types::ValueRef<'_>) -> rusqlite::types::FromSqlResult<Self> {
                let text = value.as_str()?;
                $ty::from_str(text).ok_or_else(|| {
                    rusqlite::types::FromSqlError::Other(
                        format!("unknown {} value: {}", stringify!($ty), text).into(),
                    )
                })
            }
        }
    };
}

/// User profile record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub id: String,
    pub email: String,
    pub full_name: Option<String>,
    pub avatar_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Profile {
    pub fn new(id: impl Into<String>, email: impl Into<String>, full_name: Option<String>) -> Self {
        Self {
            id: id.into(),
            email: email.into(),
            full_name,
            avatar_url: None,
            created_at: Utc::now().trunc_subsecs(0),
        }
    }

    /// Full name if set, otherwise the local part of the email
    pub fn display_name(&self) -> String {
        match self.full_name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => self
                .email
                .split('@')
                .next()
                .unwrap_or(&self.email)
                .to_string(),
        }
    }

    /// Single uppercase letter for avatar chips
    pub fn initial(&self) -> String {
        self.display_name()
            .chars()
            .next()
            .map(|c| c.to_uppercase().collect())
            .unwrap_or_else(|| "?".to_string())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AvailabilityStatus {
    #[default]
    Available,
    Busy,
    Maybe,
}

text_enum!(AvailabilityStatus {
    Available => "available",
    Busy => "busy",
    Maybe => "maybe",
});

/// A window someone has declared themselves available, busy or maybe free
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AvailabilityBlock {
    pub id: String,
    pub user_id: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub status: AvailabilityStatus,
    pub created_at: DateTime<Utc>,
}

/// Insert form of [`AvailabilityBlock`]
#[derive(Debug, Clone)]
pub struct NewAvailabilityBlock {
    pub user_id: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub status: AvailabilityStatus,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HangoutStatus {
    #[default]
    Planning,
    Confirmed,
    Cancelled,
    Completed,
}

text_enum!(HangoutStatus {
    Planning => "planning",
    Confirmed => "confirmed",
    Cancelled => "cancelled",
    Completed => "completed",
});

impl HangoutStatus {
    /// Still happening (not cancelled or completed)
    pub fn is_open(&self) -> bool {
        matches!(self, HangoutStatus::Planning | HangoutStatus::Confirmed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Vibe {
    Chill,
    Active,
    Social,
    Quiet,
    Adventure,
}

text_enum!(Vibe {
    Chill => "chill",
    Active => "active",
    Social => "social",
    Quiet => "quiet",
    Adventure => "adventure",
});

impl Vibe {
    pub const ALL: [Vibe; 5] = [Vibe::Chill, Vibe::Active, Vibe::Social, Vibe::Quiet, Vibe::Adventure];

    pub fn icon(&self) -> &'static str {
        match self {
            Vibe::Chill => "😌",
            Vibe::Active => "🏃",
            Vibe::Social => "🎉",
            Vibe::Quiet => "📚",
            Vibe::Adventure => "🗺️",
        }
    }
}

/// Hangout record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hangout {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub creator_id: String,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub status: HangoutStatus,
    pub is_public: bool,
    pub location: Option<String>,
    pub vibe: Option<Vibe>,
    pub max_people: i64,
    pub created_at: DateTime<Utc>,
}

/// Insert form of [`Hangout`]
#[derive(Debug, Clone)]
pub struct NewHangout {
    pub title: String,
    pub description: Option<String>,
    pub creator_id: String,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub is_public: bool,
    pub location: Option<String>,
    pub vibe: Option<Vibe>,
    pub max_people: i64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParticipantStatus {
    #[default]
    Invited,
    Accepted,
    Declined,
    Maybe,
}

text_enum!(ParticipantStatus {
    Invited => "invited",
    Accepted => "accepted",
    Declined => "declined",
    Maybe => "maybe",
});

impl ParticipantStatus {
    /// Counts towards the people going
    pub fn is_attending(&self) -> bool {
        matches!(self, ParticipantStatus::Accepted | ParticipantStatus::Maybe)
    }
}

/// A user's participation in a hangout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Participant {
    pub hangout_id: String,
    pub user_id: String,
    pub status: ParticipantStatus,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FriendshipStatus {
    #[default]
    Pending,
    Accepted,
    Blocked,
}

text_enum!(FriendshipStatus {
    Pending => "pending",
    Accepted => "accepted",
    Blocked => "blocked",
});
