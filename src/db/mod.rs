//! Database layer for Peerpool

mod models;
mod schema;

pub use models::*;

use anyhow::Result;
use chrono::{DateTime, SubsecRound, Utc};
use rusqlite::{params_from_iter, Row};
use std::sync::Arc;
use tokio_rusqlite::Connection;
use tracing::info;

const HANGOUT_COLUMNS: &str = "id, title, description, creator_id, start_time, end_time,
     status, is_public, location, vibe, max_people, created_at";

const AVAILABILITY_COLUMNS: &str = "id, user_id, start_time, end_time, status, created_at";

/// Database handle for Peerpool
#[derive(Clone, Debug)]
pub struct Database {
    conn: Arc<Connection>,
}

impl Database {
    /// Create a new database connection
    pub async fn new(path: &str) -> Result<Self> {
        let conn = Connection::open(path).await?;
        Ok(Self {
            conn: Arc::new(conn),
        })
    }

    /// Private in-memory database, used by tests and throwaway runs
    pub async fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().await?;
        Ok(Self {
            conn: Arc::new(conn),
        })
    }

    /// Run database migrations
    pub async fn migrate(&self) -> Result<()> {
        self.conn
            .call(|conn| {
                conn.execute_batch(schema::MIGRATIONS)?;
                Ok(())
            })
            .await?;
        info!("Database migrations complete");
        Ok(())
    }

    // ==================== Profiles ====================

    /// Create or update a profile
    pub async fn upsert_profile(&self, profile: Profile) -> Result<()> {
        self.conn
            .call(move |conn| {
                conn.execute(
                    "INSERT INTO profiles (id, email, full_name, avatar_url, created_at)
                     VALUES (?, ?, ?, ?, ?)
                     ON CONFLICT(id) DO UPDATE SET
                        email = excluded.email,
                        full_name = excluded.full_name,
                        avatar_url = excluded.avatar_url",
                    rusqlite::params![
                        profile.id,
                        profile.email,
                        profile.full_name,
                        profile.avatar_url,
                        profile.created_at.timestamp(),
                    ],
                )?;
                Ok(())
            })
            .await?;
        Ok(())
    }

    /// Get a single profile
    pub async fn get_profile(&self, user_id: &str) -> Result<Option<Profile>> {
        let id = user_id.to_string();
        self.conn
            .call(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT id, email, full_name, avatar_url, created_at FROM profiles WHERE id = ?",
                )?;
                let result = stmt.query_row([&id], profile_from_row).optional()?;
                Ok(result)
            })
            .await
            .map_err(Into::into)
    }

    /// Get every profile whose id is in `user_ids`
    pub async fn get_profiles(&self, user_ids: &[String]) -> Result<Vec<Profile>> {
        if user_ids.is_empty() {
            return Ok(Vec::new());
        }
        let ids = user_ids.to_vec();
        self.conn
            .call(move |conn| {
                let sql = format!(
                    "SELECT id, email, full_name, avatar_url, created_at FROM profiles
                     WHERE id IN ({}) ORDER BY full_name, email",
                    placeholders(ids.len())
                );
                let mut stmt = conn.prepare(&sql)?;
                let rows = stmt
                    .query_map(params_from_iter(ids.iter()), profile_from_row)?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(rows)
            })
            .await
            .map_err(Into::into)
    }

    // ==================== Friendships ====================

    /// Record a friendship row from `user_id` to `friend_id`
    pub async fn set_friendship(&self, user_id: &str, friend_id: &str, status: FriendshipStatus) -> Result<()> {
        let user = user_id.to_string();
        let friend = friend_id.to_string();
        let now = Utc::now().timestamp();
        self.conn
            .call(move |conn| {
                conn.execute(
                    "INSERT INTO friendships (user_id, friend_id, status, created_at)
                     VALUES (?, ?, ?, ?)
                     ON CONFLICT(user_id, friend_id) DO UPDATE SET status = excluded.status",
                    rusqlite::params![user, friend, status, now],
                )?;
                Ok(())
            })
            .await?;
        Ok(())
    }

    /// Ids of accepted friends, whichever side created the row
    pub async fn get_friend_ids(&self, user_id: &str) -> Result<Vec<String>> {
        let id = user_id.to_string();
        self.conn
            .call(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT friend_id FROM friendships WHERE user_id = ?1 AND status = 'accepted'
                     UNION
                     SELECT user_id FROM friendships WHERE friend_id = ?1 AND status = 'accepted'",
                )?;
                let rows = stmt
                    .query_map([&id], |row| row.get(0))?
                    .collect::<Result<Vec<String>, _>>()?;
                Ok(rows)
            })
            .await
            .map_err(Into::into)
    }

    // ==================== Availability ====================

    /// Store an availability block
    pub async fn add_availability(&self, mut block: NewAvailabilityBlock) -> Result<AvailabilityBlock> {
        let now = Utc::now().trunc_subsecs(0);
        block.start_time = block.start_time.trunc_subsecs(0);
        block.end_time = block.end_time.trunc_subsecs(0);
        self.conn
            .call(move |conn| {
                let id: String = conn.query_row(
                    "INSERT INTO availability_blocks (user_id, start_time, end_time, status, created_at)
                     VALUES (?, ?, ?, ?, ?) RETURNING id",
                    rusqlite::params![
                        block.user_id,
                        block.start_time.timestamp(),
                        block.end_time.timestamp(),
                        block.status,
                        now.timestamp(),
                    ],
                    |row| row.get(0),
                )?;
                Ok(AvailabilityBlock {
                    id,
                    user_id: block.user_id,
                    start_time: block.start_time,
                    end_time: block.end_time,
                    status: block.status,
                    created_at: now,
                })
            })
            .await
            .map_err(Into::into)
    }

    /// Blocks of `user_ids` overlapping `[start, end]`, earliest first.
    ///
    /// Blocks are half-open, so one ending exactly at `start` is left out.
    pub async fn get_availability(&self, user_ids: &[String], start: i64, end: i64) -> Result<Vec<AvailabilityBlock>> {
        if user_ids.is_empty() {
            return Ok(Vec::new());
        }
        let ids = user_ids.to_vec();
        self.conn
            .call(move |conn| {
                let sql = format!(
                    "SELECT {} FROM availability_blocks
                     WHERE user_id IN ({}) AND start_time <= ? AND end_time > ?
                     ORDER BY start_time, user_id",
                    AVAILABILITY_COLUMNS,
                    placeholders(ids.len())
                );
                let mut params: Vec<rusqlite::types::Value> =
                    ids.into_iter().map(rusqlite::types::Value::from).collect();
                params.push(end.into());
                params.push(start.into());

                let mut stmt = conn.prepare(&sql)?;
                let rows = stmt
                    .query_map(params_from_iter(params.iter()), availability_from_row)?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(rows)
            })
            .await
            .map_err(Into::into)
    }

    // ==================== Hangouts ====================

    /// Store a new hangout in the planning state
    pub async fn create_hangout(&self, mut hangout: NewHangout) -> Result<Hangout> {
        let now = Utc::now().trunc_subsecs(0);
        hangout.start_time = hangout.start_time.map(|t| t.trunc_subsecs(0));
        hangout.end_time = hangout.end_time.map(|t| t.trunc_subsecs(0));
        self.conn
            .call(move |conn| {
                let id: String = conn.query_row(
                    "INSERT INTO hangouts
                     (title, description, creator_id, start_time, end_time, status,
                      is_public, location, vibe, max_people, created_at)
                     VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?) RETURNING id",
                    rusqlite::params![
                        hangout.title,
                        hangout.description,
                        hangout.creator_id,
                        hangout.start_time.map(|t| t.timestamp()),
                        hangout.end_time.map(|t| t.timestamp()),
                        HangoutStatus::Planning,
                        hangout.is_public,
                        hangout.location,
                        hangout.vibe,
                        hangout.max_people,
                        now.timestamp(),
                    ],
                    |row| row.get(0),
                )?;
                Ok(Hangout {
                    id,
                    title: hangout.title,
                    description: hangout.description,
                    creator_id: hangout.creator_id,
                    start_time: hangout.start_time,
                    end_time: hangout.end_time,
                    status: HangoutStatus::Planning,
                    is_public: hangout.is_public,
                    location: hangout.location,
                    vibe: hangout.vibe,
                    max_people: hangout.max_people,
                    created_at: now,
                })
            })
            .await
            .map_err(Into::into)
    }

    /// Get a hangout by id
    pub async fn get_hangout(&self, hangout_id: &str) -> Result<Option<Hangout>> {
        let id = hangout_id.to_string();
        self.conn
            .call(move |conn| {
                let sql = format!("SELECT {} FROM hangouts WHERE id = ?", HANGOUT_COLUMNS);
                let mut stmt = conn.prepare(&sql)?;
                let result = stmt.query_row([&id], hangout_from_row).optional()?;
                Ok(result)
            })
            .await
            .map_err(Into::into)
    }

    /// Move a hangout to a new status
    pub async fn set_hangout_status(&self, hangout_id: &str, status: HangoutStatus) -> Result<()> {
        let id = hangout_id.to_string();
        self.conn
            .call(move |conn| {
                conn.execute(
                    "UPDATE hangouts SET status = ? WHERE id = ?",
                    rusqlite::params![status, id],
                )?;
                Ok(())
            })
            .await?;
        Ok(())
    }

    /// Hangouts the user created or has any participation row in
    pub async fn get_user_hangouts(&self, user_id: &str) -> Result<Vec<Hangout>> {
        let id = user_id.to_string();
        self.conn
            .call(move |conn| {
                let sql = format!(
                    "SELECT {} FROM hangouts
                     WHERE creator_id = ?1
                        OR id IN (SELECT hangout_id FROM hangout_participants WHERE user_id = ?1)
                     ORDER BY start_time IS NULL, start_time, created_at",
                    HANGOUT_COLUMNS
                );
                let mut stmt = conn.prepare(&sql)?;
                let rows = stmt
                    .query_map([&id], hangout_from_row)?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(rows)
            })
            .await
            .map_err(Into::into)
    }

    /// Open public hangouts starting within `[start, end]`
    pub async fn get_public_hangouts(&self, start: i64, end: i64) -> Result<Vec<Hangout>> {
        self.conn
            .call(move |conn| {
                let sql = format!(
                    "SELECT {} FROM hangouts
                     WHERE is_public = 1
                       AND status IN ('planning', 'confirmed')
                       AND start_time BETWEEN ? AND ?
                     ORDER BY start_time, created_at",
                    HANGOUT_COLUMNS
                );
                let mut stmt = conn.prepare(&sql)?;
                let rows = stmt
                    .query_map([start, end], hangout_from_row)?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(rows)
            })
            .await
            .map_err(Into::into)
    }

    // ==================== Participants ====================

    /// Participation rows for every hangout in `hangout_ids`
    pub async fn get_participants(&self, hangout_ids: &[String]) -> Result<Vec<Participant>> {
        if hangout_ids.is_empty() {
            return Ok(Vec::new());
        }
        let ids = hangout_ids.to_vec();
        self.conn
            .call(move |conn| {
                let sql = format!(
                    "SELECT hangout_id, user_id, status, updated_at FROM hangout_participants
                     WHERE hangout_id IN ({}) ORDER BY created_at, user_id",
                    placeholders(ids.len())
                );
                let mut stmt = conn.prepare(&sql)?;
                let rows = stmt
                    .query_map(params_from_iter(ids.iter()), |row| {
                        Ok(Participant {
                            hangout_id: row.get(0)?,
                            user_id: row.get(1)?,
                            status: row.get(2)?,
                            updated_at: timestamp_at(row, 3)?,
                        })
                    })?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(rows)
            })
            .await
            .map_err(Into::into)
    }

    /// Set a user's participation, inserting the row if needed.
    ///
    /// Idempotent: repeating the same call leaves a single row.
    pub async fn set_participation(&self, hangout_id: &str, user_id: &str, status: ParticipantStatus) -> Result<()> {
        let hangout = hangout_id.to_string();
        let user = user_id.to_string();
        let now = Utc::now().timestamp();
        self.conn
            .call(move |conn| {
                conn.execute(
                    "INSERT INTO hangout_participants (hangout_id, user_id, status, created_at, updated_at)
                     VALUES (?1, ?2, ?3, ?4, ?4)
                     ON CONFLICT(hangout_id, user_id) DO UPDATE SET
                        status = excluded.status,
                        updated_at = excluded.updated_at",
                    rusqlite::params![hangout, user, status, now],
                )?;
                Ok(())
            })
            .await?;
        Ok(())
    }

    /// Invite users, leaving existing participation rows untouched.
    /// Returns how many invitations were new.
    pub async fn invite_users(&self, hangout_id: &str, user_ids: &[String]) -> Result<usize> {
        let hangout = hangout_id.to_string();
        let users = user_ids.to_vec();
        let now = Utc::now().timestamp();
        self.conn
            .call(move |conn| {
                let tx = conn.transaction()?;
                let mut inserted = 0;
                {
                    let mut stmt = tx.prepare(
                        "INSERT OR IGNORE INTO hangout_participants
                         (hangout_id, user_id, status, created_at, updated_at)
                         VALUES (?1, ?2, 'invited', ?3, ?3)",
                    )?;
                    for user in &users {
                        inserted += stmt.execute(rusqlite::params![hangout, user, now])?;
                    }
                }
                tx.commit()?;
                Ok(inserted)
            })
            .await
            .map_err(Into::into)
    }
}

fn placeholders(n: usize) -> String {
    vec!["?"; n].join(", ")
}

fn timestamp_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let secs: i64 = row.get(idx)?;
    DateTime::from_timestamp(secs, 0).ok_or(rusqlite::Error::IntegralValueOutOfRange(idx, secs))
}

fn optional_timestamp_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<DateTime<Utc>>> {
    match row.get::<_, Option<i64>>(idx)? {
        Some(_) => timestamp_at(row, idx).map(Some),
        None => Ok(None),
    }
}

fn profile_from_row(row: &Row<'_>) -> rusqlite::Result<Profile> {
    Ok(Profile {
        id: row.get(0)?,
        email: row.get(1)?,
        full_name: row.get(2)?,
        avatar_url: row.get(3)?,
        created_at: timestamp_at(row, 4)?,
    })
}

fn availability_from_row(row: &Row<'_>) -> rusqlite::Result<AvailabilityBlock> {
    Ok(AvailabilityBlock {
        id: row.get(0)?,
        user_id: row.get(1)?,
        start_time: timestamp_at(row, 2)?,
        end_time: timestamp_at(row, 3)?,
        status: row.get(4)?,
        created_at: timestamp_at(row, 5)?,
    })
}

fn hangout_from_row(row: &Row<'_>) -> rusqlite::Result<Hangout> {
    Ok(Hangout {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        creator_id: row.get(3)?,
        start_time: optional_timestamp_at(row, 4)?,
        end_time: optional_timestamp_at(row, 5)?,
        status: row.get(6)?,
        is_public: row.get(7)?,
        location: row.get(8)?,
        vibe: row.get(9)?,
        max_people: row.get(10)?,
        created_at: timestamp_at(row, 11)?,
    })
}

// Maps QueryReturnedNoRows to None for single-row lookups
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>, rusqlite::Error>;
}

impl<T> OptionalExt<T> for Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>, rusqlite::Error> {
        match self {
            Ok(v) => Ok(Some(v)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e),
        }
    }
}
