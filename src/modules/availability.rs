//! Broadcasting availability

use crate::db::{AvailabilityBlock, AvailabilityStatus, Database, NewAvailabilityBlock};
use crate::error::{PeerpoolError, Result};
use crate::session::Session;
use chrono::{DateTime, SubsecRound, Utc};
use serde::Deserialize;
use tracing::info;

#[derive(Debug, Clone, Deserialize)]
pub struct BroadcastRequest {
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    #[serde(default)]
    pub status: AvailabilityStatus,
}

/// Tell friends when you are free, busy or maybe free.
///
/// Blocks are stored to the second, so the window must still be non-empty
/// after dropping fractions of a second.
pub async fn broadcast(db: &Database, session: &Session, request: BroadcastRequest) -> Result<AvailabilityBlock> {
    let start_time = request.start_time.trunc_subsecs(0);
    let end_time = request.end_time.trunc_subsecs(0);
    if start_time >= end_time {
        return Err(PeerpoolError::validation("Start time must be before end time"));
    }

    let block = db
        .add_availability(NewAvailabilityBlock {
            user_id: session.user_id().to_string(),
            start_time,
            end_time,
            status: request.status,
        })
        .await?;

    info!(user = session.user_id(), status = block.status.as_str(), "availability broadcast");
    Ok(block)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    #[tokio::test]
    async fn test_broadcast() {
        let db = Database::open_in_memory().await.unwrap();
        db.migrate().await.unwrap();
        let me = Session::new("me");
        let start = Utc.with_ymd_and_hms(2024, 1, 17, 18, 0, 0).unwrap();

        let block = broadcast(
            &db,
            &me,
            BroadcastRequest {
                start_time: start,
                end_time: start + Duration::hours(2),
                status: AvailabilityStatus::Maybe,
            },
        )
        .await
        .unwrap();
        assert_eq!(block.user_id, "me");
        assert_eq!(block.status, AvailabilityStatus::Maybe);

        let stored = db
            .get_availability(&["me".to_string()], start.timestamp(), start.timestamp() + 60)
            .await
            .unwrap();
        assert_eq!(stored, vec![block]);
    }

    #[tokio::test]
    async fn test_broadcast_rejects_empty_window() {
        let db = Database::open_in_memory().await.unwrap();
        db.migrate().await.unwrap();
        let start = Utc.with_ymd_and_hms(2024, 1, 17, 18, 0, 0).unwrap();

        // The last one only differs below a second
        let sub_second = (
            start + Duration::milliseconds(100),
            start + Duration::milliseconds(600),
        );
        for (start, end) in [(start, start), (start, start - Duration::minutes(30)), sub_second] {
            let request = BroadcastRequest {
                start_time: start,
                end_time: end,
                status: AvailabilityStatus::Available,
            };
            let err = broadcast(&db, &Session::new("me"), request).await.unwrap_err();
            assert!(matches!(err, PeerpoolError::Validation(_)));
        }
    }
}
