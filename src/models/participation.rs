use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::models::EventId;

pub type ParticipationId = i64;

/// One actor's registration for one event. At most one row exists per
/// (event_id, user_id) pair; the storage layer enforces this.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Participation {
    pub id: ParticipationId,
    pub event_id: EventId,
    pub user_id: Uuid,
    pub registered_at: DateTime<Utc>,
}
