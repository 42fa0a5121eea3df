use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Storage-generated, monotonic event identifier (BIGSERIAL).
pub type EventId = i64;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Event {
    pub id: EventId,
    pub owner_id: Uuid,
    pub title: String,
    pub description: String,
    pub location: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

/// Caller-supplied fields for a new event. The id is storage-generated and
/// the owner is the authenticated actor, so neither appears here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewEvent {
    pub title: String,
    pub description: String,
    pub location: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}
