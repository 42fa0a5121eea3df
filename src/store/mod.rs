//! Persistence for events and participations.
//!
//! Two narrow traits keep cross-entity knowledge out of the storage layer:
//! `EventStore` never touches participation rows and `ParticipationStore`
//! never touches event rows. The cascade on event deletion is orchestrated
//! one level up, in [`crate::service::EventService`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::models::{Event, EventId, NewEvent, Participation, ParticipationId};

pub mod memory;
pub mod postgres;

pub use memory::{MemoryEventStore, MemoryParticipationStore};
pub use postgres::{PgEventStore, PgParticipationStore};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error")]
    Database(#[from] sqlx::Error),

    #[error("storage backend failure: {0}")]
    Backend(String),
}

/// Outcome of the atomic registration insert.
#[derive(Debug, Error)]
pub enum RegisterError {
    /// The (event_id, user_id) pair already has a row. Reported by the
    /// storage layer so callers can decide; the service absorbs it.
    #[error("participation already recorded for this event and user")]
    Duplicate,

    /// The event row vanished before the insert committed (registration
    /// racing a cascade delete).
    #[error("event no longer exists")]
    EventMissing,

    #[error(transparent)]
    Storage(#[from] StoreError),
}

#[async_trait]
pub trait EventStore: Send + Sync {
    /// Persists a new event owned by `owner_id` and returns its fresh id.
    async fn create(&self, owner_id: Uuid, event: &NewEvent) -> Result<EventId, StoreError>;

    /// Removes the event row. Returns whether a row was actually removed.
    /// Participation rows are not touched here.
    async fn delete(&self, id: EventId) -> Result<bool, StoreError>;

    /// Snapshot of all events, ordered by start date ascending with id
    /// ascending as the tie-breaker.
    async fn list_all(&self) -> Result<Vec<Event>, StoreError>;

    /// Owner of the given event, or `None` if it does not exist.
    async fn owner_of(&self, id: EventId) -> Result<Option<Uuid>, StoreError>;
}

#[async_trait]
pub trait ParticipationStore: Send + Sync {
    /// Atomic conditional insert of a participation row.
    ///
    /// Uniqueness of (event_id, user_id) must be enforced by the storage
    /// engine itself, not by a preliminary existence check, so that of two
    /// concurrent attempts exactly one wins and the other gets
    /// [`RegisterError::Duplicate`].
    async fn register(
        &self,
        event_id: EventId,
        user_id: Uuid,
        at: DateTime<Utc>,
    ) -> Result<ParticipationId, RegisterError>;

    /// Deletes the matching row if present; returns whether anything was
    /// removed. Not an error when no row exists.
    async fn unregister(&self, event_id: EventId, user_id: Uuid) -> Result<bool, StoreError>;

    /// Bulk-removes every participation for an event (cascade path only).
    /// Returns the number of rows removed.
    async fn delete_all_for_event(&self, event_id: EventId) -> Result<u64, StoreError>;

    /// Participations for an event in registration (insertion) order.
    async fn list_for_event(&self, event_id: EventId) -> Result<Vec<Participation>, StoreError>;

    async fn exists(&self, event_id: EventId, user_id: Uuid) -> Result<bool, StoreError>;
}
