//! In-memory stores.
//!
//! Back the service unit tests and double as a development backend. Each
//! store keeps its rows behind one mutex, so the uniqueness check and the
//! insert in `register` happen under a single guard and stay atomic, same
//! as the unique index does for Postgres.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::{Event, EventId, NewEvent, Participation, ParticipationId};
use crate::store::{EventStore, ParticipationStore, RegisterError, StoreError};

#[derive(Debug, Default)]
struct EventRows {
    next_id: EventId,
    rows: Vec<Event>,
}

#[derive(Debug, Clone, Default)]
pub struct MemoryEventStore {
    inner: Arc<Mutex<EventRows>>,
}

impl MemoryEventStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned(which: &str) -> StoreError {
    StoreError::Backend(format!("{which} store mutex poisoned"))
}

#[async_trait]
impl EventStore for MemoryEventStore {
    async fn create(&self, owner_id: Uuid, event: &NewEvent) -> Result<EventId, StoreError> {
        let mut guard = self.inner.lock().map_err(|_| poisoned("event"))?;
        guard.next_id += 1;
        let id = guard.next_id;
        guard.rows.push(Event {
            id,
            owner_id,
            title: event.title.clone(),
            description: event.description.clone(),
            location: event.location.clone(),
            start_date: event.start_date,
            end_date: event.end_date,
        });
        Ok(id)
    }

    async fn delete(&self, id: EventId) -> Result<bool, StoreError> {
        let mut guard = self.inner.lock().map_err(|_| poisoned("event"))?;
        let before = guard.rows.len();
        guard.rows.retain(|e| e.id != id);
        Ok(guard.rows.len() < before)
    }

    async fn list_all(&self) -> Result<Vec<Event>, StoreError> {
        let guard = self.inner.lock().map_err(|_| poisoned("event"))?;
        let mut events = guard.rows.clone();
        events.sort_by_key(|e| (e.start_date, e.id));
        Ok(events)
    }

    async fn owner_of(&self, id: EventId) -> Result<Option<Uuid>, StoreError> {
        let guard = self.inner.lock().map_err(|_| poisoned("event"))?;
        Ok(guard.rows.iter().find(|e| e.id == id).map(|e| e.owner_id))
    }
}

#[derive(Debug, Default)]
struct ParticipationRows {
    next_id: ParticipationId,
    rows: Vec<Participation>,
}

#[derive(Debug, Clone, Default)]
pub struct MemoryParticipationStore {
    inner: Arc<Mutex<ParticipationRows>>,
}

impl MemoryParticipationStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ParticipationStore for MemoryParticipationStore {
    async fn register(
        &self,
        event_id: EventId,
        user_id: Uuid,
        at: DateTime<Utc>,
    ) -> Result<ParticipationId, RegisterError> {
        let mut guard = self
            .inner
            .lock()
            .map_err(|_| RegisterError::Storage(poisoned("participation")))?;
        if guard
            .rows
            .iter()
            .any(|p| p.event_id == event_id && p.user_id == user_id)
        {
            return Err(RegisterError::Duplicate);
        }
        guard.next_id += 1;
        let id = guard.next_id;
        guard.rows.push(Participation {
            id,
            event_id,
            user_id,
            registered_at: at,
        });
        Ok(id)
    }

    async fn unregister(&self, event_id: EventId, user_id: Uuid) -> Result<bool, StoreError> {
        let mut guard = self.inner.lock().map_err(|_| poisoned("participation"))?;
        let before = guard.rows.len();
        guard
            .rows
            .retain(|p| !(p.event_id == event_id && p.user_id == user_id));
        Ok(guard.rows.len() < before)
    }

    async fn delete_all_for_event(&self, event_id: EventId) -> Result<u64, StoreError> {
        let mut guard = self.inner.lock().map_err(|_| poisoned("participation"))?;
        let before = guard.rows.len();
        guard.rows.retain(|p| p.event_id != event_id);
        Ok((before - guard.rows.len()) as u64)
    }

    async fn list_for_event(&self, event_id: EventId) -> Result<Vec<Participation>, StoreError> {
        let guard = self.inner.lock().map_err(|_| poisoned("participation"))?;
        // Vec order is insertion order, which is registration order.
        Ok(guard
            .rows
            .iter()
            .filter(|p| p.event_id == event_id)
            .cloned()
            .collect())
    }

    async fn exists(&self, event_id: EventId, user_id: Uuid) -> Result<bool, StoreError> {
        let guard = self.inner.lock().map_err(|_| poisoned("participation"))?;
        Ok(guard
            .rows
            .iter()
            .any(|p| p.event_id == event_id && p.user_id == user_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn sample_event() -> NewEvent {
        NewEvent {
            title: "Standup".to_string(),
            description: "Daily sync".to_string(),
            location: "Room 4".to_string(),
            start_date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
        }
    }

    #[tokio::test]
    async fn event_ids_are_monotonic() {
        let store = MemoryEventStore::new();
        let owner = Uuid::new_v4();
        let first = store.create(owner, &sample_event()).await.unwrap();
        let second = store.create(owner, &sample_event()).await.unwrap();
        assert!(second > first);
    }

    #[tokio::test]
    async fn register_rejects_second_row_for_same_pair() {
        let store = MemoryParticipationStore::new();
        let user = Uuid::new_v4();

        store.register(1, user, Utc::now()).await.unwrap();
        let second = store.register(1, user, Utc::now()).await;
        assert!(matches!(second, Err(RegisterError::Duplicate)));

        let rows = store.list_for_event(1).await.unwrap();
        assert_eq!(rows.len(), 1);
    }

    #[tokio::test]
    async fn unregister_is_idempotent() {
        let store = MemoryParticipationStore::new();
        let user = Uuid::new_v4();

        store.register(1, user, Utc::now()).await.unwrap();
        assert!(store.unregister(1, user).await.unwrap());
        assert!(!store.unregister(1, user).await.unwrap());
        assert!(!store.exists(1, user).await.unwrap());
    }

    #[tokio::test]
    async fn delete_all_for_event_reports_removed_count() {
        let store = MemoryParticipationStore::new();
        store.register(1, Uuid::new_v4(), Utc::now()).await.unwrap();
        store.register(1, Uuid::new_v4(), Utc::now()).await.unwrap();
        store.register(2, Uuid::new_v4(), Utc::now()).await.unwrap();

        assert_eq!(store.delete_all_for_event(1).await.unwrap(), 2);
        assert!(store.list_for_event(1).await.unwrap().is_empty());
        assert_eq!(store.list_for_event(2).await.unwrap().len(), 1);
    }
}
