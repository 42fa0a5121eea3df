//! Orchestration of events and participations.
//!
//! `EventService` is the only surface the presentation layer talks to. It
//! validates input, threads the actor identity explicitly through every
//! operation (no ambient "current user" lookups), consults the ownership
//! guard where it matters, and translates store outcomes into the
//! user-visible error taxonomy.

use chrono::Utc;
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::auth;
use crate::models::{Event, EventId, NewEvent};
use crate::store::{EventStore, ParticipationStore, RegisterError, StoreError};

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("caller is not authenticated")]
    Unauthenticated,

    #[error("event not found")]
    NotFound,

    #[error("actor does not own this event")]
    Forbidden,

    #[error("invalid event fields: {0}")]
    Validation(String),

    #[error(transparent)]
    Storage(#[from] StoreError),
}

/// Read model for one event as seen by a particular viewer. Everything the
/// presentation layer needs is precomputed here; it never re-derives
/// ownership or membership itself.
#[derive(Debug, Clone, Serialize)]
pub struct EventView {
    #[serde(flatten)]
    pub event: Event,
    pub participants: Vec<Uuid>,
    pub viewer_has_registered: bool,
    pub viewer_is_owner: bool,
}

#[derive(Clone)]
pub struct EventService<E, P> {
    events: E,
    participations: P,
}

impl<E, P> EventService<E, P>
where
    E: EventStore,
    P: ParticipationStore,
{
    pub fn new(events: E, participations: P) -> Self {
        Self {
            events,
            participations,
        }
    }

    /// Creates an event owned by the actor. Any authenticated actor may
    /// create; required text fields must be non-blank.
    pub async fn create_event(
        &self,
        actor: Option<Uuid>,
        fields: &NewEvent,
    ) -> Result<EventId, ServiceError> {
        let actor = actor.ok_or(ServiceError::Unauthenticated)?;
        validate_fields(fields)?;

        let id = self.events.create(actor, fields).await?;
        tracing::info!(event_id = id, owner_id = %actor, "event created");
        Ok(id)
    }

    /// Deletes an event and every participation registered for it.
    ///
    /// Participations are wiped before the event row so that a fault in
    /// between leaves a state a retry can finish; the schema's ON DELETE
    /// CASCADE keeps orphans out regardless of interleaving.
    pub async fn delete_event(
        &self,
        actor: Option<Uuid>,
        event_id: EventId,
    ) -> Result<(), ServiceError> {
        let actor = actor.ok_or(ServiceError::Unauthenticated)?;
        let owner = self
            .events
            .owner_of(event_id)
            .await?
            .ok_or(ServiceError::NotFound)?;

        if !auth::can_delete(actor, owner) {
            return Err(ServiceError::Forbidden);
        }

        let removed = self.participations.delete_all_for_event(event_id).await?;
        let deleted = self.events.delete(event_id).await?;
        if !deleted {
            // Lost a race with another delete; the end state holds.
            tracing::warn!(event_id, "event row already gone during cascade delete");
        }

        tracing::info!(event_id, participations_removed = removed, "event deleted");
        Ok(())
    }

    /// Registers the actor for an event. Idempotent: registering twice
    /// reports success both times and leaves exactly one row.
    pub async fn register(
        &self,
        actor: Option<Uuid>,
        event_id: EventId,
    ) -> Result<(), ServiceError> {
        let actor = actor.ok_or(ServiceError::Unauthenticated)?;
        self.events
            .owner_of(event_id)
            .await?
            .ok_or(ServiceError::NotFound)?;

        match self.participations.register(event_id, actor, Utc::now()).await {
            Ok(id) => {
                tracing::info!(event_id, participation_id = id, user_id = %actor, "registered");
                Ok(())
            }
            // The state the caller asked for already holds.
            Err(RegisterError::Duplicate) => Ok(()),
            // The event vanished between the existence check and the insert.
            Err(RegisterError::EventMissing) => Err(ServiceError::NotFound),
            Err(RegisterError::Storage(e)) => Err(e.into()),
        }
    }

    /// Removes the actor's registration. Always succeeds, whether or not a
    /// registration existed.
    pub async fn unregister(
        &self,
        actor: Option<Uuid>,
        event_id: EventId,
    ) -> Result<(), ServiceError> {
        let actor = actor.ok_or(ServiceError::Unauthenticated)?;
        let removed = self.participations.unregister(event_id, actor).await?;
        if removed {
            tracing::info!(event_id, user_id = %actor, "unregistered");
        }
        Ok(())
    }

    /// All events in start-date order, each with its participant list and
    /// the viewer's own registration/ownership flags.
    pub async fn list_events(&self, viewer: Uuid) -> Result<Vec<EventView>, ServiceError> {
        let events = self.events.list_all().await?;
        let mut views = Vec::with_capacity(events.len());

        for event in events {
            let participants: Vec<Uuid> = self
                .participations
                .list_for_event(event.id)
                .await?
                .into_iter()
                .map(|p| p.user_id)
                .collect();
            let viewer_has_registered = participants.contains(&viewer);
            let viewer_is_owner = event.owner_id == viewer;
            views.push(EventView {
                event,
                participants,
                viewer_has_registered,
                viewer_is_owner,
            });
        }

        Ok(views)
    }
}

fn validate_fields(fields: &NewEvent) -> Result<(), ServiceError> {
    if fields.title.trim().is_empty() {
        return Err(ServiceError::Validation("title must not be empty".to_string()));
    }
    if fields.description.trim().is_empty() {
        return Err(ServiceError::Validation(
            "description must not be empty".to_string(),
        ));
    }
    if fields.location.trim().is_empty() {
        return Err(ServiceError::Validation(
            "location must not be empty".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemoryEventStore, MemoryParticipationStore};
    use chrono::NaiveDate;

    fn service() -> EventService<MemoryEventStore, MemoryParticipationStore> {
        EventService::new(MemoryEventStore::new(), MemoryParticipationStore::new())
    }

    fn fields(title: &str, start: (i32, u32, u32)) -> NewEvent {
        NewEvent {
            title: title.to_string(),
            description: "A description".to_string(),
            location: "Somewhere".to_string(),
            start_date: NaiveDate::from_ymd_opt(start.0, start.1, start.2).unwrap(),
            end_date: NaiveDate::from_ymd_opt(start.0, start.1, start.2).unwrap(),
        }
    }

    #[tokio::test]
    async fn create_requires_authentication() {
        let svc = service();
        let result = svc.create_event(None, &fields("Standup", (2024, 3, 1))).await;
        assert!(matches!(result, Err(ServiceError::Unauthenticated)));
    }

    #[tokio::test]
    async fn create_rejects_blank_fields() {
        let svc = service();
        let actor = Some(Uuid::new_v4());

        let result = svc.create_event(actor, &fields("   ", (2024, 3, 1))).await;
        assert!(matches!(result, Err(ServiceError::Validation(_))));

        let mut no_location = fields("Standup", (2024, 3, 1));
        no_location.location = String::new();
        let result = svc.create_event(actor, &no_location).await;
        assert!(matches!(result, Err(ServiceError::Validation(_))));
    }

    #[tokio::test]
    async fn delete_cascades_to_participations() {
        let svc = service();
        let owner = Uuid::new_v4();
        let attendee = Uuid::new_v4();

        let event_id = svc
            .create_event(Some(owner), &fields("Standup", (2024, 3, 1)))
            .await
            .unwrap();
        svc.register(Some(attendee), event_id).await.unwrap();

        svc.delete_event(Some(owner), event_id).await.unwrap();

        assert!(svc
            .list_events(owner)
            .await
            .unwrap()
            .iter()
            .all(|v| v.event.id != event_id));
        let result = svc.register(Some(attendee), event_id).await;
        assert!(matches!(result, Err(ServiceError::NotFound)));
    }

    #[tokio::test]
    async fn only_the_owner_may_delete() {
        let svc = service();
        let owner = Uuid::new_v4();
        let stranger = Uuid::new_v4();

        let event_id = svc
            .create_event(Some(owner), &fields("Standup", (2024, 3, 1)))
            .await
            .unwrap();

        let result = svc.delete_event(Some(stranger), event_id).await;
        assert!(matches!(result, Err(ServiceError::Forbidden)));

        // The event survives the rejected attempt.
        let views = svc.list_events(owner).await.unwrap();
        assert!(views.iter().any(|v| v.event.id == event_id));
    }

    #[tokio::test]
    async fn delete_of_unknown_event_is_not_found() {
        let svc = service();
        let result = svc.delete_event(Some(Uuid::new_v4()), 999).await;
        assert!(matches!(result, Err(ServiceError::NotFound)));
    }

    #[tokio::test]
    async fn register_twice_succeeds_and_keeps_one_row() {
        let svc = service();
        let owner = Uuid::new_v4();
        let attendee = Uuid::new_v4();

        let event_id = svc
            .create_event(Some(owner), &fields("Standup", (2024, 3, 1)))
            .await
            .unwrap();

        svc.register(Some(attendee), event_id).await.unwrap();
        svc.register(Some(attendee), event_id).await.unwrap();

        let views = svc.list_events(attendee).await.unwrap();
        let view = views.iter().find(|v| v.event.id == event_id).unwrap();
        assert_eq!(view.participants, vec![attendee]);
        assert!(view.viewer_has_registered);
    }

    #[tokio::test]
    async fn register_for_unknown_event_is_not_found() {
        let svc = service();
        let result = svc.register(Some(Uuid::new_v4()), 42).await;
        assert!(matches!(result, Err(ServiceError::NotFound)));
    }

    #[tokio::test]
    async fn unregister_twice_succeeds_and_leaves_no_rows() {
        let svc = service();
        let owner = Uuid::new_v4();
        let attendee = Uuid::new_v4();

        let event_id = svc
            .create_event(Some(owner), &fields("Standup", (2024, 3, 1)))
            .await
            .unwrap();
        svc.register(Some(attendee), event_id).await.unwrap();

        svc.unregister(Some(attendee), event_id).await.unwrap();
        svc.unregister(Some(attendee), event_id).await.unwrap();

        let views = svc.list_events(attendee).await.unwrap();
        let view = views.iter().find(|v| v.event.id == event_id).unwrap();
        assert!(view.participants.is_empty());
        assert!(!view.viewer_has_registered);
    }

    #[tokio::test]
    async fn list_orders_events_by_start_date() {
        let svc = service();
        let owner = Uuid::new_v4();

        let jan_10 = svc
            .create_event(Some(owner), &fields("Jan 10", (2024, 1, 10)))
            .await
            .unwrap();
        let jan_05 = svc
            .create_event(Some(owner), &fields("Jan 5", (2024, 1, 5)))
            .await
            .unwrap();
        let feb_01 = svc
            .create_event(Some(owner), &fields("Feb 1", (2024, 2, 1)))
            .await
            .unwrap();

        let views = svc.list_events(owner).await.unwrap();
        let order: Vec<EventId> = views.iter().map(|v| v.event.id).collect();
        assert_eq!(order, vec![jan_05, jan_10, feb_01]);
    }

    #[tokio::test]
    async fn list_breaks_start_date_ties_by_id() {
        let svc = service();
        let owner = Uuid::new_v4();

        let first = svc
            .create_event(Some(owner), &fields("First", (2024, 3, 1)))
            .await
            .unwrap();
        let second = svc
            .create_event(Some(owner), &fields("Second", (2024, 3, 1)))
            .await
            .unwrap();

        let views = svc.list_events(owner).await.unwrap();
        let order: Vec<EventId> = views.iter().map(|v| v.event.id).collect();
        assert_eq!(order, vec![first, second]);
    }

    #[tokio::test]
    async fn standup_scenario() {
        let svc = service();
        let organizer = Uuid::new_v4();
        let visitor = Uuid::new_v4();

        let event_id = svc
            .create_event(Some(organizer), &fields("Standup", (2024, 3, 1)))
            .await
            .unwrap();
        svc.register(Some(visitor), event_id).await.unwrap();
        svc.unregister(Some(visitor), event_id).await.unwrap();

        let organizer_views = svc.list_events(organizer).await.unwrap();
        let view = organizer_views
            .iter()
            .find(|v| v.event.id == event_id)
            .unwrap();
        assert!(view.participants.is_empty());
        assert!(view.viewer_is_owner);

        let visitor_views = svc.list_events(visitor).await.unwrap();
        let view = visitor_views
            .iter()
            .find(|v| v.event.id == event_id)
            .unwrap();
        assert!(!view.viewer_has_registered);
        assert!(!view.viewer_is_owner);
    }
}
