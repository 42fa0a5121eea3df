//! Concurrent registration behaviour.
//!
//! The stores are cloned handles over shared state, so the service and the
//! assertions below observe the same rows.

use chrono::NaiveDate;
use uuid::Uuid;

use meetpoint_server::models::NewEvent;
use meetpoint_server::service::EventService;
use meetpoint_server::store::{MemoryEventStore, MemoryParticipationStore, ParticipationStore};

fn standup() -> NewEvent {
    NewEvent {
        title: "Standup".to_string(),
        description: "Daily sync".to_string(),
        location: "Room 4".to_string(),
        start_date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
        end_date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn simultaneous_registers_store_exactly_one_row() {
    let events = MemoryEventStore::new();
    let participations = MemoryParticipationStore::new();
    let service = EventService::new(events.clone(), participations.clone());

    let owner = Uuid::new_v4();
    let attendee = Uuid::new_v4();
    let event_id = service
        .create_event(Some(owner), &standup())
        .await
        .unwrap();

    let mut handles = Vec::new();
    for _ in 0..32 {
        let service = service.clone();
        handles.push(tokio::spawn(async move {
            service.register(Some(attendee), event_id).await
        }));
    }

    for handle in handles {
        // Every call reports success, duplicates included.
        handle.await.unwrap().unwrap();
    }

    let rows = participations.list_for_event(event_id).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].user_id, attendee);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_registers_by_distinct_users_all_land() {
    let events = MemoryEventStore::new();
    let participations = MemoryParticipationStore::new();
    let service = EventService::new(events.clone(), participations.clone());

    let owner = Uuid::new_v4();
    let event_id = service
        .create_event(Some(owner), &standup())
        .await
        .unwrap();

    let attendees: Vec<Uuid> = (0..16).map(|_| Uuid::new_v4()).collect();
    let mut handles = Vec::new();
    for attendee in attendees.clone() {
        let service = service.clone();
        handles.push(tokio::spawn(async move {
            service.register(Some(attendee), event_id).await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let rows = participations.list_for_event(event_id).await.unwrap();
    assert_eq!(rows.len(), attendees.len());
}
