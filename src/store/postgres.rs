//! PostgreSQL-backed stores.
//!
//! The `unique_click` constraint on `event_clicks` is what makes
//! registration safe under concurrency: the insert either claims the pair
//! or hits the constraint, with no check-then-insert window.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{Event, EventId, NewEvent, Participation, ParticipationId};
use crate::store::{EventStore, ParticipationStore, RegisterError, StoreError};

#[derive(Clone)]
pub struct PgEventStore {
    pool: PgPool,
}

impl PgEventStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EventStore for PgEventStore {
    async fn create(&self, owner_id: Uuid, event: &NewEvent) -> Result<EventId, StoreError> {
        let (id,): (EventId,) = sqlx::query_as(
            r#"
            INSERT INTO events
                (owner_id, event_title, event_description, start_date, end_date, event_location)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id
            "#,
        )
        .bind(owner_id)
        .bind(&event.title)
        .bind(&event.description)
        .bind(event.start_date)
        .bind(event.end_date)
        .bind(&event.location)
        .fetch_one(&self.pool)
        .await?;

        Ok(id)
    }

    async fn delete(&self, id: EventId) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM events WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_all(&self) -> Result<Vec<Event>, StoreError> {
        let events = sqlx::query_as::<_, Event>(
            r#"
            SELECT id, owner_id, event_title AS title, event_description AS description,
                   event_location AS location, start_date, end_date
            FROM events
            ORDER BY start_date ASC, id ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(events)
    }

    async fn owner_of(&self, id: EventId) -> Result<Option<Uuid>, StoreError> {
        let row: Option<(Uuid,)> = sqlx::query_as("SELECT owner_id FROM events WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|(owner,)| owner))
    }
}

#[derive(Clone)]
pub struct PgParticipationStore {
    pool: PgPool,
}

impl PgParticipationStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ParticipationStore for PgParticipationStore {
    async fn register(
        &self,
        event_id: EventId,
        user_id: Uuid,
        at: DateTime<Utc>,
    ) -> Result<ParticipationId, RegisterError> {
        // ON CONFLICT DO NOTHING returns no row when the pair already
        // exists, which is the duplicate signal. A foreign key violation
        // means the event row was deleted out from under us.
        let row: Option<(ParticipationId,)> = sqlx::query_as(
            r#"
            INSERT INTO event_clicks (event_id, user_id, click_time)
            VALUES ($1, $2, $3)
            ON CONFLICT (event_id, user_id) DO NOTHING
            RETURNING id
            "#,
        )
        .bind(event_id)
        .bind(user_id)
        .bind(at)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_foreign_key_violation() => {
                RegisterError::EventMissing
            }
            _ => RegisterError::Storage(e.into()),
        })?;

        row.map(|(id,)| id).ok_or(RegisterError::Duplicate)
    }

    async fn unregister(&self, event_id: EventId, user_id: Uuid) -> Result<bool, StoreError> {
        let result =
            sqlx::query("DELETE FROM event_clicks WHERE event_id = $1 AND user_id = $2")
                .bind(event_id)
                .bind(user_id)
                .execute(&self.pool)
                .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_all_for_event(&self, event_id: EventId) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM event_clicks WHERE event_id = $1")
            .bind(event_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    async fn list_for_event(&self, event_id: EventId) -> Result<Vec<Participation>, StoreError> {
        let rows = sqlx::query_as::<_, Participation>(
            r#"
            SELECT id, event_id, user_id, click_time AS registered_at
            FROM event_clicks
            WHERE event_id = $1
            ORDER BY id ASC
            "#,
        )
        .bind(event_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn exists(&self, event_id: EventId, user_id: Uuid) -> Result<bool, StoreError> {
        let (exists,): (bool,) = sqlx::query_as(
            "SELECT EXISTS(SELECT 1 FROM event_clicks WHERE event_id = $1 AND user_id = $2)",
        )
        .bind(event_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }
}
