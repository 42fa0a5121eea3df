use axum::routing::{delete, get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::config::{create_cors_layer, security_headers};
use crate::handlers::{events, health_check};
use crate::service::EventService;
use crate::store::{PgEventStore, PgParticipationStore};

/// Shared handler state: the orchestration service over the Postgres stores.
#[derive(Clone)]
pub struct AppState {
    pub service: EventService<PgEventStore, PgParticipationStore>,
}

pub fn create_routes(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/events", get(events::list_events).post(events::create_event))
        .route("/events/:id", delete(events::delete_event))
        .route(
            "/events/:id/registrations",
            post(events::register).delete(events::unregister),
        )
        .layer(axum::middleware::from_fn(security_headers))
        .layer(create_cors_layer())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
