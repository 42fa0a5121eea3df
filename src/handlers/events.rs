//! HTTP handlers for the event/participation operations.
//!
//! Deliberately thin: extract the actor identity, hand everything to
//! [`EventService`](crate::service::EventService), wrap the outcome in the
//! JSON envelope. Redirect-after-submit and rendering are the host
//! frontend's business.

use axum::extract::{Path, State};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::auth::AuthenticatedUser;
use crate::models::{EventId, NewEvent};
use crate::routes::AppState;
use crate::utils::error::AppError;
use crate::utils::response::{created, empty_success, success};

pub async fn create_event(
    State(state): State<AppState>,
    AuthenticatedUser(actor): AuthenticatedUser,
    Json(payload): Json<NewEvent>,
) -> Result<Response, AppError> {
    let id = state.service.create_event(Some(actor), &payload).await?;
    Ok(created(json!({ "id": id }), "Event created").into_response())
}

pub async fn delete_event(
    State(state): State<AppState>,
    AuthenticatedUser(actor): AuthenticatedUser,
    Path(event_id): Path<EventId>,
) -> Result<Response, AppError> {
    state.service.delete_event(Some(actor), event_id).await?;
    Ok(empty_success("Event deleted").into_response())
}

pub async fn register(
    State(state): State<AppState>,
    AuthenticatedUser(actor): AuthenticatedUser,
    Path(event_id): Path<EventId>,
) -> Result<Response, AppError> {
    state.service.register(Some(actor), event_id).await?;
    Ok(empty_success("Registered for event").into_response())
}

pub async fn unregister(
    State(state): State<AppState>,
    AuthenticatedUser(actor): AuthenticatedUser,
    Path(event_id): Path<EventId>,
) -> Result<Response, AppError> {
    state.service.unregister(Some(actor), event_id).await?;
    Ok(empty_success("Unregistered from event").into_response())
}

pub async fn list_events(
    State(state): State<AppState>,
    AuthenticatedUser(viewer): AuthenticatedUser,
) -> Result<Response, AppError> {
    let views = state.service.list_events(viewer).await?;
    Ok(success(views, "Events fetched").into_response())
}
