//! Who is acting: ownership policy and host-supplied identity.
//!
//! Authentication itself happens in the hosting platform; this server only
//! ever sees an opaque user id. The guard below is deliberately a pure
//! function with no storage access, so the policy can grow (admin override,
//! delegation) without entangling it with the stores.

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use uuid::Uuid;

use crate::utils::error::AppError;

/// Header through which the host forwards the authenticated user's id.
pub const USER_ID_HEADER: &str = "x-user-id";

/// May `actor_id` delete an event owned by `owner_id`? True iff they match.
pub fn can_delete(actor_id: Uuid, owner_id: Uuid) -> bool {
    actor_id == owner_id
}

/// Actor identity extracted from the request. Opaque to this server beyond
/// being a well-formed UUID.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthenticatedUser(pub Uuid);

#[async_trait]
impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let value = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| AppError::AuthError("missing user identity".to_string()))?;

        let id = value
            .parse::<Uuid>()
            .map_err(|_| AppError::AuthError("malformed user identity".to_string()))?;

        Ok(Self(id))
    }
}
