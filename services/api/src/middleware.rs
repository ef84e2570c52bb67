//! Authentication middleware for bearer session tokens

use auth::Identity;
use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
};
use tracing::{debug, error};

use crate::{error::ApiError, state::AppState};

/// Resolve the bearer token, if any, and attach the acting identity
///
/// Requests without a live session pass through anonymously; handlers that
/// need an identity take an [`Acting`] argument.
pub async fn resolve_identity(
    State(state): State<AppState>,
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
    mut req: Request,
    next: Next,
) -> Response {
    if let Some(TypedHeader(Authorization(bearer))) = bearer {
        match state.auth.resolve_session(bearer.token()).await {
            Ok(Some(identity)) => {
                req.extensions_mut().insert(identity);
            }
            Ok(None) => debug!("Bearer token does not match a live session"),
            Err(e) => error!("Failed to resolve session: {}", e),
        }
    }

    next.run(req).await
}

/// The acting identity of an authenticated request; 401 without one
#[derive(Debug, Clone)]
pub struct Acting(pub Identity);

#[async_trait]
impl<S> FromRequestParts<S> for Acting
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Identity>()
            .cloned()
            .map(Acting)
            .ok_or(ApiError::Unauthorized)
    }
}
