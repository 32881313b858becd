//! Bearer-token guard for teacher routes.
//!
//! The middleware verifies the token and stores the caller's [`TeacherClaims`]
//! in the request extensions; handlers read them back through [`AuthTeacher`].

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use service_core::error::AppError;

use crate::services::TeacherClaims;
use crate::startup::AppState;

/// Token part of the `Authorization` header: the second space-separated
/// segment. The scheme word itself is not checked.
pub fn extract_token(headers: &HeaderMap) -> Result<&str, AppError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .ok_or_else(|| AppError::unauthorized("No token provided"))?;

    value
        .to_str()
        .ok()
        .and_then(|v| v.split(' ').nth(1))
        .filter(|token| !token.is_empty())
        .ok_or_else(|| AppError::unauthorized("Malformed token"))
}

/// Middleware to require a valid teacher token
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = extract_token(req.headers())?;

    let claims = state.jwt.verify(token).map_err(|e| {
        tracing::debug!(error = %e, "Rejected bearer token");
        AppError::unauthorized("Invalid token")
    })?;

    tracing::Span::current().record("teacher_id", claims.id.as_str());
    req.extensions_mut().insert(claims);

    Ok(next.run(req).await)
}

/// Extractor for the authenticated teacher placed by [`auth_middleware`].
#[derive(Debug, Clone)]
pub struct AuthTeacher(pub TeacherClaims);

impl AuthTeacher {
    pub fn id(&self) -> &str {
        &self.0.id
    }
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for AuthTeacher
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<TeacherClaims>()
            .cloned()
            .map(AuthTeacher)
            .ok_or_else(|| AppError::unauthorized("No token provided"))
    }
}
