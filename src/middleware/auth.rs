// src/middleware/auth.rs

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{HeaderMap, StatusCode, header, request::Parts},
    middleware::Next,
    response::Response,
};

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    models::auth::User,
};

/// El usuario resuelto por los guards. Los handlers lo reciben como
/// extractor; solo existe en rutas que pasaron por un guard.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub User);

// Resuelve el token Bearer hasta el usuario vivo. Lo comparten auth_guard
// y tenant_guard.
pub(crate) async fn resolve_user(state: &AppState, headers: &HeaderMap) -> Result<User, AppError> {
    let token = bearer_token(headers).ok_or(AppError::InvalidToken)?;
    let claims = state.auth.decode_token(token)?;
    state
        .auth
        .find_user(claims.sub)
        .await?
        .ok_or(AppError::InvalidToken)
}

pub async fn auth_guard(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let user = resolve_user(&state, request.headers()).await?;
    request.extensions_mut().insert(AuthenticatedUser(user));
    Ok(next.run(request).await)
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .ok_or_else(|| ApiError {
                status: StatusCode::UNAUTHORIZED,
                message: "Token de autenticación inválido o ausente.".to_string(),
            })
    }
}
