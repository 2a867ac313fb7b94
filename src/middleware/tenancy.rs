// src/middleware/tenancy.rs

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{StatusCode, request::Parts},
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::auth::AuthenticatedUser,
};

pub const TENANT_HEADER: &str = "X-Tenant-ID";

/// El tenant sobre el que opera la petición. Solo lo inserta `tenant_guard`
/// después de verificar la membresía del usuario, así que un handler con
/// este extractor nunca ve un tenant ajeno.
#[derive(Debug, Clone, Copy)]
pub struct TenantContext(pub Uuid);

/// Guard completo de las rutas de negocio: valida el token y la membresía
/// del usuario en el tenant del encabezado. Con esta capa puesta no hace
/// falta además auth_guard.
pub async fn tenant_guard(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let user = crate::middleware::auth::resolve_user(&state, request.headers()).await?;

    let tenant_id = request
        .headers()
        .get(TENANT_HEADER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| Uuid::parse_str(value).ok())
        .ok_or_else(|| {
            AppError::Validation(format!("Falta el encabezado {TENANT_HEADER} o no es un UUID."))
        })?;

    // Un tenant al que el usuario no pertenece responde igual que uno que
    // no existe.
    if !state.tenants.check_user_tenancy(user.id, tenant_id).await? {
        return Err(AppError::NotFound);
    }

    request.extensions_mut().insert(AuthenticatedUser(user));
    request.extensions_mut().insert(TenantContext(tenant_id));
    Ok(next.run(request).await)
}

impl<S> FromRequestParts<S> for TenantContext
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<TenantContext>()
            .copied()
            .ok_or_else(|| ApiError {
                status: StatusCode::BAD_REQUEST,
                message: format!("Falta el encabezado {TENANT_HEADER}."),
            })
    }
}
