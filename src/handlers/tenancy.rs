// src/handlers/tenancy.rs

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde::Deserialize;
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::auth::AuthenticatedUser,
    models::tenancy::Tenant,
};

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateTenantPayload {
    #[validate(length(min = 1, message = "El nombre de la empresa es obligatorio."))]
    pub name: String,

    #[validate(length(min = 1, message = "El RNC es obligatorio."))]
    pub rnc: String,

    pub street: Option<String>,
    pub phone: Option<String>,
}

// POST /api/tenants
#[utoipa::path(
    post,
    path = "/api/tenants",
    tag = "Tenancy",
    request_body = CreateTenantPayload,
    responses((status = 201, description = "Empresa creada", body = Tenant)),
    security(("api_jwt" = []))
)]
pub async fn create_tenant(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(payload): Json<CreateTenantPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    // La empresa y la membresía del creador nacen juntas o no nacen.
    let mut tx = state.pool.begin().await?;
    let tenant = state
        .tenants
        .create_tenant(
            &mut *tx,
            &payload.name,
            &payload.rnc,
            payload.street.as_deref(),
            payload.phone.as_deref(),
        )
        .await?;
    state
        .tenants
        .assign_user_to_tenant(&mut *tx, user.0.id, tenant.id)
        .await?;
    tx.commit().await?;

    tracing::info!(tenant_id = %tenant.id, user_id = %user.0.id, "empresa creada");
    Ok((StatusCode::CREATED, Json(tenant)))
}

// GET /api/tenants
#[utoipa::path(
    get,
    path = "/api/tenants",
    tag = "Tenancy",
    responses((status = 200, description = "Empresas del usuario", body = [Tenant])),
    security(("api_jwt" = []))
)]
pub async fn list_my_tenants(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<impl IntoResponse, AppError> {
    let tenants = state.tenants.list_tenants_for_user(user.0.id).await?;
    Ok(Json(tenants))
}
