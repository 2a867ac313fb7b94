// src/handlers/settings.rs
//
// Configuración fiscal del tenant: consulta y ajuste manual de los
// contadores de NCF, con su historial de auditoría.

use axum::{Json, extract::State, response::IntoResponse};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::{auth::AuthenticatedUser, tenancy::TenantContext},
    models::tenancy::{NcfLog, Tenant},
};

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NcfCounters {
    pub ncf_final: i64,
    pub ncf_fiscal: i64,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateNcfPayload {
    #[validate(range(min = 1, message = "El contador debe ser al menos 1."))]
    pub ncf_final: i64,

    #[validate(range(min = 1, message = "El contador debe ser al menos 1."))]
    pub ncf_fiscal: i64,
}

// GET /api/settings/ncf
#[utoipa::path(
    get,
    path = "/api/settings/ncf",
    tag = "Settings",
    responses((status = 200, description = "Contadores actuales", body = NcfCounters)),
    params(("X-Tenant-ID" = Uuid, Header, description = "Empresa")),
    security(("api_jwt" = []))
)]
pub async fn get_ncf_counters(
    State(state): State<AppState>,
    tenant: TenantContext,
) -> Result<impl IntoResponse, AppError> {
    let current = state.tenants.get_tenant(&state.pool, tenant.0).await?;
    Ok(Json(NcfCounters {
        ncf_final: current.ncf_final,
        ncf_fiscal: current.ncf_fiscal,
    }))
}

// PUT /api/settings/ncf
#[utoipa::path(
    put,
    path = "/api/settings/ncf",
    tag = "Settings",
    request_body = UpdateNcfPayload,
    responses(
        (status = 200, description = "Contadores actualizados", body = Tenant),
        (status = 409, description = "Intento de retroceder un contador")
    ),
    params(("X-Tenant-ID" = Uuid, Header, description = "Empresa")),
    security(("api_jwt" = []))
)]
pub async fn update_ncf_counters(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    tenant: TenantContext,
    Json(payload): Json<UpdateNcfPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let updated = state
        .fiscal
        .set_counters(tenant.0, payload.ncf_final, payload.ncf_fiscal, Some(user.0.id))
        .await?;
    Ok(Json(updated))
}

// GET /api/settings/ncf/history
#[utoipa::path(
    get,
    path = "/api/settings/ncf/history",
    tag = "Settings",
    responses((status = 200, description = "Historial de cambios", body = [NcfLog])),
    params(("X-Tenant-ID" = Uuid, Header, description = "Empresa")),
    security(("api_jwt" = []))
)]
pub async fn ncf_history(
    State(state): State<AppState>,
    tenant: TenantContext,
) -> Result<impl IntoResponse, AppError> {
    let logs = state.fiscal.counter_history(tenant.0).await?;
    Ok(Json(logs))
}
