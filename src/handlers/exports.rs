// src/handlers/exports.rs
//
// Punto de entrega hacia el worker de exportaciones. El trabajo corre fuera
// del pipeline de documentos; aquí solo se encola y se devuelve el id.

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::tenancy::TenantContext,
    services::collaborators::ExportJobRequest,
};

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExportJobReceipt {
    pub job_id: Uuid,
}

// POST /api/exports
#[utoipa::path(
    post,
    path = "/api/exports",
    tag = "Exports",
    request_body = ExportJobRequest,
    responses((status = 202, description = "Trabajo encolado", body = ExportJobReceipt)),
    params(("X-Tenant-ID" = Uuid, Header, description = "Empresa")),
    security(("api_jwt" = []))
)]
pub async fn submit_export(
    State(state): State<AppState>,
    tenant: TenantContext,
    Json(request): Json<ExportJobRequest>,
) -> Result<impl IntoResponse, AppError> {
    let job_id = state.exports.submit(tenant.0, request).await?;
    Ok((StatusCode::ACCEPTED, Json(ExportJobReceipt { job_id })))
}
