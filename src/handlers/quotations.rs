// src/handlers/quotations.rs

use axum::{
    Json,
    extract::{Path, Query, State},
    http::{StatusCode, header},
    response::IntoResponse,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    db::QuotationFilters,
    middleware::{auth::AuthenticatedUser, tenancy::TenantContext},
    models::documents::{Quotation, QuotationStatus, ValidityPeriod},
    services::{
        collaborators::RenderPayload,
        document_service::{OrderDetail, QuotationDetail, QuotationDraft},
        totals::LineRequest,
    },
};

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QuotationPayload {
    pub client_id: Uuid,
    pub warehouse_id: Uuid,

    /// Ventana de validez: "15d", "1m", "2m" o "3m".
    #[serde(default)]
    pub validity: ValidityPeriod,

    pub seller: Option<String>,
    pub note: Option<String>,

    #[validate(length(min = 1, message = "El documento necesita al menos una línea."))]
    pub lines: Vec<LineRequest>,
}

impl QuotationPayload {
    fn into_draft(self) -> QuotationDraft {
        QuotationDraft {
            client_id: self.client_id,
            warehouse_id: self.warehouse_id,
            validity: self.validity,
            seller: self.seller,
            note: self.note,
            lines: self.lines,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ConvertPayload {
    /// Si no viene, se usa el almacén de la cotización.
    #[serde(default)]
    pub warehouse_id: Option<Uuid>,
    #[serde(default)]
    pub customer_po: Option<String>,
}

#[derive(Debug, Deserialize, utoipa::IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct QuotationsQuery {
    /// Texto a buscar en nombre o identificador del cliente.
    pub client: Option<String>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub status: Option<QuotationStatus>,
}

// POST /api/quotations
#[utoipa::path(
    post,
    path = "/api/quotations",
    tag = "Quotations",
    request_body = QuotationPayload,
    responses(
        (status = 201, description = "Cotización creada", body = QuotationDetail),
        (status = 422, description = "Sin líneas válidas o referencias rotas")
    ),
    params(("X-Tenant-ID" = Uuid, Header, description = "Empresa")),
    security(("api_jwt" = []))
)]
pub async fn create_quotation(
    State(state): State<AppState>,
    tenant: TenantContext,
    Json(payload): Json<QuotationPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let detail = state
        .documents
        .create_quotation(tenant.0, payload.into_draft())
        .await?;
    Ok((StatusCode::CREATED, Json(detail)))
}

// GET /api/quotations
#[utoipa::path(
    get,
    path = "/api/quotations",
    tag = "Quotations",
    params(QuotationsQuery, ("X-Tenant-ID" = Uuid, Header, description = "Empresa")),
    responses((status = 200, description = "Cotizaciones (vencimientos ya aplicados)", body = [Quotation])),
    security(("api_jwt" = []))
)]
pub async fn list_quotations(
    State(state): State<AppState>,
    tenant: TenantContext,
    Query(query): Query<QuotationsQuery>,
) -> Result<impl IntoResponse, AppError> {
    let filters = QuotationFilters {
        client: query.client,
        date_from: query.from,
        date_to: query.to,
        status: query.status,
    };
    let quotations = state.documents.list_quotations(tenant.0, &filters).await?;
    Ok(Json(quotations))
}

// GET /api/quotations/{id}
#[utoipa::path(
    get,
    path = "/api/quotations/{id}",
    tag = "Quotations",
    responses((status = 200, description = "Detalle con líneas", body = QuotationDetail)),
    params(
        ("id" = Uuid, Path, description = "Id de la cotización"),
        ("X-Tenant-ID" = Uuid, Header, description = "Empresa")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_quotation(
    State(state): State<AppState>,
    tenant: TenantContext,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let detail = state.documents.quotation_detail(tenant.0, id).await?;
    Ok(Json(detail))
}

// PUT /api/quotations/{id}
#[utoipa::path(
    put,
    path = "/api/quotations/{id}",
    tag = "Quotations",
    request_body = QuotationPayload,
    responses(
        (status = 200, description = "Cotización reemplazada", body = QuotationDetail),
        (status = 422, description = "Solo una cotización vigente se puede editar")
    ),
    params(
        ("id" = Uuid, Path, description = "Id de la cotización"),
        ("X-Tenant-ID" = Uuid, Header, description = "Empresa")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_quotation(
    State(state): State<AppState>,
    tenant: TenantContext,
    Path(id): Path<Uuid>,
    Json(payload): Json<QuotationPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let detail = state
        .documents
        .update_quotation(tenant.0, id, payload.into_draft())
        .await?;
    Ok(Json(detail))
}

// POST /api/quotations/{id}/convert
#[utoipa::path(
    post,
    path = "/api/quotations/{id}/convert",
    tag = "Quotations",
    request_body = ConvertPayload,
    responses(
        (status = 201, description = "Pedido creado con el stock reservado", body = OrderDetail),
        (status = 409, description = "Cotización vencida o stock insuficiente"),
        (status = 422, description = "Ya convertida o sin almacén")
    ),
    params(
        ("id" = Uuid, Path, description = "Id de la cotización"),
        ("X-Tenant-ID" = Uuid, Header, description = "Empresa")
    ),
    security(("api_jwt" = []))
)]
pub async fn convert_quotation(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    tenant: TenantContext,
    Path(id): Path<Uuid>,
    Json(payload): Json<ConvertPayload>,
) -> Result<impl IntoResponse, AppError> {
    let detail = state
        .documents
        .convert_quotation(
            tenant.0,
            id,
            payload.warehouse_id,
            payload.customer_po,
            Some(user.0.id),
        )
        .await?;
    Ok((StatusCode::CREATED, Json(detail)))
}

// GET /api/quotations/{id}/document
#[utoipa::path(
    get,
    path = "/api/quotations/{id}/document",
    tag = "Quotations",
    responses((status = 200, description = "Documento imprimible")),
    params(
        ("id" = Uuid, Path, description = "Id de la cotización"),
        ("X-Tenant-ID" = Uuid, Header, description = "Empresa")
    ),
    security(("api_jwt" = []))
)]
pub async fn render_quotation(
    State(state): State<AppState>,
    tenant: TenantContext,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let detail = state.documents.quotation_detail(tenant.0, id).await?;
    let company = state.tenants.get_tenant(&state.pool, tenant.0).await?;
    let client = state
        .catalog
        .get_client(&state.pool, tenant.0, detail.quotation.client_id)
        .await?;

    let payload = RenderPayload {
        title: "Cotización".to_string(),
        company: company.name,
        client: client.name,
        document_number: detail.quotation.id,
        ncf: None,
        valid_until: Some(detail.quotation.valid_until),
        lines: detail.items,
        subtotal: detail.quotation.subtotal,
        itbis: detail.quotation.itbis,
        total: detail.quotation.total,
    };
    let bytes = state.renderer.render(&payload)?;

    Ok((
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        bytes,
    ))
}
