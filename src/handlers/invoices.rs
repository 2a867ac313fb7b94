// src/handlers/invoices.rs

use axum::{
    Json,
    extract::{Path, Query, State},
    http::{StatusCode, header},
    response::IntoResponse,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::tenancy::TenantContext,
    models::documents::Invoice,
    services::{
        collaborators::RenderPayload,
        document_service::{InvoiceDetail, PaymentReceipt},
    },
};

#[derive(Debug, Deserialize, utoipa::IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct InvoicesQuery {
    /// Texto a buscar en nombre o identificador del cliente.
    pub client: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaymentPayload {
    pub amount: Decimal,
}

// GET /api/invoices
#[utoipa::path(
    get,
    path = "/api/invoices",
    tag = "Invoices",
    params(InvoicesQuery, ("X-Tenant-ID" = Uuid, Header, description = "Empresa")),
    responses((status = 200, description = "Facturas del tenant", body = [Invoice])),
    security(("api_jwt" = []))
)]
pub async fn list_invoices(
    State(state): State<AppState>,
    tenant: TenantContext,
    Query(query): Query<InvoicesQuery>,
) -> Result<impl IntoResponse, AppError> {
    let invoices = state
        .documents
        .list_invoices(tenant.0, query.client.as_deref())
        .await?;
    Ok(Json(invoices))
}

// GET /api/invoices/{id}
#[utoipa::path(
    get,
    path = "/api/invoices/{id}",
    tag = "Invoices",
    responses((status = 200, description = "Detalle con líneas, pagos y balance", body = InvoiceDetail)),
    params(
        ("id" = Uuid, Path, description = "Id de la factura"),
        ("X-Tenant-ID" = Uuid, Header, description = "Empresa")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_invoice(
    State(state): State<AppState>,
    tenant: TenantContext,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let detail = state.documents.invoice_detail(tenant.0, id).await?;
    Ok(Json(detail))
}

// POST /api/invoices/{id}/payments
#[utoipa::path(
    post,
    path = "/api/invoices/{id}/payments",
    tag = "Invoices",
    request_body = PaymentPayload,
    responses(
        (status = 201, description = "Pago registrado", body = PaymentReceipt),
        (status = 422, description = "Monto no positivo")
    ),
    params(
        ("id" = Uuid, Path, description = "Id de la factura"),
        ("X-Tenant-ID" = Uuid, Header, description = "Empresa")
    ),
    security(("api_jwt" = []))
)]
pub async fn register_payment(
    State(state): State<AppState>,
    tenant: TenantContext,
    Path(id): Path<Uuid>,
    Json(payload): Json<PaymentPayload>,
) -> Result<impl IntoResponse, AppError> {
    let receipt = state
        .documents
        .register_payment(tenant.0, id, payload.amount)
        .await?;
    Ok((StatusCode::CREATED, Json(receipt)))
}

// PUT /api/invoices/{id}/paid
#[utoipa::path(
    put,
    path = "/api/invoices/{id}/paid",
    tag = "Invoices",
    responses((status = 200, description = "Factura marcada como pagada", body = Invoice)),
    params(
        ("id" = Uuid, Path, description = "Id de la factura"),
        ("X-Tenant-ID" = Uuid, Header, description = "Empresa")
    ),
    security(("api_jwt" = []))
)]
pub async fn mark_paid(
    State(state): State<AppState>,
    tenant: TenantContext,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let invoice = state.documents.mark_invoice_paid(tenant.0, id).await?;
    Ok(Json(invoice))
}

// GET /api/invoices/{id}/document
#[utoipa::path(
    get,
    path = "/api/invoices/{id}/document",
    tag = "Invoices",
    responses((status = 200, description = "Documento imprimible")),
    params(
        ("id" = Uuid, Path, description = "Id de la factura"),
        ("X-Tenant-ID" = Uuid, Header, description = "Empresa")
    ),
    security(("api_jwt" = []))
)]
pub async fn render_invoice(
    State(state): State<AppState>,
    tenant: TenantContext,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let detail = state.documents.invoice_detail(tenant.0, id).await?;
    let company = state.tenants.get_tenant(&state.pool, tenant.0).await?;
    let client = state
        .catalog
        .get_client(&state.pool, tenant.0, detail.invoice.client_id)
        .await?;

    let payload = RenderPayload {
        title: format!("Factura ({})", detail.invoice.invoice_type),
        company: company.name,
        client: client.name,
        document_number: detail.invoice.id,
        ncf: Some(detail.invoice.ncf.clone()),
        valid_until: None,
        lines: detail.items,
        subtotal: detail.invoice.subtotal,
        itbis: detail.invoice.itbis,
        total: detail.invoice.total,
    };
    let bytes = state.renderer.render(&payload)?;

    Ok((
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        bytes,
    ))
}
