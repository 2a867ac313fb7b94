// src/handlers/orders.rs

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::{auth::AuthenticatedUser, tenancy::TenantContext},
    models::documents::Order,
    services::document_service::{InvoiceDetail, OrderDetail},
};

#[derive(Debug, Deserialize, utoipa::IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct OrdersQuery {
    /// Texto a buscar en nombre o identificador del cliente.
    pub client: Option<String>,
}

// GET /api/orders
#[utoipa::path(
    get,
    path = "/api/orders",
    tag = "Orders",
    params(OrdersQuery, ("X-Tenant-ID" = Uuid, Header, description = "Empresa")),
    responses((status = 200, description = "Pedidos del tenant", body = [Order])),
    security(("api_jwt" = []))
)]
pub async fn list_orders(
    State(state): State<AppState>,
    tenant: TenantContext,
    Query(query): Query<OrdersQuery>,
) -> Result<impl IntoResponse, AppError> {
    let orders = state
        .documents
        .list_orders(tenant.0, query.client.as_deref())
        .await?;
    Ok(Json(orders))
}

// GET /api/orders/{id}
#[utoipa::path(
    get,
    path = "/api/orders/{id}",
    tag = "Orders",
    responses((status = 200, description = "Detalle con líneas", body = OrderDetail)),
    params(
        ("id" = Uuid, Path, description = "Id del pedido"),
        ("X-Tenant-ID" = Uuid, Header, description = "Empresa")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_order(
    State(state): State<AppState>,
    tenant: TenantContext,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let detail = state.documents.order_detail(tenant.0, id).await?;
    Ok(Json(detail))
}

// POST /api/orders/{id}/invoice
#[utoipa::path(
    post,
    path = "/api/orders/{id}/invoice",
    tag = "Orders",
    responses(
        (status = 201, description = "Factura emitida con su NCF", body = InvoiceDetail),
        (status = 422, description = "El pedido ya fue facturado")
    ),
    params(
        ("id" = Uuid, Path, description = "Id del pedido"),
        ("X-Tenant-ID" = Uuid, Header, description = "Empresa")
    ),
    security(("api_jwt" = []))
)]
pub async fn invoice_order(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    tenant: TenantContext,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let detail = state
        .documents
        .invoice_order(tenant.0, id, Some(user.0.id))
        .await?;
    Ok((StatusCode::CREATED, Json(detail)))
}
