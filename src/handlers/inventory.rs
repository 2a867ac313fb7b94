// src/handlers/inventory.rs

use axum::{
    Json,
    extract::{Query, State},
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::{auth::AuthenticatedUser, tenancy::TenantContext},
    models::{catalog::StockLevel, inventory::InventoryMovement},
    services::inventory_service::ImportRow,
};

#[derive(Debug, Deserialize, utoipa::IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct LevelsQuery {
    pub warehouse_id: Option<Uuid>,
}

#[derive(Debug, Deserialize, utoipa::IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct MovementsQuery {
    pub product_id: Option<Uuid>,
    pub warehouse_id: Option<Uuid>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AdjustPayload {
    pub product_id: Uuid,
    pub warehouse_id: Uuid,
    /// Delta con signo; no puede ser cero.
    pub delta: i32,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SetLevelPayload {
    pub product_id: Uuid,
    pub warehouse_id: Uuid,
    #[validate(range(min = 0, message = "La cantidad no puede ser negativa."))]
    pub quantity: i32,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TransferPayload {
    pub product_id: Uuid,
    pub from_warehouse_id: Uuid,
    pub to_warehouse_id: Uuid,
    #[validate(range(min = 1, message = "La cantidad debe ser positiva."))]
    pub quantity: i32,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ImportPayload {
    #[validate(length(min = 1, message = "La carga no tiene filas."))]
    pub rows: Vec<ImportRow>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MinStockPayload {
    pub product_id: Uuid,
    pub warehouse_id: Uuid,
    #[validate(range(min = 0, message = "El mínimo no puede ser negativo."))]
    pub min_stock: i32,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ImportResult {
    pub applied: usize,
}

// GET /api/inventory/levels
#[utoipa::path(
    get,
    path = "/api/inventory/levels",
    tag = "Inventory",
    params(LevelsQuery, ("X-Tenant-ID" = Uuid, Header, description = "Empresa")),
    responses((status = 200, description = "Saldos por almacén", body = [StockLevel])),
    security(("api_jwt" = []))
)]
pub async fn list_levels(
    State(state): State<AppState>,
    tenant: TenantContext,
    Query(query): Query<LevelsQuery>,
) -> Result<impl IntoResponse, AppError> {
    let levels = state.inventory.stock_levels(tenant.0, query.warehouse_id).await?;
    Ok(Json(levels))
}

// GET /api/inventory/movements
#[utoipa::path(
    get,
    path = "/api/inventory/movements",
    tag = "Inventory",
    params(MovementsQuery, ("X-Tenant-ID" = Uuid, Header, description = "Empresa")),
    responses((status = 200, description = "Libro de movimientos", body = [InventoryMovement])),
    security(("api_jwt" = []))
)]
pub async fn list_movements(
    State(state): State<AppState>,
    tenant: TenantContext,
    Query(query): Query<MovementsQuery>,
) -> Result<impl IntoResponse, AppError> {
    let movements = state
        .inventory
        .movements(tenant.0, query.product_id, query.warehouse_id)
        .await?;
    Ok(Json(movements))
}

// POST /api/inventory/adjust
#[utoipa::path(
    post,
    path = "/api/inventory/adjust",
    tag = "Inventory",
    request_body = AdjustPayload,
    responses(
        (status = 200, description = "Saldo resultante", body = StockLevel),
        (status = 409, description = "El saldo quedaría negativo")
    ),
    params(("X-Tenant-ID" = Uuid, Header, description = "Empresa")),
    security(("api_jwt" = []))
)]
pub async fn adjust(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    tenant: TenantContext,
    Json(payload): Json<AdjustPayload>,
) -> Result<impl IntoResponse, AppError> {
    let level = state
        .inventory
        .adjust(
            tenant.0,
            payload.product_id,
            payload.warehouse_id,
            payload.delta,
            Some(user.0.id),
        )
        .await?;
    Ok(Json(level))
}

// POST /api/inventory/set
#[utoipa::path(
    post,
    path = "/api/inventory/set",
    tag = "Inventory",
    request_body = SetLevelPayload,
    responses((status = 200, description = "Saldo resultante", body = StockLevel)),
    params(("X-Tenant-ID" = Uuid, Header, description = "Empresa")),
    security(("api_jwt" = []))
)]
pub async fn set_level(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    tenant: TenantContext,
    Json(payload): Json<SetLevelPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let level = state
        .inventory
        .set_level(
            tenant.0,
            payload.product_id,
            payload.warehouse_id,
            payload.quantity,
            Some(user.0.id),
        )
        .await?;
    Ok(Json(level))
}

// POST /api/inventory/transfer
#[utoipa::path(
    post,
    path = "/api/inventory/transfer",
    tag = "Inventory",
    request_body = TransferPayload,
    responses(
        (status = 200, description = "Transferencia aplicada"),
        (status = 409, description = "Existencias insuficientes en el origen")
    ),
    params(("X-Tenant-ID" = Uuid, Header, description = "Empresa")),
    security(("api_jwt" = []))
)]
pub async fn transfer(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    tenant: TenantContext,
    Json(payload): Json<TransferPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    state
        .inventory
        .transfer(
            tenant.0,
            payload.product_id,
            payload.from_warehouse_id,
            payload.to_warehouse_id,
            payload.quantity,
            Some(user.0.id),
        )
        .await?;
    Ok(Json(serde_json::json!({ "ok": true })))
}

// POST /api/inventory/import
#[utoipa::path(
    post,
    path = "/api/inventory/import",
    tag = "Inventory",
    request_body = ImportPayload,
    responses(
        (status = 200, description = "Filas aplicadas", body = ImportResult),
        (status = 422, description = "Alguna fila es inválida; no se aplicó ninguna")
    ),
    params(("X-Tenant-ID" = Uuid, Header, description = "Empresa")),
    security(("api_jwt" = []))
)]
pub async fn import_levels(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    tenant: TenantContext,
    Json(payload): Json<ImportPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let applied = state
        .inventory
        .import_levels(tenant.0, &payload.rows, Some(user.0.id))
        .await?;
    Ok(Json(ImportResult { applied }))
}

// PUT /api/inventory/min-stock
#[utoipa::path(
    put,
    path = "/api/inventory/min-stock",
    tag = "Inventory",
    request_body = MinStockPayload,
    responses((status = 200, description = "Mínimo actualizado")),
    params(("X-Tenant-ID" = Uuid, Header, description = "Empresa")),
    security(("api_jwt" = []))
)]
pub async fn set_min_stock(
    State(state): State<AppState>,
    tenant: TenantContext,
    Json(payload): Json<MinStockPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    state
        .inventory
        .set_min_stock(
            tenant.0,
            payload.product_id,
            payload.warehouse_id,
            payload.min_stock,
        )
        .await?;
    Ok(Json(serde_json::json!({ "ok": true })))
}
