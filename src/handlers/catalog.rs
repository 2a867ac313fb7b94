// src/handlers/catalog.rs
//
// Endpoints mínimos de catálogo (clientes, productos, almacenes). Existen
// para alimentar el pipeline de documentos; no hay pantallas de gestión.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::tenancy::TenantContext,
    models::catalog::{Client, Product, Warehouse},
};

// ---
// Clientes
// ---

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateClientPayload {
    #[validate(length(min = 1, message = "El nombre es obligatorio."))]
    pub name: String,

    pub last_name: Option<String>,
    /// Cédula o RNC. Si viene, es único dentro del tenant.
    pub identifier: Option<String>,
    pub phone: Option<String>,
    #[validate(email(message = "El e-mail no es válido."))]
    pub email: Option<String>,

    /// true -> facturas B02; false -> contribuyente con B01.
    #[serde(default = "default_true")]
    pub is_final_consumer: bool,
}

fn default_true() -> bool {
    true
}

// POST /api/clients
#[utoipa::path(
    post,
    path = "/api/clients",
    tag = "Catalog",
    request_body = CreateClientPayload,
    responses((status = 201, description = "Cliente creado", body = Client)),
    params(("X-Tenant-ID" = Uuid, Header, description = "Empresa")),
    security(("api_jwt" = []))
)]
pub async fn create_client(
    State(state): State<AppState>,
    tenant: TenantContext,
    Json(payload): Json<CreateClientPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let client = state
        .catalog
        .create_client(
            &state.pool,
            tenant.0,
            &payload.name,
            payload.last_name.as_deref(),
            payload.identifier.as_deref(),
            payload.phone.as_deref(),
            payload.email.as_deref(),
            payload.is_final_consumer,
        )
        .await?;
    Ok((StatusCode::CREATED, Json(client)))
}

// GET /api/clients
#[utoipa::path(
    get,
    path = "/api/clients",
    tag = "Catalog",
    responses((status = 200, description = "Clientes del tenant", body = [Client])),
    params(("X-Tenant-ID" = Uuid, Header, description = "Empresa")),
    security(("api_jwt" = []))
)]
pub async fn list_clients(
    State(state): State<AppState>,
    tenant: TenantContext,
) -> Result<impl IntoResponse, AppError> {
    let clients = state.catalog.list_clients(tenant.0).await?;
    Ok(Json(clients))
}

// GET /api/clients/{id}
#[utoipa::path(
    get,
    path = "/api/clients/{id}",
    tag = "Catalog",
    responses(
        (status = 200, description = "Cliente", body = Client),
        (status = 404, description = "No existe (o es de otro tenant)")
    ),
    params(
        ("id" = Uuid, Path, description = "Id del cliente"),
        ("X-Tenant-ID" = Uuid, Header, description = "Empresa")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_client(
    State(state): State<AppState>,
    tenant: TenantContext,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let client = state.catalog.get_client(&state.pool, tenant.0, id).await?;
    Ok(Json(client))
}

// ---
// Productos
// ---

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductPayload {
    #[validate(length(min = 1, message = "El código es obligatorio."))]
    pub code: String,

    pub reference: Option<String>,

    #[validate(length(min = 1, message = "El nombre es obligatorio."))]
    pub name: String,

    #[validate(length(min = 1, message = "La unidad es obligatoria."))]
    pub unit: String,

    pub price: Decimal,
    pub category: Option<String>,

    #[serde(default = "default_true")]
    pub has_itbis: bool,

    #[serde(default)]
    pub min_stock: i32,
}

impl CreateProductPayload {
    fn validate_consistency(&self) -> Result<(), AppError> {
        if self.price < Decimal::ZERO {
            return Err(AppError::Validation(
                "El precio no puede ser negativo.".to_string(),
            ));
        }
        if self.min_stock < 0 {
            return Err(AppError::Validation(
                "El mínimo de stock no puede ser negativo.".to_string(),
            ));
        }
        Ok(())
    }
}

// POST /api/products
#[utoipa::path(
    post,
    path = "/api/products",
    tag = "Catalog",
    request_body = CreateProductPayload,
    responses((status = 201, description = "Producto creado", body = Product)),
    params(("X-Tenant-ID" = Uuid, Header, description = "Empresa")),
    security(("api_jwt" = []))
)]
pub async fn create_product(
    State(state): State<AppState>,
    tenant: TenantContext,
    Json(payload): Json<CreateProductPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    payload.validate_consistency()?;

    let product = state
        .catalog
        .create_product(
            &state.pool,
            tenant.0,
            &payload.code,
            payload.reference.as_deref(),
            &payload.name,
            &payload.unit,
            payload.price,
            payload.category.as_deref(),
            payload.has_itbis,
            payload.min_stock,
        )
        .await?;
    Ok((StatusCode::CREATED, Json(product)))
}

// GET /api/products
#[utoipa::path(
    get,
    path = "/api/products",
    tag = "Catalog",
    responses((status = 200, description = "Catálogo del tenant", body = [Product])),
    params(("X-Tenant-ID" = Uuid, Header, description = "Empresa")),
    security(("api_jwt" = []))
)]
pub async fn list_products(
    State(state): State<AppState>,
    tenant: TenantContext,
) -> Result<impl IntoResponse, AppError> {
    let products = state.catalog.list_products(tenant.0).await?;
    Ok(Json(products))
}

// GET /api/products/{id}
#[utoipa::path(
    get,
    path = "/api/products/{id}",
    tag = "Catalog",
    responses(
        (status = 200, description = "Producto", body = Product),
        (status = 404, description = "No existe (o es de otro tenant)")
    ),
    params(
        ("id" = Uuid, Path, description = "Id del producto"),
        ("X-Tenant-ID" = Uuid, Header, description = "Empresa")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_product(
    State(state): State<AppState>,
    tenant: TenantContext,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let product = state.catalog.get_product(&state.pool, tenant.0, id).await?;
    Ok(Json(product))
}

// ---
// Almacenes
// ---

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateWarehousePayload {
    #[validate(length(min = 1, message = "El nombre es obligatorio."))]
    pub name: String,

    pub address: Option<String>,
}

// POST /api/warehouses
#[utoipa::path(
    post,
    path = "/api/warehouses",
    tag = "Catalog",
    request_body = CreateWarehousePayload,
    responses((status = 201, description = "Almacén creado", body = Warehouse)),
    params(("X-Tenant-ID" = Uuid, Header, description = "Empresa")),
    security(("api_jwt" = []))
)]
pub async fn create_warehouse(
    State(state): State<AppState>,
    tenant: TenantContext,
    Json(payload): Json<CreateWarehousePayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let warehouse = state
        .catalog
        .create_warehouse(&state.pool, tenant.0, &payload.name, payload.address.as_deref())
        .await?;
    Ok((StatusCode::CREATED, Json(warehouse)))
}

// GET /api/warehouses
#[utoipa::path(
    get,
    path = "/api/warehouses",
    tag = "Catalog",
    responses((status = 200, description = "Almacenes del tenant", body = [Warehouse])),
    params(("X-Tenant-ID" = Uuid, Header, description = "Empresa")),
    security(("api_jwt" = []))
)]
pub async fn list_warehouses(
    State(state): State<AppState>,
    tenant: TenantContext,
) -> Result<impl IntoResponse, AppError> {
    let warehouses = state.catalog.list_warehouses(tenant.0).await?;
    Ok(Json(warehouses))
}
