// src/models/catalog.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Client {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub name: String,
    pub last_name: Option<String>,
    pub identifier: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub street: Option<String>,
    pub sector: Option<String>,
    pub province: Option<String>,
    // Decide el tipo de comprobante al facturar: B02 si es consumidor
    // final, B01 si es contribuyente registrado.
    pub is_final_consumer: bool,
    pub created_at: DateTime<Utc>,
}

// Catálogo de productos. `stock` es el contador global (suma de todos los
// almacenes); lo mantiene exclusivamente el libro de inventario.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub code: String,
    pub reference: Option<String>,
    pub name: String,
    pub unit: String,
    pub price: Decimal,
    pub category: Option<String>,
    pub has_itbis: bool,
    pub stock: i32,
    pub min_stock: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Warehouse {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub name: String,
    pub address: Option<String>,
    pub created_at: DateTime<Utc>,
}

// Saldo por (producto, almacén). `min_stock` solo alimenta alertas de
// stock bajo; no participa en ninguna regla del núcleo.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StockLevel {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub product_id: Uuid,
    pub warehouse_id: Uuid,
    pub quantity: i32,
    pub min_stock: i32,
    pub updated_at: DateTime<Utc>,
}
