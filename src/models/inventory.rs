// src/models/inventory.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, ToSchema)]
#[sqlx(type_name = "movement_kind", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum MovementKind {
    Entrada,
    Salida,
    Ajuste,
}

// Una línea del libro de movimientos. `quantity` lleva signo: positivo
// para entradas, negativo para salidas. Las filas jamás se modifican.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InventoryMovement {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub product_id: Uuid,
    pub warehouse_id: Uuid,
    pub quantity: i32,
    pub kind: MovementKind,
    pub reference_type: Option<String>,
    pub reference_id: Option<Uuid>,
    pub executed_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

// Referencia opcional del movimiento al documento u operación que lo
// originó ("pedido", "transferencia", "import"...).
#[derive(Debug, Clone, Copy)]
pub struct MovementRef<'a> {
    pub kind: &'a str,
    pub id: Option<Uuid>,
}

impl<'a> MovementRef<'a> {
    pub fn new(kind: &'a str, id: Uuid) -> Self {
        Self { kind, id: Some(id) }
    }

    pub fn tag(kind: &'a str) -> Self {
        Self { kind, id: None }
    }
}
