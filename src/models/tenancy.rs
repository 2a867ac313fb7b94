// src/models/tenancy.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

// La empresa. Es el dueño de todos los demás registros y lleva los dos
// contadores de secuencia fiscal:
//   ncf_final  -> facturas B02 (Consumidor Final)
//   ncf_fiscal -> facturas B01 (Crédito Fiscal)
// Ambos contadores solo avanzan; nunca retroceden.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Tenant {
    pub id: Uuid,
    pub name: String,
    pub rnc: String,
    pub street: Option<String>,
    pub phone: Option<String>,
    pub ncf_final: i64,
    pub ncf_fiscal: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserTenant {
    pub user_id: Uuid,
    pub tenant_id: Uuid,
    pub created_at: DateTime<Utc>,
}

// Registro de auditoría de cada cambio manual aceptado en los contadores.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NcfLog {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub old_final: i64,
    pub old_fiscal: i64,
    pub new_final: i64,
    pub new_fiscal: i64,
    pub changed_by: Option<Uuid>,
    pub changed_at: DateTime<Utc>,
}
