// src/models/documents.rs

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

// --- Estados ---

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, ToSchema)]
#[sqlx(type_name = "quotation_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum QuotationStatus {
    Vigente,
    Vencida,
    // Terminal: una cotización convertida no vuelve a cambiar de estado.
    Convertida,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, ToSchema)]
#[sqlx(type_name = "order_status")]
pub enum OrderStatus {
    Pendiente,
    Entregado,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, ToSchema)]
#[sqlx(type_name = "invoice_status")]
pub enum InvoiceStatus {
    Pendiente,
    Pagada,
}

// --- Ventana de validez de la cotización ---

// Las opciones que ofrece el formulario original: 15 días, 1, 2 o 3 meses.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default, ToSchema)]
pub enum ValidityPeriod {
    #[serde(rename = "15d")]
    Days15,
    #[default]
    #[serde(rename = "1m")]
    Month1,
    #[serde(rename = "2m")]
    Months2,
    #[serde(rename = "3m")]
    Months3,
}

impl ValidityPeriod {
    pub fn days(self) -> i64 {
        match self {
            ValidityPeriod::Days15 => 15,
            ValidityPeriod::Month1 => 30,
            ValidityPeriod::Months2 => 60,
            ValidityPeriod::Months3 => 90,
        }
    }

    pub fn valid_until(self, from: DateTime<Utc>) -> DateTime<Utc> {
        from + Duration::days(self.days())
    }
}

// --- Línea de documento ---

// Copia inmutable de la línea al momento de crear el documento padre (o su
// cotización de origen, si es una copia). Nunca refleja cambios de precio
// posteriores del catálogo. La misma forma sirve a cotización, pedido y
// factura; `discount` es un monto, no un porcentaje.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DocumentLine {
    pub code: String,
    pub reference: Option<String>,
    pub product_name: String,
    pub unit: String,
    pub unit_price: Decimal,
    pub quantity: i32,
    pub discount: Decimal,
    pub category: Option<String>,
    pub has_itbis: bool,
}

// --- Documentos ---

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Quotation {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub client_id: Uuid,
    pub warehouse_id: Option<Uuid>,
    pub date: DateTime<Utc>,
    pub valid_until: DateTime<Utc>,
    pub subtotal: Decimal,
    pub itbis: Decimal,
    pub total: Decimal,
    pub seller: Option<String>,
    pub note: Option<String>,
    pub status: QuotationStatus,
}

impl Quotation {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.valid_until
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub client_id: Uuid,
    pub quotation_id: Option<Uuid>,
    pub warehouse_id: Uuid,
    pub date: DateTime<Utc>,
    pub status: OrderStatus,
    pub customer_po: Option<String>,
    pub subtotal: Decimal,
    pub itbis: Decimal,
    pub total: Decimal,
    pub seller: Option<String>,
    pub note: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Invoice {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub client_id: Uuid,
    pub order_id: Uuid,
    pub warehouse_id: Option<Uuid>,
    pub date: DateTime<Utc>,
    pub subtotal: Decimal,
    pub itbis: Decimal,
    pub total: Decimal,
    pub ncf: String,
    pub invoice_type: String,
    pub status: InvoiceStatus,
    pub seller: Option<String>,
    pub note: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub invoice_id: Uuid,
    pub amount: Decimal,
    pub date: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn validity_period_days() {
        assert_eq!(ValidityPeriod::Days15.days(), 15);
        assert_eq!(ValidityPeriod::Month1.days(), 30);
        assert_eq!(ValidityPeriod::Months2.days(), 60);
        assert_eq!(ValidityPeriod::Months3.days(), 90);
    }

    #[test]
    fn validity_period_default_is_one_month() {
        assert_eq!(ValidityPeriod::default(), ValidityPeriod::Month1);
    }

    #[test]
    fn validity_period_from_form_keys() {
        let p: ValidityPeriod = serde_json::from_str("\"15d\"").unwrap();
        assert_eq!(p, ValidityPeriod::Days15);
        let p: ValidityPeriod = serde_json::from_str("\"3m\"").unwrap();
        assert_eq!(p, ValidityPeriod::Months3);
    }

    #[test]
    fn quotation_expiry_is_strictly_after_valid_until() {
        let valid_until = Utc.with_ymd_and_hms(2025, 6, 30, 23, 59, 59).unwrap();
        let q = Quotation {
            id: Uuid::new_v4(),
            tenant_id: Uuid::new_v4(),
            client_id: Uuid::new_v4(),
            warehouse_id: None,
            date: valid_until - Duration::days(30),
            valid_until,
            subtotal: Decimal::ZERO,
            itbis: Decimal::ZERO,
            total: Decimal::ZERO,
            seller: None,
            note: None,
            status: QuotationStatus::Vigente,
        };
        assert!(!q.is_expired(valid_until));
        assert!(q.is_expired(valid_until + Duration::seconds(1)));
    }
}
