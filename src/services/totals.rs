// src/services/totals.rs
//
// Cálculo de totales de documentos. Es una función pura: recibe las líneas
// pedidas y la foto del catálogo, y devuelve las líneas valoradas junto con
// subtotal, ITBIS y total. No toca la base de datos.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Deserializer, Serialize};
use utoipa::ToSchema;

use crate::models::{catalog::Product, documents::DocumentLine};

pub const ITBIS_RATE: Decimal = dec!(0.18);

/// Línea tal como llega del cliente. Los formularios reales mandan números
/// como texto, así que cantidad y descuento aceptan ambas formas y cualquier
/// valor ilegible se trata como 0.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LineRequest {
    /// Código del producto en el catálogo del tenant.
    pub product_ref: String,
    #[serde(default, deserialize_with = "lenient_i32")]
    #[schema(value_type = i32)]
    pub quantity: i32,
    /// Porcentaje (0 a 100), no un monto.
    #[serde(default, deserialize_with = "lenient_decimal")]
    #[schema(value_type = f64)]
    pub discount_percent: Decimal,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PricedLines {
    pub lines: Vec<DocumentLine>,
    /// Referencias que no se pudieron valorar (código desconocido o
    /// cantidad no positiva). Se devuelven para que el cliente las vea;
    /// el documento se crea sin ellas.
    pub rejected: Vec<String>,
    pub subtotal: Decimal,
    pub itbis: Decimal,
    pub total: Decimal,
}

pub fn price_lines(requests: &[LineRequest], catalog: &[Product]) -> PricedLines {
    let mut lines = Vec::with_capacity(requests.len());
    let mut rejected = Vec::new();
    let mut subtotal = Decimal::ZERO;
    let mut taxable = Decimal::ZERO;

    for request in requests {
        let Some(product) = catalog.iter().find(|p| p.code == request.product_ref) else {
            rejected.push(request.product_ref.clone());
            continue;
        };
        if request.quantity <= 0 {
            rejected.push(request.product_ref.clone());
            continue;
        }

        // El porcentaje se acota a [0, 100].
        let percent = request
            .discount_percent
            .clamp(Decimal::ZERO, dec!(100));

        let gross = product.price * Decimal::from(request.quantity);
        let discount = (gross * percent / dec!(100)).round_dp(2);
        let net = gross - discount;

        subtotal += net;
        if product.has_itbis {
            taxable += net;
        }

        lines.push(DocumentLine {
            code: product.code.clone(),
            reference: product.reference.clone(),
            product_name: product.name.clone(),
            unit: product.unit.clone(),
            unit_price: product.price,
            quantity: request.quantity,
            discount,
            category: product.category.clone(),
            has_itbis: product.has_itbis,
        });
    }

    let subtotal = subtotal.round_dp(2);
    let itbis = (taxable * ITBIS_RATE).round_dp(2);
    let total = subtotal + itbis;

    PricedLines {
        lines,
        rejected,
        subtotal,
        itbis,
        total,
    }
}

fn lenient_i32<'de, D>(deserializer: D) -> Result<i32, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Int(i64),
        Float(f64),
        Text(String),
    }

    Ok(match Option::<Raw>::deserialize(deserializer) {
        Ok(Some(Raw::Int(v))) => i32::try_from(v).unwrap_or(0),
        Ok(Some(Raw::Float(v))) => v.trunc() as i32,
        Ok(Some(Raw::Text(s))) => s.trim().parse().unwrap_or(0),
        Ok(None) | Err(_) => 0,
    })
}

fn lenient_decimal<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(f64),
        Text(String),
    }

    Ok(match Option::<Raw>::deserialize(deserializer) {
        Ok(Some(Raw::Number(v))) => Decimal::try_from(v).unwrap_or(Decimal::ZERO),
        Ok(Some(Raw::Text(s))) => s.trim().parse().unwrap_or(Decimal::ZERO),
        Ok(None) | Err(_) => Decimal::ZERO,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn product(code: &str, price: Decimal, has_itbis: bool) -> Product {
        Product {
            id: Uuid::new_v4(),
            tenant_id: Uuid::new_v4(),
            code: code.to_string(),
            reference: None,
            name: format!("Producto {code}"),
            unit: "unidad".to_string(),
            price,
            category: None,
            has_itbis,
            stock: 0,
            min_stock: 0,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn line(code: &str, quantity: i32, discount_percent: Decimal) -> LineRequest {
        LineRequest {
            product_ref: code.to_string(),
            quantity,
            discount_percent,
        }
    }

    #[test]
    fn two_units_at_100_with_ten_percent_off() {
        let catalog = vec![product("A-1", dec!(100), true)];
        let priced = price_lines(&[line("A-1", 2, dec!(10))], &catalog);

        assert_eq!(priced.lines.len(), 1);
        assert_eq!(priced.lines[0].discount, dec!(20.00));
        assert_eq!(priced.subtotal, dec!(180.00));
        assert_eq!(priced.itbis, dec!(32.40));
        assert_eq!(priced.total, dec!(212.40));
        assert!(priced.rejected.is_empty());
    }

    #[test]
    fn exempt_products_do_not_accrue_itbis() {
        let catalog = vec![
            product("GRAVADO", dec!(100), true),
            product("EXENTO", dec!(50), false),
        ];
        let priced = price_lines(
            &[line("GRAVADO", 1, Decimal::ZERO), line("EXENTO", 2, Decimal::ZERO)],
            &catalog,
        );

        assert_eq!(priced.subtotal, dec!(200.00));
        // Solo los 100 gravados generan impuesto.
        assert_eq!(priced.itbis, dec!(18.00));
        assert_eq!(priced.total, dec!(218.00));
    }

    #[test]
    fn unknown_refs_and_zero_quantities_are_rejected_not_fatal() {
        let catalog = vec![product("A-1", dec!(10), true)];
        let priced = price_lines(
            &[
                line("A-1", 1, Decimal::ZERO),
                line("NO-EXISTE", 5, Decimal::ZERO),
                line("A-1", 0, Decimal::ZERO),
            ],
            &catalog,
        );

        assert_eq!(priced.lines.len(), 1);
        assert_eq!(priced.rejected, vec!["NO-EXISTE", "A-1"]);
        assert_eq!(priced.subtotal, dec!(10.00));
    }

    #[test]
    fn discount_percent_is_clamped() {
        let catalog = vec![product("A-1", dec!(100), false)];

        let over = price_lines(&[line("A-1", 1, dec!(150))], &catalog);
        assert_eq!(over.subtotal, Decimal::ZERO.round_dp(2));

        let negative = price_lines(&[line("A-1", 1, dec!(-10))], &catalog);
        assert_eq!(negative.subtotal, dec!(100.00));
    }

    #[test]
    fn form_strings_are_coerced() {
        let raw = serde_json::json!({
            "productRef": "A-1",
            "quantity": "3",
            "discountPercent": "no-es-numero"
        });
        let request: LineRequest = serde_json::from_value(raw).unwrap();
        assert_eq!(request.quantity, 3);
        assert_eq!(request.discount_percent, Decimal::ZERO);
    }

    #[test]
    fn missing_fields_default_to_zero() {
        let raw = serde_json::json!({ "productRef": "A-1" });
        let request: LineRequest = serde_json::from_value(raw).unwrap();
        assert_eq!(request.quantity, 0);
        assert_eq!(request.discount_percent, Decimal::ZERO);
    }

    #[test]
    fn empty_request_produces_zero_totals() {
        let priced = price_lines(&[], &[]);
        assert!(priced.lines.is_empty());
        assert_eq!(priced.total, Decimal::ZERO.round_dp(2));
    }
}
