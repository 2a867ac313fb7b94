// src/services/document_service.rs
//
// El pipeline comercial: cotización -> pedido -> factura. Cada conversión
// corre completa dentro de una sola transacción; si cualquier paso falla
// (stock insuficiente, NCF agotado, documento en mal estado) no queda
// ningún efecto a medias.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::PgPool;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{CatalogRepository, DocumentRepository, QuotationFilters},
    models::{
        documents::{
            DocumentLine, Invoice, InvoiceStatus, Order, OrderStatus, Payment, Quotation,
            QuotationStatus, ValidityPeriod,
        },
        inventory::MovementRef,
    },
    services::{
        collaborators::Notifier, fiscal_service::FiscalService,
        inventory_service::InventoryService, totals,
    },
};

/// Datos de entrada para crear o reemplazar una cotización. Las líneas se
/// valoran contra el catálogo vigente del tenant en el momento de guardar.
#[derive(Debug, Clone)]
pub struct QuotationDraft {
    pub client_id: Uuid,
    pub warehouse_id: Uuid,
    pub validity: ValidityPeriod,
    pub seller: Option<String>,
    pub note: Option<String>,
    pub lines: Vec<totals::LineRequest>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QuotationDetail {
    #[serde(flatten)]
    pub quotation: Quotation,
    pub items: Vec<DocumentLine>,
    /// Referencias que no se pudieron valorar al guardar. Vacío en lecturas.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub rejected: Vec<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderDetail {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<DocumentLine>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceDetail {
    #[serde(flatten)]
    pub invoice: Invoice,
    pub items: Vec<DocumentLine>,
    pub payments: Vec<Payment>,
    pub paid: Decimal,
    pub balance: Decimal,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaymentReceipt {
    pub payment: Payment,
    pub paid: Decimal,
    pub balance: Decimal,
}

// El estado `convertida` es terminal; `vencida` (por estado o por fecha)
// nunca se convierte.
fn ensure_convertible(quotation: &Quotation, now: DateTime<Utc>) -> Result<(), AppError> {
    match quotation.status {
        QuotationStatus::Convertida => Err(AppError::Validation(
            "La cotización ya fue convertida en pedido.".to_string(),
        )),
        QuotationStatus::Vencida => Err(AppError::ExpiredDocument),
        QuotationStatus::Vigente if quotation.is_expired(now) => Err(AppError::ExpiredDocument),
        QuotationStatus::Vigente => Ok(()),
    }
}

#[derive(Clone)]
pub struct DocumentService {
    pool: PgPool,
    documents: DocumentRepository,
    catalog: CatalogRepository,
    fiscal: FiscalService,
    inventory: InventoryService,
    notifier: Arc<dyn Notifier>,
}

impl DocumentService {
    pub fn new(
        pool: PgPool,
        documents: DocumentRepository,
        catalog: CatalogRepository,
        fiscal: FiscalService,
        inventory: InventoryService,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            pool,
            documents,
            catalog,
            fiscal,
            inventory,
            notifier,
        }
    }

    // =========================================================================
    //  Cotizaciones
    // =========================================================================

    pub async fn create_quotation(
        &self,
        tenant_id: Uuid,
        draft: QuotationDraft,
    ) -> Result<QuotationDetail, AppError> {
        let mut tx = self.pool.begin().await?;

        let client = self.catalog.get_client(&mut *tx, tenant_id, draft.client_id).await?;
        let warehouse = self
            .catalog
            .get_warehouse(&mut *tx, tenant_id, draft.warehouse_id)
            .await?;

        let priced = self.price_draft_lines(&mut tx, tenant_id, &draft.lines).await?;

        let now = Utc::now();
        let quotation = self
            .documents
            .insert_quotation(
                &mut *tx,
                tenant_id,
                client.id,
                Some(warehouse.id),
                now,
                draft.validity.valid_until(now),
                priced.subtotal,
                priced.itbis,
                priced.total,
                draft.seller.as_deref(),
                draft.note.as_deref(),
            )
            .await?;
        self.documents
            .insert_quotation_items(&mut tx, tenant_id, quotation.id, &priced.lines)
            .await?;

        tx.commit().await?;
        Ok(QuotationDetail {
            quotation,
            items: priced.lines,
            rejected: priced.rejected,
        })
    }

    /// Reemplazo completo de una cotización vigente: cabecera y líneas. La
    /// ventana de validez se recalcula desde la fecha original del documento.
    pub async fn update_quotation(
        &self,
        tenant_id: Uuid,
        quotation_id: Uuid,
        draft: QuotationDraft,
    ) -> Result<QuotationDetail, AppError> {
        let mut tx = self.pool.begin().await?;

        let current = self
            .documents
            .get_quotation_for_update(&mut tx, tenant_id, quotation_id)
            .await?;
        if current.status != QuotationStatus::Vigente {
            return Err(AppError::Validation(
                "Solo se puede editar una cotización vigente.".to_string(),
            ));
        }
        if current.is_expired(Utc::now()) {
            return Err(AppError::ExpiredDocument);
        }

        let client = self.catalog.get_client(&mut *tx, tenant_id, draft.client_id).await?;
        let priced = self.price_draft_lines(&mut tx, tenant_id, &draft.lines).await?;

        let quotation = self
            .documents
            .update_quotation(
                &mut *tx,
                tenant_id,
                quotation_id,
                client.id,
                draft.validity.valid_until(current.date),
                priced.subtotal,
                priced.itbis,
                priced.total,
                draft.seller.as_deref(),
                draft.note.as_deref(),
            )
            .await?;
        self.documents
            .delete_quotation_items(&mut *tx, tenant_id, quotation_id)
            .await?;
        self.documents
            .insert_quotation_items(&mut tx, tenant_id, quotation_id, &priced.lines)
            .await?;

        tx.commit().await?;
        Ok(QuotationDetail {
            quotation,
            items: priced.lines,
            rejected: priced.rejected,
        })
    }

    /// Pasa a `vencida` toda cotización vigente cuyo plazo ya venció.
    /// Los listados y detalles la llaman antes de leer estados.
    pub async fn touch_expired(&self, tenant_id: Uuid) -> Result<u64, AppError> {
        let flipped = self
            .documents
            .touch_expired_quotations(&self.pool, tenant_id, Utc::now())
            .await?;
        if flipped > 0 {
            tracing::info!(%tenant_id, flipped, "cotizaciones marcadas como vencidas");
        }
        Ok(flipped)
    }

    pub async fn list_quotations(
        &self,
        tenant_id: Uuid,
        filters: &QuotationFilters,
    ) -> Result<Vec<Quotation>, AppError> {
        self.touch_expired(tenant_id).await?;
        self.documents.list_quotations(tenant_id, filters).await
    }

    pub async fn quotation_detail(
        &self,
        tenant_id: Uuid,
        quotation_id: Uuid,
    ) -> Result<QuotationDetail, AppError> {
        self.touch_expired(tenant_id).await?;
        let quotation = self
            .documents
            .get_quotation(&self.pool, tenant_id, quotation_id)
            .await?;
        let items = self
            .documents
            .get_quotation_items(&self.pool, tenant_id, quotation_id)
            .await?;
        Ok(QuotationDetail {
            quotation,
            items,
            rejected: Vec::new(),
        })
    }

    // =========================================================================
    //  Cotización -> Pedido
    // =========================================================================

    /// Convierte una cotización vigente en pedido, reservando el stock de
    /// cada línea en el almacén elegido. Todo o nada.
    pub async fn convert_quotation(
        &self,
        tenant_id: Uuid,
        quotation_id: Uuid,
        warehouse_override: Option<Uuid>,
        customer_po: Option<String>,
        actor: Option<Uuid>,
    ) -> Result<OrderDetail, AppError> {
        let mut tx = self.pool.begin().await?;

        let quotation = self
            .documents
            .get_quotation_for_update(&mut tx, tenant_id, quotation_id)
            .await?;
        ensure_convertible(&quotation, Utc::now())?;

        let warehouse_id = warehouse_override
            .or(quotation.warehouse_id)
            .ok_or_else(|| {
                AppError::Validation(
                    "Debe indicar el almacén que despacha el pedido.".to_string(),
                )
            })?;
        let warehouse = self
            .catalog
            .get_warehouse(&mut *tx, tenant_id, warehouse_id)
            .await?;

        let items = self
            .documents
            .get_quotation_items(&mut *tx, tenant_id, quotation_id)
            .await?;
        if items.is_empty() {
            return Err(AppError::Validation(
                "La cotización no tiene líneas.".to_string(),
            ));
        }

        // Las líneas guardan el código del producto; la reserva necesita la
        // fila viva del catálogo.
        let codes: Vec<String> = items.iter().map(|i| i.code.clone()).collect();
        let snapshot = self
            .catalog
            .snapshot_products(&mut *tx, tenant_id, &codes)
            .await?;
        let mut demands = Vec::with_capacity(items.len());
        for item in &items {
            let product = snapshot
                .iter()
                .find(|p| p.code == item.code)
                .cloned()
                .ok_or_else(|| {
                    AppError::Validation(format!(
                        "El producto {} ya no existe en el catálogo.",
                        item.code
                    ))
                })?;
            demands.push((product, item.quantity));
        }

        let order = self
            .documents
            .insert_order(
                &mut *tx,
                tenant_id,
                quotation.client_id,
                Some(quotation.id),
                warehouse.id,
                customer_po.as_deref(),
                quotation.subtotal,
                quotation.itbis,
                quotation.total,
                quotation.seller.as_deref(),
                quotation.note.as_deref(),
            )
            .await?;

        self.inventory
            .bulk_reserve(
                &mut tx,
                &demands,
                &warehouse,
                MovementRef::new("pedido", order.id),
                actor,
            )
            .await?;

        self.documents
            .insert_order_items(&mut tx, tenant_id, order.id, &items)
            .await?;
        self.documents
            .set_quotation_status(
                &mut *tx,
                tenant_id,
                quotation.id,
                QuotationStatus::Convertida,
                Some(warehouse.id),
            )
            .await?;

        tx.commit().await?;

        tracing::info!(%tenant_id, quotation_id = %quotation.id, order_id = %order.id, "cotización convertida en pedido");
        self.notifier
            .notify(
                tenant_id,
                &format!("La cotización {} se convirtió en el pedido {}.", quotation.id, order.id),
            )
            .await;

        Ok(OrderDetail { order, items })
    }

    pub async fn list_orders(
        &self,
        tenant_id: Uuid,
        client: Option<&str>,
    ) -> Result<Vec<Order>, AppError> {
        self.documents.list_orders(tenant_id, client).await
    }

    pub async fn order_detail(
        &self,
        tenant_id: Uuid,
        order_id: Uuid,
    ) -> Result<OrderDetail, AppError> {
        let order = self.documents.get_order(&self.pool, tenant_id, order_id).await?;
        let items = self
            .documents
            .get_order_items(&self.pool, tenant_id, order_id)
            .await?;
        Ok(OrderDetail { order, items })
    }

    // =========================================================================
    //  Pedido -> Factura
    // =========================================================================

    /// Factura un pedido: asigna el NCF según el tipo de cliente, copia las
    /// líneas tal cual y marca el pedido como entregado. El stock no se toca
    /// aquí; se movió al crear el pedido.
    pub async fn invoice_order(
        &self,
        tenant_id: Uuid,
        order_id: Uuid,
        _actor: Option<Uuid>,
    ) -> Result<InvoiceDetail, AppError> {
        let mut tx = self.pool.begin().await?;

        let order = self
            .documents
            .get_order_for_update(&mut tx, tenant_id, order_id)
            .await?;
        if self
            .documents
            .order_has_invoice(&mut *tx, tenant_id, order.id)
            .await?
        {
            return Err(AppError::Validation(
                "El pedido ya fue facturado.".to_string(),
            ));
        }

        let client = self.catalog.get_client(&mut *tx, tenant_id, order.client_id).await?;
        let allocated = self
            .fiscal
            .allocate(&mut tx, tenant_id, client.is_final_consumer)
            .await?;

        let items = self
            .documents
            .get_order_items(&mut *tx, tenant_id, order.id)
            .await?;

        // El UNIQUE de la base es el último respaldo del asignador.
        let invoice = match self
            .documents
            .insert_invoice(
                &mut *tx,
                tenant_id,
                order.client_id,
                order.id,
                Some(order.warehouse_id),
                order.subtotal,
                order.itbis,
                order.total,
                &allocated.ncf,
                allocated.invoice_type,
                order.seller.as_deref(),
                order.note.as_deref(),
            )
            .await
        {
            Ok(invoice) => invoice,
            Err(AppError::Database(sqlx::Error::Database(db_err)))
                if db_err.is_unique_violation() =>
            {
                return Err(AppError::DuplicateFiscalNumber);
            }
            Err(e) => return Err(e),
        };

        self.documents
            .insert_invoice_items(&mut tx, tenant_id, invoice.id, &items)
            .await?;
        self.documents
            .set_order_status(&mut *tx, tenant_id, order.id, OrderStatus::Entregado)
            .await?;

        tx.commit().await?;

        tracing::info!(%tenant_id, order_id = %order.id, invoice_id = %invoice.id, ncf = %invoice.ncf, "pedido facturado");
        self.notifier
            .notify(
                tenant_id,
                &format!("Factura {} emitida para el pedido {}.", invoice.ncf, order.id),
            )
            .await;

        let balance = invoice.total;
        Ok(InvoiceDetail {
            invoice,
            items,
            payments: Vec::new(),
            paid: Decimal::ZERO,
            balance,
        })
    }

    pub async fn list_invoices(
        &self,
        tenant_id: Uuid,
        client: Option<&str>,
    ) -> Result<Vec<Invoice>, AppError> {
        self.documents.list_invoices(tenant_id, client).await
    }

    pub async fn invoice_detail(
        &self,
        tenant_id: Uuid,
        invoice_id: Uuid,
    ) -> Result<InvoiceDetail, AppError> {
        let invoice = self
            .documents
            .get_invoice(&self.pool, tenant_id, invoice_id)
            .await?;
        let items = self
            .documents
            .get_invoice_items(&self.pool, tenant_id, invoice_id)
            .await?;
        let payments = self.documents.list_payments(tenant_id, invoice_id).await?;
        let paid: Decimal = payments.iter().map(|p| p.amount).sum();
        let balance = invoice.total - paid;
        Ok(InvoiceDetail {
            invoice,
            items,
            payments,
            paid,
            balance,
        })
    }

    /// Marca la factura como pagada sin registrar un pago. Es una acción
    /// explícita del usuario, nunca automática.
    pub async fn mark_invoice_paid(
        &self,
        tenant_id: Uuid,
        invoice_id: Uuid,
    ) -> Result<Invoice, AppError> {
        self.documents
            .set_invoice_status(&self.pool, tenant_id, invoice_id, InvoiceStatus::Pagada)
            .await
    }

    /// Registra un abono. Si con el pago la factura queda saldada pasa a
    /// `Pagada`; un pago por encima del total se acepta pero queda avisado.
    pub async fn register_payment(
        &self,
        tenant_id: Uuid,
        invoice_id: Uuid,
        amount: Decimal,
    ) -> Result<PaymentReceipt, AppError> {
        if amount <= Decimal::ZERO {
            return Err(AppError::Validation(
                "El monto del pago debe ser positivo.".to_string(),
            ));
        }

        let mut tx = self.pool.begin().await?;
        let invoice = self
            .documents
            .get_invoice(&mut *tx, tenant_id, invoice_id)
            .await?;

        let payment = self
            .documents
            .insert_payment(&mut *tx, tenant_id, invoice_id, amount)
            .await?;
        let paid = self
            .documents
            .sum_payments(&mut *tx, tenant_id, invoice_id)
            .await?;

        if paid > invoice.total {
            tracing::warn!(%tenant_id, %invoice_id, %paid, total = %invoice.total, "pago por encima del total de la factura");
        }
        if paid >= invoice.total && invoice.status != InvoiceStatus::Pagada {
            self.documents
                .set_invoice_status(&mut *tx, tenant_id, invoice_id, InvoiceStatus::Pagada)
                .await?;
        }

        tx.commit().await?;

        Ok(PaymentReceipt {
            payment,
            paid,
            balance: invoice.total - paid,
        })
    }

    // Valora las líneas del borrador contra el catálogo del tenant dentro
    // de la transacción en curso. Sin líneas aceptadas no hay documento.
    async fn price_draft_lines(
        &self,
        tx: &mut sqlx::PgConnection,
        tenant_id: Uuid,
        lines: &[totals::LineRequest],
    ) -> Result<totals::PricedLines, AppError> {
        let codes: Vec<String> = lines.iter().map(|l| l.product_ref.clone()).collect();
        let catalog = self
            .catalog
            .snapshot_products(&mut *tx, tenant_id, &codes)
            .await?;
        let priced = totals::price_lines(lines, &catalog);
        if priced.lines.is_empty() {
            return Err(AppError::Validation(
                "El documento no tiene líneas válidas.".to_string(),
            ));
        }
        Ok(priced)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn quotation(status: QuotationStatus, valid_until: DateTime<Utc>) -> Quotation {
        Quotation {
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
            status,
        }
    }

    #[test]
    fn vigente_within_window_is_convertible() {
        let now = Utc::now();
        let q = quotation(QuotationStatus::Vigente, now + Duration::days(1));
        assert!(ensure_convertible(&q, now).is_ok());
    }

    #[test]
    fn converted_quotation_is_terminal() {
        let now = Utc::now();
        let q = quotation(QuotationStatus::Convertida, now + Duration::days(1));
        assert!(matches!(
            ensure_convertible(&q, now),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn expired_by_status_or_by_date_is_rejected() {
        let now = Utc::now();

        let flagged = quotation(QuotationStatus::Vencida, now + Duration::days(1));
        assert!(matches!(
            ensure_convertible(&flagged, now),
            Err(AppError::ExpiredDocument)
        ));

        let stale = quotation(QuotationStatus::Vigente, now - Duration::seconds(1));
        assert!(matches!(
            ensure_convertible(&stale, now),
            Err(AppError::ExpiredDocument)
        ));
    }
}
