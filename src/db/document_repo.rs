// src/db/document_repo.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::documents::{
        DocumentLine, Invoice, InvoiceStatus, Order, OrderStatus, Payment, Quotation,
        QuotationStatus,
    },
};

// Filtros de listado (texto de cliente, rango de fechas, estado).
#[derive(Debug, Default, Clone)]
pub struct QuotationFilters {
    pub client: Option<String>,
    pub date_from: Option<DateTime<Utc>>,
    pub date_to: Option<DateTime<Utc>>,
    pub status: Option<QuotationStatus>,
}

const LINE_COLUMNS: &str =
    "code, reference, product_name, unit, unit_price, quantity, discount, category, has_itbis";

#[derive(Clone)]
pub struct DocumentRepository {
    pool: PgPool,
}

impl DocumentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // =========================================================================
    //  Cotizaciones
    // =========================================================================

    pub async fn insert_quotation<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        client_id: Uuid,
        warehouse_id: Option<Uuid>,
        date: DateTime<Utc>,
        valid_until: DateTime<Utc>,
        subtotal: Decimal,
        itbis: Decimal,
        total: Decimal,
        seller: Option<&str>,
        note: Option<&str>,
    ) -> Result<Quotation, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let quotation = sqlx::query_as::<_, Quotation>(
            r#"
            INSERT INTO quotations
                (tenant_id, client_id, warehouse_id, date, valid_until, subtotal, itbis, total, seller, note)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(client_id)
        .bind(warehouse_id)
        .bind(date)
        .bind(valid_until)
        .bind(subtotal)
        .bind(itbis)
        .bind(total)
        .bind(seller)
        .bind(note)
        .fetch_one(executor)
        .await?;

        Ok(quotation)
    }

    /// Reemplazo total de cabecera (el servicio borra y reinserta las líneas).
    pub async fn update_quotation<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        quotation_id: Uuid,
        client_id: Uuid,
        valid_until: DateTime<Utc>,
        subtotal: Decimal,
        itbis: Decimal,
        total: Decimal,
        seller: Option<&str>,
        note: Option<&str>,
    ) -> Result<Quotation, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let quotation = sqlx::query_as::<_, Quotation>(
            r#"
            UPDATE quotations
            SET client_id = $3, valid_until = $4, subtotal = $5, itbis = $6,
                total = $7, seller = $8, note = $9
            WHERE tenant_id = $1 AND id = $2
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(quotation_id)
        .bind(client_id)
        .bind(valid_until)
        .bind(subtotal)
        .bind(itbis)
        .bind(total)
        .bind(seller)
        .bind(note)
        .fetch_optional(executor)
        .await?
        .ok_or(AppError::NotFound)?;

        Ok(quotation)
    }

    pub async fn get_quotation<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        quotation_id: Uuid,
    ) -> Result<Quotation, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Quotation>("SELECT * FROM quotations WHERE tenant_id = $1 AND id = $2")
            .bind(tenant_id)
            .bind(quotation_id)
            .fetch_optional(executor)
            .await?
            .ok_or(AppError::NotFound)
    }

    /// Versión bloqueante para la conversión: serializa dos conversiones
    /// concurrentes de la misma cotización.
    pub async fn get_quotation_for_update(
        &self,
        conn: &mut sqlx::PgConnection,
        tenant_id: Uuid,
        quotation_id: Uuid,
    ) -> Result<Quotation, AppError> {
        sqlx::query_as::<_, Quotation>(
            "SELECT * FROM quotations WHERE tenant_id = $1 AND id = $2 FOR UPDATE",
        )
        .bind(tenant_id)
        .bind(quotation_id)
        .fetch_optional(conn)
        .await?
        .ok_or(AppError::NotFound)
    }

    pub async fn list_quotations(
        &self,
        tenant_id: Uuid,
        filters: &QuotationFilters,
    ) -> Result<Vec<Quotation>, AppError> {
        let quotations = sqlx::query_as::<_, Quotation>(
            r#"
            SELECT q.* FROM quotations q
            JOIN clients c ON c.id = q.client_id
            WHERE q.tenant_id = $1
              AND ($2::text IS NULL OR c.name ILIKE '%' || $2 || '%' OR c.identifier ILIKE '%' || $2 || '%')
              AND ($3::timestamptz IS NULL OR q.date >= $3)
              AND ($4::timestamptz IS NULL OR q.date < $4)
              AND ($5::quotation_status IS NULL OR q.status = $5)
            ORDER BY q.date DESC
            "#,
        )
        .bind(tenant_id)
        .bind(filters.client.as_deref())
        .bind(filters.date_from)
        .bind(filters.date_to)
        .bind(filters.status)
        .fetch_all(&self.pool)
        .await?;

        Ok(quotations)
    }

    /// Marca como vencidas las cotizaciones vigentes cuyo plazo ya pasó.
    /// Idempotente: repetirla no vuelve a tocar las filas ya vencidas.
    pub async fn touch_expired_quotations<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query(
            r#"
            UPDATE quotations
            SET status = 'vencida'
            WHERE tenant_id = $1 AND status = 'vigente' AND valid_until < $2
            "#,
        )
        .bind(tenant_id)
        .bind(now)
        .execute(executor)
        .await?;

        Ok(result.rows_affected())
    }

    pub async fn set_quotation_status<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        quotation_id: Uuid,
        status: QuotationStatus,
        warehouse_id: Option<Uuid>,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query(
            r#"
            UPDATE quotations
            SET status = $3, warehouse_id = COALESCE($4, warehouse_id)
            WHERE tenant_id = $1 AND id = $2
            "#,
        )
        .bind(tenant_id)
        .bind(quotation_id)
        .bind(status)
        .bind(warehouse_id)
        .execute(executor)
        .await?;

        Ok(())
    }

    pub async fn insert_quotation_items(
        &self,
        conn: &mut sqlx::PgConnection,
        tenant_id: Uuid,
        quotation_id: Uuid,
        items: &[DocumentLine],
    ) -> Result<(), AppError> {
        for (position, item) in items.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO quotation_items
                    (tenant_id, quotation_id, position, code, reference, product_name, unit, unit_price, quantity, discount, category, has_itbis)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
                "#,
            )
            .bind(tenant_id)
            .bind(quotation_id)
            .bind(position as i32)
            .bind(&item.code)
            .bind(&item.reference)
            .bind(&item.product_name)
            .bind(&item.unit)
            .bind(item.unit_price)
            .bind(item.quantity)
            .bind(item.discount)
            .bind(&item.category)
            .bind(item.has_itbis)
            .execute(&mut *conn)
            .await?;
        }
        Ok(())
    }

    pub async fn delete_quotation_items<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        quotation_id: Uuid,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("DELETE FROM quotation_items WHERE tenant_id = $1 AND quotation_id = $2")
            .bind(tenant_id)
            .bind(quotation_id)
            .execute(executor)
            .await?;
        Ok(())
    }

    pub async fn get_quotation_items<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        quotation_id: Uuid,
    ) -> Result<Vec<DocumentLine>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let items = sqlx::query_as::<_, DocumentLine>(&format!(
            "SELECT {LINE_COLUMNS} FROM quotation_items WHERE tenant_id = $1 AND quotation_id = $2 ORDER BY position"
        ))
        .bind(tenant_id)
        .bind(quotation_id)
        .fetch_all(executor)
        .await?;
        Ok(items)
    }

    // =========================================================================
    //  Pedidos
    // =========================================================================

    pub async fn insert_order<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        client_id: Uuid,
        quotation_id: Option<Uuid>,
        warehouse_id: Uuid,
        customer_po: Option<&str>,
        subtotal: Decimal,
        itbis: Decimal,
        total: Decimal,
        seller: Option<&str>,
        note: Option<&str>,
    ) -> Result<Order, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let order = sqlx::query_as::<_, Order>(
            r#"
            INSERT INTO orders
                (tenant_id, client_id, quotation_id, warehouse_id, customer_po, subtotal, itbis, total, seller, note)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(client_id)
        .bind(quotation_id)
        .bind(warehouse_id)
        .bind(customer_po)
        .bind(subtotal)
        .bind(itbis)
        .bind(total)
        .bind(seller)
        .bind(note)
        .fetch_one(executor)
        .await?;

        Ok(order)
    }

    pub async fn get_order<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        order_id: Uuid,
    ) -> Result<Order, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Order>("SELECT * FROM orders WHERE tenant_id = $1 AND id = $2")
            .bind(tenant_id)
            .bind(order_id)
            .fetch_optional(executor)
            .await?
            .ok_or(AppError::NotFound)
    }

    /// Bloquea el pedido durante la facturación: dos facturaciones
    /// concurrentes del mismo pedido se serializan aquí.
    pub async fn get_order_for_update(
        &self,
        conn: &mut sqlx::PgConnection,
        tenant_id: Uuid,
        order_id: Uuid,
    ) -> Result<Order, AppError> {
        sqlx::query_as::<_, Order>(
            "SELECT * FROM orders WHERE tenant_id = $1 AND id = $2 FOR UPDATE",
        )
        .bind(tenant_id)
        .bind(order_id)
        .fetch_optional(conn)
        .await?
        .ok_or(AppError::NotFound)
    }

    pub async fn list_orders(
        &self,
        tenant_id: Uuid,
        client: Option<&str>,
    ) -> Result<Vec<Order>, AppError> {
        let orders = sqlx::query_as::<_, Order>(
            r#"
            SELECT o.* FROM orders o
            JOIN clients c ON c.id = o.client_id
            WHERE o.tenant_id = $1
              AND ($2::text IS NULL OR c.name ILIKE '%' || $2 || '%' OR c.identifier ILIKE '%' || $2 || '%')
            ORDER BY o.date DESC
            "#,
        )
        .bind(tenant_id)
        .bind(client)
        .fetch_all(&self.pool)
        .await?;

        Ok(orders)
    }

    pub async fn set_order_status<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        order_id: Uuid,
        status: OrderStatus,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("UPDATE orders SET status = $3 WHERE tenant_id = $1 AND id = $2")
            .bind(tenant_id)
            .bind(order_id)
            .bind(status)
            .execute(executor)
            .await?;
        Ok(())
    }

    pub async fn insert_order_items(
        &self,
        conn: &mut sqlx::PgConnection,
        tenant_id: Uuid,
        order_id: Uuid,
        items: &[DocumentLine],
    ) -> Result<(), AppError> {
        for (position, item) in items.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO order_items
                    (tenant_id, order_id, position, code, reference, product_name, unit, unit_price, quantity, discount, category, has_itbis)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
                "#,
            )
            .bind(tenant_id)
            .bind(order_id)
            .bind(position as i32)
            .bind(&item.code)
            .bind(&item.reference)
            .bind(&item.product_name)
            .bind(&item.unit)
            .bind(item.unit_price)
            .bind(item.quantity)
            .bind(item.discount)
            .bind(&item.category)
            .bind(item.has_itbis)
            .execute(&mut *conn)
            .await?;
        }
        Ok(())
    }

    pub async fn get_order_items<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        order_id: Uuid,
    ) -> Result<Vec<DocumentLine>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let items = sqlx::query_as::<_, DocumentLine>(&format!(
            "SELECT {LINE_COLUMNS} FROM order_items WHERE tenant_id = $1 AND order_id = $2 ORDER BY position"
        ))
        .bind(tenant_id)
        .bind(order_id)
        .fetch_all(executor)
        .await?;
        Ok(items)
    }

    // =========================================================================
    //  Facturas
    // =========================================================================

    pub async fn insert_invoice<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        client_id: Uuid,
        order_id: Uuid,
        warehouse_id: Option<Uuid>,
        subtotal: Decimal,
        itbis: Decimal,
        total: Decimal,
        ncf: &str,
        invoice_type: &str,
        seller: Option<&str>,
        note: Option<&str>,
    ) -> Result<Invoice, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let invoice = sqlx::query_as::<_, Invoice>(
            r#"
            INSERT INTO invoices
                (tenant_id, client_id, order_id, warehouse_id, subtotal, itbis, total, ncf, invoice_type, seller, note)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(client_id)
        .bind(order_id)
        .bind(warehouse_id)
        .bind(subtotal)
        .bind(itbis)
        .bind(total)
        .bind(ncf)
        .bind(invoice_type)
        .bind(seller)
        .bind(note)
        .fetch_one(executor)
        .await?;

        Ok(invoice)
    }

    pub async fn get_invoice<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        invoice_id: Uuid,
    ) -> Result<Invoice, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Invoice>("SELECT * FROM invoices WHERE tenant_id = $1 AND id = $2")
            .bind(tenant_id)
            .bind(invoice_id)
            .fetch_optional(executor)
            .await?
            .ok_or(AppError::NotFound)
    }

    pub async fn list_invoices(
        &self,
        tenant_id: Uuid,
        client: Option<&str>,
    ) -> Result<Vec<Invoice>, AppError> {
        let invoices = sqlx::query_as::<_, Invoice>(
            r#"
            SELECT i.* FROM invoices i
            JOIN clients c ON c.id = i.client_id
            WHERE i.tenant_id = $1
              AND ($2::text IS NULL OR c.name ILIKE '%' || $2 || '%' OR c.identifier ILIKE '%' || $2 || '%')
            ORDER BY i.date DESC
            "#,
        )
        .bind(tenant_id)
        .bind(client)
        .fetch_all(&self.pool)
        .await?;

        Ok(invoices)
    }

    pub async fn set_invoice_status<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        invoice_id: Uuid,
        status: InvoiceStatus,
    ) -> Result<Invoice, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let invoice = sqlx::query_as::<_, Invoice>(
            "UPDATE invoices SET status = $3 WHERE tenant_id = $1 AND id = $2 RETURNING *",
        )
        .bind(tenant_id)
        .bind(invoice_id)
        .bind(status)
        .fetch_optional(executor)
        .await?
        .ok_or(AppError::NotFound)?;

        Ok(invoice)
    }

    pub async fn insert_invoice_items(
        &self,
        conn: &mut sqlx::PgConnection,
        tenant_id: Uuid,
        invoice_id: Uuid,
        items: &[DocumentLine],
    ) -> Result<(), AppError> {
        for (position, item) in items.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO invoice_items
                    (tenant_id, invoice_id, position, code, reference, product_name, unit, unit_price, quantity, discount, category, has_itbis)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
                "#,
            )
            .bind(tenant_id)
            .bind(invoice_id)
            .bind(position as i32)
            .bind(&item.code)
            .bind(&item.reference)
            .bind(&item.product_name)
            .bind(&item.unit)
            .bind(item.unit_price)
            .bind(item.quantity)
            .bind(item.discount)
            .bind(&item.category)
            .bind(item.has_itbis)
            .execute(&mut *conn)
            .await?;
        }
        Ok(())
    }

    pub async fn get_invoice_items<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        invoice_id: Uuid,
    ) -> Result<Vec<DocumentLine>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let items = sqlx::query_as::<_, DocumentLine>(&format!(
            "SELECT {LINE_COLUMNS} FROM invoice_items WHERE tenant_id = $1 AND invoice_id = $2 ORDER BY position"
        ))
        .bind(tenant_id)
        .bind(invoice_id)
        .fetch_all(executor)
        .await?;
        Ok(items)
    }

    /// Sin filtro de tenant: el NCF es único en toda la base.
    pub async fn ncf_exists<'e, E>(&self, executor: E, ncf: &str) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let exists: (bool,) =
            sqlx::query_as("SELECT EXISTS (SELECT 1 FROM invoices WHERE ncf = $1)")
                .bind(ncf)
                .fetch_one(executor)
                .await?;
        Ok(exists.0)
    }

    pub async fn order_has_invoice<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        order_id: Uuid,
    ) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let exists: (bool,) = sqlx::query_as(
            "SELECT EXISTS (SELECT 1 FROM invoices WHERE tenant_id = $1 AND order_id = $2)",
        )
        .bind(tenant_id)
        .bind(order_id)
        .fetch_one(executor)
        .await?;
        Ok(exists.0)
    }

    // =========================================================================
    //  Pagos
    // =========================================================================

    pub async fn insert_payment<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        invoice_id: Uuid,
        amount: Decimal,
    ) -> Result<Payment, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let payment = sqlx::query_as::<_, Payment>(
            r#"
            INSERT INTO payments (tenant_id, invoice_id, amount)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(invoice_id)
        .bind(amount)
        .fetch_one(executor)
        .await?;

        Ok(payment)
    }

    pub async fn list_payments(
        &self,
        tenant_id: Uuid,
        invoice_id: Uuid,
    ) -> Result<Vec<Payment>, AppError> {
        let payments = sqlx::query_as::<_, Payment>(
            "SELECT * FROM payments WHERE tenant_id = $1 AND invoice_id = $2 ORDER BY date ASC",
        )
        .bind(tenant_id)
        .bind(invoice_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(payments)
    }

    pub async fn sum_payments<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        invoice_id: Uuid,
    ) -> Result<Decimal, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let total: (Decimal,) = sqlx::query_as(
            "SELECT COALESCE(SUM(amount), 0) FROM payments WHERE tenant_id = $1 AND invoice_id = $2",
        )
        .bind(tenant_id)
        .bind(invoice_id)
        .fetch_one(executor)
        .await?;
        Ok(total.0)
    }
}
