// src/db/inventory_repo.rs

use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::{
        catalog::StockLevel,
        inventory::{InventoryMovement, MovementKind, MovementRef},
    },
};

#[derive(Clone)]
pub struct InventoryRepository {
    pool: PgPool,
}

impl InventoryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Garantiza que exista la fila de saldo y la devuelve bloqueada
    /// (FOR UPDATE) dentro de la transacción actual. Es el punto de
    /// serialización por (tenant, producto, almacén).
    pub async fn lock_level(
        &self,
        conn: &mut sqlx::PgConnection,
        tenant_id: Uuid,
        product_id: Uuid,
        warehouse_id: Uuid,
    ) -> Result<StockLevel, AppError> {
        // Si no existe, se crea con cantidad 0. ON CONFLICT hace el upsert
        // atómico; el DO UPDATE trivial permite RETURNING en ambos casos.
        sqlx::query(
            r#"
            INSERT INTO stock_levels (tenant_id, product_id, warehouse_id, quantity)
            VALUES ($1, $2, $3, 0)
            ON CONFLICT (tenant_id, product_id, warehouse_id) DO NOTHING
            "#,
        )
        .bind(tenant_id)
        .bind(product_id)
        .bind(warehouse_id)
        .execute(&mut *conn)
        .await?;

        let level = sqlx::query_as::<_, StockLevel>(
            r#"
            SELECT * FROM stock_levels
            WHERE tenant_id = $1 AND product_id = $2 AND warehouse_id = $3
            FOR UPDATE
            "#,
        )
        .bind(tenant_id)
        .bind(product_id)
        .bind(warehouse_id)
        .fetch_one(&mut *conn)
        .await?;

        Ok(level)
    }

    pub async fn apply_level_delta<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        product_id: Uuid,
        warehouse_id: Uuid,
        delta: i32,
    ) -> Result<StockLevel, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let level = sqlx::query_as::<_, StockLevel>(
            r#"
            UPDATE stock_levels
            SET quantity = quantity + $4, updated_at = now()
            WHERE tenant_id = $1 AND product_id = $2 AND warehouse_id = $3
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(product_id)
        .bind(warehouse_id)
        .bind(delta)
        .fetch_one(executor)
        .await?;

        Ok(level)
    }

    /// Aplica el mismo delta al contador global del producto.
    pub async fn apply_product_delta<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        product_id: Uuid,
        delta: i32,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query(
            r#"
            UPDATE products
            SET stock = stock + $3, updated_at = now()
            WHERE tenant_id = $1 AND id = $2
            "#,
        )
        .bind(tenant_id)
        .bind(product_id)
        .bind(delta)
        .execute(executor)
        .await?;

        Ok(())
    }

    pub async fn set_min_stock<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        product_id: Uuid,
        warehouse_id: Uuid,
        min_stock: i32,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query(
            r#"
            UPDATE stock_levels
            SET min_stock = $4, updated_at = now()
            WHERE tenant_id = $1 AND product_id = $2 AND warehouse_id = $3
            "#,
        )
        .bind(tenant_id)
        .bind(product_id)
        .bind(warehouse_id)
        .bind(min_stock)
        .execute(executor)
        .await?;

        Ok(())
    }

    /// Inserta una línea en el libro de movimientos. `quantity` lleva signo.
    pub async fn record_movement<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        product_id: Uuid,
        warehouse_id: Uuid,
        quantity: i32,
        kind: MovementKind,
        reference: Option<MovementRef<'_>>,
        executed_by: Option<Uuid>,
    ) -> Result<InventoryMovement, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let movement = sqlx::query_as::<_, InventoryMovement>(
            r#"
            INSERT INTO inventory_movements
                (tenant_id, product_id, warehouse_id, quantity, kind, reference_type, reference_id, executed_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(product_id)
        .bind(warehouse_id)
        .bind(quantity)
        .bind(kind)
        .bind(reference.map(|r| r.kind.to_string()))
        .bind(reference.and_then(|r| r.id))
        .bind(executed_by)
        .fetch_one(executor)
        .await?;

        Ok(movement)
    }

    pub async fn list_movements(
        &self,
        tenant_id: Uuid,
        product_id: Option<Uuid>,
        warehouse_id: Option<Uuid>,
    ) -> Result<Vec<InventoryMovement>, AppError> {
        let movements = sqlx::query_as::<_, InventoryMovement>(
            r#"
            SELECT * FROM inventory_movements
            WHERE tenant_id = $1
              AND ($2::uuid IS NULL OR product_id = $2)
              AND ($3::uuid IS NULL OR warehouse_id = $3)
            ORDER BY created_at DESC
            LIMIT 500
            "#,
        )
        .bind(tenant_id)
        .bind(product_id)
        .bind(warehouse_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(movements)
    }
}
