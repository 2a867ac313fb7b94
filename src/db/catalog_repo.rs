// src/db/catalog_repo.rs

use rust_decimal::Decimal;
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::catalog::{Client, Product, StockLevel, Warehouse},
};

#[derive(Clone)]
pub struct CatalogRepository {
    pool: PgPool,
}

impl CatalogRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // ---
    // Clientes
    // ---

    pub async fn create_client<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        name: &str,
        last_name: Option<&str>,
        identifier: Option<&str>,
        phone: Option<&str>,
        email: Option<&str>,
        is_final_consumer: bool,
    ) -> Result<Client, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Client>(
            r#"
            INSERT INTO clients (tenant_id, name, last_name, identifier, phone, email, is_final_consumer)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(name)
        .bind(last_name)
        .bind(identifier)
        .bind(phone)
        .bind(email)
        .bind(is_final_consumer)
        .fetch_one(executor)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.is_unique_violation() {
                    return AppError::Validation(
                        "Ya existe un cliente con ese identificador.".to_string(),
                    );
                }
            }
            e.into()
        })
    }

    pub async fn list_clients(&self, tenant_id: Uuid) -> Result<Vec<Client>, AppError> {
        let clients = sqlx::query_as::<_, Client>(
            "SELECT * FROM clients WHERE tenant_id = $1 ORDER BY name ASC",
        )
        .bind(tenant_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(clients)
    }

    /// Búsqueda por tenant. Un id de otro tenant responde NotFound, igual
    /// que un id inexistente.
    pub async fn get_client<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        client_id: Uuid,
    ) -> Result<Client, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Client>("SELECT * FROM clients WHERE tenant_id = $1 AND id = $2")
            .bind(tenant_id)
            .bind(client_id)
            .fetch_optional(executor)
            .await?
            .ok_or(AppError::NotFound)
    }

    // ---
    // Productos
    // ---

    pub async fn create_product<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        code: &str,
        reference: Option<&str>,
        name: &str,
        unit: &str,
        price: Decimal,
        category: Option<&str>,
        has_itbis: bool,
        min_stock: i32,
    ) -> Result<Product, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Product>(
            r#"
            INSERT INTO products (tenant_id, code, reference, name, unit, price, category, has_itbis, min_stock)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(code)
        .bind(reference)
        .bind(name)
        .bind(unit)
        .bind(price)
        .bind(category)
        .bind(has_itbis)
        .bind(min_stock)
        .fetch_one(executor)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.is_unique_violation() {
                    return AppError::Validation(format!("El código {code} ya existe."));
                }
            }
            e.into()
        })
    }

    pub async fn list_products(&self, tenant_id: Uuid) -> Result<Vec<Product>, AppError> {
        let products = sqlx::query_as::<_, Product>(
            "SELECT * FROM products WHERE tenant_id = $1 ORDER BY name ASC",
        )
        .bind(tenant_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(products)
    }

    pub async fn get_product<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        product_id: Uuid,
    ) -> Result<Product, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Product>("SELECT * FROM products WHERE tenant_id = $1 AND id = $2")
            .bind(tenant_id)
            .bind(product_id)
            .fetch_optional(executor)
            .await?
            .ok_or(AppError::NotFound)
    }

    pub async fn get_product_by_code<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        code: &str,
    ) -> Result<Option<Product>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let product = sqlx::query_as::<_, Product>(
            "SELECT * FROM products WHERE tenant_id = $1 AND code = $2",
        )
        .bind(tenant_id)
        .bind(code)
        .fetch_optional(executor)
        .await?;
        Ok(product)
    }

    /// Foto del catálogo para el cálculo de totales: solo los productos
    /// referidos por las líneas, siempre dentro del tenant.
    pub async fn snapshot_products<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        codes: &[String],
    ) -> Result<Vec<Product>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let products = sqlx::query_as::<_, Product>(
            "SELECT * FROM products WHERE tenant_id = $1 AND code = ANY($2)",
        )
        .bind(tenant_id)
        .bind(codes)
        .fetch_all(executor)
        .await?;
        Ok(products)
    }

    // ---
    // Almacenes
    // ---

    pub async fn create_warehouse<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        name: &str,
        address: Option<&str>,
    ) -> Result<Warehouse, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let warehouse = sqlx::query_as::<_, Warehouse>(
            r#"
            INSERT INTO warehouses (tenant_id, name, address)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(name)
        .bind(address)
        .fetch_one(executor)
        .await?;
        Ok(warehouse)
    }

    pub async fn list_warehouses(&self, tenant_id: Uuid) -> Result<Vec<Warehouse>, AppError> {
        let warehouses = sqlx::query_as::<_, Warehouse>(
            "SELECT * FROM warehouses WHERE tenant_id = $1 ORDER BY name ASC",
        )
        .bind(tenant_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(warehouses)
    }

    pub async fn get_warehouse<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        warehouse_id: Uuid,
    ) -> Result<Warehouse, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Warehouse>("SELECT * FROM warehouses WHERE tenant_id = $1 AND id = $2")
            .bind(tenant_id)
            .bind(warehouse_id)
            .fetch_optional(executor)
            .await?
            .ok_or(AppError::NotFound)
    }

    pub async fn list_stock_levels(
        &self,
        tenant_id: Uuid,
        warehouse_id: Option<Uuid>,
    ) -> Result<Vec<StockLevel>, AppError> {
        let levels = sqlx::query_as::<_, StockLevel>(
            r#"
            SELECT * FROM stock_levels
            WHERE tenant_id = $1 AND ($2::uuid IS NULL OR warehouse_id = $2)
            ORDER BY updated_at DESC
            "#,
        )
        .bind(tenant_id)
        .bind(warehouse_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(levels)
    }
}
