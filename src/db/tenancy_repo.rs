// src/db/tenancy_repo.rs

use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::tenancy::{NcfLog, Tenant, UserTenant},
};

#[derive(Clone)]
pub struct TenantRepository {
    pool: PgPool,
}

impl TenantRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Verifica si un usuario puede operar un tenant. Es la comprobación de
    /// autorización más importante del sistema.
    pub async fn check_user_tenancy(
        &self,
        user_id: Uuid,
        tenant_id: Uuid,
    ) -> Result<bool, AppError> {
        // SELECT EXISTS es la consulta más barata posible.
        let exists: (bool,) = sqlx::query_as(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM user_tenants
                WHERE user_id = $1 AND tenant_id = $2
            )
            "#,
        )
        .bind(user_id)
        .bind(tenant_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists.0)
    }

    pub async fn create_tenant<'e, E>(
        &self,
        executor: E,
        name: &str,
        rnc: &str,
        street: Option<&str>,
        phone: Option<&str>,
    ) -> Result<Tenant, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let tenant = sqlx::query_as::<_, Tenant>(
            r#"
            INSERT INTO tenants (name, rnc, street, phone)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(name)
        .bind(rnc)
        .bind(street)
        .bind(phone)
        .fetch_one(executor)
        .await?;

        Ok(tenant)
    }

    pub async fn assign_user_to_tenant<'e, E>(
        &self,
        executor: E,
        user_id: Uuid,
        tenant_id: Uuid,
    ) -> Result<UserTenant, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let link = sqlx::query_as::<_, UserTenant>(
            r#"
            INSERT INTO user_tenants (user_id, tenant_id)
            VALUES ($1, $2)
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(tenant_id)
        .fetch_one(executor)
        .await?;

        Ok(link)
    }

    pub async fn list_tenants_for_user(&self, user_id: Uuid) -> Result<Vec<Tenant>, AppError> {
        let tenants = sqlx::query_as::<_, Tenant>(
            r#"
            SELECT t.* FROM tenants t
            JOIN user_tenants ut ON ut.tenant_id = t.id
            WHERE ut.user_id = $1
            ORDER BY t.name ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(tenants)
    }

    pub async fn get_tenant<'e, E>(&self, executor: E, tenant_id: Uuid) -> Result<Tenant, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Tenant>("SELECT * FROM tenants WHERE id = $1")
            .bind(tenant_id)
            .fetch_optional(executor)
            .await?
            .ok_or(AppError::NotFound)
    }

    /// Bloquea la fila del tenant dentro de la transacción actual. Serializa
    /// la asignación de NCF por (tenant, contador): dos facturaciones
    /// concurrentes no pueden leer el mismo valor.
    pub async fn get_tenant_for_update<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
    ) -> Result<Tenant, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Tenant>("SELECT * FROM tenants WHERE id = $1 FOR UPDATE")
            .bind(tenant_id)
            .fetch_optional(executor)
            .await?
            .ok_or(AppError::NotFound)
    }

    pub async fn update_counters<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        ncf_final: i64,
        ncf_fiscal: i64,
    ) -> Result<Tenant, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let tenant = sqlx::query_as::<_, Tenant>(
            r#"
            UPDATE tenants
            SET ncf_final = $2, ncf_fiscal = $3, updated_at = now()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(ncf_final)
        .bind(ncf_fiscal)
        .fetch_optional(executor)
        .await?
        .ok_or(AppError::NotFound)?;

        Ok(tenant)
    }

    pub async fn insert_ncf_log<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        old_final: i64,
        old_fiscal: i64,
        new_final: i64,
        new_fiscal: i64,
        changed_by: Option<Uuid>,
    ) -> Result<NcfLog, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let log = sqlx::query_as::<_, NcfLog>(
            r#"
            INSERT INTO ncf_logs (tenant_id, old_final, old_fiscal, new_final, new_fiscal, changed_by)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(old_final)
        .bind(old_fiscal)
        .bind(new_final)
        .bind(new_fiscal)
        .bind(changed_by)
        .fetch_one(executor)
        .await?;

        Ok(log)
    }

    pub async fn list_ncf_logs(&self, tenant_id: Uuid) -> Result<Vec<NcfLog>, AppError> {
        let logs = sqlx::query_as::<_, NcfLog>(
            "SELECT * FROM ncf_logs WHERE tenant_id = $1 ORDER BY changed_at DESC",
        )
        .bind(tenant_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(logs)
    }
}
