// src/services/fiscal_service.rs
//
// Asignación de NCF (Número de Comprobante Fiscal). Cada tenant lleva dos
// contadores independientes: B02 para Consumidor Final y B01 para Crédito
// Fiscal. La serie se serializa bloqueando la fila del tenant (FOR UPDATE),
// así que dos facturaciones concurrentes del mismo tenant nunca leen el
// mismo valor.

use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{DocumentRepository, TenantRepository},
    models::tenancy::Tenant,
};

const NCF_PREFIX_FINAL: &str = "B02";
const NCF_PREFIX_FISCAL: &str = "B01";

pub const INVOICE_TYPE_FINAL: &str = "Consumidor Final";
pub const INVOICE_TYPE_FISCAL: &str = "Crédito Fiscal";

// Tope del barrido contra NCF ya emitidos. Si se agota, el contador del
// tenant quedó muy por detrás de la serie real y hay que corregirlo a mano.
const MAX_NCF_ATTEMPTS: i64 = 100;

#[derive(Debug, Clone)]
pub struct AllocatedNcf {
    pub ncf: String,
    pub invoice_type: &'static str,
}

/// Arma el comprobante: prefijo de serie más secuencia de 8 dígitos con
/// ceros a la izquierda.
pub fn ncf_candidate(prefix: &str, sequence: i64) -> String {
    format!("{prefix}{sequence:08}")
}

#[derive(Clone)]
pub struct FiscalService {
    pool: PgPool,
    tenants: TenantRepository,
    documents: DocumentRepository,
}

impl FiscalService {
    pub fn new(pool: PgPool, tenants: TenantRepository, documents: DocumentRepository) -> Self {
        Self {
            pool,
            tenants,
            documents,
        }
    }

    /// Emite el siguiente NCF del tenant dentro de la transacción recibida.
    /// Si el candidato ya existe en la base (contador desincronizado), la
    /// serie avanza hasta encontrar un hueco y el contador queda apuntando
    /// después del número emitido.
    pub async fn allocate(
        &self,
        conn: &mut sqlx::PgConnection,
        tenant_id: Uuid,
        is_final_consumer: bool,
    ) -> Result<AllocatedNcf, AppError> {
        let tenant = self.tenants.get_tenant_for_update(&mut *conn, tenant_id).await?;

        let (prefix, invoice_type, start) = if is_final_consumer {
            (NCF_PREFIX_FINAL, INVOICE_TYPE_FINAL, tenant.ncf_final)
        } else {
            (NCF_PREFIX_FISCAL, INVOICE_TYPE_FISCAL, tenant.ncf_fiscal)
        };

        let mut sequence = start;
        let mut issued = None;
        while sequence < start + MAX_NCF_ATTEMPTS {
            let candidate = ncf_candidate(prefix, sequence);
            if !self.documents.ncf_exists(&mut *conn, &candidate).await? {
                issued = Some(candidate);
                break;
            }
            tracing::warn!(tenant_id = %tenant_id, ncf = %candidate, "NCF ya emitido, avanzando la serie");
            sequence += 1;
        }
        let ncf = issued.ok_or(AppError::DuplicateFiscalNumber)?;

        let (new_final, new_fiscal) = if is_final_consumer {
            (sequence + 1, tenant.ncf_fiscal)
        } else {
            (tenant.ncf_final, sequence + 1)
        };
        self.tenants
            .update_counters(&mut *conn, tenant_id, new_final, new_fiscal)
            .await?;

        Ok(AllocatedNcf { ncf, invoice_type })
    }

    /// Ajuste manual de los contadores (inicio de una serie nueva autorizada
    /// por la DGII). Nunca pueden retroceder y todo cambio queda auditado.
    pub async fn set_counters(
        &self,
        tenant_id: Uuid,
        new_final: i64,
        new_fiscal: i64,
        changed_by: Option<Uuid>,
    ) -> Result<Tenant, AppError> {
        let mut tx = self.pool.begin().await?;

        let current = self.tenants.get_tenant_for_update(&mut *tx, tenant_id).await?;

        if new_final < current.ncf_final {
            return Err(AppError::CounterRegression {
                counter: "ncf_final",
                current: current.ncf_final,
                attempted: new_final,
            });
        }
        if new_fiscal < current.ncf_fiscal {
            return Err(AppError::CounterRegression {
                counter: "ncf_fiscal",
                current: current.ncf_fiscal,
                attempted: new_fiscal,
            });
        }

        let updated = self
            .tenants
            .update_counters(&mut *tx, tenant_id, new_final, new_fiscal)
            .await?;
        self.tenants
            .insert_ncf_log(
                &mut *tx,
                tenant_id,
                current.ncf_final,
                current.ncf_fiscal,
                new_final,
                new_fiscal,
                changed_by,
            )
            .await?;

        tx.commit().await?;
        Ok(updated)
    }

    pub async fn counter_history(
        &self,
        tenant_id: Uuid,
    ) -> Result<Vec<crate::models::tenancy::NcfLog>, AppError> {
        self.tenants.list_ncf_logs(tenant_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn candidate_is_prefix_plus_eight_digit_sequence() {
        assert_eq!(ncf_candidate(NCF_PREFIX_FINAL, 1), "B0200000001");
        assert_eq!(ncf_candidate(NCF_PREFIX_FISCAL, 305), "B0100000305");
    }

    #[test]
    fn sequence_wider_than_eight_digits_is_not_truncated() {
        assert_eq!(ncf_candidate(NCF_PREFIX_FINAL, 123_456_789), "B02123456789");
    }
}
