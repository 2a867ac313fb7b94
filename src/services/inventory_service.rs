// src/services/inventory_service.rs
//
// Operaciones sobre el inventario. Todas las escrituras pasan por el mismo
// camino: bloquear la fila de saldo, verificar que no quede negativa,
// aplicar el delta al saldo y al contador global del producto, y dejar la
// línea correspondiente en el libro de movimientos. Saldo y libro cambian
// siempre en la misma transacción.

use std::collections::BTreeMap;

use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{CatalogRepository, InventoryRepository},
    models::{
        catalog::{Product, StockLevel, Warehouse},
        inventory::{InventoryMovement, MovementKind, MovementRef},
    },
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Fila de una carga masiva de saldos. La cantidad es absoluta: el saldo
/// del producto en ese almacén queda exactamente en `quantity`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ImportRow {
    pub code: String,
    pub warehouse_id: Uuid,
    pub quantity: i32,
}

/// Verificación pura de suficiencia. El nombre del producto y del almacén
/// viajan en el error para que el mensaje al usuario sea útil.
pub fn ensure_sufficient(
    level: &StockLevel,
    product: &Product,
    warehouse: &Warehouse,
    requested: i32,
) -> Result<(), AppError> {
    if requested > level.quantity {
        return Err(AppError::InsufficientStock {
            product: product.name.clone(),
            warehouse: warehouse.name.clone(),
        });
    }
    Ok(())
}

// Suma cantidades por producto y fija un orden estable (por id) para tomar
// los bloqueos. Dos reservas concurrentes que disputan los mismos productos
// los bloquean en el mismo orden y no se interbloquean.
fn aggregate_demands<'a>(demands: &'a [(Product, i32)]) -> BTreeMap<Uuid, (&'a Product, i32)> {
    let mut by_product: BTreeMap<Uuid, (&Product, i32)> = BTreeMap::new();
    for (product, quantity) in demands {
        by_product
            .entry(product.id)
            .and_modify(|(_, total)| *total += quantity)
            .or_insert((product, *quantity));
    }
    by_product
}

#[derive(Clone)]
pub struct InventoryService {
    pool: PgPool,
    inventory: InventoryRepository,
    catalog: CatalogRepository,
}

impl InventoryService {
    pub fn new(pool: PgPool, inventory: InventoryRepository, catalog: CatalogRepository) -> Self {
        Self {
            pool,
            inventory,
            catalog,
        }
    }

    /// Núcleo compartido: bloquea el saldo, valida, aplica y registra.
    /// Debe llamarse dentro de una transacción abierta.
    async fn locked_apply(
        &self,
        conn: &mut sqlx::PgConnection,
        product: &Product,
        warehouse: &Warehouse,
        delta: i32,
        kind: MovementKind,
        reference: Option<MovementRef<'_>>,
        actor: Option<Uuid>,
    ) -> Result<StockLevel, AppError> {
        let tenant_id = product.tenant_id;
        let level = self
            .inventory
            .lock_level(&mut *conn, tenant_id, product.id, warehouse.id)
            .await?;

        if delta < 0 {
            ensure_sufficient(&level, product, warehouse, -delta)?;
        }

        let level = self
            .inventory
            .apply_level_delta(&mut *conn, tenant_id, product.id, warehouse.id, delta)
            .await?;
        self.inventory
            .apply_product_delta(&mut *conn, tenant_id, product.id, delta)
            .await?;
        self.inventory
            .record_movement(
                &mut *conn,
                tenant_id,
                product.id,
                warehouse.id,
                delta,
                kind,
                reference,
                actor,
            )
            .await?;

        Ok(level)
    }

    /// Ajuste manual con delta (positivo o negativo).
    pub async fn adjust(
        &self,
        tenant_id: Uuid,
        product_id: Uuid,
        warehouse_id: Uuid,
        delta: i32,
        actor: Option<Uuid>,
    ) -> Result<StockLevel, AppError> {
        if delta == 0 {
            return Err(AppError::Validation("El ajuste no puede ser cero.".to_string()));
        }

        let mut tx = self.pool.begin().await?;
        let product = self.catalog.get_product(&mut *tx, tenant_id, product_id).await?;
        let warehouse = self
            .catalog
            .get_warehouse(&mut *tx, tenant_id, warehouse_id)
            .await?;

        let level = self
            .locked_apply(
                &mut tx,
                &product,
                &warehouse,
                delta,
                MovementKind::Ajuste,
                None,
                actor,
            )
            .await?;

        tx.commit().await?;
        Ok(level)
    }

    /// Fija el saldo en una cantidad absoluta. Se registra como ajuste con
    /// el delta resultante; si el saldo ya está en el valor pedido no se
    /// escribe nada en el libro.
    pub async fn set_level(
        &self,
        tenant_id: Uuid,
        product_id: Uuid,
        warehouse_id: Uuid,
        target: i32,
        actor: Option<Uuid>,
    ) -> Result<StockLevel, AppError> {
        if target < 0 {
            return Err(AppError::Validation(
                "La cantidad no puede ser negativa.".to_string(),
            ));
        }

        let mut tx = self.pool.begin().await?;
        let product = self.catalog.get_product(&mut *tx, tenant_id, product_id).await?;
        let warehouse = self
            .catalog
            .get_warehouse(&mut *tx, tenant_id, warehouse_id)
            .await?;

        let current = self
            .inventory
            .lock_level(&mut *tx, tenant_id, product_id, warehouse_id)
            .await?;
        let delta = target - current.quantity;

        let level = if delta == 0 {
            current
        } else {
            self.locked_apply(
                &mut tx,
                &product,
                &warehouse,
                delta,
                MovementKind::Ajuste,
                Some(MovementRef::tag("conteo")),
                actor,
            )
            .await?
        };

        tx.commit().await?;
        Ok(level)
    }

    /// Mueve existencias entre dos almacenes del mismo tenant. El contador
    /// global del producto no cambia: sale de uno y entra al otro.
    pub async fn transfer(
        &self,
        tenant_id: Uuid,
        product_id: Uuid,
        from_warehouse: Uuid,
        to_warehouse: Uuid,
        quantity: i32,
        actor: Option<Uuid>,
    ) -> Result<(), AppError> {
        if quantity <= 0 {
            return Err(AppError::Validation(
                "La cantidad a transferir debe ser positiva.".to_string(),
            ));
        }
        if from_warehouse == to_warehouse {
            return Err(AppError::Validation(
                "El almacén de origen y el de destino deben ser distintos.".to_string(),
            ));
        }

        let mut tx = self.pool.begin().await?;
        let product = self.catalog.get_product(&mut *tx, tenant_id, product_id).await?;
        let origin = self
            .catalog
            .get_warehouse(&mut *tx, tenant_id, from_warehouse)
            .await?;
        let destination = self
            .catalog
            .get_warehouse(&mut *tx, tenant_id, to_warehouse)
            .await?;

        // Bloqueo en orden estable por id de almacén; dos transferencias
        // cruzadas entre los mismos almacenes no se interbloquean.
        let source = if origin.id <= destination.id {
            let source = self
                .inventory
                .lock_level(&mut *tx, tenant_id, product_id, origin.id)
                .await?;
            self.inventory
                .lock_level(&mut *tx, tenant_id, product_id, destination.id)
                .await?;
            source
        } else {
            self.inventory
                .lock_level(&mut *tx, tenant_id, product_id, destination.id)
                .await?;
            self.inventory
                .lock_level(&mut *tx, tenant_id, product_id, origin.id)
                .await?
        };
        ensure_sufficient(&source, &product, &origin, quantity)?;

        // Cada movimiento referencia el almacén contraparte.
        self.inventory
            .apply_level_delta(&mut *tx, tenant_id, product_id, origin.id, -quantity)
            .await?;
        self.inventory
            .record_movement(
                &mut *tx,
                tenant_id,
                product_id,
                origin.id,
                -quantity,
                MovementKind::Salida,
                Some(MovementRef::new("transferencia", destination.id)),
                actor,
            )
            .await?;
        self.inventory
            .apply_level_delta(&mut *tx, tenant_id, product_id, destination.id, quantity)
            .await?;
        self.inventory
            .record_movement(
                &mut *tx,
                tenant_id,
                product_id,
                destination.id,
                quantity,
                MovementKind::Entrada,
                Some(MovementRef::new("transferencia", origin.id)),
                actor,
            )
            .await?;

        tx.commit().await?;
        Ok(())
    }

    /// Reserva en lote para la conversión de documentos. Corre dentro de la
    /// transacción del documento. Primero se bloquean y verifican todas las
    /// filas; el primer producto sin existencias corta la operación sin
    /// haber escrito nada. Las cantidades repetidas del mismo producto se
    /// suman antes de verificar.
    pub async fn bulk_reserve(
        &self,
        conn: &mut sqlx::PgConnection,
        demands: &[(Product, i32)],
        warehouse: &Warehouse,
        reference: MovementRef<'_>,
        actor: Option<Uuid>,
    ) -> Result<(), AppError> {
        let mut validated = Vec::new();
        for (product, quantity) in aggregate_demands(demands).into_values() {
            if quantity <= 0 {
                continue;
            }
            let level = self
                .inventory
                .lock_level(&mut *conn, product.tenant_id, product.id, warehouse.id)
                .await?;
            ensure_sufficient(&level, product, warehouse, quantity)?;
            validated.push((product, quantity));
        }

        for (product, quantity) in validated {
            self.inventory
                .apply_level_delta(&mut *conn, product.tenant_id, product.id, warehouse.id, -quantity)
                .await?;
            self.inventory
                .apply_product_delta(&mut *conn, product.tenant_id, product.id, -quantity)
                .await?;
            self.inventory
                .record_movement(
                    &mut *conn,
                    product.tenant_id,
                    product.id,
                    warehouse.id,
                    -quantity,
                    MovementKind::Salida,
                    Some(reference),
                    actor,
                )
                .await?;
        }
        Ok(())
    }

    /// Carga masiva de saldos (todo o nada). Cada fila deja el saldo del
    /// producto en la cantidad indicada. Primero se validan todas las filas
    /// y los errores se devuelven juntos; con un solo error no se aplica
    /// ninguna.
    pub async fn import_levels(
        &self,
        tenant_id: Uuid,
        rows: &[ImportRow],
        actor: Option<Uuid>,
    ) -> Result<usize, AppError> {
        let mut tx = self.pool.begin().await?;

        let mut errors = Vec::new();
        let mut resolved = Vec::new();
        for (index, row) in rows.iter().enumerate() {
            let line = index + 1;
            if row.quantity < 0 {
                errors.push(format!("fila {line}: cantidad negativa para {}", row.code));
                continue;
            }
            let product = match self
                .catalog
                .get_product_by_code(&mut *tx, tenant_id, &row.code)
                .await?
            {
                Some(product) => product,
                None => {
                    errors.push(format!("fila {line}: el código {} no existe", row.code));
                    continue;
                }
            };
            let warehouse = match self
                .catalog
                .get_warehouse(&mut *tx, tenant_id, row.warehouse_id)
                .await
            {
                Ok(warehouse) => warehouse,
                Err(AppError::NotFound) => {
                    errors.push(format!("fila {line}: el almacén no existe"));
                    continue;
                }
                Err(e) => return Err(e),
            };
            resolved.push((product, warehouse, row.quantity));
        }
        if !errors.is_empty() {
            return Err(AppError::Validation(errors.join(" | ")));
        }

        let mut applied = 0;
        for (product, warehouse, target) in &resolved {
            let current = self
                .inventory
                .lock_level(&mut *tx, tenant_id, product.id, warehouse.id)
                .await?;
            let delta = target - current.quantity;
            if delta != 0 {
                self.locked_apply(
                    &mut tx,
                    product,
                    warehouse,
                    delta,
                    MovementKind::Entrada,
                    Some(MovementRef::tag("import")),
                    actor,
                )
                .await?;
            }
            applied += 1;
        }

        tx.commit().await?;
        Ok(applied)
    }

    pub async fn stock_levels(
        &self,
        tenant_id: Uuid,
        warehouse_id: Option<Uuid>,
    ) -> Result<Vec<StockLevel>, AppError> {
        self.catalog.list_stock_levels(tenant_id, warehouse_id).await
    }

    pub async fn movements(
        &self,
        tenant_id: Uuid,
        product_id: Option<Uuid>,
        warehouse_id: Option<Uuid>,
    ) -> Result<Vec<InventoryMovement>, AppError> {
        self.inventory.list_movements(tenant_id, product_id, warehouse_id).await
    }

    pub async fn set_min_stock(
        &self,
        tenant_id: Uuid,
        product_id: Uuid,
        warehouse_id: Uuid,
        min_stock: i32,
    ) -> Result<(), AppError> {
        if min_stock < 0 {
            return Err(AppError::Validation(
                "El mínimo de stock no puede ser negativo.".to_string(),
            ));
        }
        self.inventory
            .set_min_stock(&self.pool, tenant_id, product_id, warehouse_id, min_stock)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal_macros::dec;

    fn product(name: &str) -> Product {
        Product {
            id: Uuid::new_v4(),
            tenant_id: Uuid::new_v4(),
            code: name.to_string(),
            reference: None,
            name: name.to_string(),
            unit: "unidad".to_string(),
            price: dec!(1),
            category: None,
            has_itbis: true,
            stock: 0,
            min_stock: 0,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn warehouse(name: &str) -> Warehouse {
        Warehouse {
            id: Uuid::new_v4(),
            tenant_id: Uuid::new_v4(),
            name: name.to_string(),
            address: None,
            created_at: Utc::now(),
        }
    }

    fn level(quantity: i32) -> StockLevel {
        StockLevel {
            id: Uuid::new_v4(),
            tenant_id: Uuid::new_v4(),
            product_id: Uuid::new_v4(),
            warehouse_id: Uuid::new_v4(),
            quantity,
            min_stock: 0,
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn sufficiency_allows_exact_drain() {
        let ok = ensure_sufficient(&level(5), &product("Cemento"), &warehouse("Central"), 5);
        assert!(ok.is_ok());
    }

    #[test]
    fn sufficiency_reports_product_and_warehouse() {
        let err = ensure_sufficient(&level(2), &product("Cemento"), &warehouse("Central"), 3)
            .unwrap_err();
        match err {
            AppError::InsufficientStock { product, warehouse } => {
                assert_eq!(product, "Cemento");
                assert_eq!(warehouse, "Central");
            }
            other => panic!("se esperaba InsufficientStock, llegó {other:?}"),
        }
    }

    #[test]
    fn demands_for_the_same_product_are_summed() {
        let p = product("Varilla");
        let q = product("Tubo");
        let demands = vec![(p.clone(), 2), (q.clone(), 1), (p.clone(), 3)];

        let aggregated = aggregate_demands(&demands);
        assert_eq!(aggregated.len(), 2);
        assert_eq!(aggregated[&p.id].1, 5);
        assert_eq!(aggregated[&q.id].1, 1);
    }

    #[test]
    fn aggregation_orders_by_product_id() {
        let a = product("A");
        let b = product("B");
        let demands = vec![(b.clone(), 1), (a.clone(), 1)];

        let keys: Vec<Uuid> = aggregate_demands(&demands).into_keys().collect();
        let mut sorted = keys.clone();
        sorted.sort();
        assert_eq!(keys, sorted);
    }
}
