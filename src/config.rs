// src/config.rs

use std::sync::Arc;

use anyhow::Context;
use sqlx::{PgPool, postgres::PgPoolOptions};

use crate::{
    db::{
        CatalogRepository, DocumentRepository, InventoryRepository, TenantRepository,
        UserRepository,
    },
    services::{
        AuthService, DocumentService, FiscalService, InventoryService,
        collaborators::{
            DocumentRenderer, ExportWorker, PlainTextRenderer, TracingExportWorker,
            TracingNotifier,
        },
    },
};

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub auth: AuthService,
    pub tenants: TenantRepository,
    pub catalog: CatalogRepository,
    pub inventory: InventoryService,
    pub fiscal: FiscalService,
    pub documents: DocumentService,
    pub renderer: Arc<dyn DocumentRenderer>,
    pub exports: Arc<dyn ExportWorker>,
}

impl AppState {
    pub async fn new() -> anyhow::Result<Self> {
        let database_url =
            std::env::var("DATABASE_URL").context("DATABASE_URL no está definida")?;
        let jwt_secret = std::env::var("JWT_SECRET").context("JWT_SECRET no está definida")?;

        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(&database_url)
            .await
            .context("no se pudo conectar a la base de datos")?;

        sqlx::migrate!()
            .run(&pool)
            .await
            .context("las migraciones fallaron")?;

        let users = UserRepository::new(pool.clone());
        let tenants = TenantRepository::new(pool.clone());
        let catalog = CatalogRepository::new(pool.clone());
        let inventory_repo = InventoryRepository::new(pool.clone());
        let documents_repo = DocumentRepository::new(pool.clone());

        let auth = AuthService::new(users, jwt_secret);
        let inventory = InventoryService::new(pool.clone(), inventory_repo, catalog.clone());
        let fiscal = FiscalService::new(pool.clone(), tenants.clone(), documents_repo.clone());
        let documents = DocumentService::new(
            pool.clone(),
            documents_repo,
            catalog.clone(),
            fiscal.clone(),
            inventory.clone(),
            Arc::new(TracingNotifier),
        );

        Ok(Self {
            pool,
            auth,
            tenants,
            catalog,
            inventory,
            fiscal,
            documents,
            renderer: Arc::new(PlainTextRenderer),
            exports: Arc::new(TracingExportWorker),
        })
    }
}
