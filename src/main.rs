// src/main.rs

use axum::{
    Router,
    middleware as axum_middleware,
    routing::{get, post, put},
};
use tokio::net::TcpListener;
use utoipa_swagger_ui::SwaggerUi;

mod common;
mod config;
mod db;
mod docs;
mod handlers;
mod middleware;
mod models;
mod services;

use crate::config::AppState;
use crate::middleware::{auth_guard, tenant_guard};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt().with_target(false).compact().init();

    // Conexión, migraciones y armado de servicios.
    let app_state = AppState::new().await?;
    tracing::info!("estado inicializado y migraciones aplicadas");

    // Rutas públicas.
    let auth_routes = Router::new()
        .route("/register", post(handlers::auth::register))
        .route("/login", post(handlers::auth::login));

    // Rutas que solo piden un token válido (todavía sin tenant).
    let user_routes = Router::new()
        .route("/me", get(handlers::auth::me))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    let tenancy_routes = Router::new()
        .route(
            "/",
            post(handlers::tenancy::create_tenant).get(handlers::tenancy::list_my_tenants),
        )
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    // Todo lo demás exige token + membresía en el tenant del encabezado.
    let settings_routes = Router::new()
        .route(
            "/ncf",
            get(handlers::settings::get_ncf_counters).put(handlers::settings::update_ncf_counters),
        )
        .route("/ncf/history", get(handlers::settings::ncf_history))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            tenant_guard,
        ));

    let catalog_routes = Router::new()
        .route(
            "/clients",
            post(handlers::catalog::create_client).get(handlers::catalog::list_clients),
        )
        .route("/clients/{id}", get(handlers::catalog::get_client))
        .route(
            "/products",
            post(handlers::catalog::create_product).get(handlers::catalog::list_products),
        )
        .route("/products/{id}", get(handlers::catalog::get_product))
        .route(
            "/warehouses",
            post(handlers::catalog::create_warehouse).get(handlers::catalog::list_warehouses),
        )
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            tenant_guard,
        ));

    let inventory_routes = Router::new()
        .route("/levels", get(handlers::inventory::list_levels))
        .route("/movements", get(handlers::inventory::list_movements))
        .route("/adjust", post(handlers::inventory::adjust))
        .route("/set", post(handlers::inventory::set_level))
        .route("/transfer", post(handlers::inventory::transfer))
        .route("/import", post(handlers::inventory::import_levels))
        .route("/min-stock", put(handlers::inventory::set_min_stock))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            tenant_guard,
        ));

    let document_routes = Router::new()
        .route(
            "/quotations",
            post(handlers::quotations::create_quotation).get(handlers::quotations::list_quotations),
        )
        .route(
            "/quotations/{id}",
            get(handlers::quotations::get_quotation).put(handlers::quotations::update_quotation),
        )
        .route(
            "/quotations/{id}/convert",
            post(handlers::quotations::convert_quotation),
        )
        .route(
            "/quotations/{id}/document",
            get(handlers::quotations::render_quotation),
        )
        .route("/orders", get(handlers::orders::list_orders))
        .route("/orders/{id}", get(handlers::orders::get_order))
        .route("/orders/{id}/invoice", post(handlers::orders::invoice_order))
        .route("/invoices", get(handlers::invoices::list_invoices))
        .route("/invoices/{id}", get(handlers::invoices::get_invoice))
        .route(
            "/invoices/{id}/payments",
            post(handlers::invoices::register_payment),
        )
        .route("/invoices/{id}/paid", put(handlers::invoices::mark_paid))
        .route(
            "/invoices/{id}/document",
            get(handlers::invoices::render_invoice),
        )
        .route("/exports", post(handlers::exports::submit_export))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            tenant_guard,
        ));

    let app = Router::new()
        .route("/api/health", get(|| async { "OK" }))
        .nest("/api/auth", auth_routes)
        .nest("/api/users", user_routes)
        .nest("/api/tenants", tenancy_routes)
        .nest("/api/settings", settings_routes)
        .nest("/api", catalog_routes.merge(document_routes))
        .nest("/api/inventory", inventory_routes)
        .merge(
            SwaggerUi::new("/api/docs")
                .url("/api/openapi.json", docs::ApiDoc::with_security()),
        )
        .with_state(app_state);

    let addr = "0.0.0.0:3000";
    let listener = TcpListener::bind(addr).await?;
    tracing::info!("servidor escuchando en {addr}");
    axum::serve(listener, app).await?;

    Ok(())
}
