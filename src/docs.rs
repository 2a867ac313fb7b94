// src/docs.rs

use utoipa::OpenApi;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};

use crate::handlers;
use crate::models;
use crate::services;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Auth ---
        handlers::auth::register,
        handlers::auth::login,
        handlers::auth::me,

        // --- Tenancy ---
        handlers::tenancy::create_tenant,
        handlers::tenancy::list_my_tenants,

        // --- Settings (NCF) ---
        handlers::settings::get_ncf_counters,
        handlers::settings::update_ncf_counters,
        handlers::settings::ncf_history,

        // --- Catalog ---
        handlers::catalog::create_client,
        handlers::catalog::list_clients,
        handlers::catalog::get_client,
        handlers::catalog::create_product,
        handlers::catalog::list_products,
        handlers::catalog::get_product,
        handlers::catalog::create_warehouse,
        handlers::catalog::list_warehouses,

        // --- Inventory ---
        handlers::inventory::list_levels,
        handlers::inventory::list_movements,
        handlers::inventory::adjust,
        handlers::inventory::set_level,
        handlers::inventory::transfer,
        handlers::inventory::import_levels,
        handlers::inventory::set_min_stock,

        // --- Quotations ---
        handlers::quotations::create_quotation,
        handlers::quotations::list_quotations,
        handlers::quotations::get_quotation,
        handlers::quotations::update_quotation,
        handlers::quotations::convert_quotation,
        handlers::quotations::render_quotation,

        // --- Orders ---
        handlers::orders::list_orders,
        handlers::orders::get_order,
        handlers::orders::invoice_order,

        // --- Invoices ---
        handlers::invoices::list_invoices,
        handlers::invoices::get_invoice,
        handlers::invoices::register_payment,
        handlers::invoices::mark_paid,
        handlers::invoices::render_invoice,

        // --- Exports ---
        handlers::exports::submit_export,
    ),
    components(
        schemas(
            // --- Auth ---
            models::auth::User,
            handlers::auth::RegisterPayload,
            handlers::auth::LoginPayload,
            handlers::auth::LoginResponse,

            // --- Tenancy ---
            models::tenancy::Tenant,
            models::tenancy::NcfLog,
            handlers::tenancy::CreateTenantPayload,
            handlers::settings::NcfCounters,
            handlers::settings::UpdateNcfPayload,

            // --- Catalog ---
            models::catalog::Client,
            models::catalog::Product,
            models::catalog::Warehouse,
            models::catalog::StockLevel,
            handlers::catalog::CreateClientPayload,
            handlers::catalog::CreateProductPayload,
            handlers::catalog::CreateWarehousePayload,

            // --- Inventory ---
            models::inventory::MovementKind,
            models::inventory::InventoryMovement,
            services::inventory_service::ImportRow,
            handlers::inventory::AdjustPayload,
            handlers::inventory::SetLevelPayload,
            handlers::inventory::TransferPayload,
            handlers::inventory::ImportPayload,
            handlers::inventory::MinStockPayload,
            handlers::inventory::ImportResult,

            // --- Documents ---
            models::documents::QuotationStatus,
            models::documents::OrderStatus,
            models::documents::InvoiceStatus,
            models::documents::ValidityPeriod,
            models::documents::DocumentLine,
            models::documents::Quotation,
            models::documents::Order,
            models::documents::Invoice,
            models::documents::Payment,
            services::totals::LineRequest,
            services::totals::PricedLines,
            services::document_service::QuotationDetail,
            services::document_service::OrderDetail,
            services::document_service::InvoiceDetail,
            services::document_service::PaymentReceipt,
            handlers::quotations::QuotationPayload,
            handlers::quotations::ConvertPayload,
            handlers::invoices::PaymentPayload,

            // --- Exports ---
            services::collaborators::ExportJobRequest,
            handlers::exports::ExportJobReceipt,
        )
    ),
    tags(
        (name = "Auth", description = "Registro e inicio de sesión"),
        (name = "Tenancy", description = "Empresas y membresías"),
        (name = "Settings", description = "Contadores de NCF"),
        (name = "Catalog", description = "Clientes, productos y almacenes"),
        (name = "Inventory", description = "Saldos y libro de movimientos"),
        (name = "Quotations", description = "Cotizaciones y su conversión"),
        (name = "Orders", description = "Pedidos y facturación"),
        (name = "Invoices", description = "Facturas, pagos y balance"),
        (name = "Exports", description = "Exportaciones en segundo plano")
    )
)]
pub struct ApiDoc;

impl ApiDoc {
    pub fn with_security() -> utoipa::openapi::OpenApi {
        let mut doc = Self::openapi();
        if let Some(components) = doc.components.as_mut() {
            components.add_security_scheme(
                "api_jwt",
                SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
            );
        }
        doc
    }
}
