// src/services.rs

pub mod auth;
pub mod collaborators;
pub mod document_service;
pub mod fiscal_service;
pub mod inventory_service;
pub mod totals;

pub use auth::AuthService;
pub use document_service::DocumentService;
pub use fiscal_service::FiscalService;
pub use inventory_service::InventoryService;
