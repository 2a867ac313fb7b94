// src/db.rs

pub mod catalog_repo;
pub mod document_repo;
pub mod inventory_repo;
pub mod tenancy_repo;
pub mod user_repo;

pub use catalog_repo::CatalogRepository;
pub use document_repo::{DocumentRepository, QuotationFilters};
pub use inventory_repo::InventoryRepository;
pub use tenancy_repo::TenantRepository;
pub use user_repo::UserRepository;
