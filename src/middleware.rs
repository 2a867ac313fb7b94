// src/middleware.rs

pub mod auth;
pub mod tenancy;

pub use auth::{AuthenticatedUser, auth_guard};
pub use tenancy::{TenantContext, tenant_guard};
