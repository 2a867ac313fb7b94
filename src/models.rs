pub mod auth;
pub mod catalog;
pub mod documents;
pub mod inventory;
pub mod tenancy;
