// src/handlers.rs

pub mod auth;
pub mod catalog;
pub mod exports;
pub mod inventory;
pub mod invoices;
pub mod orders;
pub mod quotations;
pub mod settings;
pub mod tenancy;
