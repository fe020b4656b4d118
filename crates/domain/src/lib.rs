//! Domain layer for Visa Desk backend.
//!
//! This crate contains:
//! - Domain models (VisaApplication, TenantSettings, analytics figures)
//! - Business logic services (aggregation, inline editing, listing, CSV export)
//! - Store traits implemented by the persistence crate
//! - Domain error types

pub mod error;
pub mod models;
pub mod services;

pub use error::DomainError;
