//! Shared utilities and common types for the Visa Desk backend.
//!
//! This crate provides common functionality used across all other crates:
//! - JWT validation for tenant identity
//! - Common validation logic

pub mod jwt;
pub mod validation;
