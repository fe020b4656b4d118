//! Custom Axum extractors.

pub mod session;
pub mod tenant;

pub use session::Session;
pub use tenant::Tenant;
