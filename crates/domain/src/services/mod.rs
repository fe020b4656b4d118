//! Domain services for Visa Desk.
//!
//! Services contain business logic that operates on domain models.

pub mod aggregation;
pub mod csv_export;
pub mod inline_edit;
pub mod listing;
pub mod store;

pub use csv_export::CsvDownload;
pub use inline_edit::{DeleteConfirmation, FieldFocus, InlineEditController, WorkspaceView};
pub use listing::{ListQuery, SortOrder, StatusFilter};
pub use store::{
    ApplicationStore, InMemoryApplicationStore, InMemoryTenantSettingsStore, TenantSettingsStore,
};
