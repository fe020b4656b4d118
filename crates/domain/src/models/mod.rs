//! Domain models for Visa Desk.

pub mod analytics;
pub mod application;
pub mod tenant;
pub mod tenant_settings;

pub use analytics::{
    AnalyticsReport, MetricCard, MetricComparison, MonthlyBucket, PeriodRange, PeriodSummary,
    StatusSlice, TimeWindow, Trend,
};
pub use application::{
    ApplicationPatch, ApplicationResponse, ApplicationStatus, EditableField, FieldValue,
    NewApplication, UpdateStatusRequest, VisaApplication, APPLICATION_COLUMNS,
};
pub use tenant::TenantId;
pub use tenant_settings::{Branding, TenantSettings, UpdateTenantSettingsRequest};
