//! HTTP route handlers.

pub mod analytics;
pub mod applications;
pub mod health;
pub mod settings;
pub mod workspace;

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use chrono::{DateTime, FixedOffset, Utc};
use domain::services::CsvDownload;

use crate::config::Config;
use crate::error::ApiError;

/// Current time in the agency's fixed offset. A per-request offset wins
/// over the configured one.
pub(crate) fn local_now(
    config: &Config,
    utc_offset_minutes: Option<i32>,
) -> Result<DateTime<FixedOffset>, ApiError> {
    let minutes = utc_offset_minutes.unwrap_or(config.analytics.utc_offset_minutes);
    let offset = minutes
        .checked_mul(60)
        .and_then(FixedOffset::east_opt)
        .ok_or_else(|| {
            ApiError::Validation(format!("utc_offset_minutes out of range: {}", minutes))
        })?;
    Ok(Utc::now().with_timezone(&offset))
}

/// Parses an optional query value, mapping parse errors to 400.
pub(crate) fn parse_param<T>(value: Option<&str>) -> Result<Option<T>, ApiError>
where
    T: std::str::FromStr<Err = String>,
{
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(|v| v.parse::<T>().map_err(ApiError::Validation))
        .transpose()
}

/// Serves a CSV file as an attachment.
pub(crate) fn csv_response(download: CsvDownload) -> Response {
    let disposition = format!("attachment; filename=\"{}\"", download.filename);
    let mut response = (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/csv; charset=utf-8")],
        download.content,
    )
        .into_response();
    if let Ok(value) = HeaderValue::from_str(&disposition) {
        response
            .headers_mut()
            .insert(header::CONTENT_DISPOSITION, value);
    }
    response
}
