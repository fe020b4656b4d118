//! CSV export of application lists and monthly analytics.

use serde::Serialize;

use crate::models::{MonthlyBucket, TimeWindow, VisaApplication, APPLICATION_COLUMNS};

/// Columns of the monthly analytics export.
pub const MONTHLY_COLUMNS: [&str; 6] = [
    "month",
    "year",
    "applications",
    "revenue",
    "success_rate",
    "pending",
];

/// A named text file handed to the download sink.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CsvDownload {
    pub filename: String,
    pub content: String,
}

/// Quotes a cell, doubling embedded quotes. Missing values become `""`.
pub fn quote_cell(value: Option<&str>) -> String {
    format!("\"{}\"", value.unwrap_or("").replace('"', "\"\""))
}

/// Renders a header row and fully quoted data rows joined by `\n`.
///
/// Every row is padded or cut to the header width, so no column is ever
/// dropped.
pub fn render_csv(headers: &[&str], rows: &[Vec<Option<String>>]) -> String {
    let mut lines = Vec::with_capacity(rows.len() + 1);
    lines.push(headers.join(","));
    for row in rows {
        let cells: Vec<String> = (0..headers.len())
            .map(|i| quote_cell(row.get(i).and_then(|cell| cell.as_deref())))
            .collect();
        lines.push(cells.join(","));
    }
    lines.join("\n")
}

fn application_row(app: &VisaApplication) -> Vec<Option<String>> {
    vec![
        Some(app.id.to_string()),
        Some(app.first_name.clone()),
        app.middle_name.clone(),
        Some(app.last_name.clone()),
        app.gender.clone(),
        Some(app.date_of_birth.clone()),
        Some(app.passport_no.clone()),
        Some(app.whatsapp_number.clone()),
        app.email.clone(),
        Some(app.destination.clone()),
        Some(app.visa_type.clone()),
        Some(app.fees.to_string()),
        Some(app.costs.to_string()),
        Some(app.profit().to_string()),
        Some(app.application_status.to_string()),
        Some(app.agent_id.clone()),
        Some(app.submitted_at.to_rfc3339()),
        Some(app.last_updated_at.to_rfc3339()),
    ]
}

/// CSV text for applications, in the order given.
pub fn applications_csv<'a, I>(applications: I) -> String
where
    I: IntoIterator<Item = &'a VisaApplication>,
{
    let rows: Vec<Vec<Option<String>>> = applications.into_iter().map(application_row).collect();
    render_csv(&APPLICATION_COLUMNS, &rows)
}

/// CSV text for the monthly history.
pub fn monthly_csv(buckets: &[MonthlyBucket]) -> String {
    let rows: Vec<Vec<Option<String>>> = buckets
        .iter()
        .map(|b| {
            vec![
                Some(b.label.clone()),
                Some(b.year.to_string()),
                Some(b.applications.to_string()),
                Some(b.revenue.to_string()),
                Some(b.success_rate.to_string()),
                Some(b.pending.to_string()),
            ]
        })
        .collect();
    render_csv(&MONTHLY_COLUMNS, &rows)
}

/// Download of the (already filtered and sorted) application table.
pub fn export_applications<'a, I>(applications: I, window: Option<TimeWindow>) -> CsvDownload
where
    I: IntoIterator<Item = &'a VisaApplication>,
{
    let filename = match window {
        Some(window) => format!("applications_{}.csv", window),
        None => "applications.csv".to_string(),
    };
    CsvDownload {
        filename,
        content: applications_csv(applications),
    }
}

/// Download of the monthly analytics history.
pub fn export_monthly(buckets: &[MonthlyBucket], window: TimeWindow) -> CsvDownload {
    CsvDownload {
        filename: format!("analytics_{}.csv", window),
        content: monthly_csv(buckets),
    }
}
