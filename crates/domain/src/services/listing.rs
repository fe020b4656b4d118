//! Search, status filter and sort over an in-memory application list.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::str::FromStr;

use super::aggregation::window_start;
use crate::models::{ApplicationStatus, TimeWindow, VisaApplication};

/// Table sort order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Newest,
    Oldest,
    Name,
    Status,
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "" | "newest" => Ok(SortOrder::Newest),
            "oldest" => Ok(SortOrder::Oldest),
            "name" => Ok(SortOrder::Name),
            "status" => Ok(SortOrder::Status),
            _ => Err(format!("Unknown sort order: {}", s)),
        }
    }
}

/// Exact status filter, or every status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum StatusFilter {
    #[default]
    All,
    Only(ApplicationStatus),
}

impl StatusFilter {
    pub fn matches(&self, status: ApplicationStatus) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Only(wanted) => *wanted == status,
        }
    }
}

impl FromStr for StatusFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("all") {
            return Ok(StatusFilter::All);
        }
        trimmed.parse().map(StatusFilter::Only)
    }
}

impl TryFrom<String> for StatusFilter {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<StatusFilter> for String {
    fn from(filter: StatusFilter) -> Self {
        match filter {
            StatusFilter::All => "ALL".to_string(),
            StatusFilter::Only(status) => status.as_str().to_string(),
        }
    }
}

/// Everything that shapes the visible table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ListQuery {
    pub search: String,
    pub status: StatusFilter,
    pub sort: SortOrder,
    /// Restricts to applications submitted since the window start.
    pub window: Option<TimeWindow>,
}

/// Case-insensitive substring match on first name, last name, passport
/// number or destination. An empty query matches everything.
pub fn matches_search(application: &VisaApplication, search: &str) -> bool {
    let needle = search.trim().to_lowercase();
    if needle.is_empty() {
        return true;
    }
    [
        &application.first_name,
        &application.last_name,
        &application.passport_no,
        &application.destination,
    ]
    .iter()
    .any(|field| field.to_lowercase().contains(&needle))
}

fn compare_names(a: &VisaApplication, b: &VisaApplication) -> Ordering {
    let left = a.full_name();
    let right = b.full_name();
    left.to_lowercase()
        .cmp(&right.to_lowercase())
        .then_with(|| left.cmp(&right))
}

/// Filters then sorts, recomputed from the source list on every call.
pub fn apply<'a>(
    records: &'a [VisaApplication],
    query: &ListQuery,
    now: DateTime<FixedOffset>,
) -> Vec<&'a VisaApplication> {
    let since = query.window.map(|window| window_start(window, now));

    let mut rows: Vec<&VisaApplication> = records
        .iter()
        .filter(|r| since.map_or(true, |start| r.submitted_at >= start))
        .filter(|r| matches_search(r, &query.search))
        .filter(|r| query.status.matches(r.application_status))
        .collect();

    match query.sort {
        SortOrder::Newest => rows.sort_by(|a, b| b.submitted_at.cmp(&a.submitted_at)),
        SortOrder::Oldest => rows.sort_by(|a, b| a.submitted_at.cmp(&b.submitted_at)),
        SortOrder::Name => rows.sort_by(|a, b| compare_names(a, b)),
        SortOrder::Status => rows.sort_by(|a, b| {
            a.application_status
                .as_str()
                .cmp(b.application_status.as_str())
        }),
    }
    rows
}
