//! Analytics domain models.
//!
//! Figures shown on the analytics view: period summaries, comparisons against
//! the preceding period, metric cards and the 12-month history.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::application::ApplicationStatus;

/// Placeholder shown instead of a percentage when the previous value is zero.
pub const NO_CHANGE_PLACEHOLDER: &str = "—";

/// Named relative time range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeWindow {
    Today,
    Week,
    #[default]
    Month,
    Year,
}

impl TimeWindow {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimeWindow::Today => "today",
            TimeWindow::Week => "week",
            TimeWindow::Month => "month",
            TimeWindow::Year => "year",
        }
    }

    /// Comparison caption for metric cards.
    pub fn comparison_label(&self) -> &'static str {
        match self {
            TimeWindow::Today => "vs Yesterday",
            TimeWindow::Week => "vs last week",
            TimeWindow::Month => "vs last month",
            TimeWindow::Year => "vs last year",
        }
    }
}

impl FromStr for TimeWindow {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "today" => Ok(TimeWindow::Today),
            "week" => Ok(TimeWindow::Week),
            "month" => Ok(TimeWindow::Month),
            "year" => Ok(TimeWindow::Year),
            _ => Err(format!("Unknown time window: {}", s)),
        }
    }
}

impl std::fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Half-open time range `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PeriodRange {
    pub start: DateTime<FixedOffset>,
    pub end: DateTime<FixedOffset>,
}

impl PeriodRange {
    pub fn contains(&self, instant: DateTime<FixedOffset>) -> bool {
        instant >= self.start && instant < self.end
    }
}

/// Aggregated figures for one set of applications.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct PeriodSummary {
    pub total_applications: u64,
    pub approved_count: u64,
    pub pending_count: u64,
    pub rejected_count: u64,
    /// Profit over approved applications.
    pub total_revenue: f64,
    /// Profit over pending applications.
    pub pending_revenue: f64,
    /// Rounded approved share in percent; 0 for an empty set.
    pub success_rate: u32,
}

impl PeriodSummary {
    pub fn count_for(&self, status: ApplicationStatus) -> u64 {
        match status {
            ApplicationStatus::Pending => self.pending_count,
            ApplicationStatus::Approved => self.approved_count,
            ApplicationStatus::Rejected => self.rejected_count,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Up,
    Down,
}

/// Current value against the previous period.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct MetricComparison {
    pub current: f64,
    pub previous: f64,
    pub delta: f64,
    /// `None` when the previous value is zero.
    pub delta_percent: Option<f64>,
    pub delta_percent_label: String,
    pub trend: Trend,
}

/// One card on the analytics view.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct MetricCard {
    pub key: String,
    pub title: String,
    pub value: f64,
    pub comparison: MetricComparison,
    /// Percentage change text, or the placeholder.
    pub change_label: String,
    pub period_label: String,
}

/// Slice of the status pie chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct StatusSlice {
    pub status: ApplicationStatus,
    pub count: u64,
}

/// One calendar month of history.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct MonthlyBucket {
    pub year: i32,
    pub month: u32,
    /// Short month name, e.g. "Jan".
    pub label: String,
    pub applications: u64,
    /// Profit over approved applications submitted in the month.
    pub revenue: f64,
    pub success_rate: u32,
    pub pending: u64,
}

/// Everything the analytics view needs for one window.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct AnalyticsReport {
    pub window: TimeWindow,
    pub current_period: PeriodRange,
    pub previous_period: PeriodRange,
    pub current: PeriodSummary,
    pub previous: PeriodSummary,
    pub cards: Vec<MetricCard>,
    pub status_breakdown: Vec<StatusSlice>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_time_window_parse() {
        assert_eq!("Week".parse::<TimeWindow>().unwrap(), TimeWindow::Week);
        assert!("decade".parse::<TimeWindow>().is_err());
        assert_eq!(TimeWindow::default(), TimeWindow::Month);
    }

    #[test]
    fn test_time_window_labels() {
        assert_eq!(TimeWindow::Today.comparison_label(), "vs Yesterday");
        assert_eq!(TimeWindow::Year.comparison_label(), "vs last year");
    }

    #[test]
    fn test_time_window_serialization() {
        let json = serde_json::to_string(&TimeWindow::Today).unwrap();
        assert_eq!(json, "\"today\"");
    }

    #[test]
    fn test_summary_count_for() {
        let summary = PeriodSummary {
            total_applications: 3,
            approved_count: 1,
            pending_count: 2,
            ..Default::default()
        };
        assert_eq!(summary.count_for(ApplicationStatus::Pending), 2);
        assert_eq!(summary.count_for(ApplicationStatus::Rejected), 0);
    }
}
