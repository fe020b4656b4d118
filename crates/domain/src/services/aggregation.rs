//! Aggregation engine for the analytics view.
//!
//! All calendar arithmetic happens in a caller-supplied fixed UTC offset, so a
//! "day" or "month" means the operator's local day or month.

use chrono::{DateTime, Datelike, Duration, FixedOffset, NaiveDate, NaiveDateTime, TimeZone};

use crate::models::{
    AnalyticsReport, ApplicationStatus, MetricCard, MetricComparison, MonthlyBucket, PeriodRange,
    PeriodSummary, StatusSlice, TimeWindow, Trend, VisaApplication,
};
use crate::models::analytics::NO_CHANGE_PLACEHOLDER;

/// Number of buckets in the monthly history.
pub const HISTORY_MONTHS: i32 = 12;

const MONTH_LABELS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

fn at_local_midnight(date: NaiveDate, offset: FixedOffset) -> DateTime<FixedOffset> {
    let local: NaiveDateTime = date.and_time(chrono::NaiveTime::MIN);
    let utc = local - Duration::seconds(i64::from(offset.local_minus_utc()));
    offset.from_utc_datetime(&utc)
}

/// First day of the month `months_back` months before (`year`, `month`).
fn month_start(year: i32, month: u32, months_back: i32) -> (i32, u32) {
    let index = year * 12 + (month as i32 - 1) - months_back;
    (index.div_euclid(12), index.rem_euclid(12) as u32 + 1)
}

fn first_of_month(year: i32, month: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, 1).unwrap_or(NaiveDate::MIN)
}

/// Inclusive start of the window containing `now`.
pub fn window_start(window: TimeWindow, now: DateTime<FixedOffset>) -> DateTime<FixedOffset> {
    let offset = *now.offset();
    let today = now.date_naive();
    match window {
        TimeWindow::Today => at_local_midnight(today, offset),
        TimeWindow::Week => now - Duration::days(7),
        TimeWindow::Month => at_local_midnight(first_of_month(today.year(), today.month()), offset),
        TimeWindow::Year => at_local_midnight(first_of_month(today.year(), 1), offset),
    }
}

/// Range of the current window: from its start up to `now`.
pub fn current_period(window: TimeWindow, now: DateTime<FixedOffset>) -> PeriodRange {
    PeriodRange {
        start: window_start(window, now),
        end: now,
    }
}

/// The window immediately preceding the current one, ending at its start.
pub fn previous_period(window: TimeWindow, now: DateTime<FixedOffset>) -> PeriodRange {
    let end = window_start(window, now);
    let offset = *now.offset();
    let start = match window {
        TimeWindow::Today => at_local_midnight(end.date_naive() - Duration::days(1), offset),
        TimeWindow::Week => end - Duration::days(7),
        TimeWindow::Month => {
            let (year, month) = month_start(end.year(), end.month(), 1);
            at_local_midnight(first_of_month(year, month), offset)
        }
        TimeWindow::Year => at_local_midnight(first_of_month(end.year() - 1, 1), offset),
    };
    PeriodRange { start, end }
}

/// Records submitted at or after the start of the window.
pub fn in_window<'a>(
    records: &'a [VisaApplication],
    window: TimeWindow,
    now: DateTime<FixedOffset>,
) -> Vec<&'a VisaApplication> {
    let start = window_start(window, now);
    records.iter().filter(|r| r.submitted_at >= start).collect()
}

/// Records submitted inside the half-open range.
pub fn in_range<'a>(records: &'a [VisaApplication], range: &PeriodRange) -> Vec<&'a VisaApplication> {
    records
        .iter()
        .filter(|r| range.contains(r.submitted_at.with_timezone(&range.start.timezone())))
        .collect()
}

/// Rounded approved share in percent. Zero when there are no records.
pub fn success_rate(approved: u64, total: u64) -> u32 {
    if total == 0 {
        return 0;
    }
    ((approved as f64 / total as f64) * 100.0).round() as u32
}

/// Counts and profit sums for a set of records.
pub fn summarize<'a, I>(records: I) -> PeriodSummary
where
    I: IntoIterator<Item = &'a VisaApplication>,
{
    let mut summary = PeriodSummary::default();
    for record in records {
        summary.total_applications += 1;
        match record.application_status {
            ApplicationStatus::Approved => {
                summary.approved_count += 1;
                summary.total_revenue += record.profit();
            }
            ApplicationStatus::Pending => {
                summary.pending_count += 1;
                summary.pending_revenue += record.profit();
            }
            ApplicationStatus::Rejected => summary.rejected_count += 1,
        }
    }
    summary.success_rate = success_rate(summary.approved_count, summary.total_applications);
    summary
}

/// Compares a figure against its previous-period value.
///
/// The percentage is left undefined when the previous value is zero.
pub fn compare(current: f64, previous: f64) -> MetricComparison {
    let delta = current - previous;
    let delta_percent = if previous == 0.0 {
        None
    } else {
        Some(delta / previous * 100.0).filter(|p| p.is_finite())
    };
    let delta_percent_label = delta_percent
        .map(|p| format!("{:.1}%", p))
        .unwrap_or_else(|| NO_CHANGE_PLACEHOLDER.to_string());

    MetricComparison {
        current,
        previous,
        delta,
        delta_percent,
        delta_percent_label,
        trend: if delta >= 0.0 { Trend::Up } else { Trend::Down },
    }
}

fn card(
    key: &str,
    title: &str,
    comparison: MetricComparison,
    show_percent: bool,
    period_label: &str,
) -> MetricCard {
    let change_label = if show_percent {
        comparison.delta_percent_label.clone()
    } else {
        NO_CHANGE_PLACEHOLDER.to_string()
    };
    MetricCard {
        key: key.to_string(),
        title: title.to_string(),
        value: comparison.current,
        comparison,
        change_label,
        period_label: period_label.to_string(),
    }
}

/// The four headline cards of the analytics view.
///
/// Success rate changes are shown in percentage points, without a
/// percentage-of-percentage figure.
pub fn metric_cards(
    window: TimeWindow,
    current: &PeriodSummary,
    previous: &PeriodSummary,
) -> Vec<MetricCard> {
    let period = window.comparison_label();
    vec![
        card(
            "total_applications",
            "Total Applications",
            compare(
                current.total_applications as f64,
                previous.total_applications as f64,
            ),
            true,
            period,
        ),
        card(
            "pending_revenue",
            "Pending Revenue",
            compare(current.pending_revenue, previous.pending_revenue),
            true,
            "Awaiting approval",
        ),
        card(
            "success_rate",
            "Success Rate",
            compare(
                f64::from(current.success_rate),
                f64::from(previous.success_rate),
            ),
            false,
            period,
        ),
        card(
            "total_profit",
            "Total Profit",
            compare(current.total_revenue, previous.total_revenue),
            true,
            period,
        ),
    ]
}

/// Status counts for the pie chart.
pub fn status_breakdown(summary: &PeriodSummary) -> Vec<StatusSlice> {
    [
        ApplicationStatus::Approved,
        ApplicationStatus::Pending,
        ApplicationStatus::Rejected,
    ]
    .into_iter()
    .map(|status| StatusSlice {
        status,
        count: summary.count_for(status),
    })
    .collect()
}

/// Twelve calendar months ending at the month of `now`, oldest first.
///
/// Computed over the full record set regardless of any selected window.
pub fn monthly_history(
    records: &[VisaApplication],
    now: DateTime<FixedOffset>,
) -> Vec<MonthlyBucket> {
    let offset = *now.offset();
    (0..HISTORY_MONTHS)
        .rev()
        .map(|months_back| {
            let (year, month) = month_start(now.year(), now.month(), months_back);
            let (next_year, next_month) = month_start(year, month, -1);
            let range = PeriodRange {
                start: at_local_midnight(first_of_month(year, month), offset),
                end: at_local_midnight(first_of_month(next_year, next_month), offset),
            };
            let summary = summarize(in_range(records, &range));
            MonthlyBucket {
                year,
                month,
                label: MONTH_LABELS[(month - 1) as usize].to_string(),
                applications: summary.total_applications,
                revenue: summary.total_revenue,
                success_rate: summary.success_rate,
                pending: summary.pending_count,
            }
        })
        .collect()
}

/// Builds the full analytics view for one window.
pub fn build_report(
    records: &[VisaApplication],
    window: TimeWindow,
    now: DateTime<FixedOffset>,
) -> AnalyticsReport {
    let current_period = current_period(window, now);
    let previous_period = previous_period(window, now);

    let current = summarize(in_window(records, window, now));
    let previous = summarize(in_range(records, &previous_period));

    AnalyticsReport {
        window,
        current_period,
        previous_period,
        cards: metric_cards(window, &current, &previous),
        status_breakdown: status_breakdown(&current),
        current,
        previous,
    }
}
