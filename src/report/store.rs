use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::{DateRange, Filters, Report, ReportSummary};

/// Report state shown to the user. Holds data only; the aggregator fills it.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ReportStore {
    #[serde(default)]
    reports: Vec<ReportSummary>,
    #[serde(default)]
    reports_loaded: bool,
    /// Last aggregation as fetched (used for export)
    #[serde(default)]
    report_data: Option<Report>,
    /// Last aggregation with derived fields (used for display)
    #[serde(default)]
    generated_report: Option<Report>,
    #[serde(default)]
    date_range: Option<DateRange>,
    #[serde(default)]
    filters: Filters,
    #[serde(skip)]
    loading: bool,
    #[serde(default)]
    error: Option<String>,
}

/// Counts of historical reports by type
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReportStats {
    pub total: usize,
    pub by_type: BTreeMap<String, usize>,
}

impl ReportStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reports(&self) -> &[ReportSummary] {
        &self.reports
    }

    pub fn reports_loaded(&self) -> bool {
        self.reports_loaded
    }

    pub fn report_data(&self) -> Option<&Report> {
        self.report_data.as_ref()
    }

    pub fn generated_report(&self) -> Option<&Report> {
        self.generated_report.as_ref()
    }

    /// The report an export works from: the display report, else the raw one
    pub fn current_report(&self) -> Option<&Report> {
        self.generated_report.as_ref().or(self.report_data.as_ref())
    }

    pub fn date_range(&self) -> Option<DateRange> {
        self.date_range
    }

    pub fn filters(&self) -> &Filters {
        &self.filters
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn set_date_range(&mut self, range: Option<DateRange>) {
        self.date_range = range;
    }

    pub fn set_filters(&mut self, filters: Filters) {
        self.filters = filters;
    }

    pub fn set_error(&mut self, message: impl Into<String>) {
        self.error = Some(message.into());
    }

    pub fn clear_error(&mut self) {
        self.error = None;
    }

    pub fn stats(&self) -> ReportStats {
        let mut by_type = BTreeMap::new();
        for report in &self.reports {
            let key = if report.report_type.is_empty() {
                "unknown".to_string()
            } else {
                report.report_type.to_ascii_lowercase()
            };
            *by_type.entry(key).or_insert(0) += 1;
        }
        ReportStats {
            total: self.reports.len(),
            by_type,
        }
    }

    pub(crate) fn begin_request(&mut self) {
        self.loading = true;
        self.error = None;
    }

    pub(crate) fn end_request(&mut self) {
        self.loading = false;
    }

    pub(crate) fn store_report(&mut self, raw: Report, enriched: Report) {
        self.report_data = Some(raw);
        self.generated_report = Some(enriched);
    }

    /// Record a failed generation; display data is cleared
    pub(crate) fn fail_report(&mut self, message: String) {
        self.error = Some(message);
        self.report_data = None;
        self.generated_report = None;
    }

    pub(crate) fn set_reports(&mut self, reports: Vec<ReportSummary>) {
        self.reports = reports;
        self.reports_loaded = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(report_type: &str) -> ReportSummary {
        ReportSummary {
            id: serde_json::json!(1),
            report_type: report_type.to_string(),
            title: "Report".to_string(),
            description: None,
            created_at: None,
        }
    }

    #[test]
    fn test_stats_counts_by_type() {
        let mut store = ReportStore::new();
        store.set_reports(vec![
            summary("financial"),
            summary("Financial"),
            summary("occupancy"),
            summary(""),
        ]);

        let stats = store.stats();
        assert_eq!(stats.total, 4);
        assert_eq!(stats.by_type.get("financial"), Some(&2));
        assert_eq!(stats.by_type.get("occupancy"), Some(&1));
        assert_eq!(stats.by_type.get("unknown"), Some(&1));
    }

    #[test]
    fn test_empty_store_has_no_current_report() {
        let store = ReportStore::new();
        assert!(store.current_report().is_none());
        assert!(!store.is_loading());
        assert!(store.error().is_none());
    }
}
