use chrono::Utc;
use tracing::{debug, info};

use super::metrics::enrich_financial;
use super::{CustomReportRequest, Filters, Report, ReportPayload, ReportStore, ReportType};
use crate::api::ReportApi;
use crate::error::Result;

pub const CUSTOM_NEEDS_REQUEST: &str =
    "Custom reports are built from a title and filters, not fetched by type";

/// Fetches report data from the backend and records the outcome in a `ReportStore`
pub struct ReportAggregator<'a, A: ReportApi + ?Sized> {
    api: &'a A,
}

impl<'a, A: ReportApi + ?Sized> ReportAggregator<'a, A> {
    pub fn new(api: &'a A) -> Self {
        Self { api }
    }

    pub fn generate_financial_report(
        &self,
        store: &mut ReportStore,
        filters: &Filters,
    ) -> Option<Report> {
        self.generate_report(store, ReportType::Financial, filters)
    }

    pub fn generate_occupancy_report(
        &self,
        store: &mut ReportStore,
        filters: &Filters,
    ) -> Option<Report> {
        self.generate_report(store, ReportType::Occupancy, filters)
    }

    pub fn generate_payment_report(
        &self,
        store: &mut ReportStore,
        filters: &Filters,
    ) -> Option<Report> {
        self.generate_report(store, ReportType::Payment, filters)
    }

    pub fn generate_revenue_report(
        &self,
        store: &mut ReportStore,
        filters: &Filters,
    ) -> Option<Report> {
        self.generate_report(store, ReportType::Revenue, filters)
    }

    /// Generate any canned report type; custom reports go through `generate_custom_report`
    pub fn generate_report(
        &self,
        store: &mut ReportStore,
        report_type: ReportType,
        filters: &Filters,
    ) -> Option<Report> {
        if report_type == ReportType::Custom {
            debug!("Refusing to generate a custom report without a request");
            store.set_error(CUSTOM_NEEDS_REQUEST);
            return None;
        }

        let title = report_type.title();
        self.run(store, report_type, |api| {
            let payload = api.fetch_report(report_type, filters)?;
            Ok(stamp(title, None, filters.clone(), payload))
        })
    }

    /// Report built from user-authored title, description and filter fields
    pub fn generate_custom_report(
        &self,
        store: &mut ReportStore,
        request: &CustomReportRequest,
    ) -> Option<Report> {
        self.run(store, ReportType::Custom, |api| {
            let payload = api.create_custom_report(request)?;
            let filters = custom_filters(request);
            Ok(stamp(
                request.title.clone(),
                request.description.clone(),
                filters,
                payload,
            ))
        })
    }

    /// Load the historical report list once; `force` re-fetches it
    pub fn load_reports(&self, store: &mut ReportStore, force: bool) -> Result<()> {
        if store.reports_loaded() && !force {
            return Ok(());
        }

        store.begin_request();
        let outcome = self.api.list_reports();
        store.end_request();

        match outcome {
            Ok(reports) => {
                info!(count = reports.len(), "Loaded report history");
                store.set_reports(reports);
                Ok(())
            }
            Err(e) => {
                debug!(error = %e, "Failed to load report history");
                store.set_error(format!("Failed to load reports: {e}"));
                Err(e)
            }
        }
    }

    fn run<F>(&self, store: &mut ReportStore, report_type: ReportType, fetch: F) -> Option<Report>
    where
        F: FnOnce(&A) -> Result<Report>,
    {
        store.begin_request();
        let outcome = fetch(self.api);
        // Cleared on every path before the outcome is applied
        store.end_request();

        match outcome {
            Ok(raw) => {
                let enriched = enrich(&raw);
                info!(report_type = %report_type, id = %raw.id, "Generated report");
                store.store_report(raw, enriched.clone());
                Some(enriched)
            }
            Err(e) => {
                debug!(report_type = %report_type, error = %e, "Failed to generate report");
                store.fail_report(format!("Failed to generate {report_type} report: {e}"));
                None
            }
        }
    }
}

fn stamp(
    title: String,
    description: Option<String>,
    filters: Filters,
    payload: ReportPayload,
) -> Report {
    let generated_at = Utc::now();
    let report_type = payload.report_type();
    Report {
        id: format!("{}-{}", report_type, generated_at.timestamp_millis()),
        title,
        description,
        period: filters.period.clone(),
        generated_at,
        filters,
        payload,
    }
}

/// Derived figures for display; only financial reports carry any
fn enrich(raw: &Report) -> Report {
    match &raw.payload {
        ReportPayload::Financial(financial) => Report {
            payload: ReportPayload::Financial(enrich_financial(financial)),
            ..raw.clone()
        },
        _ => raw.clone(),
    }
}

/// Pick the canned filter fields out of a custom report's free-form filters
fn custom_filters(request: &CustomReportRequest) -> Filters {
    let text = |key: &str| {
        request
            .filters
            .get(key)
            .and_then(|v| v.as_str())
            .map(str::to_string)
    };
    let date = |key: &str| text(key).and_then(|s| crate::format::parse_date_flexible(&s));

    Filters {
        period: text("period"),
        start_date: date("start_date"),
        end_date: date("end_date"),
        property_id: text("property_id"),
        group_by: text("groupBy"),
    }
}
