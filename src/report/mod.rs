mod aggregator;
pub mod metrics;
mod payload;
mod store;

pub use aggregator::ReportAggregator;
pub use payload::{
    Amount, CustomPayload, ExpenseLine, FinancialPayload, FinancialSummary, OccupancyOverview,
    OccupancyPayload, OccupancyTrend, PaymentPayload, PaymentRecord, PropertyOccupancy,
    PropertyRevenue, Record, ReportPayload, RevenueBreakdown, RevenueOverview, RevenuePayload,
    Transaction,
};
pub use store::{ReportStats, ReportStore};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ReportError;
use crate::format::title_case;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportType {
    Financial,
    Occupancy,
    Payment,
    Revenue,
    Custom,
}

impl ReportType {
    pub const ALL: [ReportType; 5] = [
        ReportType::Financial,
        ReportType::Occupancy,
        ReportType::Payment,
        ReportType::Revenue,
        ReportType::Custom,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ReportType::Financial => "financial",
            ReportType::Occupancy => "occupancy",
            ReportType::Payment => "payment",
            ReportType::Revenue => "revenue",
            ReportType::Custom => "custom",
        }
    }

    /// Document title, e.g. "Financial Report"
    pub fn title(self) -> String {
        format!("{} Report", title_case(self.as_str()))
    }
}

impl fmt::Display for ReportType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReportType {
    type Err = ReportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        ReportType::ALL
            .into_iter()
            .find(|t| t.as_str() == normalized)
            .ok_or_else(|| ReportError::UnknownReportType(s.to_string()))
    }
}

/// User-supplied constraints for one generate/export action
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Filters {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub period: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub property_id: Option<String>,
    #[serde(default, rename = "groupBy", skip_serializing_if = "Option::is_none")]
    pub group_by: Option<String>,
}

impl Filters {
    pub fn is_empty(&self) -> bool {
        self == &Filters::default()
    }

    /// Query parameters for the report endpoints, only for fields that are set
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(period) = &self.period {
            pairs.push(("period", period.clone()));
        }
        if let Some(start) = self.start_date {
            pairs.push(("start_date", start.format("%Y-%m-%d").to_string()));
        }
        if let Some(end) = self.end_date {
            pairs.push(("end_date", end.format("%Y-%m-%d").to_string()));
        }
        if let Some(property_id) = &self.property_id {
            pairs.push(("property_id", property_id.clone()));
        }
        if let Some(group_by) = &self.group_by {
            pairs.push(("groupBy", group_by.clone()));
        }
        pairs
    }

    /// Field-by-field: values set on `self` win, gaps are filled from `fallback`
    pub fn merged_with(&self, fallback: &Filters) -> Filters {
        Filters {
            period: self.period.clone().or_else(|| fallback.period.clone()),
            start_date: self.start_date.or(fallback.start_date),
            end_date: self.end_date.or(fallback.end_date),
            property_id: self
                .property_id
                .clone()
                .or_else(|| fallback.property_id.clone()),
            group_by: self.group_by.clone().or_else(|| fallback.group_by.clone()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// A generated, typed snapshot of aggregated business data
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Report {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub period: Option<String>,
    pub generated_at: DateTime<Utc>,
    #[serde(default)]
    pub filters: Filters,
    pub payload: ReportPayload,
}

impl Report {
    pub fn report_type(&self) -> ReportType {
        self.payload.report_type()
    }
}

/// Historical report metadata from the list endpoint
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ReportSummary {
    #[serde(default)]
    pub id: serde_json::Value,
    #[serde(rename = "type", alias = "report_type", default)]
    pub report_type: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, alias = "createdAt", alias = "generated_at")]
    pub created_at: Option<String>,
}

/// Body of the custom report endpoint
#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
pub struct CustomReportRequest {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Data source the custom report draws from, when the author picked one
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default)]
    pub filters: serde_json::Map<String, serde_json::Value>,
}
