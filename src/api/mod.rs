//! Boundary to the property-management REST backend.
//!
//! Every response uses one envelope, `{success, data, message}`, which is
//! validated here so callers only ever see typed payloads or a typed error.

mod http;

pub use http::HttpApi;

use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::config::CompanyInfo;
use crate::error::{ReportError, Result};
use crate::report::{CustomReportRequest, Filters, ReportPayload, ReportSummary, ReportType};

/// Operations the report pipeline needs from the backend
pub trait ReportApi {
    /// Fetch the payload of a canned report type
    fn fetch_report(&self, report_type: ReportType, filters: &Filters) -> Result<ReportPayload>;

    /// Create a report from user-authored parameters
    fn create_custom_report(&self, request: &CustomReportRequest) -> Result<ReportPayload>;

    /// Historical report metadata
    fn list_reports(&self) -> Result<Vec<ReportSummary>>;

    /// Organization branding from the settings endpoint
    fn company_info(&self) -> Result<CompanyInfo>;

    /// Raw bytes of an asset such as the company logo
    fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>>;
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    #[serde(default = "default_success")]
    success: bool,
    data: Option<T>,
    #[serde(default)]
    message: Option<String>,
}

fn default_success() -> bool {
    true
}

/// Parse a response body and unwrap its `data`
pub(crate) fn decode_envelope<T: DeserializeOwned>(endpoint: &str, body: &str) -> Result<T> {
    let envelope: Envelope<T> =
        serde_json::from_str(body).map_err(|e| ReportError::InvalidResponse {
            endpoint: endpoint.to_string(),
            reason: e.to_string(),
        })?;

    if !envelope.success {
        return Err(ReportError::Api(
            envelope
                .message
                .unwrap_or_else(|| format!("{endpoint} reported failure")),
        ));
    }

    envelope.data.ok_or_else(|| ReportError::InvalidResponse {
        endpoint: endpoint.to_string(),
        reason: "response has no data".to_string(),
    })
}
