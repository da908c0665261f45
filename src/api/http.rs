use std::time::Duration;

use serde_json::Value;
use tracing::debug;
use ureq::{Agent, RequestBuilder};

use super::{decode_envelope, ReportApi};
use crate::config::{ApiSettings, CompanyInfo};
use crate::error::{ReportError, Result};
use crate::report::{CustomReportRequest, Filters, ReportPayload, ReportSummary, ReportType};

/// `ReportApi` over HTTP with a blocking ureq agent
pub struct HttpApi {
    agent: Agent,
    base_url: String,
    token: Option<String>,
}

impl HttpApi {
    pub fn new(settings: &ApiSettings) -> Self {
        let agent: Agent = Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(settings.timeout_secs)))
            .build()
            .into();

        Self {
            agent,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            token: settings
                .token
                .clone()
                .filter(|token| !token.trim().is_empty()),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorize<B>(&self, request: RequestBuilder<B>) -> RequestBuilder<B> {
        match &self.token {
            Some(token) => request.header("Authorization", format!("Bearer {token}")),
            None => request,
        }
    }

    fn get_json(&self, path: &str, query: &[(&'static str, String)]) -> Result<String> {
        let mut request = self.authorize(self.agent.get(&self.url(path)));
        for (key, value) in query {
            request = request.query(*key, value);
        }
        debug!(path, params = query.len(), "GET");

        let body = request.call()?.body_mut().read_to_string()?;
        Ok(body)
    }

    fn post_json(&self, path: &str, payload: &impl serde::Serialize) -> Result<String> {
        let body = serde_json::to_string(payload)?;
        debug!(path, "POST");

        let response_body = self
            .authorize(self.agent.post(&self.url(path)))
            .header("Content-Type", "application/json")
            .send(body.as_bytes())?
            .body_mut()
            .read_to_string()?;
        Ok(response_body)
    }
}

fn payload_from(endpoint: &str, report_type: ReportType, data: Value) -> Result<ReportPayload> {
    ReportPayload::from_value(report_type, data).map_err(|e| ReportError::InvalidResponse {
        endpoint: endpoint.to_string(),
        reason: e.to_string(),
    })
}

impl ReportApi for HttpApi {
    fn fetch_report(&self, report_type: ReportType, filters: &Filters) -> Result<ReportPayload> {
        let path = format!("/reports/{}", report_type.as_str());
        let body = self.get_json(&path, &filters.query_pairs())?;
        let data: Value = decode_envelope(&path, &body)?;
        payload_from(&path, report_type, data)
    }

    fn create_custom_report(&self, request: &CustomReportRequest) -> Result<ReportPayload> {
        let path = "/reports/custom";
        let body = self.post_json(path, request)?;
        let data: Value = decode_envelope(path, &body)?;
        payload_from(path, ReportType::Custom, data)
    }

    fn list_reports(&self) -> Result<Vec<ReportSummary>> {
        let path = "/reports";
        let body = self.get_json(path, &[])?;
        decode_envelope(path, &body)
    }

    fn company_info(&self) -> Result<CompanyInfo> {
        let path = "/settings/company";
        let body = self.get_json(path, &[])?;
        decode_envelope(path, &body)
    }

    fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>> {
        // Relative logo paths are resolved against the API base URL
        let url = if url.starts_with("http://") || url.starts_with("https://") {
            url.to_string()
        } else {
            self.url(&format!("/{}", url.trim_start_matches('/')))
        };
        debug!(%url, "GET asset");

        let bytes = self.agent.get(&url).call()?.body_mut().read_to_vec()?;
        Ok(bytes)
    }
}
