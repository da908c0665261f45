pub mod api;
pub mod branding;
pub mod config;
pub mod error;
pub mod export;
pub mod format;
pub mod report;

pub use api::{HttpApi, ReportApi};
pub use branding::{BrandingCache, CachedCompany, Clock, SystemClock};
pub use config::{CompanyInfo, Config, Session};
pub use error::{ReportError, Result};
pub use export::{Artifact, ExportFormat, ExportRenderer, ExportRequest, ReportRef};
pub use report::{
    CustomReportRequest, Filters, Report, ReportAggregator, ReportPayload, ReportStore, ReportType,
};
