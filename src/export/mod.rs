//! Export Renderer: turns the current report into a PDF, spreadsheet, or CSV file.
//!
//! The artifact is built fully in memory first; `Artifact::save` only ever
//! renames a completely written file into place.

mod csv;
pub mod document;
mod pdf;
pub mod table;
mod xlsx;

pub use self::csv::render_csv;
pub use document::{Document, ImageFormat, Logo, SummaryLine};
pub use pdf::render_pdf;
pub use table::{extract_table, Cell, Extraction, TableData, NO_DATA_MESSAGE};
pub use xlsx::render_xlsx;

use chrono::{NaiveDate, Utc};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, info, warn};

use crate::api::ReportApi;
use crate::branding::{BrandingCache, Clock};
use crate::error::{ReportError, Result};
use crate::report::{Filters, Report, ReportStore, ReportType};

pub const NO_REPORT_MESSAGE: &str = "No report has been generated yet. Generate a report first.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Pdf,
    Excel,
    Csv,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Pdf => "pdf",
            ExportFormat::Excel => "xlsx",
            ExportFormat::Csv => "csv",
        }
    }

    pub fn is_branded(self) -> bool {
        !matches!(self, ExportFormat::Csv)
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ExportFormat::Pdf => "pdf",
            ExportFormat::Excel => "excel",
            ExportFormat::Csv => "csv",
        })
    }
}

impl FromStr for ExportFormat {
    type Err = ReportError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pdf" => Ok(ExportFormat::Pdf),
            "excel" | "xlsx" => Ok(ExportFormat::Excel),
            "csv" => Ok(ExportFormat::Csv),
            _ => Err(ReportError::UnknownFormat(s.to_string())),
        }
    }
}

/// Which report an export refers to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportRef {
    /// The current report, labelled with its own type
    Current,
    /// The current report, labelled and tabulated as the given type
    Type(ReportType),
    /// The current report, which must carry this id
    Id(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExportRequest {
    pub format: ExportFormat,
    pub report: ReportRef,
    pub filters: Filters,
}

impl ExportRequest {
    pub fn new(format: ExportFormat, report: ReportRef) -> Self {
        Self {
            format,
            report,
            filters: Filters::default(),
        }
    }

    pub fn with_filters(mut self, filters: Filters) -> Self {
        self.filters = filters;
        self
    }
}

/// A finished export, ready to be written
#[derive(Debug, Clone, PartialEq)]
pub struct Artifact {
    pub filename: String,
    pub bytes: Vec<u8>,
}

impl Artifact {
    /// Write into `dir` through a temporary sibling, then rename into place
    pub fn save(&self, dir: &Path) -> Result<PathBuf> {
        std::fs::create_dir_all(dir)?;
        let target = dir.join(&self.filename);
        let tmp = dir.join(format!(".{}.part", self.filename));

        if let Err(e) = std::fs::write(&tmp, &self.bytes) {
            let _ = std::fs::remove_file(&tmp);
            return Err(e.into());
        }
        std::fs::rename(&tmp, &target)?;
        Ok(target)
    }
}

/// `{type}_report_{YYYY-MM-DD}.{ext}`
pub fn export_filename(report_type: ReportType, format: ExportFormat, date: NaiveDate) -> String {
    format!(
        "{}_report_{}.{}",
        report_type,
        date.format("%Y-%m-%d"),
        format.extension()
    )
}

pub struct ExportRenderer<'a, A: ReportApi + ?Sized, C: Clock> {
    api: &'a A,
    branding: &'a BrandingCache<C>,
    currency_symbol: String,
}

impl<'a, A: ReportApi + ?Sized, C: Clock> ExportRenderer<'a, A, C> {
    pub fn new(api: &'a A, branding: &'a BrandingCache<C>) -> Self {
        Self {
            api,
            branding,
            currency_symbol: "KES ".to_string(),
        }
    }

    pub fn with_currency_symbol(mut self, symbol: impl Into<String>) -> Self {
        self.currency_symbol = symbol.into();
        self
    }

    /// Render the current report. `Ok(None)` means no report was available;
    /// the reason is recorded in `store.error` and nothing was fetched.
    pub fn export_report(
        &self,
        store: &mut ReportStore,
        request: &ExportRequest,
    ) -> Result<Option<Artifact>> {
        let Some(report) = store.current_report() else {
            debug!(format = %request.format, "Export requested with no report");
            store.set_error(NO_REPORT_MESSAGE);
            return Ok(None);
        };

        if let ReportRef::Id(id) = &request.report {
            if &report.id != id {
                let message = format!("Report {id} is not the current report ({})", report.id);
                debug!("{message}");
                store.set_error(message);
                return Ok(None);
            }
        }

        let report_type = match request.report {
            ReportRef::Type(t) => t,
            ReportRef::Current | ReportRef::Id(_) => report.report_type(),
        };
        let filters = request.filters.merged_with(&report.filters);

        let bytes = match request.format {
            ExportFormat::Csv => {
                let table = extract_table(report_type, &report.payload, Extraction::KnownTypesOnly);
                render_csv(&table)?
            }
            ExportFormat::Pdf => render_pdf(&self.compose(report, report_type, &filters))?,
            ExportFormat::Excel => render_xlsx(&self.compose(report, report_type, &filters))?,
        };

        let filename = export_filename(report_type, request.format, Utc::now().date_naive());
        info!(file = %filename, size = bytes.len(), "Exported report");
        Ok(Some(Artifact { filename, bytes }))
    }

    fn compose(&self, report: &Report, report_type: ReportType, filters: &Filters) -> Document {
        let company = self.branding.get_company_info(self.api);
        let logo = company.logo_url().and_then(|url| self.fetch_logo(url));

        let summary = report
            .payload
            .summary()
            .map(|s| document::summary_lines(&s, &self.currency_symbol))
            .unwrap_or_default();

        Document {
            company,
            logo,
            title: report_type.title(),
            meta_lines: document::meta_lines(report.generated_at, filters),
            table: extract_table(report_type, &report.payload, Extraction::WithGenericFallback),
            summary,
        }
    }

    fn fetch_logo(&self, url: &str) -> Option<Logo> {
        let bytes = match self.api.fetch_bytes(url) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(url, error = %e, "Could not fetch logo, continuing without it");
                return None;
            }
        };
        match ImageFormat::sniff(&bytes) {
            Some(format) => {
                debug!(url, size = bytes.len(), "Fetched logo");
                Some(Logo { bytes, format })
            }
            None => {
                warn!(url, "Logo is not a PNG, JPEG or GIF image, skipping it");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_export_filename() {
        let date = NaiveDate::from_ymd_opt(2025, 3, 7).unwrap();
        assert_eq!(
            export_filename(ReportType::Occupancy, ExportFormat::Excel, date),
            "occupancy_report_2025-03-07.xlsx"
        );
        assert_eq!(
            export_filename(ReportType::Financial, ExportFormat::Pdf, date),
            "financial_report_2025-03-07.pdf"
        );
    }

    #[test]
    fn test_format_parse() {
        assert_eq!("PDF".parse::<ExportFormat>().unwrap(), ExportFormat::Pdf);
        assert_eq!("xlsx".parse::<ExportFormat>().unwrap(), ExportFormat::Excel);
        assert!("docx".parse::<ExportFormat>().is_err());
    }

    #[test]
    fn test_artifact_save_leaves_no_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let artifact = Artifact {
            filename: "csv_report.csv".to_string(),
            bytes: b"a,b\n".to_vec(),
        };

        let path = artifact.save(&dir.path().join("out")).unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"a,b\n");
        let names: Vec<_> = std::fs::read_dir(dir.path().join("out"))
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(names.len(), 1);
    }
}
