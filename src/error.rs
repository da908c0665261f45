use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Config directory not found at {0}. Run 'rentreport init' to create it.")]
    ConfigNotFound(PathBuf),

    #[error("Config file not found: {0}")]
    ConfigFileNotFound(PathBuf),

    #[error("Failed to parse config file {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Failed to read session file {path}: {source}")]
    SessionParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Config directory already exists at {0}")]
    AlreadyInitialized(PathBuf),

    #[error("HTTP request failed: {0}")]
    Http(#[from] ureq::Error),

    #[error("API error: {0}")]
    Api(String),

    #[error("Invalid response from {endpoint}: {reason}")]
    InvalidResponse { endpoint: String, reason: String },

    #[error("Unknown report type '{0}'. Use financial, occupancy, payment, revenue or custom.")]
    UnknownReportType(String),

    #[error("Unknown export format '{0}'. Use pdf, excel or csv.")]
    UnknownFormat(String),

    #[error("Invalid date '{0}'. Expected YYYY-MM-DD.")]
    InvalidDate(String),

    #[error("Invalid filter '{0}'. Expected 'key=value'.")]
    InvalidFilter(String),

    #[error("{0}")]
    NoReport(String),

    #[error("{0}")]
    Generation(String),

    #[error("Custom reports need a title. Use: rentreport custom --title <TITLE>")]
    CustomNeedsTitle,

    #[error("Typst not found. Install it from https://typst.app/ or run: cargo install typst-cli")]
    TypstNotFound,

    #[error("Failed to generate PDF: {0}")]
    PdfGeneration(String),

    #[error("Failed to generate spreadsheet: {0}")]
    Spreadsheet(#[from] rust_xlsxwriter::XlsxError),

    #[error("Failed to generate CSV: {0}")]
    Csv(String),

    #[error("Failed to serialize export data: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<csv::Error> for ReportError {
    fn from(e: csv::Error) -> Self {
        ReportError::Csv(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ReportError>;
