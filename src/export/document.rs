//! Branded document model rendered by the PDF and spreadsheet writers.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use super::table::TableData;
use crate::config::CompanyInfo;
use crate::format::{format_grouped_int, format_money, format_percent, humanize_key};
use crate::report::{Filters, Record};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Png,
    Jpeg,
    Gif,
}

impl ImageFormat {
    /// Identify an image from its leading bytes
    pub fn sniff(bytes: &[u8]) -> Option<Self> {
        if bytes.starts_with(&[0x89, b'P', b'N', b'G']) {
            Some(ImageFormat::Png)
        } else if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
            Some(ImageFormat::Jpeg)
        } else if bytes.starts_with(b"GIF8") {
            Some(ImageFormat::Gif)
        } else {
            None
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            ImageFormat::Png => "png",
            ImageFormat::Jpeg => "jpg",
            ImageFormat::Gif => "gif",
        }
    }
}

/// Company logo inlined into the document
#[derive(Debug, Clone, PartialEq)]
pub struct Logo {
    pub bytes: Vec<u8>,
    pub format: ImageFormat,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryLine {
    pub label: String,
    pub value: String,
}

#[derive(Debug, Clone)]
pub struct Document {
    pub company: CompanyInfo,
    pub logo: Option<Logo>,
    pub title: String,
    pub meta_lines: Vec<String>,
    pub table: TableData,
    pub summary: Vec<SummaryLine>,
}

impl Document {
    pub fn footer_text(&self) -> String {
        format!("{} - Confidential", self.company.name)
    }
}

/// Generation timestamp, period, and date range when both ends are known
pub fn meta_lines(generated_at: DateTime<Utc>, filters: &Filters) -> Vec<String> {
    let mut lines = vec![format!(
        "Generated: {}",
        generated_at.format("%B %d, %Y %H:%M UTC")
    )];
    if let Some(period) = filters.period.as_deref().filter(|p| !p.is_empty()) {
        lines.push(format!("Period: {}", crate::format::title_case(period)));
    }
    if let (Some(start), Some(end)) = (filters.start_date, filters.end_date) {
        lines.push(format!(
            "Date Range: {} - {}",
            start.format("%b %d, %Y"),
            end.format("%b %d, %Y")
        ));
    }
    lines
}

/// "Label: Value" lines for a summary object; nested values are skipped
pub fn summary_lines(summary: &Record, currency_symbol: &str) -> Vec<SummaryLine> {
    summary
        .iter()
        .filter_map(|(key, value)| {
            let lower = key.to_ascii_lowercase();
            let value = match value {
                Value::Object(_) | Value::Array(_) | Value::Null => return None,
                Value::Number(n) => {
                    let n = n.as_f64()?;
                    if lower.contains("rate") {
                        format_percent(n)
                    } else if lower.contains("count") {
                        format_grouped_int(n.round() as i64)
                    } else {
                        format_money(n, currency_symbol)
                    }
                }
                Value::String(s) => s.clone(),
                Value::Bool(b) => if *b { "Yes" } else { "No" }.to_string(),
            };
            Some(SummaryLine {
                label: humanize_key(key),
                value,
            })
        })
        .collect()
}
