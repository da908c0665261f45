use serde::Serialize;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;
use tracing::debug;

use super::document::{Document, SummaryLine};
use super::table::NO_DATA_MESSAGE;
use crate::error::{ReportError, Result};

/// Typst source for report documents; `DATA_JSON_PATH` names the data file
const REPORT_TEMPLATE: &str = r##"// Branded report, all values preformatted in the data file

#let data = json("DATA_JSON_PATH")

#set page(
  paper: "a4",
  margin: (top: 2cm, bottom: 2.5cm, left: 1.5cm, right: 1.5cm),
  footer: context [
    #set text(size: 8pt, fill: gray)
    #data.footer
    #h(1fr)
    Page #counter(page).display("1 of 1", both: true)
  ],
)

#set text(font: "Helvetica", size: 10pt)

// Branding header
#align(center)[
  #if data.logo != none {
    image(data.logo, height: 1.6cm)
  }
  #text(size: 18pt, weight: "bold")[#data.company_name]
  #if data.contact_line != "" {
    linebreak()
    text(size: 8pt, fill: gray)[#data.contact_line]
  }
]

#v(0.4em)
#line(length: 100%, stroke: 0.5pt + gray)
#v(0.4em)

#text(size: 14pt, weight: "bold")[#data.title]
#v(0.2em)
#for meta in data.meta_lines {
  text(size: 9pt, fill: luma(80))[#meta]
  linebreak()
}

#v(1em)

// Data table
#if data.headers.len() == 0 {
  text(style: "italic")[#data.empty_message]
} else {
  table(
    columns: data.headers.len(),
    stroke: 0.5pt + luma(200),
    inset: 6pt,
    fill: (x, y) => if y == 0 { rgb(30, 64, 175) } else if calc.even(y) { luma(245) } else { none },
    table.header(..data.headers.map(h => text(fill: white, weight: "bold")[#h])),
    ..data.rows.flatten(),
  )
}

// Summary
#if data.summary.len() > 0 {
  v(1em)
  text(weight: "bold")[Summary:]
  linebreak()
  for entry in data.summary {
    text(weight: "bold")[#entry.label:]
    [ #entry.value]
    linebreak()
  }
}
"##;

/// Everything the template reads, already formatted
#[derive(Debug, Serialize)]
struct PdfData<'a> {
    company_name: &'a str,
    contact_line: String,
    logo: Option<String>,
    title: &'a str,
    meta_lines: &'a [String],
    headers: &'a [String],
    rows: Vec<Vec<String>>,
    empty_message: &'static str,
    summary: &'a [SummaryLine],
    footer: String,
}

impl<'a> PdfData<'a> {
    fn new(doc: &'a Document, logo_file: Option<String>) -> Self {
        Self {
            company_name: &doc.company.name,
            contact_line: doc.company.contact_line(),
            logo: logo_file,
            title: &doc.title,
            meta_lines: &doc.meta_lines,
            headers: &doc.table.headers,
            rows: doc.table.display_rows(),
            empty_message: NO_DATA_MESSAGE,
            summary: &doc.summary,
            footer: doc.footer_text(),
        }
    }
}

/// Render a document with the typst CLI; the work dir is removed afterwards
pub fn render_pdf(doc: &Document) -> Result<Vec<u8>> {
    if Command::new("typst").arg("--version").output().is_err() {
        return Err(ReportError::TypstNotFound);
    }

    let work_dir = work_dir()?;
    compile(doc, work_dir.path())
}

/// Private scratch directory per render, removed when dropped
fn work_dir() -> Result<TempDir> {
    Ok(tempfile::Builder::new().prefix("rentreport-").tempdir()?)
}

fn compile(doc: &Document, work_dir: &Path) -> Result<Vec<u8>> {
    let logo_file = match &doc.logo {
        Some(logo) => {
            let name = format!("logo.{}", logo.format.extension());
            std::fs::write(work_dir.join(&name), &logo.bytes)?;
            Some(name)
        }
        None => None,
    };

    let json_data = serde_json::to_string(&PdfData::new(doc, logo_file))?;
    let json_path = work_dir.join("report_data.json");
    std::fs::write(&json_path, &json_data)?;

    let template_content = REPORT_TEMPLATE.replace("DATA_JSON_PATH", "report_data.json");
    let template_path = work_dir.join("report.typ");
    std::fs::write(&template_path, &template_content)?;

    let output_path: PathBuf = work_dir.join("report.pdf");
    debug!(dir = %work_dir.display(), "Compiling report with typst");

    let output = Command::new("typst")
        .arg("compile")
        .arg("--root")
        .arg(work_dir)
        .arg(&template_path)
        .arg(&output_path)
        .output()?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(ReportError::PdfGeneration(stderr.to_string()));
    }

    Ok(std::fs::read(&output_path)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CompanyInfo;
    use crate::export::document::{ImageFormat, Logo};
    use crate::export::table::{Cell, TableData};

    #[test]
    fn test_pdf_data_is_preformatted() {
        let doc = Document {
            company: CompanyInfo::fallback(),
            logo: Some(Logo {
                bytes: vec![0x89, b'P', b'N', b'G'],
                format: ImageFormat::Png,
            }),
            title: "Financial Report".to_string(),
            meta_lines: vec!["Period: Monthly".to_string()],
            table: TableData {
                headers: vec!["Tenant".to_string(), "Amount".to_string()],
                rows: vec![vec![Cell::Text("Jane".to_string()), Cell::Number(12500.0)]],
            },
            summary: vec![SummaryLine {
                label: "Total Revenue".to_string(),
                value: "KES 12,500".to_string(),
            }],
        };

        let data = serde_json::to_value(PdfData::new(&doc, Some("logo.png".to_string()))).unwrap();
        assert_eq!(data["rows"][0][1], "12,500");
        assert_eq!(data["logo"], "logo.png");
        assert_eq!(data["footer"], "Property Management - Confidential");
        assert_eq!(data["summary"][0]["label"], "Total Revenue");
    }

    #[test]
    fn test_work_dirs_are_private_and_cleaned_up() {
        let first = work_dir().unwrap();
        let second = work_dir().unwrap();
        assert_ne!(first.path(), second.path());

        let path = first.path().to_path_buf();
        std::fs::write(path.join("report.typ"), "x").unwrap();
        drop(first);
        assert!(!path.exists());
        assert!(second.path().exists());
    }

    #[test]
    fn test_template_placeholder_present() {
        assert!(REPORT_TEMPLATE.contains("json(\"DATA_JSON_PATH\")"));
        assert!(REPORT_TEMPLATE.contains("rgb(30, 64, 175)"));
    }
}
