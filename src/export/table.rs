//! Table extraction shared by every export format.

use serde_json::Value;

use crate::format::{
    format_display_date, format_grouped_int, format_grouped_number, format_percent, title_case,
    trim_number,
};
use crate::report::{
    FinancialPayload, OccupancyPayload, PaymentPayload, Record, ReportPayload, ReportType,
};

pub const NO_DATA_MESSAGE: &str = "No data available for this report";

/// Generic records contribute at most this many columns
const MAX_GENERIC_COLUMNS: usize = 6;

#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Number(f64),
}

/// How a column's numbers are rendered, decided from its header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Percent,
    Currency,
    Plain,
}

impl ColumnKind {
    pub fn from_header(header: &str) -> Self {
        let lower = header.to_ascii_lowercase();
        if header.contains('%') {
            ColumnKind::Percent
        } else if lower.contains("amount") || lower.contains("revenue") {
            ColumnKind::Currency
        } else {
            ColumnKind::Plain
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct TableData {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl TableData {
    pub fn is_empty(&self) -> bool {
        self.headers.is_empty()
    }

    pub fn column_kinds(&self) -> Vec<ColumnKind> {
        self.headers.iter().map(|h| ColumnKind::from_header(h)).collect()
    }

    /// Cell text for documents: percent columns as "70%", currency grouped, others grouped
    pub fn display_rows(&self) -> Vec<Vec<String>> {
        let kinds = self.column_kinds();
        self.rows
            .iter()
            .map(|row| {
                row.iter()
                    .enumerate()
                    .map(|(i, cell)| match cell {
                        Cell::Text(text) => text.clone(),
                        Cell::Number(n) => {
                            match kinds.get(i).copied().unwrap_or(ColumnKind::Plain) {
                                ColumnKind::Percent => format_percent(*n),
                                ColumnKind::Currency => format_grouped_int(n.round() as i64),
                                ColumnKind::Plain => format_grouped_number(*n),
                            }
                        }
                    })
                    .collect()
            })
            .collect()
    }

    /// Cell text for CSV: raw numbers, percent columns suffixed with "%"
    pub fn plain_rows(&self) -> Vec<Vec<String>> {
        let kinds = self.column_kinds();
        self.rows
            .iter()
            .map(|row| {
                row.iter()
                    .enumerate()
                    .map(|(i, cell)| match cell {
                        Cell::Text(text) => text.clone(),
                        Cell::Number(n) => match kinds.get(i) {
                            Some(ColumnKind::Percent) => format_percent(*n),
                            _ => trim_number(*n),
                        },
                    })
                    .collect()
            })
            .collect()
    }
}

/// Whether the generic `data` fallback may be used
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extraction {
    WithGenericFallback,
    KnownTypesOnly,
}

/// Resolve headers and rows for `report_type` from the payload's shape.
/// An empty table means nothing matched and the placeholder should be shown.
pub fn extract_table(
    report_type: ReportType,
    payload: &ReportPayload,
    mode: Extraction,
) -> TableData {
    match (report_type, payload) {
        (ReportType::Financial, ReportPayload::Financial(p)) if !p.transactions.is_empty() => {
            financial_table(p)
        }
        (ReportType::Occupancy, ReportPayload::Occupancy(p)) if !p.property_rows().is_empty() => {
            occupancy_table(p)
        }
        (ReportType::Payment, ReportPayload::Payment(p)) if !p.payments.is_empty() => {
            payment_table(p)
        }
        _ if mode == Extraction::WithGenericFallback => generic_table(payload.records()),
        _ => TableData::default(),
    }
}

fn financial_table(p: &FinancialPayload) -> TableData {
    TableData {
        headers: headers(&["Date", "Tenant", "Property", "Amount", "Status"]),
        rows: p
            .transactions
            .iter()
            .map(|t| {
                vec![
                    date_cell(t.payment_date.as_deref()),
                    text_cell(t.tenant_name.as_deref()),
                    text_cell(t.property_name.as_deref()),
                    Cell::Number(t.amount.value()),
                    text_cell(t.status.as_deref()),
                ]
            })
            .collect(),
    }
}

fn occupancy_table(p: &OccupancyPayload) -> TableData {
    TableData {
        headers: headers(&["Property", "Total Units", "Occupied", "Vacant", "Occupancy %"]),
        rows: p
            .property_rows()
            .iter()
            .map(|prop| {
                vec![
                    Cell::Text(prop.name.clone()),
                    Cell::Number(prop.total_units),
                    Cell::Number(prop.occupied_units),
                    Cell::Number(prop.vacant_units),
                    Cell::Number(prop.occupancy_rate),
                ]
            })
            .collect(),
    }
}

fn payment_table(p: &PaymentPayload) -> TableData {
    TableData {
        headers: headers(&["Date", "Tenant", "Amount", "Method", "Status"]),
        rows: p
            .payments
            .iter()
            .map(|pay| {
                vec![
                    date_cell(pay.payment_date.as_deref()),
                    text_cell(pay.tenant_name.as_deref()),
                    Cell::Number(pay.amount.value()),
                    text_cell(pay.payment_method.as_deref()),
                    text_cell(pay.status.as_deref()),
                ]
            })
            .collect(),
    }
}

fn generic_table(records: &[Record]) -> TableData {
    let Some(first) = records.first() else {
        return TableData::default();
    };

    let keys: Vec<&String> = first.keys().take(MAX_GENERIC_COLUMNS).collect();
    TableData {
        headers: keys.iter().map(|k| title_case(k)).collect(),
        rows: records
            .iter()
            .map(|record| keys.iter().map(|k| generic_cell(record.get(*k))).collect())
            .collect(),
    }
}

fn generic_cell(value: Option<&Value>) -> Cell {
    match value {
        None | Some(Value::Null) => Cell::Text("N/A".to_string()),
        Some(Value::Number(n)) => n
            .as_f64()
            .map(Cell::Number)
            .unwrap_or_else(|| Cell::Text(n.to_string())),
        Some(Value::String(s)) if s.is_empty() => Cell::Text("N/A".to_string()),
        Some(Value::String(s)) => Cell::Text(format_display_date(s)),
        Some(Value::Bool(b)) => Cell::Text(if *b { "Yes" } else { "No" }.to_string()),
        Some(other) => Cell::Text(other.to_string()),
    }
}

fn headers(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

fn text_cell(value: Option<&str>) -> Cell {
    match value.map(str::trim) {
        Some(text) if !text.is_empty() => Cell::Text(text.to_string()),
        _ => Cell::Text("N/A".to_string()),
    }
}

fn date_cell(value: Option<&str>) -> Cell {
    match value.map(str::trim) {
        Some(text) if !text.is_empty() => Cell::Text(format_display_date(text)),
        _ => Cell::Text("N/A".to_string()),
    }
}
