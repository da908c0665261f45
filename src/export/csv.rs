//! Unbranded CSV export for the canned report types.

use super::table::{TableData, NO_DATA_MESSAGE};
use crate::error::{ReportError, Result};

/// Serialize a table to CSV bytes; an empty table becomes a one-cell placeholder
pub fn render_csv(table: &TableData) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    if table.is_empty() {
        writer.write_record([NO_DATA_MESSAGE])?;
    } else {
        writer.write_record(&table.headers)?;
        for row in table.plain_rows() {
            writer.write_record(&row)?;
        }
    }

    writer
        .into_inner()
        .map_err(|e| ReportError::Csv(e.error().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::table::Cell;

    #[test]
    fn test_render_csv_quotes_commas() {
        let table = TableData {
            headers: vec!["Date".to_string(), "Tenant".to_string(), "Amount".to_string()],
            rows: vec![vec![
                Cell::Text("Jan 05, 2025".to_string()),
                Cell::Text("Otieno, James".to_string()),
                Cell::Number(1500.0),
            ]],
        };

        let csv = String::from_utf8(render_csv(&table).unwrap()).unwrap();
        assert_eq!(
            csv,
            "Date,Tenant,Amount\n\"Jan 05, 2025\",\"Otieno, James\",1500\n"
        );
    }

    #[test]
    fn test_render_csv_placeholder() {
        let csv = String::from_utf8(render_csv(&TableData::default()).unwrap()).unwrap();
        assert_eq!(csv, "No data available for this report\n");
    }
}
