//! Branded spreadsheet export (Office Open XML).

use rust_xlsxwriter::{Color, Format, FormatAlign, FormatBorder, Image, Workbook, Worksheet};
use tracing::warn;

use super::document::{Document, Logo, SummaryLine};
use super::table::{Cell, ColumnKind, NO_DATA_MESSAGE};
use crate::error::Result;

const HEADER_BLUE: u32 = 0x1E40AF;
const BAND_GRAY: u32 = 0xF3F4F6;
const BORDER_GRAY: u32 = 0xD1D5DB;
const MIN_COLUMNS: u16 = 5;

/// One horizontal band of the sheet, top to bottom
#[derive(Debug, PartialEq)]
enum Block<'a> {
    Logo(&'a Logo),
    CompanyName(&'a str),
    Contact(String),
    Divider,
    Gap,
    Title(&'a str),
    Meta(&'a str),
    Placeholder,
    Table,
    SummaryHeading,
    SummaryLine(&'a SummaryLine),
    Footer(String),
}

fn plan(doc: &Document) -> Vec<Block<'_>> {
    let mut blocks = Vec::new();
    if let Some(logo) = &doc.logo {
        blocks.push(Block::Logo(logo));
    }
    blocks.push(Block::CompanyName(&doc.company.name));
    let contact = doc.company.contact_line();
    if !contact.is_empty() {
        blocks.push(Block::Contact(contact));
    }
    blocks.extend([Block::Divider, Block::Gap, Block::Title(&doc.title)]);
    blocks.extend(doc.meta_lines.iter().map(|line| Block::Meta(line)));
    blocks.push(Block::Gap);

    if doc.table.is_empty() {
        blocks.push(Block::Placeholder);
    } else {
        blocks.push(Block::Table);
    }

    if !doc.summary.is_empty() {
        blocks.extend([Block::Gap, Block::SummaryHeading]);
        blocks.extend(doc.summary.iter().map(Block::SummaryLine));
    }

    blocks.extend([Block::Gap, Block::Footer(doc.footer_text())]);
    blocks
}

/// Build the whole workbook in memory and return its bytes
pub fn render_xlsx(doc: &Document) -> Result<Vec<u8>> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.set_name("Report")?;

    let columns = (doc.table.headers.len() as u16).max(MIN_COLUMNS);
    let last_col = columns - 1;
    for col in 0..columns {
        sheet.set_column_width(col, 20)?;
    }

    let bold = Format::new().set_bold();
    let mut row: u32 = 0;
    for block in plan(doc) {
        match block {
            Block::Logo(logo) => match Image::new_from_buffer(&logo.bytes) {
                Ok(image) => {
                    let image = image.set_scale_to_size(160, 60, true);
                    sheet.set_row_height(row, 48)?;
                    sheet.insert_image(row, last_col / 2, &image)?;
                }
                Err(e) => {
                    warn!(error = %e, "Skipping logo the spreadsheet writer cannot embed");
                    continue;
                }
            },
            Block::CompanyName(name) => {
                let company = Format::new()
                    .set_bold()
                    .set_font_size(16)
                    .set_align(FormatAlign::Center);
                write_merged(sheet, row, last_col, name, &company)?;
            }
            Block::Contact(contact) => {
                let small = Format::new()
                    .set_font_size(9)
                    .set_font_color(Color::Gray)
                    .set_align(FormatAlign::Center);
                write_merged(sheet, row, last_col, &contact, &small)?;
            }
            Block::Divider => {
                let divider = Format::new().set_border_bottom(FormatBorder::Medium);
                for col in 0..columns {
                    sheet.write_blank(row, col, &divider)?;
                }
            }
            Block::Gap => {}
            Block::Title(title) => {
                let format = Format::new().set_bold().set_font_size(14);
                sheet.write_string_with_format(row, 0, title, &format)?;
            }
            Block::Meta(line) => {
                sheet.write_string_with_format(row, 0, line, &Format::new().set_font_size(9))?;
            }
            Block::Placeholder => {
                let italic = Format::new().set_italic();
                sheet.write_string_with_format(row, 0, NO_DATA_MESSAGE, &italic)?;
            }
            Block::Table => {
                row = write_table(sheet, row, doc)?;
                continue;
            }
            Block::SummaryHeading => {
                sheet.write_string_with_format(row, 0, "Summary:", &bold)?;
            }
            Block::SummaryLine(line) => {
                sheet.write_string_with_format(row, 0, &line.label, &bold)?;
                sheet.write_string(row, 1, &line.value)?;
            }
            Block::Footer(text) => {
                let footer = Format::new()
                    .set_italic()
                    .set_font_size(8)
                    .set_font_color(Color::Gray);
                write_merged(sheet, row, last_col, &text, &footer)?;
            }
        }
        row += 1;
    }

    Ok(workbook.save_to_buffer()?)
}

fn write_table(sheet: &mut Worksheet, mut row: u32, doc: &Document) -> Result<u32> {
    let header = Format::new()
        .set_bold()
        .set_font_color(Color::White)
        .set_background_color(Color::RGB(HEADER_BLUE))
        .set_border(FormatBorder::Thin)
        .set_align(FormatAlign::Center);
    for (col, name) in doc.table.headers.iter().enumerate() {
        sheet.write_string_with_format(row, col as u16, name, &header)?;
    }
    row += 1;

    let kinds = doc.table.column_kinds();
    for (index, cells) in doc.table.rows.iter().enumerate() {
        let banded = index % 2 == 1;
        for (col, cell) in cells.iter().enumerate() {
            let kind = kinds.get(col).copied().unwrap_or(ColumnKind::Plain);
            match cell {
                Cell::Text(text) => {
                    let format = body_format(banded, None);
                    sheet.write_string_with_format(row, col as u16, text, &format)?;
                }
                Cell::Number(n) => {
                    let num_format = number_format(kind, *n);
                    sheet.write_number_with_format(
                        row,
                        col as u16,
                        *n,
                        &body_format(banded, Some(num_format)),
                    )?;
                }
            }
        }
        row += 1;
    }
    Ok(row)
}

fn body_format(banded: bool, num_format: Option<&str>) -> Format {
    let mut format = Format::new()
        .set_border(FormatBorder::Thin)
        .set_border_color(Color::RGB(BORDER_GRAY));
    if banded {
        format = format.set_background_color(Color::RGB(BAND_GRAY));
    }
    if let Some(num_format) = num_format {
        format = format.set_num_format(num_format);
    }
    format
}

fn number_format(kind: ColumnKind, value: f64) -> &'static str {
    match kind {
        ColumnKind::Percent if value.fract() == 0.0 => "0\"%\"",
        ColumnKind::Percent => "0.0#\"%\"",
        ColumnKind::Currency => "#,##0",
        ColumnKind::Plain if value.fract() == 0.0 => "#,##0",
        ColumnKind::Plain => "#,##0.00",
    }
}

/// Merging a single cell is rejected by the writer, so one column writes directly
fn write_merged(
    sheet: &mut Worksheet,
    row: u32,
    last_col: u16,
    text: &str,
    format: &Format,
) -> Result<()> {
    if last_col == 0 {
        sheet.write_string_with_format(row, 0, text, format)?;
    } else {
        sheet.merge_range(row, 0, row, last_col, text, format)?;
    }
    Ok(())
}
