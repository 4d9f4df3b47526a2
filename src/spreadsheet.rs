//! Results spreadsheet: one row per processed image.

use calamine::{open_workbook, Data, Reader, Xlsx};
use rust_xlsxwriter::{Format, Formula, Workbook};
use std::path::Path;
use tracing::info;

use crate::error::{HopeError, HopeResult};
use crate::fields::Label;
use crate::record::NormalizedRecord;

pub const SHEET_NAME: &str = "Sheet1";
pub const FILENAME_COLUMN: &str = "파일명";
pub const LINK_COLUMN: &str = "파일링크";
pub const BUILDING_COLUMN: &str = "동";
pub const UNIT_COLUMN: &str = "호";
pub const KEYWORD_COLUMN: &str = "키워드";

/// Header row, in output order
pub fn columns() -> Vec<&'static str> {
    vec![
        FILENAME_COLUMN,
        LINK_COLUMN,
        Label::SiteName.as_str(),
        Label::WorkType.as_str(),
        Label::UnitCode.as_str(),
        BUILDING_COLUMN,
        UNIT_COLUMN,
        Label::Location.as_str(),
        Label::DefectType.as_str(),
        KEYWORD_COLUMN,
        Label::Date.as_str(),
        Label::Dimension.as_str(),
        Label::Remarks.as_str(),
        Label::Status.as_str(),
    ]
}

/// Cell value before it is written
#[derive(Debug, Clone, PartialEq)]
enum Cell {
    Text(String),
    Number(i64),
    Link { target: String, text: String },
    Blank,
}

fn record_cells(record: &NormalizedRecord, unidentified: &str) -> Vec<Cell> {
    let text = |label: Label| Cell::Text(record.field(label).to_string());
    let number = |value: Option<i64>| value.map(Cell::Number).unwrap_or(Cell::Blank);
    let folder = record.link_target().unwrap_or(unidentified);

    vec![
        Cell::Text(record.filename.clone()),
        Cell::Link {
            target: format!("{}/{}", folder, record.filename),
            text: record.filename.clone(),
        },
        text(Label::SiteName),
        text(Label::WorkType),
        text(Label::UnitCode),
        number(record.building_number()),
        number(record.unit_number()),
        text(Label::Location),
        text(Label::DefectType),
        Cell::Text(record.classification.joined()),
        text(Label::Date),
        text(Label::Dimension),
        text(Label::Remarks),
        text(Label::Status),
    ]
}

/// `=HYPERLINK("target", "text")` with embedded quotes doubled
fn hyperlink_formula(target: &str, text: &str) -> String {
    format!(
        "=HYPERLINK(\"{}\", \"{}\")",
        target.replace('"', "\"\""),
        text.replace('"', "\"\"")
    )
}

fn xlsx_err(e: rust_xlsxwriter::XlsxError) -> HopeError {
    HopeError::spreadsheet_with_source("failed to write spreadsheet", e)
}

/// Write the results table.
///
/// The link column points at `<first category>/<filename>`, or at the
/// unidentified folder when nothing matched, so it stays valid after routing.
pub fn write_records(path: &Path, records: &[NormalizedRecord], unidentified: &str) -> HopeResult<()> {
    let mut workbook = Workbook::new();
    let header_format = Format::new().set_bold();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(SHEET_NAME).map_err(xlsx_err)?;

    for (col, name) in columns().iter().enumerate() {
        worksheet
            .write_string_with_format(0, col as u16, *name, &header_format)
            .map_err(xlsx_err)?;
    }

    for (idx, record) in records.iter().enumerate() {
        let row = idx as u32 + 1;
        for (col, cell) in record_cells(record, unidentified).into_iter().enumerate() {
            let col = col as u16;
            match cell {
                Cell::Text(value) => {
                    worksheet.write_string(row, col, value).map_err(xlsx_err)?;
                }
                Cell::Number(value) => {
                    worksheet.write_number(row, col, value as f64).map_err(xlsx_err)?;
                }
                Cell::Link { target, text } => {
                    let formula = Formula::new(hyperlink_formula(&target, &text)).set_result(text);
                    worksheet.write_formula(row, col, formula).map_err(xlsx_err)?;
                }
                Cell::Blank => {}
            }
        }
    }

    workbook.save(path).map_err(xlsx_err)?;
    info!("Wrote {} rows to {}", records.len(), path.display());
    Ok(())
}

/// The two columns routing needs from a results row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutingRow {
    pub filename: String,
    pub keywords: String,
}

/// Read `파일명` and `키워드` from the first sheet, locating them by header
pub fn read_routing_rows(path: &Path) -> HopeResult<Vec<RoutingRow>> {
    let mut workbook: Xlsx<_> = open_workbook(path).map_err(|e| {
        HopeError::spreadsheet_with_source(format!("cannot open {}", path.display()), e)
    })?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| HopeError::spreadsheet(format!("{} has no worksheets", path.display())))?
        .map_err(|e| HopeError::spreadsheet_with_source("cannot read worksheet", e))?;

    let mut rows = range.rows();
    let header: Vec<String> = rows
        .next()
        .map(|cells| cells.iter().map(cell_text).collect())
        .unwrap_or_default();
    let position = |name: &str| {
        header
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| HopeError::spreadsheet(format!("missing column {}", name)))
    };
    let filename_col = position(FILENAME_COLUMN)?;
    let keyword_col = position(KEYWORD_COLUMN)?;

    let result = rows
        .map(|cells| RoutingRow {
            filename: cells.get(filename_col).map(cell_text).unwrap_or_default(),
            keywords: cells.get(keyword_col).map(cell_text).unwrap_or_default(),
        })
        .filter(|row| !row.filename.is_empty())
        .collect();

    Ok(result)
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.trim().to_string(),
        Data::Float(f) if f.fract() == 0.0 => format!("{}", *f as i64),
        other => other.to_string().trim().to_string(),
    }
}
