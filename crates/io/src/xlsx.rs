// Excel import (xlsx, xls, xlsb, ods) and report export (xlsx only)

use std::path::Path;

use calamine::{open_workbook_auto, Data, Reader, Sheets};
use rust_xlsxwriter::{Format, Workbook as XlsxWorkbook, Worksheet};

use linematch_engine::extract::RawTable;
use linematch_engine::model::{MatchReport, MatchedRow, UnmatchedRow};

/// Import the first sheet of an Excel workbook as a header + rows table.
pub fn import_table(path: &Path) -> Result<RawTable, String> {
    let mut workbook: Sheets<_> =
        open_workbook_auto(path).map_err(|e| format!("Failed to open Excel file: {}", e))?;

    let sheet_names: Vec<String> = workbook.sheet_names().to_vec();
    let first = sheet_names
        .first()
        .ok_or_else(|| "Excel file contains no sheets".to_string())?;

    let range = workbook
        .worksheet_range(first)
        .map_err(|e| format!("Failed to read sheet '{}': {}", first, e))?;

    let mut table = RawTable::default();

    for row in range.rows() {
        let fields: Vec<String> = row.iter().map(cell_to_string).collect();
        if table.headers.is_empty() {
            // skip leading blank rows until something header-like appears
            if fields.iter().all(|f| f.is_empty()) {
                continue;
            }
            table.headers = fields;
        } else {
            table.rows.push(fields);
        }
    }

    if table.headers.is_empty() {
        return Err(format!("Sheet '{}' contains no data", first));
    }

    Ok(table)
}

fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.trim().to_string(),
        Data::Float(n) => {
            // Format nicely: integer-valued floats without decimals, so a
            // product code stored as a number stays "1001", not "1001.0"
            if n.fract() == 0.0 && n.abs() < 1e15 {
                format!("{}", *n as i64)
            } else {
                format!("{}", n)
            }
        }
        Data::Int(n) => format!("{}", n),
        Data::Bool(b) => if *b { "TRUE" } else { "FALSE" }.to_string(),
        Data::Error(e) => format!("#{:?}", e),
        Data::DateTime(dt) => format!("{}", dt.as_f64()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
    }
}

// ---------------------------------------------------------------------------
// Report export
// ---------------------------------------------------------------------------

/// Export a match report to XLSX: one sheet per table, bold header row,
/// scores with one decimal.
pub fn export_report(report: &MatchReport, path: &Path) -> Result<(), String> {
    let mut workbook = XlsxWorkbook::new();
    let header_format = Format::new().set_bold();
    let score_format = Format::new().set_num_format("0.0");

    {
        let worksheet = workbook
            .add_worksheet()
            .set_name("Matched")
            .map_err(|e| format!("Failed to create sheet 'Matched': {}", e))?;
        write_matched_sheet(worksheet, &report.matched, &header_format, &score_format)?;
    }

    {
        let worksheet = workbook
            .add_worksheet()
            .set_name("Unmatched")
            .map_err(|e| format!("Failed to create sheet 'Unmatched': {}", e))?;
        write_unmatched_sheet(worksheet, &report.unmatched, &header_format, &score_format)?;
    }

    workbook
        .save(path)
        .map_err(|e| format!("Failed to write {}: {}", path.display(), e))
}

fn write_matched_sheet(
    worksheet: &mut Worksheet,
    rows: &[MatchedRow],
    header_format: &Format,
    score_format: &Format,
) -> Result<(), String> {
    let headers = [
        "invoice_code",
        "invoice_name",
        "order_code",
        "order_name",
        "score",
        "confidence",
    ];
    for (col, header) in headers.iter().enumerate() {
        worksheet
            .write_string_with_format(0, col as u16, *header, header_format)
            .map_err(|e| e.to_string())?;
    }

    for (i, row) in rows.iter().enumerate() {
        let r = (i + 1) as u32;
        worksheet.write_string(r, 0, &row.invoice_code).map_err(|e| e.to_string())?;
        worksheet.write_string(r, 1, &row.invoice_name).map_err(|e| e.to_string())?;
        worksheet.write_string(r, 2, &row.order_code).map_err(|e| e.to_string())?;
        worksheet.write_string(r, 3, &row.order_name).map_err(|e| e.to_string())?;
        worksheet
            .write_number_with_format(r, 4, row.score, score_format)
            .map_err(|e| e.to_string())?;
        worksheet
            .write_string(r, 5, row.confidence.text())
            .map_err(|e| e.to_string())?;
    }

    Ok(())
}

fn write_unmatched_sheet(
    worksheet: &mut Worksheet,
    rows: &[UnmatchedRow],
    header_format: &Format,
    score_format: &Format,
) -> Result<(), String> {
    let headers = ["invoice_code", "invoice_name", "non_match_score", "confidence"];
    for (col, header) in headers.iter().enumerate() {
        worksheet
            .write_string_with_format(0, col as u16, *header, header_format)
            .map_err(|e| e.to_string())?;
    }

    for (i, row) in rows.iter().enumerate() {
        let r = (i + 1) as u32;
        worksheet.write_string(r, 0, &row.invoice_code).map_err(|e| e.to_string())?;
        worksheet.write_string(r, 1, &row.invoice_name).map_err(|e| e.to_string())?;
        worksheet
            .write_number_with_format(r, 2, row.non_match_score, score_format)
            .map_err(|e| e.to_string())?;
        worksheet
            .write_string(r, 3, row.confidence.text())
            .map_err(|e| e.to_string())?;
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
