//! Spreadsheet reading via calamine.
//!
//! Only the first worksheet is read; its first row is the header.

use calamine::{open_workbook_auto, DataType, Reader};
use std::path::Path;

use super::{normalize_headers, row_object, RawTable};
use crate::error::{ParseError, ParseResult};

/// Render a cell the way it would appear in a delimited export.
///
/// Integral floats lose their fractional part (`1222000.0` -> `"1222000"`),
/// which is how counts come back from most spreadsheet writers.
pub fn cell_to_string(cell: &DataType) -> String {
    match cell {
        DataType::Empty => String::new(),
        DataType::String(s) => s.trim().to_string(),
        DataType::Int(i) => i.to_string(),
        DataType::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", *f as i64),
        DataType::Float(f) => f.to_string(),
        DataType::Bool(b) => b.to_string(),
        other => other.to_string(),
    }
}

/// Read the first worksheet of a workbook (`.xlsx`, `.xls`, `.ods`, ...).
pub fn read_spreadsheet<P: AsRef<Path>>(path: P) -> ParseResult<RawTable> {
    let path = path.as_ref();
    let path_str = path.display().to_string();

    let mut workbook = open_workbook_auto(path).map_err(|e| ParseError::Excel {
        path: path_str.clone(),
        message: e.to_string(),
    })?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| ParseError::Excel {
            path: path_str.clone(),
            message: "workbook has no worksheet".to_string(),
        })?
        .map_err(|e| ParseError::Excel {
            path: path_str.clone(),
            message: e.to_string(),
        })?;

    // Ranges can start below row 1 when the sheet has leading blank rows.
    let first_line = range.start().map(|(row, _)| row as usize + 1).unwrap_or(1);
    let mut rows = range.rows();
    let header_row = rows.next().ok_or(ParseError::EmptyFile)?;
    let raw_headers: Vec<String> = header_row.iter().map(cell_to_string).collect();
    if raw_headers.iter().all(|h| h.is_empty()) {
        return Err(ParseError::NoHeaders);
    }
    let headers = normalize_headers(&raw_headers);

    let mut records = Vec::new();
    let mut lines = Vec::new();
    for (idx, row) in rows.enumerate() {
        let cells: Vec<String> = row.iter().map(cell_to_string).collect();
        if cells.iter().all(|c| c.is_empty()) {
            continue;
        }
        lines.push(first_line + idx + 1);
        records.push(row_object(&headers, cells.iter().map(String::as_str)));
    }

    Ok(RawTable {
        source: path_str,
        encoding: "xlsx".to_string(),
        delimiter: None,
        headers,
        records,
        lines,
    })
}

/// Write `rows` to the first sheet of a new workbook, starting at
/// `first_row` (0-based). Cells that parse as numbers are stored as numbers.
#[cfg(test)]
pub(crate) fn write_test_workbook(path: &Path, first_row: u32, rows: &[&[&str]]) {
    let mut workbook = rust_xlsxwriter::Workbook::new();
    let sheet = workbook.add_worksheet();
    for (r, row) in rows.iter().enumerate() {
        for (c, cell) in row.iter().enumerate() {
            let (r, c) = (first_row + r as u32, c as u16);
            match cell.parse::<f64>() {
                Ok(n) => {
                    sheet.write_number(r, c, n).unwrap();
                }
                Err(_) => {
                    sheet.write_string(r, c, *cell).unwrap();
                }
            }
        }
    }
    workbook.save(path).unwrap();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integral_float_has_no_fraction() {
        assert_eq!(cell_to_string(&DataType::Float(1_222_000.0)), "1222000");
        assert_eq!(cell_to_string(&DataType::Float(2010.0)), "2010");
    }

    #[test]
    fn test_fractional_float_kept() {
        assert_eq!(cell_to_string(&DataType::Float(0.0496)), "0.0496");
    }

    #[test]
    fn test_string_and_empty_cells() {
        assert_eq!(cell_to_string(&DataType::String("  - ".to_string())), "-");
        assert_eq!(cell_to_string(&DataType::Empty), "");
        assert_eq!(cell_to_string(&DataType::Int(38_000)), "38000");
    }

    #[test]
    fn test_workbook_headers_and_cells() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("imigrantes.xlsx");
        write_test_workbook(
            &path,
            0,
            &[
                &["pais_regiao", "2010", "2022"],
                &["Venezuela", "2869", "271000"],
                &["Haiti", "-", "150000"],
            ],
        );

        let table = read_spreadsheet(&path).unwrap();
        assert_eq!(table.headers, vec!["pais_regiao", "2010", "2022"]);
        assert_eq!(table.delimiter, None);
        assert_eq!(table.records[0]["2022"], "271000");
        assert_eq!(table.records[1]["2010"], "-");
        let lines: Vec<usize> = table.rows().map(|(line, _)| line).collect();
        assert_eq!(lines, vec![2, 3]);
    }

    #[test]
    fn test_leading_blank_rows_shift_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("municipios.xlsx");
        write_test_workbook(
            &path,
            2,
            &[&["municipio", "origem", "pop"], &["Pelotas", "RS", "300000"]],
        );

        let table = read_spreadsheet(&path).unwrap();
        assert_eq!(table.headers, vec!["municipio", "origem", "pop"]);
        let lines: Vec<usize> = table.rows().map(|(line, _)| line).collect();
        assert_eq!(lines, vec![4]);
    }

    #[test]
    fn test_missing_workbook_is_excel_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = read_spreadsheet(dir.path().join("nao_existe.xlsx"));
        assert!(matches!(result, Err(ParseError::Excel { .. })));
    }
}
