//! Workbook IO: first-worksheet reading with calamine, table writing with
//! rust_xlsxwriter.

use std::collections::HashMap;
use std::path::Path;

use calamine::{open_workbook_auto, Data, DataType, Reader};
use chrono::{NaiveDateTime, NaiveTime};
use rust_xlsxwriter::{Format, FormatBorder, Workbook};

use timeguard_core::{CellValue, Table};

use crate::StoreError;

/// Raw cells of the first worksheet, anchored at A1
pub fn read_first_sheet(path: &Path) -> Result<Vec<Vec<CellValue>>, StoreError> {
    let read_error = |e: calamine::Error| StoreError::Read {
        path: path.to_path_buf(),
        message: e.to_string(),
    };
    let mut workbook = open_workbook_auto(path).map_err(read_error)?;
    let Some(sheet) = workbook.sheet_names().first().cloned() else {
        return Err(StoreError::NoData);
    };
    let range = workbook.worksheet_range(&sheet).map_err(read_error)?;

    // Ranges start at the first used cell; pad back to A1 so header rows
    // are counted from the top of the sheet.
    let (row0, col0) = range
        .start()
        .map_or((0, 0), |(r, c)| (r as usize, c as usize));
    let mut grid = vec![Vec::new(); row0];
    grid.extend(range.rows().map(|row| {
        let mut cells = vec![CellValue::Empty; col0];
        cells.extend(row.iter().map(cell_value));
        cells
    }));
    Ok(grid)
}

fn cell_value(data: &Data) -> CellValue {
    match data {
        Data::Empty | Data::Error(_) => CellValue::Empty,
        Data::String(s) if s.is_empty() => CellValue::Empty,
        Data::String(s) | Data::DurationIso(s) => CellValue::Text(s.clone()),
        Data::Float(f) => CellValue::Number(*f),
        Data::Int(i) => CellValue::Number(*i as f64),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::DateTime(_) | Data::DateTimeIso(_) => data
            .as_datetime()
            .map_or_else(|| CellValue::Text(data.to_string()), |dt| CellValue::Text(format_datetime(dt))),
    }
}

/// `YYYY-MM-DD`, with ` HH:MM:SS` only when a time part is present
pub fn format_datetime(dt: NaiveDateTime) -> String {
    if dt.time() == NaiveTime::MIN {
        dt.format("%Y-%m-%d").to_string()
    } else {
        dt.format("%Y-%m-%d %H:%M:%S").to_string()
    }
}

/// Build a table using `header_row` as column names and every later row as data.
///
/// Blank headers become `Unnamed: <index>`; repeated headers get `.1`, `.2`
/// suffixes. Fully blank rows are dropped.
pub fn table_from_grid(grid: &[Vec<CellValue>], header_row: usize) -> Table {
    let Some(header) = grid.get(header_row) else {
        return Table::default();
    };
    let width = grid[header_row..].iter().map(Vec::len).max().unwrap_or(0);

    let mut seen: HashMap<String, usize> = HashMap::new();
    let columns: Vec<String> = (0..width)
        .map(|idx| {
            let base = header
                .get(idx)
                .and_then(CellValue::to_text)
                .map(|h| h.trim().to_string())
                .filter(|h| !h.is_empty())
                .unwrap_or_else(|| format!("Unnamed: {idx}"));
            let count = seen.entry(base.clone()).or_insert(0);
            let name = if *count == 0 {
                base
            } else {
                format!("{base}.{count}")
            };
            *count += 1;
            name
        })
        .collect();

    Table::from_rows(columns, grid[header_row + 1..].to_vec()).drop_blank_rows()
}

/// Serialise `table` as a single-sheet workbook
pub fn write_table(table: &Table, path: &Path) -> Result<(), StoreError> {
    let write_error = |e: rust_xlsxwriter::XlsxError| StoreError::Write {
        path: path.to_path_buf(),
        message: e.to_string(),
    };

    let mut workbook = Workbook::new();
    let header_format = Format::new().set_bold().set_border_bottom(FormatBorder::Thin);
    let sheet = workbook.add_worksheet();
    sheet.set_name("Timesheets").map_err(write_error)?;

    for (col, name) in table.columns().iter().enumerate() {
        sheet
            .write_with_format(0, col as u16, name.as_str(), &header_format)
            .map_err(write_error)?;
    }
    for (r, row) in table.rows().iter().enumerate() {
        let row_idx = (r + 1) as u32;
        for (col, cell) in row.iter().enumerate() {
            let col = col as u16;
            match cell {
                CellValue::Empty => continue,
                CellValue::Number(n) if !n.is_finite() => continue,
                CellValue::Number(n) => sheet.write_number(row_idx, col, *n),
                CellValue::Bool(b) => sheet.write_boolean(row_idx, col, *b),
                CellValue::Text(s) => sheet.write_string(row_idx, col, s.as_str()),
            }
            .map_err(write_error)?;
        }
    }

    let buffer = workbook.save_to_buffer().map_err(write_error)?;
    std::fs::write(path, buffer).map_err(|source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    })
}
