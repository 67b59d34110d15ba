use std::io::Cursor;
use std::path::Path;

use calamine::{DataType, Range, Reader, Xlsx, open_workbook_auto};

use crate::error::{EnrichError, Result};
use crate::model::{Cell, Table};

/// Reads one sheet of a workbook on disk (xlsx, xls, xlsb or ods). The first
/// sheet is used unless `sheet` names another one.
pub fn read_table(path: &Path, sheet: Option<&str>) -> Result<Table> {
    let mut workbook = open_workbook_auto(path)?;
    let range = match sheet {
        Some(name) => workbook.worksheet_range(name),
        None => workbook.worksheet_range_at(0),
    };
    let range = range.ok_or_else(|| missing_sheet(sheet))??;
    Ok(table_from_range(&range))
}

/// Reads one sheet of an xlsx payload held in memory.
pub fn read_table_from_bytes(bytes: Vec<u8>, sheet: Option<&str>) -> Result<Table> {
    let mut workbook: Xlsx<_> = Xlsx::new(Cursor::new(bytes))?;
    let range = match sheet {
        Some(name) => workbook.worksheet_range(name),
        None => workbook.worksheet_range_at(0),
    };
    let range = range.ok_or_else(|| missing_sheet(sheet))??;
    Ok(table_from_range(&range))
}

fn missing_sheet(sheet: Option<&str>) -> EnrichError {
    match sheet {
        Some(name) => EnrichError::InvalidWorkbook(format!("missing sheet '{name}'")),
        None => EnrichError::InvalidWorkbook("workbook has no sheets".into()),
    }
}

/// Converts a calamine range into a [`Table`]. The first row is the header
/// row; fully blank data rows are dropped.
pub fn table_from_range(range: &Range<DataType>) -> Table {
    let mut rows = range.rows();
    let mut headers: Vec<String> = match rows.next() {
        Some(first_row) => first_row
            .iter()
            .map(|cell| convert_cell(cell).to_text().trim().to_string())
            .collect(),
        None => return Table::default(),
    };

    let mut data: Vec<Vec<Cell>> = Vec::new();
    for row in rows {
        let cells: Vec<Cell> = row.iter().map(convert_cell).collect();
        if cells.iter().all(Cell::is_blank) {
            continue;
        }
        data.push(cells);
    }

    let width = data
        .iter()
        .map(Vec::len)
        .chain(std::iter::once(headers.len()))
        .max()
        .unwrap_or(0);
    headers.resize(width, String::new());
    for (position, header) in headers.iter_mut().enumerate() {
        if header.is_empty() {
            *header = format!("Column {}", position + 1);
        }
    }
    for row in &mut data {
        row.resize(width, Cell::Empty);
    }

    Table {
        headers,
        rows: data,
    }
}

/// Maps a calamine cell onto the crate's cell model.
pub fn convert_cell(cell: &DataType) -> Cell {
    match cell {
        DataType::String(value) => Cell::Text(value.clone()),
        DataType::Float(value) => Cell::Number(*value),
        DataType::Int(value) => Cell::Number(*value as f64),
        DataType::Bool(value) => Cell::Boolean(*value),
        DataType::DateTime(value) => Cell::Date(*value),
        DataType::Empty => Cell::Empty,
        other => Cell::Text(other.to_string()),
    }
}
