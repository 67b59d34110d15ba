use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use rust_xlsxwriter::{Format, Workbook, Worksheet};
use tracing::{debug, warn};

use crate::error::{EnrichError, Result};
use crate::model::{Cell, EnrichedRecord, WorkValue};

/// Name of the single sheet in the enriched workbook.
pub const OUTPUT_SHEET: &str = "Work Values";
/// Default number of file names tried before giving up on a locked target.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 10;

/// Header row of the enriched sheet: the input columns followed by the six
/// Work Values.
pub fn output_headers(columns: &[String]) -> Vec<String> {
    columns
        .iter()
        .cloned()
        .chain(WorkValue::ALL.iter().map(|value| value.name().to_string()))
        .collect()
}

/// Renders the enriched records into an in-memory xlsx payload.
pub fn render_workbook(columns: &[String], records: &[EnrichedRecord]) -> Result<Vec<u8>> {
    let mut workbook = Workbook::new();
    let date_format = Format::new().set_num_format("yyyy-mm-dd");

    let worksheet = workbook.add_worksheet();
    worksheet.set_name(OUTPUT_SHEET)?;

    let headers = output_headers(columns);
    for (col_idx, header) in headers.iter().enumerate() {
        worksheet.write_string(0, col_idx as u16, header)?;
    }

    for (row_idx, record) in records.iter().enumerate() {
        let row = (row_idx + 1) as u32;
        let scores = record.score_cells();
        let cells = record.record.cells.iter().chain(scores.iter());
        for (col_idx, cell) in cells.enumerate() {
            write_cell(worksheet, row, col_idx as u16, cell, &date_format)?;
        }
    }

    let col_end = (headers.len() as u16).saturating_sub(1);
    worksheet.set_freeze_panes(1, 0)?;
    worksheet.autofilter(0, 0, records.len() as u32, col_end)?;

    Ok(workbook.save_to_buffer()?)
}

fn write_cell(
    worksheet: &mut Worksheet,
    row: u32,
    col: u16,
    cell: &Cell,
    date_format: &Format,
) -> Result<()> {
    match cell {
        Cell::Empty => {}
        Cell::Text(value) => {
            worksheet.write_string(row, col, value)?;
        }
        Cell::Number(value) => {
            worksheet.write_number(row, col, *value)?;
        }
        Cell::Boolean(value) => {
            worksheet.write_boolean(row, col, *value)?;
        }
        Cell::Date(value) => {
            worksheet.write_number_with_format(row, col, *value, date_format)?;
        }
    }
    Ok(())
}

/// Writes the enriched workbook to `target`, moving on to `name (1).xlsx`,
/// `name (2).xlsx`, ... while the target is locked. Returns the path written.
pub fn write_enriched(
    target: &Path,
    columns: &[String],
    records: &[EnrichedRecord],
    max_attempts: u32,
) -> Result<PathBuf> {
    let payload = render_workbook(columns, records)?;
    write_with_retry(target, &payload, max_attempts, |path, bytes| {
        fs::write(path, bytes)
    })
}

/// Retry loop behind [`write_enriched`]. `write` performs the actual IO so the
/// lock handling can be exercised without touching file permissions.
pub fn write_with_retry<F>(
    target: &Path,
    payload: &[u8],
    max_attempts: u32,
    mut write: F,
) -> Result<PathBuf>
where
    F: FnMut(&Path, &[u8]) -> io::Result<()>,
{
    let attempts = max_attempts.max(1);
    for attempt in 0..attempts {
        let candidate = candidate_path(target, attempt);
        match write(&candidate, payload) {
            Ok(()) => {
                debug!(path = %candidate.display(), attempt, "workbook written");
                return Ok(candidate);
            }
            Err(error) if is_locked(&error) => {
                warn!(path = %candidate.display(), %error, "output locked, trying next name");
            }
            Err(error) => return Err(EnrichError::Io(error)),
        }
    }
    Err(EnrichError::WriteConflict {
        target: target.to_path_buf(),
        attempts,
    })
}

/// Returns `target` for attempt zero and `stem (N).ext` for attempt `N`.
pub fn candidate_path(target: &Path, attempt: u32) -> PathBuf {
    if attempt == 0 {
        return target.to_path_buf();
    }
    let stem = target
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = match target.extension() {
        Some(ext) => format!("{stem} ({attempt}).{}", ext.to_string_lossy()),
        None => format!("{stem} ({attempt})"),
    };
    target.with_file_name(name)
}

fn is_locked(error: &io::Error) -> bool {
    if error.kind() == io::ErrorKind::PermissionDenied {
        return true;
    }
    // ERROR_SHARING_VIOLATION and ERROR_LOCK_VIOLATION
    cfg!(windows) && matches!(error.raw_os_error(), Some(32) | Some(33))
}
