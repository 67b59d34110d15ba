use std::path::PathBuf;

use thiserror::Error;

/// Name used in errors about the job titles workbook.
pub const INPUT_WORKBOOK: &str = "job titles workbook";

/// Name used in errors about the Work Values workbook.
pub const VALUES_WORKBOOK: &str = "Work Values workbook";

/// Convenient alias for fallible results returned throughout the crate.
pub type Result<T> = std::result::Result<T, EnrichError>;

/// Error type covering the failure cases that can occur while loading the
/// job titles, resolving Work Values, or writing the enriched workbook.
#[derive(Debug, Error)]
pub enum EnrichError {
    /// Wrapper for IO failures such as reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Raised when the run report cannot be serialised.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Errors bubbled up from the Excel writer implementation.
    #[error("Excel write error: {0}")]
    ExcelWrite(#[from] rust_xlsxwriter::XlsxError),

    /// Errors bubbled up when opening a workbook of any supported format.
    #[error("Excel read error: {0}")]
    ExcelRead(#[from] calamine::Error),

    /// Errors bubbled up when parsing an in-memory xlsx payload.
    #[error("Excel read error: {0}")]
    Xlsx(#[from] calamine::XlsxError),

    /// Raised when a sheet does not follow the expected conventions.
    #[error("invalid workbook structure: {0}")]
    InvalidWorkbook(String),

    /// Raised when a workbook lacks a column the pipeline cannot run without.
    #[error("{workbook} is missing a required '{column}' column")]
    MissingRequiredColumn {
        column: &'static str,
        workbook: String,
    },

    /// Raised when the Work Values workbook cannot be fetched or opened.
    #[error("could not load Work Values from {location}: {reason}")]
    ValuesSourceUnreachable { location: String, reason: String },

    /// Raised when the Work Values sheet is neither the wide nor the long layout.
    #[error(
        "Work Values sheet is neither a recognised wide nor long layout; available columns: {}",
        columns.join(", ")
    )]
    UnrecognizedValuesLayout { columns: Vec<String> },

    /// Raised when every candidate output name was locked.
    #[error("could not write {} after {attempts} attempts (file locked?)", target.display())]
    WriteConflict { target: PathBuf, attempts: u32 },

    /// Raised when the user provides a path that does not exist.
    #[error("input file not found: {0}")]
    MissingInput(PathBuf),

    /// Raised when the tracing subscriber fails to initialise.
    #[error("failed to initialise logging: {0}")]
    Logging(String),
}

impl EnrichError {
    /// Process exit status for the CLI: 2 for an unreadable input workbook,
    /// 3 for a missing input column, 4 for Work Values problems, 5 for a
    /// locked output and 1 for anything else.
    pub fn exit_code(&self) -> i32 {
        match self {
            EnrichError::MissingInput(_)
            | EnrichError::ExcelRead(_)
            | EnrichError::Xlsx(_)
            | EnrichError::InvalidWorkbook(_) => 2,
            EnrichError::MissingRequiredColumn { workbook, .. } if workbook == INPUT_WORKBOOK => 3,
            EnrichError::MissingRequiredColumn { .. }
            | EnrichError::ValuesSourceUnreachable { .. }
            | EnrichError::UnrecognizedValuesLayout { .. } => 4,
            EnrichError::WriteConflict { .. } => 5,
            EnrichError::Io(_)
            | EnrichError::Json(_)
            | EnrichError::ExcelWrite(_)
            | EnrichError::Logging(_) => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_follow_failure_stage() {
        assert_eq!(EnrichError::MissingInput(PathBuf::from("titles.xlsx")).exit_code(), 2);
        assert_eq!(EnrichError::InvalidWorkbook("missing sheet 'Mapped'".into()).exit_code(), 2);
        assert_eq!(
            EnrichError::MissingRequiredColumn {
                column: "SOC Code",
                workbook: INPUT_WORKBOOK.to_string(),
            }
            .exit_code(),
            3
        );
        assert_eq!(
            EnrichError::MissingRequiredColumn {
                column: "SOC Code",
                workbook: VALUES_WORKBOOK.to_string(),
            }
            .exit_code(),
            4
        );
        assert_eq!(
            EnrichError::ValuesSourceUnreachable {
                location: "https://example.invalid/Work%20Values.xlsx".into(),
                reason: "timed out".into(),
            }
            .exit_code(),
            4
        );
        assert_eq!(
            EnrichError::UnrecognizedValuesLayout { columns: vec!["Title".into()] }.exit_code(),
            4
        );
        assert_eq!(
            EnrichError::WriteConflict {
                target: PathBuf::from("out.xlsx"),
                attempts: 10,
            }
            .exit_code(),
            5
        );
        assert_eq!(EnrichError::Logging("already set".into()).exit_code(), 1);
    }
}
