use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::{info, instrument, warn};

use crate::enrich::{EnrichReport, enrich, summarize};
use crate::error::{EnrichError, Result};
use crate::input::JobTitleSheet;
use crate::io::excel_read;
use crate::io::excel_write::{self, DEFAULT_MAX_ATTEMPTS};
use crate::io::source::{DEFAULT_FETCH_TIMEOUT, ValuesSource};
use crate::values::build_value_table;

/// Default output file name.
pub const DEFAULT_OUTPUT: &str = "Company Job Titles - Mapped.with_work_values.xlsx";

/// Settings for one enrichment run.
#[derive(Debug, Clone)]
pub struct EnrichConfig {
    /// Job titles workbook.
    pub input: PathBuf,
    /// Work Values workbook, local or remote.
    pub values: ValuesSource,
    /// Requested output path; the written path may carry a `(N)` suffix.
    pub output: PathBuf,
    pub input_sheet: Option<String>,
    pub values_sheet: Option<String>,
    pub max_write_attempts: u32,
    pub fetch_timeout: Duration,
}

impl EnrichConfig {
    pub fn new(input: impl Into<PathBuf>, values: ValuesSource) -> Self {
        Self {
            input: input.into(),
            values,
            output: PathBuf::from(DEFAULT_OUTPUT),
            input_sheet: None,
            values_sheet: None,
            max_write_attempts: DEFAULT_MAX_ATTEMPTS,
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
        }
    }

    pub fn with_output(mut self, output: impl Into<PathBuf>) -> Self {
        self.output = output.into();
        self
    }
}

/// Loads the job titles, joins the Work Values and writes the enriched
/// workbook. No output is written when any input fails to load.
#[instrument(
    level = "info",
    skip_all,
    fields(
        input = %config.input.display(),
        values = %config.values,
        output = %config.output.display()
    )
)]
pub fn run(config: &EnrichConfig) -> Result<EnrichReport> {
    if !config.input.exists() {
        return Err(EnrichError::MissingInput(config.input.clone()));
    }

    let table = excel_read::read_table(&config.input, config.input_sheet.as_deref())?;
    let sheet = JobTitleSheet::from_table(table)?;

    let values_table = config
        .values
        .load(config.values_sheet.as_deref(), config.fetch_timeout)?;
    let values = build_value_table(&values_table)?;

    let enriched = enrich(sheet.records, &values);
    let mut report = summarize(&enriched);
    if report.unmatched > 0 {
        warn!(
            unmatched = report.unmatched,
            soc_codes = ?report.unmatched_soc_codes,
            "job titles without Work Values; value fields left blank"
        );
    }

    let written = excel_write::write_enriched(
        &config.output,
        &sheet.columns,
        &enriched,
        config.max_write_attempts,
    )?;
    info!(
        path = %written.display(),
        matched = report.matched,
        rows = report.input_rows,
        matched_head_count = report.matched_head_count,
        "enriched workbook written"
    );
    report.output = Some(written);
    Ok(report)
}

/// Persists the run report as pretty-printed JSON.
pub fn write_report(report: &EnrichReport, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(report)?;
    fs::write(path, json)?;
    Ok(())
}
