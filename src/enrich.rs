use std::path::PathBuf;

use serde::Serialize;
use tracing::{debug, instrument};

use crate::model::{Cell, EnrichedRecord, JobTitleRecord, ValueTable};

/// Attaches Work Values to every job title record.
///
/// Records keep their input order. Unmatched records are still emitted with
/// blank value fields; the value table is only read.
#[instrument(
    level = "debug",
    skip_all,
    fields(record_count = records.len(), occupation_count = values.len())
)]
pub fn enrich(records: Vec<JobTitleRecord>, values: &ValueTable) -> Vec<EnrichedRecord> {
    records
        .into_iter()
        .map(|record| {
            let matched = values.get(&record.soc_code).cloned();
            if matched.is_none() {
                debug!(
                    soc_code = %record.soc_code,
                    job_title = %record.job_title,
                    occupational_title = %record.occupational_title,
                    "no Work Values for SOC code"
                );
            }
            EnrichedRecord {
                record,
                values: matched,
            }
        })
        .collect()
}

/// Summary of one enrichment run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnrichReport {
    pub input_rows: usize,
    pub matched: usize,
    pub unmatched: usize,
    /// Sum of numeric head counts over all rows.
    pub head_count: f64,
    /// Sum of numeric head counts over rows that received Work Values.
    pub matched_head_count: f64,
    /// Distinct non-blank SOC codes without Work Values, in first-seen order.
    pub unmatched_soc_codes: Vec<String>,
    /// Path the workbook was finally written to.
    pub output: Option<PathBuf>,
}

/// Counts matched and unmatched records and the head count they cover.
/// Non-numeric head counts are left out of the sums.
pub fn summarize(records: &[EnrichedRecord]) -> EnrichReport {
    let matched = records.iter().filter(|record| record.is_matched()).count();
    let head_count_of = |record: &EnrichedRecord| match record.record.head_count {
        Cell::Number(count) => count,
        _ => 0.0,
    };
    let head_count: f64 = records.iter().map(head_count_of).sum();
    let matched_head_count: f64 = records
        .iter()
        .filter(|record| record.is_matched())
        .map(head_count_of)
        .sum();
    let mut unmatched_soc_codes: Vec<String> = Vec::new();
    for record in records.iter().filter(|record| !record.is_matched()) {
        let soc_code = &record.record.soc_code;
        if !soc_code.is_empty() && !unmatched_soc_codes.contains(soc_code) {
            unmatched_soc_codes.push(soc_code.clone());
        }
    }
    EnrichReport {
        input_rows: records.len(),
        matched,
        unmatched: records.len() - matched,
        head_count,
        matched_head_count,
        unmatched_soc_codes,
        output: None,
    }
}
