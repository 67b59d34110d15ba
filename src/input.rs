//! Loading of the company job titles sheet.

use tracing::{debug, info, warn};

use crate::error::{EnrichError, INPUT_WORKBOOK, Result};
use crate::model::{Cell, JobTitleRecord, Table};
use crate::normalize::{
    Field, HEAD_COUNT, HeaderIndex, OCCUPATIONAL_TITLE, canonical_key, normalize_header,
    normalize_soc,
};

/// Suffix given to passthrough columns whose header would duplicate a
/// canonical or appended column.
const PASSTHROUGH_SUFFIX: &str = "input";

/// The job titles sheet after header normalization.
#[derive(Debug, Clone, PartialEq)]
pub struct JobTitleSheet {
    /// Output header for every input column, in original order, followed by
    /// any synthesized `HeadCount` / `Occupational Title` columns.
    pub columns: Vec<String>,
    pub records: Vec<JobTitleRecord>,
}

impl JobTitleSheet {
    /// Normalizes the headers of `table` and builds one record per row.
    ///
    /// Recognised columns are renamed to their canonical name and the SOC
    /// column carries normalized codes. A missing `HeadCount` column is
    /// appended with `1`, a missing `Occupational Title` column with the job
    /// title of the row. Unclaimed columns whose header names a canonical
    /// field or a Work Value are kept under a `(input)` suffix so every output
    /// header is unique.
    pub fn from_table(table: Table) -> Result<Self> {
        let index = HeaderIndex::resolve(&table.headers);
        let soc_position = required(&index, Field::SocCode)?;
        let job_position = required(&index, Field::JobTitle)?;

        let mut columns: Vec<String> = table
            .headers
            .iter()
            .enumerate()
            .map(|(position, header)| match index.field_at(position) {
                Some(field) => field.name().to_string(),
                None => header.clone(),
            })
            .collect();
        if index.head_count.is_none() {
            columns.push(HEAD_COUNT.to_string());
        }
        if index.occupational_title.is_none() {
            columns.push(OCCUPATIONAL_TITLE.to_string());
        }
        for position in 0..table.headers.len() {
            if index.field_at(position).is_some() {
                continue;
            }
            let header = &table.headers[position];
            let Some(canonical) = normalize_header(header) else {
                continue;
            };
            let renamed = unique_name(header, &columns);
            warn!(
                header = %header,
                canonical,
                renamed = %renamed,
                "column duplicates a canonical field; renamed"
            );
            columns[position] = renamed;
        }
        debug!(?columns, "resolved job title columns");

        let width = table.headers.len();
        let records = table
            .rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, Cell::Empty);
                build_record(row, &index, soc_position, job_position)
            })
            .collect::<Vec<_>>();

        info!(record_count = records.len(), "loaded job title records");
        Ok(Self { columns, records })
    }
}

/// Appends `(input)`, then `(input 2)`, ... until `header` no longer matches
/// any existing column or Work Value by canonical key.
fn unique_name(header: &str, columns: &[String]) -> String {
    let taken = |candidate: &str| {
        let key = canonical_key(candidate);
        normalize_header(candidate).is_some()
            || columns.iter().any(|column| canonical_key(column) == key)
    };
    let mut attempt = 1;
    loop {
        let candidate = if attempt == 1 {
            format!("{header} ({PASSTHROUGH_SUFFIX})")
        } else {
            format!("{header} ({PASSTHROUGH_SUFFIX} {attempt})")
        };
        if !taken(&candidate) {
            return candidate;
        }
        attempt += 1;
    }
}

fn required(index: &HeaderIndex, field: Field) -> Result<usize> {
    index
        .position(field)
        .ok_or_else(|| EnrichError::MissingRequiredColumn {
            column: field.name(),
            workbook: INPUT_WORKBOOK.to_string(),
        })
}

fn build_record(
    mut cells: Vec<Cell>,
    index: &HeaderIndex,
    soc_position: usize,
    job_position: usize,
) -> JobTitleRecord {
    let soc_code = normalize_soc(&Table::cell(&cells, soc_position).to_text());
    cells[soc_position] = if soc_code.is_empty() {
        Cell::Empty
    } else {
        Cell::Text(soc_code.clone())
    };

    let job_title = Table::cell(&cells, job_position).clone();

    let head_count = match index.head_count {
        Some(position) => Table::cell(&cells, position).clone(),
        None => {
            cells.push(Cell::Number(1.0));
            Cell::Number(1.0)
        }
    };
    let head_count = if head_count.is_blank() {
        Cell::Number(1.0)
    } else {
        head_count
    };

    let occupational_title = match index.occupational_title {
        Some(position) => Table::cell(&cells, position).clone(),
        None => {
            cells.push(job_title.clone());
            job_title.clone()
        }
    };
    let occupational_title = if occupational_title.is_blank() {
        job_title.clone()
    } else {
        occupational_title
    };

    JobTitleRecord {
        job_title,
        head_count,
        soc_code,
        occupational_title,
        cells,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(value: &str) -> Cell {
        Cell::Text(value.to_string())
    }

    fn table(headers: &[&str], rows: Vec<Vec<Cell>>) -> Table {
        Table {
            headers: headers.iter().map(|header| header.to_string()).collect(),
            rows,
        }
    }

    #[test]
    fn missing_headcount_and_title_are_synthesized() {
        let sheet = JobTitleSheet::from_table(table(
            &["Job Titles", "SOC", "Department"],
            vec![vec![text("Welder"), text("51-4121.00"), text("Fabrication")]],
        ))
        .expect("sheet loads");

        assert_eq!(
            sheet.columns,
            vec!["Job Title", "SOC Code", "Department", "HeadCount", "Occupational Title"]
        );
        let record = &sheet.records[0];
        assert_eq!(record.head_count, Cell::Number(1.0));
        assert_eq!(record.soc_code, "51-4121.00");
        assert_eq!(record.occupational_title, text("Welder"));
        assert_eq!(
            record.cells,
            vec![
                text("Welder"),
                text("51-4121.00"),
                text("Fabrication"),
                Cell::Number(1.0),
                text("Welder"),
            ]
        );
    }

    #[test]
    fn present_columns_keep_their_cells() {
        let sheet = JobTitleSheet::from_table(table(
            &["Occupational Title", "Headcount", "O*NET-SOC Code", "job_title"],
            vec![
                vec![text("Welders"), Cell::Number(4.0), Cell::Number(514121.0), text("Welder")],
                vec![Cell::Empty, Cell::Empty, text(" 13-1081 "), text("Logistician")],
            ],
        ))
        .expect("sheet loads");

        assert_eq!(
            sheet.columns,
            vec!["Occupational Title", "HeadCount", "SOC Code", "Job Title"]
        );
        assert_eq!(sheet.records[0].soc_code, "51-4121.00");
        assert_eq!(sheet.records[0].cells[2], text("51-4121.00"));
        assert_eq!(sheet.records[0].head_count, Cell::Number(4.0));

        let second = &sheet.records[1];
        assert_eq!(second.soc_code, "13-1081.00");
        assert_eq!(second.head_count, Cell::Number(1.0));
        assert_eq!(second.occupational_title, text("Logistician"));
        assert_eq!(second.cells[0], Cell::Empty);
        assert_eq!(second.cells[1], Cell::Empty);
    }

    #[test]
    fn duplicate_canonical_headers_are_renamed() {
        let sheet = JobTitleSheet::from_table(table(
            &["Job Title", "SOC", "SOC Code", "Achievement", "soc_code (input)"],
            vec![vec![
                text("Welder"),
                text("514121"),
                text("51-4121"),
                Cell::Number(9.0),
                text("legacy"),
            ]],
        ))
        .expect("sheet loads");

        assert_eq!(
            sheet.columns,
            vec![
                "Job Title",
                "SOC Code",
                "SOC Code (input 2)",
                "Achievement (input)",
                "soc_code (input)",
                "HeadCount",
                "Occupational Title",
            ]
        );
        let record = &sheet.records[0];
        assert_eq!(record.soc_code, "51-4121.00");
        assert_eq!(record.cells[1], text("51-4121.00"));
        assert_eq!(record.cells[2], text("51-4121"));
        assert_eq!(record.cells[3], Cell::Number(9.0));
    }

    #[test]
    fn output_headers_are_unique() {
        let sheet = JobTitleSheet::from_table(table(
            &["Job Titles", "Code", "Job_Title", "Working Conditions", "HeadCount"],
            Vec::new(),
        ))
        .expect("sheet loads");

        let headers = crate::io::excel_write::output_headers(&sheet.columns);
        let mut keys: Vec<String> = headers.iter().map(|header| canonical_key(header)).collect();
        keys.sort();
        keys.dedup();
        assert_eq!(keys.len(), headers.len(), "{headers:?}");
    }

    #[test]
    fn missing_soc_column_fails() {
        let error = JobTitleSheet::from_table(table(&["Job Title", "Team"], Vec::new()))
            .expect_err("no SOC column");
        assert!(matches!(
            error,
            EnrichError::MissingRequiredColumn { column: "SOC Code", .. }
        ));
    }

    #[test]
    fn missing_job_title_column_fails() {
        let error = JobTitleSheet::from_table(table(&["SOC Code", "Team"], Vec::new()))
            .expect_err("no job title column");
        assert!(matches!(
            error,
            EnrichError::MissingRequiredColumn { column: "Job Title", .. }
        ));
    }
}
