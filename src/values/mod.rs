//! Conversion of the Work Values sheet into a [`ValueTable`].
//!
//! Two layouts are recognised:
//!
//! * **wide**: one row per occupation with a column per Work Value;
//! * **long**: the O*NET distribution layout with one row per
//!   (SOC code, element, scale), where `Element Name` names the Work Value and
//!   `Data Value` carries the score.
//!
//! The wide layout is tried first; the long layout is the fallback.

use std::collections::hash_map::Entry;
use std::collections::{BTreeSet, HashMap};

use chrono::NaiveDate;
use tracing::{debug, info, warn};

use crate::error::{EnrichError, Result, VALUES_WORKBOOK};
use crate::model::{Cell, Scores, Table, ValueTable, WorkValue, WorkValueRecord};
use crate::normalize::{
    Field, canonical_key, normalize_soc, work_value_aliases, work_value_from_header,
};

/// Scale names preferred in the long layout, most preferred first.
const PREFERRED_SCALES: [&str; 2] = ["importance", "extent"];

/// Builds the value table from a loaded Work Values sheet.
pub fn build_value_table(table: &Table) -> Result<ValueTable> {
    let soc_column = find_soc_column(&table.headers).ok_or_else(|| {
        EnrichError::MissingRequiredColumn {
            column: Field::SocCode.name(),
            workbook: VALUES_WORKBOOK.to_string(),
        }
    })?;

    if let Some(value_columns) = find_wide_columns(&table.headers) {
        debug!(soc_column, ?value_columns, "using wide Work Values layout");
        return Ok(from_wide(table, soc_column, &value_columns));
    }

    let Some(layout) = LongLayout::detect(&table.headers, soc_column) else {
        return Err(EnrichError::UnrecognizedValuesLayout {
            columns: table.headers.clone(),
        });
    };
    debug!(?layout, "using long Work Values layout");
    from_long(table, &layout)
}

fn find_soc_column(headers: &[String]) -> Option<usize> {
    headers
        .iter()
        .position(|header| Field::from_header(header) == Some(Field::SocCode))
        .or_else(|| {
            headers.iter().position(|header| {
                let key = canonical_key(header);
                key.contains("soc") && key.contains("code")
            })
        })
}

fn find_column(headers: &[String], names: &[&str]) -> Option<usize> {
    headers.iter().position(|header| {
        let key = canonical_key(header);
        names.iter().any(|name| canonical_key(name) == key)
    })
}

/// Locates all six value columns, or `None` when any is missing.
fn find_wide_columns(headers: &[String]) -> Option<[usize; 6]> {
    let keys: Vec<String> = headers.iter().map(|header| canonical_key(header)).collect();
    let mut columns = [0usize; 6];
    for value in WorkValue::ALL {
        let aliases = work_value_aliases(value);
        let exact = keys
            .iter()
            .position(|key| aliases.contains(&key.as_str()));
        let contained = || {
            aliases
                .iter()
                .find_map(|alias| keys.iter().position(|key| key.contains(alias)))
        };
        columns[value.index()] = exact.or_else(contained)?;
    }
    Some(columns)
}

fn from_wide(table: &Table, soc_column: usize, value_columns: &[usize; 6]) -> ValueTable {
    let mut values = ValueTable::new();
    let mut replaced = 0usize;
    for row in &table.rows {
        let soc_code = normalize_soc(&Table::cell(row, soc_column).to_text());
        if soc_code.is_empty() {
            continue;
        }
        let scores: Scores =
            std::array::from_fn(|slot| Table::cell(row, value_columns[slot]).clone());
        if values.insert(WorkValueRecord::new(soc_code, scores)).is_some() {
            replaced += 1;
        }
    }
    if replaced > 0 {
        warn!(replaced, "duplicate SOC codes in Work Values; keeping the last row");
    }
    info!(occupation_count = values.len(), "built Work Values table");
    values
}

#[derive(Debug, Clone, Copy)]
struct LongLayout {
    soc: usize,
    element: usize,
    value: usize,
    scale: Option<usize>,
    date: Option<usize>,
}

impl LongLayout {
    fn detect(headers: &[String], soc: usize) -> Option<Self> {
        Some(Self {
            soc,
            element: find_column(headers, &["Element Name"])?,
            value: find_column(headers, &["Data Value"])?,
            scale: find_column(headers, &["Scale Name", "Scale"]),
            date: find_column(headers, &["Date"]),
        })
    }
}

/// Best candidate seen so far for one (SOC code, value) pair.
struct Observation {
    date: Option<f64>,
    score: Cell,
}

fn from_long(table: &Table, layout: &LongLayout) -> Result<ValueTable> {
    let candidates: Vec<(&[Cell], WorkValue)> = table
        .rows
        .iter()
        .filter_map(|row| {
            let element = Table::cell(row, layout.element).to_text();
            work_value_from_header(&element).map(|value| (row.as_slice(), value))
        })
        .collect();

    if candidates.is_empty() {
        return Err(EnrichError::InvalidWorkbook(
            "no Work Values found in the 'Element Name' column".into(),
        ));
    }

    let candidates = match layout.scale {
        Some(scale) => prefer_scale(candidates, scale),
        None => candidates,
    };

    let mut observations: HashMap<(String, WorkValue), Observation> = HashMap::new();
    for (row, value) in candidates {
        let soc_code = normalize_soc(&Table::cell(row, layout.soc).to_text());
        if soc_code.is_empty() {
            continue;
        }
        let observation = Observation {
            date: layout
                .date
                .and_then(|column| date_key(Table::cell(row, column))),
            score: Table::cell(row, layout.value).clone(),
        };
        match observations.entry((soc_code, value)) {
            Entry::Occupied(mut slot) => {
                if is_newer_or_equal(observation.date, slot.get().date) {
                    slot.insert(observation);
                }
            }
            Entry::Vacant(slot) => {
                slot.insert(observation);
            }
        }
    }

    let soc_codes: BTreeSet<&String> = observations
        .keys()
        .map(|(soc_code, _)| soc_code)
        .collect();
    let values: ValueTable = soc_codes
        .into_iter()
        .map(|soc_code| {
            let scores: Scores = std::array::from_fn(|slot| {
                observations
                    .get(&(soc_code.clone(), WorkValue::ALL[slot]))
                    .map(|observation| observation.score.clone())
                    .unwrap_or_default()
            });
            WorkValueRecord::new(soc_code.clone(), scores)
        })
        .collect();
    info!(occupation_count = values.len(), "built Work Values table");
    Ok(values)
}

fn prefer_scale(
    candidates: Vec<(&[Cell], WorkValue)>,
    scale: usize,
) -> Vec<(&[Cell], WorkValue)> {
    for preferred in PREFERRED_SCALES {
        let on_scale = |row: &[Cell]| {
            Table::cell(row, scale)
                .to_text()
                .to_lowercase()
                .contains(preferred)
        };
        if candidates.iter().any(|(row, _)| on_scale(*row)) {
            debug!(scale = preferred, "filtering Work Values by scale");
            return candidates
                .into_iter()
                .filter(|(row, _)| on_scale(*row))
                .collect();
        }
    }
    candidates
}

/// Undated rows lose against dated ones; equal dates go to the later row.
fn is_newer_or_equal(candidate: Option<f64>, current: Option<f64>) -> bool {
    match (candidate, current) {
        (Some(candidate), Some(current)) => candidate >= current,
        (Some(_), None) => true,
        (None, Some(_)) => false,
        (None, None) => true,
    }
}

/// Converts a date cell into an Excel serial so dates of any notation compare.
fn date_key(cell: &Cell) -> Option<f64> {
    match cell {
        Cell::Date(serial) | Cell::Number(serial) => Some(*serial),
        Cell::Text(text) => parse_date_text(text),
        _ => None,
    }
}

fn parse_date_text(text: &str) -> Option<f64> {
    let text = text.trim();
    let date = NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(text, "%m/%d/%Y"))
        .ok()
        .or_else(|| {
            let (month, year) = text.split_once('/')?;
            NaiveDate::from_ymd_opt(year.trim().parse().ok()?, month.trim().parse().ok()?, 1)
        })?;
    let excel_epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?;
    Some(date.signed_duration_since(excel_epoch).num_days() as f64)
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

    fn numbers(values: [f64; 6]) -> Scores {
        values.map(Cell::Number)
    }

    fn wide_row(soc: &str, values: [f64; 6]) -> Vec<Cell> {
        let mut row = vec![text(soc)];
        row.extend(values.map(Cell::Number));
        row
    }

    const WIDE_HEADERS: [&str; 7] = [
        "SOC Code",
        "Achievement",
        "Independence",
        "Recognition",
        "Relationships",
        "Support",
        "Working_Conditions",
    ];

    #[test]
    fn wide_layout_is_read_verbatim() {
        let values = build_value_table(&table(
            &WIDE_HEADERS,
            vec![wide_row("51-4121.00", [3.0, 2.67, 3.33, 3.0, 3.67, 3.0])],
        ))
        .expect("wide layout");

        let record = values.get("51-4121.00").expect("welder present");
        assert_eq!(record.scores, numbers([3.0, 2.67, 3.33, 3.0, 3.67, 3.0]));
    }

    #[test]
    fn wide_layout_keeps_last_duplicate() {
        let values = build_value_table(&table(
            &WIDE_HEADERS,
            vec![
                wide_row("51-4121.00", [1.0; 6]),
                wide_row("51412100", [2.0; 6]),
            ],
        ))
        .expect("wide layout");

        assert_eq!(values.len(), 1);
        assert_eq!(values.get("51-4121.00").map(|r| &r.scores), Some(&numbers([2.0; 6])));
    }

    #[test]
    fn wide_value_columns_match_by_containment() {
        let values = build_value_table(&table(
            &[
                "Occupation SOC Code",
                "Achievement (Score)",
                "Independence",
                "Recognition",
                "Relationship",
                "Support",
                "Work Conditions",
            ],
            vec![wide_row("13-1081.00", [4.0, 3.5, 3.0, 2.5, 2.0, 1.5])],
        ))
        .expect("tolerant headers");

        let record = values.get("13-1081.00").expect("logistician present");
        assert_eq!(record.score(WorkValue::Achievement), &Cell::Number(4.0));
        assert_eq!(record.score(WorkValue::WorkingConditions), &Cell::Number(1.5));
    }

    fn long_row(soc: &str, element: &str, scale: &str, value: f64, date: &str) -> Vec<Cell> {
        vec![
            text(soc),
            text(element),
            text(scale),
            Cell::Number(value),
            text(date),
        ]
    }

    const LONG_HEADERS: [&str; 5] = [
        "O*NET-SOC Code",
        "Element Name",
        "Scale Name",
        "Data Value",
        "Date",
    ];

    #[test]
    fn long_layout_prefers_extent_and_latest_date() {
        let values = build_value_table(&table(
            &LONG_HEADERS,
            vec![
                long_row("51-4121.00", "Achievement", "Extent", 2.5, "06/2010"),
                long_row("51-4121.00", "Achievement", "Extent", 3.0, "07/2014"),
                long_row("51-4121.00", "Achievement", "Extent", 1.0, "07/2011"),
                long_row("51-4121.00", "First Work Value High-Point", "Work Values High-Point", 1.0, "07/2014"),
                long_row("51-4121.00", "Independence", "Work Values High-Point", 9.0, "07/2014"),
                long_row("51-4121.00", "Independence", "Extent", 2.67, "07/2014"),
                long_row("51-4121.00", "Working Conditions", "Extent", 3.0, "07/2014"),
            ],
        ))
        .expect("long layout");

        let record = values.get("51-4121.00").expect("welder present");
        assert_eq!(record.score(WorkValue::Achievement), &Cell::Number(3.0));
        assert_eq!(record.score(WorkValue::Independence), &Cell::Number(2.67));
        assert_eq!(record.score(WorkValue::WorkingConditions), &Cell::Number(3.0));
        assert_eq!(record.score(WorkValue::Support), &Cell::Empty);
    }

    #[test]
    fn long_layout_ties_go_to_last_row() {
        let values = build_value_table(&table(
            &["SOC", "Element Name", "Data Value"],
            vec![
                vec![text("11-1011.00"), text("Support"), Cell::Number(1.0)],
                vec![text("11-1011.00"), text("support"), Cell::Number(2.0)],
            ],
        ))
        .expect("long layout without scale or date");

        let record = values.get("11-1011.00").expect("chief executives present");
        assert_eq!(record.score(WorkValue::Support), &Cell::Number(2.0));
    }

    #[test]
    fn missing_soc_column_is_reported() {
        let error = build_value_table(&table(&["Occupation", "Achievement"], Vec::new()))
            .expect_err("no SOC column");
        assert!(matches!(error, EnrichError::MissingRequiredColumn { .. }));
    }

    #[test]
    fn unknown_layout_lists_columns() {
        let error = build_value_table(&table(&["SOC Code", "Achievement", "Notes"], Vec::new()))
            .expect_err("neither wide nor long");
        match error {
            EnrichError::UnrecognizedValuesLayout { columns } => {
                assert_eq!(columns, vec!["SOC Code", "Achievement", "Notes"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn date_notations_compare() {
        let month_year = parse_date_text("07/2014").expect("month/year");
        let iso = parse_date_text("2014-07-01").expect("iso");
        let us = parse_date_text("07/01/2014").expect("us");
        assert_eq!(month_year, iso);
        assert_eq!(iso, us);
        assert!(parse_date_text("06/2014").expect("earlier") < iso);
        assert_eq!(parse_date_text("soon"), None);
    }
}
