use std::collections::HashMap;
use std::fmt;

/// Represents a single spreadsheet cell value. Passthrough columns keep their
/// variant from the input workbook to the output workbook.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Cell {
    /// Blank cell.
    #[default]
    Empty,
    /// Plain text.
    Text(String),
    /// Numeric value.
    Number(f64),
    /// Boolean value.
    Boolean(bool),
    /// Date or date-time stored as an Excel serial number.
    Date(f64),
}

impl Cell {
    /// Returns `true` when the cell has no content or only whitespace.
    pub fn is_blank(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Text(value) => value.trim().is_empty(),
            _ => false,
        }
    }

    /// Renders the cell as text. Whole numbers are printed without a decimal
    /// part so numeric SOC codes such as `514121` survive the conversion.
    pub fn to_text(&self) -> String {
        match self {
            Cell::Empty => String::new(),
            Cell::Text(value) => value.clone(),
            Cell::Number(value) | Cell::Date(value) => format_number(*value),
            Cell::Boolean(value) => value.to_string(),
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_text())
    }
}

fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}

/// A sheet loaded into memory: trimmed headers plus rows padded to the
/// header width.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl Table {
    /// Returns the cell at `column` of `row`, or an empty cell when out of range.
    pub fn cell<'a>(row: &'a [Cell], column: usize) -> &'a Cell {
        static EMPTY: Cell = Cell::Empty;
        row.get(column).unwrap_or(&EMPTY)
    }
}

/// The six O*NET Work Values dimensions, in canonical output order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum WorkValue {
    Achievement,
    Independence,
    Recognition,
    Relationships,
    Support,
    WorkingConditions,
}

impl WorkValue {
    /// All values in the order they are appended to the output.
    pub const ALL: [WorkValue; 6] = [
        WorkValue::Achievement,
        WorkValue::Independence,
        WorkValue::Recognition,
        WorkValue::Relationships,
        WorkValue::Support,
        WorkValue::WorkingConditions,
    ];

    /// Canonical column name.
    pub fn name(self) -> &'static str {
        match self {
            WorkValue::Achievement => "Achievement",
            WorkValue::Independence => "Independence",
            WorkValue::Recognition => "Recognition",
            WorkValue::Relationships => "Relationships",
            WorkValue::Support => "Support",
            WorkValue::WorkingConditions => "Working Conditions",
        }
    }

    /// Position of the value in [`WorkValue::ALL`].
    pub fn index(self) -> usize {
        self as usize
    }
}

/// Six value cells ordered like [`WorkValue::ALL`].
pub type Scores = [Cell; 6];

/// Work Values for one occupation.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkValueRecord {
    /// Normalized SOC code.
    pub soc_code: String,
    pub scores: Scores,
}

impl WorkValueRecord {
    pub fn new(soc_code: impl Into<String>, scores: Scores) -> Self {
        Self {
            soc_code: soc_code.into(),
            scores,
        }
    }

    pub fn score(&self, value: WorkValue) -> &Cell {
        &self.scores[value.index()]
    }
}

/// In-memory lookup from normalized SOC code to its Work Values.
#[derive(Debug, Clone, Default)]
pub struct ValueTable {
    entries: HashMap<String, WorkValueRecord>,
}

impl ValueTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a record, replacing and returning any earlier record for the
    /// same SOC code.
    pub fn insert(&mut self, record: WorkValueRecord) -> Option<WorkValueRecord> {
        self.entries.insert(record.soc_code.clone(), record)
    }

    pub fn get(&self, soc_code: &str) -> Option<&WorkValueRecord> {
        self.entries.get(soc_code)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<WorkValueRecord> for ValueTable {
    fn from_iter<I: IntoIterator<Item = WorkValueRecord>>(iter: I) -> Self {
        let mut table = ValueTable::new();
        for record in iter {
            table.insert(record);
        }
        table
    }
}

/// One row of the job titles sheet after header normalization.
#[derive(Debug, Clone, PartialEq)]
pub struct JobTitleRecord {
    pub job_title: Cell,
    /// Head count; `1` when the column is missing or the cell is blank.
    pub head_count: Cell,
    /// Normalized SOC code.
    pub soc_code: String,
    /// Occupational title, falling back to the job title.
    pub occupational_title: Cell,
    /// Output cells for the input columns, aligned with
    /// [`JobTitleSheet::columns`](crate::input::JobTitleSheet::columns).
    pub cells: Vec<Cell>,
}

/// A job title record with its Work Values attached.
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichedRecord {
    pub record: JobTitleRecord,
    /// `None` when the SOC code had no entry in the value table.
    pub values: Option<WorkValueRecord>,
}

impl EnrichedRecord {
    pub fn is_matched(&self) -> bool {
        self.values.is_some()
    }

    /// The six appended cells in [`WorkValue::ALL`] order, blank when unmatched.
    pub fn score_cells(&self) -> Scores {
        match &self.values {
            Some(values) => WorkValue::ALL.map(|value| values.score(value).clone()),
            None => Scores::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whole_numbers_render_without_fraction() {
        assert_eq!(Cell::Number(514121.0).to_text(), "514121");
        assert_eq!(Cell::Number(3.67).to_text(), "3.67");
        assert!(Cell::Text("  ".into()).is_blank());
        assert!(!Cell::Number(0.0).is_blank());
    }

    #[test]
    fn value_table_keeps_last_record() {
        let first = WorkValueRecord::new("11-1011.00", Default::default());
        let mut scores: Scores = Default::default();
        scores[0] = Cell::Number(5.0);
        let second = WorkValueRecord::new("11-1011.00", scores);

        let table: ValueTable = vec![first, second].into_iter().collect();
        assert_eq!(table.len(), 1);
        let record = table.get("11-1011.00").expect("record present");
        assert_eq!(record.score(WorkValue::Achievement), &Cell::Number(5.0));
    }
}
