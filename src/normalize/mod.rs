//! Tolerant header matching and SOC code normalization.
//!
//! Headers are compared by their canonical key: the lowercase header with
//! every non-alphanumeric character removed. `Working_Conditions`,
//! `working conditions` and `WorkingConditions` therefore share the key
//! `workingconditions`.

use crate::model::WorkValue;

/// Canonical job title column.
pub const JOB_TITLE: &str = "Job Title";
/// Canonical head count column.
pub const HEAD_COUNT: &str = "HeadCount";
/// Canonical SOC code column. The output always uses this exact name.
pub const SOC_CODE: &str = "SOC Code";
/// Canonical occupational title column.
pub const OCCUPATIONAL_TITLE: &str = "Occupational Title";

/// Fields of the job titles sheet that receive special treatment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    JobTitle,
    HeadCount,
    SocCode,
    OccupationalTitle,
}

impl Field {
    pub const ALL: [Field; 4] = [
        Field::JobTitle,
        Field::HeadCount,
        Field::SocCode,
        Field::OccupationalTitle,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Field::JobTitle => JOB_TITLE,
            Field::HeadCount => HEAD_COUNT,
            Field::SocCode => SOC_CODE,
            Field::OccupationalTitle => OCCUPATIONAL_TITLE,
        }
    }

    /// Accepted header spellings.
    pub fn synonyms(self) -> &'static [&'static str] {
        match self {
            Field::JobTitle => &["Job Title", "Job Titles"],
            Field::HeadCount => &["HeadCount", "Headcount", "Head Count", "HC"],
            Field::SocCode => &[
                "O*NET-SOC Code",
                "O*NET SOC Code",
                "SOC Code",
                "SOC",
                "Code",
                "SOC_Code",
                "O*NET-SOC Codes",
                "ONET SOC Code",
                "ONET SOC Codes",
                "ONET-SOC Code",
                "ONET-SOC Codes",
                "ONET Code",
                "ONET Codes",
                "Occupation Code",
            ],
            Field::OccupationalTitle => &[
                "Occupational Title",
                "Occupation Title",
                "ONET Title",
                "Title",
            ],
        }
    }

    /// Resolves a header to the field it names, if any.
    pub fn from_header(header: &str) -> Option<Field> {
        let key = canonical_key(header);
        Field::ALL.into_iter().find(|field| {
            field
                .synonyms()
                .iter()
                .any(|synonym| canonical_key(synonym) == key)
        })
    }
}

/// Canonical keys of accepted Work Value header spellings.
pub fn work_value_aliases(value: WorkValue) -> &'static [&'static str] {
    match value {
        WorkValue::Achievement => &["achievement"],
        WorkValue::Independence => &["independence"],
        WorkValue::Recognition => &["recognition"],
        WorkValue::Relationships => &["relationship", "relationships"],
        WorkValue::Support => &["support"],
        WorkValue::WorkingConditions => &[
            "workingconditions",
            "workconditions",
            "workingcondition",
            "workcondition",
        ],
    }
}

/// Resolves a header (or an O*NET element name) to a Work Value by exact
/// canonical match.
pub fn work_value_from_header(header: &str) -> Option<WorkValue> {
    let key = canonical_key(header);
    WorkValue::ALL
        .into_iter()
        .find(|value| work_value_aliases(*value).contains(&key.as_str()))
}

/// Maps a header to its canonical field name, or `None` when unrecognised.
///
/// The result is itself a recognised header, so the mapping is idempotent.
pub fn normalize_header(header: &str) -> Option<&'static str> {
    Field::from_header(header)
        .map(Field::name)
        .or_else(|| work_value_from_header(header).map(WorkValue::name))
}

/// Lowercases the header and strips everything that is not alphanumeric.
pub fn canonical_key(header: &str) -> String {
    header
        .chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Normalizes a SOC code to the O*NET `##-####.##` form.
///
/// Codes carrying letters are only trimmed and uppercased. Otherwise the
/// digits decide: eight digits become `##-####.##`, six digits are treated as
/// the base occupation `##-####.00`, anything else is returned trimmed.
pub fn normalize_soc(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.chars().any(char::is_alphabetic) {
        return trimmed.to_uppercase();
    }

    let digits: String = trimmed.chars().filter(char::is_ascii_digit).collect();
    match digits.len() {
        8 => format!("{}-{}.{}", &digits[..2], &digits[2..6], &digits[6..]),
        6 => format!("{}-{}.00", &digits[..2], &digits[2..]),
        _ => trimmed.to_string(),
    }
}

/// Column positions of the special fields within a header row. The first
/// matching column wins.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HeaderIndex {
    pub job_title: Option<usize>,
    pub head_count: Option<usize>,
    pub soc_code: Option<usize>,
    pub occupational_title: Option<usize>,
}

impl HeaderIndex {
    pub fn resolve<S: AsRef<str>>(headers: &[S]) -> Self {
        let mut index = HeaderIndex::default();
        for (position, header) in headers.iter().enumerate() {
            let Some(field) = Field::from_header(header.as_ref()) else {
                continue;
            };
            let slot = index.slot_mut(field);
            if slot.is_none() {
                *slot = Some(position);
            }
        }
        index
    }

    pub fn position(&self, field: Field) -> Option<usize> {
        match field {
            Field::JobTitle => self.job_title,
            Field::HeadCount => self.head_count,
            Field::SocCode => self.soc_code,
            Field::OccupationalTitle => self.occupational_title,
        }
    }

    /// Returns the field whose resolved column is `position`.
    pub fn field_at(&self, position: usize) -> Option<Field> {
        Field::ALL
            .into_iter()
            .find(|field| self.position(*field) == Some(position))
    }

    fn slot_mut(&mut self, field: Field) -> &mut Option<usize> {
        match field {
            Field::JobTitle => &mut self.job_title,
            Field::HeadCount => &mut self.head_count,
            Field::SocCode => &mut self.soc_code,
            Field::OccupationalTitle => &mut self.occupational_title,
        }
    }
}
