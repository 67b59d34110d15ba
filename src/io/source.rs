use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::{debug, info, instrument};

use crate::error::{EnrichError, Result};
use crate::io::excel_read;
use crate::model::Table;

/// Default timeout applied to remote downloads.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(60);

/// Location of the Work Values workbook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValuesSource {
    /// Workbook on the local filesystem.
    Path(PathBuf),
    /// Workbook downloaded over HTTP(S), e.g. a GitHub raw URL.
    Url(String),
}

impl ValuesSource {
    /// Treats `http://` and `https://` locations as URLs and everything else as
    /// a local path.
    pub fn parse(location: &str) -> Self {
        let trimmed = location.trim();
        let lower = trimmed.to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            ValuesSource::Url(trimmed.to_string())
        } else {
            ValuesSource::Path(PathBuf::from(trimmed))
        }
    }

    /// Loads the selected sheet. Every failure to obtain or open the workbook
    /// is reported as [`EnrichError::ValuesSourceUnreachable`].
    #[instrument(level = "info", skip(self), fields(source = %self))]
    pub fn load(&self, sheet: Option<&str>, timeout: Duration) -> Result<Table> {
        let loaded = match self {
            ValuesSource::Path(path) => load_path(path, sheet),
            ValuesSource::Url(url) => fetch(url, timeout)
                .and_then(|bytes| excel_read::read_table_from_bytes(bytes, sheet)),
        };
        let table = loaded.map_err(|error| match error {
            EnrichError::ValuesSourceUnreachable { .. } => error,
            other => EnrichError::ValuesSourceUnreachable {
                location: self.to_string(),
                reason: other.to_string(),
            },
        })?;
        info!(
            column_count = table.headers.len(),
            row_count = table.rows.len(),
            "loaded Work Values sheet"
        );
        Ok(table)
    }
}

impl fmt::Display for ValuesSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValuesSource::Path(path) => write!(f, "{}", path.display()),
            ValuesSource::Url(url) => f.write_str(url),
        }
    }
}

fn load_path(path: &Path, sheet: Option<&str>) -> Result<Table> {
    if !path.exists() {
        return Err(EnrichError::MissingInput(path.to_path_buf()));
    }
    excel_read::read_table(path, sheet)
}

fn fetch(url: &str, timeout: Duration) -> Result<Vec<u8>> {
    let client = reqwest::blocking::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|error| fetch_error(url, &error))?;
    let response = client
        .get(url)
        .send()
        .and_then(|response| response.error_for_status())
        .map_err(|error| fetch_error(url, &error))?;
    let bytes = response.bytes().map_err(|error| fetch_error(url, &error))?;
    debug!(byte_count = bytes.len(), "downloaded Work Values workbook");
    Ok(bytes.to_vec())
}

fn fetch_error(url: &str, error: &reqwest::Error) -> EnrichError {
    EnrichError::ValuesSourceUnreachable {
        location: url.to_string(),
        reason: error.to_string(),
    }
}
