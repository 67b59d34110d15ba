use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use onet_work_values::io::excel_write::DEFAULT_MAX_ATTEMPTS;
use onet_work_values::io::source::ValuesSource;
use onet_work_values::pipeline::{self, DEFAULT_OUTPUT, EnrichConfig};
use onet_work_values::{EnrichError, Result};
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = Cli::parse();
    if let Err(error) = init_tracing().and_then(|()| run(cli)) {
        eprintln!("error: {error}");
        std::process::exit(error.exit_code());
    }
}

fn init_tracing() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|error| EnrichError::Logging(error.to_string()))
}

fn run(cli: Cli) -> Result<()> {
    let report_path = cli.report.clone();
    let config = cli.into_config();
    let report = pipeline::run(&config)?;

    if let Some(path) = report_path {
        pipeline::write_report(&report, &path)?;
    }
    if let Some(output) = &report.output {
        println!("Saved: {}", output.display());
    }
    Ok(())
}

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Enrich company job titles with O*NET Work Values by SOC code."
)]
struct Cli {
    /// Job titles workbook, e.g. "Company Job Titles - Mapped.xlsx".
    #[arg(long = "input_excel", alias = "input-excel")]
    input_excel: PathBuf,

    /// Local path or http(s) URL of the O*NET "Work Values.xlsx" workbook.
    #[arg(long = "onet_values_url", alias = "onet-values-url")]
    onet_values_url: String,

    /// Output workbook path.
    #[arg(long = "output_excel", alias = "output-excel", default_value = DEFAULT_OUTPUT)]
    output_excel: PathBuf,

    /// Sheet of the job titles workbook to read (defaults to the first sheet).
    #[arg(long = "input_sheet", alias = "input-sheet")]
    input_sheet: Option<String>,

    /// Sheet of the Work Values workbook to read (defaults to the first sheet).
    #[arg(long = "values_sheet", alias = "values-sheet")]
    values_sheet: Option<String>,

    /// Number of output names to try when the target file is locked.
    #[arg(long = "max_write_attempts", alias = "max-write-attempts", default_value_t = DEFAULT_MAX_ATTEMPTS)]
    max_write_attempts: u32,

    /// Timeout in seconds for downloading a remote Work Values workbook.
    #[arg(long = "timeout_secs", alias = "timeout-secs", default_value_t = 60)]
    timeout_secs: u64,

    /// Optional path receiving a JSON summary of the run.
    #[arg(long)]
    report: Option<PathBuf>,
}

impl Cli {
    fn into_config(self) -> EnrichConfig {
        let mut config = EnrichConfig::new(
            self.input_excel,
            ValuesSource::parse(&self.onet_values_url),
        )
        .with_output(self.output_excel);
        config.input_sheet = self.input_sheet;
        config.values_sheet = self.values_sheet;
        config.max_write_attempts = self.max_write_attempts;
        config.fetch_timeout = Duration::from_secs(self.timeout_secs);
        config
    }
}
