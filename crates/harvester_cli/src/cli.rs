use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, ValueEnum};
use harvest_logging::LogDestination;
use harvester_engine::SinkFormat;
use log::LevelFilter;

#[derive(Parser, Debug)]
#[command(name = "catalog-harvest")]
#[command(author, version, about = "Exhaustively harvest a numeric-id catalog into a flat dataset")]
pub struct Cli {
    /// RON file with harvest settings; flags and environment override it
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(flatten)]
    pub overrides: Overrides,

    /// Dataset file; parent directories are created
    #[arg(short, long, default_value = "catalog.jsonl")]
    pub output: PathBuf,

    /// Dataset format (guessed from the output extension when omitted)
    #[arg(short, long, value_enum)]
    pub format: Option<FormatArg>,

    /// Run manifest path (defaults to the dataset path with `.manifest.json`)
    #[arg(long, value_name = "PATH")]
    pub summary: Option<PathBuf>,

    /// Also write the log to this file
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Log a progress tally every N probed ids
    #[arg(long, default_value_t = 500)]
    pub progress_every: u64,

    /// More output (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

/// Settings that may also come from the config file or the environment.
#[derive(Args, Debug, Default, Clone, PartialEq, Eq)]
pub struct Overrides {
    /// Catalog api key
    #[arg(long, env = "CATALOG_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Catalog base url
    #[arg(long, env = "CATALOG_BASE_URL")]
    pub base_url: Option<String>,

    /// Consecutive misses that end the harvest
    #[arg(long)]
    pub miss_threshold: Option<u64>,

    /// Delay between requests in milliseconds
    #[arg(long)]
    pub pacing_ms: Option<u64>,

    /// Region whose certification is kept (ISO 3166-1 alpha-2)
    #[arg(long)]
    pub region: Option<String>,

    /// Requests in flight (1 = sequential)
    #[arg(long)]
    pub concurrency: Option<usize>,

    /// Extra attempts for a transient failure (default 0)
    #[arg(long)]
    pub retries: Option<u32>,

    /// Do not count transient failures toward the miss streak
    #[arg(long)]
    pub ignore_transient: bool,

    /// First id to probe
    #[arg(long)]
    pub start_id: Option<u64>,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatArg {
    Jsonl,
    Tsv,
    Csv,
}

impl From<FormatArg> for SinkFormat {
    fn from(format: FormatArg) -> Self {
        match format {
            FormatArg::Jsonl => SinkFormat::JsonLines,
            FormatArg::Tsv => SinkFormat::Tsv,
            FormatArg::Csv => SinkFormat::Csv,
        }
    }
}

impl Cli {
    pub fn sink_format(&self) -> SinkFormat {
        self.format
            .map(SinkFormat::from)
            .unwrap_or_else(|| SinkFormat::from_path(&self.output))
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.summary
            .clone()
            .unwrap_or_else(|| self.output.with_extension("manifest.json"))
    }

    pub fn log_level(&self) -> LevelFilter {
        match self.verbose {
            0 => LevelFilter::Info,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    }

    pub fn log_destination(&self) -> LogDestination {
        match &self.log_file {
            Some(path) => LogDestination::Both(path.clone()),
            None => LogDestination::Terminal,
        }
    }
}
