//! Command-line entry point: resolve settings, harvest until the id space is
//! exhausted, then write the run manifest.

mod cli;
mod settings;

use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use clap::Parser;
use harvest_logging::{harvest_error, harvest_info};
use harvester_engine::{
    open_sink, write_manifest, Harvester, LogProgressSink, ManifestSettings, NormalizedRecord,
    ReqwestFetcher, RunManifest,
};

use crate::cli::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    harvest_logging::initialize(cli.log_destination(), cli.log_level());

    let result = run(cli).await;
    if let Err(err) = &result {
        harvest_error!("Harvest failed: {:#}", err);
    }
    result
}

async fn run(cli: Cli) -> Result<()> {
    let config = settings::resolve(cli.config.as_deref(), &cli.overrides)?;
    harvest_info!("Resolved settings: {:?}", config);

    let fetcher = ReqwestFetcher::new(config.endpoint()?, config.fetch_settings())
        .map_err(|err| anyhow!("building http client: {err}"))?;
    let harvester = Harvester::new(fetcher, &config);

    let format = cli.sink_format();
    let mut sink = open_sink(&cli.output, format)
        .with_context(|| format!("opening dataset {}", cli.output.display()))?;
    harvest_info!("Writing {:?} rows to {:?}", format, cli.output);

    let started_utc = Utc::now();
    let summary = harvester
        .run(sink.as_mut(), &LogProgressSink::new(cli.progress_every))
        .await
        .context("harvest aborted")?;
    drop(sink);

    let manifest = RunManifest {
        started_utc,
        finished_utc: Utc::now(),
        dataset: Some(cli.output.clone()),
        columns: NormalizedRecord::COLUMNS
            .iter()
            .map(|column| column.to_string())
            .collect(),
        settings: ManifestSettings::from(&config),
        summary,
    };
    let manifest_path = write_manifest(&cli.manifest_path(), &manifest)
        .context("writing run manifest")?;

    harvest_info!(
        "Wrote {} records to {:?}; manifest at {:?}",
        manifest.summary.records_written,
        cli.output,
        manifest_path
    );
    Ok(())
}
