// src/main.rs
// =============================================================================
// This is the entry point of the geodiff CLI.
//
// What happens here:
// 1. Parse command-line arguments and set up logging
// 2. Load the config and the list of URLs (fatal on any problem)
// 3. Push every URL through the worker pool
// 4. Exit with a proper code (0 = nothing found, 1 = cloaking found, 2 = error)
// =============================================================================

mod checker; // src/checker/ - fetching, diffing, per-URL fan-out
mod cli; // src/cli.rs - command-line parsing
mod config; // src/config.rs - config file loading and validation
mod input; // src/input.rs - reading the URL list
mod output; // src/output.rs - terminal rendering
mod pipeline; // src/pipeline/ - worker pool and collector
mod progress; // src/progress.rs - progress bar
mod proxy; // src/proxy.rs - per-country proxy URLs
mod report; // src/report.rs - JSON snapshot file

use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use checker::{Checker, HttpFetcher};
use cli::Cli;
use config::Config;
use output::{JsonLinesSink, Palette, TerminalSink};
use pipeline::{Collector, Pipeline, PipelineOptions};
use progress::{ProgressReporter, TerminalProgress};
use proxy::GeoProxy;
use report::SnapshotSink;

#[tokio::main]
async fn main() {
    let exit_code = match run().await {
        Ok(code) => code,
        Err(e) => {
            // {:#} prints the whole context chain on one line
            eprintln!("Error: {:#}", e);
            2
        }
    };

    std::process::exit(exit_code);
}

// Returns:
//   Ok(0) = no URL serves different content per country
//   Ok(1) = at least one confirmed finding
//   Err   = configuration, input or runtime error
async fn run() -> Result<i32> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = Config::load(cli.config.as_deref())?;

    let countries = match &cli.countries {
        Some(countries) => {
            config::validate_countries(countries)?;
            countries.clone()
        }
        None => config.countries.clone(),
    };

    let urls = input::load_urls(cli.input.as_deref())?;
    if urls.is_empty() {
        bail!("no valid URLs found in input");
    }

    let palette = Palette::detect(cli.no_color);

    let checker = Checker::new(
        Arc::new(HttpFetcher::new()),
        Arc::new(GeoProxy::from(&config.proxy)),
        countries,
    )
    .with_stagger(Duration::from_millis(cli.stagger_ms));

    let pipeline = Pipeline::new(
        checker,
        PipelineOptions {
            concurrency: usize::from(cli.concurrency),
            verify: cli.verify,
        },
    );

    let collector = build_collector(&cli, palette);
    let progress = Arc::new(TerminalProgress::new(urls.len(), palette));

    let findings = pipeline.run(urls, progress.clone(), collector).await?;
    progress.finish();

    if let Some(path) = &cli.output {
        report::save_results(path, &findings)?;
    }

    info!(findings = findings.len(), "processing completed");

    if findings.is_empty() {
        Ok(0)
    } else {
        Ok(1)
    }
}

fn build_collector(cli: &Cli, palette: Palette) -> Collector {
    let mut collector = Collector::new();

    collector = if cli.json {
        collector.with_sink(JsonLinesSink::stdout())
    } else {
        collector.with_sink(TerminalSink::stdout(palette))
    };

    if let Some(path) = &cli.output {
        collector = collector.with_sink(SnapshotSink::new(path));
    }

    collector
}

// Logs go to stderr without timestamps; RUST_LOG overrides the default level.
fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();
}

// -----------------------------------------------------------------------------
// NOTES:
//
// 1. Why is the progress bar an Arc<TerminalProgress>?
//    - Every worker task advances it, so it is shared
//    - The pipeline only knows the ProgressReporter trait, main keeps the
//      concrete type to call finish() at the end
//
// 2. Why save the results again after the run?
//    - The snapshot sink only writes when a finding arrives
//    - Saving once more guarantees the output file exists (possibly with an
//      empty list) after every successful run
// -----------------------------------------------------------------------------
