// src/cli.rs
// =============================================================================
// This file defines our command-line interface using the `clap` crate.
//
// We use the "derive" API: the CLI is a plain struct and clap generates the
// parsing code from the attributes on its fields.
//
// Example:
//   geodiff -i urls.txt -o results.json -c 10
//   cat urls.txt | geodiff --countries us,cn,de --verify false
// =============================================================================

use std::path::PathBuf;

use clap::{ArgAction, Parser};

use crate::checker::DEFAULT_STAGGER_MS;
use crate::pipeline::DEFAULT_CONCURRENCY;

#[derive(Parser, Debug)]
#[command(
    name = "geodiff",
    version,
    about = "Detects geo-based content cloaking by fetching URLs from several countries",
    long_about = "geodiff requests every URL through a geo-targeting proxy from each configured \
                  country and reports the URLs whose status code, title or size differs between \
                  countries. Differences are re-checked before they are reported, so rotating ads \
                  and flaky requests are filtered out."
)]
pub struct Cli {
    /// Path to the configuration file
    ///
    /// Defaults to $HOME/.config/geodiff/config.json. A template is written
    /// there on first run.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// File with URLs to check, one per line (reads stdin when omitted)
    #[arg(short, long, value_name = "PATH")]
    pub input: Option<PathBuf>,

    /// Save confirmed findings to this JSON file (rewritten after every finding)
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Re-check every difference and only report it if it reproduces exactly
    ///
    /// Use `--verify false` to report first-run differences directly.
    #[arg(long, default_value_t = true, action = ArgAction::Set, value_name = "BOOL")]
    pub verify: bool,

    /// Number of URLs checked concurrently
    #[arg(
        short = 'c',
        long,
        default_value_t = DEFAULT_CONCURRENCY as u16,
        value_parser = clap::value_parser!(u16).range(1..),
        value_name = "N"
    )]
    pub concurrency: u16,

    /// Countries to check from, overriding the config file (e.g. us,cn,de)
    #[arg(long, value_delimiter = ',', value_name = "CC,CC,...")]
    pub countries: Option<Vec<String>>,

    /// Delay in milliseconds between launching the per-country requests of one URL
    #[arg(long, default_value_t = DEFAULT_STAGGER_MS, value_name = "MS")]
    pub stagger_ms: u64,

    /// Print findings as JSON lines instead of colored text
    #[arg(long)]
    pub json: bool,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,

    /// Enable debug logging (RUST_LOG takes precedence)
    #[arg(short, long)]
    pub verbose: bool,
}
