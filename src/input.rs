// src/input.rs
// =============================================================================
// Reads the list of URLs to check, from a file or from piped stdin.
//
// - one URL per line, surrounding whitespace trimmed
// - blank lines skipped
// - invalid UTF-8 bytes are replaced, the line is still checked
// - entries without a scheme get "https://" in front
// =============================================================================

use std::borrow::Cow;
use std::fs::File;
use std::io::{self, BufRead, BufReader, IsTerminal};
use std::path::Path;

use anyhow::{bail, Context, Result};
use tracing::warn;

/// Loads URLs from `path`, or from stdin when no path is given.
///
/// Refuses to wait on an interactive terminal: stdin must be piped.
pub fn load_urls(path: Option<&Path>) -> Result<Vec<String>> {
    match path {
        Some(path) => {
            let file = File::open(path)
                .with_context(|| format!("opening input file {}", path.display()))?;
            read_urls(BufReader::new(file))
                .with_context(|| format!("reading input file {}", path.display()))
        }
        None => {
            let stdin = io::stdin();
            if stdin.is_terminal() {
                bail!("no input file provided and no data on stdin");
            }
            read_urls(stdin.lock()).context("reading URLs from stdin")
        }
    }
}

/// Reads one URL per line. Lines that are not valid UTF-8 are decoded lossily
/// instead of failing the whole input.
pub fn read_urls<R: BufRead>(reader: R) -> io::Result<Vec<String>> {
    let mut urls = Vec::new();
    for (index, line) in reader.split(b'\n').enumerate() {
        let line = line?;
        let line = String::from_utf8_lossy(&line);
        if let Cow::Owned(_) = line {
            warn!(line = index + 1, "input line is not valid UTF-8, replacing invalid bytes");
        }
        let line = line.trim();
        if !line.is_empty() {
            urls.push(normalize_url(line));
        }
    }
    Ok(urls)
}

/// Prefixes scheme-less entries with https://.
pub fn normalize_url(raw: &str) -> String {
    if raw.starts_with("http://") || raw.starts_with("https://") {
        raw.to_string()
    } else {
        format!("https://{}", raw)
    }
}
