// src/checker/mod.rs
// =============================================================================
// This module contains everything needed to check one URL from many countries.
//
// Submodules:
// - outcome: CountryOutcome / CheckResult data types
// - fetch: the Fetcher trait and the reqwest-backed HttpFetcher
// - diff: significance test and cross-run pattern matching
// - fanout: the Checker that fans one URL out to every country
//
// This file (mod.rs) ties them together and re-exports the public API so the
// rest of the application can write `checker::Checker` instead of
// `checker::fanout::Checker`.
// =============================================================================

mod diff;
mod fanout;
mod fetch;
mod outcome;

pub use diff::patterns_match;
pub use fanout::{Checker, DEFAULT_STAGGER_MS};
pub use fetch::{Fetcher, HttpFetcher};
pub use outcome::{CheckResult, CountryOutcome};

#[cfg(test)]
pub(crate) use fanout::testing;
