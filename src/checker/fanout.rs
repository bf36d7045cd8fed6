// src/checker/fanout.rs
// =============================================================================
// Runs one multi-country check of a single URL.
//
// How it works:
// 1. For each configured country (in order) resolve its proxy and spawn one
//    fetch task, sleeping `stagger` between launches
// 2. Join every task in launch order, so outcome i belongs to country i no
//    matter which request finished first
// 3. Let the diff engine decide whether the outcomes differ
//
// A check never fails as a whole: proxy errors and crashed fetch tasks become
// error outcomes for their country.
// =============================================================================

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tracing::warn;

use super::fetch::Fetcher;
use super::outcome::{CheckResult, CountryOutcome};
use crate::proxy::ProxyProvider;

/// Default pause between launching two per-country requests.
pub const DEFAULT_STAGGER_MS: u64 = 50;
pub const DEFAULT_STAGGER: Duration = Duration::from_millis(DEFAULT_STAGGER_MS);

/// Everything needed to check one URL from every country.
///
/// Cheap to clone, each worker holds its own copy.
#[derive(Clone)]
pub struct Checker {
    fetcher: Arc<dyn Fetcher>,
    proxies: Arc<dyn ProxyProvider>,
    countries: Arc<[String]>,
    stagger: Duration,
}

impl Checker {
    pub fn new(
        fetcher: Arc<dyn Fetcher>,
        proxies: Arc<dyn ProxyProvider>,
        countries: Vec<String>,
    ) -> Self {
        Checker {
            fetcher,
            proxies,
            countries: countries.into(),
            stagger: DEFAULT_STAGGER,
        }
    }

    /// Sets the courtesy delay between launching per-country requests.
    ///
    /// Spreads connections out so the proxy provider does not see a burst;
    /// has no effect on results.
    pub fn with_stagger(mut self, stagger: Duration) -> Self {
        self.stagger = stagger;
        self
    }

    pub fn countries(&self) -> &[String] {
        &self.countries
    }

    /// Fetches `url` from every country and compares the outcomes.
    pub async fn check(&self, url: &str) -> CheckResult {
        let mut tasks = Vec::with_capacity(self.countries.len());

        for (index, country) in self.countries.iter().enumerate() {
            if index > 0 && !self.stagger.is_zero() {
                tokio::time::sleep(self.stagger).await;
            }

            let fetcher = Arc::clone(&self.fetcher);
            let proxy = self.proxies.url_for(country);
            let url = url.to_string();
            let country = country.clone();

            tasks.push(tokio::spawn(async move {
                match proxy {
                    Ok(proxy) => fetcher.fetch(&url, &proxy, &country).await,
                    Err(e) => CountryOutcome::failed(country, format!("creating proxy URL: {}", e)),
                }
            }));
        }

        // join_all keeps input order, which is what pins each outcome to its slot
        let outcomes = join_all(tasks)
            .await
            .into_iter()
            .zip(self.countries.iter())
            .map(|(joined, country)| {
                joined.unwrap_or_else(|e| {
                    warn!(%url, %country, error = %e, "fetch task crashed");
                    CountryOutcome::failed(country.as_str(), format!("fetch task failed: {}", e))
                })
            })
            .collect();

        CheckResult::new(url, outcomes)
    }
}
