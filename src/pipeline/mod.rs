// src/pipeline/mod.rs
// =============================================================================
// The worker pool that pushes many URLs through the checker.
//
//   URLs ──> job queue ──> N workers ──> findings queue ──> collector
//
// - The job queue and the findings queue hold at most one item, so a slow
//   collector (e.g. slow disk) naturally slows the workers down
// - Workers share the job receiver behind an async Mutex
// - The collector is the only task that owns the accumulated results
//
// Submodules:
// - worker: per-URL decision (check, verify, forward)
// - collector: single consumer of confirmed findings
// =============================================================================

mod collector;
mod worker;

use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use futures::future::join_all;
use tokio::sync::{mpsc, Mutex};
use tracing::{error, info, warn};

use crate::checker::{CheckResult, Checker};
use crate::progress::ProgressReporter;

pub use collector::{Collector, FindingSink};
pub use worker::{evaluate, DiscardReason, Verdict};

use worker::Worker;

pub const DEFAULT_CONCURRENCY: usize = 5;

#[derive(Debug, Clone, Copy)]
pub struct PipelineOptions {
    /// Number of URLs checked at the same time
    pub concurrency: usize,
    /// Re-check every difference before reporting it
    pub verify: bool,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        PipelineOptions {
            concurrency: DEFAULT_CONCURRENCY,
            verify: true,
        }
    }
}

pub struct Pipeline {
    checker: Checker,
    options: PipelineOptions,
}

impl Pipeline {
    pub fn new(checker: Checker, options: PipelineOptions) -> Self {
        Pipeline { checker, options }
    }

    /// Checks every URL and returns the confirmed findings in the order the
    /// collector received them.
    ///
    /// `progress` is advanced exactly once per URL. A crashed worker is
    /// reported as an error, but only after the remaining workers and the
    /// collector have finished.
    pub async fn run(
        &self,
        urls: Vec<String>,
        progress: Arc<dyn ProgressReporter>,
        collector: Collector,
    ) -> Result<Vec<CheckResult>> {
        let concurrency = self.options.concurrency.max(1);
        info!(
            urls = urls.len(),
            countries = self.checker.countries().len(),
            concurrency,
            verify = self.options.verify,
            "starting checks"
        );

        let (job_tx, job_rx) = mpsc::channel::<String>(1);
        let (finding_tx, finding_rx) = mpsc::channel::<CheckResult>(1);
        let jobs = Arc::new(Mutex::new(job_rx));

        let collector = tokio::spawn(collector.run(finding_rx));

        let workers: Vec<_> = (0..concurrency)
            .map(|id| {
                let worker = Worker {
                    id,
                    checker: self.checker.clone(),
                    verify: self.options.verify,
                    jobs: Arc::clone(&jobs),
                    findings: finding_tx.clone(),
                    progress: Arc::clone(&progress),
                };
                tokio::spawn(worker.run())
            })
            .collect();

        // the collector stops once the last worker drops its sender
        drop(finding_tx);
        drop(jobs);

        for url in urls {
            if job_tx.send(url).await.is_err() {
                warn!("every worker stopped before the input was exhausted");
                break;
            }
        }
        drop(job_tx);

        let mut first_fault = None;
        for joined in join_all(workers).await {
            if let Err(e) = joined {
                error!(error = %e, "worker task failed");
                first_fault.get_or_insert(e);
            }
        }

        let findings = collector.await.context("collector task failed")?;

        if let Some(fault) = first_fault {
            return Err(anyhow!(fault).context("worker task failed"));
        }

        Ok(findings)
    }
}
