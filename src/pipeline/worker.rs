// src/pipeline/worker.rs
// =============================================================================
// What one worker does with one URL.
//
// 1. Check the URL from every country
// 2. No difference? Discard it
// 3. With verification on, check again: the difference must show up again
//    AND every country must produce exactly the same pattern as before
// 4. Whatever survives is sent to the collector
//
// Rotating ads, A/B tests and one-off proxy hiccups rarely reproduce
// byte-for-byte, so the second run filters most of them out.
// =============================================================================

use std::sync::Arc;

use tokio::sync::{mpsc, Mutex};
use tracing::{debug, error};

use crate::checker::{patterns_match, CheckResult, Checker};
use crate::progress::ProgressReporter;

/// The decision a worker reaches for one URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Confirmed(CheckResult),
    Discarded(DiscardReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscardReason {
    /// The first check found nothing.
    NoDifference,
    /// The verification check found nothing.
    NotReproduced,
    /// Both checks found a difference, but not the same one.
    Unstable,
}

/// Runs the check (and optional verification) for one URL.
pub async fn evaluate(checker: &Checker, url: &str, verify: bool) -> Verdict {
    let result = checker.check(url).await;
    if !result.has_difference {
        return Verdict::Discarded(DiscardReason::NoDifference);
    }

    if verify {
        let verification = checker.check(url).await;
        if !verification.has_difference {
            return Verdict::Discarded(DiscardReason::NotReproduced);
        }
        if !patterns_match(&result.outcomes, &verification.outcomes) {
            return Verdict::Discarded(DiscardReason::Unstable);
        }
    }

    Verdict::Confirmed(result)
}

pub(crate) struct Worker {
    pub id: usize,
    pub checker: Checker,
    pub verify: bool,
    pub jobs: Arc<Mutex<mpsc::Receiver<String>>>,
    pub findings: mpsc::Sender<CheckResult>,
    pub progress: Arc<dyn ProgressReporter>,
}

impl Worker {
    /// Pulls URLs until the job queue is closed and drained.
    pub async fn run(self) {
        loop {
            // the lock is only held while waiting for the next job
            let next = self.jobs.lock().await.recv().await;
            let Some(url) = next else { break };

            match evaluate(&self.checker, &url, self.verify).await {
                Verdict::Confirmed(result) => {
                    if self.findings.send(result).await.is_err() {
                        error!(worker = self.id, %url, "collector stopped, finding dropped");
                    }
                }
                Verdict::Discarded(reason) => {
                    debug!(worker = self.id, %url, ?reason, "candidate discarded");
                }
            }

            self.progress.advance();
        }

        debug!(worker = self.id, "job queue drained");
    }
}
