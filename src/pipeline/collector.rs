// src/pipeline/collector.rs
// =============================================================================
// The single consumer of confirmed findings.
//
// Workers never touch the accumulated results. They send findings over a
// channel and the collector, running as one task, appends each one and hands
// it to every sink (terminal output, JSON lines, snapshot file) in arrival
// order. One consumer means no locking around output or persistence.
// =============================================================================

use tokio::sync::mpsc;
use tracing::debug;

use crate::checker::CheckResult;

/// Something that wants to see every confirmed finding, in order.
///
/// `accumulated` includes `finding` as its last element.
pub trait FindingSink: Send {
    fn accept(&mut self, finding: &CheckResult, accumulated: &[CheckResult]);
}

#[derive(Default)]
pub struct Collector {
    sinks: Vec<Box<dyn FindingSink>>,
    results: Vec<CheckResult>,
}

impl Collector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sink(mut self, sink: impl FindingSink + 'static) -> Self {
        self.sinks.push(Box::new(sink));
        self
    }

    /// Consumes findings until every sender is dropped, then returns them all.
    pub async fn run(mut self, mut findings: mpsc::Receiver<CheckResult>) -> Vec<CheckResult> {
        while let Some(finding) = findings.recv().await {
            debug!(url = %finding.url, "finding confirmed");
            self.push(finding);
        }
        self.results
    }

    fn push(&mut self, finding: CheckResult) {
        self.results.push(finding);
        if let Some(latest) = self.results.last() {
            for sink in self.sinks.iter_mut() {
                sink.accept(latest, &self.results);
            }
        }
    }
}
