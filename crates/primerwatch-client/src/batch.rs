//! Bounded fan-out for multi-select actions.
//!
//! One independent backend call per item, at most `concurrency` in flight,
//! continue on error. There is no transaction: successful items stay applied
//! when others fail.

use std::future::Future;

use futures_util::stream::{self, StreamExt};
use serde::Serialize;
use tracing::{debug, warn};

use primerwatch_common::error::Result;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchFailure {
    /// Position of the item in the submitted batch.
    pub index: usize,
    pub label: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchReport<T> {
    pub succeeded: Vec<T>,
    pub failures: Vec<BatchFailure>,
}

impl<T> Default for BatchReport<T> {
    fn default() -> Self {
        Self { succeeded: Vec::new(), failures: Vec::new() }
    }
}

impl<T> BatchReport<T> {
    pub fn success_count(&self) -> usize {
        self.succeeded.len()
    }

    pub fn failure_count(&self) -> usize {
        self.failures.len()
    }

    pub fn total(&self) -> usize {
        self.success_count() + self.failure_count()
    }

    pub fn is_complete_success(&self) -> bool {
        self.failures.is_empty()
    }

    /// One-line tally for the notice banner.
    pub fn summary(&self, verb: &str) -> String {
        if self.failures.is_empty() {
            format!("{} {} item(s).", verb, self.success_count())
        } else {
            format!(
                "{} {} of {} item(s); {} failed.",
                verb,
                self.success_count(),
                self.total(),
                self.failure_count()
            )
        }
    }
}

/// Run `op` over `items` with bounded concurrency, collecting per-item failures.
///
/// `label` names an item for the failure list (e.g. the oligo name).
/// Both result lists keep the input order.
pub async fn run_batch<I, T, L, F, Fut>(
    items: Vec<I>,
    concurrency: usize,
    label: L,
    op: F,
) -> BatchReport<T>
where
    L: Fn(&I) -> String,
    F: Fn(I) -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let labels: Vec<String> = items.iter().map(&label).collect();
    let width = concurrency.max(1);
    debug!(items = labels.len(), width, "running batch");

    let mut outcomes: Vec<(usize, Result<T>)> = stream::iter(items.into_iter().enumerate())
        .map(|(index, item)| {
            let fut = op(item);
            async move { (index, fut.await) }
        })
        .buffer_unordered(width)
        .collect()
        .await;
    outcomes.sort_by_key(|(index, _)| *index);

    let mut report = BatchReport::default();
    for (index, outcome) in outcomes {
        match outcome {
            Ok(value) => report.succeeded.push(value),
            Err(e) => {
                warn!(item = %labels[index], error = %e, "batch item failed");
                report.failures.push(BatchFailure {
                    index,
                    label: labels[index].clone(),
                    message: e.user_message(),
                });
            }
        }
    }
    report
}
