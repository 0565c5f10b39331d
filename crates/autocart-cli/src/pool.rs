//! Runs orchestrators concurrently and tallies how each one ended.
//!
//! Tasks share nothing but the cancellation tree and the log sink; a failed
//! or panicking task never affects the others.

use autocart_checkout::{Orchestrator, Outcome};
use futures::stream::{self, StreamExt};

/// How one task ended.
pub(crate) struct TaskReport {
    pub task_id: String,
    pub result: anyhow::Result<Outcome>,
}

#[derive(Debug, Default, PartialEq, Eq)]
pub(crate) struct Summary {
    pub confirmed: usize,
    pub suspended: usize,
    pub cancelled: usize,
    pub failed: usize,
}

impl Summary {
    pub(crate) fn total(&self) -> usize {
        self.confirmed + self.suspended + self.cancelled + self.failed
    }
}

/// Runs every orchestrator, at most `max_concurrent` at a time (`0` means no
/// limit), each on its own tokio task.
pub(crate) async fn run_pool(orchestrators: Vec<Orchestrator>, max_concurrent: usize) -> Vec<TaskReport> {
    let limit = if max_concurrent == 0 {
        orchestrators.len().max(1)
    } else {
        max_concurrent
    };
    tracing::info!(tasks = orchestrators.len(), limit, "starting task pool");

    stream::iter(orchestrators)
        .map(|orchestrator| async move {
            let task_id = orchestrator.task_id().to_owned();
            let result = match tokio::spawn(async move { orchestrator.run().await }).await {
                Ok(result) => result.map_err(anyhow::Error::from),
                Err(join_error) => Err(anyhow::anyhow!("task aborted: {join_error}")),
            };
            TaskReport { task_id, result }
        })
        .buffer_unordered(limit)
        .collect()
        .await
}

/// Logs each report and counts outcomes.
pub(crate) fn summarize(reports: &[TaskReport]) -> Summary {
    let mut summary = Summary::default();
    for report in reports {
        match &report.result {
            Ok(Outcome::Confirmed { location }) => {
                tracing::info!(task = %report.task_id, %location, "checkout confirmed");
                summary.confirmed += 1;
            }
            Ok(Outcome::ChallengeSuspended { location }) => {
                tracing::warn!(
                    task = %report.task_id,
                    %location,
                    "checkout suspended; complete the challenge in a browser"
                );
                summary.suspended += 1;
            }
            Ok(Outcome::Cancelled) => {
                tracing::info!(task = %report.task_id, "task cancelled");
                summary.cancelled += 1;
            }
            Err(e) => {
                tracing::error!(task = %report.task_id, error = %e, "task failed");
                summary.failed += 1;
            }
        }
    }

    tracing::info!(
        confirmed = summary.confirmed,
        suspended = summary.suspended,
        cancelled = summary.cancelled,
        failed = summary.failed,
        "task pool finished"
    );
    summary
}

#[cfg(test)]
#[path = "pool_test.rs"]
mod tests;
