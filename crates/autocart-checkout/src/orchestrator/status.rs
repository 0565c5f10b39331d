//! Progress reporting for running tasks.

use std::fmt;
use std::time::Duration;

use rust_decimal::Decimal;

use crate::steps::Step;

/// A progress event emitted by an orchestrator.
///
/// Error text comes from [`crate::CheckoutError`]'s `Display`, which never
/// includes card data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Status {
    Step(Step),
    Carted { title: String, price: Decimal },
    Failed { step: Step, error: String },
    Restarting { attempt: u32, delay: Duration },
    Confirmed { location: String },
    Suspended { location: String },
    Halted { error: String },
    Cancelled,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Step(step) => f.write_str(step.label()),
            Self::Carted { title, price } => write!(f, "Carted {title} @ {price}"),
            Self::Failed { step, error } => write!(f, "{} failed: {error}", step.label()),
            Self::Restarting { attempt, delay } => {
                write!(f, "Restarting (attempt {attempt}) in {}ms", delay.as_millis())
            }
            Self::Confirmed { .. } => f.write_str("Checkout confirmed"),
            Self::Suspended { location } => write!(f, "Challenge required at {location}"),
            Self::Halted { error } => write!(f, "Stopped: {error}"),
            Self::Cancelled => f.write_str("Cancelled"),
        }
    }
}

/// Receives status updates from every running task.
///
/// Implementations must be cheap; they are called inline on the task.
pub trait StatusObserver: Send + Sync {
    fn on_status(&self, task_id: &str, status: &Status);
}

/// Writes every status update to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl StatusObserver for TracingObserver {
    fn on_status(&self, task_id: &str, status: &Status) {
        match status {
            Status::Failed { .. } | Status::Suspended { .. } | Status::Halted { .. } => {
                tracing::warn!(task = task_id, status = %status, "task status");
            }
            _ => tracing::info!(task = task_id, status = %status, "task status"),
        }
    }
}
