//! Drives one task through the checkout pipeline, restarting on recoverable
//! failures.

mod policy;
mod status;

use std::sync::Arc;

use autocart_core::TaskOptions;
use tokio_util::sync::CancellationToken;

use crate::context::{CheckoutContext, CheckoutState};
use crate::error::CheckoutError;
use crate::registry::{StoreRegistry, Storefront};
use crate::session::Session;
use crate::steps::{self, Step, StepEnv, StepOutcome};

pub use policy::{CheckoutSettings, PollPolicy, RestartPolicy};
pub use status::{Status, StatusObserver, TracingObserver};

/// How a task ended when it did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The checkout reached its thank-you page.
    Confirmed { location: String },
    /// Payment needs the buyer to complete a challenge at `location`.
    ChallengeSuspended { location: String },
    Cancelled,
}

pub struct Orchestrator {
    options: TaskOptions,
    storefront: Storefront,
    session: Session,
    settings: CheckoutSettings,
    observer: Arc<dyn StatusObserver>,
    cancel: CancellationToken,
}

impl Orchestrator {
    /// Resolves the task's store and opens its HTTP session.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::Store`] if the product URL matches no known
    /// store, or [`CheckoutError::Transport`] if the session cannot be built.
    pub fn new(
        options: TaskOptions,
        registry: &StoreRegistry,
        settings: CheckoutSettings,
        observer: Arc<dyn StatusObserver>,
        cancel: CancellationToken,
    ) -> Result<Self, CheckoutError> {
        let storefront = registry.resolve(&options.url)?;
        let session = Session::new(
            settings.request_timeout,
            settings.user_agent.as_deref(),
            options.proxy.as_ref(),
        )?;
        tracing::debug!(
            task = %options.task_id,
            store = %storefront.host,
            proxied = options.proxy.is_some(),
            "orchestrator ready"
        );
        Ok(Self {
            options,
            storefront,
            session,
            settings,
            observer,
            cancel,
        })
    }

    #[must_use]
    pub fn task_id(&self) -> &str {
        &self.options.task_id
    }

    #[must_use]
    pub fn session(&self) -> &Session {
        &self.session
    }

    #[must_use]
    pub fn storefront(&self) -> &Storefront {
        &self.storefront
    }

    /// Runs attempts until one reaches a terminal outcome.
    ///
    /// # Errors
    ///
    /// Returns the first non-restartable error, or
    /// [`CheckoutError::RestartsExhausted`] when the attempt budget runs out.
    pub async fn run(&self) -> Result<Outcome, CheckoutError> {
        let mut attempts = 0u32;
        loop {
            attempts += 1;
            let (_, result) = self.attempt().await;
            let err = match result {
                Ok(outcome) => {
                    self.notify(&match &outcome {
                        Outcome::Confirmed { location } => Status::Confirmed {
                            location: location.clone(),
                        },
                        Outcome::ChallengeSuspended { location } => Status::Suspended {
                            location: location.clone(),
                        },
                        Outcome::Cancelled => Status::Cancelled,
                    });
                    return Ok(outcome);
                }
                Err(err) => err,
            };

            if !err.is_restartable() {
                self.notify(&Status::Halted {
                    error: err.to_string(),
                });
                return Err(err);
            }
            if self.settings.restart.exhausted(attempts) {
                let err = CheckoutError::RestartsExhausted {
                    attempts,
                    last: Box::new(err),
                };
                self.notify(&Status::Halted {
                    error: err.to_string(),
                });
                return Err(err);
            }

            let delay = self.settings.restart.delay_for(attempts);
            self.notify(&Status::Restarting {
                attempt: attempts + 1,
                delay,
            });
            tokio::select! {
                () = self.cancel.cancelled() => {
                    self.notify(&Status::Cancelled);
                    return Ok(Outcome::Cancelled);
                }
                () = tokio::time::sleep(delay) => {}
            }
        }
    }

    /// Runs the pipeline once from the first step with a fresh context.
    ///
    /// A buyer challenge is reported as `Ok(Outcome::ChallengeSuspended)`;
    /// every other failure is returned as-is for [`Orchestrator::run`] to
    /// classify. The context is returned as it stood when the attempt ended.
    pub async fn attempt(&self) -> (CheckoutContext, Result<Outcome, CheckoutError>) {
        let mut ctx = CheckoutContext::default();
        let env = StepEnv {
            session: &self.session,
            storefront: &self.storefront,
            options: &self.options,
            poll: &self.settings.poll,
            cancel: &self.cancel,
        };

        for step in Step::ALL {
            if self.cancel.is_cancelled() {
                return (ctx, Ok(Outcome::Cancelled));
            }
            ctx.status = step.label().to_owned();
            self.notify(&Status::Step(step));

            match steps::execute(step, &mut ctx, &env).await {
                Ok(StepOutcome::Advanced) => {
                    ctx.state = step.reached();
                    if let (Step::AddToCart, Some(line)) = (step, &ctx.cart) {
                        self.notify(&Status::Carted {
                            title: line.title.clone(),
                            price: line.unit_price(),
                        });
                    }
                }
                Ok(StepOutcome::Finished(outcome)) => {
                    if matches!(outcome, Outcome::Confirmed { .. }) {
                        ctx.state = CheckoutState::Confirmed;
                    }
                    return (ctx, Ok(outcome));
                }
                Err(CheckoutError::ChallengeSuspended { location }) => {
                    ctx.state = CheckoutState::ChallengeSuspended;
                    ctx.status = format!("Challenge required at {location}");
                    return (ctx, Ok(Outcome::ChallengeSuspended { location }));
                }
                Err(err) => {
                    ctx.status = format!("{} failed: {err}", step.label());
                    self.notify(&Status::Failed {
                        step,
                        error: err.to_string(),
                    });
                    return (ctx, Err(err));
                }
            }
        }

        let err = CheckoutError::UnexpectedFlow {
            step: Step::SubmitPayment,
            location: ctx.payment_location.clone(),
        };
        (ctx, Err(err))
    }

    fn notify(&self, status: &Status) {
        self.observer.on_status(&self.options.task_id, status);
    }
}
