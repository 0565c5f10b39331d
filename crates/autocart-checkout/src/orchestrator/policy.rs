//! Restart and polling limits for a checkout task.

use std::time::Duration;

use autocart_core::AppConfig;

/// How often and how quickly a failed attempt is restarted.
///
/// The delay before restart `n` (1-based) is `backoff_base * 2^(n-1)`, capped at
/// `backoff_max`, then scaled by a random factor in `[0.75, 1.25)`.
///
/// | Restart | Sleep with `backoff_base = 500 ms`  |
/// |---------|-------------------------------------|
/// | 1       | 500 ms × 2⁰ ± 25 % jitter           |
/// | 2       | 500 ms × 2¹ ± 25 % jitter           |
/// | 3       | 500 ms × 2² ± 25 % jitter           |
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestartPolicy {
    /// Total attempts allowed, including the first. `0` means unbounded.
    pub max_attempts: u32,
    pub backoff_base: Duration,
    pub backoff_max: Duration,
}

impl RestartPolicy {
    /// Restarts without any delay, up to `max_attempts` attempts.
    #[must_use]
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            backoff_base: Duration::ZERO,
            backoff_max: Duration::ZERO,
        }
    }

    /// Returns `true` once `attempts_made` has used up the attempt budget.
    #[must_use]
    pub fn exhausted(&self, attempts_made: u32) -> bool {
        self.max_attempts != 0 && attempts_made >= self.max_attempts
    }

    /// Jittered delay to wait before restart number `restart` (1-based).
    #[must_use]
    pub fn delay_for(&self, restart: u32) -> Duration {
        let capped = self.ceiling_for(restart);
        if capped.is_zero() {
            return Duration::ZERO;
        }
        capped.mul_f64(rand::random::<f64>() * 0.5 + 0.75)
    }

    /// Un-jittered delay before restart number `restart`.
    #[must_use]
    pub fn ceiling_for(&self, restart: u32) -> Duration {
        let exponent = restart.saturating_sub(1).min(20);
        self.backoff_base
            .saturating_mul(1u32 << exponent)
            .min(self.backoff_max)
    }
}

/// Limits for waiting on asynchronous work the checkout does server-side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    /// How long a payment may sit in processing before the task gives up.
    pub max_wait: Duration,
    /// Extra fetches allowed while shipping rates answer `202 Accepted`.
    pub shipping_rate_polls: u32,
}

/// Everything about a task's execution that is not the task itself.
#[derive(Debug, Clone)]
pub struct CheckoutSettings {
    pub request_timeout: Duration,
    /// Fixed `User-Agent`; a browser identity is picked per session when unset.
    pub user_agent: Option<String>,
    pub restart: RestartPolicy,
    pub poll: PollPolicy,
}

impl CheckoutSettings {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            request_timeout: Duration::from_secs(config.request_timeout_secs),
            user_agent: config.user_agent.clone(),
            restart: RestartPolicy {
                max_attempts: config.max_attempts,
                backoff_base: Duration::from_millis(config.restart_backoff_base_ms),
                backoff_max: Duration::from_millis(config.restart_backoff_max_ms),
            },
            poll: PollPolicy {
                interval: Duration::from_millis(config.poll_interval_ms),
                max_wait: Duration::from_secs(config.poll_max_wait_secs),
                shipping_rate_polls: config.shipping_rate_polls,
            },
        }
    }
}
