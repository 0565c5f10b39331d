use crate::app_config::AppConfig;
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the real environment so it can be tested with a plain
/// `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::path::PathBuf;

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let optional = |var: &str| -> Option<String> {
        lookup(var)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u32>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<usize>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    };

    let log_level = or_default("AUTOCART_LOG_LEVEL", "info");
    let tasks_path = PathBuf::from(or_default("AUTOCART_TASKS_PATH", "./config/tasks.yaml"));
    let stores_path = optional("AUTOCART_STORES_PATH").map(PathBuf::from);
    let user_agent = optional("AUTOCART_USER_AGENT");

    let request_timeout_secs = parse_u64("AUTOCART_REQUEST_TIMEOUT_SECS", "10")?;
    if request_timeout_secs == 0 {
        return Err(ConfigError::InvalidEnvVar {
            var: "AUTOCART_REQUEST_TIMEOUT_SECS".to_string(),
            reason: "must be greater than zero".to_string(),
        });
    }

    let max_concurrent_tasks = parse_usize("AUTOCART_MAX_CONCURRENT_TASKS", "0")?;
    let max_attempts = parse_u32("AUTOCART_MAX_ATTEMPTS", "0")?;
    let restart_backoff_base_ms = parse_u64("AUTOCART_RESTART_BACKOFF_BASE_MS", "500")?;
    let restart_backoff_max_ms = parse_u64("AUTOCART_RESTART_BACKOFF_MAX_MS", "30000")?;
    if restart_backoff_max_ms < restart_backoff_base_ms {
        return Err(ConfigError::InvalidEnvVar {
            var: "AUTOCART_RESTART_BACKOFF_MAX_MS".to_string(),
            reason: format!(
                "{restart_backoff_max_ms} is below AUTOCART_RESTART_BACKOFF_BASE_MS ({restart_backoff_base_ms})"
            ),
        });
    }

    let poll_interval_ms = parse_u64("AUTOCART_POLL_INTERVAL_MS", "2000")?;
    let poll_max_wait_secs = parse_u64("AUTOCART_POLL_MAX_WAIT_SECS", "120")?;
    let shipping_rate_polls = parse_u32("AUTOCART_SHIPPING_RATE_POLLS", "5")?;

    Ok(AppConfig {
        log_level,
        tasks_path,
        stores_path,
        request_timeout_secs,
        user_agent,
        max_concurrent_tasks,
        max_attempts,
        restart_backoff_base_ms,
        restart_backoff_max_ms,
        poll_interval_ms,
        poll_max_wait_secs,
        shipping_rate_polls,
    })
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
