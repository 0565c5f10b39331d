//! Task-definition file: profiles, proxies, and the purchase attempts that
//! reference them.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use serde::Deserialize;

use crate::profile::{ProxyConfig, PurchaseProfile};
use crate::ConfigError;

/// How the variant to purchase is chosen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VariantSelector {
    /// Case-sensitive substring of the variant title, e.g. `"UK 10"`.
    Size(String),
    /// A known variant id; discovery is skipped.
    Id(String),
}

/// Which shipping rate to pick once rates are known.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ShippingPreference {
    #[default]
    Cheapest,
    Id(String),
}

/// Everything one purchase attempt needs, resolved from the task file.
#[derive(Debug, Clone)]
pub struct TaskOptions {
    pub task_id: String,
    pub url: String,
    pub selector: VariantSelector,
    pub profile: PurchaseProfile,
    pub proxy: Option<ProxyConfig>,
    pub shipping: ShippingPreference,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TaskDefinition {
    pub id: String,
    pub url: String,
    #[serde(default)]
    pub size: Option<String>,
    #[serde(default, deserialize_with = "crate::de::opt_string_or_number")]
    pub variant_id: Option<String>,
    pub profile: String,
    #[serde(default)]
    pub proxy: Option<String>,
    #[serde(default)]
    pub shipping_rate: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TaskFile {
    pub profiles: Vec<PurchaseProfile>,
    #[serde(default)]
    pub proxies: Vec<ProxyConfig>,
    pub tasks: Vec<TaskDefinition>,
}

impl TaskFile {
    /// Joins every task with the profile and proxy it references.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Validation`] for a dangling profile or proxy
    /// reference, or a task with neither/both of `size` and `variant_id`.
    pub fn resolve(&self) -> Result<Vec<TaskOptions>, ConfigError> {
        let profiles: HashMap<&str, &PurchaseProfile> =
            self.profiles.iter().map(|p| (p.name.as_str(), p)).collect();
        let proxies: HashMap<&str, &ProxyConfig> =
            self.proxies.iter().map(|p| (p.name.as_str(), p)).collect();

        self.tasks
            .iter()
            .map(|task| {
                let profile = profiles.get(task.profile.as_str()).ok_or_else(|| {
                    ConfigError::Validation(format!(
                        "task '{}' references unknown profile '{}'",
                        task.id, task.profile
                    ))
                })?;

                let proxy = task
                    .proxy
                    .as_deref()
                    .map(|name| {
                        proxies.get(name).map(|p| (*p).clone()).ok_or_else(|| {
                            ConfigError::Validation(format!(
                                "task '{}' references unknown proxy '{name}'",
                                task.id
                            ))
                        })
                    })
                    .transpose()?;

                Ok(TaskOptions {
                    task_id: task.id.clone(),
                    url: task.url.clone(),
                    selector: selector_for(task)?,
                    profile: (*profile).clone(),
                    proxy,
                    shipping: task
                        .shipping_rate
                        .clone()
                        .map_or(ShippingPreference::Cheapest, ShippingPreference::Id),
                })
            })
            .collect()
    }
}

fn selector_for(task: &TaskDefinition) -> Result<VariantSelector, ConfigError> {
    match (&task.size, &task.variant_id) {
        (Some(size), None) if !size.is_empty() => Ok(VariantSelector::Size(size.clone())),
        (None, Some(id)) if !id.is_empty() => Ok(VariantSelector::Id(id.clone())),
        _ => Err(ConfigError::Validation(format!(
            "task '{}' must set exactly one of 'size' or 'variant_id'",
            task.id
        ))),
    }
}

/// Parse and validate a task file from YAML text.
///
/// # Errors
///
/// Returns `ConfigError` if the YAML is malformed or fails validation.
pub fn parse_tasks(content: &str, origin: &str) -> Result<TaskFile, ConfigError> {
    let task_file: TaskFile =
        serde_yaml::from_str(content).map_err(|e| ConfigError::FileParse {
            path: origin.to_string(),
            source: e,
        })?;

    validate_tasks(&task_file)?;

    Ok(task_file)
}

/// Load and validate the task file from disk.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_tasks(path: &Path) -> Result<TaskFile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    parse_tasks(&content, &path.display().to_string())
}

fn validate_tasks(task_file: &TaskFile) -> Result<(), ConfigError> {
    let mut seen_profiles = HashSet::new();
    for profile in &task_file.profiles {
        if !seen_profiles.insert(profile.name.as_str()) {
            return Err(ConfigError::Validation(format!(
                "duplicate profile name: '{}'",
                profile.name
            )));
        }
    }

    let mut seen_proxies = HashSet::new();
    for proxy in &task_file.proxies {
        if !seen_proxies.insert(proxy.name.as_str()) {
            return Err(ConfigError::Validation(format!(
                "duplicate proxy name: '{}'",
                proxy.name
            )));
        }
    }

    let mut seen_ids = HashSet::new();
    for task in &task_file.tasks {
        if task.id.trim().is_empty() {
            return Err(ConfigError::Validation(
                "task id must be non-empty".to_string(),
            ));
        }

        if !seen_ids.insert(task.id.as_str()) {
            return Err(ConfigError::Validation(format!(
                "duplicate task id: '{}'",
                task.id
            )));
        }

        if !task.url.starts_with("http://") && !task.url.starts_with("https://") {
            return Err(ConfigError::Validation(format!(
                "task '{}' has url '{}' without an http(s) scheme",
                task.id, task.url
            )));
        }
    }

    // Reference checks share their messages with `resolve`.
    task_file.resolve().map(|_| ())
}

#[cfg(test)]
#[path = "tasks_test.rs"]
mod tests;
