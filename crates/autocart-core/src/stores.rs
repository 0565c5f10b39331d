use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

const SHOPIFY_CHECKOUT_DOMAIN: &str = "checkout.shopifycs.com";
const SHOPIFY_DEPOSIT_URL: &str = "https://deposit.us.shopifycs.com/sessions";

/// Routing details for one storefront.
///
/// `domain` is matched against the host of a task's product URL; `code` is
/// the numeric shop id that prefixes checkout paths (`/{code}/checkouts/..`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreProfile {
    pub domain: String,
    #[serde(deserialize_with = "crate::de::string_or_number")]
    pub code: String,
    pub checkout_domain: String,
    pub deposit_url: String,
}

#[derive(Debug, Deserialize)]
pub struct StoresFile {
    pub stores: Vec<StoreProfile>,
}

/// The storefronts known without any configuration file.
#[must_use]
pub fn builtin_stores() -> Vec<StoreProfile> {
    [
        ("launches.routeone.co.uk", "50487623851"),
        ("www.routeone.co.uk", "27442937933"),
        ("releases.flatspot.com", "2744451133"),
    ]
    .into_iter()
    .map(|(domain, code)| StoreProfile {
        domain: domain.to_string(),
        code: code.to_string(),
        checkout_domain: SHOPIFY_CHECKOUT_DOMAIN.to_string(),
        deposit_url: SHOPIFY_DEPOSIT_URL.to_string(),
    })
    .collect()
}

/// Load and validate a store registry override from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_stores(path: &Path) -> Result<StoresFile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    let stores_file: StoresFile =
        serde_yaml::from_str(&content).map_err(|e| ConfigError::FileParse {
            path: path.display().to_string(),
            source: e,
        })?;

    validate_stores(&stores_file)?;

    Ok(stores_file)
}

fn validate_stores(stores_file: &StoresFile) -> Result<(), ConfigError> {
    let mut seen_domains = HashSet::new();

    for store in &stores_file.stores {
        if store.domain.trim().is_empty() {
            return Err(ConfigError::Validation(
                "store domain must be non-empty".to_string(),
            ));
        }

        if store.code.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "store '{}' has an empty shop code",
                store.domain
            )));
        }

        if !store.deposit_url.starts_with("http://") && !store.deposit_url.starts_with("https://")
        {
            return Err(ConfigError::Validation(format!(
                "store '{}' has deposit_url '{}' without an http(s) scheme",
                store.domain, store.deposit_url
            )));
        }

        if !seen_domains.insert(store.domain.to_lowercase()) {
            return Err(ConfigError::Validation(format!(
                "duplicate store domain: '{}'",
                store.domain
            )));
        }
    }

    Ok(())
}
