//! Shared data model and configuration for autocart.
//!
//! Everything here is plain data: purchase profiles, proxies, store
//! descriptions, task definitions, and the environment-driven
//! [`AppConfig`]. Network behaviour lives in `autocart-checkout`.

pub mod app_config;
pub mod config;
pub mod de;
pub mod profile;
pub mod stores;
pub mod tasks;

use thiserror::Error;

pub use app_config::AppConfig;
pub use config::{load_app_config, load_app_config_from_env};
pub use profile::{CardDetails, ProxyConfig, PurchaseProfile};
pub use stores::{builtin_stores, load_stores, StoreProfile, StoresFile};
pub use tasks::{
    load_tasks, parse_tasks, ShippingPreference, TaskDefinition, TaskFile, TaskOptions,
    VariantSelector,
};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read {path}: {source}")]
    FileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    FileParse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("configuration error: {0}")]
    Validation(String),
}
