use thiserror::Error;

use crate::extract::TokenRole;
use crate::steps::Step;

/// Failure to map a product URL onto a configured storefront.
#[derive(Debug, Error)]
pub enum StoreLookupError {
    #[error("no store configured for host '{host}'")]
    UnknownStore { host: String },

    #[error("invalid product URL \"{url}\": {reason}")]
    InvalidUrl { url: String, reason: String },
}

#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("HTTP error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("{step} rejected by remote: {reason}")]
    RemoteRejection {
        step: Step,
        status: Option<u16>,
        reason: String,
    },

    #[error("{step}: unexpected redirect to {}", .location.as_deref().unwrap_or("<none>"))]
    UnexpectedFlow {
        step: Step,
        location: Option<String>,
    },

    #[error("could not extract {role} from response")]
    Extraction { role: TokenRole },

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Store(#[from] StoreLookupError),

    #[error("step started without required {field}")]
    MissingPrecondition { field: &'static str },

    #[error("payment suspended for buyer challenge at {location}")]
    ChallengeSuspended { location: String },

    #[error("payment still processing after {waited_secs}s")]
    PaymentTimeout { waited_secs: u64 },

    #[error("gave up after {attempts} attempts: {last}")]
    RestartsExhausted {
        attempts: u32,
        #[source]
        last: Box<CheckoutError>,
    },
}

impl CheckoutError {
    /// Returns `true` if the pipeline should be restarted from the first step
    /// after this error.
    ///
    /// Restartable:
    /// - [`CheckoutError::Transport`]: connection, TLS or timeout failure.
    /// - [`CheckoutError::RemoteRejection`]: the service answered with a refusal.
    /// - [`CheckoutError::UnexpectedFlow`]: a redirect went somewhere other than expected.
    /// - [`CheckoutError::Extraction`]: a page came back without the expected token.
    /// - [`CheckoutError::Deserialize`]: a JSON body did not have the expected shape.
    ///
    /// Everything else halts the task: configuration problems, a buyer challenge,
    /// a payment that never left processing, or an exhausted restart budget.
    #[must_use]
    pub fn is_restartable(&self) -> bool {
        matches!(
            self,
            Self::Transport(_)
                | Self::RemoteRejection { .. }
                | Self::UnexpectedFlow { .. }
                | Self::Extraction { .. }
                | Self::Deserialize { .. }
        )
    }

    pub(crate) fn deserialize(context: impl Into<String>, source: serde_json::Error) -> Self {
        Self::Deserialize {
            context: context.into(),
            source,
        }
    }
}
