//! Purchase profiles and upstream proxy definitions.
//!
//! Both carry secrets (card data, proxy credentials), so their `Debug`
//! output is written by hand and never includes them.

use serde::{Deserialize, Serialize};

/// Payment card fields passed through to the tokenization endpoint.
///
/// Field names match the JSON body the deposit endpoint expects.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardDetails {
    pub number: String,
    pub name: String,
    pub month: u8,
    pub year: u16,
    pub verification_value: String,
}

impl std::fmt::Debug for CardDetails {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CardDetails")
            .field("number", &"[redacted]")
            .field("name", &"[redacted]")
            .field("month", &"[redacted]")
            .field("year", &"[redacted]")
            .field("verification_value", &"[redacted]")
            .finish()
    }
}

/// Contact, shipping, and payment details for one purchase.
///
/// Passed through untouched; nothing in the checkout core validates or
/// mutates it.
#[derive(Clone, Serialize, Deserialize)]
pub struct PurchaseProfile {
    pub name: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub address1: String,
    #[serde(default)]
    pub address2: String,
    pub city: String,
    pub zip: String,
    pub country: String,
    pub phone: String,
    pub card: CardDetails,
}

impl std::fmt::Debug for PurchaseProfile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PurchaseProfile")
            .field("name", &self.name)
            .field("country", &self.country)
            .field("email", &"[redacted]")
            .field("address", &"[redacted]")
            .field("phone", &"[redacted]")
            .field("card", &self.card)
            .finish()
    }
}

/// An upstream proxy for one task's transport session.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProxyConfig {
    pub name: String,
    #[serde(default = "default_proxy_protocol")]
    pub protocol: String,
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

fn default_proxy_protocol() -> String {
    "http".to_string()
}

impl ProxyConfig {
    /// Proxy URL without credentials, e.g. `http://proxy.example.net:8888`.
    ///
    /// Credentials are applied separately as basic auth so they never end up
    /// in a URL that might be logged.
    #[must_use]
    pub fn endpoint(&self) -> String {
        format!("{}://{}:{}", self.protocol, self.host, self.port)
    }
}

impl std::fmt::Debug for ProxyConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProxyConfig")
            .field("name", &self.name)
            .field("endpoint", &self.endpoint())
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "[redacted]"))
            .finish()
    }
}
