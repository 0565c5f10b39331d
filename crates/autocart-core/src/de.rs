//! Serde helpers for identifiers that arrive as either strings or integers.
//!
//! Shopify variant ids show up as `"40747855872061"` in page-embedded JSON
//! and as bare integers in YAML written by hand, so both are accepted and
//! normalised to `String`.

use serde::{Deserialize, Deserializer};

#[derive(Deserialize)]
#[serde(untagged)]
enum StringOrNumber {
    String(String),
    Unsigned(u64),
    Signed(i64),
}

impl From<StringOrNumber> for String {
    fn from(value: StringOrNumber) -> Self {
        match value {
            StringOrNumber::String(s) => s,
            StringOrNumber::Unsigned(n) => n.to_string(),
            StringOrNumber::Signed(n) => n.to_string(),
        }
    }
}

/// Deserializes a string or integer into a `String`.
///
/// # Errors
///
/// Fails when the value is neither a string nor an integer.
pub fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    StringOrNumber::deserialize(deserializer).map(String::from)
}

/// Like [`string_or_number`] but for optional fields.
///
/// # Errors
///
/// Fails when a present value is neither a string nor an integer.
pub fn opt_string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<StringOrNumber>::deserialize(deserializer)?.map(String::from))
}
