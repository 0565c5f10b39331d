//! Pulls tokens and embedded JSON out of storefront HTML.
//!
//! Every step asks for a value by [`TokenRole`]; how a role is located in the
//! page is decided here and nowhere else.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::CheckoutError;

/// The kind of value a step expects to find in a response body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenRole {
    ProductVariants,
    VariantForSelector,
    CheckoutToken,
    AuthenticityToken,
    CheckoutAuthorizationToken,
    PaymentGateway,
    TotalPrice,
    PaymentSessionId,
}

impl TokenRole {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ProductVariants => "product variants",
            Self::VariantForSelector => "variant matching selector",
            Self::CheckoutToken => "checkout token",
            Self::AuthenticityToken => "authenticity token",
            Self::CheckoutAuthorizationToken => "checkout authorization token",
            Self::PaymentGateway => "payment gateway",
            Self::TotalPrice => "total price",
            Self::PaymentSessionId => "payment session id",
        }
    }
}

impl fmt::Display for TokenRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

static CHECKOUT_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"Shopify\.Checkout\.token\s*=\s*"(\w+)""#).expect("valid checkout token regex")
});

static AUTHENTICITY_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"name="authenticity_token"\s+value="([^"]+)""#)
        .expect("valid authenticity token regex")
});

static AUTHORIZATION_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"name="shopify-checkout-authorization-token"\s+content="([^"]+)""#)
        .expect("valid authorization token regex")
});

static PAYMENT_GATEWAY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"data-select-gateway="([^"]+)""#).expect("valid payment gateway regex")
});

static TOTAL_PRICE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"Shopify\.Checkout\.totalPrice\s*=\s*"?([0-9]+(?:\.[0-9]+)?)"?\s*;"#)
        .expect("valid total price regex")
});

fn pattern_for(role: TokenRole) -> Option<&'static Regex> {
    match role {
        TokenRole::CheckoutToken => Some(&*CHECKOUT_TOKEN),
        TokenRole::AuthenticityToken => Some(&*AUTHENTICITY_TOKEN),
        TokenRole::CheckoutAuthorizationToken => Some(&*AUTHORIZATION_TOKEN),
        TokenRole::PaymentGateway => Some(&*PAYMENT_GATEWAY),
        TokenRole::TotalPrice => Some(&*TOTAL_PRICE),
        TokenRole::ProductVariants
        | TokenRole::VariantForSelector
        | TokenRole::PaymentSessionId => None,
    }
}

/// Returns the first value for `role` found in `body`.
///
/// # Errors
///
/// Returns [`CheckoutError::Extraction`] if the body does not contain the value.
pub fn extract_token(role: TokenRole, body: &str) -> Result<String, CheckoutError> {
    pattern_for(role)
        .and_then(|pattern| pattern.captures(body))
        .and_then(|captures| captures.get(1))
        .map(|value| value.as_str().to_owned())
        .ok_or(CheckoutError::Extraction { role })
}

/// Returns the JSON array assigned to `"key":` somewhere inside `body`.
///
/// The array is located by bracket matching, so nested arrays and objects and
/// brackets inside string literals are handled. Returns `None` if the key is
/// absent, is not followed by an array, or the array is never closed.
#[must_use]
pub fn json_array_for_key<'a>(body: &'a str, key: &str) -> Option<&'a str> {
    let needle = format!("\"{key}\"");
    let mut search_from = 0;

    while let Some(found) = body[search_from..].find(&needle) {
        let after_key = search_from + found + needle.len();
        if let Some(start) = array_start_after(body, after_key) {
            return balanced_array(body, start);
        }
        search_from = after_key;
    }
    None
}

/// Skips `\s*:\s*` and returns the index of a following `[`.
fn array_start_after(body: &str, from: usize) -> Option<usize> {
    let rest = &body[from..];
    let trimmed = rest.trim_start();
    let after_colon = trimmed.strip_prefix(':')?.trim_start();
    after_colon
        .starts_with('[')
        .then(|| body.len() - after_colon.len())
}

fn balanced_array(body: &str, start: usize) -> Option<&str> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in body[start..].char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '[' | '{' => depth += 1,
            ']' | '}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(&body[start..=start + offset]);
                }
            }
            _ => {}
        }
    }
    None
}
