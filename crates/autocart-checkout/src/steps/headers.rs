//! Browser-shaped header sets for each kind of request the pipeline makes.
//!
//! The `User-Agent` comes from the session; nothing here sets it.

use reqwest::header::{
    HeaderMap, HeaderName, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, CACHE_CONTROL, CONTENT_TYPE,
    ORIGIN, PRAGMA, REFERER, UPGRADE_INSECURE_REQUESTS,
};

use crate::registry::Storefront;

const HTML_ACCEPT: &str =
    "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,*/*;q=0.8";
const LANGUAGE: &str = "en-GB,en;q=0.5";
const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";
const JSON_CONTENT_TYPE: &str = "application/json;charset=utf-8";

pub(crate) const CHECKOUT_AUTHORIZATION: &str = "x-shopify-checkout-authorization-token";

fn insert(headers: &mut HeaderMap, name: HeaderName, value: &str) {
    match HeaderValue::from_str(value) {
        Ok(value) => {
            headers.insert(name, value);
        }
        Err(_) => tracing::debug!(header = %name, "skipping header with invalid value"),
    }
}

fn fetch_metadata(headers: &mut HeaderMap, dest: &str, mode: &str) {
    insert(headers, HeaderName::from_static("sec-fetch-dest"), dest);
    insert(headers, HeaderName::from_static("sec-fetch-mode"), mode);
    insert(headers, HeaderName::from_static("sec-fetch-site"), "same-origin");
}

fn no_cache(headers: &mut HeaderMap) {
    insert(headers, PRAGMA, "no-cache");
    insert(headers, CACHE_CONTROL, "no-cache");
}

/// Top-level page navigation.
pub(crate) fn document(referer: Option<&str>) -> HeaderMap {
    let mut headers = HeaderMap::new();
    insert(&mut headers, ACCEPT, HTML_ACCEPT);
    insert(&mut headers, ACCEPT_LANGUAGE, LANGUAGE);
    insert(&mut headers, UPGRADE_INSECURE_REQUESTS, "1");
    fetch_metadata(&mut headers, "document", "navigate");
    insert(&mut headers, HeaderName::from_static("sec-fetch-user"), "?1");
    if let Some(referer) = referer {
        insert(&mut headers, REFERER, referer);
    }
    headers
}

/// A checkout form posted by the page itself.
pub(crate) fn form_submit(storefront: &Storefront, referer: &str) -> HeaderMap {
    let mut headers = document(Some(referer));
    insert(&mut headers, ORIGIN, &storefront.origin);
    insert(&mut headers, CONTENT_TYPE, FORM_CONTENT_TYPE);
    no_cache(&mut headers);
    headers
}

/// A script-initiated JSON request against the storefront.
pub(crate) fn storefront_json(storefront: &Storefront, referer: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    insert(&mut headers, ACCEPT, "application/json, text/plain, */*");
    insert(&mut headers, ACCEPT_LANGUAGE, LANGUAGE);
    insert(&mut headers, CONTENT_TYPE, JSON_CONTENT_TYPE);
    insert(&mut headers, ORIGIN, &storefront.origin);
    insert(&mut headers, REFERER, referer);
    fetch_metadata(&mut headers, "empty", "cors");
    no_cache(&mut headers);
    headers
}

/// The checkout JSON API, authorised by the page's authorization token.
pub(crate) fn checkout_api(authorization_token: &str, referer: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    insert(&mut headers, ACCEPT, "application/json");
    insert(&mut headers, ACCEPT_LANGUAGE, LANGUAGE);
    insert(&mut headers, REFERER, referer);
    insert(
        &mut headers,
        HeaderName::from_static(CHECKOUT_AUTHORIZATION),
        authorization_token,
    );
    fetch_metadata(&mut headers, "empty", "cors");
    headers
}

/// The card vault, which sits on the checkout domain rather than the store.
pub(crate) fn deposit(storefront: &Storefront) -> HeaderMap {
    let checkout_origin = storefront.checkout_domain_origin();
    let mut headers = HeaderMap::new();
    insert(&mut headers, ACCEPT, "application/json");
    insert(&mut headers, ACCEPT_LANGUAGE, LANGUAGE);
    insert(&mut headers, CONTENT_TYPE, "application/json");
    insert(&mut headers, ORIGIN, &checkout_origin);
    insert(&mut headers, REFERER, &format!("{checkout_origin}/"));
    insert(&mut headers, HeaderName::from_static("sec-fetch-site"), "same-site");
    insert(&mut headers, HeaderName::from_static("sec-fetch-mode"), "cors");
    insert(&mut headers, HeaderName::from_static("sec-fetch-dest"), "empty");
    headers
}
