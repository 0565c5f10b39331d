//! Maps product URLs onto storefront descriptions.

use autocart_core::StoreProfile;
use reqwest::Url;

use crate::error::StoreLookupError;

/// The store a task targets, resolved from its product URL.
#[derive(Debug, Clone)]
pub struct Storefront {
    pub store: StoreProfile,
    /// Scheme and authority of the product URL, e.g. `https://shop.test`.
    pub origin: String,
    pub host: String,
    pub product_url: Url,
}

impl Storefront {
    #[must_use]
    pub fn cart_add_url(&self) -> String {
        format!("{}/cart/add.js", self.origin)
    }

    #[must_use]
    pub fn checkout_start_url(&self) -> String {
        format!("{}/checkout", self.origin)
    }

    #[must_use]
    pub fn checkout_url(&self, checkout_token: &str) -> String {
        format!(
            "{}/{}/checkouts/{checkout_token}",
            self.origin, self.store.code
        )
    }

    #[must_use]
    pub fn shipping_rates_url(&self, checkout_token: &str) -> String {
        format!(
            "{}/api/checkouts/{checkout_token}/shipping_rates",
            self.origin
        )
    }

    /// The product page as a browser would show it with `variant_id` selected.
    #[must_use]
    pub fn product_referer(&self, variant_id: &str) -> String {
        format!(
            "{}{}?variant={variant_id}",
            self.origin,
            self.product_url.path()
        )
    }

    /// `https://{checkout_domain}`, used as `Origin` and `Referer` for the
    /// payment vault.
    #[must_use]
    pub fn checkout_domain_origin(&self) -> String {
        format!("https://{}", self.store.checkout_domain)
    }
}

#[derive(Debug, Clone)]
pub struct StoreRegistry {
    stores: Vec<StoreProfile>,
}

impl StoreRegistry {
    #[must_use]
    pub fn new(stores: Vec<StoreProfile>) -> Self {
        Self { stores }
    }

    /// Registry seeded with the stores shipped in the binary.
    #[must_use]
    pub fn builtin() -> Self {
        Self::new(autocart_core::builtin_stores())
    }

    #[must_use]
    pub fn stores(&self) -> &[StoreProfile] {
        &self.stores
    }

    /// Finds a store by host, ignoring ASCII case.
    #[must_use]
    pub fn lookup_host(&self, host: &str) -> Option<&StoreProfile> {
        self.stores
            .iter()
            .find(|store| store.domain.eq_ignore_ascii_case(host))
    }

    /// Resolves a product URL to the storefront serving it.
    ///
    /// # Errors
    ///
    /// Returns [`StoreLookupError::InvalidUrl`] if `product_url` is not an
    /// absolute http(s) URL, or [`StoreLookupError::UnknownStore`] if no
    /// configured store matches its host.
    pub fn resolve(&self, product_url: &str) -> Result<Storefront, StoreLookupError> {
        let url = Url::parse(product_url).map_err(|e| StoreLookupError::InvalidUrl {
            url: product_url.to_owned(),
            reason: e.to_string(),
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(StoreLookupError::InvalidUrl {
                url: product_url.to_owned(),
                reason: format!("unsupported scheme '{}'", url.scheme()),
            });
        }
        let host = url
            .host_str()
            .ok_or_else(|| StoreLookupError::InvalidUrl {
                url: product_url.to_owned(),
                reason: "URL has no host".to_string(),
            })?
            .to_ascii_lowercase();

        let store = self
            .lookup_host(&host)
            .cloned()
            .ok_or_else(|| StoreLookupError::UnknownStore { host: host.clone() })?;

        Ok(Storefront {
            store,
            origin: url.origin().ascii_serialization(),
            host,
            product_url: url,
        })
    }
}
