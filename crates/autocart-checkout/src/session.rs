//! Cookie-carrying HTTP session shared by every step of one checkout task.
//!
//! The session owns a cookie jar, a fixed browser identity and an optional
//! proxy. It never follows redirects; callers inspect `Location` themselves
//! because the redirect target is what decides the next step.

use std::sync::Arc;
use std::time::Duration;

use autocart_core::ProxyConfig;
use reqwest::cookie::{CookieStore, Jar};
use reqwest::header::{HeaderMap, LOCATION};
use reqwest::redirect::Policy;
use reqwest::{Client, RequestBuilder, StatusCode, Url};
use serde::Serialize;

use crate::error::CheckoutError;

/// Desktop browser identities used when no user agent is configured.
pub(crate) const BROWSER_USER_AGENTS: [&str; 4] = [
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.4 Safari/605.1.15",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:125.0) Gecko/20100101 Firefox/125.0",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
];

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// A single request/response pair with the body already read.
#[derive(Debug)]
pub struct Exchange {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
    /// Final URL of the request; relative `Location` values resolve against it.
    pub url: Url,
}

impl Exchange {
    /// Returns the absolute redirect target, if the response carried one.
    #[must_use]
    pub fn location(&self) -> Option<String> {
        let raw = self.headers.get(LOCATION)?.to_str().ok()?;
        match self.url.join(raw) {
            Ok(resolved) => Some(resolved.to_string()),
            Err(_) => Some(raw.to_owned()),
        }
    }
}

pub struct Session {
    client: Client,
    jar: Arc<Jar>,
    user_agent: String,
    proxy: Option<ProxyConfig>,
    timeout: Duration,
}

impl Session {
    /// Builds a session with an empty cookie jar.
    ///
    /// When `user_agent` is `None` a browser identity is picked at random and
    /// kept for the life of the session.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::Transport`] if the proxy endpoint is invalid or
    /// the underlying `reqwest::Client` cannot be constructed.
    pub fn new(
        timeout: Duration,
        user_agent: Option<&str>,
        proxy: Option<&ProxyConfig>,
    ) -> Result<Self, CheckoutError> {
        let user_agent = user_agent.map_or_else(random_browser_user_agent, str::to_owned);
        let jar = Arc::new(Jar::default());

        let mut builder = Client::builder()
            .timeout(timeout)
            .connect_timeout(CONNECT_TIMEOUT.min(timeout))
            .user_agent(user_agent.as_str())
            .cookie_provider(Arc::clone(&jar))
            .redirect(Policy::none());

        if let Some(proxy) = proxy {
            let mut upstream = reqwest::Proxy::all(proxy.endpoint())?;
            if let Some(username) = proxy.username.as_deref() {
                upstream = upstream.basic_auth(username, proxy.password.as_deref().unwrap_or(""));
            }
            builder = builder.proxy(upstream);
            tracing::debug!(proxy = %proxy.name, "session routed through proxy");
        }

        Ok(Self {
            client: builder.build()?,
            jar,
            user_agent,
            proxy: proxy.cloned(),
            timeout,
        })
    }

    #[must_use]
    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    #[must_use]
    pub fn proxy(&self) -> Option<&ProxyConfig> {
        self.proxy.as_ref()
    }

    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Returns the `Cookie` header the session would send to `url`.
    #[must_use]
    pub fn cookies_for(&self, url: &Url) -> Option<String> {
        self.jar
            .cookies(url)
            .and_then(|value| value.to_str().ok().map(str::to_owned))
    }

    /// Sends a GET request.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::Transport`] on connection, TLS or timeout failure.
    pub async fn get(&self, url: &str, headers: HeaderMap) -> Result<Exchange, CheckoutError> {
        self.send(self.client.get(url).headers(headers)).await
    }

    /// Sends a GET request with query parameters appended to `url`.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::Transport`] on connection, TLS or timeout failure.
    pub async fn get_with_query(
        &self,
        url: &str,
        query: &[(&str, &str)],
        headers: HeaderMap,
    ) -> Result<Exchange, CheckoutError> {
        self.send(self.client.get(url).query(query).headers(headers))
            .await
    }

    /// Sends a JSON POST. A `Content-Type` already present in `headers` is kept.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::Transport`] on connection, TLS or timeout failure.
    pub async fn post_json<T: Serialize + ?Sized>(
        &self,
        url: &str,
        headers: HeaderMap,
        body: &T,
    ) -> Result<Exchange, CheckoutError> {
        self.send(self.client.post(url).headers(headers).json(body))
            .await
    }

    /// Sends a form-encoded POST, preserving field order and repeated keys.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::Transport`] on connection, TLS or timeout failure.
    pub async fn post_form(
        &self,
        url: &str,
        headers: HeaderMap,
        fields: &[(String, String)],
    ) -> Result<Exchange, CheckoutError> {
        self.send(self.client.post(url).headers(headers).form(fields))
            .await
    }

    async fn send(&self, request: RequestBuilder) -> Result<Exchange, CheckoutError> {
        let response = request.send().await?;
        let status = response.status();
        let url = response.url().clone();
        let headers = response.headers().clone();
        let body = response.text().await?;

        tracing::debug!(
            url = %url.as_str(),
            status = status.as_u16(),
            bytes = body.len(),
            "request completed"
        );

        Ok(Exchange {
            status,
            headers,
            body,
            url,
        })
    }
}

fn random_browser_user_agent() -> String {
    let index = rand::random_range(0..BROWSER_USER_AGENTS.len());
    BROWSER_USER_AGENTS[index].to_owned()
}

#[cfg(test)]
#[path = "session_test.rs"]
mod tests;
