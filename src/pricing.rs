//! Client for the remote pricing API.
//!
//! Two endpoints are consumed: the currency catalog (code → display name) and
//! live USD-relative quotes for a list of codes. Both require an `apikey`
//! header. The [`PriceFeed`] trait is the seam the cache and converter depend
//! on, so tests can substitute a stub feed.

use async_trait::async_trait;
use reqwest::Client as HttpClient;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::time::Duration;
use thiserror::Error;

/// Currency catalog: ISO code → country/display name.
///
/// A `BTreeMap` keeps listing order stable across calls within one snapshot
/// lifetime.
pub type Catalog = BTreeMap<String, String>;

/// Exchange rates: ISO code → quote relative to the USD base.
pub type Rates = BTreeMap<String, f64>;

/// Base currency all stored rates are expressed against.
pub const BASE_CURRENCY: &str = "USD";

const API_ROOT: &str = "https://api.apilayer.com/currency_data";
const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Errors produced by remote fetches.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The API answered with a non-success status.
    #[error("pricing API error: {status} - {body}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Response body, for diagnostics.
        body: String,
    },
    /// The request could not be completed at the transport level.
    #[error("pricing API unreachable: {0}")]
    Network(String),
    /// The response decoded but did not have the expected shape.
    #[error("unexpected pricing API response: {0}")]
    Decode(String),
}

/// Source of catalog and rate data.
#[async_trait]
pub trait PriceFeed: Send + Sync {
    /// Fetch the full currency catalog.
    async fn fetch_catalog(&self) -> Result<Catalog, FetchError>;

    /// Fetch live USD-relative quotes for the given codes.
    async fn fetch_rates(&self, codes: &[String]) -> Result<Rates, FetchError>;
}

#[derive(Debug, Deserialize)]
struct ListResponse {
    currencies: BTreeMap<String, String>,
}

#[derive(Debug, Deserialize)]
struct LiveResponse {
    quotes: BTreeMap<String, f64>,
}

/// HTTP implementation of [`PriceFeed`].
pub struct PricingClient {
    http: HttpClient,
    api_key: String,
    root: String,
}

impl PricingClient {
    /// Create a client using the given API key.
    ///
    /// # Errors
    ///
    /// Propagates the HTTP client build error; a client without the request
    /// timeout is never handed out.
    pub fn new(api_key: impl Into<String>) -> Result<Self, reqwest::Error> {
        Self::with_root(api_key, API_ROOT)
    }

    /// Create a client against a non-default API root. Used by tests.
    ///
    /// # Errors
    ///
    /// See [`Self::new`].
    pub fn with_root(
        api_key: impl Into<String>,
        root: impl Into<String>,
    ) -> Result<Self, reqwest::Error> {
        let http = HttpClient::builder().timeout(HTTP_TIMEOUT).build()?;
        Ok(Self {
            http,
            api_key: api_key.into(),
            root: root.into(),
        })
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<T, FetchError> {
        let response = self
            .http
            .get(url)
            .header("apikey", &self.api_key)
            .send()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::Api {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json()
            .await
            .map_err(|e| FetchError::Decode(e.to_string()))
    }
}

#[async_trait]
impl PriceFeed for PricingClient {
    async fn fetch_catalog(&self) -> Result<Catalog, FetchError> {
        let url = format!("{}/list", self.root);
        let body: ListResponse = self.get_json(&url).await?;
        Ok(body.currencies)
    }

    async fn fetch_rates(&self, codes: &[String]) -> Result<Rates, FetchError> {
        let url = format!(
            "{}/live?source={}&currencies={}",
            self.root,
            BASE_CURRENCY,
            codes.join(",")
        );
        let body: LiveResponse = self.get_json(&url).await?;
        Ok(strip_base_pairs(body.quotes))
    }
}

/// The API keys quotes as "USDEUR"; store them base-stripped so the snapshot
/// payload is plain code → rate.
fn strip_base_pairs(quotes: BTreeMap<String, f64>) -> Rates {
    quotes
        .into_iter()
        .map(|(pair, rate)| {
            let code = pair
                .strip_prefix(BASE_CURRENCY)
                .unwrap_or(pair.as_str())
                .to_string();
            (code, rate)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_client_builds_against_the_api_root() {
        let client = PricingClient::new("test-key").expect("client builds");
        assert_eq!(client.root, API_ROOT);
    }

    #[test]
    fn live_response_quotes_are_base_stripped() {
        let body: LiveResponse = serde_json::from_str(
            r#"{"quotes":{"USDEUR":0.9,"USDJPY":150.0}}"#,
        )
        .expect("decode");

        let rates = strip_base_pairs(body.quotes);
        assert_eq!(rates.get("EUR"), Some(&0.9));
        assert_eq!(rates.get("JPY"), Some(&150.0));
        assert!(!rates.contains_key("USDEUR"));
    }

    #[test]
    fn list_response_decodes_catalog() {
        let body: ListResponse = serde_json::from_str(
            r#"{"success":true,"currencies":{"EUR":"Euro","USD":"United States Dollar"}}"#,
        )
        .expect("decode");
        assert_eq!(body.currencies.get("EUR").map(String::as_str), Some("Euro"));
    }
}
