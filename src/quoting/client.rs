//! HTTP client for the swap-quote endpoint.
//!
//! # Responsibilities
//! - Build `GET {base_url}{quote_path}?buyToken=..&sellToken=..&sellAmount=..&takerAddress=..`
//! - Attach the API key header when one is configured
//! - Map non-2xx answers to `QuoteError::Api` with the API's own reason
//! - Retry transient failures (connect errors, 429, 5xx)

use std::time::Duration;
use url::Url;

use crate::config::{QuoteApiConfig, RetryConfig};
use crate::quoting::types::{Quote, QuoteError, QuoteRequest, QuoteResult};
use crate::resilience::retry;

/// Header carrying the API key.
pub const API_KEY_HEADER: &str = "0x-api-key";

/// Quote API client.
#[derive(Clone)]
pub struct QuoteClient {
    http: reqwest::Client,
    endpoint: Url,
    api_key: Option<String>,
    retry: RetryConfig,
}

impl QuoteClient {
    /// Create a client from API and retry settings.
    pub fn new(api: &QuoteApiConfig, retry: RetryConfig) -> QuoteResult<Self> {
        // quote_path extends any path prefix on base_url instead of replacing it
        let raw = format!("{}{}", api.base_url.trim_end_matches('/'), api.quote_path);
        let endpoint =
            Url::parse(&raw).map_err(|e| QuoteError::InvalidEndpoint(format!("{}: {}", raw, e)))?;

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(api.request_timeout_secs))
            .build()?;

        Ok(Self {
            http,
            endpoint,
            api_key: api.api_key.clone().filter(|k| !k.is_empty()),
            retry,
        })
    }

    /// Full URL for a quote request.
    pub fn quote_url(&self, request: &QuoteRequest) -> Url {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut().extend_pairs(request.query_pairs());
        url
    }

    /// Fetch a quote, retrying transient failures.
    pub async fn get_quote(&self, request: &QuoteRequest) -> QuoteResult<Quote> {
        let quote = retry(&self.retry, "quote", move || self.fetch_once(request)).await?;

        tracing::info!(
            sell_amount = %quote.sell_amount,
            buy_amount = %quote.buy_amount,
            price = %quote.price,
            sources = ?quote.active_sources(),
            "Quote received"
        );
        Ok(quote)
    }

    async fn fetch_once(&self, request: &QuoteRequest) -> QuoteResult<Quote> {
        let url = self.quote_url(request);
        tracing::debug!(url = %url, "Requesting quote");

        let mut builder = self.http.get(url);
        if let Some(key) = &self.api_key {
            builder = builder.header(API_KEY_HEADER, key);
        }

        let resp = builder.send().await?;
        let status = resp.status();
        let text = resp.text().await?;

        if !status.is_success() {
            return Err(QuoteError::from_response(status, &text));
        }

        serde_json::from_str::<Quote>(&text).map_err(|e| QuoteError::Decode(e.to_string()))
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

impl std::fmt::Debug for QuoteClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QuoteClient")
            .field("endpoint", &self.endpoint.as_str())
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}
