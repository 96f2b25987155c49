//! HTTP client for the HITRAN web service
//!
//! - `config`: HTTP client configuration and building
//! - `http`: rate-limited GET with exponential backoff

use url::Url;

use crate::constants::hitran;
use crate::errors::{FetchError, FetchResult};

pub mod config;
pub mod http;

pub use config::ClientConfig;

use http::HttpHandler;

/// Client for the HITRAN API
///
/// Construction never needs the API key; a missing key only surfaces when a
/// request is made, so cached data stays usable offline and without a key.
#[derive(Debug)]
pub struct HitranClient {
    http_handler: HttpHandler,
    base_url: Url,
    api_key: Option<String>,
}

impl HitranClient {
    /// # Errors
    ///
    /// Returns `FetchError` if the base URL is invalid or the HTTP client
    /// cannot be built
    pub fn new(config: ClientConfig) -> FetchResult<Self> {
        let base_url = Self::parse_base_url(&config.base_url)?;
        let client = config.build_http_client()?;
        let http_handler = HttpHandler::new(client, config.rate_limit_rps)?;

        tracing::debug!("Created HITRAN client for {}", base_url);

        Ok(Self {
            http_handler,
            base_url,
            api_key: config.api_key.filter(|k| !k.trim().is_empty()),
        })
    }

    fn parse_base_url(raw: &str) -> FetchResult<Url> {
        let normalized = if raw.ends_with('/') {
            raw.to_string()
        } else {
            format!("{}/", raw)
        };
        Url::parse(&normalized).map_err(|e| FetchError::InvalidUrl {
            url: raw.to_string(),
            error: e.to_string(),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// URL of the cross-section metadata listing
    ///
    /// # Errors
    ///
    /// Returns `FetchError::MissingApiKey` when no key is configured
    pub fn xsc_meta_url(&self) -> FetchResult<Url> {
        let api_key = self.api_key.as_deref().ok_or(FetchError::MissingApiKey)?;
        self.base_url
            .join(&Self::xsc_meta_path(api_key))
            .map_err(|e| FetchError::InvalidUrl {
                url: self.redacted_xsc_meta_url(),
                error: e.to_string(),
            })
    }

    /// The metadata URL with the API key masked, for logs and errors
    pub fn redacted_xsc_meta_url(&self) -> String {
        format!(
            "{}{}",
            self.base_url,
            Self::xsc_meta_path(hitran::REDACTED_KEY)
        )
    }

    fn xsc_meta_path(api_key: &str) -> String {
        format!(
            "api/{}/{}/{}",
            hitran::API_VERSION,
            api_key,
            hitran::XSC_META_ENDPOINT
        )
    }

    /// Fetch the metadata of every cross-section HITRAN publishes
    pub async fn request_xsc_meta(&self) -> FetchResult<serde_json::Value> {
        let url = self.xsc_meta_url()?;
        let label = self.redacted_xsc_meta_url();
        tracing::info!("Requesting cross-section metadata from {}", label);
        self.http_handler.get_json(&url, &label).await
    }
}
