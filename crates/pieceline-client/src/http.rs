//! Thin GET wrapper shared by the resolver and the piece fetcher.
//!
//! No retries: a failed request fails the run, and retry policy belongs to
//! whoever triggers it.

use std::time::Duration;

use bytes::Bytes;
use url::Url;

use crate::config::ClientConfig;
use crate::error::{ClientError, FetchError};

/// Shared HTTP client with the configured user agent and timeout.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    http: reqwest::Client,
}

impl HttpFetcher {
    /// Build the underlying `reqwest` client from configuration.
    pub fn new(config: &ClientConfig) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(ClientError::ClientInit)?;
        Ok(Self { http })
    }

    async fn get(&self, url: &str) -> Result<reqwest::Response, FetchError> {
        let resp = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|source| FetchError::Transport {
                url: url.to_string(),
                source,
            })?;

        if !resp.status().is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: resp.status().as_u16(),
            });
        }
        Ok(resp)
    }

    /// GET `url` and return the body as text.
    pub async fn get_text(&self, url: &str) -> Result<String, FetchError> {
        tracing::debug!(url, "GET");
        self.get(url)
            .await?
            .text()
            .await
            .map_err(|source| FetchError::Body {
                url: url.to_string(),
                source,
            })
    }

    /// GET `url` and return the raw body.
    pub async fn get_bytes(&self, url: &str) -> Result<Bytes, FetchError> {
        tracing::debug!(url, "GET");
        self.get(url)
            .await?
            .bytes()
            .await
            .map_err(|source| FetchError::Body {
                url: url.to_string(),
                source,
            })
    }
}

/// Parse `raw` as a URL, rewriting `http` to `https` when `upgrade` is set.
pub fn parse_base_url(raw: &str, upgrade: bool) -> Result<Url, ClientError> {
    let invalid = |reason: String| ClientError::InvalidUrl {
        url: raw.to_string(),
        reason,
    };
    let mut url = Url::parse(raw).map_err(|e| invalid(e.to_string()))?;
    if upgrade && url.scheme() == "http" {
        url.set_scheme("https")
            .map_err(|()| invalid("cannot upgrade scheme to https".into()))?;
        tracing::debug!(from = raw, to = %url, "upgraded base URL to TLS");
    }
    Ok(url)
}
