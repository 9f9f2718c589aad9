//! Client configuration.
//!
//! Defaults point at the public distribution endpoints. Override via
//! environment variables or explicit construction for mirrors and tests.

use pieceline_core::{PathTemplate, TemplateError};
use url::Url;

/// Default bootstrap token location.
pub const DEFAULT_BOOTSTRAP_URL: &str =
    "https://jagex.akamaized.net/direct6/osrs-win/osrs-win.json";

/// Default catalog URL template; `{id}` is the production environment id.
pub const DEFAULT_CATALOG_TEMPLATE: &str =
    "https://jagex.akamaized.net/direct6/osrs-win/catalog/{id}/catalog.json";

/// Browser-like identifying header sent with every request.
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:141.0) Gecko/20100101 Firefox/141.0";

/// Variable name available to catalog URL templates.
pub const CATALOG_ID_VAR: &str = "id";

/// Configuration for the distribution client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// URL of the bootstrap token.
    pub bootstrap_url: Url,
    /// Catalog URL template, rendered with the environment id.
    pub catalog_template: PathTemplate,
    /// `User-Agent` header value.
    pub user_agent: String,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
    /// Maximum pieces fetched concurrently.
    pub concurrency: usize,
    /// Rewrite `http://` piece base URLs to `https://`.
    pub upgrade_insecure: bool,
}

impl ClientConfig {
    /// Build a configuration, validating that the catalog template only
    /// references `{id}`.
    pub fn new(bootstrap_url: Url, catalog_template: PathTemplate) -> Result<Self, ConfigError> {
        catalog_template
            .ensure_resolvable(&[CATALOG_ID_VAR])
            .map_err(|e| ConfigError::InvalidTemplate("catalog_template".into(), e))?;
        Ok(Self {
            bootstrap_url,
            catalog_template,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout_secs: 30,
            concurrency: 8,
            upgrade_insecure: true,
        })
    }

    /// Load configuration from environment variables.
    ///
    /// Variables:
    /// - `PIECELINE_BOOTSTRAP_URL` (default: [`DEFAULT_BOOTSTRAP_URL`])
    /// - `PIECELINE_CATALOG_TEMPLATE` (default: [`DEFAULT_CATALOG_TEMPLATE`])
    /// - `PIECELINE_USER_AGENT` (default: a desktop Firefox string)
    /// - `PIECELINE_TIMEOUT_SECS` (default: 30)
    /// - `PIECELINE_CONCURRENCY` (default: 8)
    /// - `PIECELINE_UPGRADE_INSECURE` (default: true)
    pub fn from_env() -> Result<Self, ConfigError> {
        let bootstrap_url = env_url("PIECELINE_BOOTSTRAP_URL", DEFAULT_BOOTSTRAP_URL)?;
        let catalog_template = env_template("PIECELINE_CATALOG_TEMPLATE", DEFAULT_CATALOG_TEMPLATE)?;

        let mut config = Self::new(bootstrap_url, catalog_template)?;
        if let Ok(agent) = std::env::var("PIECELINE_USER_AGENT") {
            config.user_agent = agent;
        }
        config.timeout_secs = env_parse("PIECELINE_TIMEOUT_SECS").unwrap_or(30);
        config.concurrency = env_parse::<usize>("PIECELINE_CONCURRENCY")
            .unwrap_or(8)
            .max(1);
        config.upgrade_insecure = env_parse("PIECELINE_UPGRADE_INSECURE").unwrap_or(true);
        Ok(config)
    }

    /// Create a configuration pointing at a local mock server (for testing).
    ///
    /// The bootstrap token is expected at `{base}/bootstrap.json` and
    /// catalogs at `{base}/catalog/{id}/catalog.json`. TLS upgrade is off.
    pub fn local_mock(base: &str) -> Result<Self, ConfigError> {
        let base = base.trim_end_matches('/');
        let bootstrap_url = Url::parse(&format!("{base}/bootstrap.json"))
            .map_err(|e| ConfigError::InvalidUrl("local_mock".to_string(), e.to_string()))?;
        let catalog_template = PathTemplate::parse(&format!("{base}/catalog/{{id}}/catalog.json"))
            .map_err(|e| ConfigError::InvalidTemplate("local_mock".to_string(), e))?;

        let mut config = Self::new(bootstrap_url, catalog_template)?;
        config.timeout_secs = 5;
        config.concurrency = 4;
        config.upgrade_insecure = false;
        Ok(config)
    }
}

fn env_url(var: &str, default: &str) -> Result<Url, ConfigError> {
    let raw = std::env::var(var).unwrap_or_else(|_| default.to_string());
    Url::parse(&raw).map_err(|e| ConfigError::InvalidUrl(var.to_string(), e.to_string()))
}

fn env_template(var: &str, default: &str) -> Result<PathTemplate, ConfigError> {
    let raw = std::env::var(var).unwrap_or_else(|_| default.to_string());
    PathTemplate::parse(&raw).map_err(|e| ConfigError::InvalidTemplate(var.to_string(), e))
}

fn env_parse<T: std::str::FromStr>(var: &str) -> Option<T> {
    std::env::var(var).ok().and_then(|s| s.trim().parse().ok())
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid URL for {0}: {1}")]
    InvalidUrl(String, String),
    #[error("invalid template for {0}: {1}")]
    InvalidTemplate(String, #[source] TemplateError),
}
