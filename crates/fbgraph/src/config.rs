//! Client configuration.

use bon::Builder;
use fbgraph_common::error::ConfigError;
use fbgraph_common::retry::RetryPolicy;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use url::Url;

/// Default Graph API endpoint.
pub const DEFAULT_BASE_URL: &str = "https://graph.facebook.com";

/// What to do with response keys the entity schema does not declare.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IngestPolicy {
    /// Fail the whole load on the first unknown key
    #[default]
    Strict,
    /// Skip unknown keys and log them
    Permissive,
}

/// Settings shared by every call a [`RemoteLoader`](crate::RemoteLoader) makes.
///
/// ```
/// use fbgraph::config::{GraphConfig, IngestPolicy};
///
/// let config = GraphConfig::from_json(r#"{
///     "api_version": "v19.0",
///     "ingest": "permissive",
///     "retry": {"timeout_ms": 3000, "max_attempts": 3}
/// }"#).unwrap();
/// assert_eq!(config.base().unwrap().as_str(), "https://graph.facebook.com/v19.0");
/// assert_eq!(config.ingest, IngestPolicy::Permissive);
/// ```
#[derive(Debug, Clone, PartialEq, Builder, Serialize, Deserialize)]
#[builder(start_fn = new)]
#[serde(default)]
pub struct GraphConfig {
    /// Root of the Graph API
    #[builder(default = default_base_url())]
    pub base_url: Url,
    /// Version prefix such as `v19.0`; unversioned calls when absent
    #[builder(into)]
    pub api_version: Option<SmolStr>,
    /// Transport retry policy
    #[builder(default)]
    pub retry: RetryPolicy,
    /// Handling of undeclared response keys
    #[builder(default)]
    pub ingest: IngestPolicy,
}

fn default_base_url() -> Url {
    Url::parse(DEFAULT_BASE_URL).expect("default base URL should be valid")
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self::new().build()
    }
}

impl GraphConfig {
    /// Parse and validate a JSON configuration document.
    ///
    /// Missing settings take their defaults; durations are in milliseconds.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check every setting.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !matches!(self.base_url.scheme(), "http" | "https") {
            return Err(ConfigError::Invalid {
                name: "base_url",
                reason: format!("unsupported scheme `{}`", self.base_url.scheme()),
            });
        }
        if self.base_url.cannot_be_a_base() {
            return Err(ConfigError::Invalid {
                name: "base_url",
                reason: "not a base URL".into(),
            });
        }
        if let Some(version) = &self.api_version {
            let digits = version.strip_prefix('v').unwrap_or_default();
            let well_formed = !digits.is_empty()
                && digits.split('.').all(|part| {
                    !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit())
                });
            if !well_formed {
                return Err(ConfigError::Invalid {
                    name: "api_version",
                    reason: format!("expected something like `v19.0`, got `{version}`"),
                });
            }
        }
        self.retry.validate()
    }

    /// Base URL with the version prefix applied.
    pub fn base(&self) -> Result<Url, ConfigError> {
        self.validate()?;
        let mut url = self.base_url.clone();
        if let Some(version) = &self.api_version {
            let path = format!("{}/{}", url.path().trim_end_matches('/'), version);
            url.set_path(&path);
        }
        Ok(url)
    }
}
