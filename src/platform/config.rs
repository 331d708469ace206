//! Platform client configuration

use crate::error::{PixelbinError, Result};
use serde::{Deserialize, Serialize};

/// Default platform API host
pub const DEFAULT_API_DOMAIN: &str = "https://api.pixelbin.io";

pub const ENV_DOMAIN: &str = "PIXELBIN_DOMAIN";
pub const ENV_API_TOKEN: &str = "PIXELBIN_API_TOKEN";
pub const ENV_INTEGRATION_PLATFORM: &str = "PIXELBIN_INTEGRATION_PLATFORM";

/// Configuration for talking to the Pixelbin platform API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PixelbinConfig {
    /// API host (default: https://api.pixelbin.io)
    #[serde(default = "default_domain")]
    pub domain: String,

    /// API token; sent base64-encoded as a bearer token
    pub api_secret: String,

    /// Sent as the `user-agent` header when set
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub integration_platform: Option<String>,
}

fn default_domain() -> String {
    DEFAULT_API_DOMAIN.to_string()
}

impl PixelbinConfig {
    /// Create a configuration for the default domain
    pub fn new(api_secret: impl Into<String>) -> Self {
        Self {
            domain: default_domain(),
            api_secret: api_secret.into(),
            integration_platform: None,
        }
    }

    /// Set the API domain
    pub fn domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = domain.into();
        self
    }

    /// Set the integration platform (user agent)
    pub fn integration_platform(mut self, platform: impl Into<String>) -> Self {
        self.integration_platform = Some(platform.into());
        self
    }

    /// Read the configuration from `PIXELBIN_*` environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a configuration from an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_secret = lookup(ENV_API_TOKEN)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| {
                PixelbinError::illegal_argument(format!("{} is not set", ENV_API_TOKEN))
            })?;

        let mut config = Self::new(api_secret);
        if let Some(domain) = lookup(ENV_DOMAIN).filter(|s| !s.is_empty()) {
            config.domain = domain;
        }
        config.integration_platform = lookup(ENV_INTEGRATION_PLATFORM).filter(|s| !s.is_empty());
        config.validate()?;
        Ok(config)
    }

    /// Check that the configuration can be used to issue requests
    pub fn validate(&self) -> Result<()> {
        if self.api_secret.is_empty() {
            return Err(PixelbinError::illegal_argument("apiSecret should be defined"));
        }
        let domain = url::Url::parse(&self.domain).map_err(|e| {
            PixelbinError::illegal_argument(format!("invalid domain '{}': {}", self.domain, e))
        })?;
        if !matches!(domain.scheme(), "http" | "https") {
            return Err(PixelbinError::illegal_argument(format!(
                "domain '{}' must use http or https",
                self.domain
            )));
        }
        Ok(())
    }

    /// Convert the configuration to a JSON string
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(PixelbinError::from)
    }

    /// Create a configuration from a JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(PixelbinError::from)
    }
}
