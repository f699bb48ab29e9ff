//! Extraction provider configuration.

use serde::{Deserialize, Serialize};

/// Configuration for the extraction provider client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// API endpoint (scheme and host, no path)
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// API key; usually supplied through `FIRECRAWL_API_KEY`
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,
    /// Per-call timeout passed to the provider, in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Number of products requested per category page
    #[serde(default = "default_target_items")]
    pub target_items: u32,
}

fn default_endpoint() -> String {
    "https://api.firecrawl.dev".to_string()
}

fn default_timeout_ms() -> u64 {
    60_000
}

fn default_target_items() -> u32 {
    20
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self::base_default().with_env_overrides()
    }
}

impl ProviderConfig {
    /// Base default without env overrides.
    pub fn base_default() -> Self {
        Self {
            endpoint: default_endpoint(),
            api_key: None,
            timeout_ms: default_timeout_ms(),
            target_items: default_target_items(),
        }
    }

    /// Check if the config equals the default (for skip_serializing_if).
    pub fn is_default(&self) -> bool {
        *self == Self::base_default()
    }

    /// Apply environment variable overrides.
    ///
    /// Supported env vars:
    /// - `FIRECRAWL_API_KEY`: API key
    /// - `FIRECRAWL_ENDPOINT`: API endpoint
    /// - `FIRECRAWL_TIMEOUT_MS`: per-call timeout
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(key) = non_empty_env("FIRECRAWL_API_KEY") {
            self.api_key = Some(key);
        }
        if let Some(endpoint) = non_empty_env("FIRECRAWL_ENDPOINT") {
            self.endpoint = endpoint;
        }
        if let Some(timeout) = non_empty_env("FIRECRAWL_TIMEOUT_MS").and_then(|v| v.parse().ok()) {
            self.timeout_ms = timeout;
        }
        self
    }

    /// Whether an API key is present.
    pub fn has_api_key(&self) -> bool {
        self.api_key.as_ref().is_some_and(|k| !k.trim().is_empty())
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_default() {
        let config = ProviderConfig::base_default();
        assert_eq!(config.endpoint, "https://api.firecrawl.dev");
        assert_eq!(config.timeout_ms, 60_000);
        assert!(!config.has_api_key());
        assert!(config.is_default());
    }

    #[test]
    fn test_blank_api_key_is_missing() {
        let config = ProviderConfig {
            api_key: Some("  ".to_string()),
            ..ProviderConfig::base_default()
        };
        assert!(!config.has_api_key());
    }

    #[test]
    fn test_deserialize_partial() {
        let config: ProviderConfig = toml::from_str("target_items = 12").unwrap();
        assert_eq!(config.target_items, 12);
        assert_eq!(config.endpoint, "https://api.firecrawl.dev");
    }
}
