//! Firecrawl extraction client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use super::{ExtractError, ExtractionProvider, ExtractionRequest, ProviderConfig};

/// Extra client-side slack over the provider's own timeout.
const CLIENT_TIMEOUT_SLACK: Duration = Duration::from_secs(15);

/// Firecrawl `/v1/scrape` request body.
#[derive(Debug, Serialize)]
struct ScrapeRequest<'a> {
    url: &'a str,
    formats: [&'static str; 1],
    extract: ExtractOptions<'a>,
    timeout: u64,
}

#[derive(Debug, Serialize)]
struct ExtractOptions<'a> {
    schema: &'a Value,
    prompt: &'a str,
}

/// Firecrawl `/v1/scrape` response body.
#[derive(Debug, Deserialize)]
struct ScrapeResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    data: Option<ScrapeData>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ScrapeData {
    #[serde(default)]
    extract: Option<Value>,
}

/// Extraction provider backed by the Firecrawl API.
pub struct FirecrawlClient {
    config: ProviderConfig,
    client: Client,
}

impl FirecrawlClient {
    /// Create a new client with the given configuration.
    pub fn new(config: ProviderConfig) -> Result<Self, ExtractError> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms) + CLIENT_TIMEOUT_SLACK)
            .build()
            .map_err(|e| ExtractError::Connection(e.to_string()))?;

        Ok(Self { config, client })
    }

    /// Get the config.
    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    fn api_key(&self) -> Result<&str, ExtractError> {
        self.config
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .ok_or(ExtractError::MissingApiKey)
    }
}

#[async_trait]
impl ExtractionProvider for FirecrawlClient {
    fn name(&self) -> &str {
        "firecrawl"
    }

    fn check_ready(&self) -> Result<(), ExtractError> {
        self.api_key().map(|_| ())
    }

    async fn extract(&self, request: &ExtractionRequest) -> Result<Value, ExtractError> {
        let api_key = self.api_key()?;
        let body = ScrapeRequest {
            url: &request.url,
            formats: ["extract"],
            extract: ExtractOptions {
                schema: &request.schema,
                prompt: &request.prompt,
            },
            timeout: self.config.timeout_ms,
        };

        let endpoint = format!("{}/v1/scrape", self.config.endpoint.trim_end_matches('/'));
        debug!("Firecrawl extract: {}", request.url);

        let resp = self
            .client
            .post(&endpoint)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| ExtractError::Connection(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(ExtractError::Api(format!("HTTP {}: {}", status, body)));
        }

        let parsed: ScrapeResponse = resp
            .json()
            .await
            .map_err(|e| ExtractError::Parse(e.to_string()))?;

        extracted_payload(parsed)
    }
}

fn extracted_payload(resp: ScrapeResponse) -> Result<Value, ExtractError> {
    if !resp.success {
        return Err(ExtractError::Api(
            resp.error
                .unwrap_or_else(|| "provider reported failure".to_string()),
        ));
    }
    Ok(resp.data.and_then(|d| d.extract).unwrap_or(Value::Null))
}
