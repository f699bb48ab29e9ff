//! Structured extraction through an external scraping provider.
//!
//! The provider fetches a page and returns JSON shaped by a schema and a
//! natural-language prompt. Only Firecrawl is implemented; tests plug in
//! scripted providers through [`ExtractionProvider`].

mod config;
mod firecrawl;
mod prompts;
#[cfg(test)]
pub(crate) mod testing;

use async_trait::async_trait;
use serde_json::Value;

pub use config::ProviderConfig;
pub use firecrawl::FirecrawlClient;
pub use prompts::{extraction_prompt, product_schema};

/// One extraction call.
#[derive(Debug, Clone)]
pub struct ExtractionRequest {
    pub url: String,
    pub schema: Value,
    pub prompt: String,
}

impl ExtractionRequest {
    /// Request for the product list of a category search page.
    pub fn for_category(url: &str, category: &str, target_items: u32) -> Self {
        Self {
            url: url.to_string(),
            schema: product_schema(),
            prompt: extraction_prompt(category, target_items),
        }
    }
}

/// Errors that can occur while calling the extraction provider.
#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error("Connection error: {0}")]
    Connection(String),
    #[error("API error: {0}")]
    Api(String),
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("Extraction provider API key is not configured")]
    MissingApiKey,
}

/// A service that turns a URL into structured JSON.
#[async_trait]
pub trait ExtractionProvider: Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &str;

    /// Whether the provider can be called at all (credentials present, etc.).
    fn check_ready(&self) -> Result<(), ExtractError> {
        Ok(())
    }

    /// Run one extraction. Returns the extracted JSON payload, which may be
    /// `Value::Null` when the provider produced nothing.
    async fn extract(&self, request: &ExtractionRequest) -> Result<Value, ExtractError>;
}
