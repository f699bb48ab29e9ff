//! Scrape a single category page through the extraction provider.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, warn};

use super::RetryPolicy;
use crate::extract::{ExtractionProvider, ExtractionRequest};
use crate::models::{normalize_products, Product};

/// Result of scraping one (url, category) pair.
#[derive(Debug, Clone, Serialize)]
pub struct CategoryOutcome {
    pub category: String,
    pub url: String,
    pub products: Vec<Product>,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Provider calls made.
    pub attempts: u32,
}

/// Calls the provider for a category page, retrying failures and empty results.
#[derive(Clone)]
pub struct ScrapeExecutor {
    provider: Arc<dyn ExtractionProvider>,
    retry: RetryPolicy,
    target_items: u32,
}

impl ScrapeExecutor {
    pub fn new(provider: Arc<dyn ExtractionProvider>, retry: RetryPolicy, target_items: u32) -> Self {
        Self {
            provider,
            retry,
            target_items,
        }
    }

    pub fn provider(&self) -> &Arc<dyn ExtractionProvider> {
        &self.provider
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    /// Scrape `url` for `category`.
    ///
    /// Never fails: exhausted retries come back as `success = false` with the
    /// last error message.
    pub async fn scrape_category(&self, url: &str, category: &str) -> CategoryOutcome {
        let request = ExtractionRequest::for_category(url, category, self.target_items);
        let max_attempts = self.retry.max_attempts.max(1);
        let mut last_error = String::new();

        for attempt in 1..=max_attempts {
            debug!(
                "Scraping '{}' from {} (attempt {}/{})",
                category, url, attempt, max_attempts
            );

            match self.provider.extract(&request).await {
                Ok(payload) => {
                    let products = normalize_products(&payload, category, url, &Utc::now());
                    if !products.is_empty() {
                        debug!("Extracted {} products for '{}'", products.len(), category);
                        return CategoryOutcome {
                            category: category.to_string(),
                            url: url.to_string(),
                            products,
                            success: true,
                            error: None,
                            attempts: attempt,
                        };
                    }
                    last_error = "No products extracted".to_string();
                }
                Err(e) => {
                    last_error = e.to_string();
                }
            }

            if attempt < max_attempts {
                let delay = self.retry.delay_after(attempt);
                warn!(
                    "Attempt {} for '{}' failed ({}), retrying in {:?}",
                    attempt, category, last_error, delay
                );
                tokio::time::sleep(delay).await;
            }
        }

        warn!(
            "Giving up on '{}' after {} attempts: {}",
            category, max_attempts, last_error
        );
        CategoryOutcome {
            category: category.to_string(),
            url: url.to_string(),
            products: Vec::new(),
            success: false,
            error: Some(last_error),
            attempts: max_attempts,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::Ordering;
    use std::time::Duration;

    use serde_json::{json, Value};

    use crate::extract::testing::{products_payload, ScriptedProvider};

    const URL: &str = "https://www.screwfix.com/search?search=pliers";

    fn executor(provider: Arc<ScriptedProvider>, attempts: u32) -> ScrapeExecutor {
        ScrapeExecutor::new(provider, RetryPolicy::immediate(attempts), 10)
    }

    #[tokio::test]
    async fn test_success_first_attempt() {
        let provider = Arc::new(ScriptedProvider::always(Ok(products_payload(&[
            "Knipex Pliers",
            "Stanley Knife",
        ]))));
        let outcome = executor(provider.clone(), 2)
            .scrape_category(URL, "Hand Tools")
            .await;

        assert!(outcome.success);
        assert_eq!(outcome.attempts, 1);
        assert_eq!(outcome.products.len(), 2);
        assert!(outcome.error.is_none());
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
        for p in &outcome.products {
            assert_eq!(p.supplier, "Screwfix");
            assert_eq!(p.category, "Hand Tools");
        }
    }

    #[tokio::test]
    async fn test_empty_result_is_retried_up_to_max() {
        let provider = Arc::new(ScriptedProvider::always(Ok(json!({ "products": [] }))));
        let outcome = executor(provider.clone(), 3)
            .scrape_category(URL, "Hand Tools")
            .await;

        assert!(!outcome.success);
        assert!(outcome.products.is_empty());
        assert_eq!(outcome.attempts, 3);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 3);
        assert_eq!(outcome.error.as_deref(), Some("No products extracted"));
    }

    #[tokio::test]
    async fn test_error_then_success() {
        let provider = Arc::new(ScriptedProvider::new(
            vec![Err("HTTP 502".to_string())],
            Ok(products_payload(&["Fluke 1664 FC"])),
        ));
        let outcome = executor(provider.clone(), 2)
            .scrape_category(URL, "Test Equipment")
            .await;

        assert!(outcome.success);
        assert_eq!(outcome.attempts, 2);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_malformed_payload_treated_as_empty() {
        let provider = Arc::new(ScriptedProvider::new(
            vec![Ok(Value::Null), Ok(json!({ "products": "n/a" }))],
            Ok(products_payload(&["never reached"])),
        ));
        let outcome = executor(provider.clone(), 2)
            .scrape_category(URL, "Hand Tools")
            .await;

        assert!(!outcome.success);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_exhaustion_reports_last_error() {
        let provider = Arc::new(ScriptedProvider::new(
            vec![Err("timeout".to_string())],
            Err("HTTP 429".to_string()),
        ));
        let outcome = executor(provider, 2).scrape_category(URL, "Hand Tools").await;

        assert!(!outcome.success);
        assert_eq!(outcome.error.as_deref(), Some("API error: HTTP 429"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_linear_backoff_between_attempts() {
        let provider = Arc::new(ScriptedProvider::always(Err("down".to_string())));
        let executor = ScrapeExecutor::new(
            provider,
            RetryPolicy::new(3, Duration::from_secs(2)),
            10,
        );

        let started = tokio::time::Instant::now();
        executor.scrape_category(URL, "Hand Tools").await;
        // 1 * 2s + 2 * 2s, nothing after the final attempt
        assert_eq!(started.elapsed(), Duration::from_secs(6));
    }
}
