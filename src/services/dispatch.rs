//! Request dispatcher: merge, cache hit, or fresh scrape.

use std::sync::Arc;

use tracing::{info, warn};

use super::responses::{
    BatchParam, CachedResponse, FreshResponse, MergeResponse, ScrapeRequest, ScrapeResponse,
    SoftFailureResponse,
};
use crate::cache::{CacheLookup, CacheStore};
use crate::extract::ExtractionProvider;
use crate::models::BatchNumber;
use crate::scrape::{BatchOrchestrator, OrchestratorError};

/// Failures that abort a request.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("Invalid batch number: {0}")]
    InvalidBatch(String),
    #[error("Configuration error: {0}")]
    Configuration(String),
    #[error("{0}")]
    Internal(String),
}

impl DispatchError {
    /// HTTP status code for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::InvalidBatch(_) => 400,
            Self::Configuration(_) | Self::Internal(_) => 500,
        }
    }
}

impl From<OrchestratorError> for DispatchError {
    fn from(e: OrchestratorError) -> Self {
        match e {
            OrchestratorError::UnknownBatch(batch) => Self::InvalidBatch(batch.to_string()),
        }
    }
}

/// Serves scrape requests from the cache or the provider.
#[derive(Clone)]
pub struct Dispatcher {
    cache: CacheStore,
    orchestrator: BatchOrchestrator,
}

impl Dispatcher {
    pub fn new(cache: CacheStore, orchestrator: BatchOrchestrator) -> Self {
        Self {
            cache,
            orchestrator,
        }
    }

    pub fn cache(&self) -> &CacheStore {
        &self.cache
    }

    pub fn orchestrator(&self) -> &BatchOrchestrator {
        &self.orchestrator
    }

    fn provider(&self) -> &Arc<dyn ExtractionProvider> {
        self.orchestrator.executor().provider()
    }

    pub async fn handle(&self, request: ScrapeRequest) -> Result<ScrapeResponse, DispatchError> {
        if request.merge_all {
            return Ok(self.merge().await);
        }

        let batch = self.resolve_batch(request.batch_or_default())?;

        if !request.force_refresh {
            match self.cache.lookup_batch(batch).await {
                CacheLookup::Hit(record) => {
                    info!(
                        "Serving batch {} from cache ({} products)",
                        batch, record.total_products
                    );
                    return Ok(ScrapeResponse::Cached(CachedResponse {
                        success: true,
                        total_found: record.products.len(),
                        message: format!(
                            "Loaded {} cached tools for batch {}",
                            record.products.len(),
                            batch
                        ),
                        tools: record.products,
                        batch: batch.get(),
                        cached: true,
                        expires_at: record.expires_at,
                    }));
                }
                CacheLookup::Miss => {}
                CacheLookup::Error(reason) => {
                    warn!("Cache lookup for batch {} failed, scraping: {}", batch, reason);
                }
            }
        }

        self.provider()
            .check_ready()
            .map_err(|e| DispatchError::Configuration(e.to_string()))?;

        let run = self.orchestrator.run_batch(batch).await?;
        let elapsed_time = u64::try_from(run.elapsed.as_millis()).unwrap_or(u64::MAX);

        if run.products.is_empty() {
            warn!("Batch {} produced no products; cache left untouched", batch);
            return Ok(ScrapeResponse::SoftFailure(SoftFailureResponse {
                success: false,
                tools: Vec::new(),
                total_found: 0,
                batch: batch.get(),
                category_stats: run.category_stats,
                message: format!(
                    "No tools found for batch {}; every category scrape failed",
                    batch
                ),
                elapsed_time,
            }));
        }

        if let Err(e) = self.cache.replace_batch(batch, run.products.clone()).await {
            warn!("Failed to cache batch {}: {}", batch, e);
        }

        let total_found = run.products.len();
        Ok(ScrapeResponse::Fresh(FreshResponse {
            success: true,
            message: format!(
                "Scraped {} tools across {} categories for batch {}",
                total_found, run.categories_scraped, batch
            ),
            tools: run.products,
            total_found,
            batch: batch.get(),
            category_stats: run.category_stats,
            categories_scraped: run.categories_scraped,
            elapsed_time,
            cached: false,
        }))
    }

    fn resolve_batch(&self, requested: BatchParam) -> Result<BatchNumber, DispatchError> {
        match requested {
            BatchParam::Number(n) => u32::try_from(n)
                .ok()
                .map(BatchNumber::new)
                .filter(|b| self.orchestrator.registry().contains(*b))
                .ok_or_else(|| DispatchError::InvalidBatch(n.to_string())),
            BatchParam::Malformed(raw) => Err(DispatchError::InvalidBatch(raw)),
        }
    }

    async fn merge(&self) -> ScrapeResponse {
        let merged = self.cache.merge_all().await;
        let expected = self.cache.registry().len();
        let message = if merged.all_batches_complete {
            format!(
                "Merged {} tools from all {} batches",
                merged.products.len(),
                expected
            )
        } else {
            format!(
                "Merged {} tools from {} of {} batches",
                merged.products.len(),
                merged.batches_found,
                expected
            )
        };

        ScrapeResponse::Merge(MergeResponse {
            success: merged.batches_found > 0,
            total_found: merged.products.len(),
            tools: merged.products,
            batches_found: merged.batches_found,
            all_batches_complete: merged.all_batches_complete,
            message,
            mode: "merge",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use async_trait::async_trait;
    use chrono::{DateTime, Duration, Utc};
    use serde_json::json;

    use crate::cache::{BatchCacheBackend, CacheError};
    use crate::extract::testing::{products_payload, ScriptedProvider};
    use crate::models::BatchRecord;
    use crate::registry::BatchRegistry;
    use crate::repository::util::pool_error;
    use crate::scrape::{RetryPolicy, ScrapeExecutor};

    /// Backend whose every operation fails, like a locked or unreadable file.
    struct UnavailableCache;

    #[async_trait]
    impl BatchCacheBackend for UnavailableCache {
        async fn latest_unexpired(
            &self,
            _batch: BatchNumber,
            _now: DateTime<Utc>,
        ) -> Result<Option<BatchRecord>, CacheError> {
            Err(CacheError::Database(pool_error("database is locked")))
        }

        async fn delete_batch(&self, _batch: BatchNumber) -> Result<usize, CacheError> {
            Err(CacheError::Database(pool_error("database is locked")))
        }

        async fn insert(&self, _record: &BatchRecord) -> Result<(), CacheError> {
            Err(CacheError::Database(pool_error("database is locked")))
        }

        async fn purge_expired(&self, _now: DateTime<Utc>) -> Result<usize, CacheError> {
            Err(CacheError::Database(pool_error("database is locked")))
        }
    }

    fn dispatcher_with(cache: CacheStore, provider: Arc<ScriptedProvider>) -> Dispatcher {
        let executor = ScrapeExecutor::new(provider, RetryPolicy::immediate(2), 10);
        let registry = cache.registry().clone();
        Dispatcher::new(cache, BatchOrchestrator::new(registry, executor))
    }

    fn dispatcher(provider: Arc<ScriptedProvider>) -> Dispatcher {
        let registry = Arc::new(BatchRegistry::default());
        dispatcher_with(CacheStore::in_memory(registry), provider)
    }

    fn unavailable_cache() -> CacheStore {
        CacheStore::new(
            Arc::new(UnavailableCache),
            Arc::new(BatchRegistry::default()),
            Duration::days(7),
        )
    }

    fn request(batch: i64) -> ScrapeRequest {
        ScrapeRequest::for_batch(batch)
    }

    fn forced(batch: i64) -> ScrapeRequest {
        ScrapeRequest {
            force_refresh: true,
            ..ScrapeRequest::for_batch(batch)
        }
    }

    #[tokio::test]
    async fn test_fresh_then_cached_identical() {
        let provider = Arc::new(ScriptedProvider::always(Ok(products_payload(&[
            "Knipex Pliers",
        ]))));
        let dispatcher = dispatcher(provider.clone());

        let fresh = dispatcher.handle(request(1)).await.unwrap();
        let ScrapeResponse::Fresh(fresh) = fresh else {
            panic!("expected fresh response");
        };
        assert!(!fresh.cached);
        assert_eq!(fresh.total_found, 3);
        assert_eq!(fresh.categories_scraped, 3);
        assert_eq!(provider.call_count(), 3);

        let cached = dispatcher.handle(request(1)).await.unwrap();
        let ScrapeResponse::Cached(cached) = cached else {
            panic!("expected cached response");
        };
        assert!(cached.cached);
        assert_eq!(cached.tools, fresh.tools);
        assert_eq!(provider.call_count(), 3);
    }

    #[tokio::test]
    async fn test_force_refresh_bypasses_cache() {
        let provider = Arc::new(ScriptedProvider::always(Ok(products_payload(&["A"]))));
        let dispatcher = dispatcher(provider.clone());

        dispatcher.handle(request(2)).await.unwrap();
        let response = dispatcher.handle(forced(2)).await.unwrap();

        assert!(matches!(response, ScrapeResponse::Fresh(_)));
        assert_eq!(provider.call_count(), 6);
    }

    #[tokio::test]
    async fn test_total_failure_is_soft_and_keeps_cache() {
        let provider = Arc::new(ScriptedProvider::new(
            vec![
                Ok(products_payload(&["A"])),
                Ok(products_payload(&["B"])),
                Ok(products_payload(&["C"])),
            ],
            Ok(json!({ "products": [] })),
        ));
        let dispatcher = dispatcher(provider);

        let first = dispatcher.handle(request(1)).await.unwrap();
        assert!(first.success());

        let response = dispatcher.handle(forced(1)).await.unwrap();
        let ScrapeResponse::SoftFailure(soft) = response else {
            panic!("expected soft failure");
        };
        assert!(!soft.success);
        assert_eq!(soft.total_found, 0);
        assert_eq!(soft.category_stats.len(), 3);

        let CacheLookup::Hit(record) = dispatcher.cache().lookup_batch(BatchNumber::new(1)).await
        else {
            panic!("previous cache entry should survive");
        };
        assert_eq!(record.total_products, 3);
    }

    #[tokio::test]
    async fn test_invalid_batch() {
        let provider = Arc::new(ScriptedProvider::always(Ok(products_payload(&["A"]))));
        let dispatcher = dispatcher(provider.clone());

        for n in [0, 4, -1] {
            let err = dispatcher.handle(request(n)).await.unwrap_err();
            assert!(matches!(err, DispatchError::InvalidBatch(ref b) if *b == n.to_string()));
            assert_eq!(err.status_code(), 400);
        }
        assert_eq!(provider.call_count(), 0);
    }

    #[tokio::test]
    async fn test_malformed_batch_is_invalid() {
        let provider = Arc::new(ScriptedProvider::always(Ok(products_payload(&["A"]))));
        let dispatcher = dispatcher(provider.clone());

        let err = dispatcher
            .handle(ScrapeRequest::from_body(br#"{"batch": "two"}"#))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Invalid batch number: \"two\"");
        assert_eq!(err.status_code(), 400);
        assert_eq!(provider.call_count(), 0);
    }

    #[tokio::test]
    async fn test_bad_flag_still_serves_requested_batch() {
        let provider = Arc::new(ScriptedProvider::always(Ok(products_payload(&["A"]))));
        let dispatcher = dispatcher(provider);

        let response = dispatcher
            .handle(ScrapeRequest::from_body(br#"{"batch": 3, "forceRefresh": 1}"#))
            .await
            .unwrap();
        let ScrapeResponse::Fresh(fresh) = response else {
            panic!("expected fresh response");
        };
        assert_eq!(fresh.batch, 3);

        let response = dispatcher
            .handle(ScrapeRequest::from_body(br#"{"mergeAll": "true", "batch": 3}"#))
            .await
            .unwrap();
        assert!(matches!(response, ScrapeResponse::Cached(ref c) if c.batch == 3));
    }

    #[tokio::test]
    async fn test_missing_api_key_is_configuration_error() {
        let dispatcher = dispatcher(Arc::new(ScriptedProvider::unconfigured()));
        let err = dispatcher.handle(request(1)).await.unwrap_err();
        assert!(matches!(err, DispatchError::Configuration(_)));
        assert_eq!(err.status_code(), 500);
    }

    #[tokio::test]
    async fn test_cache_hit_without_api_key() {
        let dispatcher = dispatcher(Arc::new(ScriptedProvider::unconfigured()));
        dispatcher
            .cache()
            .replace_batch(BatchNumber::new(3), Vec::new())
            .await
            .unwrap();

        let response = dispatcher.handle(request(3)).await.unwrap();
        assert!(matches!(response, ScrapeResponse::Cached(_)));
    }

    #[tokio::test]
    async fn test_merge_partial() {
        let provider = Arc::new(ScriptedProvider::always(Ok(products_payload(&["A"]))));
        let dispatcher = dispatcher(provider);

        dispatcher.handle(request(1)).await.unwrap();
        dispatcher.handle(request(2)).await.unwrap();

        let response = dispatcher
            .handle(ScrapeRequest {
                merge_all: true,
                ..Default::default()
            })
            .await
            .unwrap();
        let ScrapeResponse::Merge(merged) = response else {
            panic!("expected merge response");
        };
        assert!(merged.success);
        assert_eq!(merged.batches_found, 2);
        assert!(!merged.all_batches_complete);
        assert_eq!(merged.total_found, 6);
        assert_eq!(merged.mode, "merge");
    }

    #[tokio::test]
    async fn test_merge_empty_cache() {
        let dispatcher = dispatcher(Arc::new(ScriptedProvider::unconfigured()));
        let response = dispatcher
            .handle(ScrapeRequest {
                merge_all: true,
                ..ScrapeRequest::for_batch(99)
            })
            .await
            .unwrap();

        assert!(!response.success());
        assert!(response.tools().is_empty());
    }

    #[tokio::test]
    async fn test_lookup_error_scrapes_like_a_miss() {
        let provider = Arc::new(ScriptedProvider::always(Ok(products_payload(&["A"]))));
        let dispatcher = dispatcher_with(unavailable_cache(), provider.clone());

        let response = dispatcher.handle(request(1)).await.unwrap();
        assert!(matches!(response, ScrapeResponse::Fresh(_)));
        assert_eq!(provider.call_count(), 3);
    }

    #[tokio::test]
    async fn test_cache_write_failure_still_returns_fresh_tools() {
        let provider = Arc::new(ScriptedProvider::always(Ok(products_payload(&[
            "Knipex Pliers",
            "Wera Kraftform",
        ]))));
        let dispatcher = dispatcher_with(unavailable_cache(), provider);

        let response = dispatcher.handle(request(2)).await.unwrap();
        let ScrapeResponse::Fresh(fresh) = response else {
            panic!("expected fresh response");
        };
        assert!(fresh.success);
        assert!(!fresh.cached);
        assert_eq!(fresh.total_found, 6);
        assert_eq!(fresh.tools.len(), 6);
        assert_eq!(fresh.batch, 2);
    }
}
