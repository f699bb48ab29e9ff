//! Fan out category scrapes for a batch and aggregate the results.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::future::join_all;
use tracing::info;

use super::{CategoryOutcome, ScrapeExecutor};
use crate::models::{BatchNumber, Product};
use crate::registry::BatchRegistry;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum OrchestratorError {
    #[error("Unknown batch {0}")]
    UnknownBatch(BatchNumber),
}

/// Aggregated result of one batch run.
#[derive(Debug, Clone)]
pub struct BatchRun {
    pub batch: BatchNumber,
    /// Products from every successful scrape, in registry order.
    pub products: Vec<Product>,
    /// Product count per category; 0 when every URL of the category failed.
    pub category_stats: BTreeMap<String, usize>,
    pub categories_scraped: usize,
    /// Outcomes that exhausted their retries.
    pub failures: Vec<CategoryOutcome>,
    pub elapsed: Duration,
}

impl BatchRun {
    pub fn total_products(&self) -> usize {
        self.products.len()
    }
}

/// Runs every category scrape of a batch concurrently.
#[derive(Clone)]
pub struct BatchOrchestrator {
    registry: Arc<BatchRegistry>,
    executor: ScrapeExecutor,
}

impl BatchOrchestrator {
    pub fn new(registry: Arc<BatchRegistry>, executor: ScrapeExecutor) -> Self {
        Self { registry, executor }
    }

    pub fn registry(&self) -> &Arc<BatchRegistry> {
        &self.registry
    }

    pub fn executor(&self) -> &ScrapeExecutor {
        &self.executor
    }

    /// Scrape all (url, category) pairs of `batch`.
    ///
    /// Individual failures never abort the batch; a run with zero products
    /// is still `Ok`.
    pub async fn run_batch(&self, batch: BatchNumber) -> Result<BatchRun, OrchestratorError> {
        let definition = self
            .registry
            .get(batch)
            .ok_or(OrchestratorError::UnknownBatch(batch))?;

        let started = Instant::now();
        let targets: Vec<(&str, &str)> = definition.targets().collect();
        info!(
            "Starting batch {}: {} categories, {} URLs",
            batch,
            definition.categories.len(),
            targets.len()
        );

        let outcomes = join_all(
            targets
                .iter()
                .map(|(url, category)| self.executor.scrape_category(url, category)),
        )
        .await;

        let mut category_stats: BTreeMap<String, usize> = definition
            .category_names()
            .map(|name| (name.to_string(), 0))
            .collect();
        let mut products = Vec::new();
        let mut failures = Vec::new();

        for outcome in outcomes {
            if outcome.success {
                *category_stats.entry(outcome.category.clone()).or_insert(0) +=
                    outcome.products.len();
                products.extend(outcome.products);
            } else {
                failures.push(outcome);
            }
        }

        let run = BatchRun {
            batch,
            products,
            categories_scraped: category_stats.len(),
            category_stats,
            failures,
            elapsed: started.elapsed(),
        };

        info!(
            "Batch {} finished: {} products, {} failed scrapes, {}ms",
            batch,
            run.total_products(),
            run.failures.len(),
            run.elapsed.as_millis()
        );

        Ok(run)
    }
}
