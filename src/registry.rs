//! Batch registry: which categories and search URLs make up each batch.
//!
//! The registry is an immutable value handed to the orchestrator at
//! construction. The built-in default can be replaced from the config file.

use serde::{Deserialize, Serialize};

use crate::models::BatchNumber;

/// Errors raised when building a registry.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Registry has no batches")]
    Empty,
    #[error("Batch number must be positive")]
    ZeroBatch,
    #[error("Batch {0} is defined more than once")]
    DuplicateBatch(BatchNumber),
    #[error("Batch {0} has no categories")]
    EmptyBatch(BatchNumber),
    #[error("Category '{category}' in batch {batch} has no URLs")]
    EmptyCategory {
        batch: BatchNumber,
        category: String,
    },
}

/// A named category and the search pages scraped for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryTarget {
    pub name: String,
    pub urls: Vec<String>,
}

impl CategoryTarget {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            urls: vec![url.into()],
        }
    }
}

/// One batch: a set of categories scraped and cached together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchDefinition {
    pub number: BatchNumber,
    pub categories: Vec<CategoryTarget>,
}

impl BatchDefinition {
    /// Every (url, category) pair in registry order.
    pub fn targets(&self) -> impl Iterator<Item = (&str, &str)> {
        self.categories.iter().flat_map(|c| {
            c.urls
                .iter()
                .map(move |url| (url.as_str(), c.name.as_str()))
        })
    }

    pub fn category_names(&self) -> impl Iterator<Item = &str> {
        self.categories.iter().map(|c| c.name.as_str())
    }
}

/// All batches, kept sorted by batch number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchRegistry {
    batches: Vec<BatchDefinition>,
}

impl BatchRegistry {
    /// Build and validate a registry.
    pub fn new(mut batches: Vec<BatchDefinition>) -> Result<Self, RegistryError> {
        if batches.is_empty() {
            return Err(RegistryError::Empty);
        }
        batches.sort_by_key(|b| b.number);

        for (i, batch) in batches.iter().enumerate() {
            if batch.number.get() == 0 {
                return Err(RegistryError::ZeroBatch);
            }
            if i > 0 && batches[i - 1].number == batch.number {
                return Err(RegistryError::DuplicateBatch(batch.number));
            }
            if batch.categories.is_empty() {
                return Err(RegistryError::EmptyBatch(batch.number));
            }
            if let Some(c) = batch.categories.iter().find(|c| c.urls.is_empty()) {
                return Err(RegistryError::EmptyCategory {
                    batch: batch.number,
                    category: c.name.clone(),
                });
            }
        }

        Ok(Self { batches })
    }

    pub fn get(&self, batch: BatchNumber) -> Option<&BatchDefinition> {
        self.batches.iter().find(|b| b.number == batch)
    }

    pub fn contains(&self, batch: BatchNumber) -> bool {
        self.get(batch).is_some()
    }

    /// Batch numbers in ascending order.
    pub fn batch_numbers(&self) -> impl Iterator<Item = BatchNumber> + '_ {
        self.batches.iter().map(|b| b.number)
    }

    pub fn batches(&self) -> &[BatchDefinition] {
        &self.batches
    }

    pub fn len(&self) -> usize {
        self.batches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.batches.is_empty()
    }
}

impl Default for BatchRegistry {
    fn default() -> Self {
        let batch = |n: u32, categories: [(&str, &str); 3]| BatchDefinition {
            number: BatchNumber::new(n),
            categories: categories
                .into_iter()
                .map(|(name, url)| CategoryTarget::new(name, url))
                .collect(),
        };

        Self {
            batches: vec![
                batch(
                    1,
                    [
                        (
                            "Hand Tools",
                            "https://www.screwfix.com/search?search=electrician+hand+tools",
                        ),
                        (
                            "Power Tools",
                            "https://www.screwfix.com/search?search=cordless+power+tools",
                        ),
                        (
                            "Test Equipment",
                            "https://www.screwfix.com/search?search=electrical+test+equipment",
                        ),
                    ],
                ),
                batch(
                    2,
                    [
                        (
                            "PPE & Safety",
                            "https://www.screwfix.com/search?search=electrical+safety+ppe",
                        ),
                        (
                            "Tool Storage",
                            "https://www.screwfix.com/search?search=tool+storage",
                        ),
                        (
                            "Cable Tools",
                            "https://www.screwfix.com/search?search=cable+strippers+crimpers",
                        ),
                    ],
                ),
                batch(
                    3,
                    [
                        (
                            "Access Equipment",
                            "https://www.screwfix.com/search?search=ladders+step+ladders",
                        ),
                        (
                            "Fixings & Consumables",
                            "https://www.screwfix.com/search?search=electrical+fixings",
                        ),
                        (
                            "Lighting & Torches",
                            "https://www.screwfix.com/search?search=work+lights+torches",
                        ),
                    ],
                ),
            ],
        }
    }
}
