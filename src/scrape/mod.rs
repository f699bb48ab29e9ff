//! Category scraping and batch orchestration.

mod executor;
mod orchestrator;
mod retry;

pub use executor::{CategoryOutcome, ScrapeExecutor};
pub use orchestrator::{BatchOrchestrator, BatchRun, OrchestratorError};
pub use retry::RetryPolicy;
