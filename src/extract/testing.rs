//! Scripted extraction provider for unit tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::{json, Value};

use super::{ExtractError, ExtractionProvider, ExtractionRequest};

/// Replays scripted results in order, then repeats the fallback forever.
pub(crate) struct ScriptedProvider {
    script: Mutex<VecDeque<Result<Value, String>>>,
    fallback: Result<Value, String>,
    ready: bool,
    pub calls: AtomicU32,
}

impl ScriptedProvider {
    pub(crate) fn new(script: Vec<Result<Value, String>>, fallback: Result<Value, String>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            fallback,
            ready: true,
            calls: AtomicU32::new(0),
        }
    }

    pub(crate) fn always(result: Result<Value, String>) -> Self {
        Self::new(Vec::new(), result)
    }

    /// A provider whose credentials are missing.
    pub(crate) fn unconfigured() -> Self {
        Self {
            ready: false,
            ..Self::always(Ok(Value::Null))
        }
    }

    pub(crate) fn call_count(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ExtractionProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    fn check_ready(&self) -> Result<(), ExtractError> {
        if self.ready {
            Ok(())
        } else {
            Err(ExtractError::MissingApiKey)
        }
    }

    async fn extract(&self, _request: &ExtractionRequest) -> Result<Value, ExtractError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let next = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone());
        next.map_err(ExtractError::Api)
    }
}

/// Extraction payload with one product per name; every item claims a bogus supplier.
pub(crate) fn products_payload(names: &[&str]) -> Value {
    json!({
        "products": names
            .iter()
            .map(|n| json!({ "name": n, "price": "£9.99", "supplier": "Made Up Ltd" }))
            .collect::<Vec<_>>()
    })
}
