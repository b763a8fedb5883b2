//! The only code that talks to the embedding/search engine.

use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};

use thiserror::Error;

use crate::{SearchResult, WorkerError};

/// Opaque failure reported by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct EngineFault(pub String);

impl EngineFault {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

impl From<String> for EngineFault {
    fn from(message: String) -> Self {
        Self(message)
    }
}

impl From<&str> for EngineFault {
    fn from(message: &str) -> Self {
        Self(message.to_string())
    }
}

/// Embedding, indexing and similarity search, consumed as a black box.
///
/// Implementations are not required to be reentrant or thread-safe; the
/// worker owns exactly one instance and calls it from one task at a time.
pub trait Engine {
    fn load_model(&mut self, weights: &[u8], tokenizer: &[u8], config: &[u8])
        -> Result<(), EngineFault>;

    /// Indexes `text` under `id` and returns the total chunk count afterwards.
    /// `on_progress(current, total)` is called as chunks are embedded.
    fn add_document(
        &mut self,
        id: &str,
        text: &str,
        on_progress: &mut dyn FnMut(usize, usize),
    ) -> Result<usize, EngineFault>;

    fn search(
        &self,
        query: &str,
        k: usize,
        threshold: f32,
        allowed_ids: Option<&[String]>,
    ) -> Result<Vec<SearchResult>, EngineFault>;

    fn export_database(&self) -> Result<Vec<u8>, EngineFault>;

    fn import_database(&mut self, blob: &[u8]) -> Result<(), EngineFault>;

    fn document_ids(&self) -> Vec<String>;
}

/// Owns the engine and enforces "model first".
pub struct EngineAdapter<E> {
    engine: E,
    model_loaded: bool,
}

impl<E: Engine> EngineAdapter<E> {
    pub fn new(engine: E) -> Self {
        Self {
            engine,
            model_loaded: false,
        }
    }

    pub fn is_ready(&self) -> bool {
        self.model_loaded
    }

    pub fn into_engine(self) -> E {
        self.engine
    }

    pub fn load_model(
        &mut self,
        weights: &[u8],
        tokenizer: &[u8],
        config: &[u8],
    ) -> Result<(), WorkerError> {
        if self.model_loaded {
            return Err(WorkerError::AlreadyInitialized);
        }
        let engine = &mut self.engine;
        guarded(|| engine.load_model(weights, tokenizer, config))?;
        self.model_loaded = true;
        Ok(())
    }

    pub fn add_document(
        &mut self,
        id: &str,
        text: &str,
        on_progress: &mut dyn FnMut(usize, usize),
    ) -> Result<usize, WorkerError> {
        self.require_model("add_document")?;
        let engine = &mut self.engine;
        Ok(guarded(|| engine.add_document(id, text, on_progress))?)
    }

    pub fn search(
        &self,
        query: &str,
        k: usize,
        threshold: f32,
        allowed_ids: Option<&[String]>,
    ) -> Result<Vec<SearchResult>, WorkerError> {
        self.require_model("search")?;
        Ok(guarded(|| self.engine.search(query, k, threshold, allowed_ids))?)
    }

    pub fn export_database(&self) -> Result<Vec<u8>, WorkerError> {
        Ok(guarded(|| self.engine.export_database())?)
    }

    pub fn import_database(&mut self, blob: &[u8]) -> Result<(), WorkerError> {
        self.require_model("import_database")?;
        let engine = &mut self.engine;
        Ok(guarded(|| engine.import_database(blob))?)
    }

    pub fn document_ids(&self) -> Vec<String> {
        guarded(|| Ok(self.engine.document_ids())).unwrap_or_default()
    }

    fn require_model(&self, operation: &'static str) -> Result<(), WorkerError> {
        if self.model_loaded {
            Ok(())
        } else {
            Err(WorkerError::NotInitialized { operation })
        }
    }
}

/// Runs an engine call, turning a panic into an [`EngineFault`].
fn guarded<T>(call: impl FnOnce() -> Result<T, EngineFault>) -> Result<T, EngineFault> {
    match catch_unwind(AssertUnwindSafe(call)) {
        Ok(result) => result,
        Err(payload) => Err(EngineFault(format!(
            "engine panicked: {}",
            panic_message(payload.as_ref())
        ))),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
