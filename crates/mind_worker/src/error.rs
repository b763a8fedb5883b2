use thiserror::Error;

use crate::adapter::EngineFault;
use crate::FetchError;

/// Faults the worker turns into `ERROR` events.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorkerError {
    #[error("engine not initialized: {operation} requires a loaded model")]
    NotInitialized { operation: &'static str },
    #[error("model already loaded")]
    AlreadyInitialized,
    #[error("engine fault: {0}")]
    Engine(#[from] EngineFault),
    #[error("asset fetch failed: {0}")]
    Fetch(#[from] FetchError),
}
