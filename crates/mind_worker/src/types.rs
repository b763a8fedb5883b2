use std::fmt;

use serde::{Deserialize, Serialize};

/// Requests the UI thread sends to the worker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkerCommand {
    Init,
    AddDocument {
        id: String,
        content: String,
    },
    CancelDocument {
        id: String,
    },
    Search {
        query: String,
        #[serde(rename = "allowedIds", default, skip_serializing_if = "Option::is_none")]
        allowed_ids: Option<Vec<String>>,
    },
}

/// Events the worker sends back to the UI thread.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkerEvent {
    Ready,
    InitProgress {
        percent: f64,
        status: String,
    },
    IndexProgress {
        filename: String,
        current: usize,
        total: usize,
        percent: f64,
    },
    DocumentAdded {
        count: usize,
        id: String,
    },
    RestoredDocs {
        ids: Vec<String>,
    },
    SearchResults {
        results: Vec<SearchResult>,
    },
    Error {
        message: String,
        /// Set when the fault belongs to one document's ingestion.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        document: Option<String>,
    },
}

impl WorkerEvent {
    pub(crate) fn error(message: impl Into<String>) -> Self {
        WorkerEvent::Error {
            message: message.into(),
            document: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub doc_id: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    pub score: f32,
}

/// Raw bytes of the three model files, ready for `load_model`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelBundle {
    pub weights: bytes::Bytes,
    pub tokenizer: bytes::Bytes,
    pub config: bytes::Bytes,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchOutput {
    pub bytes: bytes::Bytes,
    pub metadata: FetchMetadata,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchMetadata {
    pub original_url: String,
    pub final_url: String,
    pub redirect_count: usize,
    /// Declared `Content-Length`, 0 when the server did not send one.
    pub declared_len: u64,
    pub byte_len: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct FetchError {
    pub kind: FailureKind,
    pub message: String,
}

impl FetchError {
    pub(crate) fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    InvalidUrl,
    HttpStatus(u16),
    Timeout,
    RedirectLimitExceeded,
    TooLarge { max_bytes: u64, actual: Option<u64> },
    Network,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::InvalidUrl => write!(f, "invalid url"),
            FailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::RedirectLimitExceeded => write!(f, "redirect limit exceeded"),
            FailureKind::TooLarge { max_bytes, actual } => {
                write!(f, "response too large (max {max_bytes}, actual {actual:?})")
            }
            FailureKind::Network => write!(f, "network error"),
        }
    }
}
