use crate::SearchHit;

#[derive(Debug, Clone, PartialEq)]
pub enum Msg {
    /// User asked to start the worker (model download and index restore).
    InitRequested,
    /// User picked a file for indexing.
    FileSubmitted { filename: String, content: String },
    /// User removed an upload row.
    UploadCancelled { filename: String },
    /// User edited the search box.
    QueryChanged(String),
    /// User submitted the current query.
    SearchSubmitted,
    /// User toggled a document in the search filter.
    DocumentFilterToggled(String),
    /// User cleared the search filter.
    FilterCleared,
    /// Worker finished initialization.
    WorkerReady,
    /// Worker initialization progress.
    InitProgress { percent: f64, status: String },
    /// Worker chunk progress for one document. `at_ms` is the UI clock when
    /// the event was received.
    IndexProgress {
        filename: String,
        current: usize,
        total: usize,
        percent: f64,
        at_ms: u64,
    },
    /// Worker confirmed a document; `count` is the engine's chunk total.
    DocumentAdded { id: String, count: usize },
    /// Worker restored these documents from the snapshot.
    RestoredDocs(Vec<String>),
    /// Worker answered a search.
    SearchResults(Vec<SearchHit>),
    /// Worker reported a fault, optionally attributed to one document.
    WorkerError {
        message: String,
        document: Option<String>,
    },
    /// Render tick.
    Tick,
    NoOp,
}
