//! Local mind worker: the computation side of the UI/worker protocol.
//!
//! Acquires the model files (cache first, network otherwise), boots the
//! engine, restores the persisted index and then serves document additions
//! and searches one at a time.
mod adapter;
mod assets;
mod cache;
mod config;
mod dispatch;
mod error;
mod fetch;
mod intake;
mod persist;
mod pipeline;
mod progress;
mod snapshot;
mod types;
mod worker;
mod write_behind;

pub use adapter::{Engine, EngineAdapter, EngineFault};
pub use assets::{cache_key, seeded_progress, AssetLoader};
pub use cache::{CacheError, DurableCache, FsCache, MemoryCache};
pub use config::{AssetSpec, ModelAssets, SearchSettings, WorkerConfig, DEFAULT_SNAPSHOT_KEY};
pub use dispatch::{ChannelEventSink, Dispatcher, EventSink, WorkerServices};
pub use error::WorkerError;
pub use fetch::{FetchSettings, Fetcher, NullProgress, ProgressSink, ReqwestFetcher};
pub use intake::{CancellationSet, Intake};
pub use persist::{ensure_dir, AtomicFileWriter, PersistError};
pub use pipeline::{IngestOutcome, IngestionPipeline};
pub use progress::{AssetProgress, ProgressAggregator, ProgressState};
pub use snapshot::SnapshotStore;
pub use types::{
    FailureKind, FetchError, FetchMetadata, FetchOutput, ModelBundle, SearchResult, WorkerCommand,
    WorkerEvent,
};
pub use worker::WorkerHandle;
pub use write_behind::WriteBehind;
