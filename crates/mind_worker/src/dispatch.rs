use std::sync::{mpsc as std_mpsc, Arc};

use mind_logging::{mind_debug, mind_info, mind_warn};
use tokio::sync::mpsc;

use crate::adapter::{Engine, EngineAdapter};
use crate::assets::{seeded_progress, AssetLoader};
use crate::cache::DurableCache;
use crate::config::WorkerConfig;
use crate::fetch::{Fetcher, ReqwestFetcher};
use crate::intake::Intake;
use crate::pipeline::{IngestOutcome, IngestionPipeline};
use crate::progress::ProgressAggregator;
use crate::snapshot::SnapshotStore;
use crate::write_behind::WriteBehind;
use crate::{WorkerCommand, WorkerError, WorkerEvent};

/// Destination for worker events.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: WorkerEvent);
}

pub struct ChannelEventSink {
    tx: std_mpsc::Sender<WorkerEvent>,
}

impl ChannelEventSink {
    pub fn new(tx: std_mpsc::Sender<WorkerEvent>) -> Self {
        Self { tx }
    }
}

impl EventSink for ChannelEventSink {
    fn emit(&self, event: WorkerEvent) {
        let _ = self.tx.send(event);
    }
}

/// Everything the worker needs besides the engine.
pub struct WorkerServices {
    pub config: WorkerConfig,
    pub cache: Arc<dyn DurableCache>,
    pub fetcher: Arc<dyn Fetcher>,
}

impl WorkerServices {
    /// Network fetches go through reqwest with `config.fetch`.
    pub fn new(config: WorkerConfig, cache: Arc<dyn DurableCache>) -> Self {
        let fetcher = Arc::new(ReqwestFetcher::new(config.fetch.clone()));
        Self {
            config,
            cache,
            fetcher,
        }
    }

    pub fn with_fetcher(mut self, fetcher: Arc<dyn Fetcher>) -> Self {
        self.fetcher = fetcher;
        self
    }
}

/// The worker-side message loop. Owns the engine; handles one command at a
/// time in arrival order.
pub struct Dispatcher<E> {
    adapter: EngineAdapter<E>,
    intake: Intake,
    config: WorkerConfig,
    assets: AssetLoader,
    snapshots: SnapshotStore,
    writes: Arc<WriteBehind>,
    events: Arc<dyn EventSink>,
}

impl<E: Engine> Dispatcher<E> {
    pub fn new(
        engine: E,
        services: WorkerServices,
        inbox: mpsc::UnboundedReceiver<WorkerCommand>,
        events: Arc<dyn EventSink>,
    ) -> Self {
        let writes = Arc::new(WriteBehind::new(services.cache.clone()));
        let assets = AssetLoader::new(services.fetcher, services.cache.clone(), writes.clone());
        let snapshots = SnapshotStore::new(
            services.config.snapshot_key.clone(),
            services.cache,
            writes.clone(),
        );
        Self {
            adapter: EngineAdapter::new(engine),
            intake: Intake::new(inbox),
            config: services.config,
            assets,
            snapshots,
            writes,
            events,
        }
    }

    /// Runs until every sender is dropped and the queue is empty, then waits
    /// for outstanding cache writes. Returns the engine.
    pub async fn run(mut self) -> E {
        while let Some(command) = self.intake.next().await {
            self.dispatch(command).await;
        }
        mind_debug!("worker inbox closed, flushing cache writes");
        self.writes.flush().await;
        self.adapter.into_engine()
    }

    async fn dispatch(&mut self, command: WorkerCommand) {
        match command {
            WorkerCommand::Init => self.initialize().await,
            WorkerCommand::AddDocument { id, content } => self.add_document(&id, &content),
            WorkerCommand::Search { query, allowed_ids } => self.search(&query, allowed_ids),
            // Intake routes cancels into the cancellation set.
            WorkerCommand::CancelDocument { .. } => {}
        }
    }

    async fn initialize(&mut self) {
        if self.adapter.is_ready() {
            mind_debug!("INIT received while ready; not reloading");
            self.events.emit(WorkerEvent::Ready);
            return;
        }
        match self.boot().await {
            Ok(()) => self.events.emit(WorkerEvent::Ready),
            Err(err) => {
                mind_warn!("initialization failed: {}", err);
                self.events.emit(WorkerEvent::error(err.to_string()));
            }
        }
    }

    async fn boot(&mut self) -> Result<(), WorkerError> {
        let events = self.events.as_ref();
        let progress = ProgressAggregator::new(seeded_progress(&self.config.model)?, events);
        events.emit(WorkerEvent::InitProgress {
            percent: 0.0,
            status: "Downloading model files".to_string(),
        });

        let bundle = self
            .assets
            .load_model_assets(&self.config.model, &progress)
            .await?;

        self.status(progress.overall_percent(), "Loading model");
        self.adapter
            .load_model(&bundle.weights, &bundle.tokenizer, &bundle.config)?;
        mind_info!("model loaded");

        self.status(100.0, "Restoring index");
        self.restore_snapshot();
        self.status(100.0, "Ready");
        Ok(())
    }

    fn restore_snapshot(&mut self) {
        let Some(blob) = self.snapshots.load() else {
            return;
        };
        match self.adapter.import_database(&blob) {
            Ok(()) => {
                let ids = self.adapter.document_ids();
                mind_info!("restored {} documents from snapshot", ids.len());
                self.events.emit(WorkerEvent::RestoredDocs { ids });
            }
            Err(err) => mind_warn!("snapshot import failed, starting empty: {}", err),
        }
    }

    fn add_document(&mut self, id: &str, content: &str) {
        let outcome = IngestionPipeline::new(
            &mut self.adapter,
            &mut self.intake,
            &self.snapshots,
            self.events.as_ref(),
        )
        .ingest(id, content);
        mind_debug!("ingest {} -> {:?}", id, outcome);
        if let IngestOutcome::Failed(WorkerError::NotInitialized { .. }) = outcome {
            mind_warn!("ADD_DOCUMENT for {} arrived before INIT completed", id);
        }
    }

    fn search(&mut self, query: &str, allowed_ids: Option<Vec<String>>) {
        if !self.adapter.is_ready() {
            mind_debug!("SEARCH ignored: engine not initialized");
            return;
        }
        let allowed = allowed_ids.filter(|ids| !ids.is_empty());
        let settings = self.config.search;
        match self
            .adapter
            .search(query, settings.top_k, settings.threshold, allowed.as_deref())
        {
            Ok(mut results) => {
                if let Some(allowed) = &allowed {
                    results.retain(|result| allowed.contains(&result.doc_id));
                }
                self.events.emit(WorkerEvent::SearchResults { results });
            }
            Err(err) => {
                mind_warn!("search failed: {}", err);
                self.events.emit(WorkerEvent::error(err.to_string()));
            }
        }
    }

    fn status(&self, percent: f64, status: &str) {
        self.events.emit(WorkerEvent::InitProgress {
            percent,
            status: status.to_string(),
        });
    }
}
