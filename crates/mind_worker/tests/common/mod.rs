#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::io;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, Once};

use mind_worker::{
    AssetSpec, CacheError, DurableCache, Engine, EngineFault, EventSink, FailureKind, FetchError,
    FetchMetadata, FetchOutput, Fetcher, ModelAssets, ProgressSink, SearchResult, WorkerConfig,
    WorkerEvent,
};

pub fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(mind_logging::initialize_for_tests);
}

pub const WEIGHTS_URL: &str = "https://models.test/mini/resolve/main/model.safetensors";
pub const TOKENIZER_URL: &str = "https://models.test/mini/resolve/main/tokenizer.json";
pub const CONFIG_URL: &str = "https://models.test/mini/resolve/main/config.json";

pub fn test_config() -> WorkerConfig {
    WorkerConfig {
        model: ModelAssets {
            weights: AssetSpec::new(WEIGHTS_URL, 4096),
            tokenizer: AssetSpec::new(TOKENIZER_URL, 256),
            config: AssetSpec::new(CONFIG_URL, 16),
        },
        ..WorkerConfig::default()
    }
}

#[derive(Default)]
pub struct RecordingSink {
    events: Mutex<Vec<WorkerEvent>>,
}

impl RecordingSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn take(&self) -> Vec<WorkerEvent> {
        self.events.lock().unwrap().drain(..).collect()
    }
}

impl EventSink for RecordingSink {
    fn emit(&self, event: WorkerEvent) {
        self.events.lock().unwrap().push(event);
    }
}

#[derive(Default)]
pub struct RecordingProgress {
    pub reports: Mutex<Vec<(u64, u64)>>,
}

impl ProgressSink for RecordingProgress {
    fn report(&self, loaded: u64, total: u64) {
        self.reports.lock().unwrap().push((loaded, total));
    }
}

/// In-memory "network" that counts requests.
pub struct StaticFetcher {
    bodies: HashMap<String, Vec<u8>>,
    pub requests: AtomicUsize,
}

impl StaticFetcher {
    pub fn new() -> Self {
        Self {
            bodies: HashMap::new(),
            requests: AtomicUsize::new(0),
        }
    }

    pub fn model() -> Arc<Self> {
        Arc::new(
            Self::new()
                .with(WEIGHTS_URL, vec![7u8; 4096])
                .with(TOKENIZER_URL, b"{\"tokenizer\":true}".to_vec())
                .with(CONFIG_URL, b"{\"dim\":384}".to_vec()),
        )
    }

    pub fn with(mut self, url: &str, body: Vec<u8>) -> Self {
        self.bodies.insert(url.to_string(), body);
        self
    }

    pub fn request_count(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl Fetcher for StaticFetcher {
    async fn fetch(&self, url: &str, sink: &dyn ProgressSink) -> Result<FetchOutput, FetchError> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        let body = self.bodies.get(url).ok_or(FetchError {
            kind: FailureKind::HttpStatus(404),
            message: "404 Not Found".to_string(),
        })?;
        let total = body.len() as u64;
        let half = total / 2;
        sink.report(half, total);
        sink.report(total, total);
        Ok(FetchOutput {
            bytes: bytes::Bytes::from(body.clone()),
            metadata: FetchMetadata {
                original_url: url.to_string(),
                final_url: url.to_string(),
                redirect_count: 0,
                declared_len: total,
                byte_len: total,
            },
        })
    }
}

/// Cache whose storage is unavailable.
pub struct BrokenCache;

impl DurableCache for BrokenCache {
    fn get(&self, _key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        Err(CacheError::Io(io::Error::new(io::ErrorKind::Other, "storage unavailable")))
    }

    fn put(&self, _key: &str, _value: &[u8]) -> Result<(), CacheError> {
        Err(CacheError::Io(io::Error::new(io::ErrorKind::Other, "quota exceeded")))
    }
}

/// Shared view into a [`MockEngine`] that survives moving the engine to the
/// worker thread.
#[derive(Clone, Default)]
pub struct EngineProbe {
    pub calls: Arc<Mutex<Vec<String>>>,
    pub loads: Arc<AtomicUsize>,
    in_add: Arc<AtomicBool>,
}

impl EngineProbe {
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn adds_started_for(&self, id: &str) -> usize {
        let marker = format!("start {id}");
        self.calls().iter().filter(|c| **c == marker).count()
    }
}

type AddHook = Box<dyn FnMut(&str) + Send>;

#[derive(serde::Serialize, serde::Deserialize, Clone, Debug, PartialEq)]
struct StoredDoc {
    id: String,
    chunks: usize,
    content: String,
}

/// Engine stand-in: one chunk per paragraph, substring search, JSON dumps.
#[derive(Default)]
pub struct MockEngine {
    docs: Vec<StoredDoc>,
    pub probe: EngineProbe,
    failing: HashSet<String>,
    ignore_allow_list: bool,
    on_add: Option<AddHook>,
}

impl MockEngine {
    pub fn new(probe: EngineProbe) -> Self {
        Self {
            probe,
            ..Self::default()
        }
    }

    pub fn failing_on(mut self, id: &str) -> Self {
        self.failing.insert(id.to_string());
        self
    }

    pub fn ignoring_allow_list(mut self) -> Self {
        self.ignore_allow_list = true;
        self
    }

    pub fn on_add(mut self, hook: impl FnMut(&str) + Send + 'static) -> Self {
        self.on_add = Some(Box::new(hook));
        self
    }

    pub fn chunk_count(&self) -> usize {
        self.docs.iter().map(|d| d.chunks).sum()
    }
}

impl Engine for MockEngine {
    fn load_model(
        &mut self,
        weights: &[u8],
        _tokenizer: &[u8],
        config: &[u8],
    ) -> Result<(), EngineFault> {
        self.probe.loads.fetch_add(1, Ordering::SeqCst);
        if weights.is_empty() || config.is_empty() {
            return Err(EngineFault::new("missing model bytes"));
        }
        Ok(())
    }

    fn add_document(
        &mut self,
        id: &str,
        text: &str,
        on_progress: &mut dyn FnMut(usize, usize),
    ) -> Result<usize, EngineFault> {
        assert!(
            !self.probe.in_add.swap(true, Ordering::SeqCst),
            "add_document re-entered"
        );
        self.probe.calls.lock().unwrap().push(format!("start {id}"));

        let paragraphs: Vec<&str> = text.split("\n\n").filter(|p| !p.trim().is_empty()).collect();
        let chunks = paragraphs.len().max(1);
        for current in 1..=chunks {
            on_progress(current, chunks);
        }
        if let Some(hook) = self.on_add.as_mut() {
            hook(id);
        }

        let result = if self.failing.contains(id) {
            Err(EngineFault::new(format!("cannot embed {id}")))
        } else {
            self.docs.push(StoredDoc {
                id: id.to_string(),
                chunks,
                content: text.to_string(),
            });
            Ok(self.chunk_count())
        };

        self.probe.calls.lock().unwrap().push(format!("end {id}"));
        self.probe.in_add.store(false, Ordering::SeqCst);
        result
    }

    fn search(
        &self,
        query: &str,
        k: usize,
        _threshold: f32,
        allowed_ids: Option<&[String]>,
    ) -> Result<Vec<SearchResult>, EngineFault> {
        let needle = query.to_lowercase();
        Ok(self
            .docs
            .iter()
            .filter(|doc| doc.content.to_lowercase().contains(&needle))
            .filter(|doc| {
                self.ignore_allow_list
                    || allowed_ids.map_or(true, |allowed| allowed.contains(&doc.id))
            })
            .take(k)
            .map(|doc| SearchResult {
                doc_id: doc.id.clone(),
                content: doc.content.clone(),
                sender: None,
                date: None,
                score: 1.0,
            })
            .collect())
    }

    fn export_database(&self) -> Result<Vec<u8>, EngineFault> {
        serde_json::to_vec(&self.docs).map_err(|e| EngineFault::new(e.to_string()))
    }

    fn import_database(&mut self, blob: &[u8]) -> Result<(), EngineFault> {
        self.docs = serde_json::from_slice(blob).map_err(|e| EngineFault::new(e.to_string()))?;
        Ok(())
    }

    fn document_ids(&self) -> Vec<String> {
        self.docs.iter().map(|d| d.id.clone()).collect()
    }
}

pub fn add(id: &str, content: &str) -> mind_worker::WorkerCommand {
    mind_worker::WorkerCommand::AddDocument {
        id: id.to_string(),
        content: content.to_string(),
    }
}

pub fn cancel(id: &str) -> mind_worker::WorkerCommand {
    mind_worker::WorkerCommand::CancelDocument { id: id.to_string() }
}

pub fn added_ids(events: &[WorkerEvent]) -> Vec<String> {
    events
        .iter()
        .filter_map(|e| match e {
            WorkerEvent::DocumentAdded { id, .. } => Some(id.clone()),
            _ => None,
        })
        .collect()
}

pub fn errors(events: &[WorkerEvent]) -> Vec<(String, Option<String>)> {
    events
        .iter()
        .filter_map(|e| match e {
            WorkerEvent::Error { message, document } => Some((message.clone(), document.clone())),
            _ => None,
        })
        .collect()
}
