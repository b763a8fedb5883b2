use serde::{Deserialize, Serialize};

use crate::fetch::FetchSettings;

const MODEL_BASE: &str =
    "https://huggingface.co/sentence-transformers/all-MiniLM-L6-v2/resolve/main";

/// Cache key under which the index snapshot is stored.
pub const DEFAULT_SNAPSHOT_KEY: &str = "vector_db_snapshot";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerConfig {
    pub model: ModelAssets,
    pub search: SearchSettings,
    pub snapshot_key: String,
    #[serde(skip)]
    pub fetch: FetchSettings,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            model: ModelAssets::default(),
            search: SearchSettings::default(),
            snapshot_key: DEFAULT_SNAPSHOT_KEY.to_string(),
            fetch: FetchSettings::default(),
        }
    }
}

/// The three downloads `load_model` needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelAssets {
    pub weights: AssetSpec,
    pub tokenizer: AssetSpec,
    pub config: AssetSpec,
}

impl ModelAssets {
    pub fn iter(&self) -> impl Iterator<Item = &AssetSpec> {
        [&self.weights, &self.tokenizer, &self.config].into_iter()
    }
}

impl Default for ModelAssets {
    fn default() -> Self {
        Self {
            weights: AssetSpec::new(format!("{MODEL_BASE}/model.safetensors"), 90_868_376),
            tokenizer: AssetSpec::new(format!("{MODEL_BASE}/tokenizer.json"), 466_247),
            config: AssetSpec::new(format!("{MODEL_BASE}/config.json"), 612),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetSpec {
    pub url: String,
    /// Size used for overall progress until the response declares its own.
    #[serde(default)]
    pub estimated_bytes: u64,
}

impl AssetSpec {
    pub fn new(url: impl Into<String>, estimated_bytes: u64) -> Self {
        Self {
            url: url.into(),
            estimated_bytes,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    pub top_k: usize,
    pub threshold: f32,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            top_k: 5,
            threshold: 0.5,
        }
    }
}
