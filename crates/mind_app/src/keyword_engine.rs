//! Stand-in engine so the binary runs end to end without an embedding model.
//!
//! Documents are split into paragraph chunks and scored by the fraction of
//! query terms a chunk contains. The model files are only checked for
//! plausibility.

use std::collections::BTreeSet;

use mind_logging::mind_debug;
use mind_worker::{Engine, EngineFault, SearchResult};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredChunk {
    doc_id: String,
    text: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct Snapshot {
    chunks: Vec<StoredChunk>,
}

#[derive(Debug)]
struct Chunk {
    stored: StoredChunk,
    terms: BTreeSet<String>,
}

impl Chunk {
    fn new(doc_id: &str, text: &str) -> Self {
        Self {
            terms: terms(text),
            stored: StoredChunk {
                doc_id: doc_id.to_string(),
                text: text.to_string(),
            },
        }
    }
}

#[derive(Debug, Default)]
pub struct KeywordEngine {
    chunks: Vec<Chunk>,
}

impl KeywordEngine {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Engine for KeywordEngine {
    fn load_model(
        &mut self,
        weights: &[u8],
        tokenizer: &[u8],
        config: &[u8],
    ) -> Result<(), EngineFault> {
        if weights.is_empty() {
            return Err(EngineFault::new("model weights are empty"));
        }
        serde_json::from_slice::<serde_json::Value>(tokenizer)
            .map_err(|err| EngineFault::new(format!("tokenizer is not valid JSON: {err}")))?;
        serde_json::from_slice::<serde_json::Value>(config)
            .map_err(|err| EngineFault::new(format!("model config is not valid JSON: {err}")))?;
        mind_debug!("keyword engine accepted {} bytes of weights", weights.len());
        Ok(())
    }

    fn add_document(
        &mut self,
        id: &str,
        text: &str,
        on_progress: &mut dyn FnMut(usize, usize),
    ) -> Result<usize, EngineFault> {
        let paragraphs = paragraphs(text);
        self.chunks.retain(|chunk| chunk.stored.doc_id != id);
        let total = paragraphs.len();
        for (index, paragraph) in paragraphs.into_iter().enumerate() {
            self.chunks.push(Chunk::new(id, paragraph));
            on_progress(index + 1, total);
        }
        Ok(self.chunks.len())
    }

    fn search(
        &self,
        query: &str,
        k: usize,
        threshold: f32,
        allowed_ids: Option<&[String]>,
    ) -> Result<Vec<SearchResult>, EngineFault> {
        let wanted = terms(query);
        if wanted.is_empty() {
            return Ok(Vec::new());
        }

        let mut scored: Vec<(f32, &Chunk)> = self
            .chunks
            .iter()
            .filter(|chunk| {
                allowed_ids.map_or(true, |allowed| allowed.contains(&chunk.stored.doc_id))
            })
            .map(|chunk| {
                let hits = wanted.intersection(&chunk.terms).count();
                (hits as f32 / wanted.len() as f32, chunk)
            })
            .filter(|(score, _)| *score > 0.0 && *score >= threshold)
            .collect();
        scored.sort_by(|a, b| b.0.total_cmp(&a.0));
        scored.truncate(k);

        Ok(scored
            .into_iter()
            .map(|(score, chunk)| SearchResult {
                doc_id: chunk.stored.doc_id.clone(),
                content: chunk.stored.text.clone(),
                sender: None,
                date: None,
                score,
            })
            .collect())
    }

    fn export_database(&self) -> Result<Vec<u8>, EngineFault> {
        let snapshot = Snapshot {
            chunks: self.chunks.iter().map(|c| c.stored.clone()).collect(),
        };
        serde_json::to_vec(&snapshot).map_err(|err| EngineFault::new(err.to_string()))
    }

    fn import_database(&mut self, blob: &[u8]) -> Result<(), EngineFault> {
        let snapshot: Snapshot =
            serde_json::from_slice(blob).map_err(|err| EngineFault::new(err.to_string()))?;
        self.chunks = snapshot
            .chunks
            .into_iter()
            .map(|stored| Chunk::new(&stored.doc_id, &stored.text))
            .collect();
        Ok(())
    }

    fn document_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = Vec::new();
        for chunk in &self.chunks {
            if !ids.contains(&chunk.stored.doc_id) {
                ids.push(chunk.stored.doc_id.clone());
            }
        }
        ids
    }
}

fn paragraphs(text: &str) -> Vec<&str> {
    text.split("\n\n")
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect()
}

fn terms(text: &str) -> BTreeSet<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|word| !word.is_empty())
        .map(str::to_lowercase)
        .collect()
}
