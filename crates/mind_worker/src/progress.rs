//! Cross-asset download progress.
//!
//! [`ProgressState`] is the pure bookkeeping; [`ProgressAggregator`] wraps it
//! for the concurrent downloads and re-emits `INIT_PROGRESS` on every report.

use std::collections::BTreeMap;
use std::sync::Mutex;

use crate::dispatch::EventSink;
use crate::fetch::ProgressSink;
use crate::WorkerEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
struct Entry {
    loaded: u64,
    total: u64,
}

#[derive(Debug, Clone, Default)]
pub struct ProgressState {
    entries: BTreeMap<String, Entry>,
}

impl ProgressState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an asset with an estimated size (0 if unknown).
    pub fn seed(&mut self, asset: &str, estimated_total: u64) {
        self.entries.insert(
            asset.to_string(),
            Entry {
                loaded: 0,
                total: estimated_total,
            },
        );
    }

    /// `total == 0` keeps whatever total the asset already had.
    pub fn report(&mut self, asset: &str, loaded: u64, total: u64) {
        let entry = self.entries.entry(asset.to_string()).or_default();
        entry.loaded = loaded;
        if total > 0 {
            entry.total = total;
        }
    }

    pub fn loaded_bytes(&self) -> u64 {
        self.entries
            .values()
            .filter(|e| e.total > 0)
            .map(|e| e.loaded.min(e.total))
            .sum()
    }

    pub fn total_bytes(&self) -> u64 {
        self.entries.values().map(|e| e.total).sum()
    }

    /// Always within `[0, 100]`; 0 while no total is known.
    pub fn overall_percent(&self) -> f64 {
        let total = self.total_bytes();
        if total == 0 {
            return 0.0;
        }
        let percent = 100.0 * self.loaded_bytes() as f64 / total as f64;
        percent.clamp(0.0, 100.0)
    }
}

pub struct ProgressAggregator<'a> {
    state: Mutex<ProgressState>,
    events: &'a dyn EventSink,
}

impl<'a> ProgressAggregator<'a> {
    pub fn new(state: ProgressState, events: &'a dyn EventSink) -> Self {
        Self {
            state: Mutex::new(state),
            events,
        }
    }

    pub fn report(&self, asset: &str, loaded: u64, total: u64) {
        let (percent, status) = {
            let mut state = self.state.lock().unwrap_or_else(|p| p.into_inner());
            state.report(asset, loaded, total);
            (
                state.overall_percent(),
                download_status(state.loaded_bytes(), state.total_bytes()),
            )
        };
        self.events.emit(WorkerEvent::InitProgress { percent, status });
    }

    pub fn overall_percent(&self) -> f64 {
        self.state
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .overall_percent()
    }

    /// Progress sink bound to one asset.
    pub fn for_asset<'s>(&'s self, asset: &'s str) -> AssetProgress<'s, 'a> {
        AssetProgress {
            asset,
            aggregator: self,
        }
    }
}

pub struct AssetProgress<'s, 'a> {
    asset: &'s str,
    aggregator: &'s ProgressAggregator<'a>,
}

impl ProgressSink for AssetProgress<'_, '_> {
    fn report(&self, loaded: u64, total: u64) {
        self.aggregator.report(self.asset, loaded, total);
    }
}

fn download_status(loaded: u64, total: u64) -> String {
    format!(
        "Downloading model files ({} / {})",
        megabytes(loaded),
        megabytes(total)
    )
}

fn megabytes(bytes: u64) -> String {
    format!("{:.1} MB", bytes as f64 / 1_048_576.0)
}
