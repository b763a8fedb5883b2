use std::sync::Arc;

use bytes::Bytes;
use mind_logging::{mind_debug, mind_warn};

use crate::cache::DurableCache;
use crate::write_behind::WriteBehind;

/// Reads and writes the index snapshot under one fixed cache key.
pub struct SnapshotStore {
    key: String,
    cache: Arc<dyn DurableCache>,
    writes: Arc<WriteBehind>,
}

impl SnapshotStore {
    pub fn new(
        key: impl Into<String>,
        cache: Arc<dyn DurableCache>,
        writes: Arc<WriteBehind>,
    ) -> Self {
        Self {
            key: key.into(),
            cache,
            writes,
        }
    }

    /// The stored snapshot, or `None` when absent or unreadable.
    pub fn load(&self) -> Option<Vec<u8>> {
        match self.cache.get(&self.key) {
            Ok(Some(blob)) => {
                mind_debug!("snapshot found ({} bytes)", blob.len());
                Some(blob)
            }
            Ok(None) => None,
            Err(err) => {
                mind_warn!("snapshot read failed, starting empty: {}", err);
                None
            }
        }
    }

    /// Overwrites the stored snapshot in the background.
    pub fn save(&self, blob: Vec<u8>) {
        self.writes.put(self.key.clone(), Bytes::from(blob));
    }
}
