use std::sync::Arc;

use bytes::Bytes;
use futures_util::future::try_join3;
use mind_logging::{mind_debug, mind_info, mind_warn};

use crate::cache::DurableCache;
use crate::config::ModelAssets;
use crate::fetch::{Fetcher, ProgressSink};
use crate::progress::{ProgressAggregator, ProgressState};
use crate::write_behind::WriteBehind;
use crate::{FailureKind, FetchError, ModelBundle};

/// Cache key for an asset URL: its last non-empty path segment.
pub fn cache_key(url: &str) -> Result<String, FetchError> {
    let parsed = url::Url::parse(url)
        .map_err(|err| FetchError::new(FailureKind::InvalidUrl, err.to_string()))?;
    parsed
        .path_segments()
        .and_then(|segments| segments.rev().find(|s| !s.is_empty()))
        .map(ToOwned::to_owned)
        .ok_or_else(|| FetchError::new(FailureKind::InvalidUrl, format!("no file name in {url}")))
}

/// Seeds a progress state with every asset's estimate, keyed by cache key.
pub fn seeded_progress(assets: &ModelAssets) -> Result<ProgressState, FetchError> {
    let mut state = ProgressState::new();
    for asset in assets.iter() {
        state.seed(&cache_key(&asset.url)?, asset.estimated_bytes);
    }
    Ok(state)
}

/// Cache-first asset download.
pub struct AssetLoader {
    fetcher: Arc<dyn Fetcher>,
    cache: Arc<dyn DurableCache>,
    writes: Arc<WriteBehind>,
}

impl AssetLoader {
    pub fn new(
        fetcher: Arc<dyn Fetcher>,
        cache: Arc<dyn DurableCache>,
        writes: Arc<WriteBehind>,
    ) -> Self {
        Self {
            fetcher,
            cache,
            writes,
        }
    }

    /// Returns the asset bytes from the cache, or downloads and caches them.
    ///
    /// Cache faults never fail the fetch: a read fault is a miss and a write
    /// fault only loses the cache entry.
    pub async fn fetch_asset(
        &self,
        url: &str,
        sink: &dyn ProgressSink,
    ) -> Result<Bytes, FetchError> {
        let key = cache_key(url)?;

        if let Some(cached) = self.lookup(&key).await {
            let size = cached.len() as u64;
            mind_info!("asset {} served from cache ({} bytes)", key, size);
            sink.report(size, size);
            return Ok(cached);
        }

        mind_info!("asset {} not cached, downloading {}", key, url);
        let output = self.fetcher.fetch(url, sink).await?;
        mind_debug!(
            "asset {} downloaded: {} bytes, {} redirects",
            key,
            output.metadata.byte_len,
            output.metadata.redirect_count
        );
        self.writes.put(key, output.bytes.clone());
        Ok(output.bytes)
    }

    /// Fetches weights, tokenizer and config concurrently.
    pub async fn load_model_assets(
        &self,
        assets: &ModelAssets,
        progress: &ProgressAggregator<'_>,
    ) -> Result<ModelBundle, FetchError> {
        let weights_key = cache_key(&assets.weights.url)?;
        let tokenizer_key = cache_key(&assets.tokenizer.url)?;
        let config_key = cache_key(&assets.config.url)?;

        let weights_sink = progress.for_asset(&weights_key);
        let tokenizer_sink = progress.for_asset(&tokenizer_key);
        let config_sink = progress.for_asset(&config_key);

        let (weights, tokenizer, config) = try_join3(
            self.fetch_asset(&assets.weights.url, &weights_sink),
            self.fetch_asset(&assets.tokenizer.url, &tokenizer_sink),
            self.fetch_asset(&assets.config.url, &config_sink),
        )
        .await?;

        Ok(ModelBundle {
            weights,
            tokenizer,
            config,
        })
    }

    async fn lookup(&self, key: &str) -> Option<Bytes> {
        let cache = self.cache.clone();
        let owned_key = key.to_string();
        let looked_up = tokio::task::spawn_blocking(move || cache.get(&owned_key)).await;
        match looked_up {
            Ok(Ok(hit)) => hit.map(Bytes::from),
            Ok(Err(err)) => {
                mind_warn!("cache read failed for {}, treating as miss: {}", key, err);
                None
            }
            Err(err) => {
                mind_warn!("cache read task failed for {}, treating as miss: {}", key, err);
                None
            }
        }
    }
}
