use std::sync::{Arc, Mutex};

use bytes::Bytes;
use mind_logging::{mind_debug, mind_error};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::cache::DurableCache;

type Write = (String, Bytes);

/// Fire-and-forget cache writes.
///
/// A single writer task applies writes one at a time in the order they were
/// queued, so the last `put` for a key is the one left in the cache. Failures
/// are logged. [`WriteBehind::flush`] waits for everything queued so far and
/// is called before the worker thread exits.
pub struct WriteBehind {
    cache: Arc<dyn DurableCache>,
    writer: Mutex<Option<Writer>>,
}

struct Writer {
    queue: mpsc::UnboundedSender<Write>,
    task: JoinHandle<()>,
}

impl WriteBehind {
    pub fn new(cache: Arc<dyn DurableCache>) -> Self {
        Self {
            cache,
            writer: Mutex::new(None),
        }
    }

    /// Must be called from inside a tokio runtime.
    pub fn put(&self, key: impl Into<String>, value: Bytes) {
        let mut writer = self.writer.lock().unwrap_or_else(|p| p.into_inner());
        let writer = writer.get_or_insert_with(|| Writer::start(self.cache.clone()));
        if writer.queue.send((key.into(), value)).is_err() {
            mind_error!("cache writer stopped, dropping write");
        }
    }

    pub async fn flush(&self) {
        let writer = self.writer.lock().unwrap_or_else(|p| p.into_inner()).take();
        let Some(Writer { queue, task }) = writer else {
            return;
        };
        drop(queue);
        if let Err(err) = task.await {
            mind_error!("cache writer aborted: {}", err);
        }
    }
}

impl Writer {
    fn start(cache: Arc<dyn DurableCache>) -> Self {
        let (queue, mut rx) = mpsc::unbounded_channel::<Write>();
        let task = tokio::spawn(async move {
            while let Some((key, value)) = rx.recv().await {
                let cache = cache.clone();
                let len = value.len();
                let written = tokio::task::spawn_blocking(move || {
                    let result = cache.put(&key, &value);
                    (key, result)
                })
                .await;
                match written {
                    Ok((key, Ok(()))) => {
                        mind_debug!("cache write ok key={} bytes={}", key, len);
                    }
                    Ok((key, Err(err))) => {
                        mind_error!("cache write failed key={}: {}", key, err);
                    }
                    Err(err) => mind_error!("cache write task aborted: {}", err),
                }
            }
        });
        Self { queue, task }
    }
}
