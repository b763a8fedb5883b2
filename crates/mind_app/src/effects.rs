use std::sync::mpsc::RecvTimeoutError;
use std::time::{Duration, Instant};

use mind_core::{Effect, Msg, SearchHit};
use mind_logging::{mind_info, mind_warn};
use mind_worker::{WorkerCommand, WorkerEvent, WorkerHandle};

/// Carries reducer effects to the worker and worker events back as messages.
pub struct EffectRunner {
    worker: WorkerHandle,
    clock: Instant,
}

/// Worker side has gone away.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerGone;

impl EffectRunner {
    pub fn new(worker: WorkerHandle) -> Self {
        Self {
            worker,
            clock: Instant::now(),
        }
    }

    pub fn enqueue(&self, effects: Vec<Effect>) {
        for effect in effects {
            let command = to_command(effect);
            match &command {
                WorkerCommand::AddDocument { id, content } => {
                    mind_info!("AddDocument id={} bytes={}", id, content.len());
                }
                WorkerCommand::CancelDocument { id } => mind_info!("CancelDocument id={}", id),
                WorkerCommand::Search { query, allowed_ids } => mind_info!(
                    "Search query_len={} filter={:?}",
                    query.len(),
                    allowed_ids
                ),
                WorkerCommand::Init => mind_info!("Init"),
            }
            self.worker.send(command);
        }
    }

    /// Waits up to `timeout` for the next worker event; `Ok(None)` on timeout.
    pub fn next_msg(&self, timeout: Duration) -> Result<Option<Msg>, WorkerGone> {
        match self.worker.recv_timeout(timeout) {
            Ok(event) => Ok(Some(self.translate(event))),
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(RecvTimeoutError::Disconnected) => Err(WorkerGone),
        }
    }

    /// Messages already waiting, without blocking.
    pub fn pending_msgs(&self) -> Vec<Msg> {
        std::iter::from_fn(|| self.worker.try_recv())
            .map(|event| self.translate(event))
            .collect()
    }

    /// Closes the worker and returns messages for events it sent meanwhile.
    pub fn shutdown(self) -> Vec<Msg> {
        let at_ms = self.elapsed_ms();
        self.worker
            .shutdown()
            .into_iter()
            .map(|event| to_msg(event, at_ms))
            .collect()
    }

    fn translate(&self, event: WorkerEvent) -> Msg {
        if let WorkerEvent::Error { message, document } = &event {
            mind_warn!("worker error (document {:?}): {}", document, message);
        }
        to_msg(event, self.elapsed_ms())
    }

    fn elapsed_ms(&self) -> u64 {
        u64::try_from(self.clock.elapsed().as_millis()).unwrap_or(u64::MAX)
    }
}

pub(crate) fn to_command(effect: Effect) -> WorkerCommand {
    match effect {
        Effect::Init => WorkerCommand::Init,
        Effect::AddDocument { id, content } => WorkerCommand::AddDocument { id, content },
        Effect::CancelDocument { id } => WorkerCommand::CancelDocument { id },
        Effect::Search { query, allowed_ids } => WorkerCommand::Search { query, allowed_ids },
    }
}

pub(crate) fn to_msg(event: WorkerEvent, at_ms: u64) -> Msg {
    match event {
        WorkerEvent::Ready => Msg::WorkerReady,
        WorkerEvent::InitProgress { percent, status } => Msg::InitProgress { percent, status },
        WorkerEvent::IndexProgress {
            filename,
            current,
            total,
            percent,
        } => Msg::IndexProgress {
            filename,
            current,
            total,
            percent,
            at_ms,
        },
        WorkerEvent::DocumentAdded { count, id } => Msg::DocumentAdded { id, count },
        WorkerEvent::RestoredDocs { ids } => Msg::RestoredDocs(ids),
        WorkerEvent::SearchResults { results } => Msg::SearchResults(
            results
                .into_iter()
                .map(|r| SearchHit {
                    doc_id: r.doc_id,
                    content: r.content,
                    sender: r.sender,
                    date: r.date,
                    score: r.score,
                })
                .collect(),
        ),
        WorkerEvent::Error { message, document } => Msg::WorkerError { message, document },
    }
}
