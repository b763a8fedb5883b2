//! Document ingestion: `queued -> processing -> completed | cancelled | failed`.
//!
//! Cancellation is checked at exactly two points: before the engine is
//! called and after it returns. A cancel observed at the second point
//! suppresses `DOCUMENT_ADDED` but does not undo the engine's addition.

use mind_logging::{mind_error, mind_info, mind_warn};

use crate::adapter::{Engine, EngineAdapter};
use crate::dispatch::EventSink;
use crate::intake::Intake;
use crate::snapshot::SnapshotStore;
use crate::{WorkerError, WorkerEvent};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestOutcome {
    Completed { count: usize },
    /// Cancelled while queued; the engine was never called.
    CancelledBeforeStart,
    /// Cancelled while processing; the engine already holds the document.
    CancelledAfterAdd { count: usize },
    Failed(WorkerError),
}

pub struct IngestionPipeline<'a, E> {
    adapter: &'a mut EngineAdapter<E>,
    intake: &'a mut Intake,
    snapshots: &'a SnapshotStore,
    events: &'a dyn EventSink,
}

impl<'a, E: Engine> IngestionPipeline<'a, E> {
    pub fn new(
        adapter: &'a mut EngineAdapter<E>,
        intake: &'a mut Intake,
        snapshots: &'a SnapshotStore,
        events: &'a dyn EventSink,
    ) -> Self {
        Self {
            adapter,
            intake,
            snapshots,
            events,
        }
    }

    pub fn ingest(self, id: &str, content: &str) -> IngestOutcome {
        if self.intake.take_cancellation(id) {
            mind_info!("{} cancelled before processing", id);
            return IngestOutcome::CancelledBeforeStart;
        }

        mind_info!("adding document {} ({} bytes)", id, content.len());
        let events = self.events;
        let mut on_progress = |current: usize, total: usize| {
            events.emit(WorkerEvent::IndexProgress {
                filename: id.to_string(),
                current,
                total,
                percent: percent(current, total),
            });
        };
        let count = match self.adapter.add_document(id, content, &mut on_progress) {
            Ok(count) => count,
            Err(err) => {
                mind_warn!("adding {} failed: {}", id, err);
                self.events.emit(WorkerEvent::Error {
                    message: err.to_string(),
                    document: Some(id.to_string()),
                });
                return IngestOutcome::Failed(err);
            }
        };

        if self.intake.take_cancellation(id) {
            mind_warn!(
                "{} cancelled during processing; engine keeps it ({} chunks total)",
                id,
                count
            );
            return IngestOutcome::CancelledAfterAdd { count };
        }

        self.events.emit(WorkerEvent::DocumentAdded {
            count,
            id: id.to_string(),
        });

        match self.adapter.export_database() {
            Ok(blob) => self.snapshots.save(blob),
            Err(err) => mind_error!("snapshot export after {} failed: {}", id, err),
        }

        IngestOutcome::Completed { count }
    }
}

fn percent(current: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        (100.0 * current as f64 / total as f64).clamp(0.0, 100.0)
    }
}
