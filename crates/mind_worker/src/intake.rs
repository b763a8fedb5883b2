use std::collections::{HashSet, VecDeque};

use mind_logging::mind_debug;
use tokio::sync::mpsc;

use crate::WorkerCommand;

/// Document ids whose add has been asked to abort.
///
/// Entries are one-shot: the first check that finds an id removes it.
#[derive(Debug, Default, Clone)]
pub struct CancellationSet {
    ids: HashSet<String>,
}

impl CancellationSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request(&mut self, id: impl Into<String>) {
        self.ids.insert(id.into());
    }

    /// Returns true and forgets the id if a cancel was pending for it.
    pub fn consume(&mut self, id: &str) -> bool {
        self.ids.remove(id)
    }

}

/// FIFO admission of worker commands.
///
/// Cancels bypass the queue: whenever the inbox is drained they go straight
/// into the [`CancellationSet`], so a cancel overtakes the add it targets if
/// that add is still waiting.
pub struct Intake {
    inbox: mpsc::UnboundedReceiver<WorkerCommand>,
    backlog: VecDeque<WorkerCommand>,
    cancellations: CancellationSet,
}

impl Intake {
    pub fn new(inbox: mpsc::UnboundedReceiver<WorkerCommand>) -> Self {
        Self {
            inbox,
            backlog: VecDeque::new(),
            cancellations: CancellationSet::new(),
        }
    }

    /// Next command to execute, in arrival order. `None` once the sender side
    /// is gone and everything queued has been handed out.
    pub async fn next(&mut self) -> Option<WorkerCommand> {
        loop {
            self.absorb_pending();
            if let Some(command) = self.backlog.pop_front() {
                return Some(command);
            }
            let command = self.inbox.recv().await?;
            self.admit(command);
        }
    }

    /// Moves everything already delivered into the backlog or the cancel set.
    pub fn absorb_pending(&mut self) {
        while let Ok(command) = self.inbox.try_recv() {
            self.admit(command);
        }
    }

    /// Checkpoint used by ingestion: drains the inbox, then consumes a pending
    /// cancel for `id` if there is one.
    pub fn take_cancellation(&mut self, id: &str) -> bool {
        self.absorb_pending();
        self.cancellations.consume(id)
    }

    fn admit(&mut self, command: WorkerCommand) {
        match command {
            WorkerCommand::CancelDocument { id } => {
                mind_debug!("cancel requested for {}", id);
                self.cancellations.request(id);
            }
            other => self.backlog.push_back(other),
        }
    }
}
