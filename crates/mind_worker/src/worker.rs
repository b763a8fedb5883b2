use std::sync::{mpsc as std_mpsc, Arc};
use std::thread;
use std::time::Duration;

use mind_logging::{mind_debug, mind_error};
use tokio::sync::mpsc;

use crate::adapter::Engine;
use crate::dispatch::{ChannelEventSink, Dispatcher, EventSink, WorkerServices};
use crate::{WorkerCommand, WorkerEvent};

/// UI-side end of the worker: commands in, events out.
///
/// The worker runs on its own OS thread with a single-threaded tokio
/// runtime, so the engine never needs to be `Sync` and never sees two calls
/// at once.
pub struct WorkerHandle {
    cmd_tx: Option<mpsc::UnboundedSender<WorkerCommand>>,
    event_rx: std_mpsc::Receiver<WorkerEvent>,
    thread: Option<thread::JoinHandle<()>>,
}

impl WorkerHandle {
    pub fn spawn<E>(engine: E, services: WorkerServices) -> Self
    where
        E: Engine + Send + 'static,
    {
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = std_mpsc::channel();

        let thread = thread::Builder::new()
            .name("mind-worker".to_string())
            .spawn(move || {
                let events: Arc<dyn EventSink> = Arc::new(ChannelEventSink::new(event_tx));
                let runtime = match tokio::runtime::Builder::new_current_thread()
                    .enable_all()
                    .build()
                {
                    Ok(runtime) => runtime,
                    Err(err) => {
                        mind_error!("worker runtime failed to start: {}", err);
                        events.emit(WorkerEvent::error(format!(
                            "worker runtime failed to start: {err}"
                        )));
                        return;
                    }
                };
                let dispatcher = Dispatcher::new(engine, services, cmd_rx, events);
                runtime.block_on(dispatcher.run());
                mind_debug!("worker thread exiting");
            });

        let thread = match thread {
            Ok(handle) => Some(handle),
            Err(err) => {
                mind_error!("failed to spawn worker thread: {}", err);
                None
            }
        };

        Self {
            cmd_tx: Some(cmd_tx),
            event_rx,
            thread,
        }
    }

    pub fn send(&self, command: WorkerCommand) {
        if let Some(tx) = &self.cmd_tx {
            if tx.send(command).is_err() {
                mind_error!("worker is gone; command dropped");
            }
        }
    }

    pub fn try_recv(&self) -> Option<WorkerEvent> {
        self.event_rx.try_recv().ok()
    }

    /// `Disconnected` means the worker thread has exited.
    pub fn recv_timeout(
        &self,
        timeout: Duration,
    ) -> Result<WorkerEvent, std_mpsc::RecvTimeoutError> {
        self.event_rx.recv_timeout(timeout)
    }

    /// Closes the command channel, lets the worker finish everything already
    /// queued and flush its cache writes, and returns the events not yet
    /// received.
    pub fn shutdown(mut self) -> Vec<WorkerEvent> {
        self.cmd_tx = None;
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                mind_error!("worker thread panicked");
            }
        }
        self.event_rx.try_iter().collect()
    }
}

impl Drop for WorkerHandle {
    fn drop(&mut self) {
        self.cmd_tx = None;
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}
