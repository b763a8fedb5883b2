use std::time::Duration;

use anyhow::bail;
use mind_core::{update, AppState, AppViewModel, Msg};
use mind_logging::mind_debug;

use crate::effects::EffectRunner;
use crate::render::Renderer;

const TICK: Duration = Duration::from_millis(75);

/// UI-thread loop: reducer state, effect routing and rendering.
pub struct Session {
    state: AppState,
    runner: EffectRunner,
    renderer: Renderer,
}

impl Session {
    pub fn new(runner: EffectRunner, renderer: Renderer) -> Self {
        Self {
            state: AppState::new(),
            runner,
            renderer,
        }
    }

    pub fn view(&self) -> AppViewModel {
        self.state.view()
    }

    pub fn dispatch(&mut self, msg: Msg) {
        let state = std::mem::take(&mut self.state);
        let (state, effects) = update(state, msg);
        self.state = state;
        self.runner.enqueue(effects);
    }

    /// Feeds worker events through the reducer until `done` holds.
    pub fn run_until(
        &mut self,
        done: impl Fn(&AppViewModel) -> bool,
    ) -> anyhow::Result<AppViewModel> {
        loop {
            self.render_if_dirty();
            let view = self.state.view();
            if done(&view) {
                return Ok(view);
            }
            match self.runner.next_msg(TICK) {
                Ok(Some(msg)) => {
                    self.dispatch(msg);
                    for msg in self.runner.pending_msgs() {
                        self.dispatch(msg);
                    }
                }
                Ok(None) => self.dispatch(Msg::Tick),
                Err(_) => bail!("worker stopped unexpectedly"),
            }
        }
    }

    /// Sends INIT and waits for READY or the init failure.
    pub fn initialize(&mut self) -> anyhow::Result<AppViewModel> {
        self.dispatch(Msg::InitRequested);
        self.run_until(|view| view.ready || view.init_error.is_some())
    }

    /// Stops the worker after it drains its queue and applies its last events.
    pub fn shutdown(self) -> AppViewModel {
        let Session {
            mut state,
            runner,
            mut renderer,
        } = self;
        for msg in runner.shutdown() {
            state = update(state, msg).0;
        }
        mind_debug!("session closed");
        let view = state.view();
        renderer.render(&view);
        view
    }

    fn render_if_dirty(&mut self) {
        if self.state.consume_dirty() {
            self.renderer.render(&self.state.view());
        }
    }
}
