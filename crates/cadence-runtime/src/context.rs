// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! One named, independently paced tick loop.

use cadence_core::{Action, DispatchQueue, ExecutionState, Fault, FrameTimer, StateCell};
use crossbeam_channel::Sender;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// The per-tick callback bound to an execution context.
///
/// Receives the elapsed time since the previous tick start (zero on the
/// first tick). An `Err` return faults the context.
pub type TickFn = Box<dyn FnMut(Duration) -> anyhow::Result<()> + Send + 'static>;

/// State shared between a context's worker and handles held on other threads.
struct ContextShared {
    name: String,
    state: StateCell,
    queue: DispatchQueue,
}

/// Cloneable handle onto an execution context, safe to hold from any thread.
///
/// Handles outlive the worker: dispatching to an exited context drops the
/// action with a warning instead of queueing it for a drain that will never
/// come.
#[derive(Clone)]
pub struct ContextHandle {
    shared: Arc<ContextShared>,
}

impl ContextHandle {
    /// Name of the context this handle points at.
    pub fn name(&self) -> &str {
        &self.shared.name
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ExecutionState {
        self.shared.state.get()
    }

    /// Defers `action` onto this context's queue.
    ///
    /// Callable from any thread, including from an action the context is
    /// currently executing (the re-entrant dispatch lands in the next drain).
    pub fn dispatch(&self, action: Action) {
        if self.state() == ExecutionState::Exited {
            log::warn!("Dropping dispatch to exited context '{}'.", self.name());
            return;
        }
        self.shared.queue.enqueue(action);
        // The worker may have exited between the check and the enqueue. Its
        // final drain happens after it stores `Exited`, so observing an older
        // state here means the action made that drain; observing `Exited`
        // means nothing will ever pick the action up, and it is dropped here
        // instead of being retained silently.
        if self.state() == ExecutionState::Exited {
            let abandoned = self.shared.queue.drain();
            if !abandoned.is_empty() {
                log::warn!(
                    "Dropping {} dispatch(es) to exited context '{}'.",
                    abandoned.len(),
                    self.name()
                );
            }
        }
    }

    /// Requests a stop at the next tick boundary. Idempotent, non-blocking;
    /// callers wanting to observe the exit poll [`state`](Self::state).
    pub fn request_stop(&self) {
        let previous = self.shared.state.advance(ExecutionState::Exiting);
        if previous < ExecutionState::Exiting {
            log::debug!("Stop requested for context '{}'.", self.name());
        }
    }

    /// Marks a context that never attached a worker as terminally exited and
    /// drops whatever its queue still holds. Used by the scheduler when a
    /// spawn fails or a cooperative pass winds down; a live worker always
    /// wins the race because `advance` is monotonic and the worker checks for
    /// `Exiting` before every tick.
    pub(crate) fn mark_exited(&self) {
        self.shared.state.advance(ExecutionState::Exited);
        drop_abandoned(&self.shared);
    }
}

/// One logical thread of the scheduler: a dispatch queue, a target rate and a
/// per-tick callback, bound to whatever worker drives [`run_loop`] (a
/// dedicated OS thread in concurrent mode, the caller's thread in
/// cooperative mode).
///
/// [`run_loop`]: ExecutionContext::run_loop
pub struct ExecutionContext {
    shared: Arc<ContextShared>,
    callback: TickFn,
    budget: Option<Duration>,
    timer: FrameTimer,
    last_tick: Option<Instant>,
}

impl ExecutionContext {
    /// Creates a context. `target_rate_hz = None` means unthrottled; a
    /// non-positive rate is treated the same way.
    pub fn new(name: impl Into<String>, target_rate_hz: Option<f64>, callback: TickFn) -> Self {
        let name = name.into();
        let budget = match target_rate_hz {
            Some(rate) if rate > 0.0 => Some(Duration::from_secs_f64(1.0 / rate)),
            Some(rate) => {
                log::warn!("Context '{name}': ignoring non-positive target rate {rate}.");
                None
            }
            None => None,
        };
        Self {
            shared: Arc::new(ContextShared {
                name,
                state: StateCell::new(),
                queue: DispatchQueue::new(),
            }),
            callback,
            budget,
            timer: FrameTimer::new(),
            last_tick: None,
        }
    }

    /// Name of this context.
    pub fn name(&self) -> &str {
        &self.shared.name
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ExecutionState {
        self.shared.state.get()
    }

    /// Fixed per-tick budget derived from the target rate, if any.
    pub fn budget(&self) -> Option<Duration> {
        self.budget
    }

    /// Returns a cloneable handle for dispatching and stop requests.
    pub fn handle(&self) -> ContextHandle {
        ContextHandle {
            shared: Arc::clone(&self.shared),
        }
    }

    /// Marks the start request. A no-op once the context has moved past
    /// `Starting`.
    pub(crate) fn begin(&self) {
        if self.shared.state.advance(ExecutionState::Starting) == ExecutionState::Idle {
            log::info!(
                "Context '{}' starting ({}).",
                self.name(),
                match self.budget {
                    Some(budget) => format!("budget {budget:?} per tick"),
                    None => "unthrottled".to_string(),
                }
            );
        }
    }

    /// Runs the full pacing loop on the calling thread until the context
    /// exits, then marks it `Exited`.
    ///
    /// Each tick drains the dispatch queue, invokes the callback, and (when a
    /// target rate is set) sleeps out the remainder of a fixed budget measured
    /// from that tick's own start. Missed budgets are not caught up:
    /// every tick targets `1/rate` from its own start, so drift is never
    /// accumulated.
    pub fn run_loop(&mut self, faults: &Sender<Fault>) {
        self.begin();
        while self.state() < ExecutionState::Exiting {
            let tick_start = Instant::now();
            self.tick_once(faults);
            if let Some(budget) = self.budget {
                if self.state() < ExecutionState::Exiting {
                    self.timer.wait(budget.saturating_sub(tick_start.elapsed()));
                }
            }
        }
        // Store `Exited` before the final drain: a handle whose enqueue
        // landed after this drain is guaranteed to observe `Exited` on its
        // own re-check and drops the action itself.
        self.shared.state.advance(ExecutionState::Exited);
        drop_abandoned(&self.shared);
        log::info!("Context '{}' exited.", self.name());
    }

    /// One tick: drain and execute the dispatch batch, then invoke the bound
    /// callback with the elapsed time since the previous tick start.
    ///
    /// A failing (or panicking) action faults the context and skips the rest
    /// of its batch; a failing callback faults the context. The state
    /// advances to `Running` after the first successful tick. Returns `false`
    /// if this tick faulted.
    pub(crate) fn tick_once(&mut self, faults: &Sender<Fault>) -> bool {
        let tick_start = Instant::now();
        let elapsed = self
            .last_tick
            .map(|previous| tick_start.saturating_duration_since(previous))
            .unwrap_or(Duration::ZERO);
        self.last_tick = Some(tick_start);

        let batch = self.shared.queue.drain();
        let batch_len = batch.len();
        for (index, action) in batch.into_iter().enumerate() {
            if let Err(cause) = run_guarded(action) {
                let skipped = batch_len - index - 1;
                if skipped > 0 {
                    log::warn!(
                        "Context '{}': skipping {skipped} queued action(s) after a fault.",
                        self.name()
                    );
                }
                self.fail(faults, cause);
                return false;
            }
        }

        let callback = &mut self.callback;
        if let Err(cause) = run_guarded(move || callback(elapsed)) {
            self.fail(faults, cause);
            return false;
        }

        self.shared.state.advance(ExecutionState::Running);
        true
    }

    /// Captures a fault: logs it, moves this context to `Exiting`, and
    /// notifies the scheduler. Sibling contexts are untouched; they keep
    /// ticking until the scheduler orders them down.
    fn fail(&self, faults: &Sender<Fault>, cause: anyhow::Error) {
        log::error!("Context '{}' faulted: {cause:#}", self.name());
        self.shared.state.advance(ExecutionState::Exiting);
        if faults.send(Fault::new(self.name(), cause)).is_err() {
            log::error!(
                "Fault channel disconnected; fault from '{}' was not delivered.",
                self.name()
            );
        }
    }
}

/// Drains and drops anything still queued on an exited context, with a
/// warning naming the count. Callers must have advanced the state to
/// `Exited` first.
fn drop_abandoned(shared: &ContextShared) {
    let abandoned = shared.queue.drain();
    if !abandoned.is_empty() {
        log::warn!(
            "Context '{}' exited with {} action(s) still queued; dropping them.",
            shared.name,
            abandoned.len()
        );
    }
}

/// Invokes `f`, converting a panic into an error so one bad callback cannot
/// take down its worker thread without being attributed.
fn run_guarded<F>(f: F) -> anyhow::Result<()>
where
    F: FnOnce() -> anyhow::Result<()>,
{
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(result) => result,
        Err(payload) => Err(anyhow::anyhow!("panicked: {}", panic_message(&payload))),
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
