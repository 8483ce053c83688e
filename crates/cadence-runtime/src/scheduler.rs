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

//! Orchestration of execution contexts: startup, pacing mode, fault
//! propagation and ordered teardown.

use crate::context::{ContextHandle, ExecutionContext};
use crate::error::SchedulerError;
use cadence_core::{ExecutionState, Fault, FrameTimer};
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

/// How the scheduler maps contexts onto workers of execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ExecutionMode {
    /// One dedicated OS thread per context, each pacing itself.
    #[default]
    Concurrent,
    /// Every context interleaved on the caller's thread, one pass at a time.
    /// No threads are spawned; intended for headless and deterministic hosts.
    Cooperative,
}

/// State shared between the scheduler and its cloneable handles.
struct SchedulerShared {
    exit_requested: AtomicBool,
    run_in_flight: AtomicBool,
    handles: Mutex<Vec<ContextHandle>>,
}

impl SchedulerShared {
    /// True from any context's first successful tick until every context has
    /// exited.
    fn is_running(&self) -> bool {
        self.handles.lock().unwrap().iter().any(|handle| {
            matches!(
                handle.state(),
                ExecutionState::Running | ExecutionState::Exiting
            )
        })
    }

    fn request_exit(&self) {
        if !self.exit_requested.swap(true, Ordering::AcqRel) {
            log::info!("Scheduler exit requested.");
        }
    }
}

/// Cloneable control surface onto a scheduler whose `run` may be blocking
/// another thread.
#[derive(Clone)]
pub struct SchedulerHandle {
    shared: Arc<SchedulerShared>,
}

impl SchedulerHandle {
    /// Requests shutdown of every context, dependents first. Non-blocking
    /// and idempotent; the ordered stop requests are issued by the
    /// orchestrating `run` call, which only returns once every context has
    /// exited.
    pub fn exit(&self) {
        self.shared.request_exit();
    }

    /// Point-in-time liveness: true from the first successful tick of any
    /// context until all contexts reach `Exited`.
    pub fn is_running(&self) -> bool {
        self.shared.is_running()
    }
}

/// Owns an ordered collection of [`ExecutionContext`]s and drives them.
///
/// Registration order is startup order (the main/platform context first);
/// shutdown runs in reverse registration order so dependents (render) come
/// down before the contexts they rely on (update, then main). A scheduler
/// runs exactly once and is then disposed.
pub struct Scheduler {
    mode: ExecutionMode,
    contexts: Vec<ExecutionContext>,
    shared: Arc<SchedulerShared>,
    fault_tx: Sender<Fault>,
    fault_rx: Receiver<Fault>,
    suppressed: Vec<Fault>,
}

impl Scheduler {
    /// Creates an empty scheduler for the given execution mode.
    pub fn new(mode: ExecutionMode) -> Self {
        let (fault_tx, fault_rx) = crossbeam_channel::unbounded();
        Self {
            mode,
            contexts: Vec::new(),
            shared: Arc::new(SchedulerShared {
                exit_requested: AtomicBool::new(false),
                run_in_flight: AtomicBool::new(false),
                handles: Mutex::new(Vec::new()),
            }),
            fault_tx,
            fault_rx,
            suppressed: Vec::new(),
        }
    }

    /// The configured execution mode.
    pub fn mode(&self) -> ExecutionMode {
        self.mode
    }

    /// Registers `context`. Rejected once `run` has started, and context
    /// names must be unique within one scheduler.
    pub fn add(&mut self, context: ExecutionContext) -> Result<(), SchedulerError> {
        if self.shared.run_in_flight.load(Ordering::Acquire) {
            return Err(SchedulerError::ContextListFrozen);
        }
        let mut handles = self.shared.handles.lock().unwrap();
        if handles.iter().any(|handle| handle.name() == context.name()) {
            return Err(SchedulerError::DuplicateContext(context.name().to_string()));
        }
        log::debug!("Registered context '{}'.", context.name());
        handles.push(context.handle());
        drop(handles);
        self.contexts.push(context);
        Ok(())
    }

    /// Returns a cloneable handle for `exit` / `is_running` from other
    /// threads.
    pub fn handle(&self) -> SchedulerHandle {
        SchedulerHandle {
            shared: Arc::clone(&self.shared),
        }
    }

    /// See [`SchedulerHandle::exit`].
    pub fn exit(&self) {
        self.shared.request_exit();
    }

    /// See [`SchedulerHandle::is_running`].
    pub fn is_running(&self) -> bool {
        self.shared.is_running()
    }

    /// Faults recorded after the primary one, in arrival order. They never
    /// change the reported cause but are kept for post-mortems.
    pub fn suppressed_faults(&self) -> &[Fault] {
        &self.suppressed
    }

    /// Runs every registered context to completion and blocks until all of
    /// them have exited.
    ///
    /// The context list freezes here. At most one `run` may ever be in
    /// flight; a second call fails immediately with
    /// [`SchedulerError::AlreadyRunning`]. On return, teardown has fully
    /// completed — either gracefully (`Ok`) or after the first recorded
    /// fault, which is re-raised as [`SchedulerError::Faulted`].
    pub fn run(&mut self) -> Result<(), SchedulerError> {
        if self.shared.run_in_flight.swap(true, Ordering::AcqRel) {
            return Err(SchedulerError::AlreadyRunning);
        }
        log::info!(
            "Scheduler starting {} context(s) in {:?} mode.",
            self.contexts.len(),
            self.mode
        );
        let primary = match self.mode {
            ExecutionMode::Concurrent => self.run_concurrent(),
            ExecutionMode::Cooperative => self.run_cooperative(),
        };
        log::info!("Scheduler stopped; all contexts exited.");
        match primary {
            Some(fault) => Err(SchedulerError::Faulted(fault)),
            None => Ok(()),
        }
    }

    /// Drives one cooperative pass: every context that has not begun exiting
    /// is ticked exactly once, in registration order. The pass itself never
    /// sleeps; pacing is the caller's business (the cooperative `run` loop
    /// paces whole passes, deterministic test hosts call this directly).
    pub fn step(&mut self) {
        let faults = self.fault_tx.clone();
        for context in &mut self.contexts {
            if context.state() >= ExecutionState::Exiting {
                continue;
            }
            context.begin();
            context.tick_once(&faults);
        }
    }

    /// Concurrent mode: one named OS thread per context, spawned in
    /// registration order. Blocks orchestrating until exit or fault, then
    /// tears down in reverse registration order.
    fn run_concurrent(&mut self) -> Option<Fault> {
        let mut primary: Option<Fault> = None;
        let mut workers = Vec::with_capacity(self.contexts.len());
        let mut spawn_failed = false;

        for mut context in std::mem::take(&mut self.contexts) {
            let handle = context.handle();
            if spawn_failed {
                // A later context never gets a worker once startup has
                // failed; it exits without ever starting.
                handle.mark_exited();
                continue;
            }
            let faults = self.fault_tx.clone();
            let builder = thread::Builder::new().name(format!("cadence-{}", context.name()));
            match builder.spawn(move || context.run_loop(&faults)) {
                Ok(worker) => workers.push(worker),
                Err(source) => {
                    spawn_failed = true;
                    handle.mark_exited();
                    // A worker that cannot start is an application fault on
                    // the main (first-registered) context.
                    let main = self
                        .context_handles()
                        .first()
                        .map(|h| h.name().to_string())
                        .unwrap_or_default();
                    self.record(
                        &mut primary,
                        Fault::new(
                            main,
                            anyhow::Error::new(source).context("failed to spawn worker thread"),
                        ),
                    );
                    self.shared.request_exit();
                }
            }
        }

        let handles = self.context_handles();
        loop {
            if self.shared.exit_requested.load(Ordering::Acquire) {
                break;
            }
            match self.fault_rx.recv_timeout(Duration::from_millis(5)) {
                Ok(fault) => {
                    self.record(&mut primary, fault);
                    self.shared.request_exit();
                    break;
                }
                Err(RecvTimeoutError::Timeout) => {
                    if handles
                        .iter()
                        .all(|handle| handle.state() == ExecutionState::Exited)
                    {
                        break;
                    }
                }
                // Unreachable while we hold a sender, but not worth a panic.
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }

        // Sequenced teardown: dependents (registered later) come down first,
        // and each context is fully exited before the next stop request goes
        // out. A context whose callback never returns stalls this loop; there
        // is deliberately no join timeout.
        for handle in handles.iter().rev() {
            handle.request_stop();
            while handle.state() != ExecutionState::Exited {
                self.collect_pending(&mut primary);
                thread::sleep(Duration::from_millis(1));
            }
        }

        for worker in workers {
            if worker.join().is_err() {
                // Panics inside ticks are captured at the tick boundary; one
                // escaping the loop itself can only be logged.
                log::error!("A worker thread terminated abnormally.");
            }
        }
        self.collect_pending(&mut primary);
        primary
    }

    /// Cooperative mode: interleaves every context on the calling thread.
    /// Each full pass is paced by the smallest configured context budget.
    fn run_cooperative(&mut self) -> Option<Fault> {
        let mut primary: Option<Fault> = None;
        let timer = FrameTimer::new();
        let pass_budget = self
            .contexts
            .iter()
            .filter_map(|context| context.budget())
            .min();

        loop {
            let pass_start = Instant::now();
            self.step();
            self.collect_pending(&mut primary);
            if primary.is_some() {
                self.shared.request_exit();
            }
            if self.shared.exit_requested.load(Ordering::Acquire) {
                break;
            }
            if self
                .contexts
                .iter()
                .all(|context| context.state() >= ExecutionState::Exiting)
            {
                break;
            }
            if let Some(budget) = pass_budget {
                timer.wait(budget.saturating_sub(pass_start.elapsed()));
            }
        }

        // Reverse-order teardown. No workers exist and no tick is in flight,
        // so a stop request is honored immediately.
        for context in self.contexts.iter().rev() {
            let handle = context.handle();
            handle.request_stop();
            handle.mark_exited();
            log::info!("Context '{}' exited.", handle.name());
        }
        self.collect_pending(&mut primary);
        primary
    }

    fn context_handles(&self) -> Vec<ContextHandle> {
        self.shared.handles.lock().unwrap().clone()
    }

    /// Records a fault: the first becomes the primary cause, the rest are
    /// suppressed secondaries.
    fn record(&mut self, primary: &mut Option<Fault>, fault: Fault) {
        if primary.is_none() {
            log::error!("Primary fault: {fault}");
            *primary = Some(fault);
        } else {
            log::warn!("Suppressed fault during teardown: {fault}");
            self.suppressed.push(fault);
        }
    }

    fn collect_pending(&mut self, primary: &mut Option<Fault>) {
        while let Ok(fault) = self.fault_rx.try_recv() {
            self.record(primary, fault);
        }
    }
}
