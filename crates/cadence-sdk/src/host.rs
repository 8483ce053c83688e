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

//! The host: wires an application's lifecycle hooks onto the scheduler.

use crate::config::HostConfig;
use crate::platform::{HeadlessPlatform, Platform, PumpOutcome};
use crate::Application;
use anyhow::Result;
use cadence_runtime::{ExecutionContext, Scheduler, SchedulerError, SchedulerHandle};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// A subsystem hook run on the update context each tick, ahead of the
/// application's own `update`.
pub type UpdateHook = Box<dyn FnMut(Duration) -> Result<()> + Send + 'static>;

/// The single entry point that wires a scheduler to an application.
///
/// One host drives one application run: construct, optionally register
/// update hooks, then call [`run`](Host::run), which blocks until every
/// context has exited. [`handle`](Host::handle) hands out a cloneable
/// control surface for `exit` / `is_running` from other threads.
pub struct Host {
    config: HostConfig,
    platform: Box<dyn Platform>,
    update_hooks: Vec<UpdateHook>,
    scheduler: Scheduler,
    handle: SchedulerHandle,
}

impl Host {
    /// Creates a headless host (no windowing backend).
    pub fn new(config: HostConfig) -> Self {
        Self::with_platform(config, HeadlessPlatform)
    }

    /// Creates a host pumping the given platform backend on its main context.
    pub fn with_platform(config: HostConfig, platform: impl Platform) -> Self {
        let scheduler = Scheduler::new(config.execution_mode);
        let handle = scheduler.handle();
        Self {
            config,
            platform: Box::new(platform),
            update_hooks: Vec::new(),
            scheduler,
            handle,
        }
    }

    /// The configuration this host was built with.
    pub fn config(&self) -> &HostConfig {
        &self.config
    }

    /// Registers a subsystem hook. Hooks run on the update context every
    /// tick, in registration order, before the application's `update`. This
    /// is an explicit ordered list — there is no ambient global registry.
    pub fn add_update_hook(&mut self, hook: UpdateHook) {
        self.update_hooks.push(hook);
    }

    /// Returns a cloneable control surface usable while `run` blocks.
    pub fn handle(&self) -> HostHandle {
        HostHandle {
            scheduler: self.handle.clone(),
        }
    }

    /// Requests shutdown. Non-blocking, idempotent.
    pub fn exit(&self) {
        self.handle.exit();
    }

    /// True from the first successful tick of any context until every
    /// context has exited.
    pub fn is_running(&self) -> bool {
        self.handle.is_running()
    }

    /// Runs `application` to completion.
    ///
    /// Registers the `main`, `update` and `render` contexts, dispatches
    /// platform initialization and `application.load()` onto the main
    /// context, then blocks in the scheduler until everything has exited.
    /// `unload` always runs before this returns; the first captured fault is
    /// then re-raised as the error.
    pub fn run<A: Application>(self, application: A) -> Result<()> {
        let Host {
            config,
            platform,
            update_hooks,
            mut scheduler,
            handle,
        } = self;

        let application = Arc::new(Mutex::new(application));
        let platform = Arc::new(Mutex::new(platform));
        let update_rate = rate(config.updates_per_second);
        let render_rate = rate(config.frames_per_second);

        // Main context: platform event pump plus deferred resource work
        // (everything dispatched onto it runs here, on its thread).
        let main_context = {
            let platform = Arc::clone(&platform);
            let scheduler_handle = handle.clone();
            ExecutionContext::new(
                "main",
                update_rate,
                Box::new(move |_elapsed| {
                    match platform.lock().unwrap().pump_events()? {
                        PumpOutcome::Continue => {}
                        PumpOutcome::Exit => {
                            log::info!("Platform requested exit.");
                            scheduler_handle.exit();
                        }
                    }
                    Ok(())
                }),
            )
        };
        let main_handle = main_context.handle();
        scheduler.add(main_context)?;

        // Update context: registered subsystem hooks first, then the
        // application's own update.
        let update_context = {
            let application = Arc::clone(&application);
            let mut hooks = update_hooks;
            ExecutionContext::new(
                "update",
                update_rate,
                Box::new(move |elapsed| {
                    for hook in hooks.iter_mut() {
                        hook(elapsed)?;
                    }
                    application.lock().unwrap().update(elapsed)
                }),
            )
        };
        scheduler.add(update_context)?;

        let render_context = {
            let application = Arc::clone(&application);
            ExecutionContext::new(
                "render",
                render_rate,
                Box::new(move |elapsed| application.lock().unwrap().render(elapsed)),
            )
        };
        scheduler.add(render_context)?;

        // Seed the main context: the platform owns window/surface creation,
        // so it initializes before the application loads.
        {
            let platform = Arc::clone(&platform);
            main_handle.dispatch(Box::new(move || platform.lock().unwrap().initialize()));
        }
        {
            let application = Arc::clone(&application);
            main_handle.dispatch(Box::new(move || application.lock().unwrap().load()));
        }

        log::info!(
            "Host starting ({:?}, update {} Hz, render {} Hz).",
            config.execution_mode,
            config.updates_per_second,
            config.frames_per_second
        );
        let outcome = scheduler.run();

        // Teardown has fully completed by now; unload runs regardless of the
        // outcome, even when a faulting callback poisoned the lock.
        match application.lock() {
            Ok(mut application) => application.unload(),
            Err(poisoned) => poisoned.into_inner().unload(),
        }

        match outcome {
            Ok(()) => Ok(()),
            Err(SchedulerError::Faulted(fault)) => {
                let context = fault.context().to_string();
                Err(fault
                    .into_cause()
                    .context(format!("context '{context}' faulted")))
            }
            Err(other) => Err(anyhow::Error::new(other)),
        }
    }
}

/// Cloneable control surface for a host whose `run` is blocking another
/// thread.
#[derive(Clone)]
pub struct HostHandle {
    scheduler: SchedulerHandle,
}

impl HostHandle {
    /// Requests shutdown. Non-blocking, idempotent.
    pub fn exit(&self) {
        self.scheduler.exit();
    }

    /// Point-in-time liveness of the underlying scheduler.
    pub fn is_running(&self) -> bool {
        self.scheduler.is_running()
    }
}

fn rate(hz: u32) -> Option<f64> {
    (hz > 0).then(|| f64::from(hz))
}
