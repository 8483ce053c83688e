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

//! The windowing/event backend as seen by the scheduler core.

use anyhow::Result;

/// Outcome of one platform event pump.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PumpOutcome {
    /// Keep running.
    Continue,
    /// The platform asked the application to close (window close button,
    /// terminal signal, ...). The host translates this into a scheduler
    /// exit request.
    Exit,
}

/// Minimal contract a windowing/input backend presents to the host.
///
/// Real backends (winit, SDL, ...) live outside this crate; the host only
/// needs to initialize one once on the main context and pump its events on
/// every main tick. Backend internals never leak into the scheduler's
/// contract.
pub trait Platform: Send + 'static {
    /// One-time setup, dispatched onto the main context before `load`.
    /// Window/surface construction belongs here.
    fn initialize(&mut self) -> Result<()> {
        Ok(())
    }

    /// Processes pending platform events. Invoked on every main-context tick.
    fn pump_events(&mut self) -> Result<PumpOutcome>;
}

/// Platform used by headless hosts and tests: nothing to pump, never asks to
/// exit.
#[derive(Debug, Default)]
pub struct HeadlessPlatform;

impl Platform for HeadlessPlatform {
    fn pump_events(&mut self) -> Result<PumpOutcome> {
        Ok(PumpOutcome::Continue)
    }
}
