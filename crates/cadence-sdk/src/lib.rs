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

//! The public-facing SDK for embedding the Cadence frame scheduler.
//!
//! An embedder implements [`Application`] (and optionally [`Platform`] for a
//! real windowing backend), builds a [`Host`] from a [`HostConfig`], and
//! calls [`Host::run`]. The host wires three execution contexts onto the
//! scheduler: `main` (platform event pump, resource creation), `update` and
//! `render`. It seeds `load()` onto the main context and blocks until
//! everything has exited, propagating the first captured fault.

use anyhow::Result;
use std::time::Duration;

mod config;
mod host;
mod platform;

pub use cadence_runtime::ExecutionMode;
pub use config::HostConfig;
pub use host::{Host, HostHandle, UpdateHook};
pub use platform::{HeadlessPlatform, Platform, PumpOutcome};

/// The lifecycle hooks an embedding application supplies to the host.
///
/// These are plain functions bound at host construction; the scheduler never
/// resolves anything dynamically. Any `Err` returned here is a fault: it
/// stops the context that was executing the hook, tears the whole scheduler
/// down, and surfaces from [`Host::run`].
pub trait Application: Send + 'static {
    /// Called once on the main context, before the first update tick.
    fn load(&mut self) -> Result<()> {
        Ok(())
    }

    /// Called every update tick with the elapsed time since the previous
    /// update tick (zero on the first).
    fn update(&mut self, elapsed: Duration) -> Result<()>;

    /// Called every render tick with the elapsed time since the previous
    /// render tick (zero on the first).
    fn render(&mut self, elapsed: Duration) -> Result<()>;

    /// Called once after every context has exited, regardless of whether the
    /// run ended gracefully or with a fault.
    fn unload(&mut self) {}
}
