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

//! Execution contexts and the scheduler that drives them.
//!
//! An [`ExecutionContext`] is one named, independently paced tick loop; the
//! [`Scheduler`] owns an ordered set of them and runs them either on
//! dedicated OS threads (concurrent mode) or interleaved on the caller's
//! thread (cooperative mode, for headless and deterministic hosts). Faults
//! raised inside any context flow back over a channel and surface from
//! [`Scheduler::run`] once teardown has completed.

pub mod context;
pub mod error;
pub mod scheduler;

pub use cadence_core::{Action, ExecutionState, Fault};
pub use context::{ContextHandle, ExecutionContext, TickFn};
pub use error::SchedulerError;
pub use scheduler::{ExecutionMode, Scheduler, SchedulerHandle};
