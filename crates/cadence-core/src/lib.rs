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

//! Core primitives for the Cadence frame scheduler.
//!
//! This crate holds the leaf building blocks the scheduler is assembled from:
//! a best-effort high-resolution sleep ([`FrameTimer`]), a many-producer /
//! single-consumer action queue ([`DispatchQueue`]), the context lifecycle
//! state machine ([`ExecutionState`] / [`StateCell`]) and the terminal error
//! record a faulting context produces ([`Fault`]). Nothing here spawns a
//! thread; threading lives in `cadence-runtime`.

pub mod dispatch;
pub mod fault;
pub mod state;
pub mod timer;

pub use dispatch::{Action, DispatchQueue};
pub use fault::Fault;
pub use state::{ExecutionState, StateCell};
pub use timer::FrameTimer;
