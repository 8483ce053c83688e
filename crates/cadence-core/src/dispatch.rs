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

//! Many-producer / single-consumer queue of deferred actions.

use std::fmt;
use std::sync::Mutex;

/// A deferred, fallible, zero-argument unit of work.
///
/// An `Err` return is treated by the draining context as a fault attributable
/// to itself, so producers should only surface errors they consider terminal.
pub type Action = Box<dyn FnOnce() -> anyhow::Result<()> + Send + 'static>;

/// Unbounded FIFO of [`Action`]s owned by exactly one execution context.
///
/// Any thread may [`enqueue`](DispatchQueue::enqueue), including the owner
/// itself (re-entrant dispatch); only the owner may
/// [`drain`](DispatchQueue::drain). A drain swaps out the entire backlog, so
/// actions enqueued while a batch executes become visible to the *next*
/// drain, never the one in flight.
#[derive(Default)]
pub struct DispatchQueue {
    pending: Mutex<Vec<Action>>,
}

impl DispatchQueue {
    /// Creates an empty queue.
    pub fn new() -> Self {
        Self {
            pending: Mutex::new(Vec::new()),
        }
    }

    /// Appends `action` in FIFO position. Safe from any thread.
    pub fn enqueue(&self, action: Action) {
        self.pending.lock().unwrap().push(action);
    }

    /// Atomically takes the entire backlog, leaving the queue empty.
    ///
    /// The queue never executes actions itself; the caller runs them.
    pub fn drain(&self) -> Vec<Action> {
        std::mem::take(&mut *self.pending.lock().unwrap())
    }

    /// Number of actions currently queued.
    pub fn len(&self) -> usize {
        self.pending.lock().unwrap().len()
    }

    /// True when no actions are queued.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Debug for DispatchQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DispatchQueue")
            .field("pending", &self.len())
            .finish()
    }
}
