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

//! Lifecycle state machine shared between a context's worker and observers.

use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};

/// Lifecycle of an execution context.
///
/// Transitions are strictly forward:
/// `Idle → Starting → Running → Exiting → Exited`. A context observed as
/// [`Exited`](ExecutionState::Exited) never resumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum ExecutionState {
    /// Created, not yet started.
    Idle = 0,
    /// Start requested; the worker is attaching but has not ticked yet.
    Starting = 1,
    /// At least one tick completed successfully.
    Running = 2,
    /// Stop requested or fault captured; winding down at the next boundary.
    Exiting = 3,
    /// Terminal. The worker is gone and the context will never tick again.
    Exited = 4,
}

impl ExecutionState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => ExecutionState::Idle,
            1 => ExecutionState::Starting,
            2 => ExecutionState::Running,
            3 => ExecutionState::Exiting,
            _ => ExecutionState::Exited,
        }
    }
}

impl fmt::Display for ExecutionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ExecutionState::Idle => "Idle",
            ExecutionState::Starting => "Starting",
            ExecutionState::Running => "Running",
            ExecutionState::Exiting => "Exiting",
            ExecutionState::Exited => "Exited",
        };
        write!(f, "{name}")
    }
}

/// Atomic cell holding an [`ExecutionState`].
///
/// Shared between the owning worker, the scheduler's orchestration thread and
/// arbitrary `is_running` callers, so reads are lock-free and
/// [`advance`](StateCell::advance) is monotonic: the state never moves
/// backward, which makes concurrent stop requests and worker-side transitions
/// commute.
#[derive(Debug)]
pub struct StateCell(AtomicU8);

impl StateCell {
    /// Creates a cell in the [`Idle`](ExecutionState::Idle) state.
    pub fn new() -> Self {
        Self(AtomicU8::new(ExecutionState::Idle as u8))
    }

    /// Current state.
    pub fn get(&self) -> ExecutionState {
        ExecutionState::from_u8(self.0.load(Ordering::Acquire))
    }

    /// Advances to `to` if that is a forward transition, otherwise leaves the
    /// cell untouched. Returns the state held before the call.
    pub fn advance(&self, to: ExecutionState) -> ExecutionState {
        let mut current = self.0.load(Ordering::Acquire);
        loop {
            if current >= to as u8 {
                return ExecutionState::from_u8(current);
            }
            match self.0.compare_exchange_weak(
                current,
                to as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(previous) => return ExecutionState::from_u8(previous),
                Err(actual) => current = actual,
            }
        }
    }
}

impl Default for StateCell {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn new_cell_is_idle() {
        assert_eq!(StateCell::new().get(), ExecutionState::Idle);
    }

    #[test]
    fn advance_walks_the_chain_forward() {
        let cell = StateCell::new();
        assert_eq!(cell.advance(ExecutionState::Starting), ExecutionState::Idle);
        assert_eq!(
            cell.advance(ExecutionState::Running),
            ExecutionState::Starting
        );
        assert_eq!(
            cell.advance(ExecutionState::Exiting),
            ExecutionState::Running
        );
        assert_eq!(cell.advance(ExecutionState::Exited), ExecutionState::Exiting);
        assert_eq!(cell.get(), ExecutionState::Exited);
    }

    #[test]
    fn advance_never_moves_backward() {
        let cell = StateCell::new();
        cell.advance(ExecutionState::Exiting);
        cell.advance(ExecutionState::Running);
        assert_eq!(cell.get(), ExecutionState::Exiting);

        cell.advance(ExecutionState::Exited);
        cell.advance(ExecutionState::Idle);
        assert_eq!(cell.get(), ExecutionState::Exited);
    }

    #[test]
    fn concurrent_advances_settle_on_the_furthest_state() {
        let cell = Arc::new(StateCell::new());
        let handles: Vec<_> = [
            ExecutionState::Starting,
            ExecutionState::Running,
            ExecutionState::Exiting,
        ]
        .into_iter()
        .map(|state| {
            let cell = Arc::clone(&cell);
            thread::spawn(move || {
                cell.advance(state);
            })
        })
        .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(cell.get(), ExecutionState::Exiting);
    }
}
