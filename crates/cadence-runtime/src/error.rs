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

//! Errors surfaced by scheduler configuration and execution.

use cadence_core::Fault;
use std::fmt;

/// An error returned by [`Scheduler`](crate::Scheduler) operations.
///
/// Configuration errors (`DuplicateContext`, `ContextListFrozen`,
/// `AlreadyRunning`) are rejected immediately at the offending call, before
/// any context is disturbed. `Faulted` is only produced by `run`, and only
/// after teardown has fully completed.
#[derive(Debug)]
pub enum SchedulerError {
    /// A context with the same name is already registered.
    DuplicateContext(String),
    /// `add` was called after `run` froze the context list.
    ContextListFrozen,
    /// `run` was called while a run was already in flight, or on a scheduler
    /// whose single run has already been consumed.
    AlreadyRunning,
    /// A context faulted; this carries the first (primary) fault.
    Faulted(Fault),
}

impl fmt::Display for SchedulerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchedulerError::DuplicateContext(name) => {
                write!(f, "a context named '{name}' is already registered")
            }
            SchedulerError::ContextListFrozen => {
                write!(f, "contexts cannot be added once the scheduler has started")
            }
            SchedulerError::AlreadyRunning => {
                write!(f, "the scheduler is already running or has already run")
            }
            SchedulerError::Faulted(fault) => write!(f, "{fault}"),
        }
    }
}

impl std::error::Error for SchedulerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SchedulerError::Faulted(fault) => Some(fault),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn display_for_configuration_errors() {
        assert_eq!(
            format!("{}", SchedulerError::DuplicateContext("render".into())),
            "a context named 'render' is already registered"
        );
        assert_eq!(
            format!("{}", SchedulerError::ContextListFrozen),
            "contexts cannot be added once the scheduler has started"
        );
    }

    #[test]
    fn faulted_exposes_the_fault_as_source() {
        let error = SchedulerError::Faulted(Fault::new("update", anyhow::anyhow!("oops")));
        assert!(format!("{error}").contains("context 'update' faulted"));
        assert!(error.source().is_some());
    }
}
