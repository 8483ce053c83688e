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

//! Terminal error record produced by a faulting execution context.

use std::fmt;
use std::time::Instant;

/// An unrecovered error raised inside a context's per-tick callback or a
/// dispatched action.
///
/// A fault is terminal for the context it names. The first fault a scheduler
/// records becomes the primary cause reported from its `run`; later faults
/// are retained as suppressed secondaries and do not change the reported
/// cause.
#[derive(Debug)]
pub struct Fault {
    context: String,
    cause: anyhow::Error,
    at: Instant,
}

impl Fault {
    /// Records a fault attributed to `context`, stamped with the current time.
    pub fn new(context: impl Into<String>, cause: anyhow::Error) -> Self {
        Self {
            context: context.into(),
            cause,
            at: Instant::now(),
        }
    }

    /// Name of the context that was executing when the error was raised.
    pub fn context(&self) -> &str {
        &self.context
    }

    /// The underlying error.
    pub fn cause(&self) -> &anyhow::Error {
        &self.cause
    }

    /// When the fault was captured. Only useful for ordering faults relative
    /// to each other.
    pub fn at(&self) -> Instant {
        self.at
    }

    /// Consumes the fault, returning the underlying error.
    pub fn into_cause(self) -> anyhow::Error {
        self.cause
    }
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "context '{}' faulted: {:#}", self.context, self.cause)
    }
}

impl std::error::Error for Fault {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        let cause: &(dyn std::error::Error + 'static) = self.cause.as_ref();
        Some(cause)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn display_names_the_context_and_cause() {
        let fault = Fault::new("update", anyhow::anyhow!("simulation blew up"));
        assert_eq!(
            format!("{fault}"),
            "context 'update' faulted: simulation blew up"
        );
    }

    #[test]
    fn source_exposes_the_underlying_error() {
        let fault = Fault::new("render", anyhow::anyhow!("lost the surface"));
        let source = fault.source().expect("fault should carry a source");
        assert_eq!(format!("{source}"), "lost the surface");
    }

    #[test]
    fn into_cause_preserves_the_error_chain() {
        let cause = anyhow::anyhow!("root").context("wrapped");
        let fault = Fault::new("main", cause);
        let recovered = fault.into_cause();
        assert_eq!(format!("{}", recovered.root_cause()), "root");
    }
}
