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

//! Host configuration.

use cadence_runtime::ExecutionMode;
use serde::{Deserialize, Serialize};

/// Options recognized by [`Host::new`](crate::Host::new).
///
/// Serde-derived so embedders can load it from a JSON manifest; every field
/// falls back to its default when absent. A rate of `0` means unthrottled.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HostConfig {
    /// Independent worker threads per context (`Concurrent`, the default) or
    /// a single interleaved loop on the caller's thread (`Cooperative`, for
    /// headless/test hosts).
    pub execution_mode: ExecutionMode,
    /// Target update-context rate in Hz.
    pub updates_per_second: u32,
    /// Target render-context rate in Hz.
    pub frames_per_second: u32,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            execution_mode: ExecutionMode::Concurrent,
            updates_per_second: 240,
            frames_per_second: 120,
        }
    }
}
