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

//! Platform-abstracted, best-effort high-resolution sleep.

use std::time::Duration;

/// A reusable sleep primitive used to pace tick loops.
///
/// The backend is selected once at construction: a hybrid sleep/spin strategy
/// with sub-millisecond accuracy where the platform supports it, a plain
/// `std::thread::sleep` otherwise. Falling back is a silent degradation, not
/// an error; callers only ever see [`FrameTimer::wait`].
#[derive(Debug)]
pub struct FrameTimer {
    backend: Backend,
}

#[derive(Debug)]
enum Backend {
    /// Hybrid sleep/spin with sub-millisecond accuracy.
    Precise(spin_sleep::SpinSleeper),
    /// Plain OS sleep; granularity is whatever the platform scheduler gives.
    Coarse,
}

impl FrameTimer {
    /// Creates a timer, preferring the high-resolution backend.
    pub fn new() -> Self {
        match Self::precise_backend() {
            Some(sleeper) => Self {
                backend: Backend::Precise(sleeper),
            },
            None => {
                log::debug!("High-resolution timer unavailable; using coarse sleep.");
                Self::coarse()
            }
        }
    }

    /// Forces the coarse `thread::sleep` backend.
    ///
    /// Used on platforms without a reliable high-resolution clock and by
    /// tests exercising the degraded path.
    pub fn coarse() -> Self {
        Self {
            backend: Backend::Coarse,
        }
    }

    #[cfg(any(target_os = "linux", target_os = "macos", target_os = "windows"))]
    fn precise_backend() -> Option<spin_sleep::SpinSleeper> {
        Some(spin_sleep::SpinSleeper::default())
    }

    #[cfg(not(any(target_os = "linux", target_os = "macos", target_os = "windows")))]
    fn precise_backend() -> Option<spin_sleep::SpinSleeper> {
        None
    }

    /// Blocks the calling thread for at least `duration`, never indefinitely.
    ///
    /// `Duration::ZERO` returns immediately. `Duration` is unsigned, so a
    /// would-be negative budget cannot be expressed; pacing callers compute
    /// the remainder with `saturating_sub`, which lands here as zero.
    pub fn wait(&self, duration: Duration) {
        if duration.is_zero() {
            return;
        }
        match &self.backend {
            Backend::Precise(sleeper) => sleeper.sleep(duration),
            Backend::Coarse => std::thread::sleep(duration),
        }
    }
}

impl Default for FrameTimer {
    fn default() -> Self {
        Self::new()
    }
}
