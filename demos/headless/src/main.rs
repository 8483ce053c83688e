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

// Cadence headless demo
// Runs the three-context host for a couple of seconds without any windowing
// backend, then exits gracefully. Pass a JSON config path as the first
// argument to override the defaults, e.g. `{ "execution_mode": "Cooperative" }`.

use anyhow::Result;
use cadence_sdk::{Application, Host, HostConfig};
use std::thread;
use std::time::Duration;

#[derive(Default)]
struct DemoApp {
    updates: u64,
    frames: u64,
}

impl Application for DemoApp {
    fn load(&mut self) -> Result<()> {
        log::info!("Demo loaded.");
        Ok(())
    }

    fn update(&mut self, _elapsed: Duration) -> Result<()> {
        self.updates += 1;
        Ok(())
    }

    fn render(&mut self, _elapsed: Duration) -> Result<()> {
        self.frames += 1;
        Ok(())
    }

    fn unload(&mut self) {
        log::info!(
            "Demo unloaded after {} updates and {} frames.",
            self.updates,
            self.frames
        );
    }
}

fn main() -> Result<()> {
    env_logger::init();

    let config: HostConfig = match std::env::args().nth(1) {
        Some(path) => serde_json::from_str(&std::fs::read_to_string(&path)?)?,
        None => HostConfig::default(),
    };

    let host = Host::new(config);
    let handle = host.handle();
    thread::spawn(move || {
        thread::sleep(Duration::from_secs(2));
        log::info!("Demo time is up; requesting exit.");
        handle.exit();
    });

    host.run(DemoApp::default())
}
