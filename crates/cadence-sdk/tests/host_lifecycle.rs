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

//! End-to-end host scenarios: lifecycle, fault propagation, hooks, platform
//! integration.

use anyhow::Result;
use cadence_sdk::{
    Application, ExecutionMode, Host, HostConfig, Platform, PumpOutcome,
};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

/// Counts hook invocations and records lifecycle milestones.
#[derive(Default)]
struct Probe {
    updates: Arc<AtomicUsize>,
    renders: Arc<AtomicUsize>,
    loaded: Arc<AtomicBool>,
    unloaded: Arc<AtomicBool>,
}

struct ProbeApp {
    probe: Probe,
    fail_load: bool,
    fail_update_after: Option<usize>,
}

impl ProbeApp {
    fn new(probe: Probe) -> Self {
        Self {
            probe,
            fail_load: false,
            fail_update_after: None,
        }
    }
}

impl Application for ProbeApp {
    fn load(&mut self) -> Result<()> {
        if self.fail_load {
            anyhow::bail!("load failed");
        }
        self.probe.loaded.store(true, Ordering::Relaxed);
        Ok(())
    }

    fn update(&mut self, _elapsed: Duration) -> Result<()> {
        let count = self.probe.updates.fetch_add(1, Ordering::Relaxed);
        if let Some(limit) = self.fail_update_after {
            if count >= limit {
                anyhow::bail!("update failed");
            }
        }
        Ok(())
    }

    fn render(&mut self, _elapsed: Duration) -> Result<()> {
        self.probe.renders.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn unload(&mut self) {
        self.probe.unloaded.store(true, Ordering::Relaxed);
    }
}

#[test]
fn concurrent_host_runs_and_exits_on_request() {
    // Scenario: default 240/120 Hz concurrent host, started asynchronously,
    // observed mid-flight, then asked to exit.
    let probe = Probe::default();
    let updates = Arc::clone(&probe.updates);
    let renders = Arc::clone(&probe.renders);
    let loaded = Arc::clone(&probe.loaded);
    let unloaded = Arc::clone(&probe.unloaded);

    let host = Host::new(HostConfig::default());
    let handle = host.handle();
    let runner = thread::spawn(move || host.run(ProbeApp::new(probe)));

    thread::sleep(Duration::from_millis(400));
    assert!(handle.is_running());

    handle.exit();
    thread::sleep(Duration::from_millis(400));
    assert!(!handle.is_running());

    runner.join().unwrap().unwrap();
    assert!(loaded.load(Ordering::Relaxed));
    assert!(unloaded.load(Ordering::Relaxed));
    assert!(updates.load(Ordering::Relaxed) > 0);
    assert!(renders.load(Ordering::Relaxed) > 0);
}

#[test]
fn load_fault_on_the_main_context_surfaces_from_run() {
    let probe = Probe::default();
    let unloaded = Arc::clone(&probe.unloaded);

    let host = Host::new(HostConfig::default());
    let handle = host.handle();
    let mut app = ProbeApp::new(probe);
    app.fail_load = true;

    let error = host.run(app).expect_err("load fault should propagate");
    assert_eq!(format!("{}", error.root_cause()), "load failed");
    assert!(format!("{error:#}").contains("context 'main' faulted"));

    assert!(!handle.is_running());
    // Teardown completed fully before the error surfaced.
    assert!(unloaded.load(Ordering::Relaxed));
}

#[test]
fn update_fault_on_a_secondary_context_surfaces_from_run() {
    let probe = Probe::default();
    let renders = Arc::clone(&probe.renders);
    let unloaded = Arc::clone(&probe.unloaded);

    let host = Host::new(HostConfig::default());
    let handle = host.handle();
    let mut app = ProbeApp::new(probe);
    app.fail_update_after = Some(10);

    let error = host.run(app).expect_err("update fault should propagate");
    assert_eq!(format!("{}", error.root_cause()), "update failed");
    assert!(format!("{error:#}").contains("context 'update' faulted"));

    assert!(!handle.is_running());
    assert!(unloaded.load(Ordering::Relaxed));
    // Render kept ticking until the ordered teardown reached it.
    assert!(renders.load(Ordering::Relaxed) > 0);
}

#[test]
fn cooperative_host_drives_the_same_lifecycle_without_threads_per_context() {
    let probe = Probe::default();
    let updates = Arc::clone(&probe.updates);
    let loaded = Arc::clone(&probe.loaded);

    let config = HostConfig {
        execution_mode: ExecutionMode::Cooperative,
        ..HostConfig::default()
    };
    let host = Host::new(config);
    let handle = host.handle();

    let stopper = {
        let handle = handle.clone();
        thread::spawn(move || {
            thread::sleep(Duration::from_millis(200));
            handle.exit();
        })
    };
    host.run(ProbeApp::new(probe)).unwrap();
    stopper.join().unwrap();

    assert!(loaded.load(Ordering::Relaxed));
    assert!(updates.load(Ordering::Relaxed) > 0);
    assert!(!handle.is_running());
}

#[test]
fn update_hooks_run_in_registration_order_before_the_application() {
    let sequence = Arc::new(Mutex::new(Vec::new()));

    struct SequencingApp {
        sequence: Arc<Mutex<Vec<u8>>>,
    }
    impl Application for SequencingApp {
        fn update(&mut self, _elapsed: Duration) -> Result<()> {
            self.sequence.lock().unwrap().push(3);
            Ok(())
        }
        fn render(&mut self, _elapsed: Duration) -> Result<()> {
            Ok(())
        }
    }

    let mut host = Host::new(HostConfig::default());
    for marker in [1u8, 2u8] {
        let sequence = Arc::clone(&sequence);
        host.add_update_hook(Box::new(move |_| {
            sequence.lock().unwrap().push(marker);
            Ok(())
        }));
    }

    let handle = host.handle();
    let stopper = thread::spawn(move || {
        thread::sleep(Duration::from_millis(150));
        handle.exit();
    });
    host.run(SequencingApp {
        sequence: Arc::clone(&sequence),
    })
    .unwrap();
    stopper.join().unwrap();

    let sequence = sequence.lock().unwrap();
    assert!(!sequence.is_empty());
    assert_eq!(sequence.len() % 3, 0, "hooks and update form whole ticks");
    for tick in sequence.chunks(3) {
        assert_eq!(tick, [1, 2, 3]);
    }
}

#[test]
fn platform_exit_request_shuts_the_host_down() {
    struct CountdownPlatform {
        pumps_before_exit: usize,
        initialized: Arc<AtomicBool>,
    }
    impl Platform for CountdownPlatform {
        fn initialize(&mut self) -> Result<()> {
            self.initialized.store(true, Ordering::Relaxed);
            Ok(())
        }
        fn pump_events(&mut self) -> Result<PumpOutcome> {
            if self.pumps_before_exit == 0 {
                return Ok(PumpOutcome::Exit);
            }
            self.pumps_before_exit -= 1;
            Ok(PumpOutcome::Continue)
        }
    }

    let initialized = Arc::new(AtomicBool::new(false));
    let probe = Probe::default();
    let unloaded = Arc::clone(&probe.unloaded);

    let host = Host::with_platform(
        HostConfig::default(),
        CountdownPlatform {
            pumps_before_exit: 20,
            initialized: Arc::clone(&initialized),
        },
    );
    host.run(ProbeApp::new(probe)).unwrap();

    assert!(initialized.load(Ordering::Relaxed));
    assert!(unloaded.load(Ordering::Relaxed));
}
