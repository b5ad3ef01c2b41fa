// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Shared plumbing: run a plant on a background thread with a watchdog so a broken
//! runtime fails the test instead of hanging it.

use crate::plant::{Handle, Powerplant};
use std::{sync::mpsc, thread::JoinHandle, time::{Duration, Instant}};

/// Runs `start()` to completion, failing the test if it takes longer than
/// `timeout`. Use when the installed reactors drive their own shutdown.
pub fn run_to_completion(plant: Powerplant, timeout: Duration) {
    let (done_tx, done_rx) = mpsc::channel();
    let thread = std::thread::spawn(move || {
        let mut plant = plant;
        plant.start().unwrap();
        done_tx.send(()).ok();
    });
    done_rx
        .recv_timeout(timeout)
        .expect("plant did not shut down within the watchdog timeout");
    thread.join().unwrap();
}

/// Starts the plant on a background thread and waits until it reports running.
/// The caller orchestrates emits/shutdown through the returned handle and then
/// joins.
pub fn spawn_plant(plant: Powerplant) -> (JoinHandle<()>, Handle) {
    let handle = plant.handle();
    let thread = std::thread::spawn(move || {
        let mut plant = plant;
        plant.start().unwrap();
    });
    assert!(
        wait_until(Duration::from_secs(5), || handle.is_running()),
        "plant did not reach the running state"
    );
    (thread, handle)
}

/// Polls `condition` until it holds or `timeout` elapses.
pub fn wait_until(timeout: Duration, condition: impl Fn() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(1));
    }
    condition()
}
