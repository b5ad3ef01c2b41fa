// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use super::support::run_to_completion;
use crate::{Config, Powerplant, reactor_fn, shutdown, startup};
use pretty_assertions::assert_eq;
use std::{sync::{Arc,
                 atomic::{AtomicBool, AtomicU32, Ordering}},
          time::Duration};

#[test]
fn startup_fires_once_and_start_returns_after_shutdown() {
    let plant = Powerplant::new(Config { worker_threads: 2, network: None }).unwrap();
    let startups = Arc::new(AtomicU32::new(0));
    let shutdowns = Arc::new(AtomicU32::new(0));

    {
        let startups = Arc::clone(&startups);
        let shutdowns = Arc::clone(&shutdowns);
        plant
            .install(reactor_fn("lifecycle", move |setup| {
                {
                    let startups = Arc::clone(&startups);
                    setup.on(startup()).then("begin", move |ctx, _startup| {
                        startups.fetch_add(1, Ordering::SeqCst);
                        ctx.shutdown();
                    })?;
                }
                {
                    let shutdowns = Arc::clone(&shutdowns);
                    setup.on(shutdown()).then("end", move |_ctx, _shutdown| {
                        shutdowns.fetch_add(1, Ordering::SeqCst);
                    })?;
                }
                Ok(())
            }))
            .unwrap();
    }

    run_to_completion(plant, Duration::from_secs(10));
    assert_eq!(startups.load(Ordering::SeqCst), 1);
    assert_eq!(shutdowns.load(Ordering::SeqCst), 1);
}

#[test]
fn start_returns_only_after_running_tasks_drain() {
    let plant = Powerplant::new(Config { worker_threads: 1, network: None }).unwrap();
    let drained = Arc::new(AtomicBool::new(false));

    {
        let drained = Arc::clone(&drained);
        plant
            .install(reactor_fn("slow", move |setup| {
                let drained = Arc::clone(&drained);
                setup.on(startup()).then("work then stop", move |ctx, _startup| {
                    ctx.shutdown();
                    // Still inside a running task: shutdown must wait for us.
                    std::thread::sleep(Duration::from_millis(200));
                    drained.store(true, Ordering::SeqCst);
                })?;
                Ok(())
            }))
            .unwrap();
    }

    run_to_completion(plant, Duration::from_secs(10));
    assert!(drained.load(Ordering::SeqCst));
}
