// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use super::support::run_to_completion;
use crate::{Config, Powerplant, reactor_fn, startup, trigger};
use pretty_assertions::assert_eq;
use std::{sync::{Arc,
                 atomic::{AtomicU32, Ordering}},
          time::Duration};

#[derive(Debug)]
struct Chore;

/// With zero pool workers, ordinary tasks never run; main-thread tasks still run
/// on the thread inside `start()`.
#[test]
fn zero_workers_still_serve_the_main_thread_queue() {
    let plant = Powerplant::new(Config { worker_threads: 0, network: None }).unwrap();
    let pool_runs = Arc::new(AtomicU32::new(0));
    let main_runs = Arc::new(AtomicU32::new(0));

    {
        let pool_runs = Arc::clone(&pool_runs);
        let main_runs = Arc::clone(&main_runs);
        plant
            .install(reactor_fn("split", move |setup| {
                {
                    let pool_runs = Arc::clone(&pool_runs);
                    setup.on(trigger::<Chore>()).then("pool side", move |_ctx, _chore| {
                        pool_runs.fetch_add(1, Ordering::SeqCst);
                    })?;
                }
                {
                    let main_runs = Arc::clone(&main_runs);
                    setup
                        .on(trigger::<Chore>())
                        .main_thread()
                        .then("main side", move |ctx, _chore| {
                            main_runs.fetch_add(1, Ordering::SeqCst);
                            ctx.shutdown();
                        })?;
                }
                setup
                    .on(startup())
                    .main_thread()
                    .then("kick", move |ctx, _startup| ctx.emit(Chore))?;
                Ok(())
            }))
            .unwrap();
    }

    run_to_completion(plant, Duration::from_secs(10));
    assert_eq!(main_runs.load(Ordering::SeqCst), 1);
    assert_eq!(pool_runs.load(Ordering::SeqCst), 0);
}
