// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use super::support::run_to_completion;
use crate::{Config, Powerplant, reactor_fn, startup, trigger};
use pretty_assertions::assert_eq;
use std::{sync::{Arc,
                 atomic::{AtomicU32, Ordering}},
          time::Duration};

#[derive(Debug)]
struct Poke;

/// A panicking callback is captured; the worker survives and later tasks on the
/// same reaction still run.
#[test]
fn tasks_after_a_panic_still_run() {
    let plant = Powerplant::new(Config { worker_threads: 1, network: None }).unwrap();
    let attempts = Arc::new(AtomicU32::new(0));

    {
        let attempts = Arc::clone(&attempts);
        plant
            .install(reactor_fn("flaky", move |setup| {
                {
                    let attempts = Arc::clone(&attempts);
                    setup.on(trigger::<Poke>()).then("maybe panic", move |ctx, _poke| {
                        if attempts.fetch_add(1, Ordering::SeqCst) == 0 {
                            panic!("first poke panics");
                        }
                        ctx.shutdown();
                    })?;
                }
                setup.on(startup()).then("poke twice", move |ctx, _startup| {
                    ctx.emit(Poke);
                    ctx.emit(Poke);
                })?;
                Ok(())
            }))
            .unwrap();
    }

    run_to_completion(plant, Duration::from_secs(10));
    assert_eq!(attempts.load(Ordering::SeqCst), 2);
}
