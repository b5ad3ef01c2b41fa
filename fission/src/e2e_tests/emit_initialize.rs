// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use super::support::run_to_completion;
use crate::{Config, Powerplant, reactor_fn, trigger};
use pretty_assertions::assert_eq;
use std::{sync::{Arc,
                 atomic::{AtomicI32, Ordering}},
          time::Duration};

struct StopNow;

/// An `Initialize`-scope emit from `configure` is observed once `start()` begins -
/// not before.
#[test]
fn initialize_emits_deliver_when_start_begins() {
    let plant = Powerplant::new(Config { worker_threads: 1, network: None }).unwrap();
    let observed = Arc::new(AtomicI32::new(0));

    {
        let observed = Arc::clone(&observed);
        plant
            .install(reactor_fn("initialized", move |setup| {
                setup.emit_initialize(5_i32);

                let observed = Arc::clone(&observed);
                setup.on(trigger::<i32>()).then("observe", move |ctx, value: Arc<i32>| {
                    observed.store(*value, Ordering::SeqCst);
                    // The plant is running by now, but keep the stop on its own
                    // event like any well-behaved reaction.
                    ctx.emit(StopNow);
                })?;

                setup
                    .on(trigger::<StopNow>())
                    .then("stop", move |ctx, _stop| ctx.shutdown())?;
                Ok(())
            }))
            .unwrap();
    }

    // Queued, not delivered: nothing has observed the value yet.
    assert_eq!(observed.load(Ordering::SeqCst), 0);

    run_to_completion(plant, Duration::from_secs(10));
    assert_eq!(observed.load(Ordering::SeqCst), 5);
}
