// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use super::support::run_to_completion;
use crate::{BindCtx, BindError, Config, Handle, Powerplant, Word, reactor_fn, startup};
use pretty_assertions::assert_eq;
use std::{sync::{Arc,
                 atomic::{AtomicU32, Ordering}},
          time::Duration};

/// A provider word with its own `fetch`: triggered by `u32` emits but always
/// supplying a shared 5, whatever value was emitted.
struct FixedFive;

impl Word for FixedFive {
    type Args = Arc<u32>;

    fn bind(&self, ctx: &mut BindCtx<'_>) -> Result<(), BindError> {
        ctx.subscribe::<u32>()
    }

    fn fetch(&self, _handle: &Handle) -> Option<Arc<u32>> { Some(Arc::new(5)) }
}

#[test]
fn custom_get_words_supply_their_own_value() {
    let plant = Powerplant::new(Config { worker_threads: 1, network: None }).unwrap();
    let received = Arc::new(AtomicU32::new(0));

    {
        let received = Arc::clone(&received);
        plant
            .install(reactor_fn("custom", move |setup| {
                {
                    let received = Arc::clone(&received);
                    setup.on(FixedFive).then("observe", move |ctx, value: Arc<u32>| {
                        received.store(*value, Ordering::SeqCst);
                        ctx.shutdown();
                    })?;
                }
                setup
                    .on(startup())
                    .then("kick", move |ctx, _startup| ctx.emit(10_u32))?;
                Ok(())
            }))
            .unwrap();
    }

    run_to_completion(plant, Duration::from_secs(10));
    // The emit of 10 scheduled the reaction; the word supplied 5.
    assert_eq!(received.load(Ordering::SeqCst), 5);
}
