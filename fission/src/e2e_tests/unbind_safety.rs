// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use super::support::{spawn_plant, wait_until};
use crate::{Config, Powerplant, ReactionHandle, reactor_fn, trigger};
use pretty_assertions::assert_eq;
use std::{sync::{Arc, Mutex,
                 atomic::{AtomicU32, Ordering}},
          time::Duration};

#[derive(Debug)]
struct Nudge;

/// After unbinding, no further task for the reaction starts - even though the
/// trigger keeps being emitted.
#[test]
fn unbound_reactions_receive_nothing_further() {
    let plant = Powerplant::new(Config { worker_threads: 2, network: None }).unwrap();
    let fires = Arc::new(AtomicU32::new(0));
    let bound: Arc<Mutex<Option<ReactionHandle>>> = Arc::new(Mutex::new(None));

    {
        let fires = Arc::clone(&fires);
        let bound = Arc::clone(&bound);
        plant
            .install(reactor_fn("ephemeral", move |setup| {
                let fires = Arc::clone(&fires);
                let handle = setup.on(trigger::<Nudge>()).then("count", move |_ctx, _nudge| {
                    fires.fetch_add(1, Ordering::SeqCst);
                })?;
                *bound.lock().unwrap() = Some(handle);
                Ok(())
            }))
            .unwrap();
    }

    let (thread, handle) = spawn_plant(plant);

    handle.emit(Nudge);
    assert!(
        wait_until(Duration::from_secs(5), || fires.load(Ordering::SeqCst) == 1),
        "reaction never fired while bound"
    );

    bound.lock().unwrap().as_ref().unwrap().unbind();
    handle.emit(Nudge);
    std::thread::sleep(Duration::from_millis(100));
    assert_eq!(fires.load(Ordering::SeqCst), 1);

    handle.shutdown();
    thread.join().unwrap();
}

/// Disable/enable is the reversible form of the same guarantee.
#[test]
fn disabled_reactions_skip_until_reenabled() {
    let plant = Powerplant::new(Config { worker_threads: 2, network: None }).unwrap();
    let fires = Arc::new(AtomicU32::new(0));
    let bound: Arc<Mutex<Option<ReactionHandle>>> = Arc::new(Mutex::new(None));

    {
        let fires = Arc::clone(&fires);
        let bound = Arc::clone(&bound);
        plant
            .install(reactor_fn("toggled", move |setup| {
                let fires = Arc::clone(&fires);
                let handle = setup.on(trigger::<Nudge>()).then("count", move |_ctx, _nudge| {
                    fires.fetch_add(1, Ordering::SeqCst);
                })?;
                *bound.lock().unwrap() = Some(handle);
                Ok(())
            }))
            .unwrap();
    }

    let (thread, handle) = spawn_plant(plant);
    let reaction = bound.lock().unwrap().clone().unwrap();

    reaction.disable();
    handle.emit(Nudge);
    std::thread::sleep(Duration::from_millis(50));
    assert_eq!(fires.load(Ordering::SeqCst), 0);

    reaction.enable();
    handle.emit(Nudge);
    assert!(
        wait_until(Duration::from_secs(5), || fires.load(Ordering::SeqCst) == 1),
        "reaction did not fire after re-enable"
    );

    handle.shutdown();
    thread.join().unwrap();
}
