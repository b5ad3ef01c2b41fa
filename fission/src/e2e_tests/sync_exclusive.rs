// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use super::support::{spawn_plant, wait_until};
use crate::{Config, Powerplant, reactor_fn, trigger};
use pretty_assertions::assert_eq;
use std::{sync::{Arc,
                 atomic::{AtomicU32, Ordering}},
          time::Duration};

#[derive(Debug)]
struct Work;

const PRODUCERS: usize = 10;
const EMITS_PER_PRODUCER: usize = 20;

/// Two reactions share one sync group; ten producer threads hammer their trigger.
/// Instrumentation counts overlapping executions across BOTH reactions - the group
/// admits one task at a time, so any overlap is a violation.
#[test]
fn sync_group_members_never_overlap() {
    struct Exclusive;

    let plant = Powerplant::new(Config { worker_threads: 4, network: None }).unwrap();
    let in_flight = Arc::new(AtomicU32::new(0));
    let overlaps = Arc::new(AtomicU32::new(0));
    let completed = Arc::new(AtomicU32::new(0));

    let body = {
        let in_flight = Arc::clone(&in_flight);
        let overlaps = Arc::clone(&overlaps);
        let completed = Arc::clone(&completed);
        move || {
            if in_flight.fetch_add(1, Ordering::SeqCst) != 0 {
                overlaps.fetch_add(1, Ordering::SeqCst);
            }
            std::thread::sleep(Duration::from_micros(100));
            in_flight.fetch_sub(1, Ordering::SeqCst);
            completed.fetch_add(1, Ordering::SeqCst);
        }
    };

    {
        let body_a = body.clone();
        let body_b = body;
        plant
            .install(reactor_fn("contenders", move |setup| {
                {
                    let body = body_a.clone();
                    setup
                        .on(trigger::<Work>())
                        .sync::<Exclusive>()
                        .then("left", move |_ctx, _work| body())?;
                }
                let body = body_b.clone();
                setup
                    .on(trigger::<Work>())
                    .sync::<Exclusive>()
                    .then("right", move |_ctx, _work| body())?;
                Ok(())
            }))
            .unwrap();
    }

    let (thread, handle) = spawn_plant(plant);

    let producers: Vec<_> = (0..PRODUCERS)
        .map(|_| {
            let handle = handle.clone();
            std::thread::spawn(move || {
                for _ in 0..EMITS_PER_PRODUCER {
                    handle.emit(Work);
                }
            })
        })
        .collect();
    for producer in producers {
        producer.join().unwrap();
    }

    let expected = (PRODUCERS * EMITS_PER_PRODUCER * 2) as u32;
    assert!(
        wait_until(Duration::from_secs(30), || {
            completed.load(Ordering::SeqCst) == expected
        }),
        "only {} of {expected} tasks completed",
        completed.load(Ordering::SeqCst)
    );

    handle.shutdown();
    thread.join().unwrap();

    assert_eq!(overlaps.load(Ordering::SeqCst), 0, "sync exclusivity violated");
    assert_eq!(completed.load(Ordering::SeqCst), expected);
}
