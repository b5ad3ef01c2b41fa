// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use super::support::run_to_completion;
use crate::{Config, Powerplant, TaskStats, reactor_fn, startup, trigger};
use std::{sync::{Arc, Mutex},
          time::Duration};

#[derive(Debug)]
struct Job;

/// Task statistics arrive as a subscribable event stream carrying timing and
/// identity for completed tasks.
#[test]
fn completed_tasks_feed_the_stats_stream() {
    let plant = Powerplant::new(Config { worker_threads: 1, network: None }).unwrap();
    let seen: Arc<Mutex<Vec<TaskStats>>> = Arc::new(Mutex::new(Vec::new()));

    {
        let seen = Arc::clone(&seen);
        plant
            .install(reactor_fn("worker", move |setup| {
                setup.on(trigger::<Job>()).then("work", |_ctx, _job| {
                    std::thread::sleep(Duration::from_millis(5));
                })?;
                setup.on(startup()).then("kick", |ctx, _startup| ctx.emit(Job))?;

                let seen = Arc::clone(&seen);
                setup.on(trigger::<TaskStats>()).then(
                    "observe stats",
                    move |ctx, stats: Arc<TaskStats>| {
                        if stats.label == "work" {
                            seen.lock().unwrap().push((*stats).clone());
                            ctx.shutdown();
                        }
                    },
                )?;
                Ok(())
            }))
            .unwrap();
    }

    run_to_completion(plant, Duration::from_secs(10));

    let seen = seen.lock().unwrap();
    assert!(!seen.is_empty());
    let stats = &seen[0];
    assert_eq!(stats.reactor, "worker");
    assert!(stats.panic.is_none());
    let started = stats.started.expect("task ran");
    let finished = stats.finished.expect("task finished");
    assert!(finished >= started);
    assert!(finished.duration_since(started) >= Duration::from_millis(5));
    assert!(started >= stats.emitted);
}
