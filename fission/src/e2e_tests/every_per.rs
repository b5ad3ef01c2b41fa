// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use super::support::run_to_completion;
use crate::{Config, Powerplant, Rate, clock, every, reactor_fn};
use std::{sync::{Arc, Mutex},
          time::{Duration, Instant}};

const CYCLES_PER_SECOND: u64 = 100;
const NUM_SAMPLES: usize = 100;

/// `every(100, PerSecond)` fires every 10 ms. Collect arrival times, normalize the
/// inter-arrival deltas to jitter, and require low drift. Thresholds carry slack
/// over the ideal because CI schedulers add noise.
#[test]
fn per_rate_ticks_arrive_with_low_jitter() {
    let plant = Powerplant::new(Config { worker_threads: 1, network: None }).unwrap();
    let times: Arc<Mutex<Vec<Instant>>> = Arc::new(Mutex::new(Vec::new()));

    {
        let times = Arc::clone(&times);
        plant
            .install(reactor_fn("metronome", move |setup| {
                let times = Arc::clone(&times);
                setup
                    .on(every(CYCLES_PER_SECOND, Rate::PerSecond))
                    .then("sample", move |ctx, _at| {
                        let mut times = times.lock().unwrap();
                        times.push(clock::now());
                        if times.len() > NUM_SAMPLES {
                            ctx.shutdown();
                        }
                    })?;
                Ok(())
            }))
            .unwrap();
    }

    run_to_completion(plant, Duration::from_secs(30));

    let times = times.lock().unwrap();
    assert!(times.len() > NUM_SAMPLES);

    let ideal = 1.0 / CYCLES_PER_SECOND as f64;
    let jitter: Vec<f64> = times
        .windows(2)
        .map(|pair| pair[1].duration_since(pair[0]).as_secs_f64() - ideal)
        .collect();

    let mean = jitter.iter().sum::<f64>() / jitter.len() as f64;
    let variance =
        jitter.iter().map(|value| (value - mean) * (value - mean)).sum::<f64>()
            / jitter.len() as f64;
    let stddev = variance.sqrt();

    // Deadlines are absolute, so lateness must not accumulate across ticks.
    assert!(mean.abs() < 0.002, "mean jitter too high: {mean}s (sd {stddev}s)");
    // And ~95% of ticks land within single-digit milliseconds of the schedule.
    assert!(
        (mean.abs() + 2.0 * stddev) < 0.010,
        "jitter spread too high: mean {mean}s sd {stddev}s"
    );
}
