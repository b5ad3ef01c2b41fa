// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use super::support::{spawn_plant, wait_until};
use crate::{Config, Powerplant, Ready, ReactionHandle, io, reactor_fn};
use pretty_assertions::assert_eq;
use std::{os::fd::AsRawFd,
          sync::{Arc, Mutex,
                 atomic::{AtomicU32, Ordering}},
          time::Duration};

/// Bind a reaction to a pipe's read end, write bytes from outside, count reads.
/// After unbinding, further writes must not fire the reaction.
#[test]
fn pipe_readiness_fires_once_per_write_until_unbound() {
    // Non-blocking read end: a spurious wakeup reads nothing instead of wedging a
    // worker, and the counter only advances on actual data.
    let (read_end, write_end) =
        rustix::pipe::pipe_with(rustix::pipe::PipeFlags::NONBLOCK).unwrap();
    let read_end = Arc::new(read_end);

    let plant = Powerplant::new(Config { worker_threads: 2, network: None }).unwrap();
    let reads = Arc::new(AtomicU32::new(0));
    let bound: Arc<Mutex<Option<ReactionHandle>>> = Arc::new(Mutex::new(None));

    {
        let reads = Arc::clone(&reads);
        let bound = Arc::clone(&bound);
        let read_fd = Arc::clone(&read_end);
        plant
            .install(reactor_fn("pipe-listener", move |setup| {
                let reads = Arc::clone(&reads);
                let read_fd = Arc::clone(&read_fd);
                let handle = setup
                    .on(io(read_fd.as_raw_fd(), Ready::READABLE))
                    .single()
                    .then("drain", move |_ctx, _event| {
                        let mut buffer = [0_u8; 16];
                        if let Ok(count) = rustix::io::read(&*read_fd, &mut buffer) {
                            if count > 0 {
                                reads.fetch_add(1, Ordering::SeqCst);
                            }
                        }
                    })?;
                *bound.lock().unwrap() = Some(handle);
                Ok(())
            }))
            .unwrap();
    }

    let (thread, handle) = spawn_plant(plant);

    rustix::io::write(&write_end, &[0x2a]).unwrap();
    assert!(
        wait_until(Duration::from_secs(5), || reads.load(Ordering::SeqCst) == 1),
        "reaction did not fire for the first write"
    );

    // One write, one fire: give any spurious extra task time to show up.
    std::thread::sleep(Duration::from_millis(50));
    assert_eq!(reads.load(Ordering::SeqCst), 1);

    rustix::io::write(&write_end, &[0x2b]).unwrap();
    assert!(
        wait_until(Duration::from_secs(5), || reads.load(Ordering::SeqCst) == 2),
        "reaction did not fire for the second write"
    );

    // Unbind, then write again: no further fires.
    bound.lock().unwrap().as_ref().unwrap().unbind();
    rustix::io::write(&write_end, &[0x2c]).unwrap();
    std::thread::sleep(Duration::from_millis(100));
    assert_eq!(reads.load(Ordering::SeqCst), 2);

    handle.shutdown();
    thread.join().unwrap();
}
