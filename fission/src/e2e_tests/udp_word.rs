// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use super::support::{spawn_plant, wait_until};
use crate::{Config, Powerplant, reactor_fn, udp};
use pretty_assertions::assert_eq;
use std::{sync::{Arc, Mutex},
          time::Duration};

/// Bind an ephemeral UDP port through the word, send a datagram at it from a plain
/// socket, and expect the packet (payload and all) in the callback.
#[test]
fn udp_word_delivers_datagrams() {
    let word = udp(0).unwrap();
    let port = word.local_port();
    assert_ne!(port, 0);

    let plant = Powerplant::new(Config { worker_threads: 2, network: None }).unwrap();
    let received: Arc<Mutex<Vec<Vec<u8>>>> = Arc::new(Mutex::new(Vec::new()));

    {
        let received = Arc::clone(&received);
        plant
            .install(reactor_fn("datagram-sink", move |setup| {
                let received = Arc::clone(&received);
                setup.on(word.clone()).then("receive", move |_ctx, packet| {
                    received.lock().unwrap().push(packet.data);
                })?;
                Ok(())
            }))
            .unwrap();
    }

    let (thread, handle) = spawn_plant(plant);

    let sender = std::net::UdpSocket::bind("127.0.0.1:0").unwrap();
    sender.send_to(b"hello fission", ("127.0.0.1", port)).unwrap();

    assert!(
        wait_until(Duration::from_secs(5), || !received.lock().unwrap().is_empty()),
        "datagram never arrived"
    );
    assert_eq!(received.lock().unwrap()[0], b"hello fission".to_vec());

    handle.shutdown();
    thread.join().unwrap();
}
