// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Two reactors bouncing a counter back and forth, once per tick.
//!
//! Run with: `cargo run --example ping_pong`

use fission::{BindError, Config, Powerplant, Rate, Reactor, Setup, every, trigger,
              try_init_tracing};
use std::sync::Arc;

struct Ping(u32);
struct Pong(u32);

#[derive(Default)]
struct Server;

impl Reactor for Server {
    fn configure(self: Arc<Self>, setup: &mut Setup) -> Result<(), BindError> {
        // Serve one ping per 100 ms.
        setup.on(every(100, Rate::Millis)).then("serve", |ctx, _at| {
            let next = ctx.get::<Pong>().map_or(0, |pong| pong.0);
            ctx.emit(Ping(next));
        })?;
        Ok(())
    }
}

#[derive(Default)]
struct Returner;

impl Reactor for Returner {
    fn configure(self: Arc<Self>, setup: &mut Setup) -> Result<(), BindError> {
        let logger = setup.logger();
        setup.on(trigger::<Ping>()).then("return", move |ctx, ping| {
            logger.info(&format!("rally {}", ping.0));
            if ping.0 >= 20 {
                ctx.shutdown();
            } else {
                ctx.emit(Pong(ping.0 + 1));
            }
        })?;
        Ok(())
    }
}

fn main() -> miette::Result<()> {
    try_init_tracing(tracing::Level::INFO)?;
    let mut plant = Powerplant::new(Config::default())?;
    plant.install(Server)?;
    plant.install(Returner)?;
    plant.start()?;
    Ok(())
}
