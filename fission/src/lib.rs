// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

// cspell:words powerplant multiplexer epoll kqueue

//! # fission
//!
//! A reactive, in-process runtime for composing concurrent software out of independent
//! modules ("reactors") that react to typed events.
//!
//! A [`Powerplant`] owns a pool of blocking worker threads, a priority scheduler with
//! mutual-exclusion groups, a typed value cache, a clock-driven periodic tick source,
//! and an fd-readiness multiplexer. Reactors declare *reactions* - "on event X, with
//! data Y, run callback Z" - and the runtime binds them, delivers their data, and
//! schedules their execution under the constraints the declaration asked for.
//!
//! # Architecture Overview
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────────┐
//! │                             Powerplant                               │
//! ├──────────────────────────────────────────────────────────────────────┤
//! │                                                                      │
//! │  emit(value) ──► Dispatcher ──► TypedCache (latest / history)        │
//! │                     │                                                │
//! │                     ▼  per subscriber                                │
//! │                 Reaction::get_task()                                 │
//! │                     │  enabled? single? precondition? fetch args     │
//! │                     ▼                                                │
//! │                 TaskScheduler ──► [ priority heap | sync groups ]    │
//! │                     │                      │                         │
//! │            worker threads           main-thread queue                │
//! │                                                                      │
//! │  Ticker (periodic)  ──┐                                              │
//! │  IoMultiplexer (fds) ─┴──► same path, stimulus ≠ emit                │
//! │                                                                      │
//! └──────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Declaring reactions
//!
//! ```no_run
//! use std::sync::Arc;
//! use fission::{BindError, Config, Powerplant, Priority, Rate, Reactor, Setup,
//!               every, trigger, with};
//!
//! struct Position(f64);
//! struct Velocity(f64);
//!
//! #[derive(Default)]
//! struct Tracker;
//!
//! impl Reactor for Tracker {
//!     fn configure(self: Arc<Self>, setup: &mut Setup) -> Result<(), BindError> {
//!         setup
//!             .on((trigger::<Position>(), with::<Velocity>()))
//!             .priority(Priority::High)
//!             .then("track", |_ctx, (pos, vel)| {
//!                 let _ = (pos.0, vel.0);
//!             })?;
//!
//!         setup.on(every(100, Rate::PerSecond)).then("heartbeat", |ctx, _at| {
//!             ctx.emit(Position(1.0));
//!         })?;
//!
//!         Ok(())
//!     }
//! }
//!
//! fn main() -> miette::Result<()> {
//!     let mut plant = Powerplant::new(Config::default())?;
//!     plant.install(Tracker)?;
//!     plant.start()?; // blocks until something calls shutdown()
//!     Ok(())
//! }
//! ```
//!
//! # Scheduling discipline
//!
//! - Tasks run in priority order ([`Priority::Realtime`] first); ties break FIFO by
//!   submission order.
//! - A reaction in a sync group ([`OnBuilder::sync`]) never runs concurrently with
//!   another member of the same group.
//! - [`OnBuilder::single`] drops submissions while one task is queued or running;
//!   [`OnBuilder::buffer`] generalizes that to N.
//! - [`OnBuilder::main_thread`] routes the task to the thread that called
//!   [`Powerplant::start`].
//!
//! Reactions run to completion on one thread; there is no cooperative suspension
//! inside a callback. Panics in callbacks are caught, recorded into the task's
//! [`TaskStats`], and logged; the worker survives.
//!
//! [`OnBuilder::sync`]: crate::words::OnBuilder::sync
//! [`OnBuilder::single`]: crate::words::OnBuilder::single
//! [`OnBuilder::buffer`]: crate::words::OnBuilder::buffer
//! [`OnBuilder::main_thread`]: crate::words::OnBuilder::main_thread

pub mod cache;
pub mod clock;
pub mod dispatch;
pub mod io;
pub mod log_init;
pub mod plant;
pub mod pool;
pub mod reaction;
pub mod scheduler;
pub mod ticker;
pub mod util;
pub mod words;

pub use cache::*;
pub use dispatch::*;
pub use io::*;
pub use log_init::*;
pub use plant::*;
pub use pool::*;
pub use reaction::*;
pub use scheduler::*;
pub use ticker::*;
pub use util::*;
pub use words::*;

#[cfg(test)]
mod e2e_tests;
