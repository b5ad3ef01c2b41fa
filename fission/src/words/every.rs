// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! The periodic word: `every(ticks, rate)`.

use super::{BindCtx, Word};
use crate::{cache::task_context,
            clock,
            plant::{BindError, Handle},
            ticker::{Tick, TickRegistration}};
use std::{sync::Arc, time::{Duration, Instant}};

/// Units for [`every`], including rate forms.
///
/// `every(100, Rate::Millis)` fires every 100 ms; `every(100, Rate::PerSecond)`
/// fires 100 times per second (every 10 ms).
#[derive(Clone, Copy, Debug, PartialEq, Eq, strum_macros::Display)]
pub enum Rate {
    Micros,
    Millis,
    Seconds,
    Minutes,
    /// `ticks` firings per second.
    PerSecond,
    /// `ticks` firings per minute.
    PerMinute,
}

impl Rate {
    fn period(self, ticks: u64) -> Duration {
        match self {
            Rate::Micros => Duration::from_micros(ticks),
            Rate::Millis => Duration::from_millis(ticks),
            Rate::Seconds => Duration::from_secs(ticks),
            Rate::Minutes => Duration::from_secs(ticks * 60),
            Rate::PerSecond => Duration::from_secs(1).div_f64(ticks as f64),
            Rate::PerMinute => Duration::from_secs(60).div_f64(ticks as f64),
        }
    }
}

/// Schedules the reaction periodically; the argument is the scheduled tick instant.
///
/// `ticks == 0` means "immediately, then every one unit of `rate`". Equal periods
/// coalesce into one timer step regardless of how they were spelled, so
/// `every(1000, Rate::Millis)` and `every(1, Rate::Seconds)` share a slot.
#[derive(Clone, Copy, Debug)]
pub struct Every {
    ticks: u64,
    rate: Rate,
}

/// See [`Every`].
#[must_use]
pub fn every(ticks: u64, rate: Rate) -> Every { Every { ticks, rate } }

impl Every {
    fn schedule(self) -> (Duration, bool) {
        if self.ticks == 0 {
            (self.rate.period(1), true)
        } else {
            (self.rate.period(self.ticks), false)
        }
    }
}

impl Word for Every {
    type Args = Instant;

    fn bind(&self, ctx: &mut BindCtx<'_>) -> Result<(), BindError> {
        let (period, immediate) = self.schedule();
        // Direct scope: the step must exist before `then` returns.
        ctx.handle().emit_direct(TickRegistration {
            period,
            immediate,
            reaction: Arc::clone(ctx.reaction()),
        });
        Ok(())
    }

    fn fetch(&self, _handle: &Handle) -> Option<Instant> {
        // The scheduled instant, when the ticker drove this stimulus; degenerate
        // invocations (another trigger in the same declaration) get "now".
        Some(task_context::current::<Tick>().map_or_else(clock::now, |tick| tick.0))
    }

    fn arg_types(&self, out: &mut Vec<&'static str>) {
        out.push(std::any::type_name::<Instant>());
    }
}
