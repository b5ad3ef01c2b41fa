// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! The service-loop word: `always()`.

use super::{BindCtx, Word};
use crate::plant::{BindError, Handle};
use std::{sync::{Arc,
                 atomic::{AtomicBool, Ordering}},
          time::Duration};

/// Runs the reaction as a long-lived service loop on its own dedicated thread,
/// outside the worker pool.
///
/// The callback is invoked back-to-back until shutdown or unbind. It may block (the
/// built-in fd poller is the model user: one blocking poll pass per invocation),
/// but a callback that blocks indefinitely must itself observe `Shutdown` - the
/// loop can only stop between invocations.
#[derive(Clone, Copy, Debug, Default)]
pub struct Always;

/// See [`Always`].
#[must_use]
pub fn always() -> Always { Always }

impl Word for Always {
    type Args = ();

    fn bind(&self, ctx: &mut BindCtx<'_>) -> Result<(), BindError> {
        let stop = Arc::new(AtomicBool::new(false));
        let reaction = Arc::clone(ctx.reaction());
        let handle = ctx.handle().clone();
        let service_name = format!("always-{}", reaction.identifier().label);

        let run = {
            let stop = Arc::clone(&stop);
            move || {
                while !stop.load(Ordering::Acquire) {
                    let Some(inner) = handle.upgrade() else { break };
                    if inner.scheduler.is_shut_down() {
                        break;
                    }
                    match reaction.get_task() {
                        Some(task) => inner.execute(task),
                        // Disabled or over its concurrency bound; back off instead
                        // of spinning.
                        None => std::thread::sleep(Duration::from_millis(1)),
                    }
                }
            }
        };
        let kill = {
            let stop = Arc::clone(&stop);
            move || stop.store(true, Ordering::Release)
        };
        {
            let stop = Arc::clone(&stop);
            ctx.add_unbinder(move |_| stop.store(true, Ordering::Release));
        }
        ctx.add_service(service_name, run, kill)
    }

    fn fetch(&self, _handle: &Handle) -> Option<()> { Some(()) }
}
