// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Clock-driven periodic-event source.
//!
//! One dedicated service thread owns a set of **steps**, one per unique period;
//! every `every(...)` declaration with that period hangs its emitter off the same
//! step, so `every(1000, Rate::Millis)` and `every(1, Rate::Seconds)` coalesce into
//! one timer slot.
//!
//! The loop sleeps (interruptibly, on a condvar) until the earliest `next` deadline,
//! fires every due step's emitters with the *scheduled* timestamp, then advances
//! each fired step by its period. A thread suspension that misses ticks skips
//! forward - deadlines advance past "now" rather than flooding catch-up ticks.
//!
//! Registrations arrive as `Direct` emits of [`TickRegistration`] (the binding word
//! needs the step in effect before `then` returns) and are idempotent per
//! (period, reaction) pair.

use crate::{cache::task_context,
            clock,
            plant::{BindError, Handle, Reactor, Setup, Shutdown},
            reaction::{Reaction, ReactionId},
            words::trigger};
use std::{collections::HashSet,
          sync::{Arc, Condvar, Mutex, Weak},
          time::{Duration, Instant}};

/// Per-stimulus payload: the scheduled instant of the tick that fired.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Tick(pub Instant);

/// Configuration message registering a reaction with the tick source.
///
/// Emitted with `Direct` scope by the `every(...)` word's bind hook.
#[derive(Clone)]
pub struct TickRegistration {
    pub(crate) period: Duration,
    /// Fire once immediately, then every `period`.
    pub(crate) immediate: bool,
    pub(crate) reaction: Arc<Reaction>,
}

impl std::fmt::Debug for TickRegistration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TickRegistration")
            .field("period", &self.period)
            .field("immediate", &self.immediate)
            .field("reaction", &self.reaction.id())
            .finish()
    }
}

type TickEmitter = Box<dyn Fn(Instant) + Send>;

struct Step {
    period: Duration,
    next: Instant,
    emitters: Vec<TickEmitter>,
}

struct TickerState {
    steps: Vec<Step>,
    /// Idempotency guard: one emitter per (period, reaction).
    registered: HashSet<(Duration, ReactionId)>,
    shutdown: bool,
}

pub(crate) struct TickerCore {
    state: Mutex<TickerState>,
    signal: Condvar,
}

impl TickerCore {
    fn new() -> Self {
        Self {
            state: Mutex::new(TickerState {
                steps: Vec::new(),
                registered: HashSet::new(),
                shutdown: false,
            }),
            signal: Condvar::new(),
        }
    }

    fn register(&self, registration: &TickRegistration, handle: &Handle) {
        // A zero period would spin the catch-up loop; clamp to the smallest
        // representable tick.
        let period = if registration.period.is_zero() {
            Duration::from_micros(1)
        } else {
            registration.period
        };

        let mut state = self.state.lock().expect("ticker lock poisoned");
        if state.shutdown {
            return;
        }
        if !state.registered.insert((period, registration.reaction.id())) {
            tracing::trace!(
                reaction_id = registration.reaction.id(),
                ?period,
                "duplicate tick registration ignored"
            );
            return;
        }

        let emitter = make_emitter(handle.clone(), Arc::downgrade(&registration.reaction));
        let now = clock::now();
        match state.steps.iter_mut().find(|step| step.period == period) {
            Some(step) => {
                step.emitters.push(emitter);
                if registration.immediate {
                    step.next = step.next.min(now);
                }
            }
            None => {
                let next = if registration.immediate { now } else { now + period };
                state.steps.push(Step { period, next, emitters: vec![emitter] });
            }
        }
        drop(state);
        self.signal.notify_all();
    }

    fn run(&self) {
        let mut state = self.state.lock().expect("ticker lock poisoned");
        loop {
            if state.shutdown {
                break;
            }
            match Self::fire_due(&mut state, clock::now()) {
                Some(next) => {
                    let now = clock::now();
                    if next > now {
                        let (guard, _timed_out) = self
                            .signal
                            .wait_timeout(state, next - now)
                            .expect("ticker lock poisoned");
                        state = guard;
                    }
                }
                None => {
                    state = self.signal.wait(state).expect("ticker lock poisoned");
                }
            }
        }
        tracing::debug!("ticker exiting");
    }

    /// Fires every due step with its scheduled timestamp and returns the earliest
    /// upcoming deadline.
    fn fire_due(state: &mut TickerState, now: Instant) -> Option<Instant> {
        for step in &mut state.steps {
            if step.next <= now {
                let at = step.next;
                for emitter in &step.emitters {
                    emitter(at);
                }
                step.next += step.period;
                // Missed ticks (suspension, long callbacks) skip forward instead of
                // flooding.
                while step.next <= now {
                    step.next += step.period;
                }
            }
        }
        state.steps.iter().map(|step| step.next).min()
    }

    fn kill(&self) {
        let mut state = self.state.lock().expect("ticker lock poisoned");
        state.shutdown = true;
        drop(state);
        self.signal.notify_all();
    }

    #[cfg(test)]
    fn step_count(&self) -> usize {
        self.state.lock().unwrap().steps.len()
    }

    #[cfg(test)]
    fn emitter_count(&self, period: Duration) -> usize {
        self.state
            .lock()
            .unwrap()
            .steps
            .iter()
            .find(|step| step.period == period)
            .map_or(0, |step| step.emitters.len())
    }
}

fn make_emitter(handle: Handle, reaction: Weak<Reaction>) -> TickEmitter {
    Box::new(move |at| {
        // A dead weak ref means the reaction was unbound; the emitter just decays.
        let Some(reaction) = reaction.upgrade() else { return };
        let Some(inner) = handle.upgrade() else { return };
        task_context::scoped(Tick(at), || {
            if let Some(task) = reaction.get_task() {
                inner.submit(task);
            }
        });
    })
}

/// Built-in reactor wiring the tick source into the plant.
pub(crate) struct Ticker {
    core: Arc<TickerCore>,
}

impl Ticker {
    pub(crate) fn new() -> Self { Self { core: Arc::new(TickerCore::new()) } }
}

impl Reactor for Ticker {
    fn name(&self) -> String { "fission-ticker".into() }

    fn configure(self: Arc<Self>, setup: &mut Setup) -> Result<(), BindError> {
        {
            let core = Arc::clone(&self.core);
            setup.on(trigger::<TickRegistration>()).then(
                "register step",
                move |ctx, registration: Arc<TickRegistration>| {
                    core.register(&registration, ctx);
                },
            )?;
        }
        {
            let core = Arc::clone(&self.core);
            setup
                .on(trigger::<Shutdown>())
                .then("stop ticking", move |_ctx, _shutdown| core.kill())?;
        }
        let run_core = Arc::clone(&self.core);
        let kill_core = Arc::clone(&self.core);
        setup.add_service("ticker", move || run_core.run(), move || kill_core.kill())
    }
}
