// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! The declaration surface: words and the `on(...)` builder.
//!
//! A reaction declaration is a set of **words** plus scheduling options plus a
//! callback:
//!
//! ```no_run
//! # use fission::{BindError, Priority, Setup, every, last, trigger, with, Rate};
//! # struct Position(f64); struct Velocity(f64); struct Sample(u8); struct RenderKey;
//! # fn declare(setup: &mut Setup) -> Result<(), BindError> {
//! setup
//!     .on((trigger::<Position>(), with::<Velocity>(), last::<Sample>(10)))
//!     .priority(Priority::High)
//!     .sync::<RenderKey>()
//!     .then("track", |ctx, (pos, vel, samples)| {
//!         let _ = (pos, vel, samples, ctx);
//!     })?;
//! # Ok(())
//! # }
//! ```
//!
//! Each word contributes some subset of the per-reaction pipeline:
//!
//! | hook | when it runs | what it does |
//! |---|---|---|
//! | `bind` | once, inside `then(...)` | subscribe to types, register periods/fds, open sockets |
//! | `precondition` | per stimulus | dynamic guard; `false` skips this stimulus silently |
//! | `fetch` | per stimulus | produce the callback argument; `None` skips (missing input) |
//!
//! Tuples of words are themselves words: their arguments compose positionally, a
//! failed fetch anywhere skips the whole stimulus, and binds run left to right.
//! Anything implementing [`Word`] participates, so user crates can add their own
//! providers (see the `fetch`-only custom word in the crate tests).
//!
//! Scheduling options (`priority`, `sync`, `single`, `buffer`, `main_thread`) are
//! builder methods on [`OnBuilder`], not words; they configure how the scheduler
//! treats the tasks the words produce.

mod always;
mod basic;
mod builder;
mod every;
mod io_word;
mod net;

pub use always::*;
pub use basic::*;
pub use builder::*;
pub use every::*;
pub use io_word::*;
pub use net::*;

use crate::{io::{IoBind, IoUnbind, Ready},
            plant::{BindError, Handle},
            reaction::{Reaction, Unbinder}};
use std::{any::TypeId, os::fd::RawFd, sync::Arc};

/// One word of a reaction declaration.
///
/// Words are values; a declaration owns its words for the life of the reaction, so
/// a word may carry state (an open socket, a requested history depth).
pub trait Word: Send + Sync + 'static {
    /// The argument this word contributes to the callback.
    type Args: Send + 'static;

    /// Bind-time side effects: subscriptions, period/fd registrations. Errors abort
    /// the declaration; anything already bound is rolled back.
    fn bind(&self, ctx: &mut BindCtx<'_>) -> Result<(), BindError> {
        let _ = ctx;
        Ok(())
    }

    /// Per-stimulus guard. `false` silently skips this stimulus.
    fn precondition(&self, handle: &Handle) -> bool {
        let _ = handle;
        true
    }

    /// Produces the callback argument for this stimulus. `None` means a required
    /// input is missing and the reaction is skipped (logged at DEBUG).
    fn fetch(&self, handle: &Handle) -> Option<Self::Args>;

    /// Types whose emits schedule this reaction. Used for reaction identifiers and
    /// to keep the statistics stream from feeding itself.
    fn trigger_types(&self, out: &mut Vec<(TypeId, &'static str)>) {
        let _ = out;
    }

    /// Type names of the contributed arguments, for task statistics.
    fn arg_types(&self, out: &mut Vec<&'static str>) {
        let _ = out;
    }
}

/// Bind-time context handed to [`Word::bind`].
#[allow(missing_debug_implementations)]
pub struct BindCtx<'a> {
    pub(crate) handle: Handle,
    pub(crate) reaction: &'a Arc<Reaction>,
    pub(crate) unbinders: &'a mut Vec<Unbinder>,
}

impl BindCtx<'_> {
    #[must_use]
    pub fn handle(&self) -> &Handle { &self.handle }

    #[must_use]
    pub fn reaction(&self) -> &Arc<Reaction> { self.reaction }

    /// Subscribes this reaction to emits of `T` and arranges removal on unbind.
    pub fn subscribe<T: Send + Sync + 'static>(&mut self) -> Result<(), BindError> {
        let Some(inner) = self.handle.upgrade() else {
            return Err(BindError::PlantGone);
        };
        let key = TypeId::of::<T>();
        inner.dispatcher.subscribe(key, Arc::clone(self.reaction));
        let handle = self.handle.clone();
        self.add_unbinder(move |reaction| {
            if let Some(inner) = handle.upgrade() {
                inner.dispatcher.unsubscribe_from(key, reaction.id());
            }
        });
        Ok(())
    }

    /// Opts type `T` into history collection of at least `capacity` entries.
    pub fn ensure_history<T: Send + Sync + 'static>(
        &self,
        capacity: usize,
    ) -> Result<(), BindError> {
        let Some(inner) = self.handle.upgrade() else {
            return Err(BindError::PlantGone);
        };
        inner.cache.ensure_history::<T>(capacity);
        Ok(())
    }

    /// Registers this reaction with the fd-readiness multiplexer and arranges
    /// removal on unbind. The registration is a `Direct` emit, so it is in effect
    /// when this returns.
    pub fn register_io(&mut self, fd: RawFd, interest: Ready) -> Result<(), BindError> {
        if fd < 0 {
            return Err(BindError::InvalidFd { fd });
        }
        self.handle.emit_direct(IoBind {
            fd,
            interest,
            reaction: Arc::clone(self.reaction),
        });
        let handle = self.handle.clone();
        self.add_unbinder(move |reaction| {
            handle.emit_direct(IoUnbind { reaction_id: reaction.id() });
        });
        Ok(())
    }

    /// Registers a service thread tied to this declaration. See
    /// [`Handle::add_service`].
    pub fn add_service(
        &self,
        name: impl Into<String>,
        run: impl FnOnce() + Send + 'static,
        kill: impl Fn() + Send + Sync + 'static,
    ) -> Result<(), BindError> {
        self.handle.add_service(name, run, kill)
    }

    /// Adds a cleanup action that runs when the reaction unbinds.
    pub fn add_unbinder(&mut self, f: impl Fn(&Reaction) + Send + Sync + 'static) {
        self.unbinders.push(Box::new(f));
    }
}

macro_rules! impl_word_for_tuple {
    ($($name:ident . $idx:tt),+) => {
        impl<$($name: Word),+> Word for ($($name,)+) {
            type Args = ($($name::Args,)+);

            fn bind(&self, ctx: &mut BindCtx<'_>) -> Result<(), BindError> {
                $(self.$idx.bind(ctx)?;)+
                Ok(())
            }

            fn precondition(&self, handle: &Handle) -> bool {
                $(
                    if !self.$idx.precondition(handle) {
                        return false;
                    }
                )+
                true
            }

            fn fetch(&self, handle: &Handle) -> Option<Self::Args> {
                Some(($(self.$idx.fetch(handle)?,)+))
            }

            fn trigger_types(&self, out: &mut Vec<(TypeId, &'static str)>) {
                $(self.$idx.trigger_types(out);)+
            }

            fn arg_types(&self, out: &mut Vec<&'static str>) {
                $(self.$idx.arg_types(out);)+
            }
        }
    };
}

impl_word_for_tuple!(A.0);
impl_word_for_tuple!(A.0, B.1);
impl_word_for_tuple!(A.0, B.1, C.2);
impl_word_for_tuple!(A.0, B.1, C.2, D.3);
impl_word_for_tuple!(A.0, B.1, C.2, D.3, E.4);
