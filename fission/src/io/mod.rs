// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

// cspell:words revents eventfd

//! Fd-readiness multiplexer: turns `poll` wakeups into reaction tasks.
//!
//! A dedicated service thread blocks in [`mio::Poll::poll`] (epoll on Linux, kqueue
//! on macOS) over every bound fd. Bindings live in a list sorted by fd; when
//! readiness arrives, the matching entries whose interest intersects the event get
//! one task each, with the [`IoEvent`] passed through the thread-local task
//! context.
//!
//! Mutations never touch the poll registration directly. Bind/unbind handlers edit
//! the entry list, set the `dirty` flag, and wake the poller via [`mio::Waker`]
//! (the self-pipe of this design); the service loop rebuilds the registration set
//! - merging interests for fds bound more than once - before its next poll. A
//! readiness event with no matching entry therefore just marks the list dirty: one
//! spurious wake between an unbind and the rebuild is expected and tolerated.
//!
//! Readiness is level-triggered repeat: a bound fd that stays readable keeps
//! producing tasks until drained.
//!
//! All three operations arrive as `Direct` emits the component subscribes to -
//! [`IoBind`], [`IoUnbind`], and the plant's `Shutdown`.

use crate::{cache::task_context,
            plant::{BindError, Handle, Reactor, Setup, Shutdown},
            reaction::{Reaction, ReactionId},
            words::trigger};
use mio::{Interest, Token, unix::SourceFd};
use std::{fmt,
          ops::BitOr,
          os::fd::RawFd,
          sync::{Arc, Mutex, MutexGuard}};

/// Interest/readiness mask for one fd binding.
///
/// `ERROR` and `CLOSED` cannot be requested on their own - the OS reports them
/// alongside read/write readiness - but they appear in delivered [`IoEvent`]s.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Ready(u8);

impl Ready {
    pub const NONE: Ready = Ready(0);
    pub const READABLE: Ready = Ready(1);
    pub const WRITABLE: Ready = Ready(1 << 1);
    pub const ERROR: Ready = Ready(1 << 2);
    /// Peer hung up (read or write half).
    pub const CLOSED: Ready = Ready(1 << 3);

    #[must_use]
    pub const fn contains(self, other: Ready) -> bool { self.0 & other.0 == other.0 }

    #[must_use]
    pub const fn intersects(self, other: Ready) -> bool { self.0 & other.0 != 0 }

    #[must_use]
    pub const fn union(self, other: Ready) -> Ready { Ready(self.0 | other.0) }

    fn from_mio(event: &mio::event::Event) -> Ready {
        let mut ready = Ready::NONE;
        if event.is_readable() {
            ready = ready.union(Ready::READABLE);
        }
        if event.is_writable() {
            ready = ready.union(Ready::WRITABLE);
        }
        if event.is_error() {
            ready = ready.union(Ready::ERROR);
        }
        if event.is_read_closed() || event.is_write_closed() {
            ready = ready.union(Ready::CLOSED);
        }
        ready
    }

    /// The poll-registerable part of this mask, if any.
    fn to_interest(self) -> Option<Interest> {
        let mut interest: Option<Interest> = None;
        if self.contains(Ready::READABLE) {
            interest = Some(Interest::READABLE);
        }
        if self.contains(Ready::WRITABLE) {
            interest = Some(match interest {
                Some(existing) => existing.add(Interest::WRITABLE),
                None => Interest::WRITABLE,
            });
        }
        interest
    }
}

impl BitOr for Ready {
    type Output = Ready;

    fn bitor(self, other: Ready) -> Ready { self.union(other) }
}

/// Delivered to an `io(...)`-bound reaction: which fd fired and how.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IoEvent {
    pub fd: RawFd,
    pub ready: Ready,
}

/// Configuration message binding a reaction to an fd. `Direct`-emitted by the
/// binding words.
#[derive(Clone)]
pub struct IoBind {
    pub(crate) fd: RawFd,
    pub(crate) interest: Ready,
    pub(crate) reaction: Arc<Reaction>,
}

impl fmt::Debug for IoBind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IoBind")
            .field("fd", &self.fd)
            .field("interest", &self.interest)
            .field("reaction", &self.reaction.id())
            .finish()
    }
}

/// Configuration message removing every binding of one reaction.
#[derive(Clone, Copy, Debug)]
pub struct IoUnbind {
    pub(crate) reaction_id: ReactionId,
}

struct IoEntry {
    fd: RawFd,
    interest: Ready,
    reaction: Arc<Reaction>,
}

struct IoState {
    /// Sorted by fd for range lookup on readiness.
    entries: Vec<IoEntry>,
    /// Fds currently registered with the poll.
    registered: Vec<RawFd>,
    dirty: bool,
    shutdown: bool,
}

const WAKE_TOKEN: Token = Token(usize::MAX);

pub(crate) struct IoCore {
    registry: mio::Registry,
    waker: mio::Waker,
    state: Mutex<IoState>,
}

impl IoCore {
    fn state(&self) -> MutexGuard<'_, IoState> {
        self.state.lock().expect("io state lock poisoned")
    }

    fn bind(&self, bind: &IoBind) {
        let mut state = self.state();
        if state.shutdown {
            return;
        }
        tracing::debug!(fd = bind.fd, reaction_id = bind.reaction.id(), "binding fd");
        state.entries.push(IoEntry {
            fd: bind.fd,
            interest: bind.interest,
            reaction: Arc::clone(&bind.reaction),
        });
        state.entries.sort_by_key(|entry| entry.fd);
        state.dirty = true;
        drop(state);
        self.wake();
    }

    fn unbind(&self, reaction_id: ReactionId) {
        let mut state = self.state();
        let before = state.entries.len();
        state.entries.retain(|entry| entry.reaction.id() != reaction_id);
        if state.entries.len() != before {
            tracing::debug!(reaction_id, "unbound fd reaction");
            state.dirty = true;
            drop(state);
            self.wake();
        }
    }

    fn kill(&self) {
        let mut state = self.state();
        state.shutdown = true;
        drop(state);
        self.wake();
    }

    fn wake(&self) {
        if let Err(error) = self.waker.wake() {
            // The poller cannot be interrupted any more; nothing useful can follow.
            tracing::error!(%error, "failed to wake the readiness poller");
        }
    }

    fn run(&self, mut poll: mio::Poll, handle: &Handle) {
        let mut events = mio::Events::with_capacity(64);
        loop {
            self.rebuild_if_dirty();
            if self.state().shutdown {
                break;
            }
            match poll.poll(&mut events, None) {
                Ok(()) => {}
                Err(error) if error.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(error) => {
                    // Fatal: the component cannot make progress without poll.
                    tracing::error!(%error, "readiness poll failed, shutting down");
                    handle.shutdown();
                    break;
                }
            }
            for event in events.iter() {
                if event.token() == WAKE_TOKEN {
                    continue;
                }
                #[allow(clippy::cast_possible_truncation)]
                let fd = event.token().0 as RawFd;
                self.dispatch_ready(fd, Ready::from_mio(event), handle);
            }
        }
        tracing::debug!("io poller exiting");
    }

    /// Builds one task per entry matching `fd` whose interest intersects `ready`.
    fn dispatch_ready(&self, fd: RawFd, ready: Ready, handle: &Handle) {
        let state = self.state();
        let start = state.entries.partition_point(|entry| entry.fd < fd);
        let mut matched = false;
        for entry in &state.entries[start..] {
            if entry.fd != fd {
                break;
            }
            matched = true;
            if !entry.interest.intersects(ready) {
                continue;
            }
            let Some(inner) = handle.upgrade() else { return };
            task_context::scoped(IoEvent { fd, ready }, || {
                if let Some(task) = entry.reaction.get_task() {
                    inner.submit(task);
                }
            });
        }
        drop(state);
        if !matched {
            // Readiness for an fd we no longer track: the entry was unbound after
            // the kernel queued the event. Mark dirty; the rebuild drops the
            // registration. One spurious wake is tolerated.
            self.state().dirty = true;
        }
    }

    /// Re-registers the poll set from the entry list, merging interests for fds
    /// bound by more than one reaction.
    fn rebuild_if_dirty(&self) {
        let mut state = self.state();
        if !state.dirty {
            return;
        }
        for fd in std::mem::take(&mut state.registered) {
            // Already-closed fds fail to deregister; that is the stale case the
            // rebuild exists for.
            drop(self.registry.deregister(&mut SourceFd(&fd)));
        }
        let mut index = 0;
        while index < state.entries.len() {
            let fd = state.entries[index].fd;
            let mut interest = Ready::NONE;
            while index < state.entries.len() && state.entries[index].fd == fd {
                interest = interest.union(state.entries[index].interest);
                index += 1;
            }
            let Some(interest) = interest.to_interest() else {
                tracing::warn!(fd, "binding requests neither read nor write, skipping");
                continue;
            };
            #[allow(clippy::cast_sign_loss)]
            match self.registry.register(&mut SourceFd(&fd), Token(fd as usize), interest)
            {
                Ok(()) => state.registered.push(fd),
                Err(error) => tracing::warn!(fd, %error, "failed to register fd"),
            }
        }
        state.dirty = false;
        tracing::trace!(fds = state.registered.len(), "rebuilt poll set");
    }

    #[cfg(test)]
    pub(crate) fn entry_count(&self) -> usize { self.state().entries.len() }
}

/// Built-in reactor wiring the multiplexer into the plant.
pub(crate) struct IoMultiplexer {
    core: Arc<IoCore>,
    poll: Mutex<Option<mio::Poll>>,
}

impl IoMultiplexer {
    pub(crate) fn new() -> std::io::Result<Self> {
        let poll = mio::Poll::new()?;
        let waker = mio::Waker::new(poll.registry(), WAKE_TOKEN)?;
        let registry = poll.registry().try_clone()?;
        Ok(Self {
            core: Arc::new(IoCore {
                registry,
                waker,
                state: Mutex::new(IoState {
                    entries: Vec::new(),
                    registered: Vec::new(),
                    dirty: false,
                    shutdown: false,
                }),
            }),
            poll: Mutex::new(Some(poll)),
        })
    }
}

impl Reactor for IoMultiplexer {
    fn name(&self) -> String { "fission-io".into() }

    fn configure(self: Arc<Self>, setup: &mut Setup) -> Result<(), BindError> {
        {
            let core = Arc::clone(&self.core);
            setup
                .on(trigger::<IoBind>())
                .then("bind fd", move |_ctx, bind: Arc<IoBind>| core.bind(&bind))?;
        }
        {
            let core = Arc::clone(&self.core);
            setup.on(trigger::<IoUnbind>()).then(
                "unbind fd",
                move |_ctx, unbind: Arc<IoUnbind>| core.unbind(unbind.reaction_id),
            )?;
        }
        {
            let core = Arc::clone(&self.core);
            setup
                .on(trigger::<Shutdown>())
                .then("stop polling", move |_ctx, _shutdown| core.kill())?;
        }

        let poll = self
            .poll
            .lock()
            .expect("io poll lock poisoned")
            .take()
            .expect("io poller configured twice");
        let run_core = Arc::clone(&self.core);
        let run_handle = setup.handle();
        let kill_core = Arc::clone(&self.core);
        setup.add_service(
            "io-poller",
            move || run_core.run(poll, &run_handle),
            move || kill_core.kill(),
        )
    }
}

#[cfg(test)]
mod tests;
