// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! The fd-readiness word: `io(fd, interest)`.

use super::{BindCtx, Word};
use crate::{cache::task_context,
            io::{IoEvent, Ready},
            plant::{BindError, Handle}};
use std::os::fd::RawFd;

/// Schedules the reaction when `fd` reports readiness intersecting `interest`; the
/// argument is the [`IoEvent`] that fired.
///
/// Readiness is level-triggered repeat: a readable fd keeps firing until its data is
/// drained, so callbacks should consume what they were woken for. Error and hang-up
/// conditions are delivered alongside read/write readiness. The caller keeps
/// ownership of the fd and must keep it open while bound.
#[derive(Clone, Copy, Debug)]
pub struct Io {
    fd: RawFd,
    interest: Ready,
}

/// See [`Io`].
#[must_use]
pub fn io(fd: RawFd, interest: Ready) -> Io { Io { fd, interest } }

impl Word for Io {
    type Args = IoEvent;

    fn bind(&self, ctx: &mut BindCtx<'_>) -> Result<(), BindError> {
        ctx.register_io(self.fd, self.interest)
    }

    fn fetch(&self, _handle: &Handle) -> Option<IoEvent> {
        // Present only when the multiplexer drove this stimulus.
        task_context::current::<IoEvent>()
    }

    fn arg_types(&self, out: &mut Vec<&'static str>) {
        out.push(std::any::type_name::<IoEvent>());
    }
}
