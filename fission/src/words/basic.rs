// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Data words: `trigger`, `with`, `last`, `optional`, plus the lifecycle shorthands.

use super::{BindCtx, Word};
use crate::{plant::{BindError, Handle, Shutdown, Startup},
            util::tidy_type_name};
use std::{any::TypeId, fmt, marker::PhantomData, sync::Arc};

/// Schedules the reaction when `T` is emitted; the argument is the latest `T`.
pub struct Trigger<T> {
    _type: PhantomData<fn() -> T>,
}

impl<T> Clone for Trigger<T> {
    fn clone(&self) -> Self { Self { _type: PhantomData } }
}

impl<T> Copy for Trigger<T> {}

/// See [`Trigger`].
#[must_use]
pub fn trigger<T: Send + Sync + 'static>() -> Trigger<T> { Trigger { _type: PhantomData } }

impl<T: Send + Sync + 'static> Word for Trigger<T> {
    type Args = Arc<T>;

    fn bind(&self, ctx: &mut BindCtx<'_>) -> Result<(), BindError> { ctx.subscribe::<T>() }

    fn fetch(&self, handle: &Handle) -> Option<Arc<T>> { handle.get::<T>() }

    fn trigger_types(&self, out: &mut Vec<(TypeId, &'static str)>) {
        out.push((TypeId::of::<T>(), std::any::type_name::<T>()));
    }

    fn arg_types(&self, out: &mut Vec<&'static str>) {
        out.push(std::any::type_name::<T>());
    }
}

impl<T> fmt::Debug for Trigger<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "trigger::<{}>", tidy_type_name(std::any::type_name::<T>()))
    }
}

/// Includes the latest `T` as an argument without scheduling on it.
pub struct With<T> {
    _type: PhantomData<fn() -> T>,
}

impl<T> Clone for With<T> {
    fn clone(&self) -> Self { Self { _type: PhantomData } }
}

impl<T> Copy for With<T> {}

/// See [`With`].
#[must_use]
pub fn with<T: Send + Sync + 'static>() -> With<T> { With { _type: PhantomData } }

impl<T: Send + Sync + 'static> Word for With<T> {
    type Args = Arc<T>;

    fn fetch(&self, handle: &Handle) -> Option<Arc<T>> { handle.get::<T>() }

    fn arg_types(&self, out: &mut Vec<&'static str>) {
        out.push(std::any::type_name::<T>());
    }
}

impl<T> fmt::Debug for With<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "with::<{}>", tidy_type_name(std::any::type_name::<T>()))
    }
}

/// Includes the last `n` emitted `T`s, oldest first. Does not schedule.
///
/// An empty history yields an empty vector, not a skip: a reaction can observe "no
/// samples yet".
pub struct Last<T> {
    n: usize,
    _type: PhantomData<fn() -> T>,
}

impl<T> Clone for Last<T> {
    fn clone(&self) -> Self { Self { n: self.n, _type: PhantomData } }
}

impl<T> Copy for Last<T> {}

/// See [`Last`].
#[must_use]
pub fn last<T: Send + Sync + 'static>(n: usize) -> Last<T> {
    Last { n, _type: PhantomData }
}

impl<T: Send + Sync + 'static> Word for Last<T> {
    type Args = Vec<Arc<T>>;

    fn bind(&self, ctx: &mut BindCtx<'_>) -> Result<(), BindError> {
        ctx.ensure_history::<T>(self.n)
    }

    fn fetch(&self, handle: &Handle) -> Option<Vec<Arc<T>>> { Some(handle.last::<T>(self.n)) }

    fn arg_types(&self, out: &mut Vec<&'static str>) {
        out.push(std::any::type_name::<T>());
    }
}

impl<T> fmt::Debug for Last<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "last::<{}>({})", tidy_type_name(std::any::type_name::<T>()), self.n)
    }
}

/// Makes the inner word's absence non-fatal: the argument becomes an `Option`.
///
/// `optional(with::<T>())` yields `None` instead of skipping the stimulus when no
/// `T` has been emitted yet. Preconditions of the inner word still apply.
#[derive(Clone, Copy, Debug)]
pub struct Optional<W>(W);

/// See [`Optional`].
#[must_use]
pub fn optional<W: Word>(word: W) -> Optional<W> { Optional(word) }

impl<W: Word> Word for Optional<W> {
    type Args = Option<W::Args>;

    fn bind(&self, ctx: &mut BindCtx<'_>) -> Result<(), BindError> { self.0.bind(ctx) }

    fn precondition(&self, handle: &Handle) -> bool { self.0.precondition(handle) }

    fn fetch(&self, handle: &Handle) -> Option<Option<W::Args>> {
        Some(self.0.fetch(handle))
    }

    fn trigger_types(&self, out: &mut Vec<(TypeId, &'static str)>) {
        self.0.trigger_types(out);
    }

    fn arg_types(&self, out: &mut Vec<&'static str>) { self.0.arg_types(out); }
}

/// Schedules once when the plant enters the running state.
#[must_use]
pub fn startup() -> Trigger<Startup> { trigger() }

/// Schedules when shutdown begins (delivered inline, before the scheduler stops).
#[must_use]
pub fn shutdown() -> Trigger<Shutdown> { trigger() }
