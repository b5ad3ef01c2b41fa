// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! The reactor contract and the declaration context handed to it.

use super::{BindError, Handle, LogLevel, Logger};
use crate::{reaction::ReactionHandle, util::short_type_name,
            words::{OnBuilder, Word}};
use std::{any::Any, sync::Arc};

/// A user module owning a set of reactions.
///
/// The runtime's only contract with a reactor is: *"I own some reactions; uninstall
/// me and they unbind."* State lives in the implementing type behind interior
/// mutability; callbacks capture clones of the reactor's `Arc`.
pub trait Reactor: Send + Sync + 'static {
    /// Name used in reaction identifiers and logs. Defaults to the type name.
    fn name(&self) -> String
    where
        Self: Sized,
    {
        short_type_name::<Self>()
    }

    /// Severity threshold for this reactor's [`Logger`].
    fn log_level(&self) -> LogLevel { LogLevel::default() }

    /// Declares this reactor's reactions. Runs once, at install time.
    fn configure(self: Arc<Self>, setup: &mut Setup) -> Result<(), BindError>;
}

/// Declaration context passed to [`Reactor::configure`].
///
/// Collects every [`ReactionHandle`] the reactor creates so the plant can unbind
/// them all when the reactor is uninstalled.
#[derive(Debug)]
pub struct Setup {
    pub(crate) handle: Handle,
    pub(crate) reactor_name: String,
    pub(crate) log_level: LogLevel,
    pub(crate) handles: Vec<ReactionHandle>,
}

impl Setup {
    pub(crate) fn new(handle: Handle, reactor_name: String, log_level: LogLevel) -> Self {
        Self { handle, reactor_name, log_level, handles: Vec::new() }
    }

    /// Starts a reaction declaration from one word or a tuple of words.
    pub fn on<W: Word>(&mut self, words: W) -> OnBuilder<'_, W> {
        OnBuilder::new(self, words)
    }

    /// A handle to the plant, for emitting from inside `configure` or for stashing
    /// in reactor state.
    #[must_use]
    pub fn handle(&self) -> Handle { self.handle.clone() }

    #[must_use]
    pub fn name(&self) -> &str { &self.reactor_name }

    /// Logger scoped to this reactor and its declared level.
    #[must_use]
    pub fn logger(&self) -> Logger {
        Logger::new(self.reactor_name.clone(), self.log_level)
    }

    /// Emits with `Local` scope.
    pub fn emit<T: Send + Sync + 'static>(&self, value: T) { self.handle.emit(value); }

    /// Emits with `Direct` scope.
    pub fn emit_direct<T: Send + Sync + 'static>(&self, value: T) {
        self.handle.emit_direct(value);
    }

    /// Emits with `Initialize` scope: delivered once the plant starts.
    pub fn emit_initialize<T: Send + Sync + 'static>(&self, value: T) {
        self.handle.emit_initialize(value);
    }

    /// Registers a dedicated service thread: `run` is the loop body (it owns the
    /// thread until it returns), `kill` must make `run` return. See
    /// [`Handle::add_service`].
    pub fn add_service(
        &self,
        name: impl Into<String>,
        run: impl FnOnce() + Send + 'static,
        kill: impl Fn() + Send + Sync + 'static,
    ) -> Result<(), BindError> {
        self.handle.add_service(name, run, kill)
    }

    pub(crate) fn record_handle(&mut self, handle: ReactionHandle) {
        self.handles.push(handle);
    }

    pub(crate) fn into_handles(self) -> Vec<ReactionHandle> { self.handles }

    pub(crate) fn unbind_all(&self) {
        for handle in &self.handles {
            handle.unbind();
        }
    }
}

/// Record the plant keeps per installed reactor.
#[allow(missing_debug_implementations)]
pub(crate) struct ReactorRecord {
    pub name: String,
    pub handles: Vec<ReactionHandle>,
    /// Keeps the reactor value alive for as long as it is installed.
    #[allow(dead_code)]
    pub keeper: Arc<dyn Any + Send + Sync>,
}

/// Wraps a closure as a [`Reactor`], for small reactors and tests.
///
/// ```no_run
/// # use fission::{Config, Powerplant, reactor_fn, trigger};
/// # fn main() -> miette::Result<()> {
/// let plant = Powerplant::new(Config::default())?;
/// plant.install(reactor_fn("counter", |setup| {
///     setup.on(trigger::<u32>()).then("count", |_ctx, n| {
///         let _ = *n;
///     })?;
///     Ok(())
/// }))?;
/// # Ok(())
/// # }
/// ```
pub fn reactor_fn<F>(name: impl Into<String>, configure: F) -> FnReactor<F>
where
    F: Fn(&mut Setup) -> Result<(), BindError> + Send + Sync + 'static,
{
    FnReactor { name: name.into(), configure }
}

/// See [`reactor_fn`].
#[allow(missing_debug_implementations)]
pub struct FnReactor<F> {
    name: String,
    configure: F,
}

impl<F> Reactor for FnReactor<F>
where
    F: Fn(&mut Setup) -> Result<(), BindError> + Send + Sync + 'static,
{
    fn name(&self) -> String { self.name.clone() }

    fn configure(self: Arc<Self>, setup: &mut Setup) -> Result<(), BindError> {
        (self.configure)(setup)
    }
}
