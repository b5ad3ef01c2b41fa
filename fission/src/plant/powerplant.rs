// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! The runtime itself: owns every component, installs reactors, runs the lifecycle.

use super::{BindError, Config, Handle, NetworkBridge, PlantError, Reactor, ReactorRecord,
            Setup, Startup,
            inner::{PlantInner, STATE_IDLE, STATE_RUNNING, STATE_STOPPED, worker_loop}};
use crate::{io::IoMultiplexer, ticker::Ticker};
use std::sync::{Arc, atomic::Ordering};

/// The reactive runtime.
///
/// Owns the worker pool, the scheduler, the dispatcher, the typed cache, and the
/// built-in tick/readiness services. Lifecycle:
///
/// 1. [`Powerplant::new`] - construct; built-in services are installed but no
///    threads run yet.
/// 2. [`Powerplant::install`] - bind each reactor's declarations.
/// 3. [`Powerplant::start`] - deliver queued `Initialize` emits, emit [`Startup`],
///    spawn workers and services, then serve the main-thread queue on the calling
///    thread until shutdown.
/// 4. Shutdown (from any thread, usually inside a callback via
///    [`Handle::shutdown`]) - drain running tasks, stop every thread;
///    [`Powerplant::start`] returns once all of them have joined.
pub struct Powerplant {
    pub(crate) inner: Arc<PlantInner>,
}

impl std::fmt::Debug for Powerplant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Powerplant")
            .field("state", &self.inner.state.load(Ordering::Acquire))
            .field("workers", &self.inner.config.worker_threads)
            .finish_non_exhaustive()
    }
}

impl Powerplant {
    /// Builds a plant and installs the built-in tick source and fd-readiness
    /// multiplexer.
    ///
    /// # Errors
    ///
    /// Fails when the readiness poller's OS resources (epoll/kqueue fd, waker)
    /// cannot be created.
    pub fn new(config: Config) -> Result<Self, PlantError> {
        let inner = PlantInner::new(config);
        let plant = Self { inner };
        plant.install(Ticker::new())?;
        plant.install(IoMultiplexer::new().map_err(PlantError::PollResource)?)?;
        Ok(plant)
    }

    /// A cloneable handle for emitting, cache reads, and shutdown requests.
    #[must_use]
    pub fn handle(&self) -> Handle { self.inner.handle() }

    /// Installs a reactor: runs its [`Reactor::configure`] and records every
    /// reaction handle it creates.
    ///
    /// # Errors
    ///
    /// Propagates the reactor's bind-time failures. Reactions bound before the
    /// failing declaration are rolled back; the reactor is not installed.
    pub fn install<R: Reactor>(&self, reactor: R) -> Result<(), BindError> {
        let name = reactor.name();
        let reactor = Arc::new(reactor);
        let mut setup = Setup::new(self.handle(), name.clone(), reactor.log_level());
        if let Err(error) = Arc::clone(&reactor).configure(&mut setup) {
            setup.unbind_all();
            return Err(error);
        }
        let handles = setup.into_handles();
        tracing::debug!(reactor = %name, reactions = handles.len(), "installed reactor");
        self.inner
            .reactors
            .lock()
            .expect("reactor list poisoned")
            .push(ReactorRecord { name, handles, keeper: reactor });
        Ok(())
    }

    /// Uninstalls a reactor by name, unbinding every reaction it declared.
    ///
    /// In-flight tasks finish (they share ownership of their reactions); no new
    /// tasks start. Returns `false` when no reactor had that name.
    pub fn uninstall(&self, name: &str) -> bool {
        let removed: Vec<ReactorRecord> = {
            let mut reactors = self.inner.reactors.lock().expect("reactor list poisoned");
            let (gone, kept) = std::mem::take(&mut *reactors)
                .into_iter()
                .partition(|record| record.name == name);
            *reactors = kept;
            gone
        };
        let found = !removed.is_empty();
        for record in removed {
            tracing::debug!(reactor = %record.name, "uninstalling reactor");
            for handle in &record.handles {
                handle.unbind();
            }
        }
        found
    }

    /// Attaches the external networking collaborator that receives
    /// `Network`/`Udp`-scope emits.
    pub fn attach_network(&self, bridge: Arc<dyn NetworkBridge>) {
        let mut slot = self.inner.bridge.write().expect("bridge lock poisoned");
        *slot = Some(bridge);
    }

    /// Emits with `Local` scope without going through a handle.
    pub fn emit<T: Send + Sync + 'static>(&self, value: T) { self.inner.emit_local(value); }

    /// Emits with `Initialize` scope: delivered when `start()` begins.
    pub fn emit_initialize<T: Send + Sync + 'static>(&self, value: T) {
        self.inner.emit_initialize(value);
    }

    /// Runs the plant, blocking the calling thread until shutdown completes.
    ///
    /// The calling thread becomes the main-thread worker: it delivers queued
    /// `Initialize` emits, emits [`Startup`], spawns the pool and services, then
    /// drains the main-thread queue. Returns after every running task has completed
    /// and all threads have joined.
    ///
    /// # Errors
    ///
    /// [`PlantError::AlreadyStarted`] on a second call; thread-spawn failures
    /// otherwise (the plant shuts itself down before returning them).
    pub fn start(&mut self) -> Result<(), PlantError> {
        let inner = Arc::clone(&self.inner);
        inner
            .state
            .compare_exchange(STATE_IDLE, STATE_RUNNING, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| PlantError::AlreadyStarted)?;

        tracing::info!(workers = inner.config.worker_threads, "powerplant starting");

        for deferred in inner.dispatcher.take_deferred() {
            deferred(&inner);
        }
        inner.emit_local(Startup);

        let worker_inner = Arc::clone(&inner);
        if let Err(error) = inner
            .pool
            .start(inner.config.worker_threads, move || worker_loop(&worker_inner))
        {
            inner.shutdown();
            inner.pool.join_all();
            inner.state.store(STATE_STOPPED, Ordering::Release);
            return Err(error);
        }

        while let Some(task) = inner.scheduler.next_main() {
            inner.execute(task);
        }

        inner.pool.join_all();
        inner.state.store(STATE_STOPPED, Ordering::Release);
        tracing::info!("powerplant stopped");
        Ok(())
    }

    /// Requests shutdown; equivalent to [`Handle::shutdown`].
    pub fn shutdown(&self) { self.inner.shutdown(); }
}

impl Drop for Powerplant {
    fn drop(&mut self) {
        let records = {
            let mut reactors = self.inner.reactors.lock().expect("reactor list poisoned");
            std::mem::take(&mut *reactors)
        };
        for record in records {
            for handle in &record.handles {
                handle.unbind();
            }
        }
    }
}
