// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Shared state behind both [`Powerplant`] and every [`Handle`]: the cache, the
//! dispatcher, the scheduler, the pool, and the emit/execute paths that tie them
//! together.
//!
//! Ownership shape: [`Powerplant`] holds the one strong [`Arc<PlantInner>`];
//! [`Handle`]s hold weak references. Reactions capture handles (not inners), so the
//! subscription tables never form a strong cycle back to the plant.
//!
//! [`Powerplant`]: super::Powerplant
//! [`Handle`]: super::Handle

use super::{Config, NetworkBridge, ReactorRecord, Shutdown};
use crate::{cache::TypedCache,
            dispatch::Dispatcher,
            pool::ThreadPool,
            reaction::ReactionTask,
            scheduler::TaskScheduler,
            util::short_type_name};
use std::{any::TypeId,
          sync::{Arc, Mutex, RwLock,
                 atomic::{AtomicU8, Ordering}}};

pub(crate) const STATE_IDLE: u8 = 0;
pub(crate) const STATE_RUNNING: u8 = 1;
pub(crate) const STATE_SHUTTING_DOWN: u8 = 2;
pub(crate) const STATE_STOPPED: u8 = 3;

pub(crate) struct PlantInner {
    pub(crate) config: Config,
    pub(crate) cache: TypedCache,
    pub(crate) dispatcher: Dispatcher,
    pub(crate) scheduler: TaskScheduler,
    pub(crate) pool: ThreadPool,
    pub(crate) reactors: Mutex<Vec<ReactorRecord>>,
    pub(crate) state: AtomicU8,
    pub(crate) bridge: RwLock<Option<Arc<dyn NetworkBridge>>>,
}

impl PlantInner {
    pub(crate) fn new(config: Config) -> Arc<Self> {
        Arc::new(Self {
            config,
            cache: TypedCache::new(),
            dispatcher: Dispatcher::new(),
            scheduler: TaskScheduler::new(),
            pool: ThreadPool::new(),
            reactors: Mutex::new(Vec::new()),
            state: AtomicU8::new(STATE_IDLE),
            bridge: RwLock::new(None),
        })
    }

    pub(crate) fn handle(self: &Arc<Self>) -> super::Handle {
        super::Handle::new(Arc::downgrade(self))
    }

    pub(crate) fn is_running(&self) -> bool {
        self.state.load(Ordering::Acquire) == STATE_RUNNING
    }

    /// `Local` scope: cache the value, then build and schedule one task per
    /// subscriber. Iteration happens under the subscription table's read guard, so
    /// concurrent unbinds wait for this emit to finish submitting.
    pub(crate) fn emit_local<T: Send + Sync + 'static>(self: &Arc<Self>, value: T) {
        self.emit_local_arc(Arc::new(value));
    }

    pub(crate) fn emit_local_arc<T: Send + Sync + 'static>(self: &Arc<Self>, value: Arc<T>) {
        tracing::trace!(event = %short_type_name::<T>(), "emit<Local>");
        self.cache.store(value);
        self.dispatcher.for_each_subscriber(TypeId::of::<T>(), |reaction| {
            if let Some(task) = reaction.get_task() {
                self.submit(task);
            }
        });
    }

    /// `Direct` scope: cache the value, then run every subscriber inline on this
    /// thread, bypassing the scheduler. Used for configuration messages that must be
    /// in effect before the emit returns. Subscribers may bind further reactions -
    /// the iteration works on a snapshot, not under the table lock.
    pub(crate) fn emit_direct<T: Send + Sync + 'static>(self: &Arc<Self>, value: T) {
        tracing::trace!(event = %short_type_name::<T>(), "emit<Direct>");
        self.cache.store(Arc::new(value));
        for reaction in self.dispatcher.snapshot(TypeId::of::<T>()) {
            if let Some(task) = reaction.get_task() {
                self.execute(task);
            }
        }
    }

    /// `Initialize` scope: queued until `start()` enters the running state, then
    /// delivered as a `Local` emit. Once running, behaves exactly like `Local`.
    pub(crate) fn emit_initialize<T: Send + Sync + 'static>(self: &Arc<Self>, value: T) {
        let value = Arc::new(value);
        let deferred = {
            let value = Arc::clone(&value);
            Box::new(move |inner: &Arc<PlantInner>| inner.emit_local_arc(value))
        };
        if !self.dispatcher.defer(deferred) {
            self.emit_local_arc(value);
        }
    }

    /// `Network` scope: hand the erased value to the attached bridge.
    pub(crate) fn emit_network<T: Send + Sync + 'static>(&self, value: T) {
        let bridge = self.bridge.read().expect("bridge lock poisoned").clone();
        match bridge {
            Some(bridge) => bridge.publish(std::any::type_name::<T>(), Arc::new(value)),
            None => tracing::debug!(
                event = %short_type_name::<T>(),
                "emit<Network> with no bridge attached, dropping"
            ),
        }
    }

    /// `Udp` scope: like `Network` via the bridge's datagram path.
    pub(crate) fn emit_udp<T: Send + Sync + 'static>(&self, value: T) {
        let bridge = self.bridge.read().expect("bridge lock poisoned").clone();
        match bridge {
            Some(bridge) => bridge.publish_udp(std::any::type_name::<T>(), Arc::new(value)),
            None => tracing::debug!(
                event = %short_type_name::<T>(),
                "emit<Udp> with no bridge attached, dropping"
            ),
        }
    }

    pub(crate) fn submit(&self, task: ReactionTask) { self.scheduler.submit(task); }

    /// Runs one task on the current thread: times it, captures panics, and feeds the
    /// statistics stream.
    pub(crate) fn execute(self: &Arc<Self>, task: ReactionTask) {
        let reaction = Arc::clone(task.reaction());
        tracing::trace!(%task, "running");
        let stats = task.run();
        if let Some(panic) = &stats.panic {
            tracing::error!(
                reaction = %reaction.identifier(),
                task_id = stats.task_id,
                %panic,
                "reaction task panicked"
            );
        }
        if reaction.emit_stats() {
            self.emit_local(stats);
        }
    }

    /// Signals shutdown: notifies `Shutdown` subscribers inline, stops the
    /// scheduler, and interrupts every service thread. Joining happens in
    /// `start()`, which returns once every running task has completed and all
    /// threads are down.
    pub(crate) fn shutdown(self: &Arc<Self>) {
        if self
            .state
            .compare_exchange(
                STATE_RUNNING,
                STATE_SHUTTING_DOWN,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_err()
        {
            return;
        }
        tracing::info!("shutdown requested");
        self.emit_direct(Shutdown);
        self.scheduler.shutdown();
        self.pool.kill_services();
    }
}

/// Drain loop run by every pool worker thread.
pub(crate) fn worker_loop(inner: &Arc<PlantInner>) {
    while let Some(task) = inner.scheduler.next() {
        let reaction = Arc::clone(task.reaction());
        inner.execute(task);
        inner.scheduler.complete(&reaction);
    }
    tracing::debug!("worker exiting");
}
