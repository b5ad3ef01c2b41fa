// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Cloneable accessor to a running plant.

use super::{BindError, PlantError, inner::PlantInner};
use crate::{pool::ServiceTask, util::short_type_name};
use std::sync::{Arc, Weak};

/// What reaction callbacks (and anything else outside the plant) use to emit
/// values, read the cache, and request shutdown.
///
/// Holds a weak reference: handles never keep a dropped plant alive, and every
/// operation on a dead handle is a logged no-op. This is what lets reactions -
/// which the plant itself owns - capture handles without creating a cycle.
#[derive(Clone, Debug)]
pub struct Handle {
    inner: Weak<PlantInner>,
}

impl Handle {
    pub(crate) fn new(inner: Weak<PlantInner>) -> Self { Self { inner } }

    pub(crate) fn upgrade(&self) -> Option<Arc<PlantInner>> { self.inner.upgrade() }

    /// Emits with `Local` scope: caches the value and schedules every subscriber.
    pub fn emit<T: Send + Sync + 'static>(&self, value: T) {
        match self.upgrade() {
            Some(inner) => inner.emit_local(value),
            None => gone::<T>("emit"),
        }
    }

    /// Emits with `Direct` scope: runs subscribers inline before returning.
    pub fn emit_direct<T: Send + Sync + 'static>(&self, value: T) {
        match self.upgrade() {
            Some(inner) => inner.emit_direct(value),
            None => gone::<T>("emit_direct"),
        }
    }

    /// Emits with `Initialize` scope: queued until the plant starts.
    pub fn emit_initialize<T: Send + Sync + 'static>(&self, value: T) {
        match self.upgrade() {
            Some(inner) => inner.emit_initialize(value),
            None => gone::<T>("emit_initialize"),
        }
    }

    /// Emits with `Network` scope: hands the value to the attached bridge.
    pub fn emit_network<T: Send + Sync + 'static>(&self, value: T) {
        match self.upgrade() {
            Some(inner) => inner.emit_network(value),
            None => gone::<T>("emit_network"),
        }
    }

    /// Emits with `Udp` scope: hands the value to the bridge's datagram path.
    pub fn emit_udp<T: Send + Sync + 'static>(&self, value: T) {
        match self.upgrade() {
            Some(inner) => inner.emit_udp(value),
            None => gone::<T>("emit_udp"),
        }
    }

    /// Latest cached `T`, if any emit has stored one.
    #[must_use]
    pub fn get<T: Send + Sync + 'static>(&self) -> Option<Arc<T>> {
        self.upgrade().and_then(|inner| inner.cache.latest::<T>())
    }

    /// The most recent `n` values of `T`, oldest first. Requires a reaction to have
    /// declared `last::<T>(..)` so the history ring exists.
    #[must_use]
    pub fn last<T: Send + Sync + 'static>(&self, n: usize) -> Vec<Arc<T>> {
        self.upgrade().map(|inner| inner.cache.last::<T>(n)).unwrap_or_default()
    }

    /// Requests shutdown. Returns immediately; `start()` returns once every running
    /// task has drained and all threads have joined.
    pub fn shutdown(&self) {
        if let Some(inner) = self.upgrade() {
            inner.shutdown();
        }
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.upgrade().is_some_and(|inner| inner.is_running())
    }

    /// Registers a dedicated service thread with the pool: `run` is the loop body,
    /// `kill` must make it return. Services registered before `start()` spawn at
    /// start; later ones spawn immediately.
    ///
    /// # Errors
    ///
    /// [`BindError::PlantGone`] on a dead handle; [`BindError::ServiceSpawn`] when
    /// the thread cannot be spawned.
    pub fn add_service(
        &self,
        name: impl Into<String>,
        run: impl FnOnce() + Send + 'static,
        kill: impl Fn() + Send + Sync + 'static,
    ) -> Result<(), BindError> {
        let Some(inner) = self.upgrade() else {
            return Err(BindError::PlantGone);
        };
        let name = name.into();
        inner
            .pool
            .add_service(ServiceTask {
                name: name.clone(),
                run: Box::new(run),
                kill: Box::new(kill),
            })
            .map_err(|error| match error {
                PlantError::ThreadSpawn { name, source } => {
                    BindError::ServiceSpawn { name, source }
                }
                other => BindError::ServiceSpawn {
                    name,
                    source: std::io::Error::other(other.to_string()),
                },
            })
    }
}

fn gone<T>(operation: &str) {
    tracing::warn!(
        event = %short_type_name::<T>(),
        operation,
        "handle points at a dropped runtime, ignoring"
    );
}
