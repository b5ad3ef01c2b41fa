// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Typed value cache feeding reactions with their data.
//!
//! Three kinds of storage live here:
//!
//! 1. **Latest slot** - per value type, the most recently emitted value as a shared
//!    [`Arc`]. Readers clone the `Arc` under a short read guard and never block on a
//!    running callback. Setting replaces.
//! 2. **History ring** - per value type, a bounded ring of the last N values, opted
//!    into by the first reaction that declares a `last::<T>(n)` word. The ring's
//!    capacity grows to the largest N any reaction asked for.
//! 3. **Task context** - thread-local slots used to pass per-stimulus data (an
//!    [`IoEvent`], a tick timestamp) from the dispatching thread into the reaction's
//!    argument fetch. See [`task_context`].
//!
//! [`IoEvent`]: crate::io::IoEvent

pub mod task_context;

use std::{any::{Any, TypeId},
          collections::{HashMap, VecDeque},
          sync::{Arc, Mutex, RwLock}};

type Slot = Arc<dyn Any + Send + Sync>;

/// Per-type latest-value store plus opt-in bounded history.
#[derive(Default)]
#[allow(missing_debug_implementations)]
pub struct TypedCache {
    latest: RwLock<HashMap<TypeId, Slot>>,
    history: Mutex<HashMap<TypeId, HistoryRing>>,
}

struct HistoryRing {
    capacity: usize,
    items: VecDeque<Slot>,
}

impl TypedCache {
    #[must_use]
    pub fn new() -> Self { Self::default() }

    /// Replaces the latest value for `T` and appends to its history ring if one was
    /// requested.
    pub fn store<T: Send + Sync + 'static>(&self, value: Arc<T>) {
        let key = TypeId::of::<T>();
        {
            let mut history = self.history.lock().expect("cache history lock poisoned");
            if let Some(ring) = history.get_mut(&key) {
                if ring.items.len() == ring.capacity {
                    ring.items.pop_front();
                }
                ring.items.push_back(value.clone());
            }
        }
        let mut latest = self.latest.write().expect("cache latest lock poisoned");
        latest.insert(key, value);
    }

    /// Snapshot of the latest `T`, if any has been emitted.
    ///
    /// The read guard is held only long enough to clone the `Arc`.
    #[must_use]
    pub fn latest<T: Send + Sync + 'static>(&self) -> Option<Arc<T>> {
        let slot = {
            let latest = self.latest.read().expect("cache latest lock poisoned");
            latest.get(&TypeId::of::<T>()).cloned()
        };
        slot.and_then(|slot| slot.downcast::<T>().ok())
    }

    /// Starts (or widens) history collection for `T`.
    ///
    /// Idempotent; the ring's capacity only ever grows to the largest request.
    pub fn ensure_history<T: 'static>(&self, capacity: usize) {
        let mut history = self.history.lock().expect("cache history lock poisoned");
        let capacity = capacity.max(1);
        let ring = history.entry(TypeId::of::<T>()).or_insert_with(|| HistoryRing {
            capacity,
            items: VecDeque::with_capacity(capacity),
        });
        ring.capacity = ring.capacity.max(capacity);
    }

    /// The most recent `n` values of `T` in insertion order (oldest first).
    ///
    /// Returns fewer than `n` items (possibly none) when the ring holds fewer.
    #[must_use]
    pub fn last<T: Send + Sync + 'static>(&self, n: usize) -> Vec<Arc<T>> {
        let history = self.history.lock().expect("cache history lock poisoned");
        let Some(ring) = history.get(&TypeId::of::<T>()) else {
            return Vec::new();
        };
        let skip = ring.items.len().saturating_sub(n);
        ring.items
            .iter()
            .skip(skip)
            .filter_map(|slot| slot.clone().downcast::<T>().ok())
            .collect()
    }
}
