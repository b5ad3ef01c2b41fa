// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Subscription registry routing emits to reactions.
//!
//! For every event type the dispatcher keeps an ordered list of the reactions that
//! consume it. The table is read-mostly: emits take the read side (many concurrent),
//! bind/unbind take the write side. A `Local` emit iterates subscribers **under the
//! read guard**, so an unbind that starts during an emit waits until the emit has
//! finished submitting tasks - a reaction unbound before an emit begins never
//! receives it, and one bound before the emit begins always does.
//!
//! `Direct` emits run callbacks inline on the emitting thread; they iterate a
//! snapshot instead, so a direct subscriber may itself bind further reactions (the
//! configuration-message pattern) without deadlocking on the table lock.
//!
//! The dispatcher also holds the `Initialize`-scope queue: emits deferred until the
//! runtime enters the running state.

use crate::{plant::PlantInner,
            reaction::{Reaction, ReactionId}};
use smallvec::SmallVec;
use std::{any::TypeId,
          collections::HashMap,
          sync::{Arc, Mutex, RwLock}};

/// An `Initialize`-scope emit captured until `start()` delivers it.
pub(crate) type DeferredEmit = Box<dyn FnOnce(&Arc<PlantInner>) + Send>;

/// Subscription table plus the initialize queue.
#[allow(missing_debug_implementations)]
pub struct Dispatcher {
    subs: RwLock<HashMap<TypeId, Vec<Arc<Reaction>>>>,
    /// `Some` until the runtime starts; `None` afterwards (emits go straight out).
    init_queue: Mutex<Option<Vec<DeferredEmit>>>,
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self {
            subs: RwLock::new(HashMap::new()),
            init_queue: Mutex::new(Some(Vec::new())),
        }
    }
}

impl Dispatcher {
    #[must_use]
    pub fn new() -> Self { Self::default() }

    /// Appends `reaction` to the subscriber list for `key`. Delivery order within one
    /// emit follows registration order.
    pub(crate) fn subscribe(&self, key: TypeId, reaction: Arc<Reaction>) {
        let mut subs = self.subs.write().expect("subscription table poisoned");
        subs.entry(key).or_default().push(reaction);
    }

    /// Removes one reaction from one type's subscriber list.
    pub(crate) fn unsubscribe_from(&self, key: TypeId, reaction_id: ReactionId) {
        let mut subs = self.subs.write().expect("subscription table poisoned");
        if let Some(list) = subs.get_mut(&key) {
            list.retain(|reaction| reaction.id() != reaction_id);
            if list.is_empty() {
                subs.remove(&key);
            }
        }
    }

    /// Visits every subscriber of `key` under the table's read guard.
    pub(crate) fn for_each_subscriber(&self, key: TypeId, mut f: impl FnMut(&Arc<Reaction>)) {
        let subs = self.subs.read().expect("subscription table poisoned");
        if let Some(list) = subs.get(&key) {
            for reaction in list {
                f(reaction);
            }
        }
    }

    /// Clones the subscriber list of `key` so callers can run user code without
    /// holding the table lock (the `Direct` path).
    pub(crate) fn snapshot(&self, key: TypeId) -> SmallVec<[Arc<Reaction>; 4]> {
        let subs = self.subs.read().expect("subscription table poisoned");
        subs.get(&key).map(|list| list.iter().cloned().collect()).unwrap_or_default()
    }

    /// Reaction ids subscribed to `key`, in delivery order.
    #[must_use]
    pub fn subscription_ids(&self, key: TypeId) -> Vec<ReactionId> {
        let subs = self.subs.read().expect("subscription table poisoned");
        subs.get(&key)
            .map(|list| list.iter().map(|reaction| reaction.id()).collect())
            .unwrap_or_default()
    }

    /// Queues an `Initialize` emit. Returns `false` when the queue has already been
    /// drained (the runtime is running) - the caller should emit locally instead.
    pub(crate) fn defer(&self, emit: DeferredEmit) -> bool {
        let mut queue = self.init_queue.lock().expect("initialize queue poisoned");
        match queue.as_mut() {
            Some(pending) => {
                pending.push(emit);
                true
            }
            None => false,
        }
    }

    /// Drains the initialize queue; subsequent [`Dispatcher::defer`] calls return
    /// `false`.
    pub(crate) fn take_deferred(&self) -> Vec<DeferredEmit> {
        let mut queue = self.init_queue.lock().expect("initialize queue poisoned");
        queue.take().unwrap_or_default()
    }
}
