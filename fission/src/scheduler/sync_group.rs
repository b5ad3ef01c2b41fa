// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Mutual-exclusion groups keyed by a marker type.
//!
//! A declaration opts in with `.sync::<Key>()`; every reaction naming the same `Key`
//! shares one [`SyncGroup`]. At most one task per group runs at any instant, across
//! all workers; while one runs, later submissions wait in the group's own priority
//! queue and are released one at a time in priority order (FIFO within equal
//! priority).
//!
//! The registry is process-wide state with lazy initialization, matching the
//! runtime's other global counters.

use super::QueuedTask;
use std::{any::TypeId,
          collections::{BinaryHeap, HashMap},
          fmt,
          sync::{Arc, Mutex, MutexGuard, OnceLock}};

/// One mutual-exclusion group.
pub struct SyncGroup {
    key_name: &'static str,
    state: Mutex<SyncGroupState>,
}

pub(crate) struct SyncGroupState {
    /// True while a member task is on the ready queue or running.
    pub active: bool,
    /// Member tasks waiting for the group to free up.
    pub pending: BinaryHeap<QueuedTask>,
}

impl SyncGroup {
    fn new(key_name: &'static str) -> Self {
        Self {
            key_name,
            state: Mutex::new(SyncGroupState { active: false, pending: BinaryHeap::new() }),
        }
    }

    /// Type name of the key this group was created for.
    #[must_use]
    pub fn key_name(&self) -> &'static str { self.key_name }

    pub(crate) fn state(&self) -> MutexGuard<'_, SyncGroupState> {
        self.state.lock().expect("sync group lock poisoned")
    }
}

impl fmt::Debug for SyncGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyncGroup")
            .field("key", &self.key_name)
            .finish_non_exhaustive()
    }
}

/// The process-wide group for key type `K`, created on first use.
#[must_use]
pub fn sync_group_for<K: 'static>() -> Arc<SyncGroup> {
    static REGISTRY: OnceLock<Mutex<HashMap<TypeId, Arc<SyncGroup>>>> = OnceLock::new();
    let registry = REGISTRY.get_or_init(|| Mutex::new(HashMap::new()));
    let mut registry = registry.lock().expect("sync group registry poisoned");
    Arc::clone(
        registry
            .entry(TypeId::of::<K>())
            .or_insert_with(|| Arc::new(SyncGroup::new(std::any::type_name::<K>()))),
    )
}
