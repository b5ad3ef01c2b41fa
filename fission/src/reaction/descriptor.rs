// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! The [`Reaction`] descriptor and its scheduling options.

use super::{Priority, ReactionTask};
use crate::{scheduler::SyncGroup, util::tidy_type_name};
use smallvec::SmallVec;
use std::{fmt,
          sync::{Arc, Mutex,
                 atomic::{AtomicBool, AtomicU64, Ordering}}};

/// Unique identity of a reaction. Monotonically increasing, process-wide.
pub type ReactionId = u64;

static NEXT_REACTION_ID: AtomicU64 = AtomicU64::new(1);

/// Human-readable labels for tracing and task statistics.
#[derive(Clone, Debug)]
pub struct Identifier {
    /// Name of the reactor that declared this reaction.
    pub reactor: String,
    /// The label passed to `then(...)`.
    pub label: String,
    /// Type names of the declaration's trigger words.
    pub triggers: SmallVec<[&'static str; 2]>,
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.reactor, self.label)?;
        if !self.triggers.is_empty() {
            write!(f, " on [")?;
            for (index, name) in self.triggers.iter().enumerate() {
                if index > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{}", tidy_type_name(name))?;
            }
            write!(f, "]")?;
        }
        Ok(())
    }
}

/// How the scheduler treats tasks of one reaction.
#[derive(Clone, Default)]
pub struct ReactionOptions {
    pub priority: Priority,
    /// Mutual-exclusion group; at most one member task runs at a time.
    pub sync: Option<Arc<SyncGroup>>,
    /// Upper bound on queued-or-running tasks. `Some(1)` is the `single` option,
    /// `Some(n)` is `buffer(n)`, `None` is unlimited.
    pub max_active: Option<u64>,
    /// Route tasks to the main-thread queue instead of the worker pool.
    pub main_thread: bool,
}

impl fmt::Debug for ReactionOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReactionOptions")
            .field("priority", &self.priority)
            .field("sync", &self.sync.as_ref().map(|group| group.key_name()))
            .field("max_active", &self.max_active)
            .field("main_thread", &self.main_thread)
            .finish()
    }
}

/// Consults the runtime at stimulus time and produces a databound task, or `None`
/// when a precondition failed or a required input was missing.
pub(crate) type Generator =
    Box<dyn Fn(&Arc<Reaction>) -> Option<ReactionTask> + Send + Sync>;

/// Removes every registration the declaration made. Runs at most once.
pub(crate) type Unbinder = Box<dyn Fn(&Reaction) + Send + Sync>;

/// Immutable descriptor of a bound callback: identity, options, and the generator
/// that turns stimuli into [`ReactionTask`]s.
///
/// Shared ownership: the dispatcher's subscription tables, the user's
/// [`ReactionHandle`], and every in-flight task hold an `Arc` to the reaction, so a
/// task never outlives its reaction even after the owning reactor is gone.
///
/// [`ReactionHandle`]: super::ReactionHandle
pub struct Reaction {
    id: ReactionId,
    identifier: Identifier,
    options: ReactionOptions,
    enabled: AtomicBool,
    /// Number of tasks currently queued or running for this reaction.
    active_tasks: AtomicU64,
    /// Suppressed for reactions triggered by the statistics stream itself.
    emit_stats: bool,
    generator: Generator,
    unbinder: Mutex<Option<Unbinder>>,
}

impl fmt::Debug for Reaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reaction")
            .field("id", &self.id)
            .field("identifier", &self.identifier.to_string())
            .field("enabled", &self.is_enabled())
            .field("active_tasks", &self.active_tasks())
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl Reaction {
    pub(crate) fn new(
        identifier: Identifier,
        options: ReactionOptions,
        emit_stats: bool,
        generator: Generator,
    ) -> Arc<Self> {
        Arc::new(Self {
            id: NEXT_REACTION_ID.fetch_add(1, Ordering::Relaxed),
            identifier,
            options,
            enabled: AtomicBool::new(true),
            active_tasks: AtomicU64::new(0),
            emit_stats,
            generator,
            unbinder: Mutex::new(None),
        })
    }

    #[must_use]
    pub fn id(&self) -> ReactionId { self.id }

    #[must_use]
    pub fn identifier(&self) -> &Identifier { &self.identifier }

    pub(crate) fn options(&self) -> &ReactionOptions { &self.options }

    pub(crate) fn emit_stats(&self) -> bool { self.emit_stats }

    #[must_use]
    pub fn is_enabled(&self) -> bool { self.enabled.load(Ordering::Acquire) }

    pub(crate) fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Release);
    }

    /// Tasks currently queued or running.
    #[must_use]
    pub fn active_tasks(&self) -> u64 { self.active_tasks.load(Ordering::Acquire) }

    /// Claims an active-task slot, refusing when the `single`/`buffer` bound is hit.
    pub(crate) fn try_claim_slot(&self) -> bool {
        match self.options.max_active {
            None => {
                self.active_tasks.fetch_add(1, Ordering::AcqRel);
                true
            }
            Some(max) => self
                .active_tasks
                .fetch_update(Ordering::AcqRel, Ordering::Acquire, |active| {
                    (active < max).then_some(active + 1)
                })
                .is_ok(),
        }
    }

    pub(crate) fn release_slot(&self) {
        self.active_tasks.fetch_sub(1, Ordering::AcqRel);
    }

    /// Produces a databound task for one stimulus, or `None` when the reaction is
    /// disabled, its concurrency bound is hit, a precondition failed, or a required
    /// input was missing.
    pub(crate) fn get_task(self: &Arc<Self>) -> Option<ReactionTask> {
        if !self.is_enabled() {
            return None;
        }
        if !self.try_claim_slot() {
            tracing::trace!(
                reaction_id = self.id,
                active = self.active_tasks(),
                "concurrency bound hit, dropping submission"
            );
            return None;
        }
        match (self.generator)(self) {
            Some(task) => Some(task),
            None => {
                self.release_slot();
                None
            }
        }
    }

    pub(crate) fn set_unbinder(&self, unbinder: Unbinder) {
        let mut slot = self.unbinder.lock().expect("reaction unbinder lock poisoned");
        *slot = Some(unbinder);
    }

    /// Removes every subscription/registration this reaction holds and disables it.
    ///
    /// In-flight tasks run to completion; no new tasks start. Idempotent.
    pub fn unbind(&self) {
        self.set_enabled(false);
        let unbinder = {
            let mut slot =
                self.unbinder.lock().expect("reaction unbinder lock poisoned");
            slot.take()
        };
        if let Some(unbinder) = unbinder {
            unbinder(self);
        }
    }
}
