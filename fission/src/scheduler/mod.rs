// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Priority + sync-group work queue feeding the worker threads.
//!
//! # Ordering
//!
//! The ready queue is a max-heap keyed by `(priority, -submission_sequence)`: the
//! highest priority wins, and within equal priority the earlier submission runs
//! first. A task released from a sync group keeps its original sequence number, so
//! group members stay FIFO within their priority even when they waited.
//!
//! # Sync groups
//!
//! On submit, a task whose group is already active joins the group's pending queue
//! instead of the ready queue. [`TaskScheduler::complete`] releases the next pending
//! member (highest priority first) or deactivates the group.
//!
//! # Main-thread tasks
//!
//! Tasks flagged `main_thread` go to a separate queue that only the thread inside
//! [`Powerplant::start`] drains; pool workers never see them. Main-thread tasks
//! bypass sync-group queuing.
//!
//! # Shutdown
//!
//! [`TaskScheduler::shutdown`] wakes every blocked worker, discards queued tasks
//! (their active-task slots are released on drop), and rejects further submissions.
//! Tasks already handed to a worker run to completion.
//!
//! [`Powerplant::start`]: crate::plant::Powerplant::start

mod sync_group;

pub use sync_group::*;

use crate::reaction::ReactionTask;
use std::{cmp::Ordering as CmpOrdering,
          collections::BinaryHeap,
          sync::{Condvar, Mutex,
                 atomic::{AtomicU64, Ordering}}};

/// A task plus its submission sequence number, ordered for the ready heap.
pub(crate) struct QueuedTask {
    seq: u64,
    task: ReactionTask,
}

impl QueuedTask {
    pub(crate) fn into_task(self) -> ReactionTask { self.task }
}

impl PartialEq for QueuedTask {
    fn eq(&self, other: &Self) -> bool {
        self.task.priority() == other.task.priority() && self.seq == other.seq
    }
}

impl Eq for QueuedTask {}

impl PartialOrd for QueuedTask {
    fn partial_cmp(&self, other: &Self) -> Option<CmpOrdering> { Some(self.cmp(other)) }
}

impl Ord for QueuedTask {
    fn cmp(&self, other: &Self) -> CmpOrdering {
        self.task
            .priority()
            .cmp(&other.task.priority())
            // Earlier submission = greater, so the max-heap pops it first.
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

#[derive(Default)]
struct SchedulerState {
    ready: BinaryHeap<QueuedTask>,
    main_ready: BinaryHeap<QueuedTask>,
    /// Groups with a member task ready or running; drained at shutdown so their
    /// pending queues do not outlive the plant (the group registry is
    /// process-global).
    active_groups: Vec<std::sync::Arc<SyncGroup>>,
    shutdown: bool,
}

/// Accepts task submissions and hands them to workers in priority order under the
/// sync-group discipline.
#[allow(missing_debug_implementations)]
#[derive(Default)]
pub struct TaskScheduler {
    state: Mutex<SchedulerState>,
    worker_signal: Condvar,
    main_signal: Condvar,
    next_seq: AtomicU64,
}

impl TaskScheduler {
    #[must_use]
    pub fn new() -> Self { Self::default() }

    /// Enqueues a task. Silently drops it after shutdown.
    pub fn submit(&self, task: ReactionTask) {
        if self.is_shut_down() {
            return;
        }
        let queued = QueuedTask { seq: self.next_seq.fetch_add(1, Ordering::Relaxed), task };

        if queued.task.main_thread() {
            let mut state = self.lock_state();
            if state.shutdown {
                return;
            }
            state.main_ready.push(queued);
            self.main_signal.notify_all();
            return;
        }

        if let Some(group) = queued.task.reaction().options().sync.clone() {
            {
                let mut group_state = group.state();
                if group_state.active {
                    group_state.pending.push(queued);
                    return;
                }
                group_state.active = true;
            }
            self.lock_state().active_groups.push(group);
        }

        self.push_ready(queued);
    }

    /// Blocks until a pool task is ready or shutdown. `None` means "worker should
    /// exit".
    pub fn next(&self) -> Option<ReactionTask> {
        let mut state = self.lock_state();
        loop {
            if state.shutdown {
                return None;
            }
            if let Some(queued) = state.ready.pop() {
                return Some(queued.into_task());
            }
            state = self
                .worker_signal
                .wait(state)
                .expect("scheduler lock poisoned");
        }
    }

    /// Blocks until a main-thread task is ready or shutdown.
    pub fn next_main(&self) -> Option<ReactionTask> {
        let mut state = self.lock_state();
        loop {
            if state.shutdown {
                return None;
            }
            if let Some(queued) = state.main_ready.pop() {
                return Some(queued.into_task());
            }
            state = self
                .main_signal
                .wait(state)
                .expect("scheduler lock poisoned");
        }
    }

    /// Called by the worker after a pool task finishes: releases the task's sync
    /// group, promoting its next pending member if any.
    pub fn complete(&self, task_reaction: &crate::reaction::Reaction) {
        let Some(group) = task_reaction.options().sync.as_ref() else {
            return;
        };
        let released = {
            let mut group_state = group.state();
            match group_state.pending.pop() {
                Some(next) => Some(next),
                None => {
                    group_state.active = false;
                    None
                }
            }
        };
        match released {
            Some(queued) => self.push_ready(queued),
            None => {
                let mut state = self.lock_state();
                state.active_groups.retain(|active| !std::sync::Arc::ptr_eq(active, group));
            }
        }
    }

    /// Wakes all workers, discards queued tasks (including sync-group pending
    /// queues), and rejects further submissions.
    pub fn shutdown(&self) {
        let (dropped, groups) = {
            let mut state = self.lock_state();
            state.shutdown = true;
            let dropped = state.ready.len() + state.main_ready.len();
            state.ready.clear();
            state.main_ready.clear();
            (dropped, std::mem::take(&mut state.active_groups))
        };
        // The registry outlives the plant; leave every group clean for the next one.
        for group in groups {
            let mut group_state = group.state();
            group_state.pending.clear();
            group_state.active = false;
        }
        if dropped > 0 {
            tracing::debug!(dropped, "discarded queued tasks at shutdown");
        }
        self.worker_signal.notify_all();
        self.main_signal.notify_all();
    }

    #[must_use]
    pub fn is_shut_down(&self) -> bool { self.lock_state().shutdown }

    fn push_ready(&self, queued: QueuedTask) {
        let mut state = self.lock_state();
        if state.shutdown {
            return;
        }
        state.ready.push(queued);
        self.worker_signal.notify_one();
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, SchedulerState> {
        self.state.lock().expect("scheduler lock poisoned")
    }

    #[cfg(test)]
    pub(crate) fn queued_counts(&self) -> (usize, usize) {
        let state = self.lock_state();
        (state.ready.len(), state.main_ready.len())
    }
}
