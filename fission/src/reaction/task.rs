// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! One scheduled invocation of a reaction, plus its statistics record.

use super::{Priority, Reaction, ReactionId};
use crate::clock;
use smallvec::SmallVec;
use std::{any::Any,
          fmt,
          panic::{AssertUnwindSafe, catch_unwind},
          sync::{Arc,
                 atomic::{AtomicU64, Ordering}},
          time::Instant};

/// Unique identity of a task. Monotonically increasing, process-wide.
pub type TaskId = u64;

static NEXT_TASK_ID: AtomicU64 = AtomicU64::new(1);

/// Statistics record for one task, emitted as a regular event after the task
/// completes so user reactions can subscribe to the stream.
///
/// Reactions that are themselves triggered by `TaskStats` do not produce stats
/// events (no feedback loop).
#[derive(Clone, Debug)]
pub struct TaskStats {
    pub reaction_id: ReactionId,
    pub task_id: TaskId,
    /// Name of the declaring reactor.
    pub reactor: String,
    /// The declaration's label.
    pub label: String,
    /// When the task was created (stimulus time).
    pub emitted: Instant,
    /// When a worker began running it. `None` if it never started.
    pub started: Option<Instant>,
    pub finished: Option<Instant>,
    /// Panic message if the callback panicked.
    pub panic: Option<String>,
    /// Type names of the arguments the callback was bound with.
    pub arg_types: SmallVec<[&'static str; 4]>,
}

/// A databound invocation of a [`Reaction`], ready to run.
///
/// Owned exclusively by whoever holds it; once a worker takes it, the worker owns it
/// until completion. Holds an `Arc` to its parent so the reaction outlives the task.
/// Dropping a task - run or not - releases its active-task slot.
#[allow(missing_debug_implementations)]
pub struct ReactionTask {
    task_id: TaskId,
    reaction: Arc<Reaction>,
    priority: Priority,
    main_thread: bool,
    runnable: Option<Box<dyn FnOnce() + Send>>,
    stats: TaskStats,
}

impl ReactionTask {
    pub(crate) fn new(
        reaction: Arc<Reaction>,
        runnable: Box<dyn FnOnce() + Send>,
        arg_types: SmallVec<[&'static str; 4]>,
    ) -> Self {
        let identifier = reaction.identifier();
        let task_id = NEXT_TASK_ID.fetch_add(1, Ordering::Relaxed);
        let stats = TaskStats {
            reaction_id: reaction.id(),
            task_id,
            reactor: identifier.reactor.clone(),
            label: identifier.label.clone(),
            emitted: clock::now(),
            started: None,
            finished: None,
            panic: None,
            arg_types,
        };
        let options = reaction.options();
        let priority = options.priority;
        let main_thread = options.main_thread;
        Self {
            task_id,
            reaction,
            priority,
            main_thread,
            runnable: Some(runnable),
            stats,
        }
    }

    #[must_use]
    pub fn task_id(&self) -> TaskId { self.task_id }

    #[must_use]
    pub fn priority(&self) -> Priority { self.priority }

    #[must_use]
    pub fn main_thread(&self) -> bool { self.main_thread }

    pub(crate) fn reaction(&self) -> &Arc<Reaction> { &self.reaction }

    /// Runs the bound callback, timing it and capturing a panic if one unwinds out.
    ///
    /// Consumes the task; the active-task slot is released when the task drops at the
    /// end of this call.
    pub(crate) fn run(mut self) -> TaskStats {
        self.stats.started = Some(clock::now());
        if let Some(runnable) = self.runnable.take() {
            if let Err(payload) = catch_unwind(AssertUnwindSafe(runnable)) {
                self.stats.panic = Some(panic_message(payload.as_ref()));
            }
        }
        self.stats.finished = Some(clock::now());
        self.stats.clone()
    }
}

impl Drop for ReactionTask {
    fn drop(&mut self) { self.reaction.release_slot(); }
}

impl fmt::Display for ReactionTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "task {} of {} ({})",
            self.task_id,
            self.reaction.identifier(),
            self.priority
        )
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
