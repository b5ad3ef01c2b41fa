// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! `on(words...)` builder: composes words and options into one bound [`Reaction`].

use super::{BindCtx, Word};
use crate::{plant::{BindError, Handle, Setup},
            reaction::{Generator, Identifier, Priority, Reaction, ReactionHandle,
                       ReactionOptions, ReactionTask, TaskStats},
            scheduler::sync_group_for};
use smallvec::SmallVec;
use std::{any::TypeId, sync::Arc};

/// Builder returned by [`Setup::on`]. Configure scheduling options, then finish
/// with [`OnBuilder::then`].
#[allow(missing_debug_implementations)]
#[must_use = "a declaration does nothing until .then(label, callback) binds it"]
pub struct OnBuilder<'a, W: Word> {
    setup: &'a mut Setup,
    words: W,
    options: ReactionOptions,
}

impl<'a, W: Word> OnBuilder<'a, W> {
    pub(crate) fn new(setup: &'a mut Setup, words: W) -> Self {
        Self { setup, words, options: ReactionOptions::default() }
    }

    /// Sets the scheduling priority (default [`Priority::Default`]).
    pub fn priority(mut self, priority: Priority) -> Self {
        self.options.priority = priority;
        self
    }

    /// Joins the mutual-exclusion group keyed by `K`: at most one task of the whole
    /// group runs at a time, across all workers.
    pub fn sync<K: 'static>(mut self) -> Self {
        self.options.sync = Some(sync_group_for::<K>());
        self
    }

    /// Drops submissions while one task of this reaction is queued or running.
    pub fn single(mut self) -> Self {
        self.options.max_active = Some(1);
        self
    }

    /// Allows up to `n` queued-or-running tasks; further submissions are dropped.
    pub fn buffer(mut self, n: u64) -> Self {
        self.options.max_active = Some(n);
        self
    }

    /// Routes this reaction's tasks to the thread that called `start()`.
    pub fn main_thread(mut self) -> Self {
        self.options.main_thread = true;
        self
    }

    /// Binds the declaration: runs every word's bind hook, registers the reaction,
    /// and returns its handle.
    ///
    /// # Errors
    ///
    /// Propagates the first word's bind failure; everything already bound by
    /// earlier words is rolled back and the reaction is not registered.
    pub fn then<F>(
        self,
        label: impl Into<String>,
        callback: F,
    ) -> Result<ReactionHandle, BindError>
    where
        F: Fn(&Handle, W::Args) + Send + Sync + 'static,
    {
        let OnBuilder { setup, words, options } = self;
        let handle = setup.handle();

        let mut triggers: Vec<(TypeId, &'static str)> = Vec::new();
        words.trigger_types(&mut triggers);
        let mut arg_names: Vec<&'static str> = Vec::new();
        words.arg_types(&mut arg_names);
        let arg_names: SmallVec<[&'static str; 4]> = arg_names.into_iter().collect();

        let identifier = Identifier {
            reactor: setup.name().to_string(),
            label: label.into(),
            triggers: triggers.iter().map(|(_, name)| *name).collect(),
        };
        // Reactions listening to the statistics stream must not feed it.
        let emit_stats = !triggers
            .iter()
            .any(|(type_id, _)| *type_id == TypeId::of::<TaskStats>());

        let words = Arc::new(words);
        let callback = Arc::new(callback);

        let generator: Generator = {
            let words = Arc::clone(&words);
            let handle = handle.clone();
            let callback = Arc::clone(&callback);
            let arg_names = arg_names.clone();
            Box::new(move |reaction: &Arc<Reaction>| {
                if !words.precondition(&handle) {
                    return None;
                }
                let args = match words.fetch(&handle) {
                    Some(args) => args,
                    None => {
                        tracing::debug!(
                            reaction_id = reaction.id(),
                            reaction = %reaction.identifier(),
                            wants = ?arg_names,
                            "required input missing, skipping"
                        );
                        return None;
                    }
                };
                let callback = Arc::clone(&callback);
                let callback_handle = handle.clone();
                Some(ReactionTask::new(
                    Arc::clone(reaction),
                    Box::new(move || callback(&callback_handle, args)),
                    arg_names.clone(),
                ))
            })
        };

        let reaction = Reaction::new(identifier, options, emit_stats, generator);

        let mut unbinders = Vec::new();
        {
            let mut ctx = BindCtx {
                handle: handle.clone(),
                reaction: &reaction,
                unbinders: &mut unbinders,
            };
            if let Err(error) = words.bind(&mut ctx) {
                // Roll back whatever earlier words already registered.
                for unbinder in &unbinders {
                    unbinder(&reaction);
                }
                return Err(error);
            }
        }
        reaction.set_unbinder(Box::new(move |target| {
            for unbinder in &unbinders {
                unbinder(target);
            }
        }));

        tracing::debug!(
            reaction_id = reaction.id(),
            reaction = %reaction.identifier(),
            "bound reaction"
        );
        let reaction_handle = ReactionHandle::new(reaction);
        setup.record_handle(reaction_handle.clone());
        Ok(reaction_handle)
    }
}
