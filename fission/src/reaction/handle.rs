// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! User-facing control surface for a bound reaction.

use super::{Reaction, ReactionId};
use std::sync::Arc;

/// Handle returned by `then(...)`.
///
/// Lets user code enable, disable, or unbind the reaction after declaration. The
/// declaring reactor keeps a copy of every handle it created and unbinds them all
/// when it is uninstalled.
#[derive(Clone, Debug)]
pub struct ReactionHandle {
    reaction: Arc<Reaction>,
}

impl ReactionHandle {
    pub(crate) fn new(reaction: Arc<Reaction>) -> Self { Self { reaction } }

    #[must_use]
    pub fn id(&self) -> ReactionId { self.reaction.id() }

    /// Disabled reactions produce no tasks; the subscription stays in place.
    pub fn disable(&self) { self.reaction.set_enabled(false); }

    pub fn enable(&self) { self.reaction.set_enabled(true); }

    #[must_use]
    pub fn is_enabled(&self) -> bool { self.reaction.is_enabled() }

    /// Removes every subscription/registration this reaction holds.
    ///
    /// In-flight tasks run to completion; no new tasks start.
    pub fn unbind(&self) { self.reaction.unbind(); }

    pub(crate) fn reaction(&self) -> &Arc<Reaction> { &self.reaction }
}
