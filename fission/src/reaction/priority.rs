// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Scheduling priority for reaction tasks.

/// Priority with which a reaction's tasks are scheduled.
///
/// Ordering: `Realtime > High > Default > Low > Idle`. The scheduler always hands a
/// worker the highest-priority ready task; ties break FIFO by submission order.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash,
         strum_macros::Display)]
pub enum Priority {
    /// Only runs when nothing else is ready.
    Idle,
    Low,
    #[default]
    Default,
    High,
    /// Ahead of everything else.
    Realtime,
}
