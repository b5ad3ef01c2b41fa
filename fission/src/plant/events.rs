// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Lifecycle events, modeled as ordinary emits.

/// Emitted once, locally, when `start()` enters the running state (after queued
/// `Initialize`-scope emits have been delivered).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Startup;

/// Emitted with `Direct` scope when shutdown begins, so subscribers (including the
/// built-in tick and fd services) observe it before the scheduler stops.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Shutdown;
