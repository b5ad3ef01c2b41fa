// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Monotonic time source for the runtime.
//!
//! Every timestamp the runtime produces (task statistics, tick deadlines, jitter
//! measurements) comes from this one place so the rest of the crate never reaches for
//! wall-clock time by accident.

use std::time::Instant;

/// Current instant on the monotonic clock.
#[must_use]
pub fn now() -> Instant { Instant::now() }
