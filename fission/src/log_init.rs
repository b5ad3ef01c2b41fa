// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Opt-in log rendering.
//!
//! The runtime only *emits* structured `tracing` events; rendering belongs to
//! whatever sink the embedding application installs. Binaries and tests that don't
//! bring their own subscriber can use this one-call default.

/// Installs a global `tracing-subscriber` fmt sink at `level`.
///
/// # Errors
///
/// Fails when a global subscriber is already installed.
pub fn try_init_tracing(level: tracing::Level) -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_thread_names(true)
        .with_target(false)
        .try_init()
        .map_err(|error| miette::miette!("failed to install tracing subscriber: {error}"))
}
