// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! End-to-end scenarios: a real plant with real threads, driven to shutdown.

mod support;

mod custom_get;
mod emit_initialize;
mod every_per;
mod io_readiness;
mod panic_recovery;
mod startup_shutdown;
mod stats_stream;
mod sync_exclusive;
mod udp_word;
mod unbind_safety;
mod zero_workers;
