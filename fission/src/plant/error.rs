// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Error types for binding declarations and running the plant.

use std::os::fd::RawFd;

/// Failure while binding a reaction declaration.
///
/// Bind-time failures are synchronous: `then(...)` returns the error and the
/// reaction is not registered (partial registrations are rolled back).
#[derive(Debug, thiserror::Error, miette::Diagnostic)]
pub enum BindError {
    /// The runtime behind this handle has been dropped.
    #[error("the runtime behind this handle is gone")]
    #[diagnostic(
        code(fission::bind::plant_gone),
        help("bind reactions while the Powerplant is alive, not after it was dropped")
    )]
    PlantGone,

    /// An `io(fd, ...)` word was given a descriptor that cannot be polled.
    #[error("file descriptor {fd} is not valid for readiness polling")]
    #[diagnostic(
        code(fission::bind::invalid_fd),
        help("the fd must be open and non-negative; pipes, sockets and fifos work")
    )]
    InvalidFd { fd: RawFd },

    /// Opening or binding a socket for a `udp(...)`/`tcp(...)` word failed.
    #[error("failed to {operation} for the {word} binding")]
    #[diagnostic(
        code(fission::bind::socket),
        help("check that the port is free and that the process may bind it")
    )]
    Socket {
        word: &'static str,
        operation: &'static str,
        #[source]
        source: std::io::Error,
    },

    /// A service thread for this declaration could not be spawned.
    #[error("failed to spawn service thread {name}")]
    #[diagnostic(
        code(fission::bind::service_spawn),
        help("the system may have reached its thread limit - check `ulimit -u`")
    )]
    ServiceSpawn {
        name: String,
        #[source]
        source: std::io::Error,
    },
}

/// Failure constructing or running the plant itself.
#[derive(Debug, thiserror::Error, miette::Diagnostic)]
pub enum PlantError {
    /// `start()` was called twice, or after shutdown.
    #[error("the powerplant has already been started")]
    #[diagnostic(code(fission::plant::already_started))]
    AlreadyStarted,

    /// Creating the readiness poller's OS resources failed.
    #[error("failed to create the readiness poller")]
    #[diagnostic(
        code(fission::plant::poll_resource),
        help(
            "check OS resource limits - use `ulimit -n` for file descriptors, \
             `cat /proc/sys/fs/file-max` for the system-wide limit"
        )
    )]
    PollResource(#[source] std::io::Error),

    /// A worker or service thread could not be spawned.
    #[error("failed to spawn thread {name}")]
    #[diagnostic(
        code(fission::plant::thread_spawn),
        help(
            "the system may have reached its thread limit - check `ulimit -u` \
             for the per-user limit, `cat /proc/sys/kernel/threads-max` for the \
             system-wide limit"
        )
    )]
    ThreadSpawn {
        name: String,
        #[source]
        source: std::io::Error,
    },

    /// Installing one of the built-in reactors failed.
    #[error(transparent)]
    #[diagnostic(transparent)]
    Bind(#[from] BindError),
}
