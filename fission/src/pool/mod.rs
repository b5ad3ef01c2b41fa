// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Worker threads and long-lived service threads.
//!
//! Two kinds of threads live here:
//!
//! - **Workers** (`fission-worker-N`): run the scheduler drain loop the plant hands
//!   them. Their count is fixed at start; zero is legal (only main-thread tasks run).
//! - **Services**: dedicated threads for components that block outside the scheduler
//!   - the tick source, the fd poller, and any user-declared `always` reaction. Each
//!   registers a `run` body plus a `kill` callback that must make `run` return.
//!
//! Shutdown protocol: the plant first invokes every service's `kill`, then joins
//! services and workers. Services registered before [`ThreadPool::start`] are spawned
//! at start; services registered later spawn immediately.

use crate::plant::PlantError;
use std::{sync::{Mutex,
                 atomic::{AtomicBool, Ordering}},
          thread::JoinHandle};

/// A long-lived background loop with an interrupt callback.
pub(crate) struct ServiceTask {
    pub name: String,
    pub run: Box<dyn FnOnce() + Send>,
    pub kill: Box<dyn Fn() + Send + Sync>,
}

struct RunningService {
    name: String,
    kill: Box<dyn Fn() + Send + Sync>,
    handle: JoinHandle<()>,
}

/// Owns every thread the runtime spawns.
#[allow(missing_debug_implementations)]
#[derive(Default)]
pub struct ThreadPool {
    workers: Mutex<Vec<JoinHandle<()>>>,
    services: Mutex<Vec<RunningService>>,
    pending: Mutex<Vec<ServiceTask>>,
    started: AtomicBool,
}

impl ThreadPool {
    #[must_use]
    pub fn new() -> Self { Self::default() }

    /// Registers a service. Spawns immediately if the pool is already running,
    /// otherwise queues until [`ThreadPool::start`].
    pub(crate) fn add_service(&self, service: ServiceTask) -> Result<(), PlantError> {
        if self.started.load(Ordering::Acquire) {
            self.spawn_service(service)
        } else {
            self.pending
                .lock()
                .expect("pending service lock poisoned")
                .push(service);
            Ok(())
        }
    }

    /// Spawns `count` workers running `worker_body` plus every pending service.
    pub(crate) fn start(
        &self,
        count: usize,
        worker_body: impl Fn() + Send + Clone + 'static,
    ) -> Result<(), PlantError> {
        for index in 0..count {
            let name = format!("fission-worker-{index}");
            let body = worker_body.clone();
            let handle = std::thread::Builder::new()
                .name(name.clone())
                .spawn(body)
                .map_err(|source| PlantError::ThreadSpawn { name: name.clone(), source })?;
            self.workers.lock().expect("worker lock poisoned").push(handle);
        }

        self.started.store(true, Ordering::Release);

        let pending = {
            let mut pending = self.pending.lock().expect("pending service lock poisoned");
            std::mem::take(&mut *pending)
        };
        for service in pending {
            self.spawn_service(service)?;
        }
        Ok(())
    }

    /// Invokes every service's `kill` callback. Does not join; see
    /// [`ThreadPool::join_all`].
    pub(crate) fn kill_services(&self) {
        let services = self.services.lock().expect("service lock poisoned");
        for service in services.iter() {
            tracing::debug!(service = %service.name, "killing service");
            (service.kill)();
        }
    }

    /// Joins every service and worker thread. Called after
    /// [`ThreadPool::kill_services`] and after the scheduler has been shut down.
    pub(crate) fn join_all(&self) {
        let services = {
            let mut services = self.services.lock().expect("service lock poisoned");
            std::mem::take(&mut *services)
        };
        for service in services {
            if service.handle.join().is_err() {
                tracing::error!(service = %service.name, "service thread panicked");
            }
        }

        let workers = {
            let mut workers = self.workers.lock().expect("worker lock poisoned");
            std::mem::take(&mut *workers)
        };
        for worker in workers {
            if worker.join().is_err() {
                tracing::error!("worker thread panicked");
            }
        }
    }

    fn spawn_service(&self, service: ServiceTask) -> Result<(), PlantError> {
        let ServiceTask { name, run, kill } = service;
        let thread_name = format!("fission-{name}");
        let handle = std::thread::Builder::new()
            .name(thread_name.clone())
            .spawn(run)
            .map_err(|source| PlantError::ThreadSpawn { name: thread_name, source })?;
        self.services
            .lock()
            .expect("service lock poisoned")
            .push(RunningService { name, kill, handle });
        Ok(())
    }
}
