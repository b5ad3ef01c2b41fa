// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Hook for the external networking collaborator.
//!
//! Wire-format networking is not part of the core. `Network`/`Udp`-scope emits hand
//! the erased value to whatever [`NetworkBridge`] is attached (serialization is the
//! bridge's business); received values come back in by wrapping them in
//! [`FromNetwork`] and emitting locally, which is what the `network::<T>()` word
//! subscribes to.

use std::{any::Any, sync::Arc};

/// External transport attached via [`Powerplant::attach_network`].
///
/// [`Powerplant::attach_network`]: super::Powerplant::attach_network
pub trait NetworkBridge: Send + Sync + 'static {
    /// A `Network`-scope emit. `type_name` identifies the payload's Rust type.
    fn publish(&self, type_name: &'static str, value: Arc<dyn Any + Send + Sync>);

    /// A `Udp`-scope emit. Defaults to [`NetworkBridge::publish`].
    fn publish_udp(&self, type_name: &'static str, value: Arc<dyn Any + Send + Sync>) {
        self.publish(type_name, value);
    }
}

/// Wrapper the bridge emits for values received from the network.
///
/// Reactions declared with `network::<T>()` trigger on `FromNetwork<T>`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FromNetwork<T>(pub T);

impl<T> std::ops::Deref for FromNetwork<T> {
    type Target = T;

    fn deref(&self) -> &T { &self.0 }
}
