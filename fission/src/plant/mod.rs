// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! The runtime: [`Powerplant`], its shared internals, and the reactor contract.

mod bridge;
mod config;
mod error;
mod events;
mod handle;
pub(crate) mod inner;
mod logger;
mod powerplant;
mod reactor;

pub use bridge::*;
pub use config::*;
pub use error::*;
pub use events::*;
pub use handle::*;
pub use logger::*;
pub use powerplant::*;
pub use reactor::*;

pub(crate) use inner::PlantInner;
pub(crate) use reactor::ReactorRecord;
