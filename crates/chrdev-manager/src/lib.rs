#![no_std]
//! Character-device lifecycle manager.
//!
//! Binds a single readable device to the OS naming resources that expose it
//! to user space: a device-number range, a character-device binding, a device
//! class and a device node. Resources are acquired all-or-nothing on attach
//! and released in reverse order on detach, which waits for reads still in
//! flight.

// This must go first, so that the other modules see its macros.
#[macro_use]
mod fmt;

mod error;
mod guard;
mod handle;
mod identity;
mod manager;
mod registry;

pub use error::{AttachError, ReadFailure};
pub use handle::ReadHandle;
pub use identity::DeviceIdentity;
pub use manager::{DeviceManager, Lifecycle};
pub use registry::{
    CharDevice, ChrdevConfig, DevNum, DeviceRegistry, NodeMode, ProbeFailure,
    MINOR_COUNT,
};
