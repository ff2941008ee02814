// SPDX-License-Identifier: GPL-2.0

//! Lifecycle of a minimal character device.
//!
//! The driver reserves a device number region, binds a cdev carrying logging
//! file callbacks to it, creates a device class and a node under it, and on
//! unload releases all of that in reverse. The registration primitives come
//! from a [`Host`], so the same code runs in the kernel module and against a
//! fake in tests.
#![cfg_attr(not(test), no_std)]
extern crate alloc;

pub mod error;
pub mod fops;
pub mod host;
pub mod lifecycle;
pub mod number;
pub mod params;
pub mod unwind;

pub use error::{linux_err, Error, InitError, KernelResult};
pub use fops::{FileContext, FileOps};
pub use host::{DispatchTable, Host};
pub use lifecycle::{Driver, Registration, State, BANNER_TARGET};
pub use number::DeviceNumber;
pub use params::{Capabilities, Config, ModuleParams};
pub use unwind::{Resource, UnwindStack};
