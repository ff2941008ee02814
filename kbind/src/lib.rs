//! Bindings to the pieces of the kernel a character device driver needs.
//!
//! The raw declarations are generated by `bindgen` at build time; the modules
//! here add errno conversion, `printk` based printing and a `log` backend.
#![no_std]
extern crate alloc;

pub mod bindings;
pub mod error;
mod kalloc;
pub mod logger;
pub mod printk;
pub mod str;

pub use error::{from_err_ptr, linux_err, to_result, Error, KernelResult};
