// SPDX-License-Identifier: GPL-2.0

//! Hello world character device.
//!
//! On load it prints a banner `cnt` times, registers `/dev/helloworld` (on the
//! major given by `major_num`, or a dynamic one) and logs every open, release,
//! read and write on it. On unload it says good bye `cnt` times and removes
//! everything again.
#![no_std]
extern crate alloc;

mod fops;
mod host;

use core::{cell::UnsafeCell, ffi::c_int};

use chrdev::{Capabilities, Config, Driver, ModuleParams};
use kbind::{bindings, logger, pr_err};

use crate::host::KernelHost;

extern "C" {
    fn hello_param_cnt() -> c_int;
    fn hello_param_major_num() -> c_int;
}

/// The driver between `init_module` and `cleanup_module`.
struct ModuleSlot(UnsafeCell<Option<Driver<KernelHost>>>);

// SAFETY: The slot is only touched by `init_module` and `cleanup_module`,
// which the module loader never runs concurrently.
unsafe impl Sync for ModuleSlot {}

static DRIVER: ModuleSlot = ModuleSlot(UnsafeCell::new(None));

fn capabilities() -> Capabilities {
    let mut capabilities = Capabilities::MINIMAL;
    if cfg!(feature = "read-write") {
        capabilities |= Capabilities::READ_WRITE;
    }
    if cfg!(feature = "file-name") {
        capabilities |= Capabilities::LOG_FILE_NAME;
    }
    capabilities
}

fn load() -> Result<Driver<KernelHost>, c_int> {
    logger::init_logger().map_err(|e| e.to_errno())?;

    // SAFETY: Plain reads of module parameters.
    let params = unsafe {
        ModuleParams {
            cnt: hello_param_cnt(),
            major_num: hello_param_major_num(),
        }
    };
    let config = Config::from_params(params)
        .map_err(|e| e.to_errno())?
        .with_capabilities(capabilities())
        .with_module(env!("CARGO_CRATE_NAME"), env!("CARGO_PKG_VERSION"));

    let mut driver = Driver::new(KernelHost, config);
    driver.initialize().map_err(|e| e.to_errno())?;
    Ok(driver)
}

#[no_mangle]
pub extern "C" fn init_module() -> c_int {
    match load() {
        Ok(driver) => {
            // SAFETY: See `ModuleSlot`.
            unsafe { *DRIVER.0.get() = Some(driver) };
            0
        }
        Err(errno) => errno,
    }
}

#[no_mangle]
pub extern "C" fn cleanup_module() {
    // SAFETY: See `ModuleSlot`. Dropping the driver unregisters the device.
    drop(unsafe { (*DRIVER.0.get()).take() });
}

#[panic_handler]
fn panic(info: &core::panic::PanicInfo) -> ! {
    pr_err!("hello_chrdev panicked: {}", info);
    // SAFETY: `BUG()` never returns.
    unsafe { bindings::bug_helper() }
}
