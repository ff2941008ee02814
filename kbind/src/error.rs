//! Conversion of kernel return conventions into [`Error`].
//!
//! The error type itself lives in `chrdev` so the lifecycle code can name it
//! without linking against the kernel.

use core::ffi::{c_int, c_void};

pub use chrdev::error::{linux_err, Error, KernelResult};

use crate::bindings;

/// Turns an `int` return value (`0` or a negative errno) into a result.
pub fn to_result(ret: c_int) -> KernelResult<()> {
    if ret < 0 {
        Err(Error::from_errno(ret))
    } else {
        Ok(())
    }
}

/// Checks a pointer returned by a function that encodes errors with `ERR_PTR`.
pub fn from_err_ptr<T>(ptr: *mut T) -> KernelResult<*mut T> {
    // SAFETY: `IS_ERR` and `PTR_ERR` only look at the pointer value.
    unsafe {
        if bindings::IS_ERR(ptr as *const c_void) {
            let errno = bindings::PTR_ERR(ptr as *const c_void);
            return Err(Error::from_errno(errno as c_int));
        }
    }
    Ok(ptr)
}
