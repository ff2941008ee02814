use alloc::ffi::CString;
use core::ffi::CStr;

use crate::error::{linux_err::EINVAL, KernelResult};

/// Copies `name` into a `NUL`-terminated string for the C side.
///
/// Names with an interior `NUL` are rejected with `EINVAL`.
pub fn to_cstring(name: &str) -> KernelResult<CString> {
    CString::new(name).map_err(|_| EINVAL)
}

/// Borrows a C string as `&str`, or `None` if it is null or not UTF-8.
///
/// # Safety
///
/// `ptr` must be null or point to a `NUL`-terminated string that outlives `'a`.
pub unsafe fn from_char_ptr<'a>(ptr: *const core::ffi::c_char) -> Option<&'a str> {
    if ptr.is_null() {
        return None;
    }
    // SAFETY: Non-null, and the caller guarantees termination and lifetime.
    unsafe { CStr::from_ptr(ptr) }.to_str().ok()
}
