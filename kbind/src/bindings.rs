#[allow(
    clippy::all,
    missing_docs,
    non_camel_case_types,
    non_upper_case_globals,
    non_snake_case,
    improper_ctypes,
    unreachable_pub,
    unsafe_op_in_unsafe_fn
)]
mod bindings {
    include!(concat!(env!("OUT_DIR"), "/bindings_c.rs"));
}
pub use bindings::*;

use core::ffi::{c_char, c_long, c_void};

pub const GFP_KERNEL: gfp_t = BINDINGS_GFP_KERNEL;

#[allow(non_snake_case)]
extern "C" {
    #[link_name = "rust_helper_class_create"]
    pub fn class_create(name: *const c_char) -> *mut class;

    #[link_name = "rust_helper_IS_ERR"]
    pub fn IS_ERR(ptr: *const c_void) -> bool;

    #[link_name = "rust_helper_PTR_ERR"]
    pub fn PTR_ERR(ptr: *const c_void) -> c_long;

    #[link_name = "rust_helper_file_name"]
    pub fn file_name(file: *mut file) -> *const c_char;

    pub fn bug_helper() -> !;
}
