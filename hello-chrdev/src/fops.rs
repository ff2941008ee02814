//! C entry points of the `file_operations` table.
//!
//! The table and the `struct cdev` live together in a pinned [`CdevBox`], which
//! also carries the [`FileOps`] the callbacks dispatch to. `open` recovers the
//! box from `inode->i_cdev` and stashes the `FileOps` in `file->private_data`
//! for the other callbacks.

use core::{
    ffi::{c_char, c_int, c_void},
    marker::PhantomPinned,
    mem::offset_of,
    ptr::addr_of_mut,
};

use chrdev::{DispatchTable, FileContext, FileOps, KernelResult};
use kbind::{bindings, str::from_char_ptr};

/// A `struct cdev`, its `file_operations` and the callbacks behind them.
///
/// The kernel keeps pointers into this structure for as long as the cdev is
/// registered, so it is never moved.
pub struct CdevBox {
    pub(crate) cdev: bindings::cdev,
    pub(crate) fops: bindings::file_operations,
    ops: FileOps,
    _pin: PhantomPinned,
}

impl CdevBox {
    pub(crate) fn new(table: DispatchTable, ops: FileOps) -> Self {
        Self {
            cdev: bindings::cdev::default(),
            fops: file_operations(table),
            ops,
            _pin: PhantomPinned,
        }
    }
}

fn file_operations(table: DispatchTable) -> bindings::file_operations {
    bindings::file_operations {
        // SAFETY: Only the address of the module is taken.
        owner: unsafe { addr_of_mut!(bindings::__this_module) },
        open: table.contains(DispatchTable::OPEN).then_some(open_callback as _),
        release: table
            .contains(DispatchTable::RELEASE)
            .then_some(release_callback as _),
        read: table.contains(DispatchTable::READ).then_some(read_callback as _),
        write: table.contains(DispatchTable::WRITE).then_some(write_callback as _),
        ..Default::default()
    }
}

/// Builds the caller description handed to the callbacks.
///
/// # Safety
///
/// `file` must be a valid `struct file` for the duration of the call.
unsafe fn context<'a>(file: *mut bindings::file) -> FileContext<'a> {
    let context = FileContext::new(file as usize);
    // SAFETY: `file` is valid; the dentry name outlives the callback.
    match unsafe { from_char_ptr(bindings::file_name(file)) } {
        Some(name) => context.with_file_name(name),
        None => context,
    }
}

/// # Safety
///
/// `private_data` must have been set by [`open_callback`].
unsafe fn ops_of<'a>(file: *mut bindings::file) -> &'a FileOps {
    // SAFETY: `open_callback` stored a pointer into a live `CdevBox`, which
    // outlives every open file because the file pins the module.
    unsafe { &*((*file).private_data as *const FileOps) }
}

fn to_ret(result: KernelResult<()>) -> c_int {
    match result {
        Ok(()) => 0,
        Err(e) => e.to_errno(),
    }
}

fn to_ssize(result: KernelResult<usize>) -> bindings::ssize_t {
    match result {
        Ok(n) => n as bindings::ssize_t,
        Err(e) => e.to_errno() as bindings::ssize_t,
    }
}

unsafe extern "C" fn open_callback(inode: *mut bindings::inode, file: *mut bindings::file) -> c_int {
    // SAFETY: The cdev this inode points at is the `cdev` field of a `CdevBox`,
    // since that is the only cdev whose table installs this callback.
    let ops = unsafe {
        let cdev = (*inode).i_cdev as *const u8;
        let cdev_box = cdev.wrapping_sub(offset_of!(CdevBox, cdev)) as *const CdevBox;
        &(*cdev_box).ops
    };
    // SAFETY: `file` is valid for the duration of `open`.
    unsafe { (*file).private_data = ops as *const FileOps as *mut c_void };
    // SAFETY: As above.
    to_ret(ops.open(&unsafe { context(file) }))
}

unsafe extern "C" fn release_callback(
    _inode: *mut bindings::inode,
    file: *mut bindings::file,
) -> c_int {
    // SAFETY: `release` only runs on files that went through `open`.
    let ops = unsafe { ops_of(file) };
    to_ret(ops.release(&unsafe { context(file) }))
}

unsafe extern "C" fn read_callback(
    file: *mut bindings::file,
    _buf: *mut c_char,
    len: usize,
    offset: *mut bindings::loff_t,
) -> bindings::ssize_t {
    // SAFETY: `read` only runs on files that went through `open`; `offset` is
    // valid for the duration of the call.
    let (ops, offset) = unsafe { (ops_of(file), *offset) };
    to_ssize(ops.read(&unsafe { context(file) }, len, offset as u64))
}

unsafe extern "C" fn write_callback(
    file: *mut bindings::file,
    _buf: *const c_char,
    len: usize,
    offset: *mut bindings::loff_t,
) -> bindings::ssize_t {
    // SAFETY: As in `read_callback`.
    let (ops, offset) = unsafe { (ops_of(file), *offset) };
    to_ssize(ops.write(&unsafe { context(file) }, len, offset as u64))
}
