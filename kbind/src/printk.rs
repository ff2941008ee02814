use core::{cmp, ffi::c_int, fmt};

use crate::bindings;

/// Prints `s` at `level`, which is one of the `KERN_*` constants.
#[doc(hidden)]
pub fn printk(level: &[u8], s: &[u8]) {
    // Don't copy the trailing NUL from `KERN_*`.
    let level = &level[..level.len() - 1];
    let mut fmt_str = [0; 8];
    debug_assert!(level.len() + b"%.*s\0".len() <= fmt_str.len());
    fmt_str[..level.len()].copy_from_slice(level);
    fmt_str[level.len()..level.len() + b"%.*s\0".len()].copy_from_slice(b"%.*s\0");

    // SAFETY: `fmt_str` is NUL-terminated and `%.*s` is given the length of `s`.
    unsafe { bindings::_printk(fmt_str.as_ptr() as _, s.len() as c_int, s.as_ptr()) };
}

// From kernel/print/printk.c
const LOG_LINE_MAX: usize = 1024 - 32;

#[doc(hidden)]
pub struct LogLineWriter {
    data: [u8; LOG_LINE_MAX],
    pos: usize,
}

#[allow(clippy::new_without_default)]
impl LogLineWriter {
    pub fn new() -> LogLineWriter {
        LogLineWriter {
            data: [0u8; LOG_LINE_MAX],
            pos: 0,
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data[..self.pos]
    }
}

impl fmt::Write for LogLineWriter {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        let copy_len = cmp::min(LOG_LINE_MAX - self.pos, s.len());
        self.data[self.pos..self.pos + copy_len].copy_from_slice(&s.as_bytes()[..copy_len]);
        self.pos += copy_len;
        Ok(())
    }
}

/// Formats one line and prints it at `level`. Lines longer than the kernel's
/// record size are truncated.
#[doc(hidden)]
pub fn print_line(level: &[u8], args: fmt::Arguments<'_>) {
    let mut writer = LogLineWriter::new();
    // `LogLineWriter` never fails, it truncates.
    let _ = fmt::write(&mut writer, args);
    let _ = fmt::Write::write_str(&mut writer, "\n");
    printk(level, writer.as_bytes());
}

/// [`println!`] functions the same as it does in `std`, except instead of
/// printing to `stdout`, it writes to the kernel console at the `KERN_INFO`
/// level.
///
/// [`println!`]: https://doc.rust-lang.org/stable/std/macro.println.html
#[macro_export]
macro_rules! println {
    () => ({
        $crate::printk::printk($crate::bindings::KERN_INFO, "\n".as_bytes());
    });
    ($($arg:tt)*) => ({
        $crate::printk::print_line($crate::bindings::KERN_INFO, format_args!($($arg)*));
    });
}

#[macro_export]
macro_rules! pr_alert {
    ($($arg:tt)*) => ({
        $crate::printk::print_line($crate::bindings::KERN_ALERT, format_args!($($arg)*));
    });
}

#[macro_export]
macro_rules! pr_err {
    ($($arg:tt)*) => ({
        $crate::printk::print_line($crate::bindings::KERN_ERR, format_args!($($arg)*));
    });
}

#[macro_export]
macro_rules! pr_warn {
    ($($arg:tt)*) => ({
        $crate::printk::print_line($crate::bindings::KERN_WARNING, format_args!($($arg)*));
    });
}

#[macro_export]
macro_rules! pr_info {
    ($($arg:tt)*) => ({
        $crate::printk::print_line($crate::bindings::KERN_INFO, format_args!($($arg)*));
    });
}

#[macro_export]
macro_rules! pr_debug {
    ($($arg:tt)*) => ({
        $crate::printk::print_line($crate::bindings::KERN_DEBUG, format_args!($($arg)*));
    });
}
