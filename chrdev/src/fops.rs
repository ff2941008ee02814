//! File callbacks of the device node.
//!
//! None of them move data: `read` and `write` report zero bytes and never touch
//! the user buffer. They exist to log who is calling.

use crate::{
    error::{linux_err::EINVAL, KernelResult},
    number::DeviceNumber,
    params::Capabilities,
};

const SEPARATOR: &str = "-----------------------------------------------------";

/// What a callback knows about its caller.
#[derive(Clone, Copy, Debug)]
pub struct FileContext<'a> {
    /// Opaque identity of the open file (the `struct file *` in the kernel).
    pub handle: usize,
    /// Path of the file as opened, if the host could resolve it.
    pub file_name: Option<&'a str>,
}

impl<'a> FileContext<'a> {
    pub fn new(handle: usize) -> Self {
        Self {
            handle,
            file_name: None,
        }
    }

    pub fn with_file_name(mut self, file_name: &'a str) -> Self {
        self.file_name = Some(file_name);
        self
    }
}

/// The callbacks bound to the cdev.
///
/// Holds only immutable data, so it is `Copy` and may be called from any
/// number of threads at once.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FileOps {
    capabilities: Capabilities,
    number: DeviceNumber,
}

impl FileOps {
    pub fn new(capabilities: Capabilities, number: DeviceNumber) -> Self {
        Self {
            capabilities,
            number,
        }
    }

    pub fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    pub fn number(&self) -> DeviceNumber {
        self.number
    }

    pub fn open(&self, file: &FileContext<'_>) -> KernelResult<()> {
        self.log_call("device_open", "open", file, format_args!(""));
        log::info!("Device opened successfully");
        log::info!("{}", SEPARATOR);
        Ok(())
    }

    pub fn release(&self, file: &FileContext<'_>) -> KernelResult<()> {
        self.log_call("device_release", "release", file, format_args!(""));
        log::info!("Device closed successfully");
        log::info!("{}", SEPARATOR);
        Ok(())
    }

    /// Returns the number of bytes copied out, which is always zero.
    pub fn read(&self, file: &FileContext<'_>, len: usize, offset: u64) -> KernelResult<usize> {
        if !self.capabilities.contains(Capabilities::READ_WRITE) {
            return Err(EINVAL);
        }
        self.log_call(
            "device_read",
            "read",
            file,
            format_args!(", {} bytes at offset {}", len, offset),
        );
        log::info!("Read 0 bytes");
        log::info!("{}", SEPARATOR);
        Ok(0)
    }

    /// Returns the number of bytes consumed, which is always zero.
    pub fn write(&self, file: &FileContext<'_>, len: usize, offset: u64) -> KernelResult<usize> {
        if !self.capabilities.contains(Capabilities::READ_WRITE) {
            return Err(EINVAL);
        }
        self.log_call(
            "device_write",
            "write",
            file,
            format_args!(", {} bytes at offset {}", len, offset),
        );
        log::info!("Wrote 0 bytes");
        log::info!("{}", SEPARATOR);
        Ok(0)
    }

    fn log_call(
        &self,
        callback: &str,
        op: &str,
        file: &FileContext<'_>,
        extra: core::fmt::Arguments<'_>,
    ) {
        log::info!("{}", SEPARATOR);
        log::info!("{} {} - {} was called", callback, self.number, op);
        log::info!("{}({:#x}){}", callback, file.handle, extra);
        if self.capabilities.contains(Capabilities::LOG_FILE_NAME) {
            log::info!("file: {}", file.file_name.unwrap_or("<unknown>"));
        }
    }
}
