//! Device numbers.
//!
//! C header: [`include/linux/kdev_t.h`](../../../../include/linux/kdev_t.h)

use core::fmt;

use crate::error::{linux_err::EINVAL, KernelResult};

pub const MINORBITS: u32 = 20;
pub const MINORMASK: u32 = (1 << MINORBITS) - 1;

/// Largest minor number that fits in a `dev_t`.
pub const MINOR_MAX: u32 = MINORMASK;

/// `CHRDEV_MAJOR_MAX`: statically requested majors must stay below this.
pub const CHRDEV_MAJOR_MAX: u32 = 512;

/// A `(major, minor)` pair naming a character device.
///
/// Once the host has handed one out it is never modified, only returned.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DeviceNumber {
    major: u32,
    minor: u32,
}

impl DeviceNumber {
    /// Equivalent to `MKDEV`.
    pub fn new(major: u32, minor: u32) -> KernelResult<Self> {
        if major > u32::MAX >> MINORBITS || minor > MINOR_MAX {
            return Err(EINVAL);
        }
        Ok(Self { major, minor })
    }

    /// Validates a major number supplied as a module parameter.
    ///
    /// Major `0` means "allocate dynamically" and is not a valid request here.
    pub fn fixed(major: u32, minor: u32) -> KernelResult<Self> {
        if major == 0 || major >= CHRDEV_MAJOR_MAX {
            log::error!(
                "major number {} out of range (1..{})",
                major,
                CHRDEV_MAJOR_MAX
            );
            return Err(EINVAL);
        }
        Self::new(major, minor)
    }

    pub fn major(&self) -> u32 {
        self.major
    }

    pub fn minor(&self) -> u32 {
        self.minor
    }

    /// Encodes as the kernel's internal `dev_t`.
    pub fn to_dev_t(&self) -> u32 {
        (self.major << MINORBITS) | self.minor
    }

    pub fn from_dev_t(dev: u32) -> Self {
        Self {
            major: dev >> MINORBITS,
            minor: dev & MINORMASK,
        }
    }
}

impl fmt::Display for DeviceNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.major, self.minor)
    }
}
