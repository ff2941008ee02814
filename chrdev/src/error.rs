use core::{
    ffi::c_int,
    fmt,
    fmt::{Debug, Display},
    num::ParseIntError,
};

/// Largest errno the kernel hands back encoded in a pointer or return value.
pub const MAX_ERRNO: c_int = 4095;

pub type KernelResult<T> = Result<T, Error>;

/// A negative kernel error code.
///
/// # Invariants
///
/// The value is always in `-MAX_ERRNO..0`.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Error(c_int);

impl Error {
    /// Wraps a (negative) return value from the host.
    ///
    /// Anything outside the errno range collapses to [`linux_err::EINVAL`].
    pub fn from_errno(errno: c_int) -> Error {
        if !(-MAX_ERRNO..0).contains(&errno) {
            log::warn!(
                "attempted to create `Error` with out of range `errno`: {}",
                errno
            );
            return linux_err::EINVAL;
        }
        // INVARIANT: The check above ensures the type invariant
        // will hold.
        Error(errno)
    }

    pub fn to_errno(&self) -> c_int {
        self.0
    }

    /// Returns the symbolic name of the error, if one exists.
    pub fn name(&self) -> Option<&'static str> {
        linux_err::name(self.0)
    }
}

impl Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            // Print out number if no name can be found.
            None => f.debug_tuple("Error").field(&-self.0).finish(),
            Some(name) => f.debug_tuple(name).finish(),
        }
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            None => write!(f, "error {}", self.0),
            Some(name) => write!(f, "{} ({})", name, self.0),
        }
    }
}

/// Contains the C-compatible error codes.
#[rustfmt::skip]
pub mod linux_err {
    macro_rules! declare_err {
        ($($err:ident = $num:literal, $doc:expr;)+) => {
            $(
            #[doc = $doc]
            pub const $err: super::Error = super::Error(-$num);
            )+

            pub(crate) fn name(errno: core::ffi::c_int) -> Option<&'static str> {
                match -errno {
                    $($num => Some(stringify!($err)),)+
                    _ => None,
                }
            }
        };
    }

    declare_err! {
        EPERM = 1, "Operation not permitted.";
        ENOENT = 2, "No such file or directory.";
        EINTR = 4, "Interrupted system call.";
        EIO = 5, "I/O error.";
        ENXIO = 6, "No such device or address.";
        EBADF = 9, "Bad file number.";
        EAGAIN = 11, "Try again.";
        ENOMEM = 12, "Out of memory.";
        EACCES = 13, "Permission denied.";
        EFAULT = 14, "Bad address.";
        EBUSY = 16, "Device or resource busy.";
        EEXIST = 17, "File exists.";
        ENODEV = 19, "No such device.";
        EINVAL = 22, "Invalid argument.";
        ENFILE = 23, "File table overflow.";
        EMFILE = 24, "Too many open files.";
        ENOTTY = 25, "Not a typewriter.";
        ENOSPC = 28, "No space left on device.";
        ERANGE = 34, "Math result not representable.";
    }
}

impl From<ParseIntError> for Error {
    fn from(_: ParseIntError) -> Error {
        linux_err::EINVAL
    }
}

/// Failure of one registration step.
///
/// The wrapped [`Error`] is the code the host returned, untouched. Every
/// resource acquired before the failing step has already been released when
/// this value reaches the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitError {
    /// The device number region could not be allocated or reserved.
    ReserveRegion(Error),
    /// The cdev could not be bound to the reserved region.
    AddCdev(Error),
    /// The device class could not be created.
    CreateClass(Error),
    /// The device node could not be created under the class.
    CreateDevice(Error),
}

impl InitError {
    pub fn error(&self) -> Error {
        match *self {
            InitError::ReserveRegion(e)
            | InitError::AddCdev(e)
            | InitError::CreateClass(e)
            | InitError::CreateDevice(e) => e,
        }
    }

    /// The signed code handed back to the module loader.
    pub fn to_errno(&self) -> c_int {
        self.error().to_errno()
    }

    fn step(&self) -> &'static str {
        match self {
            InitError::ReserveRegion(_) => "reserve the device number region",
            InitError::AddCdev(_) => "add the character device",
            InitError::CreateClass(_) => "create the device class",
            InitError::CreateDevice(_) => "create the device",
        }
    }
}

impl Display for InitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to {}: {}", self.step(), self.error())
    }
}

impl From<InitError> for Error {
    fn from(e: InitError) -> Error {
        e.error()
    }
}
