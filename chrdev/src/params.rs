//! Load-time configuration.
//!
//! The module exposes two parameters, `cnt` and `major_num`, which are set on
//! the `insmod` command line and never change afterwards. [`ModuleParams`]
//! holds the raw values; [`Config`] is the validated form the lifecycle uses.

use core::ffi::c_int;

use crate::{
    error::{linux_err::EINVAL, KernelResult},
    number::{DeviceNumber, CHRDEV_MAJOR_MAX},
};

/// Name used for the region, the class and the node unless overridden.
pub const DEFAULT_NAME: &str = "helloworld";

bitflags::bitflags! {
    /// Optional behaviour of the file callbacks.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct Capabilities: u32 {
        /// Install `read` and `write` in the dispatch table.
        const READ_WRITE = 1 << 0;
        /// Log the name of the file the caller opened.
        const LOG_FILE_NAME = 1 << 1;
    }
}

impl Capabilities {
    /// `open` and `release` only.
    pub const MINIMAL: Capabilities = Capabilities::empty();
    /// Adds no-op `read` and `write`.
    pub const WITH_READ_WRITE: Capabilities = Capabilities::READ_WRITE;
    /// Read/write plus file name logging.
    pub const EXTENDED: Capabilities =
        Capabilities::READ_WRITE.union(Capabilities::LOG_FILE_NAME);
}

impl Default for Capabilities {
    fn default() -> Self {
        Capabilities::MINIMAL
    }
}

/// Raw module parameters, as the module loader sees them.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ModuleParams {
    /// How many times the banner is printed on load and unload.
    pub cnt: c_int,
    /// Major number to reserve; `0` asks for a dynamic one.
    pub major_num: c_int,
}

impl ModuleParams {
    /// Parses an `insmod`-style argument string, e.g. `"cnt=3 major_num=240"`.
    ///
    /// Unset parameters keep their defaults.
    pub fn parse(args: &str) -> KernelResult<Self> {
        let mut params = ModuleParams::default();
        for arg in args.split_ascii_whitespace() {
            let (key, value) = arg.split_once('=').ok_or_else(|| {
                log::error!("parameter `{}` has no value", arg);
                EINVAL
            })?;
            let slot = match key {
                "cnt" => &mut params.cnt,
                "major_num" => &mut params.major_num,
                _ => {
                    log::error!("unknown parameter `{}`", key);
                    return Err(EINVAL);
                }
            };
            *slot = value.parse::<c_int>().inspect_err(|_| {
                log::error!("invalid value `{}` for parameter `{}`", value, key);
            })?;
        }
        Ok(params)
    }
}

/// Validated configuration for one driver instance.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Config {
    /// `None` asks the host for a dynamically allocated major.
    pub requested_major: Option<u32>,
    pub banner_repeat_count: u32,
    pub capabilities: Capabilities,
    pub first_minor: u32,
    pub minor_count: u32,
    /// Name the region is registered under (`/proc/devices`).
    pub region_name: &'static str,
    pub class_name: &'static str,
    /// Name of the node created under the class (`/dev/<node_name>`).
    pub node_name: &'static str,
    /// Name and version of the loaded module, as reported in the load summary.
    pub module_name: &'static str,
    pub module_version: &'static str,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            requested_major: None,
            banner_repeat_count: 0,
            capabilities: Capabilities::default(),
            first_minor: 0,
            minor_count: 1,
            region_name: DEFAULT_NAME,
            class_name: DEFAULT_NAME,
            node_name: DEFAULT_NAME,
            module_name: DEFAULT_NAME,
            module_version: "unknown",
        }
    }
}

impl Config {
    /// Builds a configuration from the raw module parameters.
    ///
    /// A negative `cnt` prints nothing, the same as a loop that never runs.
    pub fn from_params(params: ModuleParams) -> KernelResult<Self> {
        let requested_major = match params.major_num {
            0 => None,
            major if major < 0 || major as u32 >= CHRDEV_MAJOR_MAX => {
                log::error!(
                    "major_num {} out of range (1..{})",
                    major,
                    CHRDEV_MAJOR_MAX
                );
                return Err(EINVAL);
            }
            major => Some(major as u32),
        };
        Ok(Config {
            requested_major,
            banner_repeat_count: params.cnt.max(0) as u32,
            ..Config::default()
        })
    }

    pub fn with_capabilities(mut self, capabilities: Capabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    pub fn with_module(mut self, name: &'static str, version: &'static str) -> Self {
        self.module_name = name;
        self.module_version = version;
        self
    }

    /// The fixed device number to reserve, if one was requested.
    pub fn fixed_number(&self) -> KernelResult<Option<DeviceNumber>> {
        self.requested_major
            .map(|major| DeviceNumber::fixed(major, self.first_minor))
            .transpose()
    }
}
