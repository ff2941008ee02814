//! Registration and teardown of the character device.
//!
//! Loading the module runs [`Driver::initialize`]: reserve a device number
//! region, bind a cdev to it, create a class and then the device node under the
//! class. If any step fails, everything acquired so far is released newest
//! first and the host's error is returned as is. Unloading runs
//! [`Driver::shutdown`] (or simply drops the driver), which releases the same
//! resources in the same order.

use core::fmt;

use crate::{
    error::{linux_err::EBUSY, InitError},
    fops::FileOps,
    host::{DispatchTable, Host},
    number::DeviceNumber,
    params::Config,
    unwind::{Resource, UnwindStack},
};

/// Log target of the load and unload banners.
pub const BANNER_TARGET: &str = "chrdev::banner";

const LOAD_BANNER: &str = "hello world";
const UNLOAD_BANNER: &str = "good bye";

/// Where the driver is in its load/unload cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum State {
    Unregistered,
    Registering,
    Registered,
    Unregistering,
}

/// Everything a successful [`Driver::initialize`] acquired.
pub struct Registration<H: Host> {
    number: DeviceNumber,
    ops: FileOps,
    resources: UnwindStack<H>,
}

impl<H: Host> Registration<H> {
    pub fn number(&self) -> DeviceNumber {
        self.number
    }

    pub fn file_ops(&self) -> FileOps {
        self.ops
    }

    pub fn resources(&self) -> &UnwindStack<H> {
        &self.resources
    }
}

impl<H: Host> fmt::Debug for Registration<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registration")
            .field("number", &self.number)
            .field("resources", &self.resources)
            .finish()
    }
}

/// A character device driver bound to a host.
///
/// Dropping a registered driver tears it down.
pub struct Driver<H: Host> {
    host: H,
    config: Config,
    state: State,
    registration: Option<Registration<H>>,
}

impl<H: Host> Driver<H> {
    pub fn new(host: H, config: Config) -> Self {
        Self {
            host,
            config,
            state: State::Unregistered,
            registration: None,
        }
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn registration(&self) -> Option<&Registration<H>> {
        self.registration.as_ref()
    }

    /// The assigned device number, once registered.
    pub fn number(&self) -> Option<DeviceNumber> {
        self.registration.as_ref().map(Registration::number)
    }

    /// The callbacks bound to the device, once registered.
    pub fn file_ops(&self) -> Option<FileOps> {
        self.registration.as_ref().map(Registration::file_ops)
    }

    /// Registers the device.
    ///
    /// Either the device ends up fully registered, or every partially acquired
    /// resource is released before the error is returned.
    pub fn initialize(&mut self) -> Result<DeviceNumber, InitError> {
        if self.state != State::Unregistered {
            log::warn!("device already registered ({:?})", self.state);
            return Err(InitError::ReserveRegion(EBUSY));
        }

        for _ in 0..self.config.banner_repeat_count {
            log::info!(target: BANNER_TARGET, "{}", LOAD_BANNER);
        }

        self.state = State::Registering;
        let mut resources = UnwindStack::new();
        match register(&self.host, &self.config, &mut resources) {
            Ok(ops) => {
                let number = ops.number();
                self.registration = Some(Registration {
                    number,
                    ops,
                    resources,
                });
                self.state = State::Registered;
                log::info!("Device driver created successfully");
                log::info!("-----------------------------------------------------");
                log::info!("Hello World Device Driver has been loaded");
                log::info!("Module name: {}", self.config.module_name);
                log::info!("Module version: {}", self.config.module_version);
                log::info!("Device: /dev/{} ({})", self.config.node_name, number);
                log::info!("-----------------------------------------------------");
                Ok(number)
            }
            Err(err) => {
                log::error!("{}", err);
                resources.unwind(&self.host);
                self.state = State::Unregistered;
                Err(err)
            }
        }
    }

    /// Unregisters the device, releasing the node, the class, the cdev and the
    /// region, in that order.
    pub fn shutdown(&mut self) {
        let Some(mut registration) = self.registration.take() else {
            log::warn!("shutdown requested but nothing is registered");
            return;
        };
        self.state = State::Unregistering;

        for _ in 0..self.config.banner_repeat_count {
            log::info!(target: BANNER_TARGET, "{}", UNLOAD_BANNER);
        }

        registration.resources.unwind(&self.host);
        self.state = State::Unregistered;
        log::info!("Hello World Device Driver has been unloaded");
    }
}

impl<H: Host> Drop for Driver<H> {
    fn drop(&mut self) {
        if self.registration.is_some() {
            self.shutdown();
        }
    }
}

impl<H: Host> fmt::Debug for Driver<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Driver")
            .field("config", &self.config)
            .field("state", &self.state)
            .field("registration", &self.registration)
            .finish()
    }
}

/// Runs the four acquisition steps, pushing each handle as soon as it exists.
fn register<H: Host>(
    host: &H,
    config: &Config,
    resources: &mut UnwindStack<H>,
) -> Result<FileOps, InitError> {
    let count = config.minor_count;

    let number = match config.fixed_number().map_err(InitError::ReserveRegion)? {
        None => {
            let number = host
                .alloc_region(config.first_minor, count, config.region_name)
                .map_err(InitError::ReserveRegion)?;
            log::info!("Successfully allocated a major number");
            number
        }
        Some(number) => {
            host.register_region(number, count, config.region_name)
                .map_err(InitError::ReserveRegion)?;
            log::info!("Successfully registered major number {}", number.major());
            number
        }
    };
    log::info!(
        "Major number is {}, Minor number is {}",
        number.major(),
        number.minor()
    );
    resources.push(Resource::Region {
        first: number,
        count,
    });

    let ops = FileOps::new(config.capabilities, number);
    let table = DispatchTable::for_capabilities(config.capabilities);
    let cdev = host
        .cdev_add(number, count, table, ops)
        .map_err(InitError::AddCdev)?;
    resources.push(Resource::Cdev(cdev));

    let class = host
        .class_create(config.class_name)
        .map_err(InitError::CreateClass)?;
    let node = host.device_create(&class, number, config.node_name);
    resources.push(Resource::Class(class));
    resources.push(Resource::Node(node.map_err(InitError::CreateDevice)?));

    Ok(ops)
}
