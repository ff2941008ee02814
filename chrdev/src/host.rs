//! The registration API the lifecycle is driven against.
//!
//! In the kernel this is `alloc_chrdev_region`, `cdev_add`, `class_create`,
//! `device_create` and their counterparts. Keeping it behind a trait lets the
//! same lifecycle run against a recording fake in tests.

use crate::{
    error::KernelResult,
    fops::FileOps,
    number::DeviceNumber,
    params::Capabilities,
};

bitflags::bitflags! {
    /// Entries present in the `file_operations` table bound to the cdev.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct DispatchTable: u32 {
        const OPEN = 1 << 0;
        const RELEASE = 1 << 1;
        const READ = 1 << 2;
        const WRITE = 1 << 3;
    }
}

impl DispatchTable {
    pub fn for_capabilities(capabilities: Capabilities) -> Self {
        let mut table = DispatchTable::OPEN | DispatchTable::RELEASE;
        if capabilities.contains(Capabilities::READ_WRITE) {
            table |= DispatchTable::READ | DispatchTable::WRITE;
        }
        table
    }
}

/// Character device registration primitives.
///
/// Acquisitions can fail and return the host's error code; releases cannot.
/// Every handle returned by an acquisition is released exactly once.
pub trait Host {
    /// Handle for a cdev bound to a region.
    type Cdev;
    /// Handle for a device class.
    type Class;
    /// Handle for a device node created under a class.
    type Node;

    /// Equivalent to `alloc_chrdev_region`.
    fn alloc_region(&self, first_minor: u32, count: u32, name: &str)
        -> KernelResult<DeviceNumber>;

    /// Equivalent to `register_chrdev_region`.
    fn register_region(&self, first: DeviceNumber, count: u32, name: &str) -> KernelResult<()>;

    /// Equivalent to `unregister_chrdev_region`.
    fn unregister_region(&self, first: DeviceNumber, count: u32);

    /// Equivalent to `cdev_init` followed by `cdev_add`.
    ///
    /// `table` says which callbacks to install, `ops` is what they dispatch to.
    fn cdev_add(
        &self,
        first: DeviceNumber,
        count: u32,
        table: DispatchTable,
        ops: FileOps,
    ) -> KernelResult<Self::Cdev>;

    /// Equivalent to `cdev_del`.
    fn cdev_del(&self, cdev: Self::Cdev);

    /// Equivalent to `class_create`.
    fn class_create(&self, name: &str) -> KernelResult<Self::Class>;

    /// Equivalent to `class_destroy`.
    fn class_destroy(&self, class: Self::Class);

    /// Equivalent to `device_create` with no parent and no driver data.
    fn device_create(
        &self,
        class: &Self::Class,
        number: DeviceNumber,
        name: &str,
    ) -> KernelResult<Self::Node>;

    /// Equivalent to `device_destroy`.
    fn device_destroy(&self, class: &Self::Class, node: Self::Node);
}

impl<H: Host + ?Sized> Host for &H {
    type Cdev = H::Cdev;
    type Class = H::Class;
    type Node = H::Node;

    fn alloc_region(
        &self,
        first_minor: u32,
        count: u32,
        name: &str,
    ) -> KernelResult<DeviceNumber> {
        (**self).alloc_region(first_minor, count, name)
    }

    fn register_region(&self, first: DeviceNumber, count: u32, name: &str) -> KernelResult<()> {
        (**self).register_region(first, count, name)
    }

    fn unregister_region(&self, first: DeviceNumber, count: u32) {
        (**self).unregister_region(first, count)
    }

    fn cdev_add(
        &self,
        first: DeviceNumber,
        count: u32,
        table: DispatchTable,
        ops: FileOps,
    ) -> KernelResult<Self::Cdev> {
        (**self).cdev_add(first, count, table, ops)
    }

    fn cdev_del(&self, cdev: Self::Cdev) {
        (**self).cdev_del(cdev)
    }

    fn class_create(&self, name: &str) -> KernelResult<Self::Class> {
        (**self).class_create(name)
    }

    fn class_destroy(&self, class: Self::Class) {
        (**self).class_destroy(class)
    }

    fn device_create(
        &self,
        class: &Self::Class,
        number: DeviceNumber,
        name: &str,
    ) -> KernelResult<Self::Node> {
        (**self).device_create(class, number, name)
    }

    fn device_destroy(&self, class: &Self::Class, node: Self::Node) {
        (**self).device_destroy(class, node)
    }
}
