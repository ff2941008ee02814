//! [`Host`] implementation over the kernel's chrdev, class and device API.

use alloc::{boxed::Box, ffi::CString};
use core::{
    ffi::{c_uint, c_void},
    pin::Pin,
    ptr::{self, addr_of_mut, NonNull},
};

use chrdev::{DeviceNumber, DispatchTable, FileOps, Host, KernelResult};
use kbind::{bindings, from_err_ptr, linux_err::ENOMEM, str::to_cstring, to_result};

use crate::fops::CdevBox;

/// The running kernel.
pub struct KernelHost;

/// A class and the name it was created with; `class_create` keeps the pointer.
pub struct Class {
    ptr: NonNull<bindings::class>,
    _name: CString,
}

/// A device created under a [`Class`], identified by its number.
pub struct Node(DeviceNumber);

impl Host for KernelHost {
    type Cdev = Pin<Box<CdevBox>>;
    type Class = Class;
    type Node = Node;

    fn alloc_region(
        &self,
        first_minor: u32,
        count: u32,
        name: &str,
    ) -> KernelResult<DeviceNumber> {
        let name = to_cstring(name)?;
        let mut dev: bindings::dev_t = 0;
        // SAFETY: `dev` is a valid out pointer and `name` is NUL-terminated;
        // the region keeps its own copy of the name.
        to_result(unsafe {
            bindings::alloc_chrdev_region(
                &mut dev,
                first_minor as c_uint,
                count as c_uint,
                name.as_ptr(),
            )
        })?;
        Ok(DeviceNumber::from_dev_t(dev))
    }

    fn register_region(&self, first: DeviceNumber, count: u32, name: &str) -> KernelResult<()> {
        let name = to_cstring(name)?;
        // SAFETY: `name` is NUL-terminated; the region keeps its own copy.
        to_result(unsafe {
            bindings::register_chrdev_region(first.to_dev_t(), count as c_uint, name.as_ptr())
        })
    }

    fn unregister_region(&self, first: DeviceNumber, count: u32) {
        // SAFETY: The region was reserved by `alloc_region` or `register_region`.
        unsafe { bindings::unregister_chrdev_region(first.to_dev_t(), count as c_uint) };
    }

    fn cdev_add(
        &self,
        first: DeviceNumber,
        count: u32,
        table: DispatchTable,
        ops: FileOps,
    ) -> KernelResult<Self::Cdev> {
        let mut cdev = Box::pin(CdevBox::new(table, ops));
        // SAFETY: The box is pinned and outlives the registration, which is
        // removed by `cdev_del` before the box is dropped.
        unsafe {
            let this = cdev.as_mut().get_unchecked_mut();
            bindings::cdev_init(&mut this.cdev, &this.fops);
            this.cdev.owner = addr_of_mut!(bindings::__this_module);
            to_result(bindings::cdev_add(
                &mut this.cdev,
                first.to_dev_t(),
                count as c_uint,
            ))?;
        }
        Ok(cdev)
    }

    fn cdev_del(&self, mut cdev: Self::Cdev) {
        // SAFETY: The cdev was added by `cdev_add`. Open files hold a module
        // reference, so none remain once the module is being unloaded.
        unsafe { bindings::cdev_del(&mut cdev.as_mut().get_unchecked_mut().cdev) };
    }

    fn class_create(&self, name: &str) -> KernelResult<Class> {
        let name = to_cstring(name)?;
        // SAFETY: `name` is NUL-terminated and stored alongside the class.
        let ptr = from_err_ptr(unsafe { bindings::class_create(name.as_ptr()) })?;
        let ptr = NonNull::new(ptr).ok_or(ENOMEM)?;
        Ok(Class { ptr, _name: name })
    }

    fn class_destroy(&self, class: Class) {
        // SAFETY: The class was created by `class_create` and has no devices left.
        unsafe { bindings::class_destroy(class.ptr.as_ptr() as _) };
    }

    fn device_create(
        &self,
        class: &Class,
        number: DeviceNumber,
        name: &str,
    ) -> KernelResult<Node> {
        let name = to_cstring(name)?;
        // SAFETY: `class` is live. The name goes through "%s" and is copied
        // into the device's kobject.
        from_err_ptr(unsafe {
            bindings::device_create(
                class.ptr.as_ptr() as _,
                ptr::null_mut(),
                number.to_dev_t(),
                ptr::null_mut::<c_void>(),
                c"%s".as_ptr(),
                name.as_ptr(),
            )
        })?;
        Ok(Node(number))
    }

    fn device_destroy(&self, class: &Class, node: Node) {
        // SAFETY: The device was created under `class` by `device_create`.
        unsafe { bindings::device_destroy(class.ptr.as_ptr() as _, node.0.to_dev_t()) };
    }
}
