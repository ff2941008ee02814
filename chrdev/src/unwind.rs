//! Ordered release of acquired registration resources.
//!
//! Each successful acquisition pushes a [`Resource`]; unwinding pops them and
//! releases each one with its matching host call. The same stack serves both
//! the failure path of initialisation and the normal teardown.

use alloc::vec::Vec;
use core::fmt;

use crate::{host::Host, number::DeviceNumber};

/// One acquired resource, tagged with how it is released.
pub enum Resource<H: Host> {
    /// Released with `unregister_region`.
    Region { first: DeviceNumber, count: u32 },
    /// Released with `cdev_del`.
    Cdev(H::Cdev),
    /// Released with `class_destroy`.
    Class(H::Class),
    /// Released with `device_destroy` against the class below it.
    Node(H::Node),
}

impl<H: Host> Resource<H> {
    pub fn kind(&self) -> &'static str {
        match self {
            Resource::Region { .. } => "region",
            Resource::Cdev(_) => "cdev",
            Resource::Class(_) => "class",
            Resource::Node(_) => "device",
        }
    }
}

impl<H: Host> fmt::Debug for Resource<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resource::Region { first, count } => f
                .debug_struct("Region")
                .field("first", first)
                .field("count", count)
                .finish(),
            other => f.write_str(other.kind()),
        }
    }
}

/// Stack of acquired resources, released last-in first-out.
///
/// # Invariants
///
/// Only handles returned by a successful host call are ever pushed, and a
/// `Node` is never pushed unless a `Class` is already on the stack.
pub struct UnwindStack<H: Host> {
    resources: Vec<Resource<H>>,
}

impl<H: Host> UnwindStack<H> {
    pub fn new() -> Self {
        Self {
            resources: Vec::new(),
        }
    }

    pub fn push(&mut self, resource: Resource<H>) {
        debug_assert!(
            !matches!(resource, Resource::Node(_)) || self.class().is_some(),
            "device pushed without a class"
        );
        self.resources.push(resource);
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    /// Innermost class on the stack; devices are created under it.
    pub fn class(&self) -> Option<&H::Class> {
        self.resources.iter().rev().find_map(|r| match r {
            Resource::Class(class) => Some(class),
            _ => None,
        })
    }

    /// Kinds of the held resources, bottom first.
    pub fn kinds(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.resources.iter().map(Resource::kind)
    }

    /// Releases everything on the stack, newest first.
    pub fn unwind(&mut self, host: &H) {
        while let Some(resource) = self.resources.pop() {
            log::debug!("releasing {:?}", resource);
            match resource {
                Resource::Node(node) => match self.class() {
                    Some(class) => host.device_destroy(class, node),
                    // Unreachable through `push`, but never destroy against a
                    // class that is already gone.
                    None => log::error!("device without a class, leaking it"),
                },
                Resource::Class(class) => host.class_destroy(class),
                Resource::Cdev(cdev) => host.cdev_del(cdev),
                Resource::Region { first, count } => host.unregister_region(first, count),
            }
        }
    }
}

impl<H: Host> Default for UnwindStack<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H: Host> fmt::Debug for UnwindStack<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.resources.iter()).finish()
    }
}

#[cfg(test)]
mod tests {
    use alloc::{string::String, vec::Vec};
    use core::cell::RefCell;

    use super::*;
    use crate::{
        error::KernelResult,
        fops::FileOps,
        host::DispatchTable,
    };

    /// Host that hands out counters and records releases.
    #[derive(Default)]
    struct Recorder {
        released: RefCell<Vec<String>>,
    }

    impl Host for Recorder {
        type Cdev = u32;
        type Class = u32;
        type Node = u32;

        fn alloc_region(&self, _: u32, _: u32, _: &str) -> KernelResult<DeviceNumber> {
            DeviceNumber::new(1, 0)
        }
        fn register_region(&self, _: DeviceNumber, _: u32, _: &str) -> KernelResult<()> {
            Ok(())
        }
        fn unregister_region(&self, first: DeviceNumber, count: u32) {
            self.released
                .borrow_mut()
                .push(alloc::format!("region {} x{}", first, count));
        }
        fn cdev_add(&self, _: DeviceNumber, _: u32, _: DispatchTable, _: FileOps) -> KernelResult<u32> {
            Ok(7)
        }
        fn cdev_del(&self, cdev: u32) {
            self.released.borrow_mut().push(alloc::format!("cdev {}", cdev));
        }
        fn class_create(&self, _: &str) -> KernelResult<u32> {
            Ok(8)
        }
        fn class_destroy(&self, class: u32) {
            self.released.borrow_mut().push(alloc::format!("class {}", class));
        }
        fn device_create(&self, _: &u32, _: DeviceNumber, _: &str) -> KernelResult<u32> {
            Ok(9)
        }
        fn device_destroy(&self, class: &u32, node: u32) {
            self.released
                .borrow_mut()
                .push(alloc::format!("device {} in class {}", node, class));
        }
    }

    #[test]
    fn unwinds_in_reverse_order() {
        let host = Recorder::default();
        let mut stack = UnwindStack::<Recorder>::new();
        stack.push(Resource::Region {
            first: DeviceNumber::new(240, 0).unwrap(),
            count: 1,
        });
        stack.push(Resource::Cdev(7));
        stack.push(Resource::Class(8));
        stack.push(Resource::Node(9));
        assert_eq!(
            stack.kinds().collect::<Vec<_>>(),
            ["region", "cdev", "class", "device"]
        );

        stack.unwind(&host);
        assert!(stack.is_empty());
        assert_eq!(
            *host.released.borrow(),
            [
                "device 9 in class 8",
                "class 8",
                "cdev 7",
                "region 240:0 x1",
            ]
        );
    }

    #[test]
    fn unwinding_twice_releases_once() {
        let host = Recorder::default();
        let mut stack = UnwindStack::<Recorder>::new();
        stack.push(Resource::Cdev(3));
        stack.unwind(&host);
        stack.unwind(&host);
        assert_eq!(*host.released.borrow(), ["cdev 3"]);
    }

    #[test]
    fn empty_stack_touches_nothing() {
        let host = Recorder::default();
        UnwindStack::<Recorder>::default().unwind(&host);
        assert!(host.released.borrow().is_empty());
    }
}
