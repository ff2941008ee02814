#![allow(dead_code)]

use std::{
    cell::RefCell,
    collections::{BTreeMap, BTreeSet},
    sync::{Mutex, Once},
};

use chrdev::{
    linux_err::{EBUSY, ENOMEM},
    DeviceNumber, DispatchTable, Error, FileOps, Host, KernelResult, BANNER_TARGET,
};
use log::{LevelFilter, Log, Metadata, Record};

/// Registration step of the fake host that can be made to fail.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Step {
    Reserve,
    AddCdev,
    CreateClass,
    CreateDevice,
}

#[derive(Debug)]
pub struct FakeCdev(u32);
#[derive(Debug)]
pub struct FakeClass(u32);
#[derive(Debug)]
pub struct FakeNode(u32);

#[derive(Default)]
struct Inner {
    regions: BTreeMap<u32, String>,
    cdevs: BTreeMap<u32, (DeviceNumber, DispatchTable, FileOps)>,
    classes: BTreeMap<u32, String>,
    nodes: BTreeMap<u32, (u32, DeviceNumber, String)>,
    next_handle: u32,
    failure: Option<(Step, Error)>,
    calls: Vec<String>,
}

/// In-memory host that keeps track of what is registered and logs every call.
///
/// Majors behave like the kernel's: a fixed major can only be reserved once,
/// dynamic ones are handed out from 254 downwards.
#[derive(Default)]
pub struct FakeHost {
    inner: Mutex<Inner>,
}

impl FakeHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_at(step: Step, error: Error) -> Self {
        let host = Self::new();
        host.fail_at(step, error);
        host
    }

    pub fn fail_at(&self, step: Step, error: Error) {
        self.inner.lock().unwrap().failure = Some((step, error));
    }

    pub fn calls(&self) -> Vec<String> {
        self.inner.lock().unwrap().calls.clone()
    }

    pub fn reserved_majors(&self) -> Vec<u32> {
        self.inner.lock().unwrap().regions.keys().copied().collect()
    }

    pub fn cdev_count(&self) -> usize {
        self.inner.lock().unwrap().cdevs.len()
    }

    pub fn class_count(&self) -> usize {
        self.inner.lock().unwrap().classes.len()
    }

    pub fn node_count(&self) -> usize {
        self.inner.lock().unwrap().nodes.len()
    }

    /// Nothing reserved, bound or created.
    pub fn is_clean(&self) -> bool {
        let inner = self.inner.lock().unwrap();
        inner.regions.is_empty()
            && inner.cdevs.is_empty()
            && inner.classes.is_empty()
            && inner.nodes.is_empty()
    }

    pub fn dispatch_table(&self, number: DeviceNumber) -> Option<DispatchTable> {
        let inner = self.inner.lock().unwrap();
        inner
            .cdevs
            .values()
            .find(|(first, _, _)| *first == number)
            .map(|(_, table, _)| *table)
    }

    fn record(inner: &mut Inner, call: String) {
        inner.calls.push(call);
    }

    fn check(inner: &mut Inner, step: Step) -> KernelResult<()> {
        match inner.failure {
            Some((failing, error)) if failing == step => Err(error),
            _ => Ok(()),
        }
    }

    fn next_handle(inner: &mut Inner) -> u32 {
        inner.next_handle += 1;
        inner.next_handle
    }
}

impl Host for FakeHost {
    type Cdev = FakeCdev;
    type Class = FakeClass;
    type Node = FakeNode;

    fn alloc_region(&self, first_minor: u32, count: u32, name: &str) -> KernelResult<DeviceNumber> {
        let mut inner = self.inner.lock().unwrap();
        Self::record(&mut inner, format!("alloc_region {} x{}", name, count));
        Self::check(&mut inner, Step::Reserve)?;
        let major = (234..=254)
            .rev()
            .find(|major| !inner.regions.contains_key(major))
            .ok_or(EBUSY)?;
        inner.regions.insert(major, name.to_string());
        DeviceNumber::new(major, first_minor)
    }

    fn register_region(&self, first: DeviceNumber, count: u32, name: &str) -> KernelResult<()> {
        let mut inner = self.inner.lock().unwrap();
        Self::record(&mut inner, format!("register_region {} x{}", first, count));
        Self::check(&mut inner, Step::Reserve)?;
        if inner.regions.contains_key(&first.major()) {
            return Err(EBUSY);
        }
        inner.regions.insert(first.major(), name.to_string());
        Ok(())
    }

    fn unregister_region(&self, first: DeviceNumber, count: u32) {
        let mut inner = self.inner.lock().unwrap();
        Self::record(&mut inner, format!("unregister_region {} x{}", first, count));
        assert!(
            inner.regions.remove(&first.major()).is_some(),
            "unregistering a region that was never reserved"
        );
    }

    fn cdev_add(
        &self,
        first: DeviceNumber,
        count: u32,
        table: DispatchTable,
        ops: FileOps,
    ) -> KernelResult<FakeCdev> {
        let mut inner = self.inner.lock().unwrap();
        Self::record(&mut inner, format!("cdev_add {} x{}", first, count));
        Self::check(&mut inner, Step::AddCdev)?;
        assert!(inner.regions.contains_key(&first.major()), "cdev_add on an unreserved region");
        let handle = Self::next_handle(&mut inner);
        inner.cdevs.insert(handle, (first, table, ops));
        Ok(FakeCdev(handle))
    }

    fn cdev_del(&self, cdev: FakeCdev) {
        let mut inner = self.inner.lock().unwrap();
        Self::record(&mut inner, "cdev_del".to_string());
        assert!(inner.cdevs.remove(&cdev.0).is_some(), "cdev deleted twice");
    }

    fn class_create(&self, name: &str) -> KernelResult<FakeClass> {
        let mut inner = self.inner.lock().unwrap();
        Self::record(&mut inner, format!("class_create {}", name));
        Self::check(&mut inner, Step::CreateClass)?;
        if inner.classes.values().any(|existing| existing == name) {
            return Err(chrdev::linux_err::EEXIST);
        }
        let handle = Self::next_handle(&mut inner);
        inner.classes.insert(handle, name.to_string());
        Ok(FakeClass(handle))
    }

    fn class_destroy(&self, class: FakeClass) {
        let mut inner = self.inner.lock().unwrap();
        Self::record(&mut inner, "class_destroy".to_string());
        assert!(
            !inner.nodes.values().any(|(owner, _, _)| *owner == class.0),
            "class destroyed while it still has devices"
        );
        assert!(inner.classes.remove(&class.0).is_some(), "class destroyed twice");
    }

    fn device_create(
        &self,
        class: &FakeClass,
        number: DeviceNumber,
        name: &str,
    ) -> KernelResult<FakeNode> {
        let mut inner = self.inner.lock().unwrap();
        Self::record(&mut inner, format!("device_create {} {}", name, number));
        Self::check(&mut inner, Step::CreateDevice)?;
        assert!(inner.classes.contains_key(&class.0), "device_create on a dead class");
        let handle = Self::next_handle(&mut inner);
        inner.nodes.insert(handle, (class.0, number, name.to_string()));
        Ok(FakeNode(handle))
    }

    fn device_destroy(&self, class: &FakeClass, node: FakeNode) {
        let mut inner = self.inner.lock().unwrap();
        Self::record(&mut inner, "device_destroy".to_string());
        let (owner, _, _) = inner.nodes.remove(&node.0).expect("device destroyed twice");
        assert_eq!(owner, class.0, "device destroyed against the wrong class");
    }
}

/// Error used by the failure injection tests.
pub const INJECTED: Error = ENOMEM;

struct CaptureLogger;

static LOGGER: CaptureLogger = CaptureLogger;
static INIT: Once = Once::new();

thread_local! {
    static RECORDS: RefCell<Vec<(String, String)>> = const { RefCell::new(Vec::new()) };
}

impl Log for CaptureLogger {
    fn enabled(&self, _metadata: &Metadata) -> bool {
        true
    }

    fn log(&self, record: &Record) {
        RECORDS.with(|records| {
            records
                .borrow_mut()
                .push((record.target().to_string(), record.args().to_string()))
        });
    }

    fn flush(&self) {}
}

/// Installs the capturing logger and clears this thread's records.
pub fn capture_logs() {
    INIT.call_once(|| {
        log::set_logger(&LOGGER).unwrap();
        log::set_max_level(LevelFilter::Trace);
    });
    RECORDS.with(|records| records.borrow_mut().clear());
}

/// Lines logged on this thread since [`capture_logs`].
pub fn log_lines() -> Vec<String> {
    RECORDS.with(|records| records.borrow().iter().map(|(_, msg)| msg.clone()).collect())
}

/// Banner lines logged on this thread since [`capture_logs`].
pub fn banner_lines() -> Vec<String> {
    RECORDS.with(|records| {
        records
            .borrow()
            .iter()
            .filter(|(target, _)| target == BANNER_TARGET)
            .map(|(_, msg)| msg.clone())
            .collect()
    })
}
