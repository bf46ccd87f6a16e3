//! Host mocks for exercising the driver without hardware.
//!
//! Every mock shares one [`Journal`] so tests can check the exact order in
//! which resources were taken and given back, and one failure point so a
//! single step of the attach sequence can be made to fail.

use core::cell::{Cell, RefCell};
use core::fmt::Write;
use std::rc::Rc;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::vec::Vec;

// Links the std `critical-section` implementation into test binaries.
use critical_section as _;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embedded_hal::digital::{ErrorKind, ErrorType, InputPin};

use crate::platform::{
    DevNum, DevicePath, EndpointPublisher, FileOperations, HostError, InterruptController, IrqAction, IrqFlags,
    IrqLine, IrqReturn, PlatformDevice,
};
use crate::{RotaryEncoder, Session};

pub type TestEncoder = RotaryEncoder<CriticalSectionRawMutex, MockPin>;

/// Interrupt lines the mock bus declares, in index order.
pub const MOCK_LINES: [u32; 2] = [23, 24];

/// Major number the mock publisher hands out.
pub const MOCK_MAJOR: u32 = 240;

// ============================================================================
// PINS
// ============================================================================

/// Input pin whose level the test controls. Clones share the level.
#[derive(Debug, Clone)]
pub struct MockPin {
    name: &'static str,
    high: Arc<AtomicBool>,
    faulty: Arc<AtomicBool>,
}

impl MockPin {
    pub fn new(name: &'static str, high: bool) -> Self {
        Self {
            name,
            high: Arc::new(AtomicBool::new(high)),
            faulty: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn set_high(&self, high: bool) {
        self.high.store(high, Ordering::SeqCst);
    }

    /// Make reads fail until cleared.
    pub fn set_faulty(&self, faulty: bool) {
        self.faulty.store(faulty, Ordering::SeqCst);
    }
}

impl ErrorType for MockPin {
    type Error = ErrorKind;
}

impl InputPin for MockPin {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        if self.faulty.load(Ordering::SeqCst) {
            return Err(ErrorKind::Other);
        }
        Ok(self.high.load(Ordering::SeqCst))
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        self.is_high().map(|high| !high)
    }
}

// ============================================================================
// JOURNAL AND FAILURE INJECTION
// ============================================================================

/// A successful acquisition or a release.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    GetPin(&'static str),
    PutPin(&'static str),
    RequestIrq(u32),
    FreeIrq(u32),
    RegisterMajor(u32),
    UnregisterMajor(u32),
    CreateClass,
    DestroyClass,
    CreateDevice(DevNum),
    DestroyDevice(DevNum),
}

#[derive(Debug, Clone, Default)]
pub struct Journal(Rc<RefCell<Vec<Event>>>);

impl Journal {
    fn record(&self, event: Event) {
        self.0.borrow_mut().push(event);
    }

    pub fn events(&self) -> Vec<Event> {
        self.0.borrow().clone()
    }

    pub fn clear(&self) {
        self.0.borrow_mut().clear();
    }
}

/// The host step that should fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fail {
    Pin(&'static str),
    IrqLookup(usize),
    IrqRequest(u32),
    Major,
    Class,
    Device,
}

type FailPoint = Rc<Cell<Option<Fail>>>;

// ============================================================================
// BUS
// ============================================================================

pub struct MockBus {
    journal: Journal,
    fail: FailPoint,
    pins: Vec<MockPin>,
    out: usize,
}

impl MockBus {
    /// Handle on the pin called `name`, created low on first use.
    pub fn pin(&mut self, name: &'static str) -> MockPin {
        if let Some(pin) = self.pins.iter().find(|pin| pin.name == name) {
            return pin.clone();
        }
        let pin = MockPin::new(name, false);
        self.pins.push(pin.clone());
        pin
    }

    /// Pins currently handed out to the driver.
    pub fn pins_out(&self) -> usize {
        self.out
    }
}

impl PlatformDevice for MockBus {
    type Pin = MockPin;

    fn get_input(&mut self, name: &'static str) -> Result<MockPin, HostError> {
        if self.fail.get() == Some(Fail::Pin(name)) {
            return Err(HostError::NO_DEVICE);
        }
        let pin = self.pin(name);
        self.out += 1;
        self.journal.record(Event::GetPin(name));
        Ok(pin)
    }

    fn put_pin(&mut self, pin: MockPin) {
        self.out = self.out.checked_sub(1).expect("pin released twice");
        self.journal.record(Event::PutPin(pin.name));
    }

    fn get_irq(&self, index: usize) -> Result<IrqLine, HostError> {
        if self.fail.get() == Some(Fail::IrqLookup(index)) {
            return Err(HostError::NO_DEVICE);
        }
        MOCK_LINES
            .get(index)
            .map(|&line| IrqLine(line))
            .ok_or(HostError::NO_DEVICE)
    }
}

// ============================================================================
// INTERRUPT CONTROLLER
// ============================================================================

pub struct MockIrqs<'d, C> {
    journal: Journal,
    fail: FailPoint,
    actions: Vec<(IrqLine, IrqFlags, IrqAction<'d, C>)>,
}

impl<'d, C> MockIrqs<'d, C> {
    /// Dispatch `line` to every action registered on it.
    pub fn fire(&self, line: u32) -> IrqReturn {
        let mut result = IrqReturn::Unhandled;
        for (registered, _, action) in &self.actions {
            if registered.0 == line && action.fire(*registered) == IrqReturn::Handled {
                result = IrqReturn::Handled;
            }
        }
        result
    }

    pub fn registered(&self) -> usize {
        self.actions.len()
    }

    pub fn registrations(&self) -> impl Iterator<Item = (IrqFlags, &'static str)> + '_ {
        self.actions.iter().map(|(_, flags, action)| (*flags, action.name()))
    }
}

impl<'d, C> InterruptController<'d, C> for MockIrqs<'d, C> {
    fn request_irq(&mut self, line: IrqLine, flags: IrqFlags, action: IrqAction<'d, C>) -> Result<(), HostError> {
        if self.fail.get() == Some(Fail::IrqRequest(line.0)) {
            return Err(HostError::BUSY);
        }
        if !flags.shared && self.actions.iter().any(|(registered, _, _)| *registered == line) {
            return Err(HostError::BUSY);
        }
        self.actions.push((line, flags, action));
        self.journal.record(Event::RequestIrq(line.0));
        Ok(())
    }

    fn free_irq(&mut self, line: IrqLine, context: &'d C) {
        let before = self.actions.len();
        self.actions
            .retain(|(registered, _, action)| !(*registered == line && action.is_bound_to(context)));
        assert_eq!(before - self.actions.len(), 1, "free_irq without a matching registration");
        self.journal.record(Event::FreeIrq(line.0));
    }
}

// ============================================================================
// ENDPOINT PUBLISHER
// ============================================================================

/// Class handle; deliberately not `Clone` so it can only be destroyed once.
#[derive(Debug)]
pub struct MockClass {
    name: &'static str,
}

pub struct MockChrdev<'d> {
    journal: Journal,
    fail: FailPoint,
    fops: Option<&'d dyn FileOperations>,
    major: Option<u32>,
    classes: usize,
    devices: Vec<DevNum>,
}

impl<'d> MockChrdev<'d> {
    /// Open the published node, if there is one.
    pub fn open(&self) -> Option<Session<'d, dyn FileOperations + 'd>> {
        if self.devices.is_empty() {
            return None;
        }
        self.fops.map(|fops| Session::open(fops))
    }

    /// Nothing reserved or created.
    pub fn is_empty(&self) -> bool {
        self.fops.is_none() && self.major.is_none() && self.classes == 0 && self.devices.is_empty()
    }
}

impl<'d> EndpointPublisher<'d> for MockChrdev<'d> {
    type Class = MockClass;

    fn register_major(&mut self, _name: &'static str, fops: &'d dyn FileOperations) -> Result<u32, HostError> {
        if self.fail.get() == Some(Fail::Major) {
            return Err(HostError::BUSY);
        }
        assert!(self.major.is_none(), "major already registered");
        self.major = Some(MOCK_MAJOR);
        self.fops = Some(fops);
        self.journal.record(Event::RegisterMajor(MOCK_MAJOR));
        Ok(MOCK_MAJOR)
    }

    fn unregister_major(&mut self, major: u32, _name: &'static str) {
        assert_eq!(self.major, Some(major));
        assert!(self.devices.is_empty(), "major released before its device");
        self.major = None;
        self.fops = None;
        self.journal.record(Event::UnregisterMajor(major));
    }

    fn create_class(&mut self, name: &'static str) -> Result<MockClass, HostError> {
        if self.fail.get() == Some(Fail::Class) {
            return Err(HostError::NO_MEMORY);
        }
        self.classes += 1;
        self.journal.record(Event::CreateClass);
        Ok(MockClass { name })
    }

    fn destroy_class(&mut self, _class: MockClass) {
        assert!(self.devices.is_empty(), "class destroyed before its device");
        self.classes -= 1;
        self.journal.record(Event::DestroyClass);
    }

    fn create_device(&mut self, class: &MockClass, devt: DevNum, name: &'static str) -> Result<DevicePath, HostError> {
        if self.fail.get() == Some(Fail::Device) {
            return Err(HostError::NO_MEMORY);
        }
        assert_eq!(class.name, name);
        let mut path = DevicePath::new();
        write!(path, "/dev/{}", name).map_err(|_| HostError::INVALID)?;
        self.devices.push(devt);
        self.journal.record(Event::CreateDevice(devt));
        Ok(path)
    }

    fn destroy_device(&mut self, _class: &MockClass, devt: DevNum) {
        self.devices.retain(|created| *created != devt);
        self.journal.record(Event::DestroyDevice(devt));
    }
}

// ============================================================================
// HOST
// ============================================================================

/// Bus, interrupt controller and publisher wired to one journal.
pub struct MockHost<'d, C> {
    pub bus: MockBus,
    pub irqs: MockIrqs<'d, C>,
    pub chrdev: MockChrdev<'d>,
    pub journal: Journal,
    fail: FailPoint,
}

impl<'d, C> MockHost<'d, C> {
    pub fn new() -> Self {
        let journal = Journal::default();
        let fail: FailPoint = Rc::new(Cell::new(None));
        Self {
            bus: MockBus {
                journal: journal.clone(),
                fail: fail.clone(),
                pins: Vec::new(),
                out: 0,
            },
            irqs: MockIrqs {
                journal: journal.clone(),
                fail: fail.clone(),
                actions: Vec::new(),
            },
            chrdev: MockChrdev {
                journal: journal.clone(),
                fail: fail.clone(),
                fops: None,
                major: None,
                classes: 0,
                devices: Vec::new(),
            },
            journal,
            fail,
        }
    }

    pub fn failing_at(fail: Fail) -> Self {
        let host = Self::new();
        host.fail.set(Some(fail));
        host
    }

    pub fn clear_failure(&self) {
        self.fail.set(None);
    }
}
