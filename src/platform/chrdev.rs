use core::fmt;

use super::HostError;

/// Maximum length of a published device path.
pub const DEVICE_PATH_LEN: usize = 32;

/// Path under which a published endpoint can be opened, e.g. `/dev/rotenc`.
pub type DevicePath = heapless::String<DEVICE_PATH_LEN>;

/// Major/minor pair identifying a character device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DevNum {
    pub major: u32,
    pub minor: u32,
}

impl DevNum {
    pub const fn new(major: u32, minor: u32) -> Self {
        Self { major, minor }
    }
}

impl fmt::Display for DevNum {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}:{}", self.major, self.minor)
    }
}

/// Operations the host routes to a published endpoint.
///
/// `offset` is the per-session stream position; the host keeps one per open
/// handle and passes it to every read.
pub trait FileOperations {
    /// A consumer opened the endpoint.
    fn open(&self);

    /// Fill `buf` from stream position `offset`; returns the byte count, 0 at
    /// end of stream.
    fn read(&self, buf: &mut [u8], offset: &mut i64) -> usize;

    /// A consumer closed its handle.
    fn release(&self);
}

/// The host mechanism that turns a driver's endpoint into an openable node.
///
/// Publication is three steps (reserve a major number, create a class, create
/// the device under it) and teardown runs them backwards.
pub trait EndpointPublisher<'d> {
    /// Handle to a created device class.
    type Class;

    /// Reserve a major number for `name`, routing its files to `fops`.
    fn register_major(
        &mut self,
        name: &'static str,
        fops: &'d dyn FileOperations,
    ) -> Result<u32, HostError>;

    fn unregister_major(&mut self, major: u32, name: &'static str);

    fn create_class(&mut self, name: &'static str) -> Result<Self::Class, HostError>;

    fn destroy_class(&mut self, class: Self::Class);

    /// Create device `devt` in `class`; returns the path consumers open.
    fn create_device(
        &mut self,
        class: &Self::Class,
        devt: DevNum,
        name: &'static str,
    ) -> Result<DevicePath, HostError>;

    fn destroy_device(&mut self, class: &Self::Class, devt: DevNum);
}
