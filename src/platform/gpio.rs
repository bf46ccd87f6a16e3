use embedded_hal::digital::InputPin;

use super::{HostError, IrqLine};

/// The bus device the driver is bound to.
///
/// Supplies the encoder's pins by logical name and its interrupt lines by
/// declaration index. Both are looked up once per attach.
pub trait PlatformDevice {
    /// Pin handle handed out by the host.
    type Pin: InputPin;

    /// Acquire the pin called `name`, configured as a digital input.
    fn get_input(&mut self, name: &'static str) -> Result<Self::Pin, HostError>;

    /// Give a pin back to the host.
    fn put_pin(&mut self, pin: Self::Pin);

    /// Interrupt line declared at `index` for this device.
    fn get_irq(&self, index: usize) -> Result<IrqLine, HostError>;
}
