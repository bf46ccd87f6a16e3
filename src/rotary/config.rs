use crate::platform::IrqFlags;

/// Pin and interrupt mapping for one encoder.
///
/// The bus hands out pins by name and interrupt lines by declaration index,
/// so this is all the driver needs to know about the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct EncoderConfig {
    /// Driver name; also used for the major number, class and device node.
    pub name: &'static str,
    /// Channel A pin name.
    pub channel_a: &'static str,
    /// Channel B pin name.
    pub channel_b: &'static str,
    /// Interrupt index of channel A.
    pub channel_a_irq: usize,
    /// Interrupt index of the push-button.
    pub button_irq: usize,
    /// Minor number of the published device.
    pub minor: u32,
    /// Flags both handlers are registered with.
    pub irq_flags: IrqFlags,
}

impl EncoderConfig {
    /// Mapping used by the `rotenc,rotenc` device-tree node.
    pub const ROTENC: Self = Self {
        name: "rotenc",
        channel_a: "ch_a",
        channel_b: "ch_b",
        channel_a_irq: 0,
        button_irq: 1,
        minor: 0,
        irq_flags: IrqFlags::SHARED,
    };
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self::ROTENC
    }
}
