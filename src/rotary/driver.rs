//! driver.rs — what the bus matches against, and its probe/remove hooks

use embassy_sync::blocking_mutex::raw::RawMutex;

use super::{AttachError, Attachment, EncoderConfig, RotaryEncoder};
use crate::platform::{EndpointPublisher, InterruptController, PlatformDevice};

/// Device-tree compatible strings the encoder driver binds to.
pub const ROTENC_OF_MATCH: &[&str] = &["rotenc,rotenc"];

/// A platform driver: name, match table and pin/interrupt mapping.
#[derive(Debug, Clone, Copy)]
pub struct Driver {
    pub of_match: &'static [&'static str],
    pub config: EncoderConfig,
}

impl Driver {
    /// The `rotenc` driver as declared in the device tree.
    pub const ROTENC: Self = Self {
        of_match: ROTENC_OF_MATCH,
        config: EncoderConfig::ROTENC,
    };

    pub fn name(&self) -> &'static str {
        self.config.name
    }

    /// True if a node with `compatible` should be bound to this driver.
    pub fn matches(&self, compatible: &str) -> bool {
        self.of_match.iter().any(|candidate| *candidate == compatible)
    }

    /// Called by the bus when a matching device appears.
    #[must_use = "dropping the attachment leaks its resources; pass it to `remove`"]
    pub fn probe<'d, M, D, I, E>(
        &self,
        encoder: &'d RotaryEncoder<M, D::Pin>,
        device: &mut D,
        irqs: &mut I,
        publisher: &mut E,
    ) -> Result<Attachment<'d, M, D, E::Class>, AttachError>
    where
        M: RawMutex + 'd,
        D: PlatformDevice,
        D::Pin: 'd,
        I: InterruptController<'d, RotaryEncoder<M, D::Pin>>,
        E: EndpointPublisher<'d>,
    {
        info!("{}: probing device", self.name());
        Attachment::attach(encoder, &self.config, device, irqs, publisher)
    }

    /// Called by the bus when the device goes away.
    pub fn remove<'d, M, D, I, E>(
        &self,
        attachment: Attachment<'d, M, D, E::Class>,
        device: &mut D,
        irqs: &mut I,
        publisher: &mut E,
    ) where
        M: RawMutex + 'd,
        D: PlatformDevice,
        D::Pin: 'd,
        I: InterruptController<'d, RotaryEncoder<M, D::Pin>>,
        E: EndpointPublisher<'d>,
    {
        info!("{}: removing device from device tree", self.name());
        attachment.detach(device, irqs, publisher);
    }
}

impl Default for Driver {
    fn default() -> Self {
        Self::ROTENC
    }
}
