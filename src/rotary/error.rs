use crate::platform::{HostError, IrqLine};

/// Resource looked up from the bus during attach.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Resource {
    ChannelAPin,
    ChannelBPin,
    ChannelAIrq,
    ButtonIrq,
}

impl Resource {
    pub const ALL: [Resource; 4] = [
        Resource::ChannelAPin,
        Resource::ChannelBPin,
        Resource::ChannelAIrq,
        Resource::ButtonIrq,
    ];
}

/// Step of endpoint publication.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PublishStage {
    Major,
    Class,
    Device,
}

impl PublishStage {
    pub const ALL: [PublishStage; 3] = [PublishStage::Major, PublishStage::Class, PublishStage::Device];
}

/// Why an attach attempt failed. Everything acquired before the failure has
/// already been released when one of these is returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AttachError {
    #[error("Failed to acquire {resource:?}: {code}")]
    ResourceAcquisition { resource: Resource, code: HostError },
    #[error("Failed to register handler on irq {line}: {code}")]
    Registration { line: IrqLine, code: HostError },
    #[error("Failed to publish endpoint ({stage:?}): {code}")]
    Publication { stage: PublishStage, code: HostError },
    #[error("Device context is already attached")]
    Busy,
    #[error("Rollback stack is full")]
    RollbackFull,
}
