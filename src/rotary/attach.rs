//! attach.rs — acquiring and releasing everything one encoder needs
//!
//! Attach runs a fixed sequence: pins, channel-A interrupt, button interrupt,
//! endpoint. Each resource goes on a rollback stack the moment it is
//! acquired. A failure pops the stack, and so does detach, so there is
//! exactly one teardown path and it always releases in reverse order.

use embassy_sync::blocking_mutex::raw::RawMutex;
use heapless::Vec;

use super::{AttachError, EncoderConfig, PublishStage, QuadratureDecoder, Resource, ResetHandler, RotaryEncoder};
use crate::platform::{
    DevNum, DevicePath, EndpointPublisher, FileOperations, InterruptController, IrqAction, IrqHandler, IrqLine,
    PlatformDevice,
};

/// Entries a complete attach leaves on the rollback stack: one per pin and
/// interrupt, the major number, and the class together with its device.
const ATTACH_ENTRIES: usize = Resource::ALL.len() + PublishStage::ALL.len() - 1;

/// Number of entries the rollback stack can hold.
const ROLLBACK_DEPTH: usize = 6;

const _: () = assert!(ROLLBACK_DEPTH >= ATTACH_ENTRIES);

/// How far an attachment has progressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AttachState {
    Unattached,
    PinsAcquired,
    InterruptsWired,
    EndpointPublished,
}

/// A resource held by an attachment, in the order it was acquired.
enum Acquired<P, K> {
    ChannelAPin(P),
    /// The pin itself is parked in the device context for the decoder.
    ChannelBPin,
    Irq(IrqLine),
    Major(u32),
    Class(K),
    Device { class: K, devt: DevNum },
}

/// An encoder bound to a bus device.
///
/// Created by [`Attachment::attach`], which either returns a fully operational
/// attachment or releases everything it took and returns the error. Must be
/// handed back to [`Attachment::detach`] with the same collaborators to
/// release its resources. Dropping it instead leaks every resource and leaves
/// the encoder claimed.
#[must_use = "an attachment holds its resources until handed to `detach`"]
pub struct Attachment<'d, M: RawMutex, D: PlatformDevice, K> {
    encoder: &'d RotaryEncoder<M, D::Pin>,
    config: EncoderConfig,
    stack: Vec<Acquired<D::Pin, K>, ROLLBACK_DEPTH>,
    state: AttachState,
    path: Option<DevicePath>,
}

impl<'d, M, D, K> Attachment<'d, M, D, K>
where
    M: RawMutex + 'd,
    D: PlatformDevice,
    D::Pin: 'd,
{
    /// Bind `encoder` to `device` and publish its endpoint.
    ///
    /// # Errors
    /// * [`AttachError::Busy`] if `encoder` is already attached; nothing is
    ///   acquired in that case.
    /// * [`AttachError::ResourceAcquisition`] if a pin or interrupt line is
    ///   not available.
    /// * [`AttachError::Registration`] if a handler cannot be registered.
    /// * [`AttachError::Publication`] if the endpoint cannot be published.
    ///
    /// On every error the resources acquired so far have been released.
    #[must_use = "dropping the attachment leaks its resources; pass it to `detach`"]
    pub fn attach<I, E>(
        encoder: &'d RotaryEncoder<M, D::Pin>,
        config: &EncoderConfig,
        device: &mut D,
        irqs: &mut I,
        publisher: &mut E,
    ) -> Result<Self, AttachError>
    where
        I: InterruptController<'d, RotaryEncoder<M, D::Pin>>,
        E: EndpointPublisher<'d, Class = K>,
    {
        if !encoder.claim() {
            warn!("rotenc: device context already attached");
            return Err(AttachError::Busy);
        }

        info!("rotenc: initialization started");
        encoder.position.reset();

        let mut attachment = Self {
            encoder,
            config: *config,
            stack: Vec::new(),
            state: AttachState::Unattached,
            path: None,
        };

        match attachment.acquire_all(device, irqs, publisher) {
            Ok(()) => {
                attachment.state = AttachState::EndpointPublished;
                info!("rotenc: initialization completed");
                Ok(attachment)
            }
            Err(err) => {
                error!("rotenc: attach failed in state {}, rolling back", attachment.state);
                attachment.teardown(device, irqs, publisher);
                Err(err)
            }
        }
    }

    /// Release everything, newest first.
    pub fn detach<I, E>(mut self, device: &mut D, irqs: &mut I, publisher: &mut E)
    where
        I: InterruptController<'d, RotaryEncoder<M, D::Pin>>,
        E: EndpointPublisher<'d, Class = K>,
    {
        info!("rotenc: removing device");
        self.teardown(device, irqs, publisher);
    }

    pub fn state(&self) -> AttachState {
        self.state
    }

    /// Path consumers open to read the position.
    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    pub fn encoder(&self) -> &'d RotaryEncoder<M, D::Pin> {
        self.encoder
    }

    pub fn config(&self) -> &EncoderConfig {
        &self.config
    }

    // -----------------------------------------------------------------------
    // Acquisition
    // -----------------------------------------------------------------------

    fn acquire_all<I, E>(&mut self, device: &mut D, irqs: &mut I, publisher: &mut E) -> Result<(), AttachError>
    where
        I: InterruptController<'d, RotaryEncoder<M, D::Pin>>,
        E: EndpointPublisher<'d, Class = K>,
    {
        let channel_a = device.get_input(self.config.channel_a).map_err(|code| {
            error!("rotenc: failed to set up channel A: {}", code.0);
            AttachError::ResourceAcquisition {
                resource: Resource::ChannelAPin,
                code,
            }
        })?;
        self.push(Acquired::ChannelAPin(channel_a), device, irqs, publisher)?;

        let channel_b = device.get_input(self.config.channel_b).map_err(|code| {
            error!("rotenc: failed to set up channel B: {}", code.0);
            AttachError::ResourceAcquisition {
                resource: Resource::ChannelBPin,
                code,
            }
        })?;
        self.encoder.install_channel_b(channel_b);
        self.push(Acquired::ChannelBPin, device, irqs, publisher)?;
        self.state = AttachState::PinsAcquired;

        self.wire::<QuadratureDecoder, I, E>(device, irqs, publisher, self.config.channel_a_irq, Resource::ChannelAIrq)?;
        self.wire::<ResetHandler, I, E>(device, irqs, publisher, self.config.button_irq, Resource::ButtonIrq)?;
        self.state = AttachState::InterruptsWired;

        self.publish(device, irqs, publisher)
    }

    /// Look up interrupt `index` and register handler `H` on it.
    fn wire<H, I, E>(
        &mut self,
        device: &mut D,
        irqs: &mut I,
        publisher: &mut E,
        index: usize,
        resource: Resource,
    ) -> Result<(), AttachError>
    where
        H: IrqHandler<RotaryEncoder<M, D::Pin>>,
        I: InterruptController<'d, RotaryEncoder<M, D::Pin>>,
        E: EndpointPublisher<'d, Class = K>,
    {
        let line = device.get_irq(index).map_err(|code| {
            error!("rotenc: error reading irq number {}: {}", index, code.0);
            AttachError::ResourceAcquisition { resource, code }
        })?;

        let action = IrqAction::new::<H>(self.config.name, self.encoder);
        irqs.request_irq(line, self.config.irq_flags, action).map_err(|code| {
            error!("rotenc: cannot connect irq {}: {}", line.0, code.0);
            AttachError::Registration { line, code }
        })?;
        self.push(Acquired::Irq(line), device, irqs, publisher)?;

        debug!("rotenc: irq {} wired", line.0);
        Ok(())
    }

    fn publish<I, E>(&mut self, device: &mut D, irqs: &mut I, publisher: &mut E) -> Result<(), AttachError>
    where
        I: InterruptController<'d, RotaryEncoder<M, D::Pin>>,
        E: EndpointPublisher<'d, Class = K>,
    {
        let name = self.config.name;
        let fops: &'d dyn FileOperations = self.encoder;

        let major = publisher.register_major(name, fops).map_err(|code| {
            error!("rotenc: could not allocate major number: {}", code.0);
            AttachError::Publication {
                stage: PublishStage::Major,
                code,
            }
        })?;
        self.push(Acquired::Major(major), device, irqs, publisher)?;

        let class = publisher.create_class(name).map_err(|code| {
            error!("rotenc: cannot create device class: {}", code.0);
            AttachError::Publication {
                stage: PublishStage::Class,
                code,
            }
        })?;

        let devt = DevNum::new(major, self.config.minor);
        match publisher.create_device(&class, devt, name) {
            Ok(path) => {
                self.push(Acquired::Device { class, devt }, device, irqs, publisher)?;
                info!("rotenc: published {} at {}", devt, path.as_str());
                self.path = Some(path);
                Ok(())
            }
            Err(code) => {
                self.push(Acquired::Class(class), device, irqs, publisher)?;
                error!("rotenc: cannot create device: {}", code.0);
                Err(AttachError::Publication {
                    stage: PublishStage::Device,
                    code,
                })
            }
        }
    }

    /// Record `acquired` for rollback. If the stack is full it is released
    /// on the spot and the attach fails.
    fn push<I, E>(
        &mut self,
        acquired: Acquired<D::Pin, K>,
        device: &mut D,
        irqs: &mut I,
        publisher: &mut E,
    ) -> Result<(), AttachError>
    where
        I: InterruptController<'d, RotaryEncoder<M, D::Pin>>,
        E: EndpointPublisher<'d, Class = K>,
    {
        self.stack.push(acquired).map_err(|acquired| {
            error!("rotenc: rollback stack full");
            self.release(acquired, device, irqs, publisher);
            AttachError::RollbackFull
        })
    }

    // -----------------------------------------------------------------------
    // Teardown
    // -----------------------------------------------------------------------

    /// Pop and release every held resource. Shared by rollback and detach.
    fn teardown<I, E>(&mut self, device: &mut D, irqs: &mut I, publisher: &mut E)
    where
        I: InterruptController<'d, RotaryEncoder<M, D::Pin>>,
        E: EndpointPublisher<'d, Class = K>,
    {
        while let Some(acquired) = self.stack.pop() {
            self.release(acquired, device, irqs, publisher);
        }

        self.path = None;
        self.state = AttachState::Unattached;
        self.encoder.unclaim();
    }

    fn release<I, E>(&self, acquired: Acquired<D::Pin, K>, device: &mut D, irqs: &mut I, publisher: &mut E)
    where
        I: InterruptController<'d, RotaryEncoder<M, D::Pin>>,
        E: EndpointPublisher<'d, Class = K>,
    {
        match acquired {
            Acquired::Device { class, devt } => {
                debug!("rotenc: destroying device {}", devt);
                publisher.destroy_device(&class, devt);
                publisher.destroy_class(class);
            }
            Acquired::Class(class) => {
                debug!("rotenc: destroying class");
                publisher.destroy_class(class);
            }
            Acquired::Major(major) => {
                debug!("rotenc: releasing major {}", major);
                publisher.unregister_major(major, self.config.name);
            }
            Acquired::Irq(line) => {
                debug!("rotenc: freeing irq {}", line.0);
                irqs.free_irq(line, self.encoder);
            }
            Acquired::ChannelBPin => match self.encoder.take_channel_b() {
                Some(pin) => device.put_pin(pin),
                None => warn!("rotenc: channel B pin missing at teardown"),
            },
            Acquired::ChannelAPin(pin) => device.put_pin(pin),
        }
    }
}

impl<M: RawMutex, D: PlatformDevice, K> Drop for Attachment<'_, M, D, K> {
    fn drop(&mut self) {
        if !self.stack.is_empty() {
            error!(
                "rotenc: attachment dropped without detach, {} resources leaked",
                self.stack.len()
            );
        }
    }
}
