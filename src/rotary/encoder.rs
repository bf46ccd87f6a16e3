//! encoder.rs — per-device state and the two edge handlers

use core::cell::RefCell;

use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::RawMutex;
use embedded_hal::digital::InputPin;
use portable_atomic::{AtomicBool, AtomicUsize, Ordering};

use super::Position;
use crate::platform::{IrqHandler, IrqLine, IrqReturn};

// ============================================================================
// DEVICE CONTEXT
// ============================================================================

/// State of one encoder, shared by its interrupt handlers and readers.
///
/// This is the opaque context the handlers are registered with and the
/// object the published endpoint reads from. It has to outlive the
/// [`Attachment`](crate::Attachment) that wires it up, so it usually lives in
/// a `static`.
///
/// `M` is the raw mutex guarding channel B (use `CriticalSectionRawMutex`
/// when handlers and readers run on different priorities or cores). `B` is
/// the channel-B pin type.
pub struct RotaryEncoder<M: RawMutex, B> {
    pub(super) position: Position,
    channel_b: Mutex<M, RefCell<Option<B>>>,
    pub(super) sessions: AtomicUsize,
    attached: AtomicBool,
}

impl<M: RawMutex, B> RotaryEncoder<M, B> {
    pub const fn new() -> Self {
        Self {
            position: Position::new(),
            channel_b: Mutex::new(RefCell::new(None)),
            sessions: AtomicUsize::new(0),
            attached: AtomicBool::new(false),
        }
    }

    pub fn position(&self) -> &Position {
        &self.position
    }

    /// True while an [`Attachment`](crate::Attachment) holds this context.
    pub fn is_attached(&self) -> bool {
        self.attached.load(Ordering::Acquire)
    }

    /// Number of endpoint sessions currently open.
    pub fn open_sessions(&self) -> usize {
        self.sessions.load(Ordering::Relaxed)
    }

    /// Mark the context as attached; false if it already was.
    pub(super) fn claim(&self) -> bool {
        self.attached
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    pub(super) fn unclaim(&self) {
        self.attached.store(false, Ordering::Release);
    }

    /// Hand the channel-B pin to the decoder.
    pub(super) fn install_channel_b(&self, pin: B) {
        self.channel_b.lock(|slot| *slot.borrow_mut() = Some(pin));
    }

    /// Take the channel-B pin back from the decoder.
    pub(super) fn take_channel_b(&self) -> Option<B> {
        self.channel_b.lock(|slot| slot.borrow_mut().take())
    }
}

impl<M: RawMutex, B> Default for RotaryEncoder<M, B> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: RawMutex, B: InputPin> RotaryEncoder<M, B> {
    /// Sample channel B. `None` when no pin is installed.
    ///
    /// A failed read counts as low.
    fn channel_b_is_high(&self) -> Option<bool> {
        self.channel_b.lock(|slot| {
            slot.borrow_mut()
                .as_mut()
                .map(|pin| pin.is_high().unwrap_or(false))
        })
    }
}

// ============================================================================
// INTERRUPT HANDLERS
// ============================================================================

/// Channel-A edge handler.
///
/// Single-edge decode: on every channel-A transition, channel B high means
/// one step up and channel B low one step down. That yields one count per
/// detent. Channel B is sampled when the handler runs, not at the edge
/// itself, so on fast rotation a late sample can flip the direction of a
/// step. Inputs are not debounced.
pub enum QuadratureDecoder {}

impl<M: RawMutex, B: InputPin> IrqHandler<RotaryEncoder<M, B>> for QuadratureDecoder {
    fn handle_irq(_line: IrqLine, encoder: &RotaryEncoder<M, B>) -> IrqReturn {
        match encoder.channel_b_is_high() {
            Some(true) => {
                let pos = encoder.position.increment();
                debug!("rotenc: pos: {}", pos);
            }
            Some(false) => {
                let pos = encoder.position.decrement();
                debug!("rotenc: pos: {}", pos);
            }
            None => trace!("rotenc: channel A edge without channel B"),
        }

        IrqReturn::Handled
    }
}

/// Push-button edge handler. Every edge, bounce included, zeroes the
/// position.
pub enum ResetHandler {}

impl<M: RawMutex, B> IrqHandler<RotaryEncoder<M, B>> for ResetHandler {
    fn handle_irq(_line: IrqLine, encoder: &RotaryEncoder<M, B>) -> IrqReturn {
        encoder.position.reset();
        debug!("rotenc: pos: {}", encoder.position.snapshot());

        IrqReturn::Handled
    }
}
