use core::fmt;

use super::HostError;

/// Interrupt line number assigned by the bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct IrqLine(pub u32);

impl fmt::Display for IrqLine {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What a handler reports back to the interrupt dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum IrqReturn {
    /// The interrupt was not raised by this device.
    Unhandled,
    /// The interrupt was serviced.
    Handled,
}

/// Registration flags passed along with an [`IrqAction`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct IrqFlags {
    /// The line may be shared with handlers from other drivers.
    pub shared: bool,
}

impl IrqFlags {
    pub const SHARED: Self = Self { shared: true };
}

/// Interrupt handler invoked with the context it was registered with.
///
/// Implementors are usually uninhabited marker types: the state lives in the
/// context, and the handler is just the function that knows what to do with
/// it on an edge. Handlers run in interrupt context and must not block.
pub trait IrqHandler<C: ?Sized> {
    fn handle_irq(line: IrqLine, context: &C) -> IrqReturn;
}

/// A handler bound to its context, ready to be attached to a line.
pub struct IrqAction<'d, C: ?Sized> {
    name: &'static str,
    handler: fn(IrqLine, &C) -> IrqReturn,
    context: &'d C,
}

impl<'d, C: ?Sized> IrqAction<'d, C> {
    /// Bind handler `H` to `context`. `name` identifies the owner of the line.
    pub fn new<H: IrqHandler<C>>(name: &'static str, context: &'d C) -> Self {
        Self {
            name,
            handler: H::handle_irq,
            context,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn context(&self) -> &'d C {
        self.context
    }

    /// True if this action was registered with exactly `context`.
    pub fn is_bound_to(&self, context: &C) -> bool {
        core::ptr::eq(self.context, context)
    }

    /// Run the handler, as the dispatcher does when `line` fires.
    pub fn fire(&self, line: IrqLine) -> IrqReturn {
        (self.handler)(line, self.context)
    }
}

impl<C: ?Sized> Clone for IrqAction<'_, C> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<C: ?Sized> Copy for IrqAction<'_, C> {}

/// The host's interrupt controller.
///
/// `'d` is how long the registered contexts stay valid; every action must be
/// freed before its context goes away.
pub trait InterruptController<'d, C: ?Sized> {
    /// Attach `action` to `line`.
    fn request_irq(
        &mut self,
        line: IrqLine,
        flags: IrqFlags,
        action: IrqAction<'d, C>,
    ) -> Result<(), HostError>;

    /// Detach the action registered on `line` with `context`.
    fn free_irq(&mut self, line: IrqLine, context: &'d C);
}
