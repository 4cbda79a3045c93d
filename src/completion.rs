//! End-of-frame interrupt handling.

use core::cell::RefCell;

use critical_section::Mutex;

use crate::dma::CompletionSignal;
use crate::port::OutputPort;
use crate::state::TransferState;
use crate::time::Monotonic;

/// Code bound to an interrupt vector.
pub trait InterruptHandler {
    fn on_interrupt(&mut self);
}

/// Runs once per frame when the clock channel finishes its pass.
///
/// Owns the idle write to the port, so the last clock pulse of a frame is
/// always pulled down before anything else can observe the lines. Never
/// touches the frame.
#[derive(Debug)]
pub struct CompletionHandler<'a, P, S, K> {
    state: &'a TransferState,
    port: P,
    signal: S,
    clock: K,
    idle_word: u16,
}

impl<'a, P, S, K> CompletionHandler<'a, P, S, K>
where
    P: OutputPort,
    S: CompletionSignal,
    K: Monotonic,
{
    pub const fn new(
        state: &'a TransferState,
        port: P,
        signal: S,
        clock: K,
        idle_word: u16,
    ) -> Self {
        Self {
            state,
            port,
            signal,
            clock,
            idle_word,
        }
    }

    pub const fn state(&self) -> &'a TransferState {
        self.state
    }

    /// Drive the port to its idle level: clock low, data lines high.
    pub fn restore_idle(&mut self) {
        self.port.write(self.idle_word);
    }

    pub fn on_transfer_complete(&mut self) {
        self.signal.clear();
        self.restore_idle();
        let now = self.clock.now();
        self.state.complete(now);
    }
}

impl<P, S, K> InterruptHandler for CompletionHandler<'_, P, S, K>
where
    P: OutputPort,
    S: CompletionSignal,
    K: Monotonic,
{
    fn on_interrupt(&mut self) {
        self.on_transfer_complete();
    }
}

/// Parking spot for a handler that interrupt context has to reach.
///
/// ```ignore
/// static COMPLETION: InterruptSlot<Handler> = InterruptSlot::new();
///
/// #[interrupt]
/// fn DMA_CH3() {
///     COMPLETION.dispatch();
/// }
/// ```
pub struct InterruptSlot<H> {
    inner: Mutex<RefCell<Option<H>>>,
}

impl<H: InterruptHandler> InterruptSlot<H> {
    pub const fn new() -> Self {
        Self {
            inner: Mutex::new(RefCell::new(None)),
        }
    }

    /// Bind `handler`, returning the one it replaces.
    pub fn install(&self, handler: H) -> Option<H> {
        critical_section::with(|cs| self.inner.borrow_ref_mut(cs).replace(handler))
    }

    pub fn take(&self) -> Option<H> {
        critical_section::with(|cs| self.inner.borrow_ref_mut(cs).take())
    }

    /// Run the bound handler. Returns `false` when the slot is empty.
    pub fn dispatch(&self) -> bool {
        critical_section::with(|cs| match self.inner.borrow_ref_mut(cs).as_mut() {
            Some(handler) => {
                handler.on_interrupt();
                true
            }
            None => false,
        })
    }
}

impl<H: InterruptHandler> Default for InterruptSlot<H> {
    fn default() -> Self {
        Self::new()
    }
}
