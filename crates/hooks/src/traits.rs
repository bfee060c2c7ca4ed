//! Listener trait - interface for ledger mutation observers

use crate::error::HookResult;
use crate::event::LedgerEvent;

/// Observer of ledger mutations
///
/// Listeners run synchronously inside the ledger operation that fired the
/// event. Returning an error aborts that operation; a fatal error also
/// signals that processing must halt.
pub trait LedgerListener {
    /// Listener name for logging/debugging
    fn name(&self) -> &str;

    /// Priority (lower = runs first)
    fn priority(&self) -> u32 {
        100
    }

    /// Called for every dispatched event
    fn on_event(&mut self, event: &LedgerEvent) -> HookResult<()>;
}

/// A listener that ignores every event (for testing)
pub struct NoOpListener;

impl LedgerListener for NoOpListener {
    fn name(&self) -> &str {
        "NoOpListener"
    }

    fn on_event(&mut self, _event: &LedgerEvent) -> HookResult<()> {
        Ok(())
    }
}
