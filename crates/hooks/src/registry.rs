//! Hook Registry - holds the injected listeners and dispatches in order

use crate::error::HookResult;
use crate::event::LedgerEvent;
use crate::traits::LedgerListener;

/// Registry of ledger listeners
///
/// Listeners are dispatched in priority order (lower = first). Dispatch is
/// fail-closed: the first listener error stops dispatch and is returned.
#[derive(Default)]
pub struct HookRegistry<'a> {
    listeners: Vec<Box<dyn LedgerListener + 'a>>,
}

impl<'a> HookRegistry<'a> {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            listeners: Vec::new(),
        }
    }

    /// Register a listener
    pub fn register(&mut self, listener: Box<dyn LedgerListener + 'a>) {
        self.listeners.push(listener);
        // Stable sort keeps registration order within a priority
        self.listeners.sort_by_key(|l| l.priority());
    }

    /// Builder-style registration
    pub fn with_listener(mut self, listener: Box<dyn LedgerListener + 'a>) -> Self {
        self.register(listener);
        self
    }

    /// Dispatch an event to every listener
    pub fn dispatch(&mut self, event: &LedgerEvent) -> HookResult<()> {
        for listener in self.listeners.iter_mut() {
            match listener.on_event(event) {
                Ok(()) => {
                    tracing::trace!(
                        listener = listener.name(),
                        owner = %event.owner(),
                        kind = %event.kind(),
                        "ledger event handled"
                    );
                }
                Err(e) => {
                    tracing::error!(
                        listener = listener.name(),
                        owner = %event.owner(),
                        error = %e,
                        "ledger listener failed"
                    );
                    return Err(e);
                }
            }
        }
        Ok(())
    }

    /// Get number of registered listeners
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HookError;
    use crate::event::{PositionKind, SourceShares};
    use crate::traits::NoOpListener;
    use harbor_core::Address;
    use std::cell::RefCell;

    fn create_event() -> LedgerEvent {
        LedgerEvent::will_change(
            &Address::new("kava1alice"),
            PositionKind::Deposit,
            SourceShares::new(),
        )
    }

    struct RecordingListener<'r> {
        name: String,
        priority: u32,
        fail: bool,
        log: &'r RefCell<Vec<String>>,
    }

    impl LedgerListener for RecordingListener<'_> {
        fn name(&self) -> &str {
            &self.name
        }

        fn priority(&self) -> u32 {
            self.priority
        }

        fn on_event(&mut self, _event: &LedgerEvent) -> HookResult<()> {
            self.log.borrow_mut().push(self.name.clone());
            if self.fail {
                return Err(HookError::listener(&self.name, "refused"));
            }
            Ok(())
        }
    }

    #[test]
    fn test_empty_registry() {
        let mut registry = HookRegistry::new();
        assert!(registry.is_empty());
        assert!(registry.dispatch(&create_event()).is_ok());
    }

    #[test]
    fn test_register_listener() {
        let registry = HookRegistry::new().with_listener(Box::new(NoOpListener));
        assert_eq!(registry.listener_count(), 1);
    }

    #[test]
    fn test_dispatch_priority_order() {
        let log = RefCell::new(Vec::new());
        let mut registry = HookRegistry::new();

        // Register in reverse order to test sorting
        for (name, priority) in [("late", 200), ("early", 50), ("middle", 100)] {
            registry.register(Box::new(RecordingListener {
                name: name.to_string(),
                priority,
                fail: false,
                log: &log,
            }));
        }

        registry.dispatch(&create_event()).unwrap();
        assert_eq!(*log.borrow(), vec!["early", "middle", "late"]);
    }

    #[test]
    fn test_dispatch_stops_at_first_failure() {
        let log = RefCell::new(Vec::new());
        let mut registry = HookRegistry::new();
        registry.register(Box::new(RecordingListener {
            name: "first".to_string(),
            priority: 10,
            fail: true,
            log: &log,
        }));
        registry.register(Box::new(RecordingListener {
            name: "second".to_string(),
            priority: 20,
            fail: false,
            log: &log,
        }));

        let result = registry.dispatch(&create_event());
        assert!(matches!(result, Err(HookError::Listener { .. })));
        assert_eq!(*log.borrow(), vec!["first"]);
    }
}
