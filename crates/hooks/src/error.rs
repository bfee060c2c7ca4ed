//! Hook errors

use thiserror::Error;

/// Errors raised by ledger listeners
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum HookError {
    #[error("Listener {listener} failed: {reason}")]
    Listener { listener: String, reason: String },

    /// Corrupted state detected by a listener; processing must halt
    #[error("Fatal invariant violation in listener {listener}: {reason}")]
    Fatal { listener: String, reason: String },
}

/// Result type for hook operations
pub type HookResult<T> = Result<T, HookError>;

impl HookError {
    /// Create a recoverable listener failure
    pub fn listener(listener: impl Into<String>, reason: impl Into<String>) -> Self {
        HookError::Listener {
            listener: listener.into(),
            reason: reason.into(),
        }
    }

    /// Create a fatal listener failure
    pub fn fatal(listener: impl Into<String>, reason: impl Into<String>) -> Self {
        HookError::Fatal {
            listener: listener.into(),
            reason: reason.into(),
        }
    }

    /// Check if this error must halt processing
    pub fn is_fatal(&self) -> bool {
        matches!(self, HookError::Fatal { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_listener_error() {
        let err = HookError::listener("rewards", "claim store unavailable");
        assert!(!err.is_fatal());
        assert!(err.to_string().contains("rewards"));
        assert!(err.to_string().contains("claim store unavailable"));
    }

    #[test]
    fn test_fatal_error() {
        let err = HookError::fatal("rewards", "reward index decreased");
        assert!(err.is_fatal());
        assert!(err.to_string().contains("Fatal"));
    }
}
