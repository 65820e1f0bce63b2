//! Error types for the combinators
//!
//! Task-reported errors are never wrapped: they travel to the final callback
//! as the caller's own `E`. [`RelayError`] only covers failures of the
//! combinators themselves.

use thiserror::Error;

/// Errors raised by the combinators, independent of any task's error type
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RelayError {
    /// A chain was built without any task
    #[error("chain requires at least one task")]
    EmptyChain,

    /// Every continuation of an invocation was dropped before the final
    /// callback fired
    #[error("{combinator} invocation abandoned: a task dropped its continuation without reporting")]
    Abandoned {
        /// The combinator whose invocation can no longer complete
        combinator: &'static str,
    },
}

/// Result type alias for combinator operations
pub type Result<T> = std::result::Result<T, RelayError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_chain_error() {
        let msg = RelayError::EmptyChain.to_string();
        assert!(msg.contains("at least one task"));
    }

    #[test]
    fn test_abandoned_error() {
        let err = RelayError::Abandoned {
            combinator: "combine",
        };
        let msg = err.to_string();
        assert!(msg.contains("combine"));
        assert!(msg.contains("dropped its continuation"));
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<RelayError>();
    }

    #[test]
    fn test_error_debug_output() {
        let debug = format!("{:?}", RelayError::EmptyChain);
        assert!(debug.contains("EmptyChain"));
    }
}
