//! Utility macros and functions for the HTTP crate.
//!
//! This module provides helper macros and functions that are used internally
//! by the HTTP crate implementation.

use std::time::Duration;

use tokio::time::Instant;

/// A macro for early returns with an error if a condition is not met.
///
/// This is similar to the `assert!` macro, but returns an error instead of panicking.
/// It's useful for validation checks where you want to return early with an error
/// if some condition is not satisfied.
///
/// # Arguments
///
/// * `$predicate` - A boolean expression that should evaluate to true
/// * `$error` - The error value to return if the predicate is false
///
/// # Example
///
/// ```ignore
/// ensure!(!start_line.is_empty(), SendError::EmptyStartLine);
/// ```
macro_rules! ensure {
    ($predicate:expr, $error:expr) => {
        if !$predicate {
            return Err($error);
        }
    };
}

pub(crate) use ensure;

/// Absolute deadline `timeout` from now; a zero timeout means no deadline at all.
pub(crate) fn deadline_after(timeout: Duration) -> Option<Instant> {
    if timeout.is_zero() { None } else { Instant::now().checked_add(timeout) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_timeout_has_no_deadline() {
        assert_eq!(deadline_after(Duration::ZERO), None);
    }

    #[test]
    fn deadline_is_in_the_future() {
        let deadline = deadline_after(Duration::from_secs(60)).unwrap();
        assert!(deadline > Instant::now());
    }
}
