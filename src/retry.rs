//! # Retrying failed introspection
//!
//! A [Retrier] decides whether another attempt should be made after an attempt failed. It's
//! consulted with the error of the latest attempt and the number of attempts made so far, which
//! starts at `1` after the first failure.

use crate::error::Error;

/// Decides whether to make another attempt after a failure.
pub trait Retrier: Send + Sync {
    /// Returns true if another attempt should be made, given the error of the previous attempt and
    /// the total number of attempts made so far.
    fn should_retry(&self, error: &Error, attempts: u32) -> bool;
}

/// A [Retrier] that stops after a fixed number of attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CountRetrier {
    max_attempts: u32,
}

impl CountRetrier {
    /// Creates a retrier that allows `max_retries` attempts beyond the first one.
    pub fn new(max_retries: u32) -> Self {
        CountRetrier {
            max_attempts: max_retries.saturating_add(1),
        }
    }

    /// Returns the total number of attempts this retrier allows, including the first one.
    #[inline]
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }
}

impl Retrier for CountRetrier {
    #[inline]
    fn should_retry(&self, _error: &Error, attempts: u32) -> bool {
        attempts < self.max_attempts
    }
}

impl<F> Retrier for F
where
    F: Fn(&Error, u32) -> bool + Send + Sync,
{
    #[inline]
    fn should_retry(&self, error: &Error, attempts: u32) -> bool {
        self(error, attempts)
    }
}
