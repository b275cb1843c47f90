use std::time::Duration;

/// Per-call retry configuration.
///
/// `attempts` counts total tries, not extra ones: the default of 1 means
/// fail on the first error. Each retry re-resolves the provider address, so
/// after a failure the balancer can steer the call away from the address
/// that just refused it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn new(attempts: u32, delay: Duration) -> Self {
        Self {
            attempts: attempts.max(1),
            delay,
        }
    }

    /// Single attempt, no retry.
    pub fn none() -> Self {
        Self {
            attempts: 1,
            delay: Duration::ZERO,
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::none()
    }
}
