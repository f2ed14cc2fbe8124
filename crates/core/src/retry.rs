use std::time::Duration;

/// Attempts made for index creation and deletion before giving up.
pub const UPDATE_INDEX_RETRIES: u32 = 60;

/// Fixed-interval retry schedule for eventually consistent index operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total number of attempts, including the first one.
    pub max_attempts: u32,
    /// Pause between two attempts.
    pub interval: Duration,
}

impl RetryPolicy {
    /// At least one attempt is always made.
    pub fn new(max_attempts: u32, interval: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            interval,
        }
    }

    /// Upper bound on the time spent sleeping between attempts.
    pub fn max_wait(&self) -> Duration {
        self.interval * self.max_attempts.saturating_sub(1)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(UPDATE_INDEX_RETRIES, Duration::from_secs(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts, 60);
        assert_eq!(policy.interval, Duration::from_secs(1));
        assert_eq!(policy.max_wait(), Duration::from_secs(59));
    }

    #[test]
    fn test_zero_attempts_clamped() {
        let policy = RetryPolicy::new(0, Duration::ZERO);
        assert_eq!(policy.max_attempts, 1);
        assert_eq!(policy.max_wait(), Duration::ZERO);
    }
}
