use std::time::Duration;

/// How many times a single source is attempted before falling back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryPolicy {
    /// One attempt per source.
    Once,

    /// Up to `max_retries + 1` attempts per source, waiting
    /// `base * 2^attempt` after each failed attempt except the last.
    Backoff { max_retries: u32, base: Duration },
}

impl RetryPolicy {
    pub fn attempts(&self) -> u32 {
        match self {
            RetryPolicy::Once => 1,
            RetryPolicy::Backoff { max_retries, .. } => max_retries.saturating_add(1),
        }
    }

    /// Delay to wait after the failed attempt `attempt` (0-indexed), or `None`
    /// when that attempt was the last one for the source.
    pub fn delay_after(&self, attempt: u32) -> Option<Duration> {
        match self {
            RetryPolicy::Once => None,
            RetryPolicy::Backoff { max_retries, base } => {
                (attempt < *max_retries).then(|| backoff_delay(*base, attempt))
            }
        }
    }
}

pub fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    let factor = 2u32.checked_pow(attempt).unwrap_or(u32::MAX);
    base.saturating_mul(factor)
}

#[cfg(test)]
mod tests {
    use super::*;

    const HALF_SECOND: Duration = Duration::from_millis(500);

    #[test]
    fn backoff_doubles_from_half_second() {
        assert_eq!(backoff_delay(HALF_SECOND, 0), Duration::from_millis(500));
        assert_eq!(backoff_delay(HALF_SECOND, 1), Duration::from_millis(1000));
        assert_eq!(backoff_delay(HALF_SECOND, 2), Duration::from_millis(2000));
        assert_eq!(backoff_delay(HALF_SECOND, 3), Duration::from_millis(4000));
    }

    #[test]
    fn backoff_saturates_instead_of_overflowing() {
        assert_eq!(backoff_delay(HALF_SECOND, 64), HALF_SECOND.saturating_mul(u32::MAX));
    }

    #[test]
    fn backoff_policy_sleeps_between_attempts_only() {
        let policy = RetryPolicy::Backoff {
            max_retries: 3,
            base: HALF_SECOND,
        };

        assert_eq!(policy.attempts(), 4);
        assert_eq!(policy.delay_after(0), Some(Duration::from_millis(500)));
        assert_eq!(policy.delay_after(2), Some(Duration::from_millis(2000)));
        assert_eq!(policy.delay_after(3), None);
    }

    #[test]
    fn once_policy_never_waits() {
        assert_eq!(RetryPolicy::Once.attempts(), 1);
        assert_eq!(RetryPolicy::Once.delay_after(0), None);
    }

    #[test]
    fn zero_retries_means_single_attempt() {
        let policy = RetryPolicy::Backoff {
            max_retries: 0,
            base: HALF_SECOND,
        };
        assert_eq!(policy.attempts(), 1);
        assert_eq!(policy.delay_after(0), None);
    }
}
