use std::time::Duration;

/// Exponential backoff for reopening a failed live query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconnectPolicy {
    /// Delay before the first reopen attempt. Default: 1s.
    pub initial_delay: Duration,

    /// Upper bound on backoff delay. Default: 30s.
    pub max_delay: Duration,

    /// Consecutive failed attempts before the store stops reopening.
    /// `None` means retry forever.
    pub max_retries: Option<u32>,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            max_retries: None,
        }
    }
}

impl ReconnectPolicy {
    pub(crate) fn exhausted(&self, attempt: u32) -> bool {
        self.max_retries.is_some_and(|max| attempt >= max)
    }

    /// Delay before reopen attempt `attempt` (zero-based): doubled per
    /// attempt, capped, then spread by a deterministic jitter of ±25%.
    pub(crate) fn backoff(&self, attempt: u32) -> Duration {
        let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
        let base = self.initial_delay.as_secs_f64() * 2.0_f64.powi(exponent);
        let capped = base.min(self.max_delay.as_secs_f64());

        let jitter_factor = 1.0 + 0.25 * (f64::from(attempt) * 7.3).sin();
        let with_jitter = (capped * jitter_factor).max(0.0);

        Duration::from_secs_f64(with_jitter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_policy() {
        let policy = ReconnectPolicy::default();
        assert_eq!(policy.initial_delay, Duration::from_secs(1));
        assert_eq!(policy.max_delay, Duration::from_secs(30));
        assert!(policy.max_retries.is_none());
        assert!(!policy.exhausted(10_000));
    }

    #[test]
    fn backoff_grows_exponentially() {
        let policy = ReconnectPolicy {
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(60),
            max_retries: None,
        };

        // Attempt 0: sin(0) = 0, so no jitter.
        assert!((policy.backoff(0).as_secs_f64() - 1.0).abs() < 0.01);

        let d1 = policy.backoff(1).as_secs_f64();
        assert!((1.5..=2.5).contains(&d1), "attempt 1: {d1}");

        let d3 = policy.backoff(3).as_secs_f64();
        assert!((6.0..=10.0).contains(&d3), "attempt 3: {d3}");
    }

    #[test]
    fn backoff_respects_cap() {
        let policy = ReconnectPolicy {
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(5),
            max_retries: Some(3),
        };
        for attempt in 0..40 {
            assert!(policy.backoff(attempt).as_secs_f64() <= 5.0 * 1.25 + 0.01);
        }
        assert!(policy.exhausted(3));
        assert!(!policy.exhausted(2));
    }
}
