use std::time::Duration;

use rand::Rng;

/// Backoff schedule for transient completion failures.
///
/// The primary model is tried once plus `retries` more times. Before retry
/// `k` (1-based) the client waits `backoff_base^k` seconds plus a uniform
/// jitter in `[0, max_jitter]`, so concurrent callers do not retry in lockstep.
#[derive(Clone, Debug, PartialEq)]
pub struct RetryPolicy {
    pub retries: u32,
    pub backoff_base: f64,
    pub max_jitter: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            retries: 3,
            backoff_base: 1.5,
            max_jitter: Duration::from_millis(500),
        }
    }
}

impl RetryPolicy {
    /// Total number of requests sent to the primary model.
    pub fn primary_attempts(&self) -> u32 {
        self.retries.saturating_add(1)
    }

    /// Deterministic part of the delay before retry `retry`.
    pub fn base_delay(&self, retry: u32) -> Duration {
        let power = i32::try_from(retry).unwrap_or(i32::MAX);
        let secs = self.backoff_base.powi(power);
        if secs.is_nan() || secs <= 0.0 {
            return Duration::ZERO;
        }
        Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX)
    }

    /// Delay before retry `retry`, jittered with the supplied generator.
    pub fn backoff_with<R: Rng + ?Sized>(&self, retry: u32, rng: &mut R) -> Duration {
        let base = self.base_delay(retry);
        let jitter_secs = self.max_jitter.as_secs_f64();
        if jitter_secs <= 0.0 {
            return base;
        }
        let jitter = Duration::from_secs_f64(rng.gen_range(0.0..=jitter_secs));
        base.saturating_add(jitter)
    }

    /// Delay before retry `retry`, jittered with the thread-local generator.
    pub fn backoff(&self, retry: u32) -> Duration {
        self.backoff_with(retry, &mut rand::thread_rng())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn defaults_match_the_documented_schedule() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.retries, 3);
        assert_eq!(policy.primary_attempts(), 4);
        assert_eq!(policy.base_delay(1), Duration::from_secs_f64(1.5));
        assert_eq!(policy.base_delay(2), Duration::from_secs_f64(2.25));
    }

    #[test]
    fn backoff_stays_within_jitter_window() {
        let policy = RetryPolicy::default();
        let mut rng = StdRng::seed_from_u64(7);
        for retry in 1..=5 {
            let floor = policy.base_delay(retry);
            let ceiling = floor + Duration::from_millis(500);
            for _ in 0..200 {
                let delay = policy.backoff_with(retry, &mut rng);
                assert!(delay >= floor, "retry {retry}: {delay:?} < {floor:?}");
                assert!(delay <= ceiling, "retry {retry}: {delay:?} > {ceiling:?}");
            }
        }
    }

    #[test]
    fn jitter_actually_varies() {
        let policy = RetryPolicy::default();
        let mut rng = StdRng::seed_from_u64(42);
        let samples: Vec<_> = (0..20).map(|_| policy.backoff_with(1, &mut rng)).collect();
        assert!(samples.windows(2).any(|pair| pair[0] != pair[1]));
    }

    #[test]
    fn zero_jitter_is_exact() {
        let policy = RetryPolicy {
            max_jitter: Duration::ZERO,
            ..RetryPolicy::default()
        };
        assert_eq!(policy.backoff(3), policy.base_delay(3));
    }

    #[test]
    fn degenerate_bases_do_not_panic() {
        let policy = RetryPolicy {
            backoff_base: -2.0,
            max_jitter: Duration::ZERO,
            ..RetryPolicy::default()
        };
        assert_eq!(policy.backoff(1), Duration::ZERO);
        let huge = RetryPolicy {
            backoff_base: 1e300,
            ..RetryPolicy::default()
        };
        assert_eq!(huge.base_delay(5), Duration::MAX);
        assert_eq!(huge.backoff(5), Duration::MAX);
    }
}
