//! Retry accounting and randomized exponential backoff

use std::time::Duration;

use rand::Rng;

/// Retries allowed after the first attempt
pub const DEFAULT_MAX_RETRIES: u32 = 10;

/// Exponent cap so `2^retry` seconds stays representable
const MAX_EXPONENT: u32 = 32;

/// Source of uniform samples in `[0, 1)`
pub trait Jitter: Send {
    fn sample(&mut self) -> f64;
}

/// Thread-local PRNG, a fresh draw per call
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomJitter;

impl Jitter for RandomJitter {
    fn sample(&mut self) -> f64 {
        rand::rng().random::<f64>()
    }
}

/// Sleep before the `retry`-th retry: `unit * 2^retry` seconds
pub fn backoff_delay(retry: u32, unit: f64) -> Duration {
    let unit = if unit.is_finite() {
        unit.clamp(0.0, 1.0)
    } else {
        0.0
    };
    let bound = Duration::from_secs(1u64 << retry.min(MAX_EXPONENT));
    Duration::from_secs_f64(unit * bound.as_secs_f64()).min(bound - Duration::from_nanos(1))
}

/// What to do after a retriable failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Back off, then attempt again; carries the new retry count
    Retry(u32),
    /// Ceiling passed
    Exhausted,
}

/// Failure counter for one upload
#[derive(Debug, Clone)]
pub struct RetryState {
    retry_count: u32,
    max_retries: u32,
}

impl RetryState {
    pub fn new(max_retries: u32) -> Self {
        Self {
            retry_count: 0,
            max_retries,
        }
    }

    pub fn retry_count(&self) -> u32 {
        self.retry_count
    }

    /// Count a retriable failure against the ceiling
    pub fn record_failure(&mut self) -> RetryDecision {
        self.retry_count += 1;
        if self.retry_count > self.max_retries {
            RetryDecision::Exhausted
        } else {
            RetryDecision::Retry(self.retry_count)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ceiling_allows_ten_retries() {
        let mut state = RetryState::new(DEFAULT_MAX_RETRIES);
        for expected in 1..=10 {
            assert_eq!(state.record_failure(), RetryDecision::Retry(expected));
        }
        assert_eq!(state.record_failure(), RetryDecision::Exhausted);
        assert_eq!(state.retry_count(), 11);
    }

    #[test]
    fn test_zero_ceiling_exhausts_on_first_failure() {
        let mut state = RetryState::new(0);
        assert_eq!(state.record_failure(), RetryDecision::Exhausted);
    }

    #[test]
    fn test_backoff_delay_scales_with_retry() {
        assert_eq!(backoff_delay(1, 0.5), Duration::from_secs(1));
        assert_eq!(backoff_delay(3, 0.5), Duration::from_secs(4));
        assert_eq!(backoff_delay(4, 0.0), Duration::ZERO);
    }

    #[test]
    fn test_backoff_delay_stays_below_upper_bound() {
        for retry in 1..=10 {
            let bound = Duration::from_secs(1 << retry);
            assert!(backoff_delay(retry, 1.0) < bound);
            assert!(backoff_delay(retry, 7.5) < bound);
            assert_eq!(backoff_delay(retry, -1.0), Duration::ZERO);
            assert_eq!(backoff_delay(retry, f64::NAN), Duration::ZERO);
        }
    }

    #[test]
    fn test_random_jitter_in_unit_interval() {
        let mut jitter = RandomJitter;
        let samples: Vec<f64> = (0..64).map(|_| jitter.sample()).collect();
        assert!(samples.iter().all(|s| (0.0..1.0).contains(s)));
        assert!(samples.windows(2).any(|w| w[0] != w[1]));
    }
}
