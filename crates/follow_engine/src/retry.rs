//! Retry and pacing decisions for paginated collection.
use std::time::Duration;

use rand::Rng;

use crate::FailureClass;

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Retries granted to network and generic HTTP failures before giving up.
    pub max_transient_retries: u32,
    pub transient_delay: Duration,
    /// Retries granted to consecutive 429 responses before giving up.
    pub max_rate_limit_retries: u32,
    /// Rate-limit wait grows linearly: `rate_limit_step * attempt`.
    pub rate_limit_step: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_transient_retries: 3,
            transient_delay: Duration::from_secs(2),
            max_rate_limit_retries: 3,
            rate_limit_step: Duration::from_secs(5),
        }
    }
}

/// Consecutive failures seen since the last successful page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RetryBudget {
    pub transient: u32,
    pub rate_limit: u32,
}

impl RetryBudget {
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Rate limited: wait, then request the same page again.
    Backoff { attempt: u32, delay: Duration },
    /// Transient failure: wait, then request the same page again.
    Retry { attempt: u32, delay: Duration },
    /// Rate-limit retries exhausted.
    RateLimitExceeded,
    /// Transient retries exhausted.
    Exhausted { attempts: u32 },
    /// Not retryable at all.
    Fatal,
}

impl RetryPolicy {
    /// Wait before retry number `attempt` (1-based) of a failure class.
    pub fn backoff_delay(&self, class: FailureClass, attempt: u32) -> Duration {
        match class {
            FailureClass::RateLimit => self.rate_limit_step * attempt,
            FailureClass::Transient => self.transient_delay,
            FailureClass::Fatal => Duration::ZERO,
        }
    }

    /// Records one failure in `budget` and decides what happens next.
    pub fn decide(&self, class: FailureClass, budget: &mut RetryBudget) -> RetryDecision {
        match class {
            FailureClass::RateLimit => {
                if budget.rate_limit >= self.max_rate_limit_retries {
                    return RetryDecision::RateLimitExceeded;
                }
                budget.rate_limit += 1;
                RetryDecision::Backoff {
                    attempt: budget.rate_limit,
                    delay: self.backoff_delay(class, budget.rate_limit),
                }
            }
            FailureClass::Transient => {
                if budget.transient >= self.max_transient_retries {
                    return RetryDecision::Exhausted {
                        attempts: budget.transient + 1,
                    };
                }
                budget.transient += 1;
                RetryDecision::Retry {
                    attempt: budget.transient,
                    delay: self.backoff_delay(class, budget.transient),
                }
            }
            FailureClass::Fatal => RetryDecision::Fatal,
        }
    }
}

/// Jittered pause between two successful pages, uniformly in `[min, max]`.
pub fn page_pause(min: Duration, max: Duration) -> Duration {
    if max <= min {
        return min;
    }
    let min_ms = min.as_millis() as u64;
    let max_ms = max.as_millis() as u64;
    Duration::from_millis(rand::rng().random_range(min_ms..=max_ms))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_limit_delay_grows_linearly() {
        let policy = RetryPolicy::default();
        let mut budget = RetryBudget::default();
        let delays: Vec<_> = (0..3)
            .map(|_| match policy.decide(FailureClass::RateLimit, &mut budget) {
                RetryDecision::Backoff { delay, .. } => delay,
                other => panic!("unexpected decision {other:?}"),
            })
            .collect();
        assert_eq!(
            delays,
            vec![
                Duration::from_secs(5),
                Duration::from_secs(10),
                Duration::from_secs(15)
            ]
        );
        assert_eq!(
            policy.decide(FailureClass::RateLimit, &mut budget),
            RetryDecision::RateLimitExceeded
        );
    }

    #[test]
    fn transient_failures_use_fixed_delay_then_exhaust() {
        let policy = RetryPolicy::default();
        let mut budget = RetryBudget::default();
        for attempt in 1..=3 {
            assert_eq!(
                policy.decide(FailureClass::Transient, &mut budget),
                RetryDecision::Retry {
                    attempt,
                    delay: Duration::from_secs(2)
                }
            );
        }
        assert_eq!(
            policy.decide(FailureClass::Transient, &mut budget),
            RetryDecision::Exhausted { attempts: 4 }
        );
    }

    #[test]
    fn budgets_are_independent_and_reset() {
        let policy = RetryPolicy::default();
        let mut budget = RetryBudget::default();
        policy.decide(FailureClass::Transient, &mut budget);
        policy.decide(FailureClass::RateLimit, &mut budget);
        assert_eq!(budget, RetryBudget { transient: 1, rate_limit: 1 });

        budget.reset();
        assert_eq!(
            policy.decide(FailureClass::RateLimit, &mut budget),
            RetryDecision::Backoff {
                attempt: 1,
                delay: Duration::from_secs(5)
            }
        );
    }

    #[test]
    fn fatal_failures_are_never_retried() {
        let policy = RetryPolicy::default();
        let mut budget = RetryBudget::default();
        assert_eq!(
            policy.decide(FailureClass::Fatal, &mut budget),
            RetryDecision::Fatal
        );
        assert_eq!(budget, RetryBudget::default());
    }

    #[test]
    fn page_pause_stays_in_range() {
        let min = Duration::from_millis(1000);
        let max = Duration::from_millis(1500);
        for _ in 0..200 {
            let pause = page_pause(min, max);
            assert!(pause >= min && pause <= max, "{pause:?}");
        }
        assert_eq!(page_pause(max, min), max);
    }
}
