use std::time::Duration;

/// How often, and how far apart, a read is retried while waiting for an
/// earlier write to become visible.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Always at least 1.
    pub max_attempts: u32,
    pub delay: Duration,
}

impl RetryPolicy {
    /// `max_attempts` of zero is clamped to one.
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        RetryPolicy {
            max_attempts: max_attempts.max(1),
            delay,
        }
    }
}

/// Blocking wait. Swapped out in tests so nothing actually sleeps.
pub trait Sleeper {
    fn sleep(&self, duration: Duration);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) {
        if !duration.is_zero() {
            std::thread::sleep(duration);
        }
    }
}

/// Run `check` until it returns true, at most `policy.max_attempts` times,
/// sleeping `policy.delay` between failed attempts.
///
/// Returns whether any attempt succeeded. There is no sleep after the last
/// attempt, so a check that succeeds on attempt `k` costs `k - 1` sleeps.
pub fn poll<F>(mut check: F, policy: RetryPolicy, sleeper: &dyn Sleeper) -> bool
where
    F: FnMut(u32) -> bool,
{
    for attempt in 1..=policy.max_attempts {
        if check(attempt) {
            return true;
        }
        if attempt < policy.max_attempts {
            sleeper.sleep(policy.delay);
        }
    }
    false
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::cell::RefCell;

    /// Records requested sleeps instead of sleeping.
    #[derive(Default)]
    pub struct RecordingSleeper {
        pub sleeps: RefCell<Vec<Duration>>,
    }

    impl Sleeper for RecordingSleeper {
        fn sleep(&self, duration: Duration) {
            self.sleeps.borrow_mut().push(duration);
        }
    }

    #[test]
    fn succeeds_on_kth_attempt_with_k_minus_one_sleeps() {
        for k in 1..=4u32 {
            let sleeper = RecordingSleeper::default();
            let mut calls = 0;
            let ok = poll(
                |_| {
                    calls += 1;
                    calls == k
                },
                RetryPolicy::new(4, Duration::from_secs(2)),
                &sleeper,
            );
            assert!(ok);
            assert_eq!(calls, k);
            assert_eq!(sleeper.sleeps.borrow().len() as u32, k - 1);
            assert!(sleeper.sleeps.borrow().iter().all(|d| *d == Duration::from_secs(2)));
        }
    }

    #[test]
    fn always_failing_check_runs_max_attempts() {
        let sleeper = RecordingSleeper::default();
        let mut calls = 0;
        let ok = poll(
            |_| {
                calls += 1;
                false
            },
            RetryPolicy::new(3, Duration::from_millis(5)),
            &sleeper,
        );
        assert!(!ok);
        assert_eq!(calls, 3);
        assert_eq!(sleeper.sleeps.borrow().len(), 2);
    }

    #[test]
    fn attempt_numbers_are_one_based() {
        let sleeper = RecordingSleeper::default();
        let mut seen = Vec::new();
        poll(
            |n| {
                seen.push(n);
                false
            },
            RetryPolicy::new(3, Duration::ZERO),
            &sleeper,
        );
        assert_eq!(seen, vec![1, 2, 3]);
    }

    #[test]
    fn zero_attempts_is_clamped_to_one() {
        let p = RetryPolicy::new(0, Duration::ZERO);
        assert_eq!(p.max_attempts, 1);
    }
}
