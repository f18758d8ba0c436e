// Copyright (c) James Kassemi, SC, US. All rights reserved.
use log::warn;
use rand::Rng;
use std::fmt::Display;
use std::time::Duration;
use tokio::time::sleep;

/// Jittered exponential backoff for idempotent store reads.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: usize,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
    pub jitter_pct: f64,
}

impl RetryPolicy {
    pub fn new(
        max_attempts: usize,
        base_delay_ms: u64,
        max_delay_ms: u64,
        jitter_pct: f64,
    ) -> Self {
        let base_delay_ms = base_delay_ms.max(1);
        Self {
            max_attempts: max_attempts.max(1),
            base_delay_ms,
            max_delay_ms: max_delay_ms.max(base_delay_ms),
            jitter_pct: jitter_pct.clamp(0.0, 1.0),
        }
    }

    /// Single attempt; failures surface immediately.
    pub fn none() -> Self {
        Self::new(1, 1, 1, 0.0)
    }

    pub fn default_network() -> Self {
        Self::new(5, 250, 5_000, 0.25)
    }

    fn next_delay(&self, attempt: usize) -> Duration {
        let exp = 2_u64.saturating_pow(attempt as u32);
        let delay = self.base_delay_ms.saturating_mul(exp).min(self.max_delay_ms);
        if self.jitter_pct <= 0.0 {
            return Duration::from_millis(delay);
        }
        let spread = (delay as f64 * self.jitter_pct) as i64;
        let delta = rand::thread_rng().gen_range(-spread..=spread);
        Duration::from_millis(delay.saturating_add_signed(delta))
    }

    /// Runs `op` until it succeeds, `retryable` rejects the error, or attempts run out.
    pub async fn retry_async<F, Fut, T, E, R>(
        &self,
        label: &str,
        retryable: R,
        mut op: F,
    ) -> Result<T, E>
    where
        F: FnMut(usize) -> Fut,
        Fut: std::future::Future<Output = Result<T, E>>,
        E: Display,
        R: Fn(&E) -> bool,
    {
        let mut attempt = 0;
        loop {
            match op(attempt).await {
                Ok(val) => return Ok(val),
                Err(err) => {
                    attempt += 1;
                    if attempt >= self.max_attempts || !retryable(&err) {
                        return Err(err);
                    }
                    let delay = self.next_delay(attempt - 1);
                    warn!(
                        "{label} failed (attempt {attempt}/{}): {err}; retrying in {delay:?}",
                        self.max_attempts
                    );
                    sleep(delay).await;
                }
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use tokio::time::{pause, Instant};

    #[test]
    fn degenerate_settings_still_make_one_attempt() {
        let policy = RetryPolicy::new(0, 0, 0, -3.0);
        assert_eq!(
            (policy.max_attempts, policy.base_delay_ms, policy.max_delay_ms),
            (1, 1, 1)
        );
        assert_eq!(policy.jitter_pct, 0.0);
        assert_eq!(RetryPolicy::default().max_attempts, 1);
    }

    #[test]
    fn backoff_grows_geometrically_up_to_the_cap() {
        let policy = RetryPolicy::new(8, 25, 150, 0.0);
        let millis: Vec<u128> = (0..4).map(|n| policy.next_delay(n).as_millis()).collect();
        assert_eq!(millis, vec![25, 50, 100, 150]);
    }

    #[test]
    fn jitter_stays_within_its_spread() {
        let policy = RetryPolicy::new(2, 1_000, 1_000, 0.1);
        for _ in 0..50 {
            let delay = policy.next_delay(0).as_millis();
            assert!((900..=1_100).contains(&delay), "{delay}");
        }
    }

    #[tokio::test]
    async fn throttled_reads_succeed_on_a_later_attempt() {
        pause();
        let policy = RetryPolicy::new(4, 100, 100, 0.0);
        let calls = Cell::new(0);
        let started = Instant::now();

        let page: Result<usize, String> = policy
            .retry_async("query", |err: &String| err == "throttled", |attempt| {
                calls.set(calls.get() + 1);
                async move {
                    match attempt {
                        0 | 1 => Err("throttled".to_string()),
                        _ => Ok(10_000),
                    }
                }
            })
            .await;

        assert_eq!(page, Ok(10_000));
        assert_eq!(calls.get(), 3);
        assert!(started.elapsed() >= Duration::from_millis(200));
    }

    #[tokio::test]
    async fn exhausted_attempts_return_the_last_error() {
        pause();
        let calls = Cell::new(0);
        let result: Result<(), String> = RetryPolicy::new(3, 5, 5, 0.0)
            .retry_async("find_views", |_| true, |attempt| {
                calls.set(calls.get() + 1);
                async move { Err(format!("attempt {attempt} failed")) }
            })
            .await;
        assert_eq!(result, Err("attempt 2 failed".to_string()));
        assert_eq!(calls.get(), 3);
    }

    #[tokio::test]
    async fn non_transient_errors_short_circuit() {
        let calls = Cell::new(0);
        let result: Result<(), &str> = RetryPolicy::new(5, 5, 5, 0.0)
            .retry_async("root_view", |err: &&str| *err == "throttled", |_| {
                calls.set(calls.get() + 1);
                async { Err("view not found") }
            })
            .await;
        assert_eq!(result, Err("view not found"));
        assert_eq!(calls.get(), 1);
    }
}
