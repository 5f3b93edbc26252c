//! Process-wide sliding-window rate limiter for LLM operations (§4.5).
//!
//! Grounded on the original `RateLimiter` class
//! (`examples/original_source/ai_interview/services.py`): a list of recent
//! request timestamps, pruned to the last 60 seconds, with a blocking wait
//! when the window is saturated. Ported to an async, bounded wait instead of
//! `time.sleep` so it doesn't park a worker thread.

use std::collections::VecDeque;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::warn;

/// Hard ceiling on how long a single call will wait for a rate-limit slot,
/// regardless of configured `max_per_minute` (§4.5: "bounded wait, max 60s").
const MAX_WAIT: Duration = Duration::from_secs(60);
const WINDOW: Duration = Duration::from_secs(60);

pub struct RateLimiter {
    max_per_minute: u32,
    requests: Mutex<VecDeque<Instant>>,
}

impl RateLimiter {
    pub fn new(max_per_minute: u32) -> Self {
        Self {
            max_per_minute: max_per_minute.max(1),
            requests: Mutex::new(VecDeque::new()),
        }
    }

    /// Record a request, waiting first if the sliding window is saturated.
    pub async fn acquire(&self) {
        let wait = {
            let mut requests = self.requests.lock().await;
            prune(&mut requests);
            if requests.len() >= self.max_per_minute as usize {
                let oldest = *requests.front().expect("non-empty: len >= 1");
                let age = oldest.elapsed();
                WINDOW.saturating_sub(age).min(MAX_WAIT)
            } else {
                Duration::ZERO
            }
        };

        if !wait.is_zero() {
            warn!(wait_ms = wait.as_millis() as u64, "AI rate limit window saturated, waiting");
            tokio::time::sleep(wait).await;
        }

        let mut requests = self.requests.lock().await;
        prune(&mut requests);
        requests.push_back(Instant::now());
    }
}

fn prune(requests: &mut VecDeque<Instant>) {
    let cutoff = Instant::now() - WINDOW;
    while requests.front().is_some_and(|t| *t < cutoff) {
        requests.pop_front();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn allows_requests_under_ceiling_without_waiting() {
        let limiter = RateLimiter::new(10);
        let start = Instant::now();
        for _ in 0..10 {
            limiter.acquire().await;
        }
        assert!(start.elapsed() < Duration::from_millis(500));
    }

    #[tokio::test(start_paused = true)]
    async fn saturated_window_waits_for_oldest_to_age_out() {
        let limiter = std::sync::Arc::new(RateLimiter::new(1));
        limiter.acquire().await;

        let limiter2 = limiter.clone();
        let second_call = tokio::spawn(async move {
            limiter2.acquire().await;
        });

        tokio::time::advance(Duration::from_secs(59)).await;
        assert!(!second_call.is_finished());

        tokio::time::advance(Duration::from_secs(2)).await;
        second_call.await.unwrap();
    }
}
