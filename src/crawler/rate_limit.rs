//! Process-wide request rate limiting
//!
//! All outbound requests share one watermark: the time the last request was
//! granted. [`RateLimiter::acquire`] waits until the configured interval has
//! passed since that watermark, then moves it forward.

use std::time::{Duration, Instant};
use tokio::sync::Mutex;

/// Longest single sleep while waiting out the interval
const POLL_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug)]
struct Watermark {
    interval: Duration,
    last_request: Option<Instant>,
}

/// Enforces a minimum interval between consecutive requests
///
/// The watermark sits behind an async mutex, so concurrent callers queue up
/// and are granted one at a time.
#[derive(Debug)]
pub struct RateLimiter {
    state: Mutex<Watermark>,
}

impl RateLimiter {
    /// Creates a limiter; the first acquisition is granted immediately
    pub fn new(interval: Duration) -> Self {
        Self {
            state: Mutex::new(Watermark {
                interval,
                last_request: None,
            }),
        }
    }

    /// Blocks until a request is permitted, then records the grant time
    ///
    /// Waiting happens in sleeps of at most one second, re-checking the
    /// elapsed time after each.
    ///
    /// # Returns
    ///
    /// The instant at which the request was granted
    pub async fn acquire(&self) -> Instant {
        let mut state = self.state.lock().await;

        if let Some(last) = state.last_request {
            loop {
                let elapsed = last.elapsed();
                if elapsed >= state.interval {
                    break;
                }
                let remaining = state.interval - elapsed;
                tracing::trace!("Rate limit: waiting {:?}", remaining);
                tokio::time::sleep(remaining.min(POLL_INTERVAL)).await;
            }
        }

        let now = Instant::now();
        state.last_request = Some(now);
        now
    }

    /// Current minimum interval
    pub async fn interval(&self) -> Duration {
        self.state.lock().await.interval
    }

    /// Raises the interval to `interval` if it is longer than the current one
    pub async fn raise_interval(&self, interval: Duration) {
        let mut state = self.state.lock().await;
        if interval > state.interval {
            tracing::info!(
                "Raising request interval from {:?} to {:?}",
                state.interval,
                interval
            );
            state.interval = interval;
        }
    }

    /// Time of the most recent grant, if any
    pub async fn last_request(&self) -> Option<Instant> {
        self.state.lock().await.last_request
    }
}
