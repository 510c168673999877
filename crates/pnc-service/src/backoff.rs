//! Retry pacing for the file-polling loops.
//!
//! Each consecutive failure doubles the wait, up to a cap, plus up to 20%
//! jitter. A success clears it.

use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

const JITTER_PERCENT: u64 = 20;

#[derive(Debug, Clone)]
pub struct Backoff {
    floor: Duration,
    cap: Duration,
    wait: Duration,
    retry_at: Instant,
    failures: u32,
}

impl Backoff {
    /// `floor` is the first wait before doubling; `cap` bounds every wait.
    pub fn new(floor: Duration, cap: Duration) -> Self {
        let floor = floor.max(Duration::from_millis(1));
        Self {
            floor,
            cap: cap.max(floor),
            wait: floor,
            retry_at: Instant::now(),
            failures: 0,
        }
    }

    pub fn ready(&self) -> bool {
        self.retry_in().is_zero()
    }

    /// Time left before the next attempt is allowed.
    pub fn retry_in(&self) -> Duration {
        self.retry_at.saturating_duration_since(Instant::now())
    }

    /// Consecutive failures since the last success.
    pub fn failures(&self) -> u32 {
        self.failures
    }

    /// Records a success. Returns how many failures it ended.
    pub fn reset(&mut self) -> u32 {
        self.wait = self.floor;
        self.retry_at = Instant::now();
        std::mem::take(&mut self.failures)
    }

    /// Records a failure and returns the wait before the next attempt.
    pub fn fail(&mut self) -> Duration {
        self.failures = self.failures.saturating_add(1);
        self.wait = self.wait.saturating_mul(2).min(self.cap);
        let delay = self.wait + jitter(self.wait);
        self.retry_at = Instant::now() + delay;
        delay
    }
}

fn jitter(wait: Duration) -> Duration {
    let spread_ms = wait.as_millis() as u64 * JITTER_PERCENT / 100;
    if spread_ms == 0 {
        return Duration::ZERO;
    }
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| u64::from(elapsed.subsec_nanos()))
        .unwrap_or(0);
    Duration::from_millis(nanos % (spread_ms + 1))
}
