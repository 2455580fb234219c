//! Process-local coordinator: fixed-window rate counters and in-memory
//! generation locks, both keyed by topic.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio::time::{Duration, Instant};

use super::{CoordinationError, Coordinator, LockOutcome};

/// One fixed rate window for a key.
#[derive(Debug)]
struct RateWindow {
    count: u32,
    window_start: Instant,
}

/// Process-local coordinator.
///
/// State is held in process memory and vanishes on restart; the rate
/// window is a plain call counter reset whenever the window elapses.
pub struct LocalCoordinator {
    max_calls_per_window: u32,
    window: Duration,
    lock_timeout: Duration,
    windows: Mutex<HashMap<String, RateWindow>>,
    locks: Mutex<HashMap<String, Instant>>,
}

impl LocalCoordinator {
    /// Create a coordinator allowing `max_calls_per_window` calls per key
    /// per 60-second window, with generation locks expiring after
    /// `lock_timeout`.
    pub fn new(max_calls_per_window: u32, lock_timeout: Duration) -> Self {
        Self::with_window(max_calls_per_window, Duration::from_secs(60), lock_timeout)
    }

    /// Create a coordinator with a custom rate window (useful for testing).
    pub fn with_window(
        max_calls_per_window: u32,
        window: Duration,
        lock_timeout: Duration,
    ) -> Self {
        Self {
            max_calls_per_window,
            window,
            lock_timeout,
            windows: Mutex::new(HashMap::new()),
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Whether a generation lock is currently held (and fresh) for the key.
    pub async fn is_generating(&self, key: &str) -> bool {
        let locks = self.locks.lock().await;
        locks
            .get(key)
            .is_some_and(|started| started.elapsed() < self.lock_timeout)
    }
}

#[async_trait]
impl Coordinator for LocalCoordinator {
    async fn check_rate(&self, key: &str) -> Result<(), CoordinationError> {
        let mut windows = self.windows.lock().await;
        let now = Instant::now();

        let window = windows.entry(key.to_string()).or_insert(RateWindow {
            count: 0,
            window_start: now,
        });

        if now.duration_since(window.window_start) >= self.window {
            window.count = 0;
            window.window_start = now;
        }

        if window.count >= self.max_calls_per_window {
            let elapsed = now.duration_since(window.window_start);
            let retry_after = self.window.saturating_sub(elapsed);
            return Err(CoordinationError::RateLimited {
                retry_after_secs: retry_after.as_secs().max(1),
            });
        }

        window.count += 1;
        Ok(())
    }

    async fn begin_generation(&self, key: &str) -> LockOutcome {
        let mut locks = self.locks.lock().await;
        let now = Instant::now();

        if let Some(started) = locks.get(key) {
            if now.duration_since(*started) < self.lock_timeout {
                return LockOutcome::Busy;
            }
            // Held past the timeout: the holder is presumed dead, take over.
        }

        locks.insert(key.to_string(), now);
        LockOutcome::Acquired
    }

    async fn end_generation(&self, key: &str) {
        let mut locks = self.locks.lock().await;
        locks.remove(key);
    }
}
