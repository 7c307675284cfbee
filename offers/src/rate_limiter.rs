//! Per-(app-id, app-version) launch backoff, tracked independently of the
//! Manager and consulted by whatever upstream logic builds the matcher set.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tracing::{debug, instrument};

use common::clock::Clock;

/// The per-application backoff configuration `addDelay` grows against.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct AppKey {
    id: String,
    version: String,
}

/// An application identity plus the backoff policy the limiter applies to
/// it. `backoff_factor` is assumed `>= 1.0`; values below that monotonically
/// shrink the delay toward zero and eventually reset it (see `add_delay`).
#[derive(Debug, Clone)]
pub struct RateLimitedApp {
    pub id: String,
    pub version: String,
    pub backoff: Duration,
    pub backoff_factor: f64,
    pub max_launch_delay: Duration,
}

impl RateLimitedApp {
    fn key(&self) -> AppKey {
        AppKey {
            id: self.id.clone(),
            version: self.version.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Delay {
    deadline: Instant,
    duration: Duration,
}

/// Tracks launch delays per `(app id, app version)`. Every method is
/// synchronous and intended to be called from a single-writer context (the
/// Manager's mailbox, or behind an external lock).
pub struct LaunchRateLimiter {
    entries: Mutex<HashMap<AppKey, Delay>>,
    clock: Arc<dyn Clock>,
}

impl LaunchRateLimiter {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            clock,
        }
    }

    /// The stored deadline for `app`, or now if no delay is active.
    pub fn get_delay(&self, app: &RateLimitedApp) -> Instant {
        let entries = self.entries.lock();
        entries
            .get(&app.key())
            .map(|d| d.deadline)
            .unwrap_or_else(|| self.clock.now())
    }

    /// Extends the delay for `app`: creates a `backoff`-long delay if none
    /// exists, otherwise grows the current duration by `backoff_factor` up
    /// to `max_launch_delay`. Returns the new effective deadline, which is
    /// `now` itself if the recomputed duration collapsed to (or below) zero.
    #[instrument(skip(self), fields(app_id = %app.id, app_version = %app.version))]
    pub fn add_delay(&self, app: &RateLimitedApp) -> Instant {
        let now = self.clock.now();
        let mut entries = self.entries.lock();
        let key = app.key();

        let new_duration = match entries.get(&key) {
            None => app.backoff,
            Some(existing) => grow_duration(existing.duration, app.backoff_factor, app.max_launch_delay),
        };

        let deadline = now + new_duration;

        if deadline > now {
            debug!(duration_ms = new_duration.as_millis() as u64, "delay extended");
            entries.insert(key, Delay { deadline, duration: new_duration });
        } else {
            debug!("recomputed delay collapsed to zero; resetting");
            entries.remove(&key);
        }

        deadline
    }

    /// Removes any delay for `app`. After this call, `get_delay` returns now.
    #[instrument(skip(self), fields(app_id = %app.id, app_version = %app.version))]
    pub fn reset_delay(&self, app: &RateLimitedApp) {
        self.entries.lock().remove(&app.key());
    }
}

/// `current * factor`, computed at nanosecond precision and clamped to `max`.
fn grow_duration(current: Duration, factor: f64, max: Duration) -> Duration {
    let grown_nanos = current.as_nanos() as f64 * factor;
    if !grown_nanos.is_finite() || grown_nanos >= max.as_nanos() as f64 {
        return max;
    }
    if grown_nanos <= 0.0 {
        return Duration::ZERO;
    }
    Duration::from_nanos(grown_nanos as u64).min(max)
}
