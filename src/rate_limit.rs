use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use parking_lot::Mutex;

/// How often idle buckets are swept out, piggybacked on `admit` calls.
const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// One client's recent hits for a single operation.
struct Bucket {
    hits: Vec<Instant>,
    /// The window this bucket was last checked against, kept so the
    /// background sweep can prune it without knowing the operation.
    window: Duration,
}

struct LimiterState {
    buckets: HashMap<String, Bucket>,
    last_sweep: Instant,
}

struct LimiterInner {
    state: Mutex<LimiterState>,
    allowed: AtomicU64,
    rejected: AtomicU64,
}

/// Counters accumulated since the limiter was created.
#[derive(Debug, Clone, Copy, Default)]
pub struct LimiterSnapshot {
    pub allowed: u64,
    pub rejected: u64,
}

/// In-process sliding-window rate limiter keyed by `(operation, client)`.
///
/// Each key tracks the timestamps of its admitted requests; a request is
/// admitted only while fewer than `limit` timestamps fall inside the trailing
/// `window`. Rejected requests are not recorded, so hammering an exhausted
/// key never pushes the window further out. Clones share the same state.
#[derive(Clone)]
pub struct RateLimiter {
    inner: Arc<LimiterInner>,
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new()
    }
}

impl RateLimiter {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(LimiterInner {
                state: Mutex::new(LimiterState {
                    buckets: HashMap::new(),
                    last_sweep: Instant::now(),
                }),
                allowed: AtomicU64::new(0),
                rejected: AtomicU64::new(0),
            }),
        }
    }

    /// Decides whether one more request may proceed, and records it if so.
    ///
    /// # Arguments
    ///
    /// * `operation` - Logical name of the guarded operation (e.g. `login`).
    /// * `client` - Resolved client address.
    /// * `limit` - Maximum admitted requests per window.
    /// * `window` - Trailing window length.
    ///
    /// # Returns
    ///
    /// `true` if the request is admitted, `false` if it must be rejected.
    pub fn admit(&self, operation: &str, client: &str, limit: usize, window: Duration) -> bool {
        let now = Instant::now();
        let key = format!("{}:{}", operation, client);

        let mut state = self.inner.state.lock();
        if now.duration_since(state.last_sweep) >= SWEEP_INTERVAL {
            Self::sweep(&mut state, now);
        }

        let bucket = state.buckets.entry(key).or_insert_with(|| Bucket {
            hits: Vec::new(),
            window,
        });
        bucket.window = window;
        // A hit exactly `window` old has left the window.
        bucket.hits.retain(|hit| now.duration_since(*hit) < window);

        if bucket.hits.len() >= limit {
            self.inner.rejected.fetch_add(1, Ordering::Relaxed);
            return false;
        }

        bucket.hits.push(now);
        self.inner.allowed.fetch_add(1, Ordering::Relaxed);
        true
    }

    /// Drops buckets whose every hit has aged out of its window.
    fn sweep(state: &mut LimiterState, now: Instant) {
        state.buckets.retain(|_, bucket| {
            bucket
                .hits
                .iter()
                .any(|hit| now.duration_since(*hit) < bucket.window)
        });
        state.last_sweep = now;
    }

    /// Number of live buckets, i.e. distinct `(operation, client)` keys.
    pub fn bucket_count(&self) -> usize {
        self.inner.state.lock().buckets.len()
    }

    /// Returns the admitted/rejected counters.
    pub fn snapshot(&self) -> LimiterSnapshot {
        LimiterSnapshot {
            allowed: self.inner.allowed.load(Ordering::Relaxed),
            rejected: self.inner.rejected.load(Ordering::Relaxed),
        }
    }
}
