//! Sliding-window failed-authentication tracker.
//!
//! Each address owns a chronological history of attempts. Blocked-ness is
//! never stored: it is recomputed from the history on every check, so an
//! address unblocks by itself once its failures age out of the window.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::config::RateLimitConfig;
use crate::observability::metrics;

/// One observed authentication attempt.
#[derive(Debug, Clone, Copy)]
pub struct AttemptRecord {
    pub at: Instant,
    pub succeeded: bool,
}

/// Address-keyed ledger of recent attempts.
///
/// Operations on one address run under that address's shard lock, so
/// concurrent appends are never lost and timestamps stay ordered.
#[derive(Debug)]
pub struct RateLimiter {
    ledger: DashMap<String, VecDeque<AttemptRecord>>,
    max_failed_attempts: usize,
    window: Duration,
}

impl RateLimiter {
    pub fn new(max_failed_attempts: usize, window: Duration) -> Self {
        Self {
            ledger: DashMap::new(),
            max_failed_attempts,
            window,
        }
    }

    pub fn from_config(config: &RateLimitConfig) -> Self {
        Self::new(config.max_failed_attempts, Duration::from_secs(config.window_secs))
    }

    pub fn max_failed_attempts(&self) -> usize {
        self.max_failed_attempts
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    // Records older than the window are dropped from the front.
    fn purge(history: &mut VecDeque<AttemptRecord>, now: Instant, window: Duration) {
        while let Some(oldest) = history.front() {
            if now.duration_since(oldest.at) > window {
                history.pop_front();
            } else {
                break;
            }
        }
    }

    fn failures(history: &VecDeque<AttemptRecord>) -> usize {
        history.iter().filter(|r| !r.succeeded).count()
    }

    /// Whether `address` has reached the failure threshold within the window.
    pub fn is_blocked(&self, address: &str) -> bool {
        self.failure_count(address) >= self.max_failed_attempts
    }

    /// Failures for `address` still inside the window. Purges as a side effect.
    pub fn failure_count(&self, address: &str) -> usize {
        let now = Instant::now();
        let Some(mut history) = self.ledger.get_mut(address) else {
            return 0;
        };
        Self::purge(&mut history, now, self.window);
        let failures = Self::failures(&history);
        let empty = history.is_empty();
        drop(history);

        if empty && self.ledger.remove_if(address, |_, history| history.is_empty()).is_some() {
            metrics::record_ledger_size(self.ledger.len());
        }
        failures
    }

    /// All attempts (successes included) for `address` still inside the window.
    pub fn recorded_attempts(&self, address: &str) -> usize {
        let now = Instant::now();
        match self.ledger.get_mut(address) {
            Some(mut history) => {
                Self::purge(&mut history, now, self.window);
                history.len()
            }
            None => 0,
        }
    }

    /// Append an attempt for `address` stamped with the current time.
    pub fn record_attempt(&self, address: &str, succeeded: bool) {
        let mut history = self.ledger.entry(address.to_string()).or_default();
        let now = Instant::now();
        history.push_back(AttemptRecord { at: now, succeeded });
        Self::purge(&mut history, now, self.window);
        drop(history);

        metrics::record_attempt(succeeded);
        metrics::record_ledger_size(self.ledger.len());
        tracing::debug!(client = %address, succeeded, "Authentication attempt recorded");
    }

    /// Drop every expired record and every address left without history.
    ///
    /// Returns the number of addresses removed.
    pub fn sweep(&self) -> usize {
        let now = Instant::now();
        let before = self.ledger.len();
        self.ledger.retain(|_, history| {
            Self::purge(history, now, self.window);
            !history.is_empty()
        });
        let after = self.ledger.len();
        metrics::record_ledger_size(after);
        before.saturating_sub(after)
    }

    /// Number of addresses currently holding history.
    pub fn tracked_addresses(&self) -> usize {
        self.ledger.len()
    }

    /// Clear all state.
    pub fn reset(&self) {
        self.ledger.clear();
    }

    /// Run [`RateLimiter::sweep`] every `interval` until shutdown fires.
    pub fn spawn_sweeper(
        self: &Arc<Self>,
        interval: Duration,
        mut shutdown: broadcast::Receiver<()>,
    ) -> JoinHandle<()> {
        let limiter = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.tick().await;
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let removed = limiter.sweep();
                        if removed > 0 {
                            tracing::debug!(removed, remaining = limiter.tracked_addresses(), "Swept rate limit ledger");
                        }
                    }
                    _ = shutdown.recv() => break,
                }
            }
        })
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::from_config(&RateLimitConfig::default())
    }
}
