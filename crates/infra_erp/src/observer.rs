//! Submission outcome observers
//!
//! Every `submit_invoice` call reports exactly once to the configured
//! observer, on success and on failure alike.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use crate::error::{ErpError, ErrorKind};

/// Receives the outcome of each submission
pub trait OutcomeObserver: Send + Sync {
    fn on_result(&self, success: bool, elapsed: Duration, error: Option<&ErpError>);
}

impl<F> OutcomeObserver for F
where
    F: Fn(bool, Duration, Option<&ErpError>) + Send + Sync,
{
    fn on_result(&self, success: bool, elapsed: Duration, error: Option<&ErpError>) {
        self(success, elapsed, error)
    }
}

/// Running counters over submission outcomes
#[derive(Debug, Default)]
pub struct SubmissionStats {
    successes: AtomicU64,
    failures: AtomicU64,
    auth_failures: AtomicU64,
    exhausted: AtomicU64,
    total_latency_micros: AtomicU64,
}

impl SubmissionStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn successes(&self) -> u64 {
        self.successes.load(Ordering::Relaxed)
    }

    pub fn failures(&self) -> u64 {
        self.failures.load(Ordering::Relaxed)
    }

    /// Failures caused by credentials or tokens
    pub fn auth_failures(&self) -> u64 {
        self.auth_failures.load(Ordering::Relaxed)
    }

    /// Failures that ran out of retries
    pub fn exhausted(&self) -> u64 {
        self.exhausted.load(Ordering::Relaxed)
    }

    pub fn total(&self) -> u64 {
        self.successes() + self.failures()
    }

    /// Mean submission latency, if anything was submitted
    pub fn average_latency(&self) -> Option<Duration> {
        let total = self.total();
        if total == 0 {
            return None;
        }
        let micros = self.total_latency_micros.load(Ordering::Relaxed) / total;
        Some(Duration::from_micros(micros))
    }
}

impl OutcomeObserver for SubmissionStats {
    fn on_result(&self, success: bool, elapsed: Duration, error: Option<&ErpError>) {
        let micros = u64::try_from(elapsed.as_micros()).unwrap_or(u64::MAX);
        self.total_latency_micros.fetch_add(micros, Ordering::Relaxed);

        if success {
            self.successes.fetch_add(1, Ordering::Relaxed);
            return;
        }

        self.failures.fetch_add(1, Ordering::Relaxed);
        match error.map(ErpError::kind) {
            Some(ErrorKind::Auth) => {
                self.auth_failures.fetch_add(1, Ordering::Relaxed);
            }
            Some(ErrorKind::RetryExhausted) => {
                self.exhausted.fetch_add(1, Ordering::Relaxed);
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Arc;

    #[test]
    fn test_closure_observer() {
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = calls.clone();
        let observer = move |success: bool, _: Duration, error: Option<&ErpError>| {
            assert_eq!(success, error.is_none());
            seen.fetch_add(1, Ordering::SeqCst);
        };

        observer.on_result(true, Duration::from_millis(5), None);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_stats_counters() {
        let stats = SubmissionStats::new();
        assert!(stats.average_latency().is_none());

        stats.on_result(true, Duration::from_millis(10), None);
        stats.on_result(false, Duration::from_millis(30), Some(&ErpError::Auth("x".into())));
        stats.on_result(
            false,
            Duration::from_millis(20),
            Some(&ErpError::RetryExhausted {
                attempts: 4,
                cause: Box::new(ErpError::http(502, "")),
            }),
        );

        assert_eq!(stats.successes(), 1);
        assert_eq!(stats.failures(), 2);
        assert_eq!(stats.auth_failures(), 1);
        assert_eq!(stats.exhausted(), 1);
        assert_eq!(stats.average_latency(), Some(Duration::from_millis(20)));
    }
}
