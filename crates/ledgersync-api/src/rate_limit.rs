//! Request pacing for the transactions API
//!
//! [`RequestPacer`] spaces calls at least `1 / max_requests_per_second`
//! apart by sleeping out the remainder of the interval before each call.
//!
//! The pacer keeps a single "time of last call" and assumes one sequential
//! caller. Sharing an instance between concurrent tasks would let them race
//! on that timestamp and exceed the configured rate.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use ledgersync_api::rate_limit::RequestPacer;
//!
//! # async fn example() {
//! let pacer = RequestPacer::new(2.0);
//! pacer.wait().await;
//! // ... make API call ...
//! # }
//! ```

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, warn};

/// Default wait when a 429 response carries no usable `Retry-After`
pub const DEFAULT_RETRY_AFTER: Duration = Duration::from_secs(60);

/// Ceiling for both the pacing interval and a server-requested wait
pub const MAX_WAIT: Duration = Duration::from_secs(3600);

/// Fixed-interval pacer for outgoing requests
#[derive(Debug)]
pub struct RequestPacer {
    /// Minimum spacing between two calls
    min_interval: Duration,
    /// When the previous call was released
    last_call: Mutex<Option<Instant>>,
}

impl RequestPacer {
    /// Creates a pacer allowing at most `max_requests_per_second` calls
    ///
    /// A non-positive or non-finite rate disables pacing. Rates below one
    /// call per [`MAX_WAIT`] are clamped to that interval.
    pub fn new(max_requests_per_second: f64) -> Self {
        let min_interval = if max_requests_per_second.is_finite() && max_requests_per_second > 0.0
        {
            Duration::try_from_secs_f64(1.0 / max_requests_per_second)
                .map_or(MAX_WAIT, |interval| interval.min(MAX_WAIT))
        } else {
            Duration::ZERO
        };
        Self {
            min_interval,
            last_call: Mutex::new(None),
        }
    }

    /// Returns the minimum spacing between calls
    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    fn last_call(&self) -> MutexGuard<'_, Option<Instant>> {
        self.last_call
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Time left before the next call may be made
    pub fn time_until_ready(&self) -> Duration {
        match *self.last_call() {
            Some(last) => self.min_interval.saturating_sub(last.elapsed()),
            None => Duration::ZERO,
        }
    }

    /// Sleeps out the rest of the interval, then records the call
    pub async fn wait(&self) {
        let remaining = self.time_until_ready();
        if !remaining.is_zero() {
            debug!(wait_ms = remaining.as_millis() as u64, "Pacing request");
            tokio::time::sleep(remaining).await;
        }
        *self.last_call() = Some(Instant::now());
    }
}

/// Parses the `Retry-After` header value into a Duration.
///
/// The header can be either:
/// - An integer number of seconds (e.g., "30")
/// - An HTTP-date (e.g., "Fri, 31 Dec 2025 23:59:59 GMT") - parsed as seconds from now
///
/// Either form is capped at [`MAX_WAIT`]. Falls back to the default
/// duration if parsing fails.
pub fn parse_retry_after(value: &str, default: Duration) -> Duration {
    let value = value.trim();
    if let Ok(seconds) = value.parse::<u64>() {
        return Duration::from_secs(seconds).min(MAX_WAIT);
    }

    if let Ok(date) = chrono::DateTime::parse_from_rfc2822(value) {
        let wait = date.with_timezone(&chrono::Utc) - chrono::Utc::now();
        return wait.to_std().map_or(Duration::ZERO, |wait| wait.min(MAX_WAIT));
    }

    warn!(value, "Could not parse Retry-After header, using default");
    default
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_min_interval_from_rate() {
        assert_eq!(RequestPacer::new(2.0).min_interval(), Duration::from_millis(500));
        assert_eq!(RequestPacer::new(0.5).min_interval(), Duration::from_secs(2));
    }

    #[test]
    fn test_non_positive_rate_disables_pacing() {
        assert_eq!(RequestPacer::new(0.0).min_interval(), Duration::ZERO);
        assert_eq!(RequestPacer::new(-1.0).min_interval(), Duration::ZERO);
        assert_eq!(RequestPacer::new(f64::NAN).min_interval(), Duration::ZERO);
    }

    #[test]
    fn test_tiny_rate_is_clamped() {
        assert_eq!(RequestPacer::new(1e-30).min_interval(), MAX_WAIT);
        assert_eq!(RequestPacer::new(f64::MIN_POSITIVE).min_interval(), MAX_WAIT);
        assert_eq!(RequestPacer::new(1.0 / 7200.0).min_interval(), MAX_WAIT);
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_call_is_not_delayed() {
        let pacer = RequestPacer::new(1.0);
        let start = Instant::now();
        pacer.wait().await;
        assert!(start.elapsed() < Duration::from_millis(10));
    }

    #[tokio::test(start_paused = true)]
    async fn test_consecutive_calls_are_spaced() {
        let pacer = RequestPacer::new(2.0);
        let start = Instant::now();
        pacer.wait().await;
        pacer.wait().await;
        pacer.wait().await;
        assert!(start.elapsed() >= Duration::from_millis(1000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_elapsed_time_counts_toward_interval() {
        let pacer = RequestPacer::new(1.0);
        pacer.wait().await;
        tokio::time::sleep(Duration::from_millis(700)).await;

        let remaining = pacer.time_until_ready();
        assert!(remaining <= Duration::from_millis(300));

        let start = Instant::now();
        pacer.wait().await;
        assert!(start.elapsed() <= Duration::from_millis(300));
    }

    #[test]
    fn test_time_until_ready_before_any_call() {
        assert_eq!(RequestPacer::new(5.0).time_until_ready(), Duration::ZERO);
    }

    #[test]
    fn test_parse_retry_after_seconds() {
        let duration = parse_retry_after("30", DEFAULT_RETRY_AFTER);
        assert_eq!(duration, Duration::from_secs(30));
    }

    #[test]
    fn test_parse_retry_after_with_whitespace() {
        let duration = parse_retry_after("  45  ", DEFAULT_RETRY_AFTER);
        assert_eq!(duration, Duration::from_secs(45));
    }

    #[test]
    fn test_parse_retry_after_caps_both_forms() {
        assert_eq!(parse_retry_after("999999999", DEFAULT_RETRY_AFTER), MAX_WAIT);

        let target = chrono::Utc::now() + chrono::Duration::days(2);
        assert_eq!(parse_retry_after(&target.to_rfc2822(), DEFAULT_RETRY_AFTER), MAX_WAIT);
    }

    #[test]
    fn test_parse_retry_after_invalid_falls_back() {
        assert_eq!(parse_retry_after("soon", DEFAULT_RETRY_AFTER), DEFAULT_RETRY_AFTER);
        assert_eq!(parse_retry_after("", DEFAULT_RETRY_AFTER), DEFAULT_RETRY_AFTER);
    }

    #[test]
    fn test_parse_retry_after_past_http_date() {
        let duration = parse_retry_after("Mon, 01 Jan 2001 00:00:00 GMT", DEFAULT_RETRY_AFTER);
        assert_eq!(duration, Duration::ZERO);
    }

    #[test]
    fn test_parse_retry_after_future_http_date() {
        let target = chrono::Utc::now() + chrono::Duration::seconds(120);
        let header = target.to_rfc2822();
        let duration = parse_retry_after(&header, DEFAULT_RETRY_AFTER);
        assert!(duration <= Duration::from_secs(120));
        assert!(duration >= Duration::from_secs(110));
    }
}
