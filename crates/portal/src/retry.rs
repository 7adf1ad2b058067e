//! Bounded retry with exponential backoff.
//!
//! [`RetryPolicy`] runs an async operation, retrying failures that a
//! classifier marks as transient. Every other failure is returned on the
//! first attempt. After `max_attempts` the last observed error is returned.
//!
//! ```rust,ignore
//! let policy = RetryPolicy::default().with_jitter(true);
//! let rows = policy.run(|| repo.list_between(from, to)).await?;
//! ```
//!
//! Retry loops are not cancellable from the outside: once started, a loop
//! runs until success, a terminal error, or exhaustion.

use std::fmt::Display;
use std::future::Future;
use std::sync::LazyLock;
use std::time::Duration;

use rand::Rng;

/// Upper bound for jittered delays.
pub const MAX_JITTERED_DELAY: Duration = Duration::from_millis(30_000);

/// Fraction of the exponential delay added as random jitter.
const JITTER_FRACTION: f64 = 0.1;

/// SQLSTATE codes that indicate a transient database condition.
pub const RETRYABLE_SQLSTATES: &[&str] = &[
    "40001", // serialization_failure
    "40P01", // deadlock_detected
    "08000", // connection_exception
    "08001", // sqlclient_unable_to_establish_sqlconnection
    "08003", // connection_does_not_exist
    "08006", // connection_failure
    "57P01", // admin_shutdown
    "57014", // query_canceled (statement timeout)
];

/// Message fragments that indicate a transient network or service condition.
pub const RETRYABLE_MESSAGE_PATTERNS: &[&str] = &[
    "timeout",
    "timed out",
    "rate limit",
    "too many requests",
    "network error",
    "connection reset",
    "connection refused",
    "connection closed",
    "service unavailable",
    "temporarily unavailable",
    "bad gateway",
    "gateway timeout",
];

static DEFAULT_CLASSIFIER: LazyLock<ErrorClassifier> = LazyLock::new(ErrorClassifier::default);

/// Errors that know whether they are worth retrying.
pub trait Retryable {
    /// Whether the failure is transient.
    fn is_retryable(&self) -> bool;
}

/// Decides whether an error code / message pair is transient.
///
/// The default vocabulary covers `PostgreSQL` SQLSTATE codes and the messages
/// produced by HTTP clients and gateways. Build a custom classifier to target
/// a different backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorClassifier {
    codes: Vec<String>,
    patterns: Vec<String>,
}

impl Default for ErrorClassifier {
    fn default() -> Self {
        Self::new(
            RETRYABLE_SQLSTATES.iter().copied(),
            RETRYABLE_MESSAGE_PATTERNS.iter().copied(),
        )
    }
}

impl ErrorClassifier {
    /// Build a classifier from retryable codes and message fragments.
    ///
    /// Message fragments are matched case-insensitively.
    pub fn new<C, P>(codes: C, patterns: P) -> Self
    where
        C: IntoIterator,
        C::Item: Into<String>,
        P: IntoIterator,
        P::Item: AsRef<str>,
    {
        Self {
            codes: codes.into_iter().map(Into::into).collect(),
            patterns: patterns
                .into_iter()
                .map(|p| p.as_ref().to_lowercase())
                .collect(),
        }
    }

    /// The shared default classifier.
    #[must_use]
    pub fn shared() -> &'static Self {
        &DEFAULT_CLASSIFIER
    }

    /// Add a retryable code.
    #[must_use]
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.codes.push(code.into());
        self
    }

    /// Add a retryable message fragment.
    #[must_use]
    pub fn with_pattern(mut self, pattern: impl AsRef<str>) -> Self {
        self.patterns.push(pattern.as_ref().to_lowercase());
        self
    }

    /// Whether an error with this code and message is transient.
    #[must_use]
    pub fn is_retryable(&self, code: Option<&str>, message: &str) -> bool {
        if let Some(code) = code
            && self.codes.iter().any(|c| c == code)
        {
            return true;
        }
        let message = message.to_lowercase();
        self.patterns.iter().any(|p| message.contains(p.as_str()))
    }
}

/// A retry about to happen, passed to the `on_retry` observer.
#[derive(Debug)]
pub struct RetryAttempt<'a, E> {
    /// The attempt that just failed (1-based).
    pub attempt: u32,
    /// How long the policy will wait before the next attempt.
    pub delay: Duration,
    /// The error the attempt failed with.
    pub error: &'a E,
}

/// Retry configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    max_attempts: u32,
    delay: Duration,
    backoff_multiplier: f64,
    jitter: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay: Duration::from_millis(1000),
            backoff_multiplier: 2.0,
            jitter: false,
        }
    }
}

impl RetryPolicy {
    /// A policy that never retries.
    #[must_use]
    pub fn no_retry() -> Self {
        Self::default().with_max_attempts(1)
    }

    /// Total attempts, including the first. Zero is treated as one.
    #[must_use]
    pub const fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Delay before the first retry.
    #[must_use]
    pub const fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Factor applied to the delay after each retry.
    #[must_use]
    pub const fn with_backoff_multiplier(mut self, multiplier: f64) -> Self {
        self.backoff_multiplier = multiplier;
        self
    }

    /// Use doubling with random jitter capped at [`MAX_JITTERED_DELAY`]
    /// instead of the plain multiplier.
    #[must_use]
    pub const fn with_jitter(mut self, jitter: bool) -> Self {
        self.jitter = jitter;
        self
    }

    /// Effective attempt budget.
    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }

    /// Wait before retrying after failed attempt `attempt` (1-based).
    #[must_use]
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        if self.jitter {
            return exponential_backoff_with_jitter(attempt, self.delay);
        }
        let factor = self.backoff_multiplier.max(0.0).powi(exponent(attempt));
        let millis = duration_millis(self.delay) * factor;
        Duration::try_from_secs_f64(millis / 1000.0).unwrap_or(Duration::MAX)
    }

    /// Run `operation`, retrying errors that report themselves retryable.
    ///
    /// Each retry is logged at `warn` level.
    ///
    /// # Errors
    ///
    /// Returns the last error once it is terminal or attempts are exhausted.
    pub async fn run<T, E, F, Fut>(&self, operation: F) -> Result<T, E>
    where
        E: Retryable + Display,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        self.run_with(operation, |error: &E| error.is_retryable(), |retry| {
            tracing::warn!(
                attempt = retry.attempt,
                delay_ms = u64::try_from(retry.delay.as_millis()).unwrap_or(u64::MAX),
                error = %retry.error,
                "Transient failure, retrying"
            );
        })
        .await
    }

    /// Run `operation` with an explicit classifier and retry observer.
    ///
    /// `on_retry` is called before each wait and cannot influence control
    /// flow.
    ///
    /// # Errors
    ///
    /// Returns the last error once `should_retry` rejects it or attempts are
    /// exhausted.
    pub async fn run_with<T, E, F, Fut, S, R>(
        &self,
        mut operation: F,
        should_retry: S,
        mut on_retry: R,
    ) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        S: Fn(&E) -> bool,
        R: FnMut(RetryAttempt<'_, E>),
    {
        let max_attempts = self.max_attempts();
        let mut attempt = 1;

        loop {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(error) => {
                    if attempt >= max_attempts || !should_retry(&error) {
                        return Err(error);
                    }
                    let delay = self.delay_for_attempt(attempt);
                    on_retry(RetryAttempt {
                        attempt,
                        delay,
                        error: &error,
                    });
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}

/// Doubling backoff with up to 10% random jitter, capped at
/// [`MAX_JITTERED_DELAY`].
///
/// For attempt `n` (1-based) the result lies in
/// `[base * 2^(n-1), base * 2^(n-1) * 1.1]`, then capped.
#[must_use]
pub fn exponential_backoff_with_jitter(attempt: u32, base: Duration) -> Duration {
    let cap = duration_millis(MAX_JITTERED_DELAY);
    let exponential = duration_millis(base) * 2f64.powi(exponent(attempt));
    if !exponential.is_finite() || exponential >= cap {
        return MAX_JITTERED_DELAY;
    }

    let jitter = if exponential > 0.0 {
        rand::rng().random_range(0.0..=exponential * JITTER_FRACTION)
    } else {
        0.0
    };
    let millis = (exponential + jitter).min(cap);
    Duration::from_secs_f64(millis / 1000.0)
}

fn exponent(attempt: u32) -> i32 {
    i32::try_from(attempt.saturating_sub(1)).unwrap_or(i32::MAX)
}

fn duration_millis(duration: Duration) -> f64 {
    duration.as_secs_f64() * 1000.0
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;

    #[derive(Debug, PartialEq, Eq)]
    enum FakeError {
        Transient(u32),
        Fatal,
    }

    impl Display for FakeError {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "{self:?}")
        }
    }

    impl Retryable for FakeError {
        fn is_retryable(&self) -> bool {
            matches!(self, Self::Transient(_))
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_fatal_error_runs_once() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let result: Result<(), _> = RetryPolicy::default()
            .run(move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(FakeError::Fatal)
            })
            .await;

        assert_eq!(result, Err(FakeError::Fatal));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_succeeds_on_last_attempt() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let result = RetryPolicy::default()
            .run(move || async move {
                let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                if n < 3 { Err(FakeError::Transient(n)) } else { Ok("booked") }
            })
            .await;

        assert_eq!(result, Ok("booked"));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhaustion_returns_last_error() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let result: Result<(), _> = RetryPolicy::default()
            .with_max_attempts(4)
            .run(move || async move {
                let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                Err(FakeError::Transient(n))
            })
            .await;

        assert_eq!(result, Err(FakeError::Transient(4)));
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_attempts_means_one() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let result: Result<(), _> = RetryPolicy::default()
            .with_max_attempts(0)
            .run(move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(FakeError::Transient(1))
            })
            .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_on_retry_sees_each_wait() {
        let mut seen = Vec::new();
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let started = tokio::time::Instant::now();

        let _: Result<(), _> = RetryPolicy::default()
            .run_with(
                move || async move {
                    let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                    Err(FakeError::Transient(n))
                },
                |_| true,
                |retry| seen.push((retry.attempt, retry.delay)),
            )
            .await;

        assert_eq!(
            seen,
            vec![
                (1, Duration::from_millis(1000)),
                (2, Duration::from_millis(2000)),
            ]
        );
        assert!(started.elapsed() >= Duration::from_millis(3000));
    }

    #[test]
    fn test_custom_multiplier() {
        let policy = RetryPolicy::default()
            .with_delay(Duration::from_millis(100))
            .with_backoff_multiplier(3.0);
        assert_eq!(policy.delay_for_attempt(1), Duration::from_millis(100));
        assert_eq!(policy.delay_for_attempt(3), Duration::from_millis(900));
    }

    #[test]
    fn test_jittered_delay_bounds() {
        let base = Duration::from_millis(1000);
        for attempt in 1..=12 {
            let exact = 1000.0 * 2f64.powi(i32::try_from(attempt - 1).unwrap());
            let low = exact.min(30_000.0);
            let high = (exact * 1.1).min(30_000.0);
            for _ in 0..50 {
                let ms = duration_millis(exponential_backoff_with_jitter(attempt, base));
                assert!(ms >= low - 1e-6, "attempt {attempt}: {ms} < {low}");
                assert!(ms <= high + 1e-6, "attempt {attempt}: {ms} > {high}");
                assert!(ms <= 30_000.0 + 1e-6);
            }
        }
    }

    #[test]
    fn test_jitter_survives_huge_attempt_numbers() {
        assert_eq!(
            exponential_backoff_with_jitter(u32::MAX, Duration::from_secs(1)),
            MAX_JITTERED_DELAY
        );
    }

    #[test]
    fn test_default_classifier_codes() {
        let classifier = ErrorClassifier::shared();
        assert!(classifier.is_retryable(Some("40001"), "could not serialize access"));
        assert!(classifier.is_retryable(Some("40P01"), "deadlock detected"));
        assert!(classifier.is_retryable(Some("08006"), "connection failure"));
        assert!(!classifier.is_retryable(Some("23505"), "duplicate key value"));
    }

    #[test]
    fn test_default_classifier_messages() {
        let classifier = ErrorClassifier::shared();
        assert!(classifier.is_retryable(None, "Request Timeout"));
        assert!(classifier.is_retryable(None, "HTTP 503: Service Unavailable"));
        assert!(classifier.is_retryable(None, "rate limit exceeded"));
        assert!(!classifier.is_retryable(None, "invalid input syntax for type uuid"));
    }

    #[test]
    fn test_custom_classifier() {
        let classifier = ErrorClassifier::new(["PGRST301"], ["jwt expired"]).with_pattern("BUSY");
        assert!(classifier.is_retryable(Some("PGRST301"), ""));
        assert!(classifier.is_retryable(None, "server busy"));
        assert!(!classifier.is_retryable(Some("40001"), "serialization failure"));
    }
}
