//! Retry policy behaviour observed from outside the crate.

use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use salon_portal::retry::{ErrorClassifier, RetryPolicy, exponential_backoff_with_jitter};

#[derive(Debug, PartialEq, Eq)]
struct Failure(&'static str);

fn is_transient(error: &Failure) -> bool {
    ErrorClassifier::default().is_retryable(None, error.0)
}

#[tokio::test(start_paused = true)]
async fn test_terminal_error_runs_once() {
    let calls = AtomicU32::new(0);
    let result: Result<(), Failure> = RetryPolicy::default()
        .run_with(
            || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(Failure("duplicate key value violates unique constraint")) }
            },
            is_transient,
            |_| {},
        )
        .await;

    assert_eq!(result, Err(Failure("duplicate key value violates unique constraint")));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn test_succeeds_on_last_attempt() {
    let policy = RetryPolicy::default().with_max_attempts(4);
    let calls = AtomicU32::new(0);
    let mut observed = Vec::new();

    let result = policy
        .run_with(
            || {
                let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                async move { if n < 4 { Err(Failure("connection reset by peer")) } else { Ok(n) } }
            },
            is_transient,
            |retry| observed.push((retry.attempt, retry.delay)),
        )
        .await;

    assert_eq!(result, Ok(4));
    assert_eq!(calls.load(Ordering::SeqCst), 4);
    assert_eq!(
        observed,
        vec![
            (1, Duration::from_millis(1000)),
            (2, Duration::from_millis(2000)),
            (3, Duration::from_millis(4000)),
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn test_exhaustion_returns_last_error() {
    let calls = AtomicU32::new(0);
    let result: Result<(), Failure> = RetryPolicy::default()
        .run_with(
            || {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    Err(if n == 0 {
                        Failure("timeout")
                    } else {
                        Failure("rate limit exceeded")
                    })
                }
            },
            is_transient,
            |_| {},
        )
        .await;

    assert_eq!(result, Err(Failure("rate limit exceeded")));
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[test]
fn test_jitter_bounds() {
    let base = Duration::from_millis(1000);
    for attempt in 1..=5 {
        let floor = base * 2u32.pow(attempt - 1);
        let ceiling = (floor.mul_f64(1.1) + Duration::from_millis(1)).min(Duration::from_secs(30));
        for _ in 0..50 {
            let delay = exponential_backoff_with_jitter(attempt, base);
            assert!(delay >= floor.min(Duration::from_secs(30)), "attempt {attempt}: {delay:?}");
            assert!(delay <= ceiling, "attempt {attempt}: {delay:?}");
        }
    }
    assert_eq!(exponential_backoff_with_jitter(20, base), Duration::from_secs(30));
}

#[test]
fn test_custom_vocabulary() {
    let classifier = ErrorClassifier::new(["XX001"], ["try again later"]);
    assert!(classifier.is_retryable(Some("XX001"), "boom"));
    assert!(classifier.is_retryable(None, "Please TRY AGAIN LATER"));
    assert!(!classifier.is_retryable(Some("40001"), "serialization failure"));
}
