use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use tracing::{error, info};

/// Bounded exponential backoff: `base_delay`, then doubled for each further retry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts made after the first failure.
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(400),
        }
    }
}

impl RetryPolicy {
    /// Delay before retry number `retry` (0-based): 400ms, 800ms, 1600ms, ...
    #[must_use]
    pub fn delay_for(&self, retry: u32) -> Duration {
        self.base_delay
            .saturating_mul(2_u32.saturating_pow(retry))
    }
}

/// Production sleep used between attempts.
pub async fn tokio_sleep(delay: Duration) {
    tokio::time::sleep(delay).await;
}

/// Run `op` until it succeeds or `policy.max_retries` retries are used up.
///
/// Every error is retried; the last one is returned once the budget is spent.
/// `sleep` is injected so callers (and tests) control how waiting happens.
///
/// # Errors
///
/// Returns the error of the final attempt.
pub async fn with_retry<T, E, Op, Fut, Sleep, SleepFut>(
    policy: RetryPolicy,
    context: &str,
    mut op: Op,
    mut sleep: Sleep,
) -> Result<T, E>
where
    Op: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    Sleep: FnMut(Duration) -> SleepFut,
    SleepFut: Future<Output = ()>,
    E: Display,
{
    let mut retries = 0;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) if retries >= policy.max_retries => {
                error!(context, retries, error = %err, "giving up");
                return Err(err);
            }
            Err(err) => {
                let delay = policy.delay_for(retries);
                retries += 1;
                info!(
                    context,
                    attempt = retries,
                    max = policy.max_retries,
                    delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                    error = %err,
                    "retrying"
                );
                sleep(delay).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::future::ready;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn succeeds_on_third_attempt() {
        let calls = AtomicU32::new(0);
        let delays = Mutex::new(Vec::new());

        let result: Result<u32, &str> = with_retry(
            RetryPolicy::default(),
            "test",
            || {
                let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                ready(if n < 3 { Err("boom") } else { Ok(n) })
            },
            |d| {
                delays.lock().unwrap().push(d);
                ready(())
            },
        )
        .await;

        assert_eq!(result, Ok(3));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(
            *delays.lock().unwrap(),
            [Duration::from_millis(400), Duration::from_millis(800)]
        );
    }

    #[tokio::test]
    async fn gives_up_after_max_retries() {
        let calls = AtomicU32::new(0);
        let delays = Mutex::new(Vec::new());

        let result: Result<(), String> = with_retry(
            RetryPolicy::default(),
            "test",
            || {
                let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                ready(Err(format!("failure {n}")))
            },
            |d| {
                delays.lock().unwrap().push(d);
                ready(())
            },
        )
        .await;

        assert_eq!(result, Err("failure 4".to_string()));
        assert_eq!(calls.load(Ordering::SeqCst), 4);
        assert_eq!(
            *delays.lock().unwrap(),
            [
                Duration::from_millis(400),
                Duration::from_millis(800),
                Duration::from_millis(1600)
            ]
        );
    }

    #[tokio::test]
    async fn first_success_does_not_sleep() {
        let mut slept = false;
        let result: Result<&str, &str> =
            with_retry(RetryPolicy::default(), "test", || ready(Ok("ok")), |_| {
                slept = true;
                ready(())
            })
            .await;
        assert_eq!(result, Ok("ok"));
        assert!(!slept);
    }

    #[test]
    fn delays_double() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_for(0), Duration::from_millis(400));
        assert_eq!(policy.delay_for(3), Duration::from_millis(3200));
    }
}
