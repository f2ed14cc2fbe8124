//! Convergent retry for eventually consistent index operations.

use std::future::Future;

use tablesync_core::service::{ServiceError, ServiceResult};
use tablesync_core::RetryPolicy;

/// Runs `attempt` until it succeeds, reports convergence, or the policy runs out.
///
/// An error for which `converged` returns true means the desired state is
/// already reached and counts as success. Any other error is retried after
/// `policy.interval`; once `policy.max_attempts` is reached the last error
/// is returned.
pub async fn retry_convergent<F, Fut, C>(
    policy: &RetryPolicy,
    operation: &str,
    converged: C,
    mut attempt: F,
) -> ServiceResult<()>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = ServiceResult<()>>,
    C: Fn(&ServiceError) -> bool,
{
    let mut tries = 0;
    loop {
        tries += 1;
        match attempt().await {
            Ok(()) => return Ok(()),
            Err(err) if converged(&err) => {
                tracing::debug!(operation, error = %err, "Already converged");
                return Ok(());
            }
            Err(err) if tries >= policy.max_attempts => {
                tracing::error!(operation, attempts = tries, error = %err, "Retries exhausted");
                return Err(err);
            }
            Err(err) => {
                tracing::warn!(
                    operation,
                    attempt = tries,
                    max_attempts = policy.max_attempts,
                    error = %err,
                    "Retrying"
                );
                tokio::time::sleep(policy.interval).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    use tablesync_core::service::ServiceErrorKind;

    use super::*;

    fn policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy::new(max_attempts, Duration::ZERO)
    }

    fn transient() -> ServiceError {
        ServiceError::new(ServiceErrorKind::Throttled, "Subscriber limit exceeded")
    }

    #[tokio::test]
    async fn test_succeeds_first_try() {
        let calls = AtomicU32::new(0);
        let result = retry_convergent(&policy(5), "op", ServiceError::is_not_found, || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Ok(()) }
        })
        .await;

        assert!(result.is_ok());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_converged_error_stops_immediately() {
        let calls = AtomicU32::new(0);
        let result = retry_convergent(&policy(5), "op", ServiceError::is_not_found, || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(ServiceError::not_found("Requested resource not found")) }
        })
        .await;

        assert!(result.is_ok());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_retries_transient_until_success() {
        let calls = AtomicU32::new(0);
        let result = retry_convergent(&policy(5), "op", ServiceError::is_already_exists, || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    Err(transient())
                } else {
                    Ok(())
                }
            }
        })
        .await;

        assert!(result.is_ok());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_exhaustion_returns_last_error() {
        let calls = AtomicU32::new(0);
        let result = retry_convergent(&policy(4), "op", ServiceError::is_already_exists, || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                Err(ServiceError::new(
                    ServiceErrorKind::Throttled,
                    format!("attempt {}", n + 1),
                ))
            }
        })
        .await;

        assert_eq!(calls.load(Ordering::SeqCst), 4);
        assert_eq!(result.unwrap_err().message, "attempt 4");
    }

    #[tokio::test]
    async fn test_single_attempt_policy_does_not_retry() {
        let calls = AtomicU32::new(0);
        let result = retry_convergent(&policy(1), "op", ServiceError::is_already_exists, || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(transient()) }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
