use crate::StoreError;
use std::future::Future;
use std::time::Duration;

/// Retry `op` with a 50ms initial backoff, multiplied by 1.5 each attempt,
/// as long as it fails with the transient "database is locked" condition.
/// Any other error is returned immediately.
///
/// Grounded on `y._db.decorators.retry_locked`, which does the same thing
/// around Pony ORM's `OperationalError`/`CommitException` "database is
/// locked" cases.
pub async fn retry_locked<F, Fut, T>(mut op: F) -> Result<T, StoreError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, StoreError>>,
{
    let mut sleep = Duration::from_millis(50);
    loop {
        match op().await {
            Ok(v) => return Ok(v),
            Err(e) if e.is_locked() => {
                if sleep > Duration::from_secs(1) {
                    tracing::warn!(?sleep, "database locked, retrying");
                } else {
                    tracing::debug!(?sleep, "database locked, retrying");
                }
                tokio::time::sleep(sleep).await;
                sleep = sleep.mul_f32(1.5);
            }
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn retries_until_success() {
        let attempts = AtomicU32::new(0);
        let result = retry_locked(|| async {
            let n = attempts.fetch_add(1, Ordering::SeqCst);
            if n < 2 {
                Err(StoreError::Locked("database is locked".to_owned()))
            } else {
                Ok(42)
            }
        })
        .await;
        assert_eq!(result.unwrap(), 42);
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn non_locked_error_short_circuits() {
        let attempts = AtomicU32::new(0);
        let result = retry_locked(|| async {
            attempts.fetch_add(1, Ordering::SeqCst);
            Err::<(), _>(StoreError::MissingPgConfig)
        })
        .await;
        assert!(result.is_err());
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }
}
