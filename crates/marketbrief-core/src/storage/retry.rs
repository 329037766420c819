//! Retry of SQLite statements that fail with transient lock or I/O errors.
//!
//! Scheduled ingestion and maintenance runs may overlap on the same database file,
//! so a writer can briefly see SQLITE_BUSY even with WAL and a busy timeout.

use std::future::Future;
use std::time::Duration;

/// Retries after the first attempt
pub const MAX_RETRIES: u32 = 4;

/// Primary result codes worth retrying: BUSY (5), LOCKED (6), IOERR (10).
/// Extended codes carry the primary code in their low byte.
pub fn is_transient_error(err: &sqlx::Error) -> bool {
    let sqlx::Error::Database(db_err) = err else {
        return false;
    };

    db_err
        .code()
        .and_then(|code| code.parse::<u32>().ok())
        .map_or(false, |code| matches!(code & 0xff, 5 | 6 | 10))
}

/// 100ms, 200ms, 400ms, 800ms
fn backoff_delay(attempt: u32) -> Duration {
    Duration::from_millis(100 * 2u64.pow(attempt.saturating_sub(1)))
}

/// Run a statement, retrying transient failures with exponential backoff
pub async fn with_retry<F, Fut, T>(operation: &str, run: F) -> std::result::Result<T, sqlx::Error>
where
    F: Fn() -> Fut,
    Fut: Future<Output = std::result::Result<T, sqlx::Error>>,
{
    let mut attempts = 0;
    loop {
        match run().await {
            Ok(value) => return Ok(value),
            Err(e) if is_transient_error(&e) && attempts < MAX_RETRIES => {
                attempts += 1;
                let delay = backoff_delay(attempts);
                tracing::debug!(
                    error = %e,
                    operation,
                    attempt = attempts,
                    delay_ms = delay.as_millis() as u64,
                    "Transient store error, retrying"
                );
                tokio::time::sleep(delay).await;
            }
            Err(e) => return Err(e),
        }
    }
}
