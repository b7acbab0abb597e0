use std::future::Future;
use std::time::Duration;
use tracing::debug;

/// Runs an HTTP operation up to `1 + retries` times, sleeping `delay`
/// between attempts. Returns the first success or the last error.
pub async fn with_retry<F, Fut, T>(
    mut operation: F,
    retries: usize,
    delay: Duration,
) -> Result<T, reqwest::Error>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, reqwest::Error>>,
{
    let mut last_err = None;
    for attempt in 0..=retries {
        if attempt > 0 {
            tokio::time::sleep(delay).await;
        }
        match operation().await {
            Ok(val) => return Ok(val),
            Err(err) => {
                debug!(attempt, retries, %err, "Request attempt failed");
                last_err = Some(err);
            }
        }
    }
    Err(last_err.expect("at least one attempt runs"))
}
