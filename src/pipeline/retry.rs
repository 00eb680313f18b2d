//! Fixed-interval retry for throttled provider calls.

use std::future::Future;
use std::time::Duration;

use tracing::warn;

use crate::providers::ProviderError;

/// Run `call` until it returns anything other than
/// [`ProviderError::Throttled`], sleeping `interval` between attempts.
///
/// The interval is fixed: no backoff, no attempt cap. Only the calling
/// task sleeps; other in-flight cards keep going. Every non-throttling
/// outcome, success or fatal, is returned unchanged on the attempt it
/// occurs.
pub async fn with_throttle_retry<T, F, Fut>(
    interval: Duration,
    operation: &str,
    mut call: F,
) -> Result<T, ProviderError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ProviderError>>,
{
    loop {
        match call().await {
            Err(ProviderError::Throttled(detail)) => {
                warn!(
                    operation,
                    %detail,
                    wait_secs = interval.as_secs(),
                    "throttled by remote service, retrying after wait"
                );
                tokio::time::sleep(interval).await;
            }
            result => return result,
        }
    }
}
