//! Bounded waits for eventually-consistent effects.

use std::future::Future;
use std::time::Duration;

use crate::error::{Error, Result};

/// Default polling interval for [`wait_for`] callers.
pub const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Poll `probe` every `interval` until it returns `true`.
///
/// Fails with [`Error::Timeout`] once `timeout` elapses, including when a
/// single probe hangs. Probe errors are returned immediately.
pub async fn wait_for<F, Fut>(
    what: &str,
    timeout: Duration,
    interval: Duration,
    mut probe: F,
) -> Result<()>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<bool>>,
{
    let poll = async {
        loop {
            if probe().await? {
                return Ok::<(), Error>(());
            }
            tokio::time::sleep(interval).await;
        }
    };

    tokio::time::timeout(timeout, poll)
        .await
        .map_err(|_| Error::Timeout {
            what: what.to_string(),
            after: timeout,
        })?
}
