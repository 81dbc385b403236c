//! Racing futures against a request's cancellation token.

use async_trait::async_trait;
use std::future::Future;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cancelled;

impl std::fmt::Display for Cancelled {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("request was cancelled")
    }
}

impl std::error::Error for Cancelled {}

#[async_trait]
pub trait OrCancelExt: Sized {
    type Output;

    /// Resolve to `Err(Cancelled)` if `token` fires before the future completes.
    /// The losing future is dropped, which aborts in-flight HTTP requests.
    async fn or_cancel(self, token: &CancellationToken) -> Result<Self::Output, Cancelled>;
}

#[async_trait]
impl<F> OrCancelExt for F
where
    F: Future + Send,
    F::Output: Send,
{
    type Output = F::Output;

    async fn or_cancel(self, token: &CancellationToken) -> Result<Self::Output, Cancelled> {
        tokio::select! {
            _ = token.cancelled() => Err(Cancelled),
            res = self => Ok(res),
        }
    }
}
