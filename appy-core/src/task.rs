//! Cancellable local tasks used for remote fetches.

use std::future::Future;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// A fetch spawned on the current `LocalSet`.
///
/// The fetch future is raced against a cancellation token; `on_done` only
/// runs if the fetch finished before the token was cancelled.
pub(crate) struct InFlight {
    token: CancellationToken,
    handle: JoinHandle<()>,
}

impl InFlight {
    /// # Panics
    ///
    /// Panics when called outside a `tokio::task::LocalSet`.
    pub(crate) fn spawn<F, D>(fetch: F, on_done: D) -> Self
    where
        F: Future + 'static,
        D: FnOnce(F::Output) + 'static,
    {
        let token = CancellationToken::new();
        let cancelled = token.clone();

        let handle = tokio::task::spawn_local(async move {
            tokio::select! {
                biased;
                _ = cancelled.cancelled() => {}
                output = fetch => on_done(output),
            }
        });

        InFlight { token, handle }
    }

    pub(crate) fn cancel(&self) {
        self.token.cancel();
        self.handle.abort();
    }
}
