//! Local-runtime helpers for driving the player in tests.

use std::future::Future;

use tokio::task::LocalSet;

/// Runs `future` inside a `LocalSet` so the player can spawn local tasks.
pub async fn run_local<F: Future>(future: F) -> F::Output {
    LocalSet::new().run_until(future).await
}

/// Yields long enough for spawned local tasks (handshakes, message pumps,
/// fire-and-forget sends) to make progress.
pub async fn settle() {
    for _ in 0..64 {
        tokio::task::yield_now().await;
    }
}
