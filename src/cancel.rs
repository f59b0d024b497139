//! A cooperative cancellation handle, raced against I/O at every
//! suspension point rather than relied on by dropping the future.
//!
//! Dropping an in-flight send/receive future would leave a packet
//! half-written on the wire with no way to know how much of it reached the
//! server; racing an explicit token instead lets a cancelled operation
//! still run its failure path and mark the session `Failed` deterministically.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::Notify;

#[derive(Default, Debug)]
struct Inner {
    cancelled: AtomicBool,
    notify: Notify,
}

/// A cloneable, shareable flag: `cancel()` fires every outstanding and
/// future call to [`CancellationToken::cancelled`].
#[derive(Clone, Default, Debug)]
pub struct CancellationToken {
    inner: Arc<Inner>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.inner.cancelled.store(true, Ordering::SeqCst);
        self.inner.notify.notify_waiters();
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::SeqCst)
    }

    /// Resolves once `cancel()` has been called (immediately if it already
    /// has). Meant to be raced with an I/O future via `tokio::select!`.
    pub async fn cancelled(&self) {
        loop {
            // Constructing `notified()` before re-checking the flag avoids
            // missing a `cancel()` that lands between the check and the
            // `.await` below.
            let notified = self.inner.notify.notified();
            if self.is_cancelled() {
                return;
            }
            notified.await;
            if self.is_cancelled() {
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn a_token_not_yet_cancelled_does_not_resolve_immediately() {
        let token = CancellationToken::new();
        tokio::select! {
            _ = token.cancelled() => panic!("should not have resolved"),
            _ = tokio::time::sleep(std::time::Duration::from_millis(20)) => {}
        }
    }

    #[tokio::test]
    async fn cancelling_resolves_an_outstanding_wait() {
        let token = CancellationToken::new();
        let waiter = token.clone();
        let handle = tokio::spawn(async move {
            waiter.cancelled().await;
        });

        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        token.cancel();

        tokio::time::timeout(std::time::Duration::from_millis(200), handle)
            .await
            .expect("cancellation should have woken the waiter")
            .unwrap();
    }

    #[tokio::test]
    async fn an_already_cancelled_token_resolves_immediately() {
        let token = CancellationToken::new();
        token.cancel();
        assert!(token.is_cancelled());
        token.cancelled().await;
    }
}
