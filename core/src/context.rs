//! Caller-side cancellation and deadlines.
//!
//! A `Context` is passed to every client operation. The operation never runs
//! longer than the smaller of the context's remaining time and the client's
//! own timeout, and it stops as soon as the context is cancelled.

use std::future;
use std::time::{Duration, Instant};

use tokio::sync::watch;

/// Cancellation and deadline token for a single operation or a group of them.
///
/// Clones share cancellation: cancelling through the `CancelHandle` cancels
/// every clone.
#[derive(Debug, Clone, Default)]
pub struct Context {
    deadline: Option<Instant>,
    cancel: Option<watch::Receiver<bool>>,
}

/// Cancels the `Context` it was created with.
#[derive(Debug)]
pub struct CancelHandle(watch::Sender<bool>);

impl CancelHandle {
    pub fn cancel(&self) {
        self.0.send_replace(true);
    }
}

impl Context {
    /// No deadline, never cancelled.
    pub fn background() -> Self {
        Self::default()
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self::background().deadline_in(timeout)
    }

    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            deadline: Some(deadline),
            cancel: None,
        }
    }

    /// A context that can be cancelled through the returned handle.
    pub fn cancellable() -> (Self, CancelHandle) {
        let (tx, rx) = watch::channel(false);
        let ctx = Self {
            deadline: None,
            cancel: Some(rx),
        };
        (ctx, CancelHandle(tx))
    }

    /// Narrows the deadline to at most `timeout` from now. An earlier existing
    /// deadline is kept.
    pub fn deadline_in(mut self, timeout: Duration) -> Self {
        let candidate = Instant::now() + timeout;
        self.deadline = Some(match self.deadline {
            Some(existing) => existing.min(candidate),
            None => candidate,
        });
        self
    }

    /// Time an operation may take: the remaining caller time capped at `limit`.
    pub fn budget(&self, limit: Duration) -> Duration {
        match self.deadline {
            Some(deadline) => deadline.saturating_duration_since(Instant::now()).min(limit),
            None => limit,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(|rx| *rx.borrow())
    }

    /// Resolves once the context is cancelled. Pends forever for contexts that
    /// cannot be cancelled, or whose handle was dropped without cancelling.
    pub async fn cancelled(&self) {
        let Some(rx) = &self.cancel else {
            return future::pending().await;
        };
        let mut rx = rx.clone();
        let cancelled = rx.wait_for(|cancelled| *cancelled).await.is_ok();
        if !cancelled {
            future::pending::<()>().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn background_budget_is_the_limit() {
        let ctx = Context::background();
        assert_eq!(ctx.budget(Duration::from_secs(10)), Duration::from_secs(10));
        assert!(!ctx.is_cancelled());
    }

    #[test]
    fn budget_takes_the_smaller_bound() {
        let ctx = Context::with_timeout(Duration::from_secs(1));
        assert!(ctx.budget(Duration::from_secs(10)) <= Duration::from_secs(1));
        assert_eq!(ctx.budget(Duration::from_millis(5)), Duration::from_millis(5));
    }

    #[test]
    fn expired_deadline_gives_zero_budget() {
        let ctx = Context::with_deadline(Instant::now());
        assert_eq!(ctx.budget(Duration::from_secs(10)), Duration::ZERO);
    }

    #[test]
    fn deadline_in_never_extends() {
        let ctx = Context::with_timeout(Duration::from_millis(10)).deadline_in(Duration::from_secs(60));
        assert!(ctx.budget(Duration::from_secs(60)) <= Duration::from_millis(10));
    }

    #[test]
    fn cancel_reaches_clones() {
        let (ctx, handle) = Context::cancellable();
        let clone = ctx.clone();
        assert!(!clone.is_cancelled());
        handle.cancel();
        assert!(ctx.is_cancelled());
        assert!(clone.is_cancelled());
    }

    #[tokio::test]
    async fn cancelled_resolves_after_cancel() {
        let (ctx, handle) = Context::cancellable();
        let waiter = tokio::spawn(async move { ctx.cancelled().await });
        handle.cancel();
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn dropped_handle_never_cancels() {
        let (ctx, handle) = Context::cancellable();
        drop(handle);
        let outcome = tokio::time::timeout(Duration::from_millis(50), ctx.cancelled()).await;
        assert!(outcome.is_err());
        assert!(!ctx.is_cancelled());
    }
}
