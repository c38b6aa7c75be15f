//! Per-request context carrying a trace id, an optional deadline, and a
//! cancellation token.
//!
//! A [`RequestContext`] is created once per inbound request and passed by
//! reference, unchanged, into every cache, store, and RPC call made on the
//! request's behalf. [`RequestContext::run`] bounds any future by the
//! context so no call outlives its caller.

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Why a bounded call stopped before completing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Interrupted {
    #[error("request cancelled")]
    Cancelled,
    #[error("request deadline exceeded")]
    DeadlineExceeded,
}

/// Cancellation-aware context threaded through every operation of a request.
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// Identifier correlating log lines of one request.
    pub trace_id: String,
    deadline: Option<Instant>,
    cancel: CancellationToken,
}

impl RequestContext {
    /// Creates an unbounded context with a fresh trace id.
    #[must_use]
    pub fn new() -> Self {
        Self::with_trace_id(uuid::Uuid::new_v4().to_string())
    }

    #[must_use]
    pub fn with_trace_id(trace_id: impl Into<String>) -> Self {
        Self {
            trace_id: trace_id.into(),
            deadline: None,
            cancel: CancellationToken::new(),
        }
    }

    /// Sets the deadline to `now + timeout`, keeping an earlier deadline if one exists.
    ///
    /// A timeout too large to represent leaves the context unbounded.
    #[must_use]
    pub fn with_timeout(self, timeout: Duration) -> Self {
        match Instant::now().checked_add(timeout) {
            Some(deadline) => self.with_deadline(deadline),
            None => self,
        }
    }

    /// Sets an absolute deadline, keeping an earlier deadline if one exists.
    #[must_use]
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(match self.deadline {
            Some(existing) => existing.min(deadline),
            None => deadline,
        });
        self
    }

    /// Derives a context that shares the trace id and deadline and is
    /// cancelled when `self` is, but can also be cancelled on its own.
    #[must_use]
    pub fn child(&self) -> Self {
        Self {
            trace_id: self.trace_id.clone(),
            deadline: self.deadline,
            cancel: self.cancel.child_token(),
        }
    }

    #[must_use]
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Time left before the deadline. `None` when unbounded.
    #[must_use]
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|d| d.saturating_duration_since(Instant::now()))
    }

    /// Cancels this context and every child derived from it.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Returns an error if the context is already cancelled or past its deadline.
    ///
    /// # Errors
    ///
    /// [`Interrupted::Cancelled`] or [`Interrupted::DeadlineExceeded`].
    pub fn check(&self) -> Result<(), Interrupted> {
        if self.cancel.is_cancelled() {
            return Err(Interrupted::Cancelled);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Err(Interrupted::DeadlineExceeded),
            _ => Ok(()),
        }
    }

    /// Drives `fut` to completion unless the context is cancelled or its
    /// deadline passes first.
    ///
    /// # Errors
    ///
    /// Returns [`Interrupted`] if the context fires before `fut` completes.
    /// `fut` is dropped in that case.
    pub async fn run<F: Future>(&self, fut: F) -> Result<F::Output, Interrupted> {
        self.check()?;
        let deadline = async {
            match self.deadline {
                Some(deadline) => tokio::time::sleep_until(deadline).await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            biased;
            () = self.cancel.cancelled() => Err(Interrupted::Cancelled),
            () = deadline => Err(Interrupted::DeadlineExceeded),
            out = fut => Ok(out),
        }
    }
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unbounded_context_runs_to_completion() {
        let ctx = RequestContext::new();
        assert!(ctx.deadline().is_none());
        assert!(ctx.remaining().is_none());
        assert_eq!(ctx.run(async { 7 }).await, Ok(7));
    }

    #[tokio::test(start_paused = true)]
    async fn deadline_interrupts_slow_future() {
        let ctx = RequestContext::new().with_timeout(Duration::from_millis(50));
        let result = ctx
            .run(tokio::time::sleep(Duration::from_secs(10)))
            .await;
        assert_eq!(result, Err(Interrupted::DeadlineExceeded));
    }

    #[tokio::test(start_paused = true)]
    async fn fast_future_beats_deadline() {
        let ctx = RequestContext::new().with_timeout(Duration::from_secs(1));
        let result = ctx
            .run(async {
                tokio::time::sleep(Duration::from_millis(10)).await;
                "done"
            })
            .await;
        assert_eq!(result, Ok("done"));
    }

    #[tokio::test]
    async fn cancelled_context_rejects_immediately() {
        let ctx = RequestContext::new();
        ctx.cancel();
        assert!(ctx.is_cancelled());
        assert_eq!(ctx.check(), Err(Interrupted::Cancelled));
        assert_eq!(ctx.run(async { 1 }).await, Err(Interrupted::Cancelled));
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_during_run_interrupts() {
        let ctx = RequestContext::new();
        let canceller = ctx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(5)).await;
            canceller.cancel();
        });
        let result = ctx.run(std::future::pending::<()>()).await;
        assert_eq!(result, Err(Interrupted::Cancelled));
    }

    #[test]
    fn with_deadline_keeps_earliest() {
        let now = Instant::now();
        let early = now + Duration::from_secs(1);
        let late = now + Duration::from_secs(10);
        let ctx = RequestContext::new().with_deadline(early).with_deadline(late);
        assert_eq!(ctx.deadline(), Some(early));
    }

    #[test]
    fn unrepresentable_timeout_leaves_context_unbounded() {
        let ctx = RequestContext::new().with_timeout(Duration::MAX);
        assert!(ctx.deadline().is_none());
    }

    #[test]
    fn child_follows_parent_cancellation() {
        let parent = RequestContext::with_trace_id("t-1");
        let child = parent.child();
        assert_eq!(child.trace_id, "t-1");

        child.cancel();
        assert!(!parent.is_cancelled());

        let other = parent.child();
        parent.cancel();
        assert!(other.is_cancelled());
    }
}
