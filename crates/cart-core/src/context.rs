//! Deadlines and cancellation for store and protocol calls.
//!
//! Every backend call is bound by a caller-supplied [`CallContext`]. When the
//! deadline passes or the caller cancels, the in-flight future is dropped and
//! the call fails with [`Interrupted`]. Nothing here retries.

use std::future::Future;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::Instant;

/// Why a call was cut short.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Interrupted {
    /// The deadline elapsed.
    #[error("deadline exceeded after {0:?}")]
    Timeout(Duration),

    /// The caller canceled.
    #[error("canceled by caller")]
    Canceled,
}

/// Sending half of a cancellation signal.
#[derive(Debug)]
pub struct CancelHandle(watch::Sender<bool>);

impl CancelHandle {
    /// Cancel every call observing the paired signal.
    pub fn cancel(&self) {
        self.0.send_replace(true);
    }
}

/// Receiving half of a cancellation signal.
#[derive(Debug, Clone)]
pub struct CancelSignal(watch::Receiver<bool>);

impl CancelSignal {
    /// Whether cancellation was already requested.
    pub fn is_canceled(&self) -> bool {
        *self.0.borrow()
    }

    /// Resolve once cancellation is requested.
    ///
    /// Never resolves if the handle is dropped without canceling.
    async fn canceled(&mut self) {
        loop {
            if *self.0.borrow_and_update() {
                return;
            }
            if self.0.changed().await.is_err() {
                futures::future::pending::<()>().await;
            }
        }
    }
}

/// Create a linked cancel handle and signal.
pub fn cancel_pair() -> (CancelHandle, CancelSignal) {
    let (tx, rx) = watch::channel(false);
    (CancelHandle(tx), CancelSignal(rx))
}

/// Per-call deadline and cancellation.
#[derive(Debug, Clone, Default)]
pub struct CallContext {
    deadline: Option<Instant>,
    budget: Duration,
    cancel: Option<CancelSignal>,
}

impl CallContext {
    /// A context with no deadline and no cancellation.
    pub fn background() -> Self {
        Self::default()
    }

    /// A context expiring `timeout` from now.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            deadline: Some(Instant::now() + timeout),
            budget: timeout,
            cancel: None,
        }
    }

    /// Attach a cancellation signal.
    pub fn with_cancel(mut self, signal: CancelSignal) -> Self {
        self.cancel = Some(signal);
        self
    }

    /// Derive a context whose deadline is at most `timeout` from now.
    ///
    /// An earlier deadline already on the context is kept.
    pub fn tighten(&self, timeout: Duration) -> Self {
        let candidate = Instant::now() + timeout;
        let mut next = self.clone();
        match self.deadline {
            Some(existing) if existing <= candidate => {}
            _ => {
                next.deadline = Some(candidate);
                next.budget = timeout;
            }
        }
        next
    }

    /// Time left before the deadline, if one is set.
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|d| d.saturating_duration_since(Instant::now()))
    }

    /// Check the context without awaiting anything.
    pub fn check(&self) -> Result<(), Interrupted> {
        if self.cancel.as_ref().is_some_and(CancelSignal::is_canceled) {
            return Err(Interrupted::Canceled);
        }
        if self.deadline.is_some_and(|d| Instant::now() >= d) {
            return Err(Interrupted::Timeout(self.budget));
        }
        Ok(())
    }

    /// Drive `fut` to completion unless the deadline or a cancel comes first.
    pub async fn run<F>(&self, fut: F) -> Result<F::Output, Interrupted>
    where
        F: Future,
    {
        self.check()?;

        let mut cancel = self.cancel.clone();
        let canceled = async move {
            match cancel.as_mut() {
                Some(signal) => signal.canceled().await,
                None => futures::future::pending::<()>().await,
            }
        };
        let deadline = self.deadline;
        let expired = async move {
            match deadline {
                Some(d) => tokio::time::sleep_until(d).await,
                None => futures::future::pending::<()>().await,
            }
        };

        tokio::select! {
            biased;
            _ = canceled => Err(Interrupted::Canceled),
            _ = expired => Err(Interrupted::Timeout(self.budget)),
            out = fut => Ok(out),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_background_runs_to_completion() {
        let ctx = CallContext::background();
        assert_eq!(ctx.run(async { 7 }).await, Ok(7));
        assert!(ctx.remaining().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_aborts_slow_future() {
        let ctx = CallContext::with_timeout(Duration::from_millis(50));
        let result = ctx
            .run(tokio::time::sleep(Duration::from_secs(5)))
            .await;
        assert_eq!(result, Err(Interrupted::Timeout(Duration::from_millis(50))));
    }

    #[tokio::test]
    async fn test_cancel_before_call() {
        let (handle, signal) = cancel_pair();
        handle.cancel();
        let ctx = CallContext::background().with_cancel(signal);
        assert_eq!(ctx.run(async { 1 }).await, Err(Interrupted::Canceled));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_during_call() {
        let (handle, signal) = cancel_pair();
        let ctx = CallContext::background().with_cancel(signal);

        let call = tokio::spawn(async move {
            ctx.run(tokio::time::sleep(Duration::from_secs(60))).await
        });
        tokio::time::sleep(Duration::from_millis(10)).await;
        handle.cancel();

        assert_eq!(call.await.unwrap(), Err(Interrupted::Canceled));
    }

    #[tokio::test(start_paused = true)]
    async fn test_tighten_keeps_earlier_deadline() {
        let ctx = CallContext::with_timeout(Duration::from_millis(10));
        let tightened = ctx.tighten(Duration::from_secs(10));
        assert!(tightened.remaining().unwrap() <= Duration::from_millis(10));

        let loose = CallContext::background().tighten(Duration::from_secs(1));
        assert_eq!(loose.remaining(), Some(Duration::from_secs(1)));
    }
}
