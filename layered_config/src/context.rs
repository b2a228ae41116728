//! Cancellation and deadlines for loads and watches.
//!
//! [`Context`] wraps a [`CancellationToken`] with an optional deadline so a
//! caller can stop a load between sources, or end a dynamic watch, either
//! explicitly or when time runs out.

use std::time::Duration;

use thiserror::Error;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Why a context finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum Cause {
    /// [`Context::cancel`] was called on this context or a parent.
    #[error("context canceled")]
    Canceled,
    /// The deadline passed.
    #[error("context deadline exceeded")]
    DeadlineExceeded,
}

/// Cancellation signal with an optional deadline.
///
/// Derived contexts are children: canceling a parent cancels every child,
/// and a child's deadline is never later than its parent's.
///
/// # Examples
///
/// ```
/// use layered_config::{Cause, Context};
///
/// let parent = Context::background();
/// let child = parent.with_cancel();
/// parent.cancel();
/// assert_eq!(child.cause(), Some(Cause::Canceled));
/// ```
#[derive(Debug, Clone, Default)]
pub struct Context {
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl Context {
    /// A context that never finishes on its own.
    #[must_use]
    pub fn background() -> Self {
        Self::default()
    }

    /// A child context that can be canceled independently.
    #[must_use]
    pub fn with_cancel(&self) -> Self {
        Self {
            token: self.token.child_token(),
            deadline: self.deadline,
        }
    }

    /// A child context that finishes at `deadline` at the latest.
    #[must_use]
    pub fn with_deadline(&self, deadline: Instant) -> Self {
        let deadline = self
            .deadline
            .map_or(deadline, |current| current.min(deadline));
        Self {
            token: self.token.child_token(),
            deadline: Some(deadline),
        }
    }

    /// A child context that finishes after `timeout` at the latest.
    ///
    /// Must be called within a Tokio runtime when time is paused in tests,
    /// so the deadline is measured on the runtime's clock.
    #[must_use]
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    /// Cancels this context and its children.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// The deadline, if any.
    #[must_use]
    pub const fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Why the context finished, or `None` while it is live.
    #[must_use]
    pub fn cause(&self) -> Option<Cause> {
        if self.token.is_cancelled() {
            return Some(Cause::Canceled);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Some(Cause::DeadlineExceeded),
            _ => None,
        }
    }

    /// Whether the context has finished.
    #[must_use]
    pub fn is_done(&self) -> bool {
        self.cause().is_some()
    }

    /// Drives `fut` unless the context finishes first.
    ///
    /// When the context wins, `fut` is dropped and the cause is returned.
    ///
    /// # Errors
    ///
    /// Returns the [`Cause`] when the context finished before `fut`
    /// completed.
    pub async fn run<F>(&self, fut: F) -> Result<F::Output, Cause>
    where
        F: Future,
    {
        tokio::select! {
            biased;
            cause = self.done() => Err(cause),
            output = fut => Ok(output),
        }
    }

    /// Waits until the context finishes and reports why.
    pub async fn done(&self) -> Cause {
        let deadline = async {
            match self.deadline {
                Some(deadline) => tokio::time::sleep_until(deadline).await,
                None => std::future::pending::<()>().await,
            }
        };
        tokio::select! {
            () = self.token.cancelled() => Cause::Canceled,
            () = deadline => Cause::DeadlineExceeded,
        }
    }
}
