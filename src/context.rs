//! Cancellation and deadlines for driver calls.
//!
//! Every call in the driver contract that can reach the network takes a
//! [`Context`]. A context is cheap to clone; children share the parent's
//! cancellation and can only tighten its deadline.

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::error::SqlDriverError;

/// Cancellation token plus optional deadline, threaded through each driver call.
///
/// ```rust
/// use std::time::Duration;
/// use sql_driver_adapter::Context;
///
/// let (ctx, cancel) = Context::background().with_cancel();
/// let bounded = ctx.with_timeout(Duration::from_secs(5));
/// cancel.cancel();
/// assert!(bounded.err().is_some());
/// ```
#[derive(Debug, Clone, Default)]
pub struct Context {
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl Context {
    /// A context that is never cancelled and has no deadline.
    #[must_use]
    pub fn background() -> Self {
        Self::default()
    }

    /// Child context that is cancelled through the returned token (or when the parent is).
    #[must_use]
    pub fn with_cancel(&self) -> (Self, CancellationToken) {
        let token = self.token.child_token();
        let ctx = Self {
            token: token.clone(),
            deadline: self.deadline,
        };
        (ctx, token)
    }

    /// Child context whose deadline is `timeout` from now, or the parent's if earlier.
    #[must_use]
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    /// Child context with the earlier of `deadline` and the parent's deadline.
    #[must_use]
    pub fn with_deadline(&self, deadline: Instant) -> Self {
        let deadline = match self.deadline {
            Some(existing) if existing <= deadline => existing,
            _ => deadline,
        };
        Self {
            token: self.token.child_token(),
            deadline: Some(deadline),
        }
    }

    #[must_use]
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Why this context is done, or `None` while it is still live.
    #[must_use]
    pub fn err(&self) -> Option<SqlDriverError> {
        if self.token.is_cancelled() {
            Some(SqlDriverError::Cancelled)
        } else if self.deadline.is_some_and(|d| d <= Instant::now()) {
            Some(SqlDriverError::DeadlineExceeded)
        } else {
            None
        }
    }

    /// Drive `fut` to completion unless this context ends first.
    ///
    /// When the context wins, `fut` is dropped before this returns, which
    /// releases whatever it was holding (sockets, half-read packets).
    ///
    /// # Errors
    /// Returns `SqlDriverError::Cancelled` or `SqlDriverError::DeadlineExceeded`
    /// if the context ends before `fut` completes.
    pub async fn run<F>(&self, fut: F) -> Result<F::Output, SqlDriverError>
    where
        F: Future,
    {
        if let Some(err) = self.err() {
            return Err(err);
        }

        let deadline = async {
            match self.deadline {
                Some(at) => tokio::time::sleep_until(at).await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            biased;
            () = self.token.cancelled() => Err(SqlDriverError::Cancelled),
            () = deadline => Err(SqlDriverError::DeadlineExceeded),
            out = fut => Ok(out),
        }
    }
}
