//! Per-call deadline and cancellation
//!
//! Every device interaction runs under an [`OperationContext`]. The context
//! carries an optional absolute deadline and a cancellation token; each
//! transport call made by the installer is raced against both.

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::{FirmwareInstallError, Result, TransportError};

/// Deadline and cancellation scope for one caller-initiated operation
#[derive(Debug, Clone)]
pub struct OperationContext {
    deadline: Option<Instant>,
    cancel: CancellationToken,
}

impl Default for OperationContext {
    fn default() -> Self {
        Self::unbounded()
    }
}

impl OperationContext {
    /// Context with no deadline and a fresh cancellation token
    pub fn unbounded() -> Self {
        Self {
            deadline: None,
            cancel: CancellationToken::new(),
        }
    }

    /// Context that expires `timeout` from now
    pub fn with_timeout(timeout: Duration) -> Self {
        Self::with_deadline(Instant::now() + timeout)
    }

    /// Context that expires at `deadline`
    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            deadline: Some(deadline),
            cancel: CancellationToken::new(),
        }
    }

    /// Attach an externally owned cancellation token
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Absolute deadline, if any
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Time left before the deadline; `None` means unbounded
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|deadline| deadline.saturating_duration_since(Instant::now()))
    }

    /// Context sharing this deadline whose cancellation does not propagate upwards
    pub fn child(&self) -> Self {
        Self {
            deadline: self.deadline,
            cancel: self.cancel.child_token(),
        }
    }

    /// Cancel this context and every child
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Whether the context was cancelled
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// The cancellation token
    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Run a transport call under this context
    ///
    /// # Errors
    ///
    /// [`FirmwareInstallError::Cancelled`] or
    /// [`FirmwareInstallError::DeadlineExceeded`] when the call is cut short,
    /// otherwise the transport error wrapped as
    /// [`FirmwareInstallError::Transport`].
    pub async fn run<T, F>(&self, operation: &'static str, fut: F) -> Result<T>
    where
        F: Future<Output = std::result::Result<T, TransportError>>,
    {
        let outcome = self.guard(operation, fut).await?;
        outcome.map_err(|source| FirmwareInstallError::transport(operation, source))
    }

    /// Race an arbitrary future against this context
    ///
    /// # Errors
    ///
    /// [`FirmwareInstallError::Cancelled`] or
    /// [`FirmwareInstallError::DeadlineExceeded`].
    pub async fn guard<T, F>(&self, operation: &'static str, fut: F) -> Result<T>
    where
        F: Future<Output = T>,
    {
        if self.cancel.is_cancelled() {
            return Err(FirmwareInstallError::Cancelled { operation });
        }

        let deadline = self.deadline;
        let bounded = async move {
            match deadline {
                Some(at) => tokio::time::timeout_at(at, fut).await.ok(),
                None => Some(fut.await),
            }
        };

        tokio::select! {
            biased;
            () = self.cancel.cancelled() => {
                debug!(operation, "operation cancelled");
                Err(FirmwareInstallError::Cancelled { operation })
            }
            outcome = bounded => outcome.ok_or_else(|| {
                debug!(operation, "deadline exceeded");
                FirmwareInstallError::DeadlineExceeded { operation }
            }),
        }
    }

    /// Sleep for `period`, returning early on cancellation or deadline expiry
    ///
    /// # Errors
    ///
    /// See [`OperationContext::guard`].
    pub async fn sleep(&self, operation: &'static str, period: Duration) -> Result<()> {
        self.guard(operation, tokio::time::sleep(period)).await
    }
}
