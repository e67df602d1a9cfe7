//! Cancellation context threaded through an export

use crate::domain::{ExportError, Result};
use std::time::{Duration, Instant};
use tokio::sync::watch;

/// Cancellation signal and deadline of one export call
///
/// Polled once per row by the write loop and handed to storage clients.
#[derive(Debug, Clone, Default)]
pub struct ExportContext {
    shutdown: Option<watch::Receiver<bool>>,
    deadline: Option<Instant>,
}

impl ExportContext {
    /// Context that is never cancelled
    pub fn background() -> Self {
        Self::default()
    }

    /// Cancel once `true` is sent on the shutdown channel
    pub fn with_shutdown(mut self, shutdown: watch::Receiver<bool>) -> Self {
        self.shutdown = Some(shutdown);
        self
    }

    /// Expire `timeout` from now
    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Fail if the export should stop
    ///
    /// # Errors
    ///
    /// `ExportError::Cancelled` after a shutdown signal, or
    /// `ExportError::DeadlineExceeded` once the deadline passed.
    pub fn check(&self) -> Result<()> {
        if let Some(shutdown) = &self.shutdown {
            if *shutdown.borrow() {
                return Err(ExportError::Cancelled(
                    "shutdown signal received".to_string(),
                ));
            }
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Err(ExportError::DeadlineExceeded),
            _ => Ok(()),
        }
    }

    /// Resolve once the export should stop
    ///
    /// Never resolves for a background context. Used to race in-flight work
    /// such as a page query against the shutdown signal and deadline.
    pub async fn cancelled(&self) -> ExportError {
        let shutdown = async {
            match self.shutdown.clone() {
                Some(mut rx) => loop {
                    if *rx.borrow_and_update() {
                        break;
                    }
                    // a dropped sender can no longer cancel
                    if rx.changed().await.is_err() {
                        std::future::pending::<()>().await;
                    }
                },
                None => std::future::pending::<()>().await,
            }
        };
        let deadline = async {
            match self.deadline {
                Some(deadline) => {
                    tokio::time::sleep_until(tokio::time::Instant::from_std(deadline)).await
                }
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            _ = shutdown => ExportError::Cancelled("shutdown signal received".to_string()),
            _ = deadline => ExportError::DeadlineExceeded,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_background_never_cancels() {
        assert!(ExportContext::background().check().is_ok());
    }

    #[test]
    fn test_shutdown_signal_cancels() {
        let (tx, rx) = watch::channel(false);
        let ctx = ExportContext::background().with_shutdown(rx);
        assert!(ctx.check().is_ok());

        tx.send(true).unwrap();
        let err = ctx.check().unwrap_err();
        assert!(matches!(err, ExportError::Cancelled(_)));
    }

    #[test]
    fn test_elapsed_deadline() {
        let ctx = ExportContext::background().with_timeout(Duration::ZERO);
        assert!(matches!(ctx.check(), Err(ExportError::DeadlineExceeded)));
    }

    #[test]
    fn test_clone_shares_signal() {
        let (tx, rx) = watch::channel(false);
        let ctx = ExportContext::background().with_shutdown(rx);
        let cloned = ctx.clone();
        tx.send(true).unwrap();
        assert!(cloned.check().is_err());
    }

    #[tokio::test]
    async fn test_cancelled_wakes_on_shutdown() {
        let (tx, rx) = watch::channel(false);
        let ctx = ExportContext::background().with_shutdown(rx);

        let waiter = tokio::spawn(async move { ctx.cancelled().await });
        tokio::time::sleep(Duration::from_millis(10)).await;
        tx.send(true).unwrap();

        let err = tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .unwrap()
            .unwrap();
        assert!(matches!(err, ExportError::Cancelled(_)));
    }

    #[tokio::test]
    async fn test_cancelled_wakes_at_deadline() {
        let ctx = ExportContext::background().with_timeout(Duration::from_millis(20));
        let err = tokio::time::timeout(Duration::from_secs(1), ctx.cancelled())
            .await
            .unwrap();
        assert!(matches!(err, ExportError::DeadlineExceeded));
    }

    #[tokio::test]
    async fn test_background_is_never_cancelled() {
        let ctx = ExportContext::background();
        let waited = tokio::time::timeout(Duration::from_millis(20), ctx.cancelled()).await;
        assert!(waited.is_err());
    }
}
