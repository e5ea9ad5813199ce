//! Cancellable execution of network calls.
//!
//! Each call gets a fresh [`CancellationToken`]. While the call is in
//! flight a relay task waits for an interrupt or termination signal and
//! cancels that token; the relay is aborted as soon as the call returns, so
//! a late signal never reaches the next call.

use async_trait::async_trait;
use influx_link::{CancellationToken, LinkError};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Notify;
use tokio::task::JoinHandle;

use crate::error::{CLIError, Result};

/// Source of "stop what you are doing" notifications.
#[async_trait]
pub trait SignalSource: Send + Sync {
    /// Resolves when the next signal arrives.
    async fn recv(&self);
}

/// SIGINT, plus SIGTERM on unix.
#[derive(Debug, Default, Clone, Copy)]
pub struct OsSignals;

#[async_trait]
impl SignalSource for OsSignals {
    async fn recv(&self) {
        #[cfg(unix)]
        {
            use tokio::signal::unix::{signal, SignalKind};

            match signal(SignalKind::terminate()) {
                Ok(mut terminate) => {
                    tokio::select! {
                        res = tokio::signal::ctrl_c() => {
                            if let Err(e) = res {
                                log::warn!("[SHELL] Unable to listen for interrupts: {}", e);
                                std::future::pending::<()>().await;
                            }
                        }
                        _ = terminate.recv() => {}
                    }
                    return;
                }
                Err(e) => log::warn!("[SHELL] Unable to listen for SIGTERM: {}", e),
            }
        }

        if let Err(e) = tokio::signal::ctrl_c().await {
            log::warn!("[SHELL] Unable to listen for interrupts: {}", e);
            std::future::pending::<()>().await;
        }
    }
}

/// Signals raised by hand. Only listeners waiting at the moment of
/// [`ManualSignals::raise`] see the signal.
#[derive(Debug, Default)]
pub struct ManualSignals {
    notify: Notify,
}

impl ManualSignals {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn raise(&self) {
        self.notify.notify_waiters();
    }
}

#[async_trait]
impl SignalSource for ManualSignals {
    async fn recv(&self) {
        self.notify.notified().await;
    }
}

/// Background task forwarding one signal into one token.
///
/// Dropping the relay stops the task.
pub struct SignalRelay {
    handle: JoinHandle<()>,
}

impl SignalRelay {
    pub fn spawn(signals: Arc<dyn SignalSource>, token: CancellationToken) -> Self {
        let handle = tokio::spawn(async move {
            tokio::select! {
                _ = signals.recv() => {
                    log::debug!("[SHELL] Signal received, cancelling in-flight request");
                    token.cancel();
                }
                _ = token.cancelled() => {}
            }
        });
        Self { handle }
    }
}

impl Drop for SignalRelay {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Runs one network call at a time under signal-driven cancellation.
#[derive(Clone)]
pub struct ExecutionController {
    signals: Arc<dyn SignalSource>,
}

impl ExecutionController {
    pub fn new(signals: Arc<dyn SignalSource>) -> Self {
        Self { signals }
    }

    /// Controller listening to process signals
    pub fn os() -> Self {
        Self::new(Arc::new(OsSignals))
    }

    /// Run `op` with a token that a signal cancels.
    pub async fn run<T, F, Fut>(&self, op: F) -> Result<T>
    where
        F: FnOnce(CancellationToken) -> Fut,
        Fut: Future<Output = influx_link::Result<T>>,
    {
        let token = CancellationToken::new();
        let _relay = SignalRelay::spawn(Arc::clone(&self.signals), token.clone());

        op(token.clone()).await.map_err(|err| classify(err, &token))
    }
}

/// Turn a transport error into the condition the shell reports.
///
/// Errors without their own text are explained by the token: a cancelled
/// token means the user aborted, anything else means the server sent
/// nothing back.
pub fn classify(err: LinkError, token: &CancellationToken) -> CLIError {
    if !err.is_unlabeled() {
        return CLIError::LinkError(err);
    }
    if token.is_cancelled() {
        CLIError::Aborted
    } else {
        CLIError::NoData
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    /// Raises the signal until the token observes it.
    async fn signal_until_cancelled(
        signals: Arc<ManualSignals>,
        token: CancellationToken,
    ) -> influx_link::Result<u32> {
        loop {
            signals.raise();
            tokio::select! {
                _ = token.cancelled() => return Err(LinkError::Cancelled),
                _ = tokio::time::sleep(Duration::from_millis(5)) => {}
            }
        }
    }

    #[test]
    fn test_classify() {
        let token = CancellationToken::new();
        assert!(matches!(
            classify(LinkError::EmptyResponse, &token),
            CLIError::NoData
        ));
        assert!(matches!(
            classify(LinkError::NetworkError("refused".into()), &token),
            CLIError::LinkError(_)
        ));

        token.cancel();
        assert!(matches!(
            classify(LinkError::Cancelled, &token),
            CLIError::Aborted
        ));
        assert!(matches!(
            classify(LinkError::EmptyResponse, &token),
            CLIError::Aborted
        ));
    }

    #[tokio::test]
    async fn test_signal_in_flight_aborts() {
        let signals = Arc::new(ManualSignals::new());
        let controller = ExecutionController::new(signals.clone());

        let result = controller
            .run(|token| signal_until_cancelled(signals.clone(), token))
            .await;

        let err = result.unwrap_err();
        assert!(matches!(err, CLIError::Aborted));
        assert_eq!(err.to_string(), "aborted by user");
    }

    #[tokio::test]
    async fn test_late_signal_does_not_leak() {
        let signals = Arc::new(ManualSignals::new());
        let controller = ExecutionController::new(signals.clone());

        let first = controller.run(|_| async { Ok(1) }).await.unwrap();
        assert_eq!(first, 1);

        signals.raise();

        let second = controller
            .run(|token| async move {
                tokio::time::sleep(Duration::from_millis(20)).await;
                if token.is_cancelled() {
                    Err(LinkError::Cancelled)
                } else {
                    Ok(2)
                }
            })
            .await
            .unwrap();
        assert_eq!(second, 2);
    }

    #[tokio::test]
    async fn test_empty_reply_is_no_data() {
        let controller = ExecutionController::new(Arc::new(ManualSignals::new()));
        let err = controller
            .run(|_| async { Err::<(), _>(LinkError::EmptyResponse) })
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "no data received");
    }
}
