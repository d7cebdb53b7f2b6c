//! Interrupt handling for open-ended stream runs.
//!
//! The interrupt listener never touches the output sink. It flips a shared
//! token; the stream loop observes the token while waiting for the next unit,
//! stops, and closes the sink it owns.

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::request::HarvestRequest;

/// Cooperative cancellation flag observed by the stream loop.
#[derive(Debug, Clone)]
pub struct ShutdownToken {
    rx: watch::Receiver<bool>,
}

/// Sets the paired [`ShutdownToken`].
#[derive(Debug, Clone)]
pub struct ShutdownTrigger {
    tx: watch::Sender<bool>,
}

/// Creates a connected trigger and token.
pub fn shutdown_channel() -> (ShutdownTrigger, ShutdownToken) {
    let (tx, rx) = watch::channel(false);
    (ShutdownTrigger { tx }, ShutdownToken { rx })
}

impl ShutdownTrigger {
    pub fn trigger(&self) {
        self.tx.send_replace(true);
    }
}

impl ShutdownToken {
    /// A token that is never cancelled.
    pub fn never() -> Self {
        let (_, rx) = watch::channel(false);
        Self { rx }
    }

    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once the token is cancelled.
    ///
    /// If every trigger is dropped without firing, this never resolves.
    pub async fn cancelled(&mut self) {
        let closed = self.rx.wait_for(|cancelled| *cancelled).await.is_err();
        if closed {
            std::future::pending::<()>().await;
        }
    }
}

/// Installs the Ctrl+C listener for runs that need one.
pub struct ShutdownCoordinator {
    listener: Option<JoinHandle<()>>,
    token: ShutdownToken,
}

impl ShutdownCoordinator {
    /// Prepares shutdown handling for `request`.
    ///
    /// Only unbounded stream runs get an interrupt listener; batch runs and
    /// bounded streams end on their own and keep the default signal behavior.
    /// Must be called from within a Tokio runtime.
    pub fn for_request(request: &HarvestRequest) -> Self {
        let (trigger, token) = shutdown_channel();

        if !request.is_unbounded_stream() {
            return Self {
                listener: None,
                token,
            };
        }

        let listener = tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    info!("Received Ctrl+C, stopping harvest");
                    trigger.trigger();
                }
                Err(e) => {
                    error!(error = %e, "Failed to listen for Ctrl+C");
                }
            }
        });

        Self {
            listener: Some(listener),
            token,
        }
    }

    pub fn has_listener(&self) -> bool {
        self.listener.is_some()
    }

    pub fn token(&self) -> ShutdownToken {
        self.token.clone()
    }
}

impl Drop for ShutdownCoordinator {
    fn drop(&mut self) {
        if let Some(listener) = self.listener.take() {
            listener.abort();
        }
    }
}
