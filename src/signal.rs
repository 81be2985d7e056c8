//! Signal handling for interrupting a long scan.
//!
//! SIGINT and SIGTERM raise a process-wide flag. The aggregator checks it
//! through a [`ShutdownToken`] between two mask levels, so an interrupted
//! run stops on a level boundary and writes nothing.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::signal::unix::{signal, SignalKind};
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Global flag indicating whether a shutdown has been requested.
static SHUTDOWN_REQUESTED: AtomicBool = AtomicBool::new(false);

/// Check if shutdown has been requested.
#[inline]
pub fn is_shutdown_requested() -> bool {
    SHUTDOWN_REQUESTED.load(Ordering::Relaxed)
}

/// Request a shutdown (can be called from signal handlers or tests).
pub fn request_shutdown() {
    SHUTDOWN_REQUESTED.store(true, Ordering::Relaxed);
}

/// Reset shutdown flag (mainly for testing).
#[cfg(test)]
pub fn reset_shutdown() {
    SHUTDOWN_REQUESTED.store(false, Ordering::Relaxed);
}

/// Listens for SIGINT and SIGTERM while alive.
///
/// Must be created inside a tokio runtime. The listener task is aborted
/// when the guard is dropped.
pub struct ShutdownGuard {
    listener: JoinHandle<()>,
}

impl ShutdownGuard {
    /// Start listening for signals.
    ///
    /// If handlers cannot be registered (e.g., in restricted environments),
    /// the guard is still created but interruption is disabled.
    pub fn new() -> Self {
        let listener = tokio::spawn(async move {
            let sigint = signal(SignalKind::interrupt())
                .inspect_err(|e| warn!("Failed to register SIGINT handler: {}", e))
                .ok();
            let sigterm = signal(SignalKind::terminate())
                .inspect_err(|e| warn!("Failed to register SIGTERM handler: {}", e))
                .ok();

            let name = match (sigint, sigterm) {
                (Some(mut int), Some(mut term)) => {
                    tokio::select! {
                        _ = int.recv() => "SIGINT",
                        _ = term.recv() => "SIGTERM",
                    }
                }
                (Some(mut int), None) => {
                    int.recv().await;
                    "SIGINT"
                }
                (None, Some(mut term)) => {
                    term.recv().await;
                    "SIGTERM"
                }
                (None, None) => {
                    warn!("No signal handlers registered - interruption disabled");
                    return;
                }
            };

            info!("Received {}, stopping after the current mask level...", name);
            request_shutdown();
        });

        Self { listener }
    }
}

impl Default for ShutdownGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for ShutdownGuard {
    fn drop(&mut self) {
        self.listener.abort();
    }
}

/// A token that can be shared with the scan to check for shutdown.
#[derive(Clone)]
pub struct ShutdownToken {
    flag: Arc<AtomicBool>,
}

impl ShutdownToken {
    /// Create a new shutdown token.
    pub fn new() -> Self {
        Self {
            flag: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Check if this token or the process has been asked to stop.
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed) || is_shutdown_requested()
    }

    /// Request cancellation on this token.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }
}

impl Default for ShutdownToken {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shutdown_flag() {
        reset_shutdown();
        assert!(!is_shutdown_requested());
        request_shutdown();
        assert!(is_shutdown_requested());
        reset_shutdown();
        assert!(!is_shutdown_requested());
    }

    #[test]
    fn test_shutdown_token() {
        let token = ShutdownToken::new();
        token.cancel();
        assert!(token.is_cancelled());
    }

    #[test]
    fn test_shutdown_token_clone_shares_flag() {
        let token1 = ShutdownToken::new();
        let token2 = token1.clone();
        token1.cancel();
        assert!(token2.is_cancelled());
    }
}
