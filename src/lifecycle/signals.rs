//! OS signal handling.
//!
//! # Responsibilities
//! - Register SIGINT and SIGTERM handlers at startup
//! - Translate the first one received into a single shutdown trigger
//!
//! # Design Decisions
//! - Uses Tokio's signal handling (async-safe)
//! - Handlers are installed before anyone waits, so an early signal is
//!   buffered rather than lost
//! - The watcher is consumed by waiting; it resolves at most once

use std::fmt;
use std::io;

use tokio::sync::mpsc;

/// Operator-initiated termination request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatorSignal {
    /// SIGINT / Ctrl+C.
    Interrupt,
    /// SIGTERM.
    Terminate,
}

impl fmt::Display for OperatorSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperatorSignal::Interrupt => f.write_str("SIGINT"),
            OperatorSignal::Terminate => f.write_str("SIGTERM"),
        }
    }
}

/// Programmatic handle that feeds a [`SignalWatcher`].
#[derive(Debug, Clone)]
pub struct SignalTrigger {
    tx: mpsc::Sender<OperatorSignal>,
}

impl SignalTrigger {
    /// Deliver a signal. Returns `false` if one is already buffered or the
    /// watcher is gone.
    pub fn trigger(&self, signal: OperatorSignal) -> bool {
        self.tx.try_send(signal).is_ok()
    }
}

/// Waits for the first termination notification.
#[derive(Debug)]
pub struct SignalWatcher {
    rx: mpsc::Receiver<OperatorSignal>,
}

impl SignalWatcher {
    /// A watcher driven only by the returned trigger.
    pub fn channel() -> (SignalTrigger, SignalWatcher) {
        let (tx, rx) = mpsc::channel(1);
        (SignalTrigger { tx }, SignalWatcher { rx })
    }

    /// A watcher fed by the process's interrupt and terminate signals.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn from_os() -> io::Result<SignalWatcher> {
        let (trigger, watcher) = Self::channel();
        spawn_os_forwarder(trigger)?;
        Ok(watcher)
    }

    /// Resolve with the first signal delivered.
    ///
    /// If every trigger is dropped without delivering anything this never
    /// resolves: without a signal the service keeps running.
    pub async fn await_termination(mut self) -> OperatorSignal {
        match self.rx.recv().await {
            Some(signal) => {
                tracing::info!(%signal, "Shutdown signal received");
                signal
            }
            None => std::future::pending().await,
        }
    }
}

#[cfg(unix)]
fn spawn_os_forwarder(trigger: SignalTrigger) -> io::Result<()> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut interrupt = signal(SignalKind::interrupt())?;
    let mut terminate = signal(SignalKind::terminate())?;

    tokio::spawn(async move {
        let received = tokio::select! {
            Some(()) = interrupt.recv() => OperatorSignal::Interrupt,
            Some(()) = terminate.recv() => OperatorSignal::Terminate,
            else => return,
        };
        trigger.trigger(received);
    });
    Ok(())
}

#[cfg(not(unix))]
fn spawn_os_forwarder(trigger: SignalTrigger) -> io::Result<()> {
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                trigger.trigger(OperatorSignal::Interrupt);
            }
            Err(e) => tracing::error!(error = %e, "Failed to listen for Ctrl+C"),
        }
    });
    Ok(())
}
