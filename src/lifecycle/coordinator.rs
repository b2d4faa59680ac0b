//! Lifecycle coordinator.
//!
//! Launches the listener, waits for the first of {listener failure,
//! operator signal}, then drives the graceful-then-forced shutdown.
//!
//! ```text
//! spawn(listener.serve) ──┐
//!                         ├─ select! ─┬─ ListenerFailure → Stopped (fatal)
//! signals.await_term() ───┘           └─ OperatorSignal  → Draining
//!                                             │
//!                     request_stop(now + grace) ok → Stopped (graceful)
//!                                             │ err
//!                                    force_close ok → Stopped (forced)
//!                                             │ err
//!                                             └──────→ Stopped (fatal)
//! ```

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::lifecycle::conduit;
use crate::lifecycle::signals::{OperatorSignal, SignalWatcher};
use crate::lifecycle::state::{
    GracePeriod, Outcome, ServiceState, ServiceStatus, ShutdownReport, ShutdownTrigger,
};
use crate::net::{ListenError, Listener};
use crate::observability::logging::PhaseGuard;

const DEFAULT_FORCE_CLOSE_TIMEOUT: Duration = Duration::from_secs(1);

/// Extra time past the listener's own force-close bound, so its error
/// (with the remaining connection count) arrives before ours fires.
const FORCE_CLOSE_SLACK: Duration = Duration::from_millis(250);

/// Owns the service state and runs the service from launch to `Stopped`.
///
/// `run` consumes the coordinator, so a stopped instance cannot be reused.
pub struct Coordinator<L: Listener> {
    listener: Arc<L>,
    grace_period: GracePeriod,
    force_close_timeout: Duration,
    status: watch::Sender<ServiceStatus>,
    history: Vec<ServiceState>,
}

impl<L: Listener> Coordinator<L> {
    pub fn new(listener: Arc<L>, grace_period: GracePeriod) -> Self {
        let (status, _) = watch::channel(ServiceStatus {
            state: ServiceState::Starting,
            local_addr: None,
        });
        Self {
            listener,
            grace_period,
            force_close_timeout: DEFAULT_FORCE_CLOSE_TIMEOUT,
            status,
            history: vec![ServiceState::Starting],
        }
    }

    /// The listener's forced-close bound. The coordinator waits this long
    /// plus a small slack before giving up on the listener itself.
    pub fn with_force_close_timeout(mut self, timeout: Duration) -> Self {
        self.force_close_timeout = timeout;
        self
    }

    /// Subscribe to state changes.
    pub fn status(&self) -> watch::Receiver<ServiceStatus> {
        self.status.subscribe()
    }

    /// Run until the service stops, returning how it stopped.
    pub async fn run(mut self, signals: SignalWatcher) -> ShutdownReport {
        let _phase = PhaseGuard::enter("lifecycle");

        let (trigger, serving) = self.await_trigger(signals).await;

        let outcome = match trigger {
            ShutdownTrigger::ListenerFailure(error) => {
                tracing::error!(error = %error, "Listener failed");
                Outcome::ListenerFailed(error)
            }
            ShutdownTrigger::OperatorSignal(signal) => {
                self.advance(ServiceState::Draining, None);
                self.drain(signal).await
            }
        };

        self.advance(ServiceState::Stopped, None);
        if !serving.is_finished() {
            serving.abort();
        }

        ShutdownReport {
            outcome,
            history: self.history,
        }
    }

    /// Launch the listener and wait for exactly one trigger.
    async fn await_trigger(
        &mut self,
        signals: SignalWatcher,
    ) -> (ShutdownTrigger, JoinHandle<()>) {
        let (reporter, mut errors) = conduit::channel();
        let (ready_tx, mut ready) = oneshot::channel::<SocketAddr>();

        let listener = Arc::clone(&self.listener);
        let serving = tokio::spawn(async move {
            let error = match listener.serve(ready_tx).await {
                Ok(()) => ListenError::Closed,
                Err(e) => e,
            };
            reporter.report(error);
        });

        let termination = signals.await_termination();
        tokio::pin!(termination);

        let mut awaiting_ready = true;
        let trigger = loop {
            tokio::select! {
                biased;
                error = errors.recv() => {
                    // No value means the listener task died without reporting.
                    break ShutdownTrigger::ListenerFailure(error.unwrap_or(ListenError::Closed));
                }
                signal = &mut termination => {
                    break ShutdownTrigger::OperatorSignal(signal);
                }
                bound = &mut ready, if awaiting_ready => {
                    awaiting_ready = false;
                    if let Ok(addr) = bound {
                        self.advance(ServiceState::Running, Some(addr));
                    }
                }
            }
        };

        (trigger, serving)
    }

    /// Timed drain, escalating to a forced close.
    async fn drain(&self, signal: OperatorSignal) -> Outcome {
        let _phase = PhaseGuard::enter("drain");
        let grace_period = self.grace_period.as_duration();
        tracing::info!(%signal, ?grace_period, "Start shutdown");

        let deadline = Instant::now() + grace_period;
        let drained = tokio::time::timeout_at(deadline, self.listener.request_stop(deadline))
            .await
            .unwrap_or(Err(ListenError::DrainTimeout { active: None }));

        let drain_error = match drained {
            Ok(()) => {
                tracing::info!("Graceful shutdown complete");
                return Outcome::Graceful { signal };
            }
            Err(e) => e,
        };

        tracing::warn!(
            error = %drain_error,
            ?grace_period,
            "Graceful shutdown did not complete in time, forcing close"
        );

        let bound = self.force_close_timeout + FORCE_CLOSE_SLACK;
        let forced = tokio::time::timeout(bound, self.listener.force_close())
            .await
            .unwrap_or(Err(ListenError::ForceClose { active: None }));

        match forced {
            Ok(()) => Outcome::Forced {
                signal,
                drain_error,
            },
            Err(error) => {
                tracing::error!(error = %error, "Could not stop server");
                Outcome::ForceCloseFailed { signal, error }
            }
        }
    }

    fn advance(&mut self, next: ServiceState, local_addr: Option<SocketAddr>) {
        let current = self.status.borrow().state;
        debug_assert!(
            current.can_advance_to(next),
            "illegal transition {current} -> {next}"
        );

        self.history.push(next);
        self.status.send_modify(|status| {
            status.state = next;
            if local_addr.is_some() {
                status.local_addr = local_addr;
            }
        });
        tracing::debug!(from = %current, to = %next, "Service state changed");
    }
}
