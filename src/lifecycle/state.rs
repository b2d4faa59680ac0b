//! Lifecycle state and shutdown results.

use std::fmt;
use std::net::SocketAddr;
use std::time::Duration;

use crate::lifecycle::signals::OperatorSignal;
use crate::net::ListenError;

/// Where the service is in its lifecycle.
///
/// ```text
/// Starting → Running → Draining → Stopped
///     │          │                   ▲
///     └──────────┴── listener failed ┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceState {
    /// Listener launched, bind not yet confirmed.
    Starting,
    /// Accept loop is running.
    Running,
    /// Shutdown signal received; in-flight requests are finishing.
    Draining,
    /// Terminal.
    Stopped,
}

impl ServiceState {
    /// Whether `next` is a legal successor of `self`. No state is re-entered.
    pub fn can_advance_to(self, next: ServiceState) -> bool {
        use ServiceState::*;
        matches!(
            (self, next),
            (Starting, Running | Draining | Stopped) | (Running, Draining | Stopped) | (Draining, Stopped)
        )
    }

    pub fn is_terminal(self) -> bool {
        self == ServiceState::Stopped
    }
}

impl fmt::Display for ServiceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ServiceState::Starting => "starting",
            ServiceState::Running => "running",
            ServiceState::Draining => "draining",
            ServiceState::Stopped => "stopped",
        };
        f.write_str(name)
    }
}

/// Published view of the coordinator's state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServiceStatus {
    pub state: ServiceState,
    /// Bound address, known once the listener reports ready.
    pub local_addr: Option<SocketAddr>,
}

/// The event that moves the service out of its steady state.
#[derive(Debug)]
pub enum ShutdownTrigger {
    ListenerFailure(ListenError),
    OperatorSignal(OperatorSignal),
}

/// Bound on how long draining may last before connections are forced closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GracePeriod(Duration);

impl GracePeriod {
    pub fn new(duration: Duration) -> Self {
        Self(duration)
    }

    pub fn as_duration(&self) -> Duration {
        self.0
    }
}

impl From<Duration> for GracePeriod {
    fn from(duration: Duration) -> Self {
        Self(duration)
    }
}

/// How the service stopped.
#[derive(Debug)]
pub enum Outcome {
    /// Every in-flight request finished within the grace period.
    Graceful { signal: OperatorSignal },
    /// Draining timed out; remaining connections were closed.
    Forced {
        signal: OperatorSignal,
        drain_error: ListenError,
    },
    /// The listener failed before any shutdown was requested.
    ListenerFailed(ListenError),
    /// Draining timed out and the forced close failed as well.
    ForceCloseFailed {
        signal: OperatorSignal,
        error: ListenError,
    },
}

impl Outcome {
    pub fn is_fatal(&self) -> bool {
        matches!(self, Outcome::ListenerFailed(_) | Outcome::ForceCloseFailed { .. })
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Graceful { signal } => write!(f, "graceful shutdown after {signal}"),
            Outcome::Forced { signal, drain_error } => {
                write!(f, "forced shutdown after {signal}: {drain_error}")
            }
            Outcome::ListenerFailed(error) => write!(f, "listener failed: {error}"),
            Outcome::ForceCloseFailed { signal, error } => {
                write!(f, "could not stop server after {signal}: {error}")
            }
        }
    }
}

/// What the coordinator hands back once it reaches [`ServiceState::Stopped`].
#[derive(Debug)]
pub struct ShutdownReport {
    pub outcome: Outcome,
    /// Every state visited, in order, starting with `Starting`.
    pub history: Vec<ServiceState>,
}

impl ShutdownReport {
    /// Process exit code: 0 for graceful or forced-but-clean, 1 otherwise.
    pub fn exit_code(&self) -> u8 {
        if self.outcome.is_fatal() {
            1
        } else {
            0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ServiceState::*;

    #[test]
    fn running_is_never_reentered() {
        assert!(!Draining.can_advance_to(Running));
        assert!(!Stopped.can_advance_to(Running));
        assert!(!Running.can_advance_to(Running));
    }

    #[test]
    fn stopped_is_terminal() {
        for next in [Starting, Running, Draining, Stopped] {
            assert!(!Stopped.can_advance_to(next));
        }
        assert!(Stopped.is_terminal());
    }

    #[test]
    fn listener_failure_skips_draining() {
        assert!(Starting.can_advance_to(Stopped));
        assert!(Running.can_advance_to(Stopped));
    }

    #[test]
    fn exit_codes_follow_fatality() {
        let report = |outcome| ShutdownReport {
            outcome,
            history: vec![Starting, Stopped],
        };

        let signal = OperatorSignal::Terminate;
        assert_eq!(report(Outcome::Graceful { signal }).exit_code(), 0);
        assert_eq!(
            report(Outcome::Forced {
                signal,
                drain_error: ListenError::DrainTimeout { active: Some(1) },
            })
            .exit_code(),
            0
        );
        assert_eq!(report(Outcome::ListenerFailed(ListenError::Closed)).exit_code(), 1);
        assert_eq!(
            report(Outcome::ForceCloseFailed {
                signal,
                error: ListenError::ForceClose { active: None },
            })
            .exit_code(),
            1
        );
    }
}
