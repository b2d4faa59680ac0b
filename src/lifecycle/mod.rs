//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (coordinator.rs):
//!     spawn listener → Starting → (ready) → Running
//!
//! Trigger (conduit.rs, signals.rs):
//!     listener error → ErrorConduit ─┐
//!     SIGTERM/SIGINT → SignalWatcher ─┴→ first one wins
//!
//! Shutdown (coordinator.rs):
//!     Draining → stop accepting → drain until deadline → [force close] → Stopped
//! ```
//!
//! # Design Decisions
//! - The coordinator is the only writer of service state
//! - Listener errors reach the coordinator only through the conduit
//! - Shutdown has one fixed deadline: forced close after it, never a retry

pub mod conduit;
pub mod coordinator;
pub mod signals;
pub mod state;

pub use conduit::{ErrorConduit, ErrorReporter};
pub use coordinator::Coordinator;
pub use signals::{OperatorSignal, SignalTrigger, SignalWatcher};
pub use state::{GracePeriod, Outcome, ServiceState, ServiceStatus, ShutdownReport, ShutdownTrigger};
