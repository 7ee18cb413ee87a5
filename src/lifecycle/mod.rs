//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Load config → Validate → Database handle → Bind listener → Serve
//!
//! Shutdown (shutdown.rs):
//!     Signal received → Stop accepting → Drain (bounded) → Release resources → Exit 0
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//! ```
//!
//! # Design Decisions
//! - Ordered startup: config first, then the database handle, then the listener
//! - Resources are released in reverse registration order, exactly once
//! - Draining has a deadline; release happens even if requests are still in flight

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::{Release, ReleaseError, ReleaseReport, Shutdown, ShutdownCoordinator};
pub use signals::TerminationSignal;
pub use startup::{Bootstrap, Exit, StartupError};
