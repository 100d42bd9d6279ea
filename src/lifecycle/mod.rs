//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Load config → Validate → Build upstream client → Bind listener → Serve
//!
//! Shutdown (shutdown.rs):
//!     Signal received → Stop accepting → Drain in-flight requests → Exit
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//! ```
//!
//! # Design Decisions
//! - Fail fast: a missing credential stops startup before the listener binds
//! - In-flight upstream calls are not cancelled; they finish during drain

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
