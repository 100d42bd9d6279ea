//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! ENDPOINTS (static table, one row per operation)
//!     → server.rs registers one local route per row
//!     → args.rs binds path/query/body values against the row
//!     → RequestEnvelope handed to the upstream client
//! ```
//!
//! # Design Decisions
//! - Routes are data, not hand-written handlers
//! - Immutable at runtime (no locks, freely shared)
//! - Every local route maps to exactly one upstream route

pub mod args;
pub mod table;

pub use args::{ArgumentError, CallArgs, ParamValue};
pub use table::{endpoint, find, BodyKind, Endpoint, OperationId, ParamKind, ParamSpec, ParamTarget, ENDPOINTS};
