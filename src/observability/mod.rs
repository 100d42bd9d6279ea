//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Router and upstream client produce:
//!     → logging.rs (structured log events via tracing)
//!     → metrics.rs (per-operation counters and latency histograms)
//!
//! Consumers:
//!     → stdout (fmt subscriber)
//!     → Metrics endpoint (Prometheus scrape, opt-in)
//! ```
//!
//! # Design Decisions
//! - Request ID flows through every log line of a call
//! - Metrics are cheap (recorded once per dispatched call)
//! - The credential is never a log field

pub mod logging;
pub mod metrics;
