//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware)
//!     → request.rs (request ID assigned and echoed)
//!     → server.rs dispatch (bind args against the endpoint row)
//!     → upstream client (one outbound call)
//!     → 200 + upstream JSON, or response.rs (mapped error)
//! ```

pub mod debug;
pub mod request;
pub mod response;
pub mod server;

pub use request::X_REQUEST_ID;
pub use response::{ErrorBody, GatewayError};
pub use server::{AppState, GatewayServer, UnsupportedMethod};
