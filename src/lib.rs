//! drift-gateway: a passthrough REST gateway for the Orion Drift API.
//!
//! Every local route forwards to exactly one upstream route. The gateway
//! adds the `x-api-key` credential, reshapes parameters into the upstream's
//! query/body layout and relays the JSON answer unchanged.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod routing;
pub mod upstream;

pub use config::GatewayConfig;
pub use http::GatewayServer;
pub use lifecycle::Shutdown;
pub use upstream::{UpstreamClient, UpstreamError};
