//! Outward-facing surface of the agent gateway.
//!
//! Provides:
//! - Wire protocol (SSE frames + request/response DTOs)
//! - `Gateway` - resolve, execute, normalize, deliver
//! - HTTP routes (feature: http)

pub mod gateway;
pub mod protocol;

#[cfg(feature = "http")]
pub mod http;

pub use gateway::{Gateway, GatewayConfig};
pub use protocol::{AgentReply, AgentRequest};
