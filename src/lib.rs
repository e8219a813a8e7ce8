//! chat-relay: single-endpoint streaming relay for chat completions
//!
//! Accepts a POST with an arbitrary JSON chat-completion payload, forces
//! `stream: true`, forwards it to the configured upstream provider with a
//! server-held bearer credential, and copies the upstream SSE byte stream
//! back to the caller as it arrives.

pub mod config;
pub mod relay;

pub use config::AppConfig;
pub use relay::server::{build_router, run_server, RelayState};
