//! HTTP relay server

mod handler;
pub mod server;
mod streaming;

pub use server::{build_router, run_server, RelayState};
