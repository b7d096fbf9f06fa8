//! WebSocket interview sessions.
//!
//! - `session`: connection lifecycle and the per-connection interview loop.

pub mod session;

pub use session::ws_handler;
