//! Reference interview server.
//!
//! Serves a health document on `/` and runs one scripted interview per
//! WebSocket connection on `/ws`. The `server` binary is a thin wrapper
//! around this library.

pub mod config;
pub mod handlers;
pub mod router;
pub mod script;
pub mod state;
pub mod ws;
