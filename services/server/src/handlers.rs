//! Plain HTTP handlers.

use axum::Json;
use serde::Serialize;

#[derive(Serialize, Debug)]
pub struct Health {
    pub status: &'static str,
    pub message: &'static str,
    pub version: &'static str,
    pub features: Vec<&'static str>,
}

/// Liveness check. Always reports the same document.
pub async fn health() -> Json<Health> {
    Json(Health {
        status: "active",
        message: "Interview server is up. Connect to /ws to start a conversation.",
        version: env!("CARGO_PKG_VERSION"),
        features: vec![
            "Follow-up questions",
            "Personality reveal",
            "Mind reading",
            "Interactive choice",
        ],
    })
}
