//! Shared application state.

use crate::{config::Config, script::QuestionSource};
use std::sync::Arc;

/// Created once at startup and handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub questions: Arc<dyn QuestionSource>,
    pub config: Arc<Config>,
}
