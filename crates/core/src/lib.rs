pub mod controller;
pub mod event;
pub mod protocol;
pub mod state;
pub mod view;

use protocol::ClientMessage;
use state::CountdownId;

/// Represents commands that the controller issues to an external runtime.
///
/// This enum is the primary API for decoupling the conversation logic from the
/// runtime's execution of side effects (sending frames, running timers,
/// reconnecting, or flashing a notice at the user).
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Transmit a message to the server.
    Send(ClientMessage),
    /// Start the restart countdown, replacing any running one.
    StartCountdown { id: CountdownId, seconds: u32 },
    /// Stop the countdown with this id.
    CancelCountdown(CountdownId),
    /// Drop the current server session and open a fresh one.
    Reconnect,
    /// Show a transient notice.
    Toast(Toast),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Info,
    Warning,
    Error,
}

/// A short-lived notice shown to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub kind: ToastKind,
    pub message: String,
}

impl Toast {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            kind: ToastKind::Info,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            kind: ToastKind::Warning,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: ToastKind::Error,
            message: message.into(),
        }
    }
}
