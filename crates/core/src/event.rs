//! Events consumed by the conversation controller.
//!
//! Everything that can change the session (socket frames, connection status,
//! user actions, and timer callbacks) arrives as one of these, in order, through
//! a single channel.

use crate::{controller::PromptId, state::CountdownId};

/// Connection lifecycle reports from the connection manager.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionEvent {
    /// The socket is open. The retry counter starts over.
    Connected,
    /// The socket closed abnormally and another attempt is about to be made.
    Reconnecting { attempt: u32, max_attempts: u32 },
    /// The socket closed and no reconnect is pending.
    Closed,
    /// All reconnect attempts failed. Terminal until a manual restart.
    Lost,
    /// A connection attempt failed or the socket dropped unexpectedly.
    Failed(String),
    /// A message was dropped because the socket was not open.
    SendFailed,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// A raw text frame from the server.
    Frame(String),
    Connection(ConnectionEvent),
    /// The user submitted free text.
    Submit(String),
    /// The user clicked an option on a choice prompt.
    SelectChoice { prompt: PromptId, option_id: String },
    /// The user picked an option of the pending prompt by zero-based position.
    SelectOption(usize),
    /// The user typed a `/` command that does not exist.
    UnknownCommand(String),
    /// The user stopped the restart countdown.
    CancelCountdown,
    /// The user asked to start over.
    Restart,
    CountdownTick { id: CountdownId, remaining: u32 },
    CountdownElapsed(CountdownId),
}

impl From<ConnectionEvent> for Event {
    fn from(event: ConnectionEvent) -> Self {
        Event::Connection(event)
    }
}
