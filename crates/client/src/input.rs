//! Line-oriented user input.
//!
//! Plain text is submitted as-is. Lines starting with `/` are commands:
//! `/1`, `/2`, ... pick an option of the pending choice, and `/cancel`,
//! `/restart` and `/quit` do what they say.

use interview_core::event::Event;
use tokio::{
    io::{AsyncBufReadExt, AsyncRead, BufReader},
    sync::{mpsc, oneshot},
    task::JoinHandle,
};
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq)]
pub enum Input {
    Event(Event),
    Quit,
    Empty,
}

pub fn parse_line(line: &str) -> Input {
    let line = line.trim();
    if line.is_empty() {
        return Input::Empty;
    }
    let Some(command) = line.strip_prefix('/') else {
        return Input::Event(Event::Submit(line.to_string()));
    };

    match command.trim().to_ascii_lowercase().as_str() {
        "cancel" => Input::Event(Event::CancelCountdown),
        "restart" => Input::Event(Event::Restart),
        "quit" | "exit" => Input::Quit,
        other => match other.parse::<usize>() {
            Ok(n) if n >= 1 => Input::Event(Event::SelectOption(n - 1)),
            _ => Input::Event(Event::UnknownCommand(other.to_string())),
        },
    }
}

/// Reads lines until EOF or `/quit`, forwarding them as events. `quit` fires
/// when reading stops.
pub fn spawn_reader<R>(
    reader: R,
    events: mpsc::Sender<Event>,
    quit: oneshot::Sender<()>,
) -> JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut lines = BufReader::new(reader).lines();
        loop {
            let line = match lines.next_line().await {
                Ok(Some(line)) => line,
                Ok(None) => {
                    debug!("Input closed");
                    break;
                }
                Err(e) => {
                    warn!(error = %e, "Failed to read input");
                    break;
                }
            };
            match parse_line(&line) {
                Input::Event(event) => {
                    if events.send(event).await.is_err() {
                        break;
                    }
                }
                Input::Quit => break,
                Input::Empty => {}
            }
        }
        let _ = quit.send(());
    })
}
