//! Manages one interview over a WebSocket connection.

use crate::{
    script::{self, CHOICE_REVEAL, CHOICE_SKIP, Reading},
    state::AppState,
};
use anyhow::Result;
use axum::{
    extract::{
        State,
        ws::{CloseFrame, Message, WebSocket, WebSocketUpgrade, close_code},
    },
    response::Response,
};
use futures_util::{SinkExt, StreamExt, stream::SplitSink};
use interview_core::protocol::{ClientMessage, ServerMessage};
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

/// Axum handler to upgrade an HTTP connection to a WebSocket.
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> Response {
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

/// Runs one interview until the client leaves or the closing screen has been sent.
#[instrument(name = "ws_session", skip_all, fields(session_id))]
async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let session_id: u32 = rand::random();
    tracing::Span::current().record("session_id", session_id);
    info!("Interview session started.");

    let (mut socket_tx, mut socket_rx) = socket.split();
    let mut interview = Interview::new(state);

    while let Some(msg_result) = socket_rx.next().await {
        let text = match msg_result {
            Ok(Message::Text(text)) => text,
            Ok(Message::Close(_)) => {
                info!("Client sent close frame.");
                break;
            }
            Ok(_) => continue,
            Err(e) => {
                error!("Error receiving from client WebSocket: {:?}", e);
                break;
            }
        };

        match interview.respond(&text, &mut socket_tx).await {
            Ok(Flow::Continue) => {}
            Ok(Flow::Finished) => {
                info!("Interview finished. Closing connection.");
                let _ = socket_tx
                    .send(Message::Close(Some(CloseFrame {
                        code: close_code::NORMAL,
                        reason: "interview complete".into(),
                    })))
                    .await;
                break;
            }
            Err(e) => {
                warn!(error = ?e, "Session terminated with error.");
                let _ = send_msg(
                    &mut socket_tx,
                    &error_message("Oops, something went sideways. Mind trying that again?"),
                )
                .await;
                break;
            }
        }
    }
    info!("Interview session ended.");
}

#[derive(Debug, PartialEq, Eq)]
enum Flow {
    Continue,
    Finished,
}

/// Per-connection interview progress.
struct Interview {
    state: Arc<AppState>,
    /// Everything the user said, starting with the opening message.
    answers: Vec<String>,
    follow_ups: u32,
}

impl Interview {
    fn new(state: Arc<AppState>) -> Self {
        Self {
            state,
            answers: Vec::new(),
            follow_ups: 0,
        }
    }

    async fn respond(
        &mut self,
        text: &str,
        socket_tx: &mut SplitSink<WebSocket, Message>,
    ) -> Result<Flow> {
        let msg = match serde_json::from_str::<ClientMessage>(text) {
            Ok(msg) => msg,
            Err(e) => {
                debug!(error = %e, "Could not decode client message");
                send_msg(socket_tx, &error_message("Hmm, didn't catch that. Try again?")).await?;
                return Ok(Flow::Continue);
            }
        };

        match msg {
            ClientMessage::Initial { message } => {
                let message = message.trim();
                if message.is_empty() {
                    send_msg(
                        socket_tx,
                        &error_message("Come on, give me something real to work with!"),
                    )
                    .await?;
                    return Ok(Flow::Continue);
                }
                info!("Received opening message.");
                self.answers.clear();
                self.follow_ups = 0;
                self.ask_next(message, socket_tx).await?;
            }
            ClientMessage::Answer { message } => {
                let message = message.trim();
                if self.follow_ups >= self.state.config.max_follow_ups {
                    self.answers.push(message.to_string());
                    self.closing_sequence(socket_tx).await?;
                } else {
                    self.ask_next(message, socket_tx).await?;
                }
            }
            ClientMessage::ChoiceResponse { choice_id, .. } => {
                let reading = Reading::from_answers(&self.answers);
                match choice_id.as_deref() {
                    Some(CHOICE_REVEAL) => {
                        send_msg(socket_tx, &reading.ultimate_reveal()).await?;
                        self.pause(4).await;
                        send_msg(socket_tx, &reading.finale()).await?;
                    }
                    Some(CHOICE_SKIP) => {
                        send_msg(socket_tx, &script::respectful_ending()).await?;
                    }
                    other => {
                        warn!(choice = ?other, "Unknown choice");
                        send_msg(socket_tx, &error_message("Pick one of the options, please."))
                            .await?;
                        return Ok(Flow::Continue);
                    }
                }
                return Ok(Flow::Finished);
            }
        }
        Ok(Flow::Continue)
    }

    async fn ask_next(
        &mut self,
        message: &str,
        socket_tx: &mut SplitSink<WebSocket, Message>,
    ) -> Result<()> {
        self.answers.push(message.to_string());
        self.follow_ups += 1;
        let question = self
            .state
            .questions
            .follow_up(message, self.follow_ups)
            .await?;
        debug!(number = self.follow_ups, "Asking follow-up");
        send_msg(
            socket_tx,
            &ServerMessage::FollowUp {
                question: Some(question),
                number: Some(self.follow_ups),
                total: Some(self.state.config.max_follow_ups),
            },
        )
        .await
    }

    /// The scripted reveal that ends with the interactive choice.
    async fn closing_sequence(&self, socket_tx: &mut SplitSink<WebSocket, Message>) -> Result<()> {
        let reading = Reading::from_answers(&self.answers);
        info!(profile = reading.profile.name, "All questions answered.");

        send_msg(
            socket_tx,
            &ServerMessage::Complete {
                message: Some("Thanks, we have got your data.".to_string()),
            },
        )
        .await?;
        for (beat, halves) in [
            ("Wait...", 3),
            ("I'm analyzing what you just told me...", 2),
            ("Okay, I think I figured you out. This is scary accurate...", 4),
        ] {
            self.pause(halves).await;
            send_msg(
                socket_tx,
                &ServerMessage::Thinking {
                    message: Some(beat.to_string()),
                },
            )
            .await?;
        }

        self.pause(3).await;
        send_msg(socket_tx, &reading.personality_reveal()).await?;
        self.pause(6).await;
        send_msg(socket_tx, &reading.mind_reading()).await?;
        self.pause(4).await;
        send_msg(socket_tx, &reading.secret_unlock()).await?;
        self.pause(4).await;
        send_msg(socket_tx, &script::interactive_choice()).await
    }

    /// Sleeps for a number of half phase-delays.
    async fn pause(&self, halves: u32) {
        let delay = self.state.config.phase_delay * halves / 2;
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
}

fn error_message(text: &str) -> ServerMessage {
    ServerMessage::Error {
        message: Some(text.to_string()),
    }
}

/// A helper function to serialize and send a `ServerMessage` to the client.
pub(crate) async fn send_msg(
    socket_tx: &mut SplitSink<WebSocket, Message>,
    msg: &ServerMessage,
) -> Result<()> {
    let serialized = serde_json::to_string(msg)?;
    socket_tx.send(Message::Text(serialized.into())).await?;
    Ok(())
}
