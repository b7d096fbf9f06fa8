//! Owns the WebSocket to the interview server.
//!
//! The manager runs as its own task. It forwards text frames and lifecycle
//! reports to the event loop, transmits outbound messages on request, and
//! reconnects after an abnormal close while a conversation is active.

use anyhow::Result;
use futures_util::{SinkExt, StreamExt, stream::SplitSink};
use interview_core::{
    event::{ConnectionEvent, Event},
    protocol::ClientMessage,
};
use std::time::Duration;
use tokio::{
    net::TcpStream,
    sync::{mpsc, watch},
    task::JoinHandle,
};
use tokio_tungstenite::{
    MaybeTlsStream, WebSocketStream, connect_async,
    tungstenite::protocol::{Message, frame::coding::CloseCode},
};
use tracing::{Instrument, debug, error, info, warn};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Bounded, fixed-delay reconnection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            delay: Duration::from_secs(3),
        }
    }
}

impl ReconnectPolicy {
    /// Delay before the next attempt, or `None` once the bound is reached.
    pub fn next_delay(&self, attempts_so_far: u32) -> Option<Duration> {
        (attempts_so_far < self.max_attempts).then_some(self.delay)
    }
}

/// Requests accepted by the connection task.
#[derive(Debug)]
pub enum ConnectionCommand {
    Send(ClientMessage),
    /// Close the current socket (if any) and open a fresh one.
    Reconnect,
    Shutdown,
}

/// Cheap handle for talking to the connection task.
#[derive(Clone, Debug)]
pub struct ConnectionHandle {
    tx: mpsc::Sender<ConnectionCommand>,
}

impl ConnectionHandle {
    pub fn new(tx: mpsc::Sender<ConnectionCommand>) -> Self {
        Self { tx }
    }

    /// Queues a message for the socket. Whether it was actually written is
    /// reported back as a `SendFailed` event.
    pub async fn send(&self, msg: ClientMessage) -> Result<()> {
        self.tx.send(ConnectionCommand::Send(msg)).await?;
        Ok(())
    }

    pub async fn reconnect(&self) -> Result<()> {
        self.tx.send(ConnectionCommand::Reconnect).await?;
        Ok(())
    }

    pub async fn shutdown(&self) -> Result<()> {
        self.tx.send(ConnectionCommand::Shutdown).await?;
        Ok(())
    }
}

/// How a connected session ended.
#[derive(Debug)]
enum Closure {
    Normal,
    Abnormal(String),
    Restart,
    Shutdown,
}

pub struct ConnectionManager {
    url: String,
    policy: ReconnectPolicy,
    events: mpsc::Sender<Event>,
    commands: mpsc::Receiver<ConnectionCommand>,
    conversation_active: watch::Receiver<bool>,
}

/// Spawns the connection task and returns a handle to it.
///
/// `conversation_active` decides whether an abnormal close is retried.
pub fn spawn(
    url: String,
    policy: ReconnectPolicy,
    events: mpsc::Sender<Event>,
    conversation_active: watch::Receiver<bool>,
) -> (ConnectionHandle, JoinHandle<()>) {
    let (tx, commands) = mpsc::channel(32);
    let span = tracing::info_span!("connection", %url);
    let manager = ConnectionManager {
        url,
        policy,
        events,
        commands,
        conversation_active,
    };
    let task = tokio::spawn(manager.run().instrument(span));
    (ConnectionHandle::new(tx), task)
}

impl ConnectionManager {
    pub async fn run(mut self) {
        let mut attempts = 0u32;
        loop {
            let closure = match self.connect().await {
                None => break,
                Some(Ok(stream)) => {
                    attempts = 0;
                    info!("Connected to interview server.");
                    self.emit(ConnectionEvent::Connected).await;
                    self.drive(stream).await
                }
                Some(Err(reason)) => Closure::Abnormal(reason),
            };

            match closure {
                Closure::Shutdown => break,
                Closure::Restart => continue,
                Closure::Normal => {
                    info!("Server closed the connection.");
                    self.emit(ConnectionEvent::Closed).await;
                    if !self.wait_for_reconnect().await {
                        break;
                    }
                }
                Closure::Abnormal(reason) => {
                    warn!(attempts, %reason, "Connection closed abnormally.");
                    if attempts == 0 {
                        self.emit(ConnectionEvent::Failed(reason)).await;
                    }
                    if !*self.conversation_active.borrow() {
                        self.emit(ConnectionEvent::Closed).await;
                        attempts = 0;
                        if !self.wait_for_reconnect().await {
                            break;
                        }
                        continue;
                    }
                    match self.policy.next_delay(attempts) {
                        Some(delay) => {
                            attempts += 1;
                            info!(attempt = attempts, ?delay, "Scheduling reconnect.");
                            self.emit(ConnectionEvent::Reconnecting {
                                attempt: attempts,
                                max_attempts: self.policy.max_attempts,
                            })
                            .await;
                            if !self.pause(delay).await {
                                break;
                            }
                        }
                        None => {
                            error!(attempts, "Giving up on reconnecting.");
                            self.emit(ConnectionEvent::Lost).await;
                            attempts = 0;
                            if !self.wait_for_reconnect().await {
                                break;
                            }
                        }
                    }
                }
            }
        }
        info!("Connection task finished.");
    }

    /// Opens a socket while still answering commands. Returns `None` when the
    /// task should stop.
    async fn connect(&mut self) -> Option<Result<WsStream, String>> {
        let connecting = connect_async(self.url.clone());
        tokio::pin!(connecting);
        loop {
            tokio::select! {
                result = &mut connecting => {
                    return Some(result.map(|(stream, _)| stream).map_err(|e| e.to_string()));
                }
                command = self.commands.recv() => match command {
                    Some(ConnectionCommand::Send(_)) => self.reject_send().await,
                    Some(ConnectionCommand::Reconnect) => debug!("Already connecting"),
                    Some(ConnectionCommand::Shutdown) | None => return None,
                },
            }
        }
    }

    /// Pumps one open socket until it closes or the task is told to stop.
    async fn drive(&mut self, stream: WsStream) -> Closure {
        let (mut sink, mut source) = stream.split();
        loop {
            tokio::select! {
                frame = source.next() => match frame {
                    Some(Ok(Message::Text(text))) => {
                        self.emit(Event::Frame(text.as_str().to_owned())).await;
                    }
                    Some(Ok(Message::Close(frame))) => {
                        debug!(?frame, "Received close frame");
                        return match frame {
                            Some(frame) if frame.code != CloseCode::Normal => {
                                Closure::Abnormal(format!("closed with code {}", frame.code))
                            }
                            _ => Closure::Normal,
                        };
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => return Closure::Abnormal(e.to_string()),
                    None => return Closure::Abnormal("connection dropped without a close frame".to_string()),
                },
                command = self.commands.recv() => match command {
                    Some(ConnectionCommand::Send(msg)) => {
                        if let Err(e) = send_msg(&mut sink, &msg).await {
                            error!(error = ?e, "Failed to send message to server.");
                            self.emit(ConnectionEvent::SendFailed).await;
                            return Closure::Abnormal(e.to_string());
                        }
                    }
                    Some(ConnectionCommand::Reconnect) => {
                        info!("Reconnecting on request.");
                        let _ = sink.send(Message::Close(None)).await;
                        return Closure::Restart;
                    }
                    Some(ConnectionCommand::Shutdown) | None => {
                        let _ = sink.send(Message::Close(None)).await;
                        return Closure::Shutdown;
                    }
                },
            }
        }
    }

    /// Sleeps between attempts. Returns `false` when the task should stop.
    async fn pause(&mut self, delay: Duration) -> bool {
        let sleep = tokio::time::sleep(delay);
        tokio::pin!(sleep);
        loop {
            tokio::select! {
                _ = &mut sleep => return true,
                command = self.commands.recv() => match command {
                    Some(ConnectionCommand::Send(_)) => self.reject_send().await,
                    Some(ConnectionCommand::Reconnect) => return true,
                    Some(ConnectionCommand::Shutdown) | None => return false,
                },
            }
        }
    }

    /// Idles while disconnected. Returns `false` when the task should stop.
    async fn wait_for_reconnect(&mut self) -> bool {
        loop {
            match self.commands.recv().await {
                Some(ConnectionCommand::Send(_)) => self.reject_send().await,
                Some(ConnectionCommand::Reconnect) => return true,
                Some(ConnectionCommand::Shutdown) | None => return false,
            }
        }
    }

    async fn reject_send(&self) {
        warn!("Dropping message: not connected.");
        self.emit(ConnectionEvent::SendFailed).await;
    }

    async fn emit(&self, event: impl Into<Event>) {
        if self.events.send(event.into()).await.is_err() {
            debug!("Event loop has gone away; dropping event.");
        }
    }
}

/// A helper function to serialize and send a `ClientMessage` to the server.
pub(crate) async fn send_msg(
    sink: &mut SplitSink<WsStream, Message>,
    msg: &ClientMessage,
) -> Result<()> {
    let serialized = serde_json::to_string(msg)?;
    sink.send(Message::Text(serialized.into())).await?;
    Ok(())
}
