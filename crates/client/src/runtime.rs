//! The client event loop.
//!
//! Every event goes through one [`Runtime`]: the controller decides what
//! happens, and the runtime carries out the resulting commands (socket writes,
//! timers, reconnects, notices) before redrawing.

use crate::{
    config::Config,
    connection::{self, ConnectionHandle},
    countdown::Countdown,
    input,
    terminal::{Renderer, TerminalRenderer},
};
use anyhow::Result;
use interview_core::{Command, controller::Controller, event::Event, view};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, watch};
use tracing::{debug, info};

pub struct Runtime<R: Renderer> {
    controller: Controller,
    renderer: R,
    connection: ConnectionHandle,
    events: mpsc::Sender<Event>,
    conversation_active: watch::Sender<bool>,
    countdown: Option<Countdown>,
    tick: Duration,
}

impl<R: Renderer> Runtime<R> {
    pub fn new(
        controller: Controller,
        renderer: R,
        connection: ConnectionHandle,
        events: mpsc::Sender<Event>,
        conversation_active: watch::Sender<bool>,
    ) -> Self {
        Self {
            controller,
            renderer,
            connection,
            events,
            conversation_active,
            countdown: None,
            tick: Duration::from_secs(1),
        }
    }

    pub fn controller(&self) -> &Controller {
        &self.controller
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    /// Handles one event and redraws.
    pub async fn step(&mut self, event: Event) -> Result<()> {
        let commands = self.controller.handle(event);
        self.conversation_active
            .send_replace(self.controller.state().conversation_active);
        for command in commands {
            self.execute(command).await?;
        }
        self.render()
    }

    fn render(&mut self) -> Result<()> {
        self.renderer.render(&view::render(&self.controller))?;
        Ok(())
    }

    async fn execute(&mut self, command: Command) -> Result<()> {
        match command {
            Command::Send(msg) => self.connection.send(msg).await?,
            Command::StartCountdown { id, seconds } => {
                debug!(?id, seconds, "Starting countdown");
                self.countdown = Some(Countdown::start(id, seconds, self.tick, self.events.clone()));
            }
            Command::CancelCountdown(id) => {
                if self.countdown.as_ref().is_some_and(|c| c.id() == id) {
                    self.countdown = None;
                }
            }
            Command::Reconnect => self.connection.reconnect().await?,
            Command::Toast(toast) => self.renderer.toast(&toast)?,
        }
        Ok(())
    }

    /// Processes events until the user quits or presses Ctrl+C.
    pub async fn run(
        mut self,
        mut events: mpsc::Receiver<Event>,
        mut quit: oneshot::Receiver<()>,
    ) -> Result<()> {
        self.render()?;
        loop {
            tokio::select! {
                Some(event) = events.recv() => self.step(event).await?,
                _ = &mut quit => {
                    info!("Input closed. Exiting.");
                    break;
                }
                _ = tokio::signal::ctrl_c() => {
                    info!("Received Ctrl+C. Exiting.");
                    break;
                }
            }
        }
        self.countdown = None;
        // The connection task may already be gone.
        let _ = self.connection.shutdown().await;
        Ok(())
    }
}

/// Wires the connection, input reader and terminal together and runs until exit.
pub async fn run(config: Config) -> Result<()> {
    let (events_tx, events_rx) = mpsc::channel(64);
    let (active_tx, active_rx) = watch::channel(false);

    info!(url = %config.server_url, "Starting interview client");
    let (connection, connection_task) = connection::spawn(
        config.server_url.clone(),
        config.reconnect,
        events_tx.clone(),
        active_rx,
    );

    let (quit_tx, quit_rx) = oneshot::channel();
    input::spawn_reader(tokio::io::stdin(), events_tx.clone(), quit_tx);

    let runtime = Runtime::new(
        Controller::new(config.countdown_secs),
        TerminalRenderer::stdout(),
        connection,
        events_tx,
        active_tx,
    );
    runtime.run(events_rx, quit_rx).await?;

    connection_task.await?;
    Ok(())
}
