//! Plain-text terminal front end.

use interview_core::{
    Toast, ToastKind,
    state::{ConnectionStatus, Phase},
    view::{Block, Card, View},
};
use std::io::{self, Write};

/// Draws views somewhere. The runtime calls `render` after every event.
pub trait Renderer {
    fn render(&mut self, view: &View) -> io::Result<()>;
    fn toast(&mut self, toast: &Toast) -> io::Result<()>;
}

/// Appends new transcript blocks to a writer and reprints the status footer
/// only when it changes.
pub struct TerminalRenderer<W: Write> {
    out: W,
    printed: usize,
    last_footer: Option<String>,
}

impl TerminalRenderer<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> TerminalRenderer<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            printed: 0,
            last_footer: None,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn write_block(&mut self, block: &Block) -> io::Result<()> {
        match block {
            Block::User(text) => writeln!(self.out, "> {text}")?,
            Block::Question {
                number: Some(n),
                text,
            } => writeln!(self.out, "Q{n}: {text}")?,
            Block::Question { number: None, text } => writeln!(self.out, "Q: {text}")?,
            Block::Message(text) => writeln!(self.out, "{text}")?,
            Block::Thinking(text) => writeln!(self.out, "... {text}")?,
            Block::Card(card) => self.write_card(card)?,
        }
        Ok(())
    }

    fn write_card(&mut self, card: &Card) -> io::Result<()> {
        writeln!(self.out, "+----------------------------------------")?;
        if let Some(title) = &card.title {
            writeln!(self.out, "| {title}")?;
        }
        for section in &card.sections {
            if let Some(heading) = &section.heading {
                writeln!(self.out, "| [{heading}]")?;
            }
            for line in &section.lines {
                writeln!(self.out, "|   {line}")?;
            }
        }
        writeln!(self.out, "+----------------------------------------")
    }
}

/// The status lines printed under the transcript.
pub fn footer(view: &View) -> String {
    let status = match view.status {
        ConnectionStatus::Connecting => "connecting".to_string(),
        ConnectionStatus::Connected => "connected".to_string(),
        ConnectionStatus::Reconnecting { attempt } => format!("reconnecting (attempt {attempt})"),
        ConnectionStatus::Disconnected => "disconnected".to_string(),
        ConnectionStatus::Lost => "connection lost".to_string(),
    };
    let mut footer = format!("[{status}]");

    if view.progress.total > 0 {
        footer.push_str(&format!(
            " question {}/{} ({:.0}%)",
            view.progress.current,
            view.progress.total,
            view.progress.fraction * 100.0
        ));
    }
    match view.phase {
        Phase::AwaitingInitialResponse | Phase::AwaitingAnswer => footer.push_str(" waiting..."),
        Phase::Idle if view.input_enabled => footer.push_str(" type anything to begin"),
        _ => {}
    }

    if let Some(choice) = view.choice.as_ref().filter(|c| c.selected.is_none()) {
        for (i, option) in choice.options.iter().enumerate() {
            footer.push_str(&format!("\n  [/{}] {}", i + 1, option.label));
        }
    }
    if let Some(seconds) = view.countdown {
        footer.push_str(&format!(
            "\nRestarting in {seconds}s. /cancel to stay, /restart to go now."
        ));
    }
    footer
}

impl<W: Write> Renderer for TerminalRenderer<W> {
    fn render(&mut self, view: &View) -> io::Result<()> {
        if view.blocks.len() < self.printed {
            // The transcript was cleared by a restart.
            writeln!(self.out, "\n=== new conversation ===")?;
            self.printed = 0;
            self.last_footer = None;
        }
        for block in &view.blocks[self.printed..] {
            self.write_block(block)?;
        }
        let wrote_blocks = view.blocks.len() > self.printed;
        self.printed = view.blocks.len();

        let footer = footer(view);
        if wrote_blocks || self.last_footer.as_deref() != Some(footer.as_str()) {
            writeln!(self.out, "{footer}")?;
            self.last_footer = Some(footer);
        }
        self.out.flush()
    }

    fn toast(&mut self, toast: &Toast) -> io::Result<()> {
        let tag = match toast.kind {
            ToastKind::Info => "info",
            ToastKind::Warning => "warning",
            ToastKind::Error => "error",
        };
        writeln!(self.out, "({tag}) {}", toast.message)?;
        self.out.flush()
    }
}
