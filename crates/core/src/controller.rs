//! The conversation controller.
//!
//! A single [`Controller`] owns the session state for one client. It consumes
//! [`Event`]s one at a time, updates the state and transcript, and returns the
//! [`Command`]s the runtime must carry out. It performs no I/O of its own.

use crate::{
    Command, Toast,
    event::{ConnectionEvent, Event},
    protocol::{ClientMessage, ServerMessage},
    state::{ConnectionStatus, CountdownId, Phase, SessionState},
    view::{Block, Card},
};
use tracing::{debug, info, warn};

/// Seconds before the closing screens restart the session on their own.
pub const DEFAULT_COUNTDOWN_SECS: u32 = 10;

/// Identifies one interactive choice prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PromptId(pub u64);

/// A selectable option of a choice prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChoiceItem {
    pub id: String,
    pub label: String,
}

/// The latest choice prompt and what, if anything, was picked on it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveChoice {
    pub id: PromptId,
    pub options: Vec<ChoiceItem>,
    pub selected: Option<String>,
}

#[derive(Debug)]
pub struct Controller {
    state: SessionState,
    transcript: Vec<Block>,
    choice: Option<ActiveChoice>,
    countdown_secs: u32,
    countdown_remaining: Option<u32>,
    next_prompt_id: u64,
    next_countdown_id: u64,
}

impl Default for Controller {
    fn default() -> Self {
        Self::new(DEFAULT_COUNTDOWN_SECS)
    }
}

impl Controller {
    pub fn new(countdown_secs: u32) -> Self {
        Self {
            state: SessionState::default(),
            transcript: Vec::new(),
            choice: None,
            countdown_secs,
            countdown_remaining: None,
            next_prompt_id: 0,
            next_countdown_id: 0,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn transcript(&self) -> &[Block] {
        &self.transcript
    }

    pub fn choice(&self) -> Option<&ActiveChoice> {
        self.choice.as_ref()
    }

    pub fn countdown_remaining(&self) -> Option<u32> {
        self.countdown_remaining
    }

    /// The prompt and option id at a zero-based position of the pending choice.
    pub fn option_at(&self, index: usize) -> Option<(PromptId, String)> {
        let choice = self.choice.as_ref().filter(|c| c.selected.is_none())?;
        let option = choice.options.get(index)?;
        Some((choice.id, option.id.clone()))
    }

    /// Entry point for every event.
    pub fn handle(&mut self, event: Event) -> Vec<Command> {
        match event {
            Event::Frame(text) => self.handle_frame(&text),
            Event::Connection(event) => self.handle_connection(event),
            Event::Submit(text) => self.submit(&text),
            Event::SelectChoice { prompt, option_id } => self.select_choice(prompt, &option_id),
            Event::SelectOption(index) => match self.option_at(index) {
                Some((prompt, option_id)) => self.select_choice(prompt, &option_id),
                None => vec![Command::Toast(Toast::warning("There is no such option."))],
            },
            Event::UnknownCommand(command) => vec![Command::Toast(Toast::warning(format!(
                "Unknown command /{command}. Try /1, /cancel, /restart or /quit."
            )))],
            Event::CancelCountdown => self.cancel_countdown(),
            Event::Restart => self.restart(),
            Event::CountdownTick { id, remaining } => {
                if self.state.countdown == Some(id) {
                    self.countdown_remaining = Some(remaining);
                }
                vec![]
            }
            Event::CountdownElapsed(id) => self.countdown_elapsed(id),
        }
    }

    /// Decodes a raw frame and dispatches it. Malformed frames are dropped.
    pub fn handle_frame(&mut self, text: &str) -> Vec<Command> {
        match ServerMessage::parse(text) {
            Ok(msg) => self.dispatch(msg),
            Err(e) => {
                warn!(error = %e, "Dropping malformed message from server.");
                vec![Command::Toast(Toast::error(
                    "Received a message I couldn't understand.",
                ))]
            }
        }
    }

    /// Applies one server message.
    pub fn dispatch(&mut self, msg: ServerMessage) -> Vec<Command> {
        debug!(kind = msg.kind(), "Dispatching server message");
        match msg {
            ServerMessage::FollowUp {
                question,
                number,
                total,
            } => {
                self.state.set_progress(number, total);
                match non_blank(question) {
                    Some(text) => self.transcript.push(Block::Question { number, text }),
                    None => warn!("follow_up arrived without a question"),
                }
                self.state.conversation_active = true;
                self.state.awaiting_choice = false;
                self.state.phase = Phase::AskingQuestion;
                vec![]
            }
            ServerMessage::Complete { message } => {
                self.state.complete_progress();
                if let Some(text) = non_blank(message) {
                    self.transcript.push(Block::Message(text));
                }
                vec![]
            }
            ServerMessage::Thinking { message } => {
                if let Some(text) = non_blank(message) {
                    self.transcript.push(Block::Thinking(text));
                }
                vec![]
            }
            ServerMessage::PersonalityReveal { bonus } => {
                self.push_card(bonus.as_ref().map(Card::from), "personality_reveal");
                vec![]
            }
            ServerMessage::MindReading { data } => {
                self.push_card(data.as_ref().map(Card::from), "mind_reading");
                vec![]
            }
            ServerMessage::SecretUnlock { data } => {
                self.push_card(data.as_ref().map(Card::from), "secret_unlock");
                vec![]
            }
            ServerMessage::InteractiveChoice { data } => {
                let Some(prompt) = data else {
                    warn!("interactive_choice arrived without data");
                    return vec![];
                };
                let options: Vec<ChoiceItem> = prompt
                    .options
                    .iter()
                    .filter_map(|option| {
                        let id = option.id.clone()?;
                        let label = option
                            .text
                            .clone()
                            .filter(|text| !text.trim().is_empty())
                            .unwrap_or_else(|| id.clone());
                        Some(ChoiceItem { id, label })
                    })
                    .collect();
                if options.is_empty() {
                    warn!("interactive_choice has no selectable options");
                    return vec![];
                }

                self.push_card(Some(Card::from(&prompt)), "interactive_choice");
                self.next_prompt_id += 1;
                self.choice = Some(ActiveChoice {
                    id: PromptId(self.next_prompt_id),
                    options,
                    selected: None,
                });
                self.state.awaiting_choice = true;
                vec![]
            }
            ServerMessage::UltimateReveal { data } => {
                self.push_card(data.as_ref().map(Card::from), "ultimate_reveal");
                vec![]
            }
            ServerMessage::Finale { data } => {
                self.push_card(data.as_ref().map(Card::from), "finale");
                self.enter_terminal_sequence()
            }
            ServerMessage::RespectfulEnding { data } => {
                self.push_card(data.as_ref().map(Card::from), "respectful_ending");
                self.enter_terminal_sequence()
            }
            ServerMessage::Error { message } => {
                let message = non_blank(message)
                    .unwrap_or_else(|| "Something went wrong. Please try again.".to_string());
                self.return_turn();
                vec![Command::Toast(Toast::error(message))]
            }
        }
    }

    /// Sends the user's text as the opening message or as an answer.
    pub fn submit(&mut self, text: &str) -> Vec<Command> {
        let text = text.trim();
        if text.is_empty() {
            return vec![Command::Toast(Toast::warning("Please type something first."))];
        }
        if !self.state.accepts_input() {
            let hint = if self.state.awaiting_choice {
                "Pick one of the options first."
            } else if self.state.awaiting_response() {
                "Hang on, still waiting for a reply."
            } else if self.state.connection == ConnectionStatus::Lost {
                "Connection lost. Use /restart to try again."
            } else {
                "This conversation is over. Use /restart to start a new one."
            };
            return vec![Command::Toast(Toast::warning(hint))];
        }

        let message = match self.state.phase {
            Phase::Idle => {
                self.state.conversation_active = true;
                self.state.phase = Phase::AwaitingInitialResponse;
                ClientMessage::Initial {
                    message: text.to_string(),
                }
            }
            _ => {
                self.state.phase = Phase::AwaitingAnswer;
                ClientMessage::Answer {
                    message: text.to_string(),
                }
            }
        };
        self.transcript.push(Block::User(text.to_string()));
        vec![Command::Send(message)]
    }

    /// Records the first valid selection on a prompt. Anything after that is a no-op.
    pub fn select_choice(&mut self, prompt: PromptId, option_id: &str) -> Vec<Command> {
        let Some(choice) = self.choice.as_mut() else {
            debug!("Ignoring selection: no choice prompt");
            return vec![];
        };
        if choice.id != prompt || choice.selected.is_some() {
            debug!(?prompt, "Ignoring selection on a stale or answered prompt");
            return vec![];
        }
        let Some(option) = choice.options.iter().find(|o| o.id == option_id).cloned() else {
            debug!(option_id, "Ignoring selection of an unknown option");
            return vec![];
        };

        choice.selected = Some(option.id.clone());
        self.state.awaiting_choice = false;
        self.state.phase = Phase::AwaitingAnswer;
        self.transcript.push(Block::User(option.label.clone()));
        info!(choice = %option.id, "Choice submitted");
        vec![Command::Send(ClientMessage::ChoiceResponse {
            message: option.label,
            choice_id: Some(option.id),
        })]
    }

    /// Stops the restart countdown. The pending restart will not fire.
    pub fn cancel_countdown(&mut self) -> Vec<Command> {
        let Some(id) = self.state.countdown.take() else {
            return vec![];
        };
        self.countdown_remaining = None;
        vec![
            Command::CancelCountdown(id),
            Command::Toast(Toast::info("Auto-restart cancelled. Use /restart to start over.")),
        ]
    }

    /// Clears the conversation and asks for a fresh server session.
    pub fn restart(&mut self) -> Vec<Command> {
        let mut commands = Vec::new();
        if let Some(id) = self.state.countdown.take() {
            commands.push(Command::CancelCountdown(id));
        }
        info!("Restarting conversation");
        self.state.reset();
        self.transcript.clear();
        self.choice = None;
        self.countdown_remaining = None;
        commands.push(Command::Reconnect);
        commands
    }

    fn countdown_elapsed(&mut self, id: CountdownId) -> Vec<Command> {
        if self.state.countdown != Some(id) {
            debug!(?id, "Ignoring a cancelled countdown");
            return vec![];
        }
        self.state.countdown = None;
        self.restart()
    }

    pub fn handle_connection(&mut self, event: ConnectionEvent) -> Vec<Command> {
        match event {
            ConnectionEvent::Connected => {
                let resumed = matches!(
                    self.state.connection,
                    ConnectionStatus::Reconnecting { .. }
                );
                self.state.connected = true;
                self.state.reconnect_attempts = 0;
                self.state.connection = ConnectionStatus::Connected;
                // A fresh server session never saw the pending message.
                if resumed && self.state.awaiting_response() {
                    info!(phase = ?self.state.phase, "Reconnected with a reply pending");
                    self.return_turn();
                    return vec![Command::Toast(Toast::warning(
                        "Reconnected. Your last message may not have arrived, please send it again.",
                    ))];
                }
                vec![]
            }
            ConnectionEvent::Reconnecting {
                attempt,
                max_attempts,
            } => {
                self.state.connected = false;
                self.state.reconnect_attempts = attempt;
                self.state.connection = ConnectionStatus::Reconnecting { attempt };
                vec![Command::Toast(Toast::warning(format!(
                    "Connection dropped. Reconnecting ({attempt}/{max_attempts})..."
                )))]
            }
            ConnectionEvent::Closed => {
                self.state.connected = false;
                self.state.connection = ConnectionStatus::Disconnected;
                vec![]
            }
            ConnectionEvent::Lost => {
                self.state.connected = false;
                self.state.connection = ConnectionStatus::Lost;
                self.state.conversation_active = false;
                self.state.awaiting_choice = false;
                vec![Command::Toast(Toast::error(
                    "Connection lost. Use /restart to try again.",
                ))]
            }
            ConnectionEvent::Failed(reason) => {
                vec![Command::Toast(Toast::error(format!("Connection error: {reason}")))]
            }
            ConnectionEvent::SendFailed => {
                self.return_turn();
                vec![Command::Toast(Toast::error(
                    "Not connected. Your message was not sent.",
                ))]
            }
        }
    }

    /// Hands the turn back to the user after a failed request.
    fn return_turn(&mut self) {
        match self.state.phase {
            Phase::AwaitingInitialResponse => {
                self.state.phase = Phase::Idle;
                self.state.conversation_active = false;
            }
            Phase::AwaitingAnswer if self.state.current_question > 0 => {
                self.state.phase = Phase::AskingQuestion;
            }
            _ => {}
        }
    }

    fn enter_terminal_sequence(&mut self) -> Vec<Command> {
        self.state.phase = Phase::TerminalSequence;
        self.state.conversation_active = false;
        self.state.awaiting_choice = false;

        let mut commands = Vec::new();
        if let Some(previous) = self.state.countdown.take() {
            commands.push(Command::CancelCountdown(previous));
        }
        self.next_countdown_id += 1;
        let id = CountdownId(self.next_countdown_id);
        self.state.countdown = Some(id);
        self.countdown_remaining = Some(self.countdown_secs);
        commands.push(Command::StartCountdown {
            id,
            seconds: self.countdown_secs,
        });
        commands
    }

    fn push_card(&mut self, card: Option<Card>, kind: &str) {
        match card.filter(|card| !card.is_empty()) {
            Some(card) => self.transcript.push(Block::Card(card)),
            None => warn!(kind, "Message carried no displayable content"),
        }
    }
}

fn non_blank(text: Option<String>) -> Option<String> {
    text.filter(|text| !text.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn frame(value: serde_json::Value) -> Event {
        Event::Frame(value.to_string())
    }

    fn sends(commands: &[Command]) -> Vec<&ClientMessage> {
        commands
            .iter()
            .filter_map(|command| match command {
                Command::Send(msg) => Some(msg),
                _ => None,
            })
            .collect()
    }

    fn connected() -> Controller {
        let mut controller = Controller::default();
        controller.handle(Event::Connection(ConnectionEvent::Connected));
        controller
    }

    /// A controller that has sent its answer to the last question.
    fn after_last_answer() -> Controller {
        let mut controller = connected();
        controller.handle(Event::Submit("I love building things".into()));
        controller.handle(frame(json!({"type": "follow_up", "question": "Why?", "number": 3, "total": 3})));
        controller.handle(Event::Submit("Because it works".into()));
        controller
    }

    #[test]
    fn test_follow_up_updates_progress_and_enables_input() {
        let mut controller = connected();
        controller.handle(Event::Submit("hello".into()));
        assert!(!controller.state().accepts_input());

        let commands = controller.handle(frame(json!({"type": "follow_up", "number": 2, "total": 3})));
        assert!(commands.is_empty());
        assert_eq!(controller.state().current_question, 2);
        assert_eq!(controller.state().total_questions, 3);
        assert_eq!(controller.state().phase, Phase::AskingQuestion);
        assert!(controller.state().accepts_input());
    }

    #[test]
    fn test_first_submission_is_initial_then_answers() {
        let mut controller = connected();
        let commands = controller.handle(Event::Submit("  I hate studying  ".into()));
        assert_eq!(
            sends(&commands),
            vec![&ClientMessage::Initial {
                message: "I hate studying".into()
            }]
        );
        assert_eq!(controller.state().phase, Phase::AwaitingInitialResponse);
        assert!(controller.state().conversation_active);

        controller.handle(frame(json!({"type": "follow_up", "question": "Hate?", "number": 1, "total": 3})));
        let commands = controller.handle(Event::Submit("Yes, hate".into()));
        assert_eq!(
            sends(&commands),
            vec![&ClientMessage::Answer {
                message: "Yes, hate".into()
            }]
        );
        assert_eq!(controller.state().phase, Phase::AwaitingAnswer);
        assert_eq!(
            controller.transcript(),
            &[
                Block::User("I hate studying".into()),
                Block::Question {
                    number: Some(1),
                    text: "Hate?".into()
                },
                Block::User("Yes, hate".into()),
            ]
        );
    }

    #[test]
    fn test_empty_submission_is_rejected() {
        let mut controller = connected();
        let commands = controller.handle(Event::Submit("   ".into()));
        assert!(sends(&commands).is_empty());
        assert!(matches!(commands.as_slice(), [Command::Toast(_)]));
        assert_eq!(controller.state().phase, Phase::Idle);
    }

    #[test]
    fn test_submission_while_awaiting_response_is_rejected() {
        let mut controller = connected();
        controller.handle(Event::Submit("first".into()));
        let commands = controller.handle(Event::Submit("second".into()));
        assert!(sends(&commands).is_empty());
        assert_eq!(controller.transcript().len(), 1);
    }

    #[test]
    fn test_every_tag_survives_missing_fields() {
        let tags = [
            "follow_up",
            "complete",
            "thinking",
            "personality_reveal",
            "mind_reading",
            "secret_unlock",
            "interactive_choice",
            "ultimate_reveal",
            "finale",
            "respectful_ending",
            "error",
        ];
        for tag in tags {
            let mut controller = after_last_answer();
            controller.handle(frame(json!({"type": tag})));
            controller.handle(frame(json!({"type": tag, "data": null, "bonus": 5, "message": []})));
            let fraction = controller.state().progress_fraction();
            assert!((0.0..=1.0).contains(&fraction), "{tag}");
        }
    }

    #[test]
    fn test_malformed_frame_is_dropped_with_toast() {
        let mut controller = connected();
        let before = controller.state().clone();
        let commands = controller.handle(Event::Frame("{not json".into()));
        assert!(matches!(commands.as_slice(), [Command::Toast(_)]));
        assert_eq!(controller.state(), &before);
        assert!(controller.transcript().is_empty());
    }

    #[test]
    fn test_interactive_choice_accepts_one_selection() {
        let mut controller = after_last_answer();
        controller.handle(frame(json!({
            "type": "interactive_choice",
            "data": {"options": [{"id": "a", "text": "Show me"}, {"id": "b", "text": "Nah"}]}
        })));
        assert!(controller.state().awaiting_choice);
        assert!(!controller.state().accepts_input());

        let prompt = controller.choice().unwrap().id;
        let commands = controller.handle(Event::SelectChoice {
            prompt,
            option_id: "a".into(),
        });
        assert_eq!(
            sends(&commands),
            vec![&ClientMessage::ChoiceResponse {
                message: "Show me".into(),
                choice_id: Some("a".into()),
            }]
        );
        assert!(!controller.state().awaiting_choice);
        assert_eq!(controller.state().phase, Phase::AwaitingAnswer);

        for option_id in ["a", "b"] {
            let commands = controller.handle(Event::SelectChoice {
                prompt,
                option_id: option_id.into(),
            });
            assert!(commands.is_empty());
        }
        assert_eq!(controller.choice().unwrap().selected.as_deref(), Some("a"));
    }

    #[test]
    fn test_choice_selection_ignores_unknown_and_stale() {
        let mut controller = after_last_answer();
        controller.handle(frame(json!({
            "type": "interactive_choice",
            "data": {"options": [{"id": "reveal"}, {"text": "no id"}]}
        })));
        let choice = controller.choice().unwrap().clone();
        assert_eq!(choice.options.len(), 1);
        assert_eq!(choice.options[0].label, "reveal");

        assert!(
            controller
                .select_choice(PromptId(choice.id.0 + 1), "reveal")
                .is_empty()
        );
        assert!(controller.select_choice(choice.id, "skip").is_empty());
        assert!(controller.state().awaiting_choice);

        assert_eq!(controller.option_at(0), Some((choice.id, "reveal".into())));
        assert_eq!(controller.option_at(1), None);
    }

    #[test]
    fn test_select_option_by_position() {
        let mut controller = after_last_answer();
        controller.handle(frame(json!({
            "type": "interactive_choice",
            "data": {"options": [{"id": "reveal", "text": "Show me"}, {"id": "skip", "text": "Nah, I'm good"}]}
        })));
        let commands = controller.handle(Event::SelectOption(1));
        assert_eq!(
            sends(&commands),
            vec![&ClientMessage::ChoiceResponse {
                message: "Nah, I'm good".into(),
                choice_id: Some("skip".into()),
            }]
        );

        let commands = controller.handle(Event::SelectOption(0));
        assert!(sends(&commands).is_empty());
    }

    #[test]
    fn test_choice_without_options_does_not_block_input() {
        let mut controller = after_last_answer();
        controller.handle(frame(json!({"type": "interactive_choice", "data": {"options": []}})));
        assert!(controller.choice().is_none());
        assert!(!controller.state().awaiting_choice);
    }

    #[test]
    fn test_finale_starts_countdown_and_elapse_restarts() {
        let mut controller = after_last_answer();
        let commands = controller.handle(frame(json!({"type": "finale", "data": {"title": "EXPERIENCE COMPLETE"}})));
        let [Command::StartCountdown { id, seconds }] = commands.as_slice() else {
            panic!("expected a countdown, got {commands:?}");
        };
        assert_eq!(*seconds, DEFAULT_COUNTDOWN_SECS);
        assert_eq!(controller.state().phase, Phase::TerminalSequence);
        assert!(!controller.state().conversation_active);

        let id = *id;
        controller.handle(Event::CountdownTick { id, remaining: 4 });
        assert_eq!(controller.countdown_remaining(), Some(4));

        let commands = controller.handle(Event::CountdownElapsed(id));
        assert_eq!(commands, vec![Command::Reconnect]);
        assert_eq!(controller.state().phase, Phase::Idle);
        assert!(controller.transcript().is_empty());
        assert_eq!(controller.state().current_question, 0);
    }

    #[test]
    fn test_cancelled_countdown_never_restarts() {
        let mut controller = after_last_answer();
        let commands = controller.handle(frame(json!({"type": "respectful_ending", "data": {"message": "Respect."}})));
        let Some(Command::StartCountdown { id, .. }) = commands.first().cloned() else {
            panic!("expected a countdown");
        };

        let commands = controller.handle(Event::CancelCountdown);
        assert_eq!(commands.first(), Some(&Command::CancelCountdown(id)));
        assert_eq!(controller.state().countdown, None);

        assert!(controller.handle(Event::CountdownTick { id, remaining: 1 }).is_empty());
        assert!(controller.handle(Event::CountdownElapsed(id)).is_empty());
        assert_eq!(controller.state().phase, Phase::TerminalSequence);
        assert!(!controller.transcript().is_empty());
    }

    #[test]
    fn test_only_one_countdown_at_a_time() {
        let mut controller = after_last_answer();
        let first = controller.handle(frame(json!({"type": "finale"})));
        let Some(Command::StartCountdown { id: first_id, .. }) = first.first().cloned() else {
            panic!("expected a countdown");
        };
        let second = controller.handle(frame(json!({"type": "respectful_ending"})));
        assert_eq!(second.first(), Some(&Command::CancelCountdown(first_id)));
        let Some(Command::StartCountdown { id: second_id, .. }) = second.get(1).cloned() else {
            panic!("expected a replacement countdown");
        };
        assert_ne!(first_id, second_id);
        assert_eq!(controller.state().countdown, Some(second_id));

        // The replaced countdown's elapse is ignored.
        assert!(controller.handle(Event::CountdownElapsed(first_id)).is_empty());
    }

    #[test]
    fn test_manual_restart_cancels_countdown() {
        let mut controller = after_last_answer();
        let commands = controller.handle(frame(json!({"type": "finale"})));
        let Some(Command::StartCountdown { id, .. }) = commands.first().cloned() else {
            panic!("expected a countdown");
        };
        let commands = controller.handle(Event::Restart);
        assert_eq!(commands, vec![Command::CancelCountdown(id), Command::Reconnect]);
        assert!(controller.state().connected);
    }

    #[test]
    fn test_server_error_returns_turn() {
        let mut controller = connected();
        controller.handle(Event::Submit("hi".into()));
        let commands = controller.handle(frame(json!({"type": "error", "message": "Give me something real"})));
        assert_eq!(
            commands,
            vec![Command::Toast(Toast::error("Give me something real"))]
        );
        assert_eq!(controller.state().phase, Phase::Idle);
        assert!(controller.state().accepts_input());

        controller.handle(Event::Submit("I love coding".into()));
        controller.handle(frame(json!({"type": "follow_up", "question": "Love?", "number": 1, "total": 3})));
        controller.handle(Event::Submit("yes".into()));
        controller.handle(frame(json!({"type": "error"})));
        assert_eq!(controller.state().phase, Phase::AskingQuestion);
    }

    #[test]
    fn test_send_failure_returns_turn() {
        let mut controller = connected();
        controller.handle(Event::Submit("hi".into()));
        let commands = controller.handle(Event::Connection(ConnectionEvent::SendFailed));
        assert!(matches!(commands.as_slice(), [Command::Toast(_)]));
        assert_eq!(controller.state().phase, Phase::Idle);
    }

    #[test]
    fn test_connection_lifecycle() {
        let mut controller = connected();
        controller.handle(Event::Submit("hi".into()));

        controller.handle(Event::Connection(ConnectionEvent::Reconnecting {
            attempt: 2,
            max_attempts: 5,
        }));
        assert_eq!(controller.state().reconnect_attempts, 2);
        assert!(!controller.state().connected);
        assert_eq!(
            controller.state().connection,
            ConnectionStatus::Reconnecting { attempt: 2 }
        );

        controller.handle(Event::Connection(ConnectionEvent::Connected));
        assert_eq!(controller.state().reconnect_attempts, 0);
        assert!(controller.state().connected);

        controller.handle(Event::Connection(ConnectionEvent::Lost));
        assert_eq!(controller.state().connection, ConnectionStatus::Lost);
        assert!(!controller.state().conversation_active);
        assert!(!controller.state().accepts_input());

        // A manual restart is the way out.
        assert_eq!(controller.handle(Event::Restart), vec![Command::Reconnect]);
        controller.handle(Event::Connection(ConnectionEvent::Connected));
        assert!(controller.state().accepts_input());
    }

    #[test]
    fn test_reconnect_hands_back_pending_answer() {
        let mut controller = connected();
        controller.handle(Event::Submit("hi".into()));
        controller.handle(frame(json!({"type": "follow_up", "question": "Why?", "number": 1, "total": 3})));
        controller.handle(Event::Submit("Because".into()));
        controller.handle(Event::Connection(ConnectionEvent::Reconnecting {
            attempt: 1,
            max_attempts: 5,
        }));

        let commands = controller.handle(Event::Connection(ConnectionEvent::Connected));
        assert!(matches!(
            commands.as_slice(),
            [Command::Toast(Toast { kind: crate::ToastKind::Warning, .. })]
        ));
        assert_eq!(controller.state().phase, Phase::AskingQuestion);
        assert!(controller.state().accepts_input());

        let commands = controller.handle(Event::Submit("Because".into()));
        assert_eq!(
            sends(&commands),
            vec![&ClientMessage::Answer {
                message: "Because".into()
            }]
        );
    }

    #[test]
    fn test_reconnect_hands_back_pending_opening_message() {
        let mut controller = connected();
        controller.handle(Event::Submit("hi".into()));
        controller.handle(Event::Connection(ConnectionEvent::Reconnecting {
            attempt: 1,
            max_attempts: 5,
        }));
        controller.handle(Event::Connection(ConnectionEvent::Connected));
        assert_eq!(controller.state().phase, Phase::Idle);

        let commands = controller.handle(Event::Submit("hi".into()));
        assert_eq!(
            sends(&commands),
            vec![&ClientMessage::Initial {
                message: "hi".into()
            }]
        );
    }

    #[test]
    fn test_first_connect_keeps_phase() {
        let mut controller = Controller::default();
        let commands = controller.handle(Event::Connection(ConnectionEvent::Connected));
        assert!(commands.is_empty());
        assert_eq!(controller.state().phase, Phase::Idle);
    }

    #[test]
    fn test_unknown_command_is_a_warning() {
        let mut controller = connected();
        let commands = controller.handle(Event::UnknownCommand("dance".into()));
        assert_eq!(
            commands,
            vec![Command::Toast(Toast::warning(
                "Unknown command /dance. Try /1, /cancel, /restart or /quit."
            ))]
        );
        assert_eq!(controller.state().phase, Phase::Idle);
    }

    #[test]
    fn test_submission_after_ending_points_to_restart() {
        let mut controller = after_last_answer();
        controller.handle(frame(json!({"type": "finale"})));
        let commands = controller.handle(Event::Submit("more?".into()));
        assert_eq!(
            commands,
            vec![Command::Toast(Toast::warning(
                "This conversation is over. Use /restart to start a new one."
            ))]
        );
    }

    #[test]
    fn test_complete_fills_progress() {
        let mut controller = after_last_answer();
        controller.handle(frame(json!({"type": "follow_up", "number": 1, "total": 3})));
        controller.handle(frame(json!({"type": "complete", "message": "Thanks, we have got your data."})));
        assert_eq!(controller.state().current_question, 3);
        assert_eq!(
            controller.transcript().last(),
            Some(&Block::Message("Thanks, we have got your data.".into()))
        );
    }
}
