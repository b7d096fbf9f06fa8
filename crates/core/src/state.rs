//! Session state for a single interview conversation.

/// Where the conversation currently stands.
///
/// `Idle -> AwaitingInitialResponse -> {AskingQuestion <-> AwaitingAnswer} x N
/// -> TerminalSequence -> Idle`. Waiting for a choice click is tracked
/// separately by [`SessionState::awaiting_choice`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    /// No conversation yet; the next submission is sent as `initial`.
    #[default]
    Idle,
    /// The opening message was sent and the first question has not arrived.
    AwaitingInitialResponse,
    /// A question is on screen and the user may answer it.
    AskingQuestion,
    /// An answer (or choice) was sent and the server has not replied yet.
    AwaitingAnswer,
    /// The closing screens are showing, possibly with a restart countdown.
    TerminalSequence,
}

/// Connection status as shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionStatus {
    #[default]
    Connecting,
    Connected,
    Reconnecting {
        attempt: u32,
    },
    Disconnected,
    /// Reconnect attempts are exhausted. Only a manual restart recovers.
    Lost,
}

/// Identifies one countdown. Timer events carrying any other id are stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CountdownId(pub u64);

/// The mutable state record owned by the conversation controller.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionState {
    pub connection: ConnectionStatus,
    pub connected: bool,
    pub reconnect_attempts: u32,
    pub conversation_active: bool,
    pub current_question: u32,
    pub total_questions: u32,
    pub awaiting_choice: bool,
    pub countdown: Option<CountdownId>,
    pub phase: Phase,
}

impl SessionState {
    /// Applies a progress update from the server. Absent values keep the previous
    /// ones, and the current question never exceeds the total.
    pub fn set_progress(&mut self, number: Option<u32>, total: Option<u32>) {
        if let Some(total) = total {
            self.total_questions = total;
        }
        if let Some(number) = number {
            self.current_question = number;
        }
        self.current_question = self.current_question.min(self.total_questions);
    }

    /// Marks every question as answered.
    pub fn complete_progress(&mut self) {
        self.current_question = self.total_questions;
    }

    /// Fraction of questions answered, always within `0.0..=1.0`.
    pub fn progress_fraction(&self) -> f64 {
        if self.total_questions == 0 {
            return 0.0;
        }
        (f64::from(self.current_question) / f64::from(self.total_questions)).clamp(0.0, 1.0)
    }

    /// True while a server reply is pending.
    pub fn awaiting_response(&self) -> bool {
        matches!(
            self.phase,
            Phase::AwaitingInitialResponse | Phase::AwaitingAnswer
        ) && !self.awaiting_choice
    }

    /// Whether the user may type and submit a message right now.
    pub fn accepts_input(&self) -> bool {
        matches!(self.phase, Phase::Idle | Phase::AskingQuestion)
            && !self.awaiting_choice
            && self.connection != ConnectionStatus::Lost
    }

    /// Resets the conversation while keeping what is known about the connection.
    pub fn reset(&mut self) {
        *self = Self {
            connection: self.connection,
            connected: self.connected,
            reconnect_attempts: self.reconnect_attempts,
            ..Self::default()
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_progress() {
        let mut state = SessionState::default();
        state.set_progress(Some(2), Some(3));
        assert_eq!((state.current_question, state.total_questions), (2, 3));

        state.set_progress(None, None);
        assert_eq!((state.current_question, state.total_questions), (2, 3));

        state.set_progress(Some(3), None);
        assert_eq!(state.current_question, 3);
    }

    #[test]
    fn test_progress_is_clamped_to_total() {
        let mut state = SessionState::default();
        state.set_progress(Some(7), Some(3));
        assert_eq!(state.current_question, 3);

        state.set_progress(None, Some(1));
        assert_eq!(state.current_question, 1);

        // A number without any known total cannot be positioned.
        let mut state = SessionState::default();
        state.set_progress(Some(2), None);
        assert_eq!(state.current_question, 0);
    }

    #[test]
    fn test_progress_fraction_bounds() {
        let mut state = SessionState::default();
        assert_eq!(state.progress_fraction(), 0.0);

        for (number, total) in [(0, 3), (1, 3), (3, 3), (9, 3), (5, 0), (u32::MAX, u32::MAX)] {
            state.set_progress(Some(number), Some(total));
            let fraction = state.progress_fraction();
            assert!(
                (0.0..=1.0).contains(&fraction),
                "{number}/{total} gave {fraction}"
            );
        }
    }

    #[test]
    fn test_accepts_input() {
        let mut state = SessionState::default();
        assert!(state.accepts_input());

        state.phase = Phase::AwaitingInitialResponse;
        assert!(!state.accepts_input());
        assert!(state.awaiting_response());

        state.phase = Phase::AskingQuestion;
        assert!(state.accepts_input());

        state.awaiting_choice = true;
        assert!(!state.accepts_input());

        state.awaiting_choice = false;
        state.connection = ConnectionStatus::Lost;
        assert!(!state.accepts_input());
    }

    #[test]
    fn test_reset_keeps_connection() {
        let mut state = SessionState {
            connection: ConnectionStatus::Connected,
            connected: true,
            conversation_active: true,
            current_question: 3,
            total_questions: 3,
            countdown: Some(CountdownId(4)),
            phase: Phase::TerminalSequence,
            ..SessionState::default()
        };
        state.reset();
        assert_eq!(state.connection, ConnectionStatus::Connected);
        assert!(state.connected);
        assert!(!state.conversation_active);
        assert_eq!(state.current_question, 0);
        assert_eq!(state.countdown, None);
        assert_eq!(state.phase, Phase::Idle);
    }
}
