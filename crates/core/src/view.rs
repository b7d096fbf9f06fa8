//! Toolkit-independent description of what the user should see.
//!
//! [`render`] maps the controller's state to a [`View`]; front ends only decide how
//! to draw it. Payload cards are flattened into titled sections, and any field the
//! server left out simply produces no line.

use crate::{
    controller::{ActiveChoice, Controller},
    protocol::{
        ChoicePrompt, Finale, MindReading, PersonalityBonus, RespectfulEnding, SecretMessage,
        UltimateReveal,
    },
    state::{ConnectionStatus, Phase},
};

/// One entry of the conversation transcript.
#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    /// Something the user sent.
    User(String),
    /// A follow-up question from the server.
    Question { number: Option<u32>, text: String },
    /// A plain message from the server.
    Message(String),
    /// A thinking beat.
    Thinking(String),
    Card(Card),
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Card {
    pub title: Option<String>,
    pub sections: Vec<Section>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Section {
    pub heading: Option<String>,
    pub lines: Vec<String>,
}

impl Card {
    fn titled(title: Option<&String>) -> Self {
        Self {
            title: title.cloned(),
            sections: Vec::new(),
        }
    }

    fn section<I>(mut self, heading: Option<&str>, lines: I) -> Self
    where
        I: IntoIterator<Item = Option<String>>,
    {
        let lines: Vec<String> = lines
            .into_iter()
            .flatten()
            .filter(|line| !line.trim().is_empty())
            .collect();
        if !lines.is_empty() {
            self.sections.push(Section {
                heading: heading.map(str::to_string),
                lines,
            });
        }
        self
    }

    fn line(self, heading: Option<&str>, line: Option<&String>) -> Self {
        self.section(heading, [line.cloned()])
    }

    fn list(self, heading: Option<&str>, items: &[String]) -> Self {
        self.section(heading, items.iter().map(|item| Some(format!("- {item}"))))
    }

    /// A card with neither a title nor any content is not worth drawing.
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.sections.is_empty()
    }
}

impl From<&PersonalityBonus> for Card {
    fn from(bonus: &PersonalityBonus) -> Self {
        let mut card = Card::titled(bonus.title.as_ref())
            .section(bonus.subtitle.as_deref(), [bonus.personality_type.clone()])
            .list(Some("Traits"), &bonus.traits)
            .line(None, bonus.description.as_ref())
            .line(Some("Advice"), bonus.advice.as_ref())
            .line(Some("Prediction"), bonus.prediction.as_ref())
            .line(Some("Secret strength"), bonus.secret_strength.as_ref())
            .line(Some("Challenge"), bonus.challenge.as_ref())
            .list(Some("You'd thrive at"), &bonus.would_succeed_at);

        if let Some(scores) = &bonus.scores {
            card = card.section(
                Some("Scores"),
                [
                    scores.engagement.map(|s| format!("Engagement: {s}/100")),
                    scores.honesty.map(|s| format!("Honesty: {s}/100")),
                ],
            );
        }
        if let Some(vision) = &bonus.future_vision {
            card = card.section(
                vision.title.as_deref().or(Some("Future vision")),
                [vision.vision.clone(), vision.reminder.clone()],
            );
        }
        if let Some(challenge) = &bonus.personal_challenge {
            card = card.section(
                challenge.title.as_deref().or(Some("Personal challenge")),
                [
                    challenge.main_challenge.clone(),
                    challenge.why_it_matters.clone(),
                    challenge.deadline.clone(),
                    challenge.what_to_expect.clone(),
                ],
            );
        }
        card
    }
}

impl From<&MindReading> for Card {
    fn from(reading: &MindReading) -> Self {
        Card::titled(reading.title.as_ref())
            .line(None, reading.subtitle.as_ref())
            .list(None, &reading.predictions)
            .line(None, reading.challenge.as_ref())
    }
}

impl From<&SecretMessage> for Card {
    fn from(secret: &SecretMessage) -> Self {
        Card::titled(secret.title.as_ref())
            .line(None, secret.message.as_ref())
            .section(None, [secret.from.as_ref().map(|from| format!("from {from}"))])
    }
}

impl From<&ChoicePrompt> for Card {
    fn from(prompt: &ChoicePrompt) -> Self {
        Card::titled(prompt.title.as_ref())
            .section(None, [prompt.question.clone(), prompt.subtitle.clone()])
    }
}

impl From<&UltimateReveal> for Card {
    fn from(reveal: &UltimateReveal) -> Self {
        let mut card = Card::titled(reveal.title.as_ref())
            .line(None, reveal.intro.as_ref())
            .line(None, reveal.honest_take.as_ref());
        if let Some(twist) = &reveal.plot_twist {
            card = card.section(
                twist.title.as_deref(),
                [twist.reveal.clone(), twist.insight.clone()],
            );
        }
        if let Some(message) = &reveal.final_message {
            card = card.section(
                message.title.as_deref(),
                [message.message.clone(), message.signature.clone()],
            );
        }
        if let Some(share) = &reveal.shareable {
            card = card.section(
                share.title.as_deref(),
                [
                    share.personality_type.clone(),
                    share.tagline.clone(),
                    share.share_text.clone(),
                ],
            );
        }
        card
    }
}

impl From<&Finale> for Card {
    fn from(finale: &Finale) -> Self {
        let mut card = Card::titled(finale.title.as_ref());
        if let Some(stats) = &finale.stats {
            card = card.section(
                Some("Stats"),
                [
                    stats
                        .questions_answered
                        .map(|n| format!("Questions answered: {n}")),
                    stats.insights_shared.map(|n| format!("Insights shared: {n}")),
                    stats
                        .time_well_spent
                        .as_ref()
                        .map(|s| format!("Time well spent: {s}")),
                    stats
                        .memories_created
                        .as_ref()
                        .map(|s| format!("Memories created: {s}")),
                ],
            );
        }
        if let Some(achievement) = &finale.achievement {
            card = card.section(
                achievement.title.as_deref(),
                [achievement.name.clone(), achievement.description.clone()],
            );
        }
        card = card.line(None, finale.easter_egg.as_ref());
        if let Some(cta) = &finale.cta {
            card = card.section(None, [cta.primary.clone(), cta.secondary.clone()]);
        }
        card
    }
}

impl From<&RespectfulEnding> for Card {
    fn from(ending: &RespectfulEnding) -> Self {
        Card::default()
            .line(None, ending.message.as_ref())
            .line(None, ending.fun_fact.as_ref())
            .line(None, ending.final_words.as_ref())
            .line(None, ending.cta.as_ref())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Progress {
    pub current: u32,
    pub total: u32,
    pub fraction: f64,
}

/// Everything a front end needs to draw the session.
#[derive(Debug, Clone, PartialEq)]
pub struct View {
    pub status: ConnectionStatus,
    pub phase: Phase,
    pub progress: Progress,
    pub blocks: Vec<Block>,
    pub input_enabled: bool,
    /// The latest choice prompt, answered or not.
    pub choice: Option<ActiveChoice>,
    /// Seconds left before the automatic restart.
    pub countdown: Option<u32>,
}

pub fn render(controller: &Controller) -> View {
    let state = controller.state();
    View {
        status: state.connection,
        phase: state.phase,
        progress: Progress {
            current: state.current_question,
            total: state.total_questions,
            fraction: state.progress_fraction(),
        },
        blocks: controller.transcript().to_vec(),
        input_enabled: state.accepts_input(),
        choice: controller.choice().cloned(),
        countdown: state.countdown.and(controller.countdown_remaining()),
    }
}
