//! Interview content.
//!
//! Follow-up questions come from a [`QuestionSource`]; the closing screens are
//! built from a [`Reading`] of everything the user answered.

use anyhow::{Result, bail};
use async_trait::async_trait;
use interview_core::protocol::{
    Achievement, CallsToAction, ChoiceOption, ChoicePrompt, Finale, FinaleStats, FinalMessage,
    FutureVision, MindReading, PersonalChallenge, PersonalityBonus, PlotTwist, RespectfulEnding,
    Scores, SecretMessage, ServerMessage, Shareable, UltimateReveal,
};

/// Option id that asks for the final reveal.
pub const CHOICE_REVEAL: &str = "reveal";
/// Option id that declines it.
pub const CHOICE_SKIP: &str = "skip";

/// Defines the contract for anything that can come up with the next question.
#[async_trait]
pub trait QuestionSource: Send + Sync {
    /// Returns follow-up question `number` (1-based), given the user's latest message.
    async fn follow_up(&self, latest: &str, number: u32) -> Result<String>;
}

/// Asks a fixed list of questions in order, wrapping around if the interview
/// runs longer than the list.
#[derive(Debug, Clone)]
pub struct ScriptedQuestions {
    questions: Vec<String>,
}

impl ScriptedQuestions {
    pub fn new(questions: Vec<String>) -> Self {
        Self { questions }
    }
}

impl Default for ScriptedQuestions {
    fn default() -> Self {
        Self::new(
            [
                "Interesting. What's the story behind that? When did you first notice it?",
                "If you could change one thing about how you learn, what would it be and why?",
                "Last one. What would you do tomorrow if you knew nobody would judge you for it?",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
        )
    }
}

#[async_trait]
impl QuestionSource for ScriptedQuestions {
    async fn follow_up(&self, _latest: &str, number: u32) -> Result<String> {
        if self.questions.is_empty() {
            bail!("no questions configured");
        }
        let index = (number.saturating_sub(1) as usize) % self.questions.len();
        Ok(self.questions[index].clone())
    }
}

/// A personality profile shown in the reveal.
#[derive(Debug)]
pub struct Profile {
    pub name: &'static str,
    pub traits: &'static [&'static str],
    pub description: &'static str,
    pub advice: &'static str,
    pub prediction: &'static str,
    pub secret_strength: &'static str,
    pub challenge: &'static str,
    pub would_succeed_at: &'static [&'static str],
    pub future: &'static str,
    pub secret: &'static str,
    pub tagline: &'static str,
}

static MYSTERY: Profile = Profile {
    name: "The Mystery Explorer",
    traits: &[
        "Just getting started",
        "Curious enough to try this",
        "Open to new experiences",
    ],
    description: "Not enough data yet, but you showed up. That counts.",
    advice: "Keep exploring. The best insights come from unexpected places.",
    prediction: "You'll discover something about yourself you didn't expect.",
    secret_strength: "You're willing to try new things. That's rarer than you think.",
    challenge: "Come back and answer with more detail. I bet you're more interesting than you're letting on.",
    would_succeed_at: &["Anything you actually commit to"],
    future: "The next conversation you actually open up in will surprise you.",
    secret: "Showing up is half of it. The other half is saying what you really think.",
    tagline: "Still loading. Worth the wait.",
};

static BUILDER: Profile = Profile {
    name: "The Practical Builder",
    traits: &[
        "Learns by doing, not reading",
        "Theory is boring until you see it work",
        "Gets to the point",
        "Fixes things by trying, failing, trying again",
    ],
    description: "You keep it short because you'd rather be doing the thing than talking about it.",
    advice: "Stop watching. Start building. Every error message is a lesson you'll never forget.",
    prediction: "In two years you'll have built more real things than people with better grades.",
    secret_strength: "You learn in weeks what takes others months, because you're not afraid to break things.",
    challenge: "Build something today. It can be broken, ugly or wrong. Just make it real.",
    would_succeed_at: &["Software development", "Engineering", "Startups"],
    future: "You'll have a portfolio of real projects while others are still collecting certificates.",
    secret: "While others plan, you'll have already built three versions. Don't slow down for anyone.",
    tagline: "Ships first, explains later.",
};

static ANALYST: Profile = Profile {
    name: "The Thoughtful Analyst",
    traits: &[
        "Thinks deeply before speaking",
        "Notices patterns others overlook",
        "Explains things properly",
        "Quiet, but the insights are gold",
    ],
    description: "You took the time to really answer. That's how people who see the whole picture talk.",
    advice: "Your insights are worth more than you think. Share them, even when it feels obvious.",
    prediction: "People will start coming to you for advice because you see problems others can't.",
    secret_strength: "While others chase quick answers, you build deep understanding. That compounds.",
    challenge: "Share one insight this week that you'd usually keep to yourself.",
    would_succeed_at: &["Data science", "Strategy", "Research", "Consulting"],
    future: "Your observations will become your brand. People will seek you out for them.",
    secret: "Your silence isn't weakness. It's data collection. When you speak, people listen.",
    tagline: "Sees the pattern before the picture.",
};

static CHAMELEON: Profile = Profile {
    name: "The Adaptive Chameleon",
    traits: &[
        "Adjusts to the question in front of you",
        "Comfortable with change and uncertainty",
        "Switches between detail and big picture",
        "Doesn't fit neatly into one box",
    ],
    description: "Sometimes brief, sometimes detailed. That's not inconsistency, that's range.",
    advice: "Stop trying to find your one style. Adaptability is the style.",
    prediction: "You'll thrive in the roles that need someone to figure it out without a playbook.",
    secret_strength: "Others need the right environment. You make your own.",
    challenge: "Learn something completely outside your comfort zone this month.",
    would_succeed_at: &["Project management", "Entrepreneurship", "Creative roles"],
    future: "You'll thrive in chaos while others freeze.",
    secret: "Being versatile in a rigid world is power. Use it.",
    tagline: "Fits anywhere. Settles nowhere.",
};

/// What the interview learned about the user.
#[derive(Debug)]
pub struct Reading {
    pub profile: &'static Profile,
    pub answers: usize,
    pub words: usize,
}

impl Reading {
    /// Picks a profile from the average answer length.
    pub fn from_answers(answers: &[String]) -> Self {
        let words: usize = answers
            .iter()
            .map(|answer| answer.split_whitespace().count())
            .sum();
        let profile = match words.checked_div(answers.len()) {
            None | Some(0) => &MYSTERY,
            Some(avg) if avg < 5 => &BUILDER,
            Some(avg) if avg > 8 => &ANALYST,
            Some(_) => &CHAMELEON,
        };
        Self {
            profile,
            answers: answers.len(),
            words,
        }
    }

    fn engagement(&self) -> u32 {
        let score = self.words.saturating_mul(3).saturating_add(15);
        score.min(100) as u32
    }

    pub fn personality_reveal(&self) -> ServerMessage {
        let p = self.profile;
        ServerMessage::PersonalityReveal {
            bonus: Some(PersonalityBonus {
                title: Some("PERSONALITY UNLOCKED".to_string()),
                subtitle: Some("After analyzing your responses, I think you're...".to_string()),
                personality_type: Some(p.name.to_string()),
                traits: strings(p.traits),
                description: Some(p.description.to_string()),
                advice: Some(p.advice.to_string()),
                prediction: Some(p.prediction.to_string()),
                secret_strength: Some(p.secret_strength.to_string()),
                challenge: Some(p.challenge.to_string()),
                would_succeed_at: strings(p.would_succeed_at),
                scores: Some(Scores {
                    engagement: Some(self.engagement()),
                    honesty: Some(92),
                }),
                mind_reading: Some(self.mind_reading_game()),
                future_vision: Some(FutureVision {
                    title: Some("Time Machine: Your Future".to_string()),
                    vision: Some(p.future.to_string()),
                    reminder: Some("Screenshot this. Check back in 6 months.".to_string()),
                }),
                personal_challenge: Some(PersonalChallenge {
                    title: Some("Your Personal Challenge".to_string()),
                    main_challenge: Some(p.challenge.to_string()),
                    why_it_matters: Some(
                        "Based on what you said, this is what unlocks your next level.".to_string(),
                    ),
                    deadline: Some("Try it within 24 hours. Momentum matters.".to_string()),
                    what_to_expect: Some(
                        "You'll either prove me wrong or find out I was right. Either way, you win."
                            .to_string(),
                    ),
                }),
            }),
        }
    }

    fn mind_reading_game(&self) -> MindReading {
        let mut predictions = Vec::new();
        if self.profile.name == ANALYST.name {
            predictions.push("You rewrite messages before sending them".to_string());
        } else if self.profile.name == BUILDER.name {
            predictions.push("You skipped the instructions to get here".to_string());
        }
        predictions.extend(
            [
                "You've had at least one moment where you questioned if you're on the right path",
                "There's something you're good at that you don't give yourself credit for",
                "You learn better by doing than by being told",
            ]
            .map(String::from),
        );
        MindReading {
            title: Some("Mind Reading Time".to_string()),
            subtitle: Some("Based on our chat, I think I know you. Let's test it:".to_string()),
            predictions,
            challenge: Some("How many did I get right?".to_string()),
        }
    }

    pub fn mind_reading(&self) -> ServerMessage {
        ServerMessage::MindReading {
            data: Some(self.mind_reading_game()),
        }
    }

    pub fn secret_unlock(&self) -> ServerMessage {
        ServerMessage::SecretUnlock {
            data: Some(SecretMessage {
                title: Some("SECRET MESSAGE UNLOCKED".to_string()),
                message: Some(self.profile.secret.to_string()),
                from: Some("Future You".to_string()),
                encrypted: Some(false),
            }),
        }
    }

    pub fn ultimate_reveal(&self) -> ServerMessage {
        let p = self.profile;
        ServerMessage::UltimateReveal {
            data: Some(UltimateReveal {
                title: Some("THE UNFILTERED TRUTH".to_string()),
                intro: Some("Alright, you asked for it. Here's what I really see:".to_string()),
                honest_take: Some(format!(
                    "You gave me {} answers and {} words. {}",
                    self.answers, self.words, p.description
                )),
                plot_twist: Some(PlotTwist {
                    title: Some("Plot twist".to_string()),
                    reveal: Some(format!(
                        "{} isn't a box. It's where you start.",
                        p.name
                    )),
                    insight: Some(p.secret_strength.to_string()),
                }),
                final_message: Some(FinalMessage {
                    title: Some("Before you go...".to_string()),
                    message: Some(p.advice.to_string()),
                    signature: Some("An interviewer who actually listened".to_string()),
                }),
                shareable: Some(Shareable {
                    title: Some("Your Personality Card".to_string()),
                    personality_type: Some(p.name.to_string()),
                    tagline: Some(p.tagline.to_string()),
                    share_text: Some(format!("I just discovered I'm {}. What about you?", p.name)),
                }),
            }),
        }
    }

    pub fn finale(&self) -> ServerMessage {
        ServerMessage::Finale {
            data: Some(Finale {
                title: Some("EXPERIENCE COMPLETE".to_string()),
                stats: Some(FinaleStats {
                    questions_answered: Some(self.answers.saturating_sub(1) as u32),
                    insights_shared: Some(self.answers as u32),
                    time_well_spent: Some("Absolutely".to_string()),
                    memories_created: Some("1 (hopefully)".to_string()),
                }),
                achievement: Some(Achievement {
                    title: Some("Achievement Unlocked".to_string()),
                    name: Some("Self-Discovery Hero".to_string()),
                    description: Some(
                        "Completed the conversation and discovered something about yourself"
                            .to_string(),
                    ),
                }),
                easter_egg: Some(
                    "P.S. Most people skip the detailed answers. You didn't.".to_string(),
                ),
                cta: Some(CallsToAction {
                    primary: Some("Start Over (Try Different Answers)".to_string()),
                    secondary: Some("Share Your Results".to_string()),
                }),
            }),
        }
    }
}

pub fn interactive_choice() -> ServerMessage {
    ServerMessage::InteractiveChoice {
        data: Some(ChoicePrompt {
            title: Some("One More Thing...".to_string()),
            question: Some("Want to see what I really think about you?".to_string()),
            subtitle: Some("(This part might surprise you)".to_string()),
            options: vec![
                ChoiceOption {
                    id: Some(CHOICE_REVEAL.to_string()),
                    text: Some("Show me".to_string()),
                    emoji: None,
                },
                ChoiceOption {
                    id: Some(CHOICE_SKIP.to_string()),
                    text: Some("Nah, I'm good".to_string()),
                    emoji: None,
                },
            ],
        }),
    }
}

pub fn respectful_ending() -> ServerMessage {
    ServerMessage::RespectfulEnding {
        data: Some(RespectfulEnding {
            message: Some("Respect. Not everyone wants the full deep-dive.".to_string()),
            fun_fact: Some(
                "Skipping tells me you're either confident already or prefer to find things out your own way."
                    .to_string(),
            ),
            final_words: Some(
                "Keep being you. The world needs more people who know when to say enough."
                    .to_string(),
            ),
            cta: Some("Start Over".to_string()),
        }),
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|item| item.to_string()).collect()
}
