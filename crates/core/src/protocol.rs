//! Defines the WebSocket message protocol between the interview client and server.
//!
//! Server payloads are untrusted input. Every field is optional, and a field that
//! carries the wrong JSON type decodes as `None` instead of failing the whole
//! message, so a handler can drop just the affected UI element.

use serde::{Deserialize, Serialize};

/// Messages sent from the client to the server.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// The user's opening message. This must be the first message of a conversation.
    Initial {
        #[serde(default)]
        message: String,
    },
    /// An answer to the latest follow-up question.
    Answer {
        #[serde(default)]
        message: String,
    },
    /// The option picked on an interactive choice prompt.
    ChoiceResponse {
        #[serde(default)]
        message: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        choice_id: Option<String>,
    },
}

/// Messages sent from the server to the client.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// A follow-up question together with the interview progress.
    FollowUp {
        #[serde(default, deserialize_with = "lenient::option", skip_serializing_if = "Option::is_none")]
        question: Option<String>,
        #[serde(default, deserialize_with = "lenient::option", skip_serializing_if = "Option::is_none")]
        number: Option<u32>,
        #[serde(default, deserialize_with = "lenient::option", skip_serializing_if = "Option::is_none")]
        total: Option<u32>,
    },
    /// All questions have been answered.
    Complete {
        #[serde(default, deserialize_with = "lenient::option", skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
    /// A "the AI is thinking" beat between reveal phases.
    Thinking {
        #[serde(default, deserialize_with = "lenient::option", skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
    PersonalityReveal {
        #[serde(default, deserialize_with = "lenient::option", skip_serializing_if = "Option::is_none")]
        bonus: Option<PersonalityBonus>,
    },
    MindReading {
        #[serde(default, deserialize_with = "lenient::option", skip_serializing_if = "Option::is_none")]
        data: Option<MindReading>,
    },
    SecretUnlock {
        #[serde(default, deserialize_with = "lenient::option", skip_serializing_if = "Option::is_none")]
        data: Option<SecretMessage>,
    },
    /// Suspends free-text input until one of the options is picked.
    InteractiveChoice {
        #[serde(default, deserialize_with = "lenient::option", skip_serializing_if = "Option::is_none")]
        data: Option<ChoicePrompt>,
    },
    UltimateReveal {
        #[serde(default, deserialize_with = "lenient::option", skip_serializing_if = "Option::is_none")]
        data: Option<UltimateReveal>,
    },
    /// Closing statistics screen. Starts the restart countdown.
    Finale {
        #[serde(default, deserialize_with = "lenient::option", skip_serializing_if = "Option::is_none")]
        data: Option<Finale>,
    },
    /// Closing screen shown when the user declines the final reveal. Starts the restart countdown.
    RespectfulEnding {
        #[serde(default, deserialize_with = "lenient::option", skip_serializing_if = "Option::is_none")]
        data: Option<RespectfulEnding>,
    },
    /// A recoverable error reported by the server.
    Error {
        #[serde(default, deserialize_with = "lenient::option", skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
}

/// Error returned when an inbound frame cannot be decoded at all.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("malformed server message: {0}")]
    Malformed(#[from] serde_json::Error),
}

impl ServerMessage {
    /// Decodes a text frame. Unknown tags and non-JSON input are errors; missing or
    /// mistyped payload fields are not.
    pub fn parse(text: &str) -> Result<Self, ProtocolError> {
        Ok(serde_json::from_str(text)?)
    }

    /// The wire tag of this message, for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            ServerMessage::FollowUp { .. } => "follow_up",
            ServerMessage::Complete { .. } => "complete",
            ServerMessage::Thinking { .. } => "thinking",
            ServerMessage::PersonalityReveal { .. } => "personality_reveal",
            ServerMessage::MindReading { .. } => "mind_reading",
            ServerMessage::SecretUnlock { .. } => "secret_unlock",
            ServerMessage::InteractiveChoice { .. } => "interactive_choice",
            ServerMessage::UltimateReveal { .. } => "ultimate_reveal",
            ServerMessage::Finale { .. } => "finale",
            ServerMessage::RespectfulEnding { .. } => "respectful_ending",
            ServerMessage::Error { .. } => "error",
        }
    }
}

// --- Payloads ---

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct PersonalityBonus {
    pub title: Option<String>,
    pub subtitle: Option<String>,
    pub personality_type: Option<String>,
    #[serde(deserialize_with = "lenient::list")]
    pub traits: Vec<String>,
    pub description: Option<String>,
    pub advice: Option<String>,
    pub prediction: Option<String>,
    pub secret_strength: Option<String>,
    pub challenge: Option<String>,
    #[serde(deserialize_with = "lenient::list")]
    pub would_succeed_at: Vec<String>,
    #[serde(deserialize_with = "lenient::option")]
    pub scores: Option<Scores>,
    #[serde(deserialize_with = "lenient::option")]
    pub mind_reading: Option<MindReading>,
    #[serde(deserialize_with = "lenient::option")]
    pub future_vision: Option<FutureVision>,
    #[serde(deserialize_with = "lenient::option")]
    pub personal_challenge: Option<PersonalChallenge>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct Scores {
    pub engagement: Option<u32>,
    pub honesty: Option<u32>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct FutureVision {
    pub title: Option<String>,
    pub vision: Option<String>,
    pub reminder: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct PersonalChallenge {
    pub title: Option<String>,
    pub main_challenge: Option<String>,
    pub why_it_matters: Option<String>,
    pub deadline: Option<String>,
    pub what_to_expect: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct MindReading {
    pub title: Option<String>,
    pub subtitle: Option<String>,
    #[serde(deserialize_with = "lenient::list")]
    pub predictions: Vec<String>,
    pub challenge: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct SecretMessage {
    pub title: Option<String>,
    pub message: Option<String>,
    pub from: Option<String>,
    pub encrypted: Option<bool>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct ChoicePrompt {
    pub title: Option<String>,
    pub question: Option<String>,
    pub subtitle: Option<String>,
    #[serde(deserialize_with = "lenient::list")]
    pub options: Vec<ChoiceOption>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct ChoiceOption {
    pub id: Option<String>,
    pub text: Option<String>,
    pub emoji: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct UltimateReveal {
    pub title: Option<String>,
    pub intro: Option<String>,
    pub honest_take: Option<String>,
    #[serde(deserialize_with = "lenient::option")]
    pub plot_twist: Option<PlotTwist>,
    #[serde(deserialize_with = "lenient::option")]
    pub final_message: Option<FinalMessage>,
    #[serde(deserialize_with = "lenient::option")]
    pub shareable: Option<Shareable>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct PlotTwist {
    pub title: Option<String>,
    pub reveal: Option<String>,
    pub insight: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct FinalMessage {
    pub title: Option<String>,
    pub message: Option<String>,
    pub signature: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct Shareable {
    pub title: Option<String>,
    #[serde(rename = "type")]
    pub personality_type: Option<String>,
    pub tagline: Option<String>,
    pub share_text: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct Finale {
    pub title: Option<String>,
    #[serde(deserialize_with = "lenient::option")]
    pub stats: Option<FinaleStats>,
    #[serde(deserialize_with = "lenient::option")]
    pub achievement: Option<Achievement>,
    pub easter_egg: Option<String>,
    #[serde(deserialize_with = "lenient::option")]
    pub cta: Option<CallsToAction>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct FinaleStats {
    pub questions_answered: Option<u32>,
    pub insights_shared: Option<u32>,
    pub time_well_spent: Option<String>,
    pub memories_created: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct Achievement {
    pub title: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct CallsToAction {
    pub primary: Option<String>,
    pub secondary: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct RespectfulEnding {
    pub message: Option<String>,
    pub fun_fact: Option<String>,
    pub final_words: Option<String>,
    pub cta: Option<String>,
}

/// Field deserializers that swallow type mismatches.
mod lenient {
    use serde::{Deserialize, Deserializer, de::DeserializeOwned};
    use serde_json::Value;

    pub(super) fn option<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
    where
        D: Deserializer<'de>,
        T: DeserializeOwned,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(serde_json::from_value(value).ok())
    }

    /// Keeps the array items that decode and drops the rest.
    pub(super) fn list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
    where
        D: Deserializer<'de>,
        T: DeserializeOwned,
    {
        Ok(match Value::deserialize(deserializer)? {
            Value::Array(items) => items
                .into_iter()
                .filter_map(|item| serde_json::from_value(item).ok())
                .collect(),
            _ => Vec::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_client_message_serialization() {
        let initial = ClientMessage::Initial {
            message: "I love coding".to_string(),
        };
        assert_eq!(
            serde_json::to_value(&initial).unwrap(),
            json!({"type": "initial", "message": "I love coding"})
        );

        let choice = ClientMessage::ChoiceResponse {
            message: "Show me".to_string(),
            choice_id: Some("reveal".to_string()),
        };
        assert_eq!(
            serde_json::to_value(&choice).unwrap(),
            json!({"type": "choice_response", "message": "Show me", "choice_id": "reveal"})
        );
    }

    #[test]
    fn test_choice_response_omits_missing_choice_id() {
        let choice = ClientMessage::ChoiceResponse {
            message: "whatever".to_string(),
            choice_id: None,
        };
        let value = serde_json::to_value(&choice).unwrap();
        assert!(value.get("choice_id").is_none());
    }

    #[test]
    fn test_client_message_without_message_field() {
        let msg: ClientMessage = serde_json::from_str(r#"{"type":"answer"}"#).unwrap();
        assert_eq!(
            msg,
            ClientMessage::Answer {
                message: String::new()
            }
        );
    }

    #[test]
    fn test_parse_follow_up() {
        let msg =
            ServerMessage::parse(r#"{"type":"follow_up","question":"Why?","number":2,"total":3}"#)
                .unwrap();
        assert_eq!(
            msg,
            ServerMessage::FollowUp {
                question: Some("Why?".to_string()),
                number: Some(2),
                total: Some(3),
            }
        );
        assert_eq!(msg.kind(), "follow_up");
    }

    #[test]
    fn test_every_tag_parses_without_payload() {
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
            let text = format!(r#"{{"type":"{tag}"}}"#);
            let msg = ServerMessage::parse(&text)
                .unwrap_or_else(|e| panic!("tag {tag} failed to parse: {e}"));
            assert_eq!(msg.kind(), tag);
        }
    }

    #[test]
    fn test_mistyped_fields_decode_as_none() {
        let msg = ServerMessage::parse(
            r#"{"type":"follow_up","question":42,"number":"two","total":3}"#,
        )
        .unwrap();
        assert_eq!(
            msg,
            ServerMessage::FollowUp {
                question: None,
                number: None,
                total: Some(3),
            }
        );

        let msg = ServerMessage::parse(r#"{"type":"finale","data":"nope"}"#).unwrap();
        assert_eq!(msg, ServerMessage::Finale { data: None });
    }

    #[test]
    fn test_nested_malformed_parts_are_dropped_individually() {
        let msg = ServerMessage::parse(
            r#"{"type":"personality_reveal","bonus":{
                "personality_type":"The Practical Builder",
                "traits":["Learns by doing", 7, "Fixes things"],
                "scores":"high",
                "mind_reading":{"predictions":["You learn by doing"]}
            }}"#,
        )
        .unwrap();
        let ServerMessage::PersonalityReveal { bonus: Some(bonus) } = msg else {
            panic!("expected a personality reveal with a bonus");
        };
        assert_eq!(bonus.personality_type.as_deref(), Some("The Practical Builder"));
        assert_eq!(bonus.traits, vec!["Learns by doing", "Fixes things"]);
        assert_eq!(bonus.scores, None);
        assert_eq!(
            bonus.mind_reading.map(|m| m.predictions),
            Some(vec!["You learn by doing".to_string()])
        );
    }

    #[test]
    fn test_choice_options_keep_partial_entries() {
        let msg = ServerMessage::parse(
            r#"{"type":"interactive_choice","data":{"options":[{"id":"a"},{"text":"no id"},"junk"]}}"#,
        )
        .unwrap();
        let ServerMessage::InteractiveChoice { data: Some(prompt) } = msg else {
            panic!("expected a choice prompt");
        };
        assert_eq!(prompt.options.len(), 2);
        assert_eq!(prompt.options[0].id.as_deref(), Some("a"));
        assert_eq!(prompt.options[1].id, None);
    }

    #[test]
    fn test_shareable_type_field() {
        let shareable: Shareable =
            serde_json::from_value(json!({"type": "The Rebel Learner", "tagline": "Questions everything."}))
                .unwrap();
        assert_eq!(shareable.personality_type.as_deref(), Some("The Rebel Learner"));
        assert_eq!(
            serde_json::to_value(&shareable).unwrap()["type"],
            json!("The Rebel Learner")
        );
    }

    #[test]
    fn test_unknown_tag_and_garbage_are_malformed() {
        assert!(matches!(
            ServerMessage::parse(r#"{"type":"dance"}"#),
            Err(ProtocolError::Malformed(_))
        ));
        assert!(ServerMessage::parse("not json").is_err());
        assert!(ServerMessage::parse(r#"{"question":"no tag"}"#).is_err());
    }

    #[test]
    fn test_server_message_round_trip_through_wire() {
        let msg = ServerMessage::Thinking {
            message: Some("Wait...".to_string()),
        };
        let text = serde_json::to_string(&msg).unwrap();
        assert_eq!(text, r#"{"type":"thinking","message":"Wait..."}"#);
        assert_eq!(ServerMessage::parse(&text).unwrap(), msg);
    }
}
