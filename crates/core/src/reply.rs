//! Structured reply contracts.
//!
//! The language model's free text must parse into one of these fixed
//! schemas before calling code trusts it. Key casing on the specialist
//! card is part of the wire contract consumed by the frontend and is
//! preserved verbatim via serde renames.

use crate::message::ConversationId;
use serde::{Deserialize, Serialize};

/// The chat orchestrator's output contract: `{reply, chat_title}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatReply {
    /// The assistant's reply text.
    pub reply: String,

    /// A short title for the conversation, derived by the model.
    pub chat_title: String,
}

/// The full outcome of one conversational turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnOutcome {
    pub reply: String,
    pub chat_title: String,
    pub conversation_id: ConversationId,
}

/// One recommended specialist. Field names match the legacy JSON schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpecialistCard {
    /// Friendly opening message acknowledging the user's symptoms.
    pub response_message: String,

    #[serde(rename = "Name")]
    pub name: String,

    #[serde(rename = "Specialization")]
    pub specialization: String,

    #[serde(rename = "Registration")]
    pub registration: String,

    #[serde(rename = "Image")]
    pub image: String,

    pub doctor_description: String,
}

/// The specialist engine's output contract: 1–3 candidate specialists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpecialistReply {
    pub specialists: Vec<SpecialistCard>,
}

impl SpecialistReply {
    /// Names of the recommended specialists, skipping advisory-only cards.
    pub fn recommended_names(&self) -> Vec<String> {
        self.specialists
            .iter()
            .filter(|c| !c.name.is_empty())
            .map(|c| c.name.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chat_reply_roundtrip() {
        let json = r#"{"reply":"Drink plenty of fluids.","chat_title":"Hydration advice"}"#;
        let reply: ChatReply = serde_json::from_str(json).unwrap();
        assert_eq!(reply.reply, "Drink plenty of fluids.");
        assert_eq!(reply.chat_title, "Hydration advice");
    }

    #[test]
    fn specialist_card_uses_legacy_key_casing() {
        let card = SpecialistCard {
            response_message: "Based on your symptoms...".into(),
            name: "Dr. Test".into(),
            specialization: "Gastroenterology".into(),
            registration: "CRM-SP: 000000".into(),
            image: "https://example.com/test.jpg".into(),
            doctor_description: "Digestive health expert.".into(),
        };
        let json = serde_json::to_string(&card).unwrap();
        assert!(json.contains("\"Name\""));
        assert!(json.contains("\"Specialization\""));
        assert!(json.contains("\"Registration\""));
        assert!(json.contains("\"Image\""));
        assert!(json.contains("\"response_message\""));
        assert!(json.contains("\"doctor_description\""));
    }

    #[test]
    fn recommended_names_skips_empty() {
        let reply = SpecialistReply {
            specialists: vec![
                SpecialistCard {
                    response_message: "See Dr. A".into(),
                    name: "Dr. A".into(),
                    specialization: "Dermatology".into(),
                    registration: "CRM 1".into(),
                    image: "https://example.com/a.jpg".into(),
                    doctor_description: String::new(),
                },
                SpecialistCard {
                    response_message: "General advice only".into(),
                    name: String::new(),
                    specialization: String::new(),
                    registration: String::new(),
                    image: "https://example.com/placeholder.png".into(),
                    doctor_description: String::new(),
                },
            ],
        };
        assert_eq!(reply.recommended_names(), vec!["Dr. A".to_string()]);
    }
}
