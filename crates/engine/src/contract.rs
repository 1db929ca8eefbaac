//! Reply validation — strict schema parsing with deterministic fallbacks.
//!
//! The model is instructed to emit bare JSON, but in practice replies
//! arrive wrapped in prose or markdown fences. Parsing extracts the
//! first balanced `{...}` and parses it strictly; anything that still
//! fails collapses to a fixed, schema-valid fallback so callers never
//! see a parse error.

use caremind_core::reply::{ChatReply, SpecialistCard, SpecialistReply};
use tracing::warn;

/// Fallback chat reply when the model output cannot be parsed.
pub const FALLBACK_REPLY: &str = "Sorry, I can only answer medical-assistance questions.";

/// Fallback conversation title.
pub const FALLBACK_TITLE: &str = "New Conversation";

/// Fallback specialist message when the invocation itself failed.
pub const SPECIALIST_ERROR_MESSAGE: &str = "Sorry, there was an issue processing your request.";

/// Placeholder image for advisory-only or fallback specialist cards.
pub const PLACEHOLDER_IMAGE_URL: &str =
    "https://nudii.com.br/wp-content/uploads/2025/05/placeholder.png";

/// Maximum specialist cards in one reply.
pub const MAX_SPECIALISTS: usize = 3;

/// Extract the first balanced `{...}` object from `raw`, skipping any
/// surrounding prose or markdown fences. Brace tracking is string-aware
/// so braces inside JSON string values don't terminate the scan.
pub fn extract_json(raw: &str) -> Option<&str> {
    let start = raw.find('{')?;
    let bytes = raw.as_bytes();

    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, &b) in bytes.iter().enumerate().skip(start) {
        if in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&raw[start..=i]);
                }
            }
            _ => {}
        }
    }

    None
}

/// The deterministic chat fallback.
pub fn fallback_chat_reply() -> ChatReply {
    ChatReply {
        reply: FALLBACK_REPLY.into(),
        chat_title: FALLBACK_TITLE.into(),
    }
}

/// A single advisory-only card carrying `message`, with the placeholder
/// image and every other field empty.
pub fn placeholder_card(message: &str) -> SpecialistCard {
    SpecialistCard {
        response_message: message.to_string(),
        name: String::new(),
        specialization: String::new(),
        registration: String::new(),
        image: PLACEHOLDER_IMAGE_URL.into(),
        doctor_description: String::new(),
    }
}

/// The deterministic specialist fallback: one placeholder card.
///
/// When the raw text is readable prose (the model answered outside the
/// schema), it becomes the card's message so the user still gets the
/// advice; otherwise a fixed apology is used.
pub fn fallback_specialist_reply(raw: &str) -> SpecialistReply {
    let trimmed = raw.trim();
    let message = if trimmed.is_empty() || trimmed.contains('{') {
        SPECIALIST_ERROR_MESSAGE
    } else {
        trimmed
    };
    SpecialistReply {
        specialists: vec![placeholder_card(message)],
    }
}

/// Parse the model's raw output into a `ChatReply`, falling back to the
/// fixed refusal reply on any schema violation.
pub fn parse_chat_reply(raw: &str) -> ChatReply {
    let Some(json) = extract_json(raw) else {
        warn!(raw, "Chat reply had no JSON object; using fallback");
        return fallback_chat_reply();
    };

    match serde_json::from_str::<ChatReply>(json) {
        Ok(reply) => reply,
        Err(e) => {
            warn!(raw, error = %e, "Chat reply failed schema parse; using fallback");
            fallback_chat_reply()
        }
    }
}

/// Parse the model's raw output into a `SpecialistReply`.
///
/// Accepts both the `{"specialists": [...]}` envelope and a bare legacy
/// single-card object (which is wrapped). Replies are capped at
/// `MAX_SPECIALISTS` cards; an empty list falls back.
pub fn parse_specialist_reply(raw: &str) -> SpecialistReply {
    let Some(json) = extract_json(raw) else {
        warn!(raw, "Specialist reply had no JSON object; using fallback");
        return fallback_specialist_reply(raw);
    };

    if let Ok(mut reply) = serde_json::from_str::<SpecialistReply>(json) {
        if reply.specialists.is_empty() {
            warn!(raw, "Specialist reply had an empty card list; using fallback");
            return fallback_specialist_reply("");
        }
        reply.specialists.truncate(MAX_SPECIALISTS);
        return reply;
    }

    if let Ok(card) = serde_json::from_str::<SpecialistCard>(json) {
        return SpecialistReply {
            specialists: vec![card],
        };
    }

    warn!(raw, "Specialist reply failed schema parse; using fallback");
    fallback_specialist_reply("")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extract_bare_object() {
        assert_eq!(extract_json(r#"{"a":1}"#), Some(r#"{"a":1}"#));
    }

    #[test]
    fn extract_from_markdown_fence() {
        let raw = "Here you go:\n```json\n{\"reply\":\"ok\",\"chat_title\":\"T\"}\n```\nHope that helps!";
        assert_eq!(
            extract_json(raw),
            Some(r#"{"reply":"ok","chat_title":"T"}"#)
        );
    }

    #[test]
    fn extract_handles_nested_and_string_braces() {
        let raw = r#"note {"a": {"b": "has } inside"}, "c": 2} trailing"#;
        assert_eq!(extract_json(raw), Some(r#"{"a": {"b": "has } inside"}, "c": 2}"#));
    }

    #[test]
    fn extract_none_without_object() {
        assert_eq!(extract_json("just some prose"), None);
        assert_eq!(extract_json("unbalanced { forever"), None);
    }

    #[test]
    fn valid_chat_json_passes_through() {
        let reply =
            parse_chat_reply(r#"{"reply":"Rest and hydrate.","chat_title":"Stomach bug"}"#);
        assert_eq!(reply.reply, "Rest and hydrate.");
        assert_eq!(reply.chat_title, "Stomach bug");
    }

    #[test]
    fn refusal_text_in_reply_is_not_a_fallback() {
        let json = format!(r#"{{"reply":"{FALLBACK_REPLY}","chat_title":"Off topic"}}"#);
        let reply = parse_chat_reply(&json);
        assert_eq!(reply.chat_title, "Off topic");
    }

    #[test]
    fn malformed_chat_output_falls_back() {
        let reply = parse_chat_reply("I think you should see a doctor soon.");
        assert_eq!(reply.reply, FALLBACK_REPLY);
        assert_eq!(reply.chat_title, FALLBACK_TITLE);
    }

    #[test]
    fn wrong_schema_chat_output_falls_back() {
        let reply = parse_chat_reply(r#"{"answer":"wrong keys"}"#);
        assert_eq!(reply.chat_title, FALLBACK_TITLE);
    }

    #[test]
    fn specialist_envelope_parses() {
        let raw = r#"{"specialists":[{
            "response_message": "Dr. Silva can help.",
            "Name": "Dr. Silva",
            "Specialization": "Orthopedics",
            "Registration": "CRM 12345",
            "Image": "https://example.com/silva.png",
            "doctor_description": "Knee specialist"
        }]}"#;
        let reply = parse_specialist_reply(raw);
        assert_eq!(reply.specialists.len(), 1);
        assert_eq!(reply.specialists[0].name, "Dr. Silva");
    }

    #[test]
    fn legacy_bare_card_is_wrapped() {
        let raw = r#"{
            "response_message": "See Dr. Prado.",
            "Name": "Dr. Prado",
            "Specialization": "Dermatology",
            "Registration": "CRM 6789",
            "Image": "https://example.com/prado.png",
            "doctor_description": "Skin conditions"
        }"#;
        let reply = parse_specialist_reply(raw);
        assert_eq!(reply.specialists.len(), 1);
        assert_eq!(reply.specialists[0].name, "Dr. Prado");
    }

    #[test]
    fn specialist_list_capped_at_three() {
        let card = r#"{
            "response_message": "m", "Name": "N", "Specialization": "S",
            "Registration": "R", "Image": "I", "doctor_description": "D"
        }"#;
        let raw = format!(r#"{{"specialists":[{card},{card},{card},{card},{card}]}}"#);
        let reply = parse_specialist_reply(&raw);
        assert_eq!(reply.specialists.len(), MAX_SPECIALISTS);
    }

    #[test]
    fn prose_specialist_output_becomes_advisory_card() {
        let reply = parse_specialist_reply("Drink water and rest; no specialist needed.");
        assert_eq!(reply.specialists.len(), 1);
        let card = &reply.specialists[0];
        assert_eq!(
            card.response_message,
            "Drink water and rest; no specialist needed."
        );
        assert!(card.name.is_empty());
        assert_eq!(card.image, PLACEHOLDER_IMAGE_URL);
    }

    #[test]
    fn empty_specialist_list_falls_back() {
        let reply = parse_specialist_reply(r#"{"specialists":[]}"#);
        assert_eq!(reply.specialists.len(), 1);
        assert_eq!(reply.specialists[0].response_message, SPECIALIST_ERROR_MESSAGE);
    }

    #[test]
    fn fenced_specialist_output_parses() {
        let raw = "```json\n{\"specialists\":[{\"response_message\":\"m\",\"Name\":\"Dr. A\",\"Specialization\":\"s\",\"Registration\":\"r\",\"Image\":\"i\",\"doctor_description\":\"d\"}]}\n```";
        let reply = parse_specialist_reply(raw);
        assert_eq!(reply.specialists[0].name, "Dr. A");
    }
}
