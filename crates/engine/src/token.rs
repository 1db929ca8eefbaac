//! Token estimation and budget checks.
//!
//! Uses a character-based heuristic: ~4 characters per token. This
//! approximation is accurate within ~10% for BPE tokenizers on English
//! text, which is enough to keep oversized prompts away from the model.

use caremind_core::message::Message;
use thiserror::Error;

/// Estimate the token count for a string.
///
/// Heuristic: 1 token ≈ 4 characters. Rounds up.
pub fn estimate_tokens(text: &str) -> usize {
    if text.is_empty() {
        return 0;
    }
    (text.len() + 3) / 4
}

/// Estimate tokens for a single message including per-message overhead.
///
/// Each message costs ~4 tokens of overhead for role name, delimiters,
/// and formatting markers in the API wire format. Multi-part bodies
/// count their text-bearing segments only.
pub fn estimate_message_tokens(message: &Message) -> usize {
    let overhead = 4;
    let text_len = message.content.text_len();
    let content_tokens = if text_len == 0 { 0 } else { (text_len + 3) / 4 };
    overhead + content_tokens
}

/// Estimate tokens for a slice of messages.
pub fn estimate_messages_tokens(messages: &[Message]) -> usize {
    messages.iter().map(estimate_message_tokens).sum()
}

/// The context-window ceiling for a model, in tokens.
///
/// Unknown models get the conservative 8k default.
pub fn context_window(model: &str) -> usize {
    if model.starts_with("gpt-4o") || model.starts_with("gpt-4.1") {
        128_000
    } else if model.starts_with("gpt-3.5-turbo") {
        16_385
    } else {
        // gpt-4 and anything unrecognized
        8_192
    }
}

/// Prompt + output reservation exceed the model's context window.
#[derive(Debug, Clone, Error)]
#[error(
    "prompt ({prompt_tokens} tokens) + reserved output ({reserved_output} tokens) \
     exceed the {window}-token window of {model}"
)]
pub struct BudgetExceeded {
    pub model: String,
    pub prompt_tokens: usize,
    pub reserved_output: usize,
    pub window: usize,
}

/// Verify that `messages` plus the output reservation fit the model's
/// context window. Returns the estimated prompt token count.
pub fn check_budget(
    messages: &[Message],
    model: &str,
    max_output_tokens: u32,
) -> Result<usize, BudgetExceeded> {
    let prompt_tokens = estimate_messages_tokens(messages);
    let reserved_output = max_output_tokens as usize;
    let window = context_window(model);

    if prompt_tokens + reserved_output > window {
        return Err(BudgetExceeded {
            model: model.to_string(),
            prompt_tokens,
            reserved_output,
            window,
        });
    }

    Ok(prompt_tokens)
}

#[cfg(test)]
mod tests {
    use super::*;
    use caremind_core::message::{MessageContent, MessagePart};

    #[test]
    fn empty_string_is_zero() {
        assert_eq!(estimate_tokens(""), 0);
    }

    #[test]
    fn four_chars_is_one_token() {
        assert_eq!(estimate_tokens("test"), 1);
    }

    #[test]
    fn five_chars_rounds_up() {
        assert_eq!(estimate_tokens("hello"), 2);
    }

    #[test]
    fn message_includes_overhead() {
        let msg = Message::user("test"); // 4 chars → 1 token + 4 overhead = 5
        assert_eq!(estimate_message_tokens(&msg), 5);
    }

    #[test]
    fn multiple_messages() {
        let msgs = vec![
            Message::user("hello"),      // 5 chars → 2 tokens + 4 overhead = 6
            Message::assistant("world"), // 5 chars → 2 tokens + 4 overhead = 6
        ];
        assert_eq!(estimate_messages_tokens(&msgs), 12);
    }

    #[test]
    fn multipart_counts_text_parts_only() {
        let msg = Message::user(MessageContent::Parts(vec![
            MessagePart::Text {
                text: "abcdefgh".into(), // 8 chars → 2 tokens
            },
            MessagePart::Image {
                url: "https://example.com/very-long-image-url.png".into(),
            },
        ]));
        assert_eq!(estimate_message_tokens(&msg), 6);
    }

    #[test]
    fn window_by_model_family() {
        assert_eq!(context_window("gpt-4o"), 128_000);
        assert_eq!(context_window("gpt-4o-mini"), 128_000);
        assert_eq!(context_window("gpt-4.1"), 128_000);
        assert_eq!(context_window("gpt-4"), 8_192);
        assert_eq!(context_window("gpt-3.5-turbo"), 16_385);
        assert_eq!(context_window("unknown-model"), 8_192);
    }

    #[test]
    fn budget_ok_for_small_prompt() {
        let msgs = vec![Message::user("short question")];
        let tokens = check_budget(&msgs, "gpt-4o", 400).unwrap();
        assert!(tokens > 0);
    }

    #[test]
    fn budget_exceeded_for_huge_prompt() {
        let msgs = vec![Message::user("x".repeat(40_000))];
        let err = check_budget(&msgs, "gpt-4", 400).unwrap_err();
        assert_eq!(err.window, 8_192);
        assert!(err.prompt_tokens > err.window);
        assert!(err.to_string().contains("gpt-4"));
    }

    #[test]
    fn output_reservation_counts_against_window() {
        // ~7900 prompt tokens fits an 8192 window alone but not with a
        // 400-token reservation
        let msgs = vec![Message::user("x".repeat(31_600))];
        assert!(check_budget(&msgs, "gpt-4", 0).is_ok());
        assert!(check_budget(&msgs, "gpt-4", 400).is_err());
    }
}
