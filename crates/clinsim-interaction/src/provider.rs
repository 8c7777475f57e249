//! Generation provider boundary.
//!
//! The simulation core is agnostic to which text-generation backend
//! produces the character's dialogue; it only requires an awaitable call
//! returning text and an optional emotional-impact estimate. Retry policy
//! belongs to the caller's provider adapter, not to this trait.

use crate::context::ResponseContext;
use async_trait::async_trait;
use clinsim_core::Result;
use clinsim_core::session::ConversationMessage;
use serde::{Deserialize, Serialize};

/// A generated avatar reply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationResponse {
    /// The character's reply text
    pub text: String,
    /// Provider-estimated emotional impact of the reply on the character,
    /// clamped to [-0.3, 0.3]. `None` when the provider does not estimate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emotional_delta: Option<f32>,
}

/// External collaborator that generates the character's next utterance.
#[async_trait]
pub trait GenerationProvider: Send + Sync {
    /// Generates the avatar's reply to a trainee message given the
    /// assembled context and recent history.
    async fn get_response(
        &self,
        message: &str,
        context: &ResponseContext,
        history: &[ConversationMessage],
    ) -> Result<GenerationResponse>;

    /// Incremental delivery. The default implementation yields the full
    /// response as a single chunk; streaming backends override this.
    async fn stream_response(
        &self,
        message: &str,
        context: &ResponseContext,
        history: &[ConversationMessage],
    ) -> Result<Vec<String>> {
        let response = self.get_response(message, context, history).await?;
        Ok(vec![response.text])
    }
}

/// Words in a reply that signal negative affect; their presence means the
/// exchange is escalating the character.
const NEGATIVE_AFFECT: &[&str] = &[
    "angry",
    "furious",
    "outraged",
    "unacceptable",
    "how dare",
    "can't believe",
    "lawyer",
    "fault",
    "disgusted",
    "done talking",
];

/// Words that signal de-escalation or gratitude.
const POSITIVE_AFFECT: &[&str] = &[
    "thank you",
    "thanks",
    "appreciate",
    "relieved",
    "grateful",
    "that helps",
    "i see now",
    "okay",
];

/// Estimates the emotional impact of a generated reply by simple keyword
/// scanning: negative-affect words push the delta up (the character is
/// escalating), gratitude/positive words pull it down. Clamped to ±0.3.
pub fn estimate_emotional_delta(response_text: &str) -> f32 {
    let lower = response_text.to_lowercase();
    let negative = NEGATIVE_AFFECT.iter().filter(|w| lower.contains(**w)).count();
    let positive = POSITIVE_AFFECT.iter().filter(|w| lower.contains(**w)).count();
    (0.05 * negative as f32 - 0.05 * positive as f32).clamp(-0.3, 0.3)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_affect_words_produce_positive_delta() {
        let delta = estimate_emotional_delta("This is unacceptable. I am furious.");
        assert!(delta > 0.0);
    }

    #[test]
    fn gratitude_produces_negative_delta() {
        let delta = estimate_emotional_delta("Thank you, I appreciate you being honest with me.");
        assert!(delta < 0.0);
    }

    #[test]
    fn delta_is_clamped() {
        let tirade = "angry furious outraged unacceptable lawyer fault disgusted ".repeat(3);
        assert_eq!(estimate_emotional_delta(&tirade), 0.3);
        let praise = "thank you thanks appreciate relieved grateful that helps okay ".repeat(3);
        assert_eq!(estimate_emotional_delta(&praise), -0.3);
    }

    #[test]
    fn neutral_text_yields_zero() {
        assert_eq!(estimate_emotional_delta("When did you find out?"), 0.0);
    }
}
