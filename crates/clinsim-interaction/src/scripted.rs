//! A scripted generation provider for tests, demos and offline development.
//!
//! Replies are served from a queue; when the queue runs dry the provider
//! falls back to a fixed line. Every call is recorded so tests can inspect
//! the prompts the engine produced.

use crate::context::ResponseContext;
use crate::provider::{GenerationProvider, GenerationResponse, estimate_emotional_delta};
use async_trait::async_trait;
use clinsim_core::Result;
use clinsim_core::session::ConversationMessage;
use std::collections::VecDeque;
use tokio::sync::Mutex;

/// One recorded provider invocation.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub message: String,
    pub prompt: String,
}

/// Serves canned avatar replies in order.
pub struct ScriptedProvider {
    responses: Mutex<VecDeque<String>>,
    fallback: String,
    calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedProvider {
    /// Creates a provider that will serve `responses` in order.
    pub fn new(responses: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            responses: Mutex::new(responses.into_iter().map(Into::into).collect()),
            fallback: "I don't know what to say to that.".to_string(),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Replaces the line served once the scripted queue is exhausted.
    pub fn with_fallback(mut self, fallback: impl Into<String>) -> Self {
        self.fallback = fallback.into();
        self
    }

    /// Calls made so far, in order.
    pub async fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().await.clone()
    }
}

#[async_trait]
impl GenerationProvider for ScriptedProvider {
    async fn get_response(
        &self,
        message: &str,
        context: &ResponseContext,
        _history: &[ConversationMessage],
    ) -> Result<GenerationResponse> {
        self.calls.lock().await.push(RecordedCall {
            message: message.to_string(),
            prompt: context.to_prompt(),
        });
        let text = self
            .responses
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone());
        let delta = estimate_emotional_delta(&text);
        Ok(GenerationResponse {
            text,
            emotional_delta: Some(delta),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use clinsim_core::session::{
        AssessmentScores, EmotionalSnapshot, PhaseState, SessionState,
    };
    use clinsim_core::vignette::Difficulty;
    use clinsim_core::vignette::test_fixtures::sample_vignette;

    fn context() -> ResponseContext {
        let vignette = sample_vignette();
        let now = Utc::now();
        let session = SessionState {
            id: "s".to_string(),
            vignette_id: vignette.id.clone(),
            difficulty: Difficulty::Medium,
            phase: PhaseState {
                phase_id: "opening".to_string(),
                started_at: now,
                objectives_completed: Vec::new(),
                objectives_pending: Vec::new(),
            },
            emotional: EmotionalSnapshot {
                value: 0.5,
                label: "upset".to_string(),
                history: Vec::new(),
            },
            branch_history: Vec::new(),
            messages: Vec::new(),
            revealed_stages: Vec::new(),
            scores: AssessmentScores::default(),
            started_at: now,
            updated_at: now,
            revision: 0,
        };
        crate::context::ContextBuilder::build(&vignette, Difficulty::Medium, &session, "Hello")
            .unwrap()
    }

    #[tokio::test]
    async fn serves_scripted_replies_then_fallback() {
        let provider = ScriptedProvider::new(["Who reviewed the labs?"])
            .with_fallback("I have nothing more to say.");
        let ctx = context();
        let first = provider.get_response("Hello", &ctx, &[]).await.unwrap();
        assert_eq!(first.text, "Who reviewed the labs?");
        let second = provider.get_response("Hello again", &ctx, &[]).await.unwrap();
        assert_eq!(second.text, "I have nothing more to say.");
        assert_eq!(provider.calls().await.len(), 2);
    }

    #[tokio::test]
    async fn attaches_keyword_based_delta_estimate() {
        let provider = ScriptedProvider::new(["Thank you for being honest with me."]);
        let ctx = context();
        let response = provider.get_response("Hi", &ctx, &[]).await.unwrap();
        assert!(response.emotional_delta.unwrap() < 0.0);
    }
}
