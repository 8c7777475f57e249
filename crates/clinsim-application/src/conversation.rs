//! Per-turn orchestration of one simulated conversation.
//!
//! A `ConversationEngine` owns the session's engines and processes one
//! logical turn at a time. It is deliberately not internally synchronized:
//! callers must serialize turns per session (one in-flight
//! `process_user_message` per session id). Independent sessions share
//! nothing but the read-only vignette behind an `Arc`.

use chrono::Utc;
use clinsim_core::assessment::AssessmentEngine;
use clinsim_core::emotion::{AppliedModifier, EmotionalStateTracker};
use clinsim_core::error::{ClinsimError, Result};
use clinsim_core::phase::{PhaseManager, TransitionRecord};
use clinsim_core::session::{
    AssessmentScores, ConversationMessage, MessageSender, SessionState,
};
use clinsim_core::vignette::{Difficulty, Vignette};
use clinsim_interaction::{ContextBuilder, GenerationProvider, GenerationResponse};
use std::sync::Arc;
use uuid::Uuid;

/// Everything produced by one completed turn.
#[derive(Debug, Clone)]
pub struct TurnOutcome {
    /// The generated avatar reply
    pub response: GenerationResponse,
    /// Phase transition, when one occurred this turn
    pub transition: Option<TransitionRecord>,
    /// Emotional modifiers applied by message analysis
    pub applied_modifiers: Vec<AppliedModifier>,
    /// Scores after this turn's assessment
    pub scores: AssessmentScores,
    /// Versioned snapshot of the full session state
    pub session: SessionState,
}

/// Orchestrates one session's turn pipeline.
pub struct ConversationEngine {
    vignette: Arc<Vignette>,
    difficulty: Difficulty,
    provider: Arc<dyn GenerationProvider>,
    tracker: EmotionalStateTracker,
    phases: PhaseManager,
    assessment: AssessmentEngine,
    session: SessionState,
    next_message_id: u64,
}

impl ConversationEngine {
    /// Starts a new session over a vignette at the chosen difficulty.
    pub fn new(
        vignette: Arc<Vignette>,
        difficulty: Difficulty,
        provider: Arc<dyn GenerationProvider>,
    ) -> Result<Self> {
        let phases = PhaseManager::new(vignette.clone())?;
        let opening_disposition = vignette.phases.first().and_then(|p| p.initial_disposition);
        let tracker = EmotionalStateTracker::new(
            vignette.emotional_tracking.clone(),
            difficulty,
            opening_disposition,
        );
        let assessment = AssessmentEngine::new(vignette.assessment.clone());
        let now = Utc::now();
        let session = SessionState {
            id: Uuid::new_v4().to_string(),
            vignette_id: vignette.id.clone(),
            difficulty,
            phase: phases.phase_state(),
            emotional: tracker.snapshot(),
            branch_history: Vec::new(),
            messages: Vec::new(),
            revealed_stages: Vec::new(),
            scores: AssessmentScores::default(),
            started_at: now,
            updated_at: now,
            revision: 0,
        };
        Ok(Self {
            vignette,
            difficulty,
            provider,
            tracker,
            phases,
            assessment,
            session,
            next_message_id: 0,
        })
    }

    /// Rebuilds an engine from a persisted snapshot.
    ///
    /// Scores are recomputed with a cumulative assessment pass over the
    /// restored trainee messages.
    pub fn restore(
        vignette: Arc<Vignette>,
        provider: Arc<dyn GenerationProvider>,
        snapshot: SessionState,
    ) -> Result<Self> {
        let phases = PhaseManager::from_snapshot(
            vignette.clone(),
            snapshot.phase.clone(),
            snapshot.branch_history.clone(),
        )?;
        let tracker = EmotionalStateTracker::from_snapshot(
            vignette.emotional_tracking.clone(),
            snapshot.difficulty,
            &snapshot.emotional,
        );
        let mut assessment = AssessmentEngine::new(vignette.assessment.clone());
        let user_texts: Vec<String> = snapshot
            .user_messages()
            .iter()
            .map(|m| m.text.clone())
            .collect();
        let scores = if user_texts.is_empty() {
            snapshot.scores
        } else {
            assessment.assess_conversation(&user_texts)
        };
        let next_message_id = snapshot.messages.iter().map(|m| m.id + 1).max().unwrap_or(0);
        let difficulty = snapshot.difficulty;
        let mut session = snapshot;
        session.scores = scores;
        Ok(Self {
            vignette,
            difficulty,
            provider,
            tracker,
            phases,
            assessment,
            session,
            next_message_id,
        })
    }

    /// Latest session snapshot.
    pub fn session_snapshot(&self) -> SessionState {
        self.session.clone()
    }

    /// True only when the final phase is active and all of its objectives
    /// are completed.
    pub fn is_complete(&self) -> bool {
        self.phases.is_final_phase() && self.phases.phase_state().objectives_pending.is_empty()
    }

    /// Coarse progress in [0, 1]: 70% phase progression, 30% objective
    /// completion within the current phase.
    pub fn progress(&self) -> f32 {
        let phase_fraction = self.phases.progression_percent() / 100.0;
        let state = self.phases.phase_state();
        let total = state.objectives_completed.len() + state.objectives_pending.len();
        let objective_fraction = if total == 0 {
            1.0
        } else {
            state.objectives_completed.len() as f32 / total as f32
        };
        0.7 * phase_fraction + 0.3 * objective_fraction
    }

    /// Marks an information-revelation stage as disclosed to the trainee.
    /// Returns false when the stage was already revealed.
    pub fn reveal_stage(&mut self, name: &str) -> Result<bool> {
        if self.vignette.revelation_stages.iter().all(|s| s.name != name) {
            return Err(ClinsimError::not_found("revelation stage", name.to_string()));
        }
        if self.session.revealed_stages.iter().any(|s| s == name) {
            return Ok(false);
        }
        self.session.revealed_stages.push(name.to_string());
        Ok(true)
    }

    /// Debug/test escape hatch; see [`PhaseManager::reset_to_phase`].
    pub fn reset_to_phase(&mut self, phase_id: &str) -> Result<()> {
        self.phases.reset_to_phase(phase_id, Utc::now())?;
        self.sync_session();
        Ok(())
    }

    fn next_message_id(&mut self) -> u64 {
        let id = self.next_message_id;
        self.next_message_id += 1;
        id
    }

    fn append_message(
        &mut self,
        text: &str,
        sender: MessageSender,
        emotional_delta: Option<f32>,
    ) {
        let message = ConversationMessage {
            id: self.next_message_id(),
            text: text.to_string(),
            sender,
            timestamp: Utc::now(),
            phase_id: self.phases.phase_state().phase_id,
            emotional_delta,
        };
        self.session.messages.push(message);
    }

    fn sync_session(&mut self) {
        self.session.phase = self.phases.phase_state();
        self.session.emotional = self.tracker.snapshot();
        self.session.scores = self.assessment.scores();
        self.session.branch_history = self.phases.branch_history().to_vec();
        self.session.updated_at = Utc::now();
    }

    // A reply that spells out a withheld stage's content means the
    // character has disclosed it; record the stage as revealed.
    fn detect_revelations(&mut self, reply: &str) {
        let lower = reply.to_lowercase();
        for stage in &self.vignette.revelation_stages {
            if self.session.revealed_stages.iter().any(|s| s == &stage.name) {
                continue;
            }
            if lower.contains(&stage.content.to_lowercase()) {
                self.session.revealed_stages.push(stage.name.clone());
            }
        }
    }

    /// Processes one trainee message through the full turn pipeline.
    ///
    /// Pipeline: validate input, append the trainee message, apply
    /// emotional modifiers, assess the message, check objective triggers
    /// and branch conditions, build the provider context, invoke the
    /// provider, and append the avatar reply.
    ///
    /// Failure policy: empty input is rejected before any mutation. When
    /// the provider call fails, the emotional and assessment updates
    /// already applied this turn are kept, no avatar message is appended,
    /// and the snapshot revision is not bumped; callers decide whether to
    /// retry the provider call with a fresh turn.
    pub async fn process_user_message(&mut self, text: &str) -> Result<TurnOutcome> {
        if text.trim().is_empty() {
            return Err(ClinsimError::input("empty trainee message"));
        }
        let span = tracing::info_span!("turn", session = %self.session.id);
        let _guard = span.enter();

        self.append_message(text, MessageSender::User, None);

        let applied_modifiers = self.tracker.analyze_message(text);
        let scores = self.assessment.assess_message(text);

        self.phases.check_objective_triggers(text)?;
        let transition = self.phases.evaluate_branch(text, self.tracker.value())?;
        if let Some(record) = &transition {
            if record.emotional_delta != 0.0 {
                self.tracker.apply_delta(
                    record.emotional_delta,
                    format!("branch '{}' fired", record.trigger),
                );
            }
        }

        self.sync_session();
        let context =
            ContextBuilder::build(&self.vignette, self.difficulty, &self.session, text)?;

        let response = self
            .provider
            .get_response(text, &context, &self.session.messages)
            .await?;

        if let Some(delta) = response.emotional_delta {
            if delta != 0.0 {
                self.tracker.apply_delta(delta, "reply affect estimate");
            }
        }
        self.detect_revelations(&response.text);
        self.append_message(&response.text, MessageSender::Avatar, response.emotional_delta);

        self.session.revision += 1;
        self.sync_session();
        tracing::debug!(
            revision = self.session.revision,
            phase = %self.session.phase.phase_id,
            "turn complete"
        );

        Ok(TurnOutcome {
            response,
            transition,
            applied_modifiers,
            scores,
            session: self.session.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use clinsim_core::vignette::test_fixtures::sample_vignette;
    use clinsim_interaction::{ResponseContext, ScriptedProvider};

    struct FailingProvider;

    #[async_trait]
    impl GenerationProvider for FailingProvider {
        async fn get_response(
            &self,
            _message: &str,
            _context: &ResponseContext,
            _history: &[ConversationMessage],
        ) -> Result<GenerationResponse> {
            Err(ClinsimError::provider("backend timed out"))
        }
    }

    fn engine_with(provider: Arc<dyn GenerationProvider>) -> ConversationEngine {
        ConversationEngine::new(Arc::new(sample_vignette()), Difficulty::Medium, provider)
            .unwrap()
    }

    fn scripted_engine() -> ConversationEngine {
        engine_with(Arc::new(ScriptedProvider::new([
            "What do you mean by that?",
            "Just tell me what happened to my mother.",
            "Thank you for being straight with me.",
        ])))
    }

    #[tokio::test]
    async fn a_turn_appends_both_messages_and_bumps_revision() {
        let mut engine = scripted_engine();
        let outcome = engine
            .process_user_message("Hello, thank you for coming in today.")
            .await
            .unwrap();
        assert_eq!(outcome.session.revision, 1);
        assert_eq!(outcome.session.messages.len(), 2);
        assert_eq!(outcome.session.messages[0].sender, MessageSender::User);
        assert_eq!(outcome.session.messages[1].sender, MessageSender::Avatar);
        assert_eq!(outcome.response.text, "What do you mean by that?");
    }

    #[tokio::test]
    async fn empty_input_is_rejected_before_any_mutation() {
        let mut engine = scripted_engine();
        let before = engine.session_snapshot();
        let err = engine.process_user_message("   ").await.unwrap_err();
        assert!(err.is_input());
        let after = engine.session_snapshot();
        assert_eq!(before.revision, after.revision);
        assert_eq!(before.messages.len(), after.messages.len());
        assert_eq!(before.emotional.history.len(), after.emotional.history.len());
    }

    #[tokio::test]
    async fn provider_failure_keeps_partial_effects_but_no_reply() {
        let mut engine = engine_with(Arc::new(FailingProvider));
        let err = engine
            .process_user_message("I understand this has been frightening.")
            .await
            .unwrap_err();
        assert!(err.is_provider());
        let session = engine.session_snapshot();
        // The trainee message and the emotional update survive.
        assert_eq!(session.messages.len(), 1);
        assert!(session.emotional.history.len() > 1);
        // The turn is not confirmed.
        assert_eq!(session.revision, 0);
        assert!(!session.messages.iter().any(|m| m.sender == MessageSender::Avatar));
    }

    #[tokio::test]
    async fn defensive_message_branches_and_escalates() {
        let mut engine = scripted_engine();
        let before = engine.session_snapshot().emotional.value;
        let outcome = engine
            .process_user_message("It's not my fault, I was following protocol.")
            .await
            .unwrap();
        let transition = outcome.transition.expect("defensive branch should fire");
        assert_eq!(transition.to_phase, "disclosure");
        assert_eq!(transition.trigger, "defensive");
        assert!(outcome.session.emotional.value > before);
        assert_eq!(outcome.session.phase.phase_id, "disclosure");
        // The avatar reply is tagged with the post-transition phase.
        assert_eq!(outcome.session.messages[1].phase_id, "disclosure");
    }

    #[tokio::test]
    async fn scores_update_each_turn() {
        let mut engine = scripted_engine();
        let outcome = engine
            .process_user_message("I understand how hard this is for you.")
            .await
            .unwrap();
        assert!(outcome.scores.empathy > 0.5);
        assert_eq!(outcome.session.scores, outcome.scores);
    }

    #[tokio::test]
    async fn progress_and_completion_track_phases_and_objectives() {
        let mut engine = scripted_engine();
        assert!(!engine.is_complete());
        assert_eq!(engine.progress(), 0.0);

        engine.reset_to_phase("resolution").unwrap();
        assert!(!engine.is_complete());
        let outcome = engine
            .process_user_message("The next step is a full review, and we will keep you informed.")
            .await
            .unwrap();
        assert!(outcome.session.phase.objectives_pending.is_empty());
        assert!(engine.is_complete());
        assert!((engine.progress() - 1.0).abs() < 1e-6);
    }

    #[tokio::test]
    async fn restore_preserves_state_and_reassesses_cumulatively() {
        let mut engine = scripted_engine();
        engine
            .process_user_message("I understand how hard this is for you.")
            .await
            .unwrap();
        let outcome = engine
            .process_user_message("I'm sorry - the result was missed and we failed to act.")
            .await
            .unwrap();
        let snapshot = outcome.session.clone();

        let restored = ConversationEngine::restore(
            Arc::new(sample_vignette()),
            Arc::new(ScriptedProvider::new(Vec::<String>::new())),
            snapshot.clone(),
        )
        .unwrap();
        let restored_session = restored.session_snapshot();
        assert_eq!(restored_session.id, snapshot.id);
        assert_eq!(restored_session.messages, snapshot.messages);
        assert_eq!(restored_session.phase.phase_id, snapshot.phase.phase_id);
        assert!(restored_session.scores.overall > 0.0);
    }

    #[tokio::test]
    async fn reveal_stage_is_explicit_and_idempotent() {
        let mut engine = scripted_engine();
        assert!(engine.reveal_stage("timeline").unwrap());
        assert!(!engine.reveal_stage("timeline").unwrap());
        assert!(engine.reveal_stage("unknown").is_err());
        assert_eq!(engine.session_snapshot().revealed_stages, vec!["timeline"]);
    }

    #[tokio::test]
    async fn message_ids_are_monotonic_within_a_session() {
        let mut engine = scripted_engine();
        engine.process_user_message("Hello there.").await.unwrap();
        engine
            .process_user_message("I wanted to talk about the lab result.")
            .await
            .unwrap();
        let ids: Vec<u64> = engine.session_snapshot().messages.iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![0, 1, 2, 3]);
    }
}
