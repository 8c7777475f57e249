//! Deterministic context assembly for the generation provider.
//!
//! `ContextBuilder::build` is a pure function of (vignette, difficulty,
//! session state, message): no clocks, no randomness, no side effects. The
//! resulting `ResponseContext` carries everything the provider needs to
//! keep the character in role, and `to_prompt` renders it as a single
//! system-prompt string.

use clinsim_core::emotion::ResponseIntensity;
use clinsim_core::error::{ClinsimError, Result};
use clinsim_core::session::{ConversationMessage, MessageSender, SessionState};
use clinsim_core::vignette::{Difficulty, DifficultyProfile, ResponseStyle, Vignette};
use serde::{Deserialize, Serialize};

/// Maximum number of history turns included in the context.
pub const MAX_HISTORY_TURNS: usize = 10;

/// One prior turn included in the context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryTurn {
    /// "trainee" or the character's name
    pub speaker: String,
    pub text: String,
}

/// Structured context for one avatar reply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseContext {
    /// Character identity
    pub character_name: String,
    pub identity: String,
    pub personality: String,
    pub vocabulary_style: String,
    /// Difficulty tier and its behavioral profile
    pub difficulty: Difficulty,
    pub difficulty_profile: DifficultyProfile,
    /// Current emotional state
    pub emotional_value: f32,
    pub emotional_label: String,
    pub response_intensity: ResponseIntensity,
    /// Active phase
    pub phase_name: String,
    pub phase_objective: String,
    /// What the dialogue should focus on, when the phase declares it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub focus: Option<String>,
    /// Facts the character must not reveal during this phase
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub information_boundary: Option<String>,
    /// Information the character already shared with the trainee
    pub revealed_information: Vec<String>,
    /// Information from unrevealed stages the character must hold back
    pub withheld_information: Vec<String>,
    /// Delivery guidance derived from style config and current intensity
    pub style_guidance: Vec<String>,
    /// Last turns, oldest first, capped at [`MAX_HISTORY_TURNS`]
    pub recent_history: Vec<HistoryTurn>,
    /// The trainee message being replied to
    pub message: String,
}

/// Assembles `ResponseContext` values from current session state.
pub struct ContextBuilder;

impl ContextBuilder {
    /// Builds the context for the next avatar reply.
    ///
    /// Fails only when the session references a phase the vignette does not
    /// define, which is a configuration bug.
    pub fn build(
        vignette: &Vignette,
        difficulty: Difficulty,
        session: &SessionState,
        message: &str,
    ) -> Result<ResponseContext> {
        let phase = vignette.phase(&session.phase.phase_id).ok_or_else(|| {
            ClinsimError::not_found("phase", session.phase.phase_id.clone())
        })?;

        let intensity = ResponseIntensity::for_value(session.emotional.value);
        let revealed_information: Vec<String> = vignette
            .revelation_stages
            .iter()
            .filter(|s| session.revealed_stages.contains(&s.name))
            .map(|s| s.content.clone())
            .collect();
        let withheld_information: Vec<String> = vignette
            .revelation_stages
            .iter()
            .filter(|s| !session.revealed_stages.contains(&s.name))
            .map(|s| s.content.clone())
            .collect();

        Ok(ResponseContext {
            character_name: vignette.character.name.clone(),
            identity: vignette.character.identity.clone(),
            personality: vignette.character.personality.clone(),
            vocabulary_style: vignette.character.vocabulary_style.clone(),
            difficulty,
            difficulty_profile: vignette.character.profile_for(difficulty),
            emotional_value: session.emotional.value,
            emotional_label: session.emotional.label.clone(),
            response_intensity: intensity,
            phase_name: phase.name.clone(),
            phase_objective: phase.objective.clone(),
            focus: phase.focus.clone(),
            information_boundary: phase.information_boundary.clone(),
            revealed_information,
            withheld_information,
            style_guidance: Self::style_guidance(&vignette.response_style, intensity),
            recent_history: Self::history_window(&vignette.character.name, &session.messages),
            message: message.to_string(),
        })
    }

    fn history_window(character_name: &str, messages: &[ConversationMessage]) -> Vec<HistoryTurn> {
        let start = messages.len().saturating_sub(MAX_HISTORY_TURNS);
        messages[start..]
            .iter()
            .map(|m| HistoryTurn {
                speaker: match m.sender {
                    MessageSender::User => "trainee".to_string(),
                    MessageSender::Avatar => character_name.to_string(),
                },
                text: m.text.clone(),
            })
            .collect()
    }

    fn style_guidance(style: &ResponseStyle, intensity: ResponseIntensity) -> Vec<String> {
        let mut guidance = vec![format!("Keep replies {} in length.", style.length)];
        match intensity {
            ResponseIntensity::Calm => {
                guidance.push("Speak in a measured, settled tone.".to_string());
            }
            ResponseIntensity::Moderate => {
                guidance.push("Let tension show in word choice and pacing.".to_string());
            }
            ResponseIntensity::Intense => {
                guidance.push("Responses are emotionally charged and harder to steer.".to_string());
                if style.allow_interruptions {
                    guidance.push("You may cut the trainee off mid-sentence.".to_string());
                }
                if style.use_silence {
                    guidance.push("You may answer with pointed silence.".to_string());
                }
            }
        }
        guidance
    }
}

impl ResponseContext {
    /// Renders the context as a single system-prompt string.
    pub fn to_prompt(&self) -> String {
        let mut prompt = format!(
            "# Character Profile\n**Name**: {}\n**Identity**: {}\n\n## Personality\n{}\n\n## Vocabulary\n{}\n",
            self.character_name, self.identity, self.personality, self.vocabulary_style
        );

        prompt.push_str(&format!(
            "\n## Current Emotional State\nYou are {} (intensity {:.2}, {} delivery).\n",
            self.emotional_label,
            self.emotional_value,
            match self.response_intensity {
                ResponseIntensity::Calm => "calm",
                ResponseIntensity::Moderate => "moderate",
                ResponseIntensity::Intense => "intense",
            }
        ));

        let profile = &self.difficulty_profile;
        if !profile.traits.is_empty() {
            prompt.push_str(&format!("Behavioral traits: {}.\n", profile.traits.join("; ")));
        }
        if !profile.response_tendencies.is_empty() {
            prompt.push_str(&format!(
                "You tend to: {}.\n",
                profile.response_tendencies.join("; ")
            ));
        }

        prompt.push_str(&format!(
            "\n## Scene\nPhase: {} - {}\n",
            self.phase_name, self.phase_objective
        ));
        if let Some(focus) = &self.focus {
            prompt.push_str(&format!("Focus: {}\n", focus));
        }

        if self.information_boundary.is_some() || !self.withheld_information.is_empty() {
            prompt.push_str("\n## Information Boundary\n");
            if let Some(boundary) = &self.information_boundary {
                prompt.push_str(&format!("{}\n", boundary));
            }
            for fact in &self.withheld_information {
                prompt.push_str(&format!("Do not volunteer: {}\n", fact));
            }
        }
        if !self.revealed_information.is_empty() {
            prompt.push_str("\n## Already Shared\n");
            for fact in &self.revealed_information {
                prompt.push_str(&format!("- {}\n", fact));
            }
        }

        prompt.push_str("\n## Response Guidelines\n");
        for line in &self.style_guidance {
            prompt.push_str(&format!("- {}\n", line));
        }

        if !self.recent_history.is_empty() {
            prompt.push_str("\n# Conversation History\n");
            for turn in &self.recent_history {
                prompt.push_str(&format!("{}: {}\n", turn.speaker, turn.text));
            }
        }

        prompt.push_str(&format!("\n# Trainee Message\n{}\n", self.message));
        prompt
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use clinsim_core::session::{
        AssessmentScores, EmotionalSnapshot, PhaseState, SessionState,
    };
    use clinsim_core::vignette::test_fixtures::sample_vignette;

    fn session(vignette: &Vignette) -> SessionState {
        let now = Utc::now();
        SessionState {
            id: "session-1".to_string(),
            vignette_id: vignette.id.clone(),
            difficulty: Difficulty::Hard,
            phase: PhaseState {
                phase_id: "disclosure".to_string(),
                started_at: now,
                objectives_completed: Vec::new(),
                objectives_pending: Vec::new(),
            },
            emotional: EmotionalSnapshot {
                value: 0.8,
                label: "angry".to_string(),
                history: Vec::new(),
            },
            branch_history: Vec::new(),
            messages: (0..15)
                .map(|i| ConversationMessage {
                    id: i,
                    text: format!("turn {i}"),
                    sender: if i % 2 == 0 {
                        MessageSender::User
                    } else {
                        MessageSender::Avatar
                    },
                    timestamp: now,
                    phase_id: "disclosure".to_string(),
                    emotional_delta: None,
                })
                .collect(),
            revealed_stages: vec!["timeline".to_string()],
            scores: AssessmentScores::default(),
            started_at: now,
            updated_at: now,
            revision: 1,
        }
    }

    #[test]
    fn build_is_deterministic() {
        let vignette = sample_vignette();
        let session = session(&vignette);
        let a = ContextBuilder::build(&vignette, Difficulty::Hard, &session, "What happened?")
            .unwrap();
        let b = ContextBuilder::build(&vignette, Difficulty::Hard, &session, "What happened?")
            .unwrap();
        assert_eq!(a, b);
        assert_eq!(a.to_prompt(), b.to_prompt());
    }

    #[test]
    fn history_is_capped_at_ten_turns() {
        let vignette = sample_vignette();
        let session = session(&vignette);
        let context =
            ContextBuilder::build(&vignette, Difficulty::Hard, &session, "And then?").unwrap();
        assert_eq!(context.recent_history.len(), MAX_HISTORY_TURNS);
        assert_eq!(context.recent_history.last().unwrap().text, "turn 14");
    }

    #[test]
    fn revelation_stages_split_into_shared_and_withheld() {
        let vignette = sample_vignette();
        let session = session(&vignette);
        let context =
            ContextBuilder::build(&vignette, Difficulty::Hard, &session, "Why the delay?")
                .unwrap();
        assert_eq!(context.revealed_information.len(), 1);
        assert_eq!(context.withheld_information.len(), 1);
        let prompt = context.to_prompt();
        assert!(prompt.contains("Do not volunteer: A coverage gap"));
        assert!(prompt.contains("- The abnormal result sat unreviewed"));
    }

    #[test]
    fn intense_state_unlocks_interruption_guidance() {
        let vignette = sample_vignette();
        let session = session(&vignette);
        let context =
            ContextBuilder::build(&vignette, Difficulty::Hard, &session, "Please hear me out.")
                .unwrap();
        assert!(context
            .style_guidance
            .iter()
            .any(|g| g.contains("cut the trainee off")));
    }

    #[test]
    fn unknown_phase_is_a_config_bug() {
        let vignette = sample_vignette();
        let mut session = session(&vignette);
        session.phase.phase_id = "ghost".to_string();
        let err = ContextBuilder::build(&vignette, Difficulty::Hard, &session, "Hello")
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn hard_tier_profile_reaches_the_prompt() {
        let vignette = sample_vignette();
        let session = session(&vignette);
        let prompt = ContextBuilder::build(&vignette, Difficulty::Hard, &session, "Hi")
            .unwrap()
            .to_prompt();
        assert!(prompt.contains("interrupts frequently"));
        assert!(prompt.contains("demands names and dates"));
    }
}
