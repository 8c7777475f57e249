//! Vignette domain model.
//!
//! A vignette is an authored training scenario: an ordered sequence of
//! conversation phases, assessment hooks for scoring trainee messages,
//! an emotional tracking configuration, and the simulated character's
//! profile. Vignettes are immutable inputs, authored offline and shared
//! read-only across sessions.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use strum_macros::{Display, EnumString};

/// Difficulty tier of a training session.
///
/// Affects the character's initial emotional intensity, modifier
/// sensitivity, and which behavioral profile the context builder uses.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, Default,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl Difficulty {
    /// Base emotional intensity for a session at this tier, used when the
    /// opening phase does not declare its own disposition.
    pub fn base_intensity(&self) -> f32 {
        match self {
            Difficulty::Easy => 0.3,
            Difficulty::Medium => 0.5,
            Difficulty::Hard => 0.7,
        }
    }
}

/// A checklist item the trainee is expected to accomplish within a phase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearnerObjective {
    /// Objective text, also used as its identity for completion tracking
    pub text: String,
    /// Keywords that mark the objective as completed when they appear in a
    /// trainee message (lower-cased substring match)
    #[serde(default)]
    pub trigger_keywords: Vec<String>,
}

/// A named condition on a phase that forces a transition when matched.
///
/// Branch points are evaluated in declaration order; the first matching
/// condition wins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BranchPoint {
    /// Condition name. Either one of the built-in heuristics
    /// (`clear_empathetic`, `medical_jargon`, `defensive`,
    /// `objective_completed`, `time_elapsed`) or a custom literal that is
    /// substring-matched against the trainee message.
    pub condition: String,
    /// Phase id to transition to when the condition matches
    pub next_phase: String,
    /// Signed emotional delta applied to the character on transition
    #[serde(default)]
    pub emotional_delta: f32,
    /// Author-facing description of the branch
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// One scripted step of the conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseDef {
    /// Unique phase identifier within the vignette
    pub id: String,
    /// Display name
    pub name: String,
    /// Human-readable target duration (e.g. "5 minutes"). The first integer
    /// found in the string is interpreted as the minimum duration in minutes
    /// for automatic progression.
    pub duration: String,
    /// Free-text objective describing what the phase is about
    pub objective: String,
    /// Whether this phase is critical to the scenario outcome
    #[serde(default)]
    pub critical: bool,
    /// Maximum number of trainee messages budgeted for this phase
    #[serde(default = "default_message_budget")]
    pub message_budget: u32,
    /// Per-difficulty overrides of the message budget
    #[serde(default)]
    pub message_budget_overrides: HashMap<Difficulty, u32>,
    /// Checklist objectives for this phase
    #[serde(default)]
    pub learner_objectives: Vec<LearnerObjective>,
    /// Character emotional intensity at the start of this phase, when it
    /// should differ from the difficulty-tier base level
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial_disposition: Option<f32>,
    /// Branch points, evaluated in declaration order
    #[serde(default)]
    pub branch_points: Vec<BranchPoint>,
    /// What the generated dialogue should focus on during this phase
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub focus: Option<String>,
    /// Facts the character must not reveal yet during this phase
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub information_boundary: Option<String>,
}

fn default_message_budget() -> u32 {
    10
}

impl PhaseDef {
    /// Message budget for the given difficulty, falling back to the
    /// phase-level default when no override is configured.
    pub fn budget_for(&self, difficulty: Difficulty) -> u32 {
        self.message_budget_overrides
            .get(&difficulty)
            .copied()
            .unwrap_or(self.message_budget)
    }

    /// Objective texts for this phase, in declaration order.
    pub fn objective_texts(&self) -> Vec<String> {
        self.learner_objectives
            .iter()
            .map(|o| o.text.clone())
            .collect()
    }
}

/// Positive patterns, anti-patterns and weight for one assessment dimension.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct DimensionHooks {
    /// Positive indicators (concept names or literal phrases)
    #[serde(default)]
    pub patterns: Vec<String>,
    /// Negative indicators
    #[serde(default)]
    pub anti_patterns: Vec<String>,
    /// Weight of this dimension in the overall score
    #[serde(default)]
    pub weight: f32,
}

/// Assessment hooks for the three competency dimensions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct AssessmentHooks {
    #[serde(default)]
    pub empathy: DimensionHooks,
    #[serde(default)]
    pub clarity: DimensionHooks,
    #[serde(default)]
    pub accountability: DimensionHooks,
    /// Overall score at or above which performance is rated exemplary
    #[serde(default = "default_excellence_score")]
    pub excellence_score: f32,
    /// Overall score at or above which performance is rated proficient
    #[serde(default = "default_passing_score")]
    pub passing_score: f32,
}

fn default_excellence_score() -> f32 {
    0.85
}

fn default_passing_score() -> f32 {
    0.7
}

/// A named intensity cut-point (e.g. "upset" starting at 0.5).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmotionalThreshold {
    /// Discrete label applied at and above the cut-point
    pub label: String,
    /// Intensity at which this label starts
    pub cut: f32,
}

/// Configuration of the continuous emotional model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmotionalTrackingConfig {
    /// Lower bound of the intensity scale
    #[serde(default)]
    pub scale_min: f32,
    /// Upper bound of the intensity scale
    #[serde(default = "default_scale_max")]
    pub scale_max: f32,
    /// Label used below the lowest configured cut-point
    #[serde(default = "default_baseline_label")]
    pub baseline_label: String,
    /// Named cut-points, ascending by intensity
    #[serde(default)]
    pub thresholds: Vec<EmotionalThreshold>,
    /// Named modifiers and their signed intensity deltas
    #[serde(default)]
    pub modifiers: HashMap<String, f32>,
}

fn default_scale_max() -> f32 {
    1.0
}

fn default_baseline_label() -> String {
    "calm".to_string()
}

impl Default for EmotionalTrackingConfig {
    fn default() -> Self {
        Self {
            scale_min: 0.0,
            scale_max: 1.0,
            baseline_label: default_baseline_label(),
            thresholds: vec![
                EmotionalThreshold {
                    label: "concerned".to_string(),
                    cut: 0.25,
                },
                EmotionalThreshold {
                    label: "upset".to_string(),
                    cut: 0.5,
                },
                EmotionalThreshold {
                    label: "angry".to_string(),
                    cut: 0.75,
                },
                EmotionalThreshold {
                    label: "hostile".to_string(),
                    cut: 0.9,
                },
            ],
            modifiers: default_modifiers(),
        }
    }
}

/// Standard modifier table applied when a vignette does not configure its
/// own. Names match the detectors in the emotional tracker's message
/// analysis battery.
pub fn default_modifiers() -> HashMap<String, f32> {
    HashMap::from([
        ("empathetic_response".to_string(), -0.1),
        ("clear_explanation".to_string(), -0.08),
        ("apology".to_string(), -0.12),
        ("medical_jargon".to_string(), 0.08),
        ("defensive_response".to_string(), 0.15),
    ])
}

/// Per-difficulty behavioral variation of the simulated character.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct DifficultyProfile {
    /// Dominant traits at this tier (e.g. "interrupts frequently")
    #[serde(default)]
    pub traits: Vec<String>,
    /// Description of the emotional range at this tier
    #[serde(default)]
    pub emotional_range: String,
    /// Phrases that particularly escalate the character at this tier
    #[serde(default)]
    pub trigger_phrases: Vec<String>,
    /// Canned response tendencies the generator should lean on
    #[serde(default)]
    pub response_tendencies: Vec<String>,
}

/// Identity and personality of the simulated character.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CharacterProfile {
    /// Display name of the character
    pub name: String,
    /// Who the character is in the scenario (e.g. "patient's daughter")
    pub identity: String,
    /// Personality description for the generation provider
    pub personality: String,
    /// Vocabulary style (e.g. "plain-spoken, avoids clinical terms")
    #[serde(default)]
    pub vocabulary_style: String,
    /// Behavioral variation per difficulty tier
    #[serde(default)]
    pub difficulty_profiles: HashMap<Difficulty, DifficultyProfile>,
}

impl CharacterProfile {
    /// Behavioral profile for the given difficulty, or an empty profile
    /// when the vignette does not configure one for that tier.
    pub fn profile_for(&self, difficulty: Difficulty) -> DifficultyProfile {
        self.difficulty_profiles
            .get(&difficulty)
            .cloned()
            .unwrap_or_default()
    }
}

/// One stage of graduated information revelation.
///
/// The character only volunteers facts belonging to stages that the
/// session has marked as revealed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RevelationStage {
    /// Stage name, recorded in the session once revealed
    pub name: String,
    /// The information this stage unlocks
    pub content: String,
}

/// Guidelines for how the character should deliver its replies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseStyle {
    /// Target reply length (e.g. "brief", "moderate", "expansive")
    #[serde(default = "default_response_length")]
    pub length: String,
    /// Whether the character may interrupt the trainee
    #[serde(default)]
    pub allow_interruptions: bool,
    /// Whether the character may answer with silence when overwhelmed
    #[serde(default)]
    pub use_silence: bool,
}

fn default_response_length() -> String {
    "moderate".to_string()
}

impl Default for ResponseStyle {
    fn default() -> Self {
        Self {
            length: default_response_length(),
            allow_interruptions: false,
            use_silence: false,
        }
    }
}

/// A complete authored training scenario.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vignette {
    /// Unique vignette identifier
    pub id: String,
    /// Display title
    pub title: String,
    /// Author-facing description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Ordered conversation phases
    pub phases: Vec<PhaseDef>,
    /// Scoring configuration for the three competency dimensions
    #[serde(default)]
    pub assessment: AssessmentHooks,
    /// Continuous emotional model configuration
    #[serde(default)]
    pub emotional_tracking: EmotionalTrackingConfig,
    /// The simulated character
    pub character: CharacterProfile,
    /// Graduated information revelation stages
    #[serde(default)]
    pub revelation_stages: Vec<RevelationStage>,
    /// Reply delivery guidelines
    #[serde(default)]
    pub response_style: ResponseStyle,
}

impl Vignette {
    /// Looks up a phase definition by id.
    pub fn phase(&self, phase_id: &str) -> Option<&PhaseDef> {
        self.phases.iter().find(|p| p.id == phase_id)
    }

    /// Position of a phase in the scripted sequence.
    pub fn phase_index(&self, phase_id: &str) -> Option<usize> {
        self.phases.iter().position(|p| p.id == phase_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_budget_overrides_fall_back_to_phase_default() {
        let phase: PhaseDef = toml::from_str(
            r#"
            id = "disclosure"
            name = "Disclosure"
            duration = "5 minutes"
            objective = "Explain what happened"
            message_budget = 8

            [message_budget_overrides]
            hard = 5
            "#,
        )
        .unwrap();
        assert_eq!(phase.budget_for(Difficulty::Hard), 5);
        assert_eq!(phase.budget_for(Difficulty::Easy), 8);
        assert_eq!(phase.budget_for(Difficulty::Medium), 8);
    }

    #[test]
    fn message_budget_defaults_when_unspecified() {
        let phase: PhaseDef = toml::from_str(
            r#"
            id = "opening"
            name = "Opening"
            duration = "3 minutes"
            objective = "Introduce yourself"
            "#,
        )
        .unwrap();
        assert_eq!(phase.budget_for(Difficulty::Medium), 10);
    }
}
