//! Session state domain model.
//!
//! `SessionState` is the full snapshot of one active conversation. The
//! conversation engine owns a live copy and returns a versioned snapshot
//! after every turn; persistence of snapshots belongs to the caller.

use super::message::ConversationMessage;
use crate::vignette::Difficulty;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One entry in the emotional history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmotionalEvent {
    /// When the change was applied
    pub timestamp: DateTime<Utc>,
    /// Intensity after the change
    pub value: f32,
    /// Modifier name, when the change came from a configured modifier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modifier: Option<String>,
    /// Human-readable reason for the change
    pub reason: String,
}

/// Snapshot of the character's emotional state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmotionalSnapshot {
    /// Current intensity, always within [0, 1]
    pub value: f32,
    /// Discrete label derived from the configured cut-points
    pub label: String,
    /// Ordered history of intensity changes
    pub history: Vec<EmotionalEvent>,
}

/// State of the currently active phase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseState {
    /// Id of the active phase
    pub phase_id: String,
    /// When this phase became active
    pub started_at: DateTime<Utc>,
    /// Objective texts already completed in this phase
    pub objectives_completed: Vec<String>,
    /// Objective texts still outstanding
    pub objectives_pending: Vec<String>,
}

impl PhaseState {
    /// Wall-clock time spent in this phase as of `now`.
    pub fn elapsed(&self, now: DateTime<Utc>) -> chrono::Duration {
        now - self.started_at
    }
}

/// One recorded branch/transition trigger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BranchRecord {
    /// Phase that was active when the trigger fired
    pub phase_id: String,
    /// Name of the condition (or "auto_progression") that fired
    pub trigger: String,
    /// When the transition happened
    pub timestamp: DateTime<Utc>,
}

/// Bounded [0, 1] scores along the three competency dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct AssessmentScores {
    pub empathy: f32,
    pub clarity: f32,
    pub accountability: f32,
    pub overall: f32,
}

/// Full state of one active conversation session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    /// Unique session identifier (UUID format)
    pub id: String,
    /// Id of the vignette being run
    pub vignette_id: String,
    /// Difficulty tier chosen at session start
    pub difficulty: Difficulty,
    /// Current phase state
    pub phase: PhaseState,
    /// Current emotional state
    pub emotional: EmotionalSnapshot,
    /// Branch/transition history, oldest first
    pub branch_history: Vec<BranchRecord>,
    /// Append-only conversation log
    pub messages: Vec<ConversationMessage>,
    /// Names of information-revelation stages already disclosed
    pub revealed_stages: Vec<String>,
    /// Scores from the most recent assessment pass
    pub scores: AssessmentScores,
    /// When the session started
    pub started_at: DateTime<Utc>,
    /// When the session was last mutated
    pub updated_at: DateTime<Utc>,
    /// Snapshot version, bumped once per completed turn
    pub revision: u64,
}

impl SessionState {
    /// Trainee-authored messages, in order.
    pub fn user_messages(&self) -> Vec<&ConversationMessage> {
        self.messages
            .iter()
            .filter(|m| m.sender == super::message::MessageSender::User)
            .collect()
    }
}
