//! Phase progression state machine.
//!
//! One `PhaseManager` owns phase state for one session: the active phase,
//! objective completion, and branch evaluation. Transitions are monotonic
//! for the life of a session; `reset_to_phase` exists for tests and
//! debugging only.

use crate::error::{ClinsimError, Result};
use crate::lexicon;
use crate::session::{BranchRecord, PhaseState};
use crate::vignette::{PhaseDef, Vignette, parse_duration_minutes};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;
use strum_macros::{Display, EnumString};

/// A branch condition name, resolved to a closed set of heuristics.
///
/// Condition names that are not one of the built-in heuristics become
/// [`BranchCondition::Custom`] and are substring-matched against the
/// lower-cased trainee message, so a typo in a vignette degrades to a
/// literal match instead of silently never firing.
#[derive(Debug, Clone, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum BranchCondition {
    /// Trainee message is both empathetic and free of jargon
    ClearEmpathetic,
    /// Trainee message contains unexplained clinical terminology
    MedicalJargon,
    /// Trainee message deflects responsibility
    Defensive,
    /// All objectives of the current phase are completed
    ObjectiveCompleted,
    /// The phase's minimum duration has elapsed
    TimeElapsed,
    /// Literal substring test of the condition name against the message
    #[strum(default)]
    Custom(String),
}

/// A phase transition that occurred during branch evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransitionRecord {
    /// Phase that was left
    pub from_phase: String,
    /// Phase that became active
    pub to_phase: String,
    /// Condition name that fired, or "auto_progression"
    pub trigger: String,
    /// Emotional delta the branch point carries (0 for auto progression)
    pub emotional_delta: f32,
    /// Character intensity at the moment of transition
    pub emotional_value: f32,
    /// When the transition happened
    pub timestamp: DateTime<Utc>,
}

/// Trigger name recorded for automatic sequential progression.
pub const AUTO_PROGRESSION: &str = "auto_progression";

/// Owns phase progression for one session.
pub struct PhaseManager {
    vignette: Arc<Vignette>,
    state: PhaseState,
    branch_history: Vec<BranchRecord>,
    transition_history: Vec<TransitionRecord>,
}

impl PhaseManager {
    /// Creates a manager positioned at the vignette's first phase.
    pub fn new(vignette: Arc<Vignette>) -> Result<Self> {
        let first = vignette
            .phases
            .first()
            .ok_or_else(|| ClinsimError::config("vignette defines no phases"))?;
        let state = PhaseState {
            phase_id: first.id.clone(),
            started_at: Utc::now(),
            objectives_completed: Vec::new(),
            objectives_pending: first.objective_texts(),
        };
        Ok(Self {
            vignette,
            state,
            branch_history: Vec::new(),
            transition_history: Vec::new(),
        })
    }

    /// Rebuilds a manager from persisted session state.
    pub fn from_snapshot(
        vignette: Arc<Vignette>,
        state: PhaseState,
        branch_history: Vec<BranchRecord>,
    ) -> Result<Self> {
        let manager = Self {
            vignette,
            state,
            branch_history,
            transition_history: Vec::new(),
        };
        // Fail fast on a snapshot referencing a phase the vignette no
        // longer defines.
        manager.current_phase()?;
        Ok(manager)
    }

    /// The active phase definition.
    ///
    /// Referencing a phase id absent from the vignette is a configuration
    /// bug with no recovery path.
    pub fn current_phase(&self) -> Result<&PhaseDef> {
        self.vignette
            .phase(&self.state.phase_id)
            .ok_or_else(|| ClinsimError::not_found("phase", self.state.phase_id.clone()))
    }

    /// Snapshot of the current phase state.
    pub fn phase_state(&self) -> PhaseState {
        self.state.clone()
    }

    /// Branch trigger history, oldest first.
    pub fn branch_history(&self) -> &[BranchRecord] {
        &self.branch_history
    }

    /// Transitions performed by this manager instance, oldest first.
    pub fn transition_history(&self) -> &[TransitionRecord] {
        &self.transition_history
    }

    /// Whether the active phase is flagged critical.
    pub fn is_critical_phase(&self) -> Result<bool> {
        Ok(self.current_phase()?.critical)
    }

    /// Whether the active phase is the last scripted phase.
    pub fn is_final_phase(&self) -> bool {
        self.vignette
            .phase_index(&self.state.phase_id)
            .map(|i| i + 1 == self.vignette.phases.len())
            .unwrap_or(false)
    }

    /// Progression through the script as a percentage. A single-phase
    /// vignette is always at 100.
    pub fn progression_percent(&self) -> f32 {
        let count = self.vignette.phases.len();
        if count <= 1 {
            return 100.0;
        }
        let index = self.vignette.phase_index(&self.state.phase_id).unwrap_or(0);
        index as f32 / (count - 1) as f32 * 100.0
    }

    /// Idempotently moves an objective from pending to completed.
    /// Returns true when the objective moved on this call.
    pub fn complete_objective(&mut self, text: &str) -> bool {
        if let Some(pos) = self.state.objectives_pending.iter().position(|o| o == text) {
            let objective = self.state.objectives_pending.remove(pos);
            self.state.objectives_completed.push(objective);
            true
        } else {
            false
        }
    }

    /// Marks pending objectives whose trigger keywords appear in the
    /// trainee message. Returns the objective texts completed by this call.
    pub fn check_objective_triggers(&mut self, message: &str) -> Result<Vec<String>> {
        let lower = message.to_lowercase();
        let triggered: Vec<String> = self
            .current_phase()?
            .learner_objectives
            .iter()
            .filter(|o| o.trigger_keywords.iter().any(|k| lower.contains(&k.to_lowercase())))
            .map(|o| o.text.clone())
            .collect();
        Ok(triggered
            .into_iter()
            .filter(|text| self.complete_objective(text))
            .collect())
    }

    /// Evaluates branch points and automatic progression for one trainee
    /// message, with `Utc::now()` as the clock.
    pub fn evaluate_branch(
        &mut self,
        message: &str,
        emotional_value: f32,
    ) -> Result<Option<TransitionRecord>> {
        self.evaluate_branch_at(message, emotional_value, Utc::now())
    }

    /// Branch evaluation with a caller-supplied clock.
    ///
    /// Branch points are evaluated in declaration order and the first
    /// matching condition wins. When no branch point matches, the phase
    /// auto-advances to the next scripted phase once all objectives are
    /// completed and the minimum phase duration has elapsed; the last phase
    /// never auto-advances.
    pub fn evaluate_branch_at(
        &mut self,
        message: &str,
        emotional_value: f32,
        now: DateTime<Utc>,
    ) -> Result<Option<TransitionRecord>> {
        let phase = self.current_phase()?.clone();

        for branch in &phase.branch_points {
            if self.condition_matches(&branch.condition, message, &phase, now)? {
                let record = self.transition_to(
                    &branch.next_phase,
                    &branch.condition,
                    branch.emotional_delta,
                    emotional_value,
                    now,
                )?;
                return Ok(Some(record));
            }
        }

        if self.is_final_phase() {
            return Ok(None);
        }
        if self.state.objectives_pending.is_empty() && self.min_duration_elapsed(&phase, now) {
            let index = self
                .vignette
                .phase_index(&phase.id)
                .ok_or_else(|| ClinsimError::not_found("phase", phase.id.clone()))?;
            let next_id = self.vignette.phases[index + 1].id.clone();
            let record =
                self.transition_to(&next_id, AUTO_PROGRESSION, 0.0, emotional_value, now)?;
            return Ok(Some(record));
        }
        Ok(None)
    }

    /// Debug/test escape hatch: jumps to an arbitrary phase, bypassing the
    /// monotonicity guarantee. Not part of the normal turn pipeline.
    pub fn reset_to_phase(&mut self, phase_id: &str, now: DateTime<Utc>) -> Result<()> {
        let phase = self
            .vignette
            .phase(phase_id)
            .ok_or_else(|| ClinsimError::not_found("phase", phase_id.to_string()))?
            .clone();
        self.state = PhaseState {
            phase_id: phase.id.clone(),
            started_at: now,
            objectives_completed: Vec::new(),
            objectives_pending: phase.objective_texts(),
        };
        Ok(())
    }

    fn min_duration_elapsed(&self, phase: &PhaseDef, now: DateTime<Utc>) -> bool {
        match parse_duration_minutes(&phase.duration) {
            Some(minutes) => self.state.elapsed(now) >= chrono::Duration::minutes(minutes as i64),
            None => false,
        }
    }

    fn condition_matches(
        &self,
        condition: &str,
        message: &str,
        phase: &PhaseDef,
        now: DateTime<Utc>,
    ) -> Result<bool> {
        let parsed = BranchCondition::from_str(condition)
            .unwrap_or_else(|_| BranchCondition::Custom(condition.to_string()));
        Ok(match parsed {
            BranchCondition::ClearEmpathetic => {
                lexicon::is_empathetic(message) && !lexicon::has_medical_jargon(message)
            }
            BranchCondition::MedicalJargon => lexicon::has_medical_jargon(message),
            BranchCondition::Defensive => lexicon::is_defensive(message),
            BranchCondition::ObjectiveCompleted => self.state.objectives_pending.is_empty(),
            BranchCondition::TimeElapsed => self.min_duration_elapsed(phase, now),
            BranchCondition::Custom(name) => {
                message.to_lowercase().contains(&name.to_lowercase())
            }
        })
    }

    fn transition_to(
        &mut self,
        next_phase_id: &str,
        trigger: &str,
        emotional_delta: f32,
        emotional_value: f32,
        now: DateTime<Utc>,
    ) -> Result<TransitionRecord> {
        let next = self
            .vignette
            .phase(next_phase_id)
            .ok_or_else(|| ClinsimError::not_found("phase", next_phase_id.to_string()))?
            .clone();
        let record = TransitionRecord {
            from_phase: self.state.phase_id.clone(),
            to_phase: next.id.clone(),
            trigger: trigger.to_string(),
            emotional_delta,
            emotional_value,
            timestamp: now,
        };
        self.branch_history.push(BranchRecord {
            phase_id: self.state.phase_id.clone(),
            trigger: trigger.to_string(),
            timestamp: now,
        });
        self.state = PhaseState {
            phase_id: next.id.clone(),
            started_at: now,
            objectives_completed: Vec::new(),
            objectives_pending: next.objective_texts(),
        };
        tracing::debug!(
            from = record.from_phase,
            to = record.to_phase,
            trigger,
            "phase transition"
        );
        self.transition_history.push(record.clone());
        Ok(record)
    }
}
