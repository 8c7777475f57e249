//! Continuous emotional intensity model for the simulated character.
//!
//! The tracker owns a single intensity value in [0, 1], applies named
//! modifiers from the vignette's emotional tracking configuration, and
//! derives a discrete threshold label from configured cut-points. It never
//! fails; out-of-range results are clamped.

use crate::lexicon;
use crate::session::{EmotionalEvent, EmotionalSnapshot};
use crate::vignette::{Difficulty, EmotionalTrackingConfig};
use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Direction of recent emotional drift.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trajectory {
    Improving,
    Stable,
    Worsening,
}

/// How emotionally charged the generated reply should be.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseIntensity {
    /// Intensity below 0.4
    Calm,
    /// Intensity in [0.4, 0.7)
    Moderate,
    /// Intensity at or above 0.7
    Intense,
}

impl ResponseIntensity {
    /// Band for an arbitrary intensity value.
    pub fn for_value(value: f32) -> Self {
        if value < 0.4 {
            ResponseIntensity::Calm
        } else if value < 0.7 {
            ResponseIntensity::Moderate
        } else {
            ResponseIntensity::Intense
        }
    }
}

/// Record of one applied modifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppliedModifier {
    /// Configured modifier name
    pub name: String,
    /// Delta actually applied, after difficulty scaling
    pub delta: f32,
    /// Intensity after application and clamping
    pub value_after: f32,
    /// Human-readable reason recorded in the history
    pub reason: String,
}

/// Tracks the simulated character's emotional intensity for one session.
pub struct EmotionalStateTracker {
    config: EmotionalTrackingConfig,
    difficulty: Difficulty,
    value: f32,
    history: Vec<EmotionalEvent>,
}

impl EmotionalStateTracker {
    /// Creates a tracker at the difficulty-tier base intensity, or at
    /// `initial_override` when the opening phase declares a disposition.
    pub fn new(
        config: EmotionalTrackingConfig,
        difficulty: Difficulty,
        initial_override: Option<f32>,
    ) -> Self {
        let initial = initial_override.unwrap_or_else(|| difficulty.base_intensity());
        let value = initial.clamp(config.scale_min, config.scale_max);
        let history = vec![EmotionalEvent {
            timestamp: Utc::now(),
            value,
            modifier: None,
            reason: "session start".to_string(),
        }];
        Self {
            config,
            difficulty,
            value,
            history,
        }
    }

    /// Rebuilds a tracker from a persisted snapshot.
    pub fn from_snapshot(
        config: EmotionalTrackingConfig,
        difficulty: Difficulty,
        snapshot: &EmotionalSnapshot,
    ) -> Self {
        Self {
            config,
            difficulty,
            value: snapshot.value,
            history: snapshot.history.clone(),
        }
    }

    /// Current intensity.
    pub fn value(&self) -> f32 {
        self.value
    }

    /// Ordered history of intensity changes.
    pub fn history(&self) -> &[EmotionalEvent] {
        &self.history
    }

    /// Discrete label for the current intensity: the highest configured
    /// cut-point at or below the value, or the baseline label below all
    /// cut-points.
    pub fn threshold_label(&self) -> String {
        self.config
            .thresholds
            .iter()
            .filter(|t| self.value >= t.cut)
            .next_back()
            .map(|t| t.label.clone())
            .unwrap_or_else(|| self.config.baseline_label.clone())
    }

    /// Difficulty scaling: at the hardest tier, de-escalating (negative)
    /// deltas only have 70% effect; at the easiest tier, escalating
    /// (positive) deltas only have 80% effect.
    fn scale_delta(&self, delta: f32) -> f32 {
        match self.difficulty {
            Difficulty::Hard if delta < 0.0 => delta * 0.7,
            Difficulty::Easy if delta > 0.0 => delta * 0.8,
            _ => delta,
        }
    }

    fn push_event(&mut self, modifier: Option<String>, reason: String) {
        self.history.push(EmotionalEvent {
            timestamp: Utc::now(),
            value: self.value,
            modifier,
            reason,
        });
    }

    /// Applies a named modifier from the configuration.
    ///
    /// Returns `None` when the vignette does not configure a modifier under
    /// that name; the tracker has no failure modes beyond clamping.
    pub fn apply_modifier(&mut self, name: &str) -> Option<AppliedModifier> {
        let configured = *self.config.modifiers.get(name)?;
        let delta = self.scale_delta(configured);
        self.value = (self.value + delta).clamp(self.config.scale_min, self.config.scale_max);
        let reason = format!("message exhibited {}", name.replace('_', " "));
        self.push_event(Some(name.to_string()), reason.clone());
        tracing::debug!(modifier = name, delta, value = self.value, "applied emotional modifier");
        Some(AppliedModifier {
            name: name.to_string(),
            delta,
            value_after: self.value,
            reason,
        })
    }

    /// Applies a raw signed delta (branch-point deltas, provider estimates)
    /// with the same difficulty scaling and clamping as named modifiers.
    /// Returns the intensity after application.
    pub fn apply_delta(&mut self, delta: f32, reason: impl Into<String>) -> f32 {
        let scaled = self.scale_delta(delta);
        self.value = (self.value + scaled).clamp(self.config.scale_min, self.config.scale_max);
        self.push_event(None, reason.into());
        self.value
    }

    /// Runs the fixed detector battery over a trainee message and applies
    /// the corresponding modifier for every detector that fires. Multiple
    /// detectors may fire on one message.
    pub fn analyze_message(&mut self, text: &str) -> Vec<AppliedModifier> {
        let mut applied = Vec::new();
        let detectors: [(&str, fn(&str) -> bool); 5] = [
            ("empathetic_response", lexicon::is_empathetic),
            ("medical_jargon", lexicon::has_medical_jargon),
            ("defensive_response", lexicon::is_defensive),
            ("apology", lexicon::is_apology),
            ("clear_explanation", lexicon::is_clear_explanation),
        ];
        for (name, detect) in detectors {
            if detect(text) {
                if let Some(record) = self.apply_modifier(name) {
                    applied.push(record);
                }
            }
        }
        applied
    }

    /// Compares the intensity `window` history entries ago to now.
    /// Drift above +0.1 reads as worsening, below -0.1 as improving.
    /// Reports stable when fewer than `window` entries exist.
    pub fn trajectory(&self, window: usize) -> Trajectory {
        if window == 0 || self.history.len() < window {
            return Trajectory::Stable;
        }
        let then = self.history[self.history.len() - window].value;
        let drift = self.value - then;
        if drift > 0.1 {
            Trajectory::Worsening
        } else if drift < -0.1 {
            Trajectory::Improving
        } else {
            Trajectory::Stable
        }
    }

    /// Maps the current intensity to the charge level the generation
    /// provider should aim for.
    pub fn response_intensity(&self) -> ResponseIntensity {
        ResponseIntensity::for_value(self.value)
    }

    /// Full snapshot of the emotional state.
    pub fn snapshot(&self) -> EmotionalSnapshot {
        EmotionalSnapshot {
            value: self.value,
            label: self.threshold_label(),
            history: self.history.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vignette::EmotionalTrackingConfig;

    fn tracker(difficulty: Difficulty) -> EmotionalStateTracker {
        EmotionalStateTracker::new(EmotionalTrackingConfig::default(), difficulty, None)
    }

    #[test]
    fn initial_value_follows_difficulty_tier() {
        assert_eq!(tracker(Difficulty::Easy).value(), 0.3);
        assert_eq!(tracker(Difficulty::Medium).value(), 0.5);
        assert_eq!(tracker(Difficulty::Hard).value(), 0.7);
    }

    #[test]
    fn initial_override_wins_and_is_clamped() {
        let t = EmotionalStateTracker::new(
            EmotionalTrackingConfig::default(),
            Difficulty::Medium,
            Some(1.7),
        );
        assert_eq!(t.value(), 1.0);
    }

    #[test]
    fn repeated_escalation_never_exceeds_scale() {
        let mut t = tracker(Difficulty::Medium);
        for _ in 0..10 {
            t.apply_delta(0.5, "escalation");
            assert!(t.value() <= 1.0);
        }
        assert_eq!(t.value(), 1.0);
    }

    #[test]
    fn hard_tier_dampens_deescalation() {
        let mut t = tracker(Difficulty::Hard);
        let record = t.apply_modifier("empathetic_response").unwrap();
        assert!((record.delta - (-0.1 * 0.7)).abs() < 1e-6);
    }

    #[test]
    fn easy_tier_dampens_escalation() {
        let mut t = tracker(Difficulty::Easy);
        let record = t.apply_modifier("defensive_response").unwrap();
        assert!((record.delta - (0.15 * 0.8)).abs() < 1e-6);
    }

    #[test]
    fn label_matches_cut_points_after_any_modifier() {
        let mut t = tracker(Difficulty::Medium);
        for delta in [0.3, 0.2, -0.6, 0.9, -1.5] {
            t.apply_delta(delta, "test");
            let value = t.value();
            assert!((0.0..=1.0).contains(&value));
            let expected = if value >= 0.9 {
                "hostile"
            } else if value >= 0.75 {
                "angry"
            } else if value >= 0.5 {
                "upset"
            } else if value >= 0.25 {
                "concerned"
            } else {
                "calm"
            };
            assert_eq!(t.threshold_label(), expected, "value {value}");
        }
    }

    #[test]
    fn message_analysis_can_fire_multiple_detectors() {
        let mut t = tracker(Difficulty::Medium);
        let applied =
            t.analyze_message("I understand your frustration, and I'm sorry for the delay.");
        let names: Vec<&str> = applied.iter().map(|m| m.name.as_str()).collect();
        assert!(names.contains(&"empathetic_response"));
        assert!(names.contains(&"apology"));
    }

    #[test]
    fn trajectory_reads_drift_over_window() {
        let mut t = tracker(Difficulty::Medium);
        assert_eq!(t.trajectory(5), Trajectory::Stable);
        t.apply_delta(0.3, "escalation");
        t.apply_delta(0.05, "escalation");
        assert_eq!(t.trajectory(3), Trajectory::Worsening);
        t.apply_delta(-0.4, "deescalation");
        assert_eq!(t.trajectory(2), Trajectory::Improving);
    }

    #[test]
    fn response_intensity_bands() {
        let mut t = tracker(Difficulty::Easy);
        assert_eq!(t.response_intensity(), ResponseIntensity::Calm);
        t.apply_delta(0.3, "up"); // 0.3 + 0.24 = 0.54
        assert_eq!(t.response_intensity(), ResponseIntensity::Moderate);
        t.apply_delta(0.3, "up"); // 0.54 + 0.24 = 0.78
        assert_eq!(t.response_intensity(), ResponseIntensity::Intense);
    }
}
