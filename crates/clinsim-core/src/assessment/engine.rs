//! Score aggregation over pattern matcher output.
//!
//! Scores for the three competency dimensions live in [0, 1] and start at
//! the neutral 0.5. Positive matches add `confidence * 0.15`, negative
//! matches subtract `confidence * 0.2` (accountability anti-patterns weigh
//! heavier at `* 0.25`).

use super::matcher::{DimensionMatches, MessageAnalysis, PatternMatcher};
use crate::session::AssessmentScores;
use crate::vignette::AssessmentHooks;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

const POSITIVE_STEP: f32 = 0.15;
const NEGATIVE_STEP: f32 = 0.2;
const ACCOUNTABILITY_NEGATIVE_STEP: f32 = 0.25;

/// Discrete rating derived from the overall score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PerformanceLevel {
    Exemplary,
    Proficient,
    Developing,
    NeedsImprovement,
}

/// One entry of the engine's internal assessment history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageAssessment {
    /// The assessed trainee message
    pub text: String,
    /// Match report for this message
    pub analysis: MessageAnalysis,
    /// Running scores after this message was applied
    pub scores: AssessmentScores,
    /// When the assessment ran
    pub timestamp: DateTime<Utc>,
}

/// Turns pattern matcher output into bounded per-dimension scores.
pub struct AssessmentEngine {
    hooks: AssessmentHooks,
    matcher: PatternMatcher,
    empathy: f32,
    clarity: f32,
    accountability: f32,
    history: Vec<MessageAssessment>,
}

impl AssessmentEngine {
    /// Creates an engine with the default pattern matcher.
    pub fn new(hooks: AssessmentHooks) -> Self {
        Self::with_matcher(hooks, PatternMatcher::default())
    }

    /// Creates an engine with a caller-configured matcher (custom concept
    /// lexicon or minimum confidence).
    pub fn with_matcher(hooks: AssessmentHooks, matcher: PatternMatcher) -> Self {
        Self {
            hooks,
            matcher,
            empathy: 0.5,
            clarity: 0.5,
            accountability: 0.5,
            history: Vec::new(),
        }
    }

    /// Internal assessment history, oldest first.
    pub fn history(&self) -> &[MessageAssessment] {
        &self.history
    }

    fn apply_dimension(score: f32, matches: &DimensionMatches, negative_step: f32) -> f32 {
        let mut score = score;
        for m in &matches.patterns {
            score += m.confidence * POSITIVE_STEP;
        }
        for m in &matches.anti_patterns {
            score -= m.confidence * negative_step;
        }
        score.clamp(0.0, 1.0)
    }

    fn apply_analysis(&mut self, analysis: &MessageAnalysis) {
        self.empathy = Self::apply_dimension(self.empathy, &analysis.empathy, NEGATIVE_STEP);
        self.clarity = Self::apply_dimension(self.clarity, &analysis.clarity, NEGATIVE_STEP);
        self.accountability = Self::apply_dimension(
            self.accountability,
            &analysis.accountability,
            ACCOUNTABILITY_NEGATIVE_STEP,
        );
    }

    /// Overall score: weighted average of the dimension scores using the
    /// configured weights, or an equal 1/3 split when weights sum to zero.
    pub fn overall(empathy: f32, clarity: f32, accountability: f32, hooks: &AssessmentHooks) -> f32 {
        let (we, wc, wa) = (
            hooks.empathy.weight,
            hooks.clarity.weight,
            hooks.accountability.weight,
        );
        let sum = we + wc + wa;
        if sum <= f32::EPSILON {
            (empathy + clarity + accountability) / 3.0
        } else {
            (empathy * we + clarity * wc + accountability * wa) / sum
        }
    }

    fn current_scores(&self) -> AssessmentScores {
        AssessmentScores {
            empathy: self.empathy,
            clarity: self.clarity,
            accountability: self.accountability,
            overall: Self::overall(self.empathy, self.clarity, self.accountability, &self.hooks),
        }
    }

    /// Single-message mode: applies this message's pattern hits to the
    /// running scores and appends to the internal history.
    pub fn assess_message(&mut self, text: &str) -> AssessmentScores {
        let analysis = self.matcher.analyze_message(text, &self.hooks);
        self.apply_analysis(&analysis);
        let scores = self.current_scores();
        self.history.push(MessageAssessment {
            text: text.to_string(),
            analysis,
            scores,
            timestamp: Utc::now(),
        });
        scores
    }

    /// Cumulative mode: discards running state and re-evaluates the full
    /// trainee message history as one concatenated block. Used on session
    /// restore and for on-demand full re-assessment.
    pub fn assess_conversation(&mut self, messages: &[String]) -> AssessmentScores {
        self.empathy = 0.5;
        self.clarity = 0.5;
        self.accountability = 0.5;
        let analysis = self.matcher.analyze_conversation(messages, &self.hooks);
        self.apply_analysis(&analysis);
        let scores = self.current_scores();
        self.history = vec![MessageAssessment {
            text: messages.join("\n"),
            analysis,
            scores,
            timestamp: Utc::now(),
        }];
        scores
    }

    /// Latest scores, or all-zero scores when nothing has been assessed yet.
    pub fn scores(&self) -> AssessmentScores {
        if self.history.is_empty() {
            AssessmentScores::default()
        } else {
            self.current_scores()
        }
    }

    /// Rating of the overall score against the vignette's thresholds.
    pub fn performance_level(&self) -> PerformanceLevel {
        let overall = self.scores().overall;
        if overall >= self.hooks.excellence_score {
            PerformanceLevel::Exemplary
        } else if overall >= self.hooks.passing_score {
            PerformanceLevel::Proficient
        } else if overall >= 0.7 * self.hooks.passing_score {
            PerformanceLevel::Developing
        } else {
            PerformanceLevel::NeedsImprovement
        }
    }
}
