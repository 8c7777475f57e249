//! Pattern and anti-pattern detection for trainee messages.
//!
//! A pattern string is first resolved against the concept lexicon: a
//! configuration table mapping concept names ("emotional acknowledgment",
//! "medical jargon", ...) to concrete trigger phrases. Unrecognized names
//! fall back to literal substring matching of the raw pattern text.

use crate::lexicon;
use crate::vignette::AssessmentHooks;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Concept name whose match semantics are inverted: the *absence* of
/// blame language counts as a positive accountability signal.
pub const NO_BLAME_SHIFTING: &str = "no blame shifting";

/// Minimum confidence below which matches are discarded.
pub const DEFAULT_MIN_CONFIDENCE: f32 = 0.5;

/// Maps known concept names to the phrase lists that realize them.
///
/// This is configuration, not logic: callers may extend or replace
/// concepts to keep the matcher scenario-agnostic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConceptLexicon {
    concepts: HashMap<String, Vec<String>>,
}

impl ConceptLexicon {
    /// An empty lexicon; every pattern falls back to literal matching.
    pub fn empty() -> Self {
        Self {
            concepts: HashMap::new(),
        }
    }

    /// Registers (or replaces) a concept.
    pub fn with_concept(mut self, name: &str, phrases: &[&str]) -> Self {
        self.concepts.insert(
            name.to_string(),
            phrases.iter().map(|p| p.to_string()).collect(),
        );
        self
    }

    /// Trigger phrases for a concept, when the name is known.
    pub fn phrases(&self, name: &str) -> Option<&[String]> {
        self.concepts.get(name).map(|v| v.as_slice())
    }

    /// Whether the name resolves to a known concept.
    pub fn knows(&self, name: &str) -> bool {
        name == NO_BLAME_SHIFTING || self.concepts.contains_key(name)
    }
}

impl Default for ConceptLexicon {
    /// The built-in concept table covering the phrase families used by
    /// clinical communication vignettes.
    fn default() -> Self {
        let strs = |v: &[&str]| v.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        let mut concepts = HashMap::new();
        // Empathy-positive concepts
        concepts.insert(
            "emotional acknowledgment".into(),
            strs(lexicon::EMPATHY_PHRASES),
        );
        concepts.insert(
            "active listening".into(),
            strs(&["what i hear you saying", "if i understand you", "tell me more", "go on"]),
        );
        concepts.insert(
            "validation of feelings".into(),
            strs(&["you have every right", "anyone would feel", "it's natural to", "that is a normal reaction"]),
        );
        concepts.insert(
            "expressing compassion".into(),
            strs(&["i'm so sorry this happened", "this should not have happened", "we let you down"]),
        );
        concepts.insert(
            "checking understanding".into(),
            strs(&["does that make sense", "what questions do you have", "would you like me to go over"]),
        );
        concepts.insert(
            "naming the emotion".into(),
            strs(&["you seem", "you sound", "i can tell you are"]),
        );
        concepts.insert(
            "offering presence".into(),
            strs(&["i'm here with you", "take your time", "we don't have to rush"]),
        );
        // Clarity-positive concepts
        concepts.insert(
            "plain language explanation".into(),
            strs(&["in plain terms", "put simply", "what this means is", "in other words"]),
        );
        concepts.insert(
            "structured explanation".into(),
            strs(lexicon::EXPLANATION_CUES),
        );
        concepts.insert(
            "summarizing".into(),
            strs(&["to summarize", "so far we know", "the key points are"]),
        );
        concepts.insert(
            "concrete timeline".into(),
            strs(&["on the day", "within", "by tomorrow", "days later"]),
        );
        concepts.insert(
            "invites questions".into(),
            strs(&["please stop me", "ask me anything", "what would you like to know"]),
        );
        // Accountability-positive concepts
        concepts.insert("direct apology".into(), strs(lexicon::APOLOGY_PHRASES));
        concepts.insert(
            "taking responsibility".into(),
            strs(&["i take responsibility", "we take responsibility", "this was our error", "we failed", "the result was missed"]),
        );
        concepts.insert(
            "offering follow-up".into(),
            strs(&["next step", "going forward", "we will", "follow up with you", "keep you informed"]),
        );
        concepts.insert(
            "corrective action".into(),
            strs(&["we have changed", "to prevent this", "so this cannot happen again"]),
        );
        // Anti-pattern concepts
        concepts.insert("medical jargon".into(), strs(lexicon::MEDICAL_JARGON));
        concepts.insert(
            "defensive responses".into(),
            strs(lexicon::DEFENSIVE_PHRASES),
        );
        concepts.insert("blame shifting".into(), strs(lexicon::BLAME_PHRASES));
        concepts.insert(
            "dismissive language".into(),
            strs(&["calm down", "you're overreacting", "it's not a big deal", "these things happen"]),
        );
        concepts.insert(
            "minimizing concerns".into(),
            strs(&["only a small", "just a minor", "nothing to worry about", "could have been worse"]),
        );
        concepts.insert(
            "euphemism".into(),
            strs(&["unfortunate outcome", "less than ideal", "suboptimal", "hiccup"]),
        );
        concepts.insert(
            "vague commitment".into(),
            strs(&["we'll look into it", "someone will get back", "we'll see what we can do"]),
        );
        concepts.insert(
            "hedging language".into(),
            strs(&["sort of", "kind of", "maybe possibly", "i guess"]),
        );
        concepts.insert(
            "information overload".into(),
            strs(&["furthermore", "additionally", "moreover"]),
        );
        Self { concepts }
    }
}

/// A single detected pattern occurrence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternMatch {
    /// The configured pattern string that matched
    pub pattern: String,
    /// Confidence in [0, 1]
    pub confidence: f32,
    /// The concrete phrase that triggered the match, when one exists
    /// (absent for absence-based concepts like "no blame shifting")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matched_phrase: Option<String>,
    /// Whether the match came from the concept lexicon rather than a
    /// literal substring test
    pub semantic: bool,
}

/// Positive and negative matches for one assessment dimension.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct DimensionMatches {
    pub patterns: Vec<PatternMatch>,
    pub anti_patterns: Vec<PatternMatch>,
}

/// Full match report for one message (or one conversation block).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct MessageAnalysis {
    pub empathy: DimensionMatches,
    pub clarity: DimensionMatches,
    pub accountability: DimensionMatches,
}

/// Detects configured patterns and anti-patterns in trainee messages.
#[derive(Debug, Clone)]
pub struct PatternMatcher {
    lexicon: ConceptLexicon,
    min_confidence: f32,
}

impl Default for PatternMatcher {
    fn default() -> Self {
        Self {
            lexicon: ConceptLexicon::default(),
            min_confidence: DEFAULT_MIN_CONFIDENCE,
        }
    }
}

impl PatternMatcher {
    pub fn new(lexicon: ConceptLexicon, min_confidence: f32) -> Self {
        Self {
            lexicon,
            min_confidence,
        }
    }

    /// Matches a single configured pattern against a message.
    ///
    /// Semantic matching via the concept lexicon is attempted first;
    /// unrecognized pattern names degrade to literal substring containment.
    /// Returns `None` when nothing matched or confidence fell below the
    /// configured minimum.
    pub fn match_pattern(&self, message: &str, pattern: &str) -> Option<PatternMatch> {
        let message_lower = message.to_lowercase();
        let pattern_lower = pattern.to_lowercase();

        let result = if pattern_lower == NO_BLAME_SHIFTING {
            // Absence of blame language is the positive signal here.
            if lexicon::has_blame_language(&message_lower) {
                None
            } else {
                Some(PatternMatch {
                    pattern: pattern.to_string(),
                    confidence: self.confidence(&message_lower, &pattern_lower, false),
                    matched_phrase: None,
                    semantic: true,
                })
            }
        } else if let Some(phrases) = self.lexicon.phrases(&pattern_lower) {
            phrases
                .iter()
                .find(|phrase| message_lower.contains(phrase.as_str()))
                .map(|phrase| PatternMatch {
                    pattern: pattern.to_string(),
                    confidence: self.confidence(&message_lower, &pattern_lower, false),
                    matched_phrase: Some(phrase.clone()),
                    semantic: true,
                })
        } else {
            let occurrences = message_lower.matches(pattern_lower.as_str()).count();
            if occurrences == 0 {
                None
            } else {
                let mut confidence = self.confidence(&message_lower, &pattern_lower, true);
                if occurrences > 1 {
                    // Repeated occurrences boost literal matches, capped.
                    confidence = (confidence + 0.05 * (occurrences as f32 - 1.0)).min(0.95);
                }
                Some(PatternMatch {
                    pattern: pattern.to_string(),
                    confidence,
                    matched_phrase: Some(pattern.to_string()),
                    semantic: false,
                })
            }
        };

        result.filter(|m| m.confidence >= self.min_confidence)
    }

    /// Confidence model shared by both matching modes: base 0.7, +0.1 when
    /// the pattern text itself appears verbatim, +0.15 when the indicator
    /// has more than two words, -0.2 when it is shorter than five
    /// characters.
    fn confidence(&self, message_lower: &str, pattern_lower: &str, literal: bool) -> f32 {
        let mut confidence: f32 = 0.7;
        if literal || message_lower.contains(pattern_lower) {
            confidence += 0.1;
        }
        if lexicon::word_count(pattern_lower) > 2 {
            confidence += 0.15;
        }
        if pattern_lower.chars().count() < 5 {
            confidence -= 0.2;
        }
        confidence.clamp(0.0, 1.0)
    }

    fn match_all(&self, message: &str, patterns: &[String]) -> Vec<PatternMatch> {
        patterns
            .iter()
            .filter_map(|p| self.match_pattern(message, p))
            .collect()
    }

    /// Analyzes one message against the vignette's assessment hooks.
    pub fn analyze_message(&self, message: &str, hooks: &AssessmentHooks) -> MessageAnalysis {
        MessageAnalysis {
            empathy: DimensionMatches {
                patterns: self.match_all(message, &hooks.empathy.patterns),
                anti_patterns: self.match_all(message, &hooks.empathy.anti_patterns),
            },
            clarity: DimensionMatches {
                patterns: self.match_all(message, &hooks.clarity.patterns),
                anti_patterns: self.match_all(message, &hooks.clarity.anti_patterns),
            },
            accountability: DimensionMatches {
                patterns: self.match_all(message, &hooks.accountability.patterns),
                anti_patterns: self.match_all(message, &hooks.accountability.anti_patterns),
            },
        }
    }

    /// Conversation-level assessment mode: concatenates all trainee message
    /// text and analyzes it as one block.
    pub fn analyze_conversation(&self, messages: &[String], hooks: &AssessmentHooks) -> MessageAnalysis {
        let block = messages.join("\n");
        self.analyze_message(&block, hooks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vignette::test_fixtures::sample_vignette;

    fn matcher() -> PatternMatcher {
        PatternMatcher::default()
    }

    #[test]
    fn semantic_concept_matches_phrase_list() {
        let m = matcher()
            .match_pattern("I understand how hard this is.", "emotional acknowledgment")
            .expect("concept should match");
        assert!(m.semantic);
        assert_eq!(m.matched_phrase.as_deref(), Some("i understand"));
        // base 0.7; two-word indicator, pattern text not verbatim in message
        assert!((m.confidence - 0.7).abs() < 1e-6);
    }

    #[test]
    fn long_concept_names_earn_the_multi_word_bonus() {
        let m = matcher()
            .match_pattern(
                "Anyone would feel overwhelmed hearing this.",
                "validation of feelings",
            )
            .expect("concept should match");
        assert!(m.semantic);
        assert_eq!(m.matched_phrase.as_deref(), Some("anyone would feel"));
        // base 0.7 + 0.15 (>2 words)
        assert!((m.confidence - 0.85).abs() < 1e-6);
    }

    #[test]
    fn unknown_pattern_falls_back_to_literal_substring() {
        let m = matcher()
            .match_pattern("We will revisit the care plan together.", "care plan")
            .expect("literal should match");
        assert!(!m.semantic);
        // base 0.7 + 0.1 verbatim
        assert!((m.confidence - 0.8).abs() < 1e-6);
    }

    #[test]
    fn repeated_literal_occurrences_boost_confidence_up_to_cap() {
        let message = "plan the plan around the plan";
        let m = matcher().match_pattern(message, "plan").unwrap();
        // base 0.7 + 0.1 verbatim - 0.2 short + 0.05 * 2 repeats
        assert!((m.confidence - 0.7).abs() < 1e-6);
        let long = "follow up ".repeat(12);
        let boosted = matcher().match_pattern(&long, "follow up").unwrap();
        assert!(boosted.confidence <= 0.95);
    }

    #[test]
    fn short_indicators_are_penalized_below_min_confidence() {
        // "ok" is 2 chars: 0.7 + 0.1 - 0.2 = 0.6, still kept;
        // with min_confidence raised it is discarded.
        let strict = PatternMatcher::new(ConceptLexicon::default(), 0.65);
        assert!(strict.match_pattern("ok, noted", "ok").is_none());
        assert!(matcher().match_pattern("ok, noted", "ok").is_some());
    }

    #[test]
    fn absence_of_blame_language_matches_no_blame_shifting() {
        let m = matcher();
        assert!(m
            .match_pattern("I take responsibility for the delay.", NO_BLAME_SHIFTING)
            .is_some());
        assert!(m
            .match_pattern("It was their fault, not mine.", NO_BLAME_SHIFTING)
            .is_none());
    }

    #[test]
    fn analysis_groups_matches_by_dimension() {
        let vignette = sample_vignette();
        let analysis = matcher().analyze_message(
            "I understand your anger. I'm sorry - the result was missed, and that is on us.",
            &vignette.assessment,
        );
        assert!(!analysis.empathy.patterns.is_empty());
        assert!(!analysis.accountability.patterns.is_empty());
        assert!(analysis.empathy.anti_patterns.is_empty());
    }

    #[test]
    fn lexicon_is_extensible_configuration() {
        let custom = ConceptLexicon::default()
            .with_concept("mentions chaplain", &["chaplain", "spiritual care"]);
        let m = PatternMatcher::new(custom, DEFAULT_MIN_CONFIDENCE);
        assert!(m
            .match_pattern("Our spiritual care team can sit with you.", "mentions chaplain")
            .is_some());
    }
}
