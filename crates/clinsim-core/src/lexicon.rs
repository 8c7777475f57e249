//! Lexical detectors shared by the emotional tracker, the phase manager's
//! branch heuristics and the semantic pattern lexicon.
//!
//! Detection is deliberately lexical: lower-cased substring matching over
//! curated phrase lists, not NLU.

/// Phrases signalling emotional acknowledgment of the other party.
pub const EMPATHY_PHRASES: &[&str] = &[
    "i understand",
    "i can see",
    "i hear you",
    "that must be",
    "that sounds",
    "i can only imagine",
    "it makes sense that you",
    "you have every right",
];

/// Clinical terminology a lay family member would experience as jargon.
pub const MEDICAL_JARGON: &[&str] = &[
    "myocardial",
    "infarction",
    "idiopathic",
    "etiology",
    "iatrogenic",
    "comorbid",
    "contraindicated",
    "differential diagnosis",
    "hemodynamic",
    "metastatic",
    "prognosis",
    "bilateral",
    "titrate",
    "adverse event",
    "standard of care deviation",
];

/// Defensive phrasing that deflects responsibility.
pub const DEFENSIVE_PHRASES: &[&str] = &[
    "not my fault",
    "i was following",
    "i was just",
    "wasn't my decision",
    "you have to understand",
    "we did everything we could",
    "that's just how",
    "per protocol",
    "protocol",
];

/// Apology phrasing.
pub const APOLOGY_PHRASES: &[&str] = &[
    "i'm sorry",
    "i am sorry",
    "we're sorry",
    "we are sorry",
    "i apologize",
    "we apologize",
    "my apologies",
];

/// Blame-shifting language. Its *absence* is treated as a positive
/// accountability signal by the pattern matcher.
pub const BLAME_PHRASES: &[&str] = &[
    "not my fault",
    "their fault",
    "someone else",
    "blame the",
    "the nurse should have",
    "the lab should have",
    "wasn't my responsibility",
];

/// Structural cue words of a deliberate, stepwise explanation.
pub const EXPLANATION_CUES: &[&str] = &[
    "first",
    "then",
    "next",
    "because",
    "this means",
    "in other words",
    "to put it simply",
    "what happened was",
    "let me explain",
];

/// True when any phrase from the list occurs in the message
/// (case-insensitive).
pub fn contains_any(text: &str, phrases: &[&str]) -> bool {
    let lower = text.to_lowercase();
    phrases.iter().any(|p| lower.contains(p))
}

/// Whitespace-delimited word count.
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Detects empathetic phrasing.
pub fn is_empathetic(text: &str) -> bool {
    contains_any(text, EMPATHY_PHRASES)
}

/// Detects unexplained clinical terminology.
pub fn has_medical_jargon(text: &str) -> bool {
    contains_any(text, MEDICAL_JARGON)
}

/// Detects defensive, responsibility-deflecting phrasing.
pub fn is_defensive(text: &str) -> bool {
    contains_any(text, DEFENSIVE_PHRASES)
}

/// Detects apology phrasing.
pub fn is_apology(text: &str) -> bool {
    contains_any(text, APOLOGY_PHRASES)
}

/// Detects blame-shifting language.
pub fn has_blame_language(text: &str) -> bool {
    contains_any(text, BLAME_PHRASES)
}

/// Heuristic for a clear, lay-accessible explanation: structural cue words,
/// a moderate length window, and no clinical jargon.
pub fn is_clear_explanation(text: &str) -> bool {
    let words = word_count(text);
    contains_any(text, EXPLANATION_CUES) && (8..=60).contains(&words) && !has_medical_jargon(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_empathy() {
        assert!(is_empathetic("I understand how hard this is for you."));
        assert!(!is_empathetic("The lab result was delayed."));
    }

    #[test]
    fn detects_defensiveness() {
        assert!(is_defensive("It's not my fault, I was following protocol."));
        assert!(!is_defensive("I take full responsibility for the delay."));
    }

    #[test]
    fn clear_explanation_needs_cues_length_and_no_jargon() {
        assert!(is_clear_explanation(
            "First, the blood test result came back late, and this means your mother's treatment started later than it should have."
        ));
        // Too short
        assert!(!is_clear_explanation("Because of a delay."));
        // Jargon disqualifies
        assert!(!is_clear_explanation(
            "First, the etiology was unclear, and this means the team waited on the differential diagnosis before acting."
        ));
    }
}
