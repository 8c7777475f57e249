//! Assessment module: pattern detection and score aggregation.
//!
//! # Module Structure
//!
//! - `matcher`: Semantic/literal pattern detection (`PatternMatcher`,
//!   `ConceptLexicon`)
//! - `engine`: Per-dimension and overall scoring (`AssessmentEngine`)
//!
//! # Usage
//!
//! ```ignore
//! use clinsim_core::assessment::{AssessmentEngine, PatternMatcher, ConceptLexicon};
//! ```

mod engine;
mod matcher;

// Re-export public API
pub use engine::{AssessmentEngine, MessageAssessment, PerformanceLevel};
pub use matcher::{
    ConceptLexicon, DEFAULT_MIN_CONFIDENCE, DimensionMatches, MessageAnalysis, NO_BLAME_SHIFTING,
    PatternMatch, PatternMatcher,
};
