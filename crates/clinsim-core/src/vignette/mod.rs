//! Vignette domain module.
//!
//! This module contains the authored scenario configuration: phases,
//! branch points, assessment hooks, emotional tracking configuration and
//! the simulated character's profile.
//!
//! # Module Structure
//!
//! - `model`: Scenario configuration types (`Vignette`, `PhaseDef`, ...)
//! - `loader`: TOML parsing and authoring-time validation
//! - `test_fixtures`: A small shared scenario used by tests across crates
//!
//! # Usage
//!
//! ```ignore
//! use clinsim_core::vignette::{Vignette, Difficulty, load_vignette};
//! ```

mod loader;
mod model;
pub mod test_fixtures;

// Re-export public API
pub use loader::{load_vignette, parse_duration_minutes};
pub use model::{
    AssessmentHooks, BranchPoint, CharacterProfile, Difficulty, DifficultyProfile, DimensionHooks,
    EmotionalThreshold, EmotionalTrackingConfig, LearnerObjective, PhaseDef, ResponseStyle,
    RevelationStage, Vignette, default_modifiers,
};
