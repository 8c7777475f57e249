//! Emotional state tracking module.
//!
//! # Module Structure
//!
//! - `tracker`: Continuous intensity model (`EmotionalStateTracker`)
//!
//! # Usage
//!
//! ```ignore
//! use clinsim_core::emotion::{EmotionalStateTracker, ResponseIntensity, Trajectory};
//! ```

mod tracker;

// Re-export public API
pub use tracker::{AppliedModifier, EmotionalStateTracker, ResponseIntensity, Trajectory};
