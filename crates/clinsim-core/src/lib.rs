//! Clinsim core: domain models and in-memory engines for the phase-based
//! clinical conversation simulation.
//!
//! This crate owns the scenario configuration ("vignettes"), per-session
//! state, and the four cooperating engines that drive a turn: the pattern
//! matcher, the emotional state tracker, the phase manager and the
//! assessment engine. It performs no I/O beyond vignette loading and has no
//! knowledge of the text-generation backend; see `clinsim-interaction` for
//! the provider boundary and `clinsim-application` for the per-turn
//! orchestrator.

pub mod assessment;
pub mod emotion;
pub mod error;
pub mod lexicon;
pub mod phase;
pub mod session;
pub mod vignette;

// Re-export common error type
pub use error::{ClinsimError, Result};
