//! Clinsim interaction: the generation-provider boundary.
//!
//! # Module Structure
//!
//! - `provider`: `GenerationProvider` trait, response types and the
//!   response-side emotional delta estimator
//! - `context`: Deterministic context/prompt assembly (`ContextBuilder`)
//! - `scripted`: A canned-reply provider for tests and offline development
//!
//! # Usage
//!
//! ```ignore
//! use clinsim_interaction::{ContextBuilder, GenerationProvider, ScriptedProvider};
//! ```

pub mod context;
pub mod provider;
pub mod scripted;

// Re-export public API
pub use context::{ContextBuilder, HistoryTurn, MAX_HISTORY_TURNS, ResponseContext};
pub use provider::{GenerationProvider, GenerationResponse, estimate_emotional_delta};
pub use scripted::{RecordedCall, ScriptedProvider};
