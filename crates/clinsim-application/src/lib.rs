//! Clinsim application: per-session orchestration.
//!
//! # Module Structure
//!
//! - `conversation`: The per-turn orchestrator (`ConversationEngine`)
//!
//! # Usage
//!
//! ```ignore
//! use clinsim_application::{ConversationEngine, TurnOutcome};
//! ```

pub mod conversation;

// Re-export public API
pub use conversation::{ConversationEngine, TurnOutcome};
