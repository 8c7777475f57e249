//! Session domain module.
//!
//! # Module Structure
//!
//! - `model`: Session state snapshot types (`SessionState`, `PhaseState`, ...)
//! - `message`: Conversation message types (`MessageSender`, `ConversationMessage`)
//!
//! # Usage
//!
//! ```ignore
//! use clinsim_core::session::{SessionState, ConversationMessage, MessageSender};
//! ```

mod message;
mod model;

// Re-export public API
pub use message::{ConversationMessage, MessageSender};
pub use model::{
    AssessmentScores, BranchRecord, EmotionalEvent, EmotionalSnapshot, PhaseState, SessionState,
};
