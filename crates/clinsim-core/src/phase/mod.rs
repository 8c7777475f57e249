//! Phase progression module.
//!
//! # Module Structure
//!
//! - `manager`: Phase state machine and branch evaluation (`PhaseManager`)
//!
//! # Usage
//!
//! ```ignore
//! use clinsim_core::phase::{PhaseManager, BranchCondition, TransitionRecord};
//! ```

mod manager;

// Re-export public API
pub use manager::{AUTO_PROGRESSION, BranchCondition, PhaseManager, TransitionRecord};
