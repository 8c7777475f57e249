//! Conversation message types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Who authored a message in the simulated conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageSender {
    /// The trainee
    User,
    /// The simulated character
    Avatar,
}

/// A single message in the conversation log.
///
/// Messages are immutable once appended; the log only ever grows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationMessage {
    /// Monotonic id within the session, issued by the conversation engine
    pub id: u64,
    /// Message text
    pub text: String,
    /// Message author
    pub sender: MessageSender,
    /// When the message was appended
    pub timestamp: DateTime<Utc>,
    /// Phase that was active when the message was sent
    pub phase_id: String,
    /// Emotional delta attributed to this message, when one was applied
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emotional_delta: Option<f32>,
}
