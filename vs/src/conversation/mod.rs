//! Conversation State Machine
//!
//! Drives the theme → title → generate dialogue and records its messages.

mod machine;
mod types;

pub use machine::{Conversation, ConversationError};
pub use types::{ConversationState, GenerationRequest, Message, Role, Turn};
