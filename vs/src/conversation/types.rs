//! Conversation types

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Where the conversation is in the theme → title → generate flow
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversationState {
    #[default]
    Idle,
    AwaitingTheme,
    AwaitingTitle,
    Generating,
}

impl ConversationState {
    /// True in the states that take typed user input
    pub fn accepts_input(&self) -> bool {
        matches!(self, Self::AwaitingTheme | Self::AwaitingTitle)
    }
}

impl fmt::Display for ConversationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Idle => "idle",
            Self::AwaitingTheme => "awaiting_theme",
            Self::AwaitingTitle => "awaiting_title",
            Self::Generating => "generating",
        };
        write!(f, "{}", s)
    }
}

/// Who produced a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Ai,
}

/// One entry of the conversation history
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub role: Role,
    pub content: String,
    /// Generated image prompt attached to an AI message
    pub prompt: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Message {
    fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::now_v7(),
            role,
            content: content.into(),
            prompt: None,
            created_at: Utc::now(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn ai(content: impl Into<String>, prompt: String) -> Self {
        Self {
            prompt: Some(prompt),
            ..Self::new(Role::Ai, content)
        }
    }
}

/// A completed theme/title pair, ready for image generation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    pub theme: String,
    pub title: String,
    pub prompt: String,
}

/// Result of feeding input to the conversation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Turn {
    /// The conversation asked a follow-up question
    Reply(Message),
    /// The pair is complete; the caller should start image generation
    Generate(GenerationRequest),
}
