//! Conversation state machine
//!
//! ```text
//! Idle --start--> AwaitingTheme --theme--> AwaitingTitle --title--> Generating
//!   ^                                                                   |
//!   +------------------------------ reset ------------------------------+
//! ```
//!
//! The machine never observes job completion; the owner resets it once the
//! image job resolves.

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info};

use super::types::{ConversationState, GenerationRequest, Message, Turn};
use crate::prompts::PromptEngine;

const ASK_THEME: &str = "你好！今天想画一个什么主题或场景呢？比如：超市、动物园、医院。";
const ASK_TITLE: &str = "好的！给这幅画起一个标题吧。";

/// Errors from conversation transitions
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConversationError {
    #[error("Cannot {action} while {state}")]
    InvalidState {
        state: ConversationState,
        action: &'static str,
    },

    #[error("Input is empty")]
    EmptyInput,
}

/// Linear theme → title → generate dialogue
pub struct Conversation {
    prompts: Arc<PromptEngine>,
    state: ConversationState,
    theme: Option<String>,
    title: Option<String>,
    messages: Vec<Message>,
}

impl Conversation {
    pub fn new(prompts: Arc<PromptEngine>) -> Self {
        debug!("Conversation::new: called");
        Self {
            prompts,
            state: ConversationState::Idle,
            theme: None,
            title: None,
            messages: Vec::new(),
        }
    }

    pub fn state(&self) -> ConversationState {
        self.state
    }

    pub fn theme(&self) -> Option<&str> {
        self.theme.as_deref()
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Prompt attached to the most recent AI message
    pub fn last_prompt(&self) -> Option<&str> {
        self.messages.iter().rev().find_map(|m| m.prompt.as_deref())
    }

    /// Begin a fresh session and ask for a theme
    ///
    /// Any previous theme, title and history are discarded.
    pub fn start(&mut self) -> &Message {
        debug!(state = %self.state, "Conversation::start: called");
        self.clear();
        self.state = ConversationState::AwaitingTheme;
        self.push(Message::system(ASK_THEME))
    }

    /// Return to Idle from any state, discarding theme, title and history
    pub fn reset(&mut self) {
        debug!(state = %self.state, "Conversation::reset: called");
        self.clear();
        self.state = ConversationState::Idle;
    }

    /// Feed typed user input
    ///
    /// Only valid while awaiting a theme or a title. Input is recorded verbatim.
    pub fn handle_input(&mut self, text: &str) -> Result<Turn, ConversationError> {
        debug!(state = %self.state, input_len = text.len(), "Conversation::handle_input: called");
        if !self.state.accepts_input() {
            debug!("Conversation::handle_input: rejected, not accepting input");
            return Err(ConversationError::InvalidState {
                state: self.state,
                action: "accept input",
            });
        }
        if text.is_empty() {
            debug!("Conversation::handle_input: rejected, empty input");
            return Err(ConversationError::EmptyInput);
        }

        self.push(Message::user(text));
        match self.state {
            ConversationState::AwaitingTheme => {
                debug!("Conversation::handle_input: theme received");
                self.theme = Some(text.to_string());
                Ok(Turn::Reply(self.ask_title()))
            }
            _ => {
                debug!("Conversation::handle_input: title received");
                self.title = Some(text.to_string());
                Ok(Turn::Generate(self.complete_pair()))
            }
        }
    }

    /// Accept a theme (and optionally a title) chosen from a picker
    ///
    /// With a title the dialogue jumps straight to generation; with an empty
    /// title it asks for one. Not allowed while a generation is under way.
    pub fn select(&mut self, theme: &str, title: &str) -> Result<Turn, ConversationError> {
        debug!(state = %self.state, %theme, %title, "Conversation::select: called");
        if self.state == ConversationState::Generating {
            debug!("Conversation::select: rejected, generation in progress");
            return Err(ConversationError::InvalidState {
                state: self.state,
                action: "select a theme",
            });
        }
        if theme.is_empty() {
            return Err(ConversationError::EmptyInput);
        }

        self.theme = Some(theme.to_string());
        self.title = None;
        if title.is_empty() {
            debug!("Conversation::select: theme only, asking for title");
            self.push(Message::user(theme));
            return Ok(Turn::Reply(self.ask_title()));
        }

        self.push(Message::user(format!("{} · {}", theme, title)));
        self.title = Some(title.to_string());
        Ok(Turn::Generate(self.complete_pair()))
    }

    fn ask_title(&mut self) -> Message {
        self.state = ConversationState::AwaitingTitle;
        let suggestions = self
            .theme
            .as_deref()
            .and_then(|theme| self.prompts.catalog().find_theme(theme))
            .map(|t| t.titles.join("、"))
            .filter(|s| !s.is_empty());

        let text = match suggestions {
            Some(s) => format!("{} 可以参考：{}", ASK_TITLE, s),
            None => ASK_TITLE.to_string(),
        };
        self.push(Message::system(text)).clone()
    }

    /// Generate the prompt for the recorded pair and enter Generating
    fn complete_pair(&mut self) -> GenerationRequest {
        let theme = self.theme.clone().unwrap_or_default();
        let title = self.title.clone().unwrap_or_default();
        let prompt = self.prompts.generate_prompt(&theme, &title);
        info!("Prompt ready for theme '{}', title '{}'", theme, title);

        self.push(Message::ai(format!("好的！马上为你画「{}」：《{}》。", theme, title), prompt.clone()));
        self.state = ConversationState::Generating;
        GenerationRequest { theme, title, prompt }
    }

    fn push(&mut self, message: Message) -> &Message {
        self.messages.push(message);
        &self.messages[self.messages.len() - 1]
    }

    fn clear(&mut self) {
        self.theme = None;
        self.title = None;
        self.messages.clear();
    }
}
