//! VocabScene - themed vocabulary picture generator
//!
//! Turns a theme ("超市") and a picture title ("走进超市") into a structured
//! image-generation prompt built from a vocabulary catalog, submits it to a
//! remote image job service and polls until the picture is ready.
//!
//! # Modules
//!
//! - [`catalog`] - Themes and their vocabulary, with built-in fallbacks
//! - [`prompts`] - Scene prompt templating
//! - [`conversation`] - Theme → title dialogue state machine
//! - [`job`] - Remote job client and poll loop
//! - [`studio`] - One user session: conversation plus at most one running job
//! - [`settings`] - Persisted credential and output options
//! - [`config`] - Configuration types and loading
//! - [`app`] - Wiring of the above for the binary
//! - [`cli`] - Command-line interface
//! - [`repl`] - Interactive chat

pub mod app;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod conversation;
pub mod job;
pub mod prompts;
pub mod repl;
pub mod settings;
pub mod studio;

// Re-export commonly used types
pub use catalog::{Catalog, Theme, Vocabularies, VocabularyEntry, load_catalog};
pub use config::Config;
pub use conversation::{Conversation, ConversationError, ConversationState, GenerationRequest, Message, Role, Turn};
pub use job::{GenerationOptions, HttpJobApi, JobApi, JobError, JobProgress, JobRunner, JobState, JobStatus, PollConfig};
pub use prompts::{PromptContext, PromptEngine};
pub use settings::{SecretString, Settings, SharedSettings};
pub use studio::{GenerationOutcome, Studio, StudioError};
