//! Studio
//!
//! Composes the conversation, prompt engine and job runner for one user
//! session. At most one generation job runs at a time, and a job that finishes
//! after the session was reset is reported as stale so its result can be dropped.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::conversation::{Conversation, ConversationError, ConversationState, GenerationRequest, Message, Turn};
use crate::job::{GenerationOptions, JobError, JobProgress, JobRunner};
use crate::prompts::PromptEngine;
use crate::settings::SharedSettings;

/// Errors from studio operations
#[derive(Debug, Error)]
pub enum StudioError {
    #[error("A generation is already in progress")]
    Busy,

    #[error("Nothing to retry")]
    NothingToRetry,

    /// Input arrived after a generation failed; only retry or reset move on
    #[error("The last generation failed")]
    AwaitingRetry,

    #[error(transparent)]
    Conversation(#[from] ConversationError),

    #[error(transparent)]
    Job(#[from] JobError),
}

/// How a spawned generation ended
#[derive(Debug)]
pub enum GenerationOutcome {
    /// Image URL of the finished job
    Completed(String),
    Failed(JobError),
    /// The session was reset while the job ran; the result was dropped
    Stale,
}

/// Identifies one generation within a session epoch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenerationTicket {
    epoch: u64,
}

/// In-progress flag plus a session epoch
///
/// `reset` bumps the epoch; a ticket from an older epoch no longer owns the
/// in-progress flag when it finishes.
#[derive(Debug, Default)]
pub struct GenerationGuard {
    in_progress: AtomicBool,
    epoch: AtomicU64,
}

impl GenerationGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the in-progress flag, or None if a generation is already running
    pub fn try_begin(&self) -> Option<GenerationTicket> {
        self.in_progress
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| GenerationTicket {
                epoch: self.epoch.load(Ordering::SeqCst),
            })
    }

    /// Release the flag; returns false when the ticket belongs to an older epoch
    pub fn finish(&self, ticket: GenerationTicket) -> bool {
        if self.is_current(ticket) {
            self.in_progress.store(false, Ordering::SeqCst);
            true
        } else {
            false
        }
    }

    /// Start a new epoch, orphaning any outstanding ticket
    pub fn invalidate(&self) {
        self.epoch.fetch_add(1, Ordering::SeqCst);
        self.in_progress.store(false, Ordering::SeqCst);
    }

    pub fn is_current(&self, ticket: GenerationTicket) -> bool {
        self.epoch.load(Ordering::SeqCst) == ticket.epoch
    }

    pub fn is_busy(&self) -> bool {
        self.in_progress.load(Ordering::SeqCst)
    }
}

/// One user session: conversation plus image generation
pub struct Studio {
    conversation: Conversation,
    runner: Arc<JobRunner>,
    settings: SharedSettings,
    guard: Arc<GenerationGuard>,
    last_request: Option<GenerationRequest>,
}

impl Studio {
    pub fn new(prompts: Arc<PromptEngine>, runner: Arc<JobRunner>, settings: SharedSettings) -> Self {
        debug!("Studio::new: called");
        Self {
            conversation: Conversation::new(prompts),
            runner,
            settings,
            guard: Arc::new(GenerationGuard::new()),
            last_request: None,
        }
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    pub fn state(&self) -> ConversationState {
        self.conversation.state()
    }

    pub fn is_generating(&self) -> bool {
        self.guard.is_busy()
    }

    /// The most recent completed theme/title pair
    pub fn last_request(&self) -> Option<&GenerationRequest> {
        self.last_request.as_ref()
    }

    /// Start a fresh conversation
    pub fn start(&mut self) -> Message {
        debug!("Studio::start: called");
        self.reset();
        self.conversation.start().clone()
    }

    /// Feed typed input to the conversation
    pub fn input(&mut self, text: &str) -> Result<Turn, StudioError> {
        debug!("Studio::input: called");
        let turn = self.conversation.handle_input(text).map_err(|e| self.explain(e))?;
        self.remember(&turn);
        Ok(turn)
    }

    /// Pick a theme (and optionally a title) directly
    pub fn select(&mut self, theme: &str, title: &str) -> Result<Turn, StudioError> {
        debug!(%theme, %title, "Studio::select: called");
        let turn = self.conversation.select(theme, title).map_err(|e| self.explain(e))?;
        self.remember(&turn);
        Ok(turn)
    }

    /// Tell a failed generation apart from one still running
    fn explain(&self, error: ConversationError) -> StudioError {
        match error {
            ConversationError::InvalidState {
                state: ConversationState::Generating,
                ..
            } if !self.guard.is_busy() => StudioError::AwaitingRetry,
            other => other.into(),
        }
    }

    fn remember(&mut self, turn: &Turn) {
        if let Turn::Generate(request) = turn {
            self.last_request = Some(request.clone());
        }
    }

    /// Discard the session; results of any running job will come back stale
    pub fn reset(&mut self) {
        debug!(busy = self.guard.is_busy(), "Studio::reset: called");
        self.guard.invalidate();
        self.conversation.reset();
        self.last_request = None;
    }

    /// Run a generation job in the background
    ///
    /// Fails immediately with `ConfigurationMissing` when no credential is set
    /// and with `Busy` while another job is outstanding.
    pub fn spawn_generation(
        &self,
        request: &GenerationRequest,
        progress_tx: mpsc::Sender<JobProgress>,
    ) -> Result<JoinHandle<GenerationOutcome>, StudioError> {
        debug!(theme = %request.theme, title = %request.title, "Studio::spawn_generation: called");
        let settings = self.settings.snapshot();
        if !settings.has_credential() {
            debug!("Studio::spawn_generation: no credential");
            return Err(JobError::ConfigurationMissing.into());
        }

        let Some(ticket) = self.guard.try_begin() else {
            debug!("Studio::spawn_generation: already generating");
            return Err(StudioError::Busy);
        };

        let options = GenerationOptions::from(&settings);
        let runner = Arc::clone(&self.runner);
        let guard = Arc::clone(&self.guard);
        let prompt = request.prompt.clone();
        info!("Starting generation for '{}'", request.title);

        Ok(tokio::spawn(async move {
            let result = runner.run_to_completion(&prompt, &options, progress_tx).await;
            if !guard.finish(ticket) {
                warn!("Dropping generation result from a previous session");
                return GenerationOutcome::Stale;
            }
            match result {
                Ok(url) => GenerationOutcome::Completed(url),
                Err(e) => GenerationOutcome::Failed(e),
            }
        }))
    }

    /// Re-run the last completed pair, e.g. after a failed job
    pub fn retry(&self, progress_tx: mpsc::Sender<JobProgress>) -> Result<JoinHandle<GenerationOutcome>, StudioError> {
        debug!("Studio::retry: called");
        let request = self.last_request.as_ref().ok_or(StudioError::NothingToRetry)?;
        self.spawn_generation(request, progress_tx)
    }
}
