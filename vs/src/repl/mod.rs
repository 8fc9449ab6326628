//! Interactive chat for VocabScene
//!
//! Terminal front-end for the conversation: typed input, slash commands and
//! job progress output.

mod session;

pub use session::ChatSession;

use eyre::Result;

use crate::app::App;

/// Run the interactive chat
///
/// This is the main entry point for `vs chat`.
pub async fn run_interactive(app: &App) -> Result<()> {
    let mut session = ChatSession::new(app)?;
    session.run().await
}
