//! Chat session management

use colored::Colorize;
use eyre::Result;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::app::App;
use crate::conversation::{ConversationError, ConversationState, Message, Role, Turn};
use crate::job::JobError;
use crate::settings::SecretString;
use crate::studio::{GenerationOutcome, Studio, StudioError};

/// Interactive theme → title → picture chat
pub struct ChatSession<'a> {
    app: &'a App,
    studio: Studio,
}

enum SlashResult {
    Continue,
    Quit,
}

impl<'a> ChatSession<'a> {
    pub fn new(app: &'a App) -> Result<Self> {
        let studio = app.studio()?;
        Ok(Self { app, studio })
    }

    /// Run the chat main loop
    pub async fn run(&mut self) -> Result<()> {
        self.print_welcome();
        let greeting = self.studio.start();
        print_message(&greeting);

        // Create readline editor for proper line editing
        let mut rl = DefaultEditor::new().map_err(|e| eyre::eyre!("Failed to initialize readline: {}", e))?;

        loop {
            let readline = rl.readline(&format!("{} ", ">".bright_green()));

            match readline {
                Ok(line) => {
                    let input = line.trim();
                    if input.is_empty() {
                        continue;
                    }

                    let _ = rl.add_history_entry(input);

                    if input.starts_with('/') {
                        match self.handle_slash_command(input, &mut rl).await {
                            SlashResult::Continue => continue,
                            SlashResult::Quit => break,
                        }
                    } else {
                        let result = self.studio.input(input);
                        self.handle_turn(result).await;
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    // Ctrl+C - just show new prompt
                    println!("^C");
                    continue;
                }
                Err(ReadlineError::Eof) => {
                    // Ctrl+D - exit
                    println!();
                    break;
                }
                Err(err) => {
                    return Err(eyre::eyre!("Readline error: {}", err));
                }
            }
        }

        println!("再见！");
        Ok(())
    }

    fn print_welcome(&self) {
        println!();
        println!("{}", "VocabScene".bright_cyan().bold());
        println!("{} themes loaded", self.app.catalog.len());
        println!("Type {} for help, {} to quit", "/help".yellow(), "/quit".yellow());
        if !self.app.settings.has_credential() {
            println!("{} No API key set. Use {} before generating.", "!".yellow(), "/key".yellow());
        }
        println!();
    }

    async fn handle_slash_command(&mut self, input: &str, rl: &mut DefaultEditor) -> SlashResult {
        let parts: Vec<&str> = input.split_whitespace().collect();
        let cmd = parts.first().copied().unwrap_or("");
        debug!(%cmd, "handle_slash_command: called");

        match cmd {
            "/help" | "/h" => {
                self.print_help();
                SlashResult::Continue
            }
            "/quit" | "/q" | "/exit" => SlashResult::Quit,
            "/themes" | "/t" => {
                self.print_themes();
                SlashResult::Continue
            }
            "/pick" | "/p" => {
                let Some(theme) = parts.get(1) else {
                    println!("{} /pick <theme> [title]", "Usage:".yellow());
                    return SlashResult::Continue;
                };
                let title = parts[2..].join(" ");
                let result = self.studio.select(theme, &title);
                self.handle_turn(result).await;
                SlashResult::Continue
            }
            "/reset" | "/r" => {
                let greeting = self.studio.start();
                print_message(&greeting);
                SlashResult::Continue
            }
            "/retry" => {
                if let Some(request) = self.studio.last_request() {
                    println!("{} 重新生成「{}」：《{}》", "↻".bright_blue(), request.theme, request.title);
                }
                let (tx, rx) = mpsc::channel(16);
                let spawned = self.studio.retry(tx);
                self.follow_generation(spawned, rx).await;
                SlashResult::Continue
            }
            "/key" => {
                self.prompt_for_key(rl);
                SlashResult::Continue
            }
            "/history" => {
                self.print_history();
                SlashResult::Continue
            }
            _ => {
                println!("{} Unknown command: {}", "?".yellow(), cmd);
                println!("Type {} for available commands", "/help".yellow());
                SlashResult::Continue
            }
        }
    }

    fn print_help(&self) {
        println!();
        println!("{}", "Available Commands:".bright_cyan());
        println!("  {:22} Show this help", "/help".yellow());
        println!("  {:22} List themes and suggested titles", "/themes".yellow());
        println!("  {:22} Choose a theme, and optionally a title", "/pick <theme> [title]".yellow());
        println!("  {:22} Start over", "/reset".yellow());
        println!("  {:22} Generate the last picture again", "/retry".yellow());
        println!("  {:22} Set the API key", "/key".yellow());
        println!("  {:22} Show conversation history", "/history".yellow());
        println!("  {:22} Exit", "/quit".yellow());
        println!();
    }

    fn print_themes(&self) {
        println!();
        for theme in self.app.catalog.themes() {
            println!("  {} {}", theme.name.bright_white(), theme.titles.join(" / ").dimmed());
        }
        println!();
    }

    fn print_history(&self) {
        let messages = self.studio.conversation().messages();
        if messages.is_empty() {
            println!("{}", "No conversation history.".dimmed());
            return;
        }

        println!();
        for (i, msg) in messages.iter().enumerate() {
            let role = match msg.role {
                Role::System => "System".bright_cyan(),
                Role::User => "User".bright_green(),
                Role::Ai => "AI".bright_blue(),
            };
            let attached = if msg.prompt.is_some() { " [prompt]" } else { "" };
            println!(
                "  {}. {} {}: {}{}",
                i + 1,
                msg.created_at.format("%H:%M:%S").to_string().dimmed(),
                role,
                msg.content,
                attached.dimmed()
            );
        }
        println!();
    }

    fn prompt_for_key(&self, rl: &mut DefaultEditor) {
        let Ok(key) = rl.readline("API key: ") else {
            return;
        };
        let key = key.trim().to_string();
        if key.is_empty() {
            println!("{}", "No key entered.".dimmed());
            return;
        }

        match self.app.save_api_key(SecretString::new(key)) {
            Ok(()) => println!("{} API key saved", "✓".green()),
            Err(e) => println!("{} API key set for this session only: {}", "!".yellow(), e),
        }
    }

    async fn handle_turn(&mut self, result: Result<Turn, StudioError>) {
        match result {
            Ok(Turn::Reply(message)) => print_message(&message),
            Ok(Turn::Generate(request)) => {
                if let Some(message) = self.studio.conversation().messages().last() {
                    print_message(message);
                }
                let (tx, rx) = mpsc::channel(16);
                let spawned = self.studio.spawn_generation(&request, tx);
                self.follow_generation(spawned, rx).await;
            }
            Err(StudioError::AwaitingRetry) => {
                println!(
                    "{} 上一张图片没有生成成功。用 {} 重试，或 {} 重新开始。",
                    "!".yellow(),
                    "/retry".yellow(),
                    "/reset".yellow()
                );
            }
            Err(StudioError::Conversation(ConversationError::InvalidState {
                state: ConversationState::Generating,
                ..
            })) => {
                println!(
                    "{} 图片还在处理中，请稍候，或用 {} 重新开始。",
                    "!".yellow(),
                    "/reset".yellow()
                );
            }
            Err(e) => println!("{} {}", "!".yellow(), e),
        }
    }

    /// Print progress until the job resolves, then re-arm the conversation
    async fn follow_generation(
        &mut self,
        spawned: Result<JoinHandle<GenerationOutcome>, StudioError>,
        mut rx: mpsc::Receiver<crate::job::JobProgress>,
    ) {
        let handle = match spawned {
            Ok(handle) => handle,
            Err(StudioError::Job(JobError::ConfigurationMissing)) => {
                println!(
                    "{} 还没有设置 API key。输入 {} 设置后再用 {} 生成。",
                    "!".yellow(),
                    "/key".yellow(),
                    "/retry".yellow()
                );
                return;
            }
            Err(e) => {
                println!("{} {}", "!".yellow(), e);
                return;
            }
        };

        while let Some(progress) = rx.recv().await {
            println!("  {}", progress.to_string().dimmed());
        }

        match handle.await {
            Ok(GenerationOutcome::Completed(url)) => {
                println!("{} {}", "画好了：".bright_green(), url.bright_white().underline());
                println!();
                let greeting = self.studio.start();
                print_message(&greeting);
            }
            Ok(GenerationOutcome::Failed(e)) => {
                println!("{} {}", "生成失败：".red(), e);
                println!("用 {} 重试，或 {} 重新开始。", "/retry".yellow(), "/reset".yellow());
            }
            Ok(GenerationOutcome::Stale) => {
                debug!("follow_generation: stale result ignored");
            }
            Err(e) => println!("{} {}", "生成失败：".red(), e),
        }
    }
}

fn print_message(message: &Message) {
    match message.role {
        Role::System => println!("{} {}", "●".bright_cyan(), message.content),
        Role::User => println!("{} {}", ">".bright_green(), message.content),
        Role::Ai => {
            println!("{} {}", "★".bright_blue(), message.content);
            if let Some(ref prompt) = message.prompt {
                println!("{}", prompt.dimmed());
            }
        }
    }
}
