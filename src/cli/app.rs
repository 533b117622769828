//! CLI module for the memorize application
//!
//! This module maps command-line commands and key presses onto the
//! flashcard controller and renders the resulting state.
use std::{
    fs::{read_to_string, OpenOptions},
    io::{stdin, stdout, Write},
    path::{Path, PathBuf},
    process::Command,
    sync::Arc,
};

use console::{style, Key, Term};
use log::info;
use shell_words::split;
use tempfile::Builder;
use tokio::sync::Mutex;

use crate::{
    Advance, Commands, Config, Deck, DeckId, FlashcardController, MemoError, Notification,
    Persistence, Result, SessionState, Severity,
};

/// CLI Application handler - processes CLI commands and drives the controller
pub struct App {
    /// The flashcard controller, behind the single lock serializing all
    /// mutations of session and deck state
    controller: Arc<Mutex<FlashcardController>>,

    /// Application configuration
    config: Config,

    /// Whether to display verbose output
    verbose: bool,
}

impl App {
    /// Create a new CLI application with the given controller and config
    pub fn new(controller: FlashcardController, config: Config, verbose: bool) -> Self {
        Self {
            controller: Arc::new(Mutex::new(controller)),
            config,
            verbose,
        }
    }

    /// Run the CLI application with the given command
    pub async fn run(&self, command: Commands) -> Result<()> {
        match command {
            Commands::Generate {
                text,
                file,
                save,
                print,
            } => self.handle_generate(text, file, save, print).await?,

            Commands::Decks { json } => self.handle_decks(json).await?,

            Commands::Study { deck } => self.handle_study(&deck).await?,

            Commands::Delete { id, force } => self.handle_delete(id, force).await?,

            Commands::Streak => {
                let streak = self.controller.lock().await.streak();
                match streak.last_studied {
                    Some(day) => println!(
                        "🔥 {} day streak (last studied {})",
                        streak.count,
                        day.format("%Y-%m-%d")
                    ),
                    None => println!("No study streak yet."),
                }
            }

            Commands::Config { .. } => {
                return Err(MemoError::ConfigError {
                    message: "config is handled before the controller starts".to_string(),
                })
            }
        }

        Ok(())
    }

    /// Shows, updates or resets the configuration file
    pub fn handle_config(
        config: &mut Config,
        path: &Path,
        show: bool,
        set: Option<String>,
        reset: bool,
    ) -> Result<()> {
        let show = show || (set.is_none() && !reset);

        if reset {
            *config = Config::default();
            config.save(path)?;
            println!("Configuration reset to defaults.");
        }

        if let Some(assignment) = set {
            config.set(&assignment)?;
            config.save(path)?;
            println!("Configuration updated.");
        }

        if show {
            println!("Configuration file: {}", path.display());
            println!("{}", serde_json::to_string_pretty(config)?);
        }

        Ok(())
    }

    async fn handle_generate(
        &self,
        text: Option<String>,
        file: Option<PathBuf>,
        save: Option<String>,
        print: bool,
    ) -> Result<()> {
        if text.is_some() && file.is_some() {
            return Err(MemoError::InvalidFormat {
                message: "Cannot specify both --text and --file options".to_string(),
            });
        }

        let input = match (text, file) {
            (Some(t), _) => t,
            (_, Some(file_path)) => {
                if !file_path.exists() {
                    return Err(MemoError::FileNotFound {
                        file_path: file_path.display().to_string(),
                    });
                }
                read_to_string(file_path)?
            }
            (None, None) => self.open_editor_for_text()?,
        };

        {
            let mut controller = self.controller.lock().await;
            let result = controller.generate(&input).await;
            self.render_notifications(&mut controller);
            result?;

            if let Some(name) = save {
                controller.save_current(Some(&name)).await?;
                self.render_notifications(&mut controller);
            }

            if print {
                if let Some(deck) = controller.session().deck() {
                    for (i, card) in deck.cards.iter().enumerate() {
                        println!("{}. [{}] {}", i + 1, card.theme, style(&card.question).bold());
                        println!("   {}", card.answer);
                    }
                }
                return Ok(());
            }
        }

        self.study_loop().await
    }

    async fn handle_decks(&self, json: bool) -> Result<()> {
        let mut controller = self.controller.lock().await;
        let persistence = controller.refresh_decks().await?;
        self.render_notifications(&mut controller);

        let decks = controller.decks();
        if json {
            println!("{}", serde_json::to_string_pretty(decks)?);
            return Ok(());
        }

        if decks.is_empty() {
            println!("No saved decks yet. Generate and save some flashcards!");
            return Ok(());
        }

        self.display_decks_text(decks);
        if persistence == Persistence::LocalOnly {
            println!("{}", style("(server unreachable, showing local decks)").dim());
        }
        Ok(())
    }

    fn display_decks_text(&self, decks: &[Deck]) {
        let term_width = terminal_size::terminal_size()
            .map(|(w, _)| w.0 as usize)
            .unwrap_or(80);

        for (i, deck) in decks.iter().enumerate() {
            if i > 0 {
                println!("{}", "-".repeat(term_width.min(50)));
            }
            println!("ID: {} | {}", deck.id, style(&deck.name).bold());
            println!(
                "{} card{} • Created {}",
                deck.len(),
                if deck.len() == 1 { "" } else { "s" },
                deck.created.format("%Y-%m-%d")
            );
            if self.verbose {
                println!("Last studied {}", deck.last_studied.format("%Y-%m-%d %H:%M"));
            }
        }
    }

    async fn handle_study(&self, query: &str) -> Result<()> {
        {
            let mut controller = self.controller.lock().await;
            controller.refresh_decks().await?;

            let by_id = query
                .parse::<DeckId>()
                .ok()
                .filter(|id| controller.store().get(*id).is_some());
            let found = by_id.or_else(|| controller.store().find_by_name(query).map(|d| d.id));

            let Some(id) = found else {
                self.render_notifications(&mut controller);
                println!("No deck matches {:?}", query);
                return Ok(());
            };

            let result = controller.load_deck(id).await;
            self.render_notifications(&mut controller);
            result?;
        }

        self.study_loop().await
    }

    async fn handle_delete(&self, id: DeckId, force: bool) -> Result<()> {
        let mut controller = self.controller.lock().await;
        controller.refresh_decks().await?;

        if !force {
            match controller.store().get(id) {
                Some(deck) => {
                    println!("You are about to delete the following deck:");
                    println!("ID:      {}", deck.id);
                    println!("Name:    {}", deck.name);
                    println!("Cards:   {}", deck.len());
                    println!("Created: {}", deck.created.format("%Y-%m-%d %H:%M:%S"));
                }
                None => println!("Deck {} is not in the local collection.", id),
            }

            print!("\nAre you sure you want to delete this deck? [y/N]: ");
            stdout().flush().map_err(MemoError::Io)?;

            let mut input = String::new();
            stdin().read_line(&mut input).map_err(MemoError::Io)?;

            let input = input.trim().to_lowercase();
            if input != "y" && input != "yes" {
                println!("Deletion cancelled.");
                return Ok(());
            }
        }

        let result = controller.delete_deck(id).await;
        self.render_notifications(&mut controller);
        result.map(|_| ())
    }

    /// Interactive study: arrows move between cards, space flips.
    async fn study_loop(&self) -> Result<()> {
        let term = Term::stdout();
        let mut flipped = false;

        loop {
            {
                let mut controller = self.controller.lock().await;
                self.render_card(&controller, flipped);
                self.render_banner(&mut controller);
            }

            let key = term.read_key()?;
            let mut controller = self.controller.lock().await;
            let complete = controller.session().state() == SessionState::Complete;

            match key {
                Key::ArrowRight | Key::Char('n') if !complete => {
                    if controller.next() == Advance::Completed {
                        println!("\n🎉 Deck completed! [r] Start over  [s] Save  [q] New deck");
                    }
                    flipped = false;
                }
                Key::ArrowLeft | Key::Char('p') => {
                    controller.previous();
                    flipped = false;
                }
                Key::Char(' ') | Key::Enter => flipped = !flipped,
                Key::Char('r') => {
                    controller.restart();
                    flipped = false;
                }
                Key::Char('s') => {
                    drop(controller);
                    let name = self.prompt_line("Enter a name for this deck: ")?;
                    let mut controller = self.controller.lock().await;
                    if let Err(e) = controller.save_current(Some(&name)).await {
                        info!("Save failed: {}", e);
                    }
                }
                Key::Char('x') => controller.notifications_mut().dismiss(),
                Key::Char('q') | Key::Escape => {
                    controller.new_deck();
                    return Ok(());
                }
                _ => {}
            }
        }
    }

    fn render_card(&self, controller: &FlashcardController, flipped: bool) {
        let session = controller.session();
        let (Some(card), Some((number, total))) = (session.current_card(), session.position())
        else {
            return;
        };

        let steps = session.milestones_reached();
        let tracker = format!("{}{}", "●".repeat(steps), "○".repeat(5 - steps));

        println!();
        println!(
            "Card {} of {}  {}  {:.0}%  [{}]",
            number,
            total,
            tracker,
            session.progress(),
            card.theme
        );
        if flipped {
            println!("💡 {}", style(&card.answer).green());
        } else {
            println!("❓ {}", style(&card.question).bold());
        }
        println!(
            "{}",
            style("←/p previous  →/n next  space flip  r restart  s save  x dismiss  q quit").dim()
        );
    }

    /// Shows the notification that is still on screen. Inside the study
    /// loop only the current one matters, so the backlog is dropped.
    fn render_banner(&self, controller: &mut FlashcardController) {
        let notifications = controller.notifications_mut();
        notifications.take_history();
        if let Some(notification) = notifications.current() {
            println!("{}", format_notification(notification));
        }
    }

    /// Prints and clears pending notifications
    fn render_notifications(&self, controller: &mut FlashcardController) {
        for notification in controller.notifications_mut().take_history() {
            println!("{}", format_notification(&notification));
        }
    }

    fn prompt_line(&self, prompt: &str) -> Result<String> {
        print!("{}", prompt);
        stdout().flush()?;
        let mut input = String::new();
        stdin().read_line(&mut input)?;
        Ok(input.trim().to_string())
    }

    fn open_editor_for_text(&self) -> Result<String> {
        let temp_file = Builder::new().suffix(".txt").tempfile()?;
        let temp_path = temp_file.path().to_path_buf();

        let editor_cmd = self.config.get_editor_command();
        self.write_editor_template(&temp_path)?;

        info!("Opening editor to enter study text. Save and exit when done...");
        self.launch_editor(&editor_cmd, &temp_path)?;

        let content = read_to_string(&temp_path)?;
        Ok(strip_editor_comments(&content))
    }

    fn write_editor_template(&self, path: &Path) -> Result<()> {
        let mut file = OpenOptions::new().write(true).open(path)?;

        writeln!(file, "# Paste or write the text to turn into flashcards below.")?;
        writeln!(file, "# Lines starting with # are ignored.")?;
        writeln!(file, "# Save and exit the editor when you're done.")?;
        writeln!(file)?;

        Ok(())
    }

    fn launch_editor(&self, editor_cmd: &str, file_path: &Path) -> Result<()> {
        let path_str = file_path.to_string_lossy();

        let args = split(editor_cmd).map_err(|e| MemoError::EditorError {
            message: format!("Failed to parse editor command: {}", e),
        })?;

        let Some((program, rest)) = args.split_first() else {
            return Err(MemoError::EditorError {
                message: "Empty editor command".to_string(),
            });
        };

        let status = Command::new(program)
            .args(rest)
            .arg(path_str.as_ref())
            .status()?;

        if !status.success() {
            return Err(MemoError::EditorError {
                message: "Editor exited with non-zero status".to_string(),
            });
        }

        Ok(())
    }
}

/// One-line rendering of a notification with its severity icon
pub fn format_notification(notification: &Notification) -> String {
    let message = &notification.message;
    match notification.severity {
        Severity::Info => format!("💬 {}", message),
        Severity::Success => format!("✅ {}", style(message).green()),
        Severity::Warning => format!("⚠️  {}", style(message).yellow()),
        Severity::Error => format!("❌ {}", style(message).red()),
    }
}

/// Drops template comment lines from editor output
fn strip_editor_comments(content: &str) -> String {
    content
        .lines()
        .filter(|line| !line.trim_start().starts_with('#'))
        .collect::<Vec<&str>>()
        .join("\n")
}
