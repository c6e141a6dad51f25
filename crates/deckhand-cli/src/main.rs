//! Line-oriented local driver for the deckhand core.
//!
//! This binary stands in for the chat gateway: it parses typed commands
//! from stdin into session events, forwards them to the state machine, and
//! prints the replies. All policy lives in the library crates; nothing here
//! is more than transport plumbing.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{
    fmt::format::Format, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter,
};

use deckhand_core::models::UserId;
use deckhand_core::{Config, ReplyMetadata};
use deckhand_services::{
    CleanupService, EditCommand, SessionEvent, SessionReply, SessionStateMachine, SessionStore,
    UploadIngestor,
};
use deckhand_slides::TemplateCatalog;
use deckhand_storage::{ArtifactStore, ByteStream, LocalArtifactStore};

#[derive(Parser)]
#[command(name = "deckhand", about = "Conversational slide deck assistant")]
struct Cli {
    /// User identity to run the session as
    #[arg(long, default_value = "local")]
    user: String,
}

fn init_tracing() {
    let console_fmt = tracing_subscriber::fmt::layer().event_format(
        Format::default()
            .compact()
            .with_target(false)
            .without_time(),
    );
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "deckhand=info".into()))
        .with(console_fmt)
        .init();
}

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let cli = Cli::parse();

    let config = Config::from_env()?;
    init_tracing();

    let uploads: Arc<dyn ArtifactStore> = Arc::new(
        LocalArtifactStore::new(&config.upload_root)
            .await
            .context("Failed to open upload root")?,
    );
    let outputs: Arc<dyn ArtifactStore> = Arc::new(
        LocalArtifactStore::new(&config.output_root)
            .await
            .context("Failed to open output root")?,
    );
    let templates = Arc::new(TemplateCatalog::load_dir(&config.template_root)?);
    let store = Arc::new(SessionStore::new());
    let ingestor = Arc::new(UploadIngestor::new(uploads, config.max_upload_size_bytes));
    let machine = SessionStateMachine::new(
        store.clone(),
        ingestor,
        templates.clone(),
        outputs,
    );

    let cleanup = Arc::new(CleanupService::new(
        store,
        config.upload_root.clone(),
        Duration::from_secs(config.session_idle_timeout_secs),
        Duration::from_secs(config.cleanup_interval_secs),
    ));
    let _cleanup_handle = cleanup.start();

    tracing::info!(
        upload_root = %config.upload_root.display(),
        output_root = %config.output_root.display(),
        templates = templates.len(),
        max_upload_mb = config.max_upload_size_mb(),
        "deckhand ready"
    );

    println!("deckhand: type 'start' to begin, 'quit' to exit.");
    let user = UserId::new(cli.user);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = lines.next_line().await? {
        let line = line.trim().to_string();
        if line.is_empty() {
            continue;
        }
        if line == "quit" || line == "exit" {
            break;
        }

        match parse_line(&line).await {
            Ok(Some(event)) => match machine.handle(&user, event).await {
                Ok(reply) => render(&reply),
                Err(e) => println!("! {}", e.user_message()),
            },
            Ok(None) => print_usage(),
            Err(e) => println!("! {}", e),
        }
    }

    Ok(())
}

/// Parse one input line into a session event. `Ok(None)` means the input
/// was not understood; the state machine never sees it.
async fn parse_line(line: &str) -> Result<Option<SessionEvent>, anyhow::Error> {
    let (command, rest) = match line.split_once(' ') {
        Some((c, r)) => (c, r.trim()),
        None => (line, ""),
    };

    let event = match command {
        "start" => SessionEvent::Start,
        "help" => SessionEvent::Help,
        "upload" if rest.is_empty() => SessionEvent::UploadRequested,
        "upload" => {
            let path = PathBuf::from(rest);
            let file = tokio::fs::File::open(&path)
                .await
                .with_context(|| format!("Cannot open {}", path.display()))?;
            let declared_size = file.metadata().await?.len();
            let filename = path
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or("upload.deck")
                .to_string();
            let reader: ByteStream = Box::pin(file);
            SessionEvent::DocumentReceived {
                filename,
                declared_size,
                reader,
            }
        }
        "template" => SessionEvent::TemplateChosen {
            name: rest.to_string(),
        },
        "new" => SessionEvent::NewDeck,
        "edit" => SessionEvent::EditRequested,
        "title" => {
            let (title, subtitle) = split_payload(rest);
            SessionEvent::Edit(EditCommand::AddTitle {
                title,
                subtitle: subtitle.filter(|s| !s.is_empty()),
            })
        }
        "content" => {
            let (title, bullets) = split_payload(rest);
            let bullets = bullets
                .map(|b| {
                    b.split(';')
                        .map(|s| s.trim().to_string())
                        .filter(|s| !s.is_empty())
                        .collect()
                })
                .unwrap_or_default();
            SessionEvent::Edit(EditCommand::AddContent { title, bullets })
        }
        "image" => {
            let (title, path) = split_payload(rest);
            let Some(path) = path else {
                return Ok(None);
            };
            SessionEvent::Edit(EditCommand::AddImage {
                title,
                image_path: PathBuf::from(path),
            })
        }
        "save" => SessionEvent::SaveRequested,
        _ => return Ok(None),
    };

    Ok(Some(event))
}

/// Split an edit payload of the form `title | remainder`.
fn split_payload(rest: &str) -> (String, Option<String>) {
    match rest.split_once('|') {
        Some((title, remainder)) => (title.trim().to_string(), Some(remainder.trim().to_string())),
        None => (rest.trim().to_string(), None),
    }
}

fn render(reply: &SessionReply) {
    match reply {
        SessionReply::Menu(menu) => {
            println!("{}", menu.text);
            for option in &menu.options {
                println!("  {:<12} {}", option.command, option.label);
            }
        }
        SessionReply::Message(text) => println!("{}", text),
        SessionReply::UploadAccepted {
            filename,
            slide_count,
        } => println!(
            "Presentation \"{}\" uploaded. Slide count: {}",
            filename, slide_count
        ),
        SessionReply::DeckReady { slide_count } => {
            println!("Deck ready with {} slide(s). Type 'edit' to edit it.", slide_count)
        }
        SessionReply::SlideAdded { slide_count } => {
            println!("Slide added. The deck now has {} slide(s).", slide_count)
        }
        SessionReply::DeckSaved { path } => println!("Saved to {}", path.display()),
    }
}

fn print_usage() {
    println!(
        "Commands:\n\
         \x20 start                       show the main menu\n\
         \x20 help                        what this assistant does\n\
         \x20 upload [path]               announce or send a presentation file\n\
         \x20 template <name>             start from a catalog template\n\
         \x20 new                         start a blank deck\n\
         \x20 edit                        open the edit menu\n\
         \x20 title <title> [| subtitle]  add a title slide\n\
         \x20 content <title> [| a; b]    add a content slide with bullets\n\
         \x20 image <title> | <path>      add an image slide\n\
         \x20 save                        save the presentation\n\
         \x20 quit                        exit"
    );
}
