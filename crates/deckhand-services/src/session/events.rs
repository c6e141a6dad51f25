//! Session events and replies
//!
//! Events are a closed, exhaustively matched type: the gateway parses
//! whatever its transport delivers (commands, button presses, documents)
//! into one of these variants, and anything it cannot parse never reaches
//! the state machine. There is no string-prefix dispatch anywhere in the
//! core.

use std::path::PathBuf;

use deckhand_storage::ByteStream;

/// An edit applied to the deck of a session in the editing stage.
#[derive(Debug)]
pub enum EditCommand {
    AddTitle {
        title: String,
        subtitle: Option<String>,
    },
    AddContent {
        title: String,
        bullets: Vec<String>,
    },
    AddImage {
        title: String,
        image_path: PathBuf,
    },
}

impl EditCommand {
    pub fn kind(&self) -> &'static str {
        match self {
            EditCommand::AddTitle { .. } => "add_title",
            EditCommand::AddContent { .. } => "add_content",
            EditCommand::AddImage { .. } => "add_image",
        }
    }
}

/// One inbound event for a user's session.
pub enum SessionEvent {
    /// Conversation opener; shows the main menu.
    Start,
    Help,
    /// The user chose to upload; the next document is expected.
    UploadRequested,
    /// Start a blank deck from scratch.
    NewDeck,
    TemplateChosen {
        name: String,
    },
    DocumentReceived {
        filename: String,
        declared_size: u64,
        reader: ByteStream,
    },
    /// The user opened the edit menu.
    EditRequested,
    Edit(EditCommand),
    SaveRequested,
}

impl SessionEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            SessionEvent::Start => "start",
            SessionEvent::Help => "help",
            SessionEvent::UploadRequested => "upload_requested",
            SessionEvent::NewDeck => "new_deck",
            SessionEvent::TemplateChosen { .. } => "template_chosen",
            SessionEvent::DocumentReceived { .. } => "document_received",
            SessionEvent::EditRequested => "edit_requested",
            SessionEvent::Edit(cmd) => cmd.kind(),
            SessionEvent::SaveRequested => "save_requested",
        }
    }
}

/// One option on a rendered menu. `command` is the stable identifier the
/// gateway echoes back; `label` is what the user sees.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuOption {
    pub command: String,
    pub label: String,
}

impl MenuOption {
    pub fn new(command: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            label: label.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Menu {
    pub text: String,
    pub options: Vec<MenuOption>,
}

/// Typed reply the gateway renders back to the user.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionReply {
    Menu(Menu),
    Message(String),
    UploadAccepted {
        filename: String,
        slide_count: usize,
    },
    DeckReady {
        slide_count: usize,
    },
    SlideAdded {
        slide_count: usize,
    },
    DeckSaved {
        path: PathBuf,
    },
}

impl SessionReply {
    pub(crate) fn main_menu() -> Self {
        SessionReply::Menu(Menu {
            text: "Welcome to the presentation assistant!\n\
                   I can help you create or edit a slide deck. Choose an action:"
                .to_string(),
            options: vec![
                MenuOption::new("upload", "Upload a presentation"),
                MenuOption::new("template", "Choose a template"),
                MenuOption::new("new", "Start from scratch"),
                MenuOption::new("help", "Help"),
            ],
        })
    }

    pub(crate) fn edit_menu() -> Self {
        SessionReply::Menu(Menu {
            text: "Your deck is ready. What would you like to do?".to_string(),
            options: vec![
                MenuOption::new("add_title", "Add a title slide"),
                MenuOption::new("add_content", "Add a content slide"),
                MenuOption::new("add_image", "Add an image slide"),
                MenuOption::new("save", "Save the presentation"),
            ],
        })
    }

    pub(crate) fn help() -> Self {
        SessionReply::Message(
            "This assistant builds presentations: upload an existing deck or \
             start from a template, add title, content, or image slides, then save."
                .to_string(),
        )
    }

    pub(crate) fn awaiting_upload() -> Self {
        SessionReply::Message("Please send your presentation file.".to_string())
    }

    pub(crate) fn invalid_command() -> Self {
        SessionReply::Message(
            "That command is not available right now. Send \"start\" to see the menu.".to_string(),
        )
    }
}
