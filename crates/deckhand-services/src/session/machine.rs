//! Session state machine
//!
//! The per-user control logic: given the session's current state and an
//! incoming event, decides the next state, which assembler or ingestion
//! operation to invoke, and which reply to emit. All recoverable failures
//! surface as typed errors and leave the session in its last well-defined
//! state; nothing here panics on a user's input.

use std::sync::Arc;

use deckhand_core::models::{Session, SessionState, UserId};
use deckhand_core::{AppError, LogLevel, ReplyMetadata};
use deckhand_slides::{assembler, package, TemplateCatalog};
use deckhand_storage::{saved_deck_key, ArtifactStore, ByteStream};

use super::events::{EditCommand, SessionEvent, SessionReply};
use super::store::SessionStore;
use crate::ingest::UploadIngestor;

pub struct SessionStateMachine {
    store: Arc<SessionStore>,
    ingestor: Arc<UploadIngestor>,
    templates: Arc<TemplateCatalog>,
    outputs: Arc<dyn ArtifactStore>,
}

impl SessionStateMachine {
    pub fn new(
        store: Arc<SessionStore>,
        ingestor: Arc<UploadIngestor>,
        templates: Arc<TemplateCatalog>,
        outputs: Arc<dyn ArtifactStore>,
    ) -> Self {
        Self {
            store,
            ingestor,
            templates,
            outputs,
        }
    }

    pub fn session_store(&self) -> &Arc<SessionStore> {
        &self.store
    }

    /// Handle one event for one user.
    ///
    /// Claims the user's session for the duration of the transition; a
    /// concurrent event for the same user fails with `Busy` before any
    /// work happens. Events for different users proceed independently.
    pub async fn handle(
        &self,
        user_id: &UserId,
        event: SessionEvent,
    ) -> Result<SessionReply, AppError> {
        let mut session = self.store.try_begin(user_id)?;
        let event_kind = event.kind();

        let result = self.dispatch(&mut session, event).await;
        session.touch();

        match &result {
            Ok(_) => {
                tracing::debug!(
                    user_id = %user_id,
                    event = event_kind,
                    state = %session.state,
                    "Event handled"
                );
            }
            Err(e) => match e.log_level() {
                LogLevel::Debug => tracing::debug!(
                    user_id = %user_id,
                    event = event_kind,
                    error = %e,
                    "Event rejected"
                ),
                LogLevel::Warn => tracing::warn!(
                    user_id = %user_id,
                    event = event_kind,
                    error = %e,
                    "Event rejected"
                ),
                LogLevel::Error => tracing::error!(
                    user_id = %user_id,
                    event = event_kind,
                    error = %e.detailed_message(),
                    "Event failed"
                ),
            },
        }

        result
    }

    async fn dispatch(
        &self,
        session: &mut Session,
        event: SessionEvent,
    ) -> Result<SessionReply, AppError> {
        // A saved session is recycled: the next event starts a fresh
        // conversation from Idle, so an upload or template choice lands in
        // DeckLoaded and a start command shows the menu again.
        if session.state == SessionState::Saved {
            session.reset();
        }

        match (session.state, event) {
            (SessionState::Idle, SessionEvent::Start) => Ok(SessionReply::main_menu()),
            (SessionState::Idle, SessionEvent::Help) => Ok(SessionReply::help()),
            (SessionState::Idle, SessionEvent::UploadRequested) => {
                session.state = SessionState::AwaitingUpload;
                Ok(SessionReply::awaiting_upload())
            }
            (
                SessionState::Idle | SessionState::AwaitingUpload,
                SessionEvent::DocumentReceived {
                    filename,
                    declared_size,
                    reader,
                },
            ) => {
                self.handle_document(session, &filename, declared_size, reader)
                    .await
            }
            (SessionState::Idle, SessionEvent::TemplateChosen { name }) => {
                self.handle_create(session, Some(&name))
            }
            (SessionState::Idle, SessionEvent::NewDeck) => self.handle_create(session, None),
            (SessionState::DeckLoaded, SessionEvent::EditRequested) => {
                session.state = SessionState::Editing;
                Ok(SessionReply::edit_menu())
            }
            (
                SessionState::DeckLoaded | SessionState::Editing,
                SessionEvent::Edit(command),
            ) => self.handle_edit(session, command),
            (SessionState::Editing, SessionEvent::SaveRequested) => {
                self.handle_save(session).await
            }
            // Everything else is an out-of-place event: report it and
            // leave the state untouched.
            (_, _) => Ok(SessionReply::invalid_command()),
        }
    }

    async fn handle_document(
        &self,
        session: &mut Session,
        filename: &str,
        declared_size: u64,
        reader: ByteStream,
    ) -> Result<SessionReply, AppError> {
        // Failures propagate before the session is touched, so the state
        // (Idle or AwaitingUpload) survives for a retry.
        let upload = self
            .ingestor
            .ingest(&session.user_id, filename, declared_size, reader)
            .await?;

        let slide_count = upload.slide_count;
        let filename = upload.artifact.declared_name.clone();

        session.source_path = Some(upload.artifact.stored_path.clone());
        session.deck = Some(upload.deck);
        session.state = SessionState::DeckLoaded;

        Ok(SessionReply::UploadAccepted {
            filename,
            slide_count,
        })
    }

    fn handle_create(
        &self,
        session: &mut Session,
        template: Option<&str>,
    ) -> Result<SessionReply, AppError> {
        let deck = assembler::create(&self.templates, template)?;
        let slide_count = deck.slide_count();

        session.deck = Some(deck);
        session.state = SessionState::DeckLoaded;

        tracing::info!(
            user_id = %session.user_id,
            template = template.unwrap_or("(blank)"),
            slide_count,
            "Deck created"
        );

        Ok(SessionReply::DeckReady { slide_count })
    }

    fn handle_edit(
        &self,
        session: &mut Session,
        command: EditCommand,
    ) -> Result<SessionReply, AppError> {
        let slide_count = {
            let deck = session.deck.as_mut().ok_or_else(|| {
                AppError::Internal("editing session is missing its deck".to_string())
            })?;

            match &command {
                EditCommand::AddTitle { title, subtitle } => {
                    assembler::add_title_slide(deck, title, subtitle.as_deref())?
                }
                EditCommand::AddContent { title, bullets } => {
                    assembler::add_content_slide(deck, title, bullets)?
                }
                EditCommand::AddImage { title, image_path } => {
                    assembler::add_image_slide(deck, title, image_path)?
                }
            }

            deck.slide_count()
        };

        session.state = SessionState::Editing;

        Ok(SessionReply::SlideAdded { slide_count })
    }

    async fn handle_save(&self, session: &mut Session) -> Result<SessionReply, AppError> {
        let bytes = {
            let deck = session.deck.as_ref().ok_or_else(|| {
                AppError::Internal("saving session is missing its deck".to_string())
            })?;
            package::serialize(deck)?
        };

        let key = saved_deck_key(&session.user_id);
        let stored = self.outputs.put(&key, bytes).await.map_err(AppError::from)?;

        session.state = SessionState::Saved;
        session.source_path = Some(stored.path.clone());

        tracing::info!(
            user_id = %session.user_id,
            path = %stored.path.display(),
            size_bytes = stored.size_bytes,
            "Deck saved"
        );

        Ok(SessionReply::DeckSaved { path: stored.path })
    }

    // Boundary calls for the chat-transport collaborator. Each is a thin
    // constructor of the corresponding event.

    pub async fn on_start(&self, user_id: &UserId) -> Result<SessionReply, AppError> {
        self.handle(user_id, SessionEvent::Start).await
    }

    pub async fn on_document_upload(
        &self,
        user_id: &UserId,
        filename: &str,
        declared_size: u64,
        reader: ByteStream,
    ) -> Result<SessionReply, AppError> {
        self.handle(
            user_id,
            SessionEvent::DocumentReceived {
                filename: filename.to_string(),
                declared_size,
                reader,
            },
        )
        .await
    }

    pub async fn on_template_choice(
        &self,
        user_id: &UserId,
        template_name: &str,
    ) -> Result<SessionReply, AppError> {
        self.handle(
            user_id,
            SessionEvent::TemplateChosen {
                name: template_name.to_string(),
            },
        )
        .await
    }

    pub async fn on_edit_command(
        &self,
        user_id: &UserId,
        command: EditCommand,
    ) -> Result<SessionReply, AppError> {
        self.handle(user_id, SessionEvent::Edit(command)).await
    }

    pub async fn on_save(&self, user_id: &UserId) -> Result<SessionReply, AppError> {
        self.handle(user_id, SessionEvent::SaveRequested).await
    }
}
