//! End-to-end session flows against a tempdir-backed core.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use deckhand_core::models::{Deck, SessionState, UserId};
use deckhand_core::AppError;
use deckhand_services::{
    EditCommand, SessionEvent, SessionReply, SessionStateMachine, SessionStore, UploadIngestor,
};
use deckhand_slides::{assembler, package, TemplateCatalog};
use deckhand_storage::{ArtifactStore, ByteStream, LocalArtifactStore};
use tempfile::{tempdir, TempDir};

struct Harness {
    machine: SessionStateMachine,
    store: Arc<SessionStore>,
    upload_root: PathBuf,
    output_root: PathBuf,
    _dirs: Vec<TempDir>,
}

const MAX_UPLOAD_BYTES: u64 = 500 * 1024 * 1024;

/// Two-slide starter deck written into the template catalog as "business".
fn business_template() -> Deck {
    let mut deck = Deck::new();
    assembler::add_title_slide(&mut deck, "Business Review", Some("FY26")).unwrap();
    assembler::add_content_slide(&mut deck, "Agenda", &[]).unwrap();
    deck
}

async fn harness() -> Harness {
    let upload_dir = tempdir().unwrap();
    let output_dir = tempdir().unwrap();
    let template_dir = tempdir().unwrap();

    let template_bytes = package::serialize(&business_template()).unwrap();
    std::fs::write(template_dir.path().join("business.deck"), template_bytes).unwrap();

    let uploads: Arc<dyn ArtifactStore> =
        Arc::new(LocalArtifactStore::new(upload_dir.path()).await.unwrap());
    let outputs: Arc<dyn ArtifactStore> =
        Arc::new(LocalArtifactStore::new(output_dir.path()).await.unwrap());
    let templates = Arc::new(TemplateCatalog::load_dir(template_dir.path()).unwrap());
    let store = Arc::new(SessionStore::new());
    let ingestor = Arc::new(UploadIngestor::new(uploads, MAX_UPLOAD_BYTES));

    Harness {
        machine: SessionStateMachine::new(store.clone(), ingestor, templates, outputs),
        store,
        upload_root: upload_dir.path().to_path_buf(),
        output_root: output_dir.path().to_path_buf(),
        _dirs: vec![upload_dir, output_dir, template_dir],
    }
}

fn stream(bytes: Vec<u8>) -> ByteStream {
    Box::pin(std::io::Cursor::new(bytes))
}

fn valid_deck_bytes(titles: &[&str]) -> Vec<u8> {
    let mut deck = Deck::new();
    for title in titles {
        assembler::add_title_slide(&mut deck, title, None).unwrap();
    }
    package::serialize(&deck).unwrap()
}

async fn state_of(harness: &Harness, user: &UserId) -> SessionState {
    let handle = harness.store.get_or_create(user);
    let session = handle.lock().await;
    session.state
}

fn write_png(dir: &Path) -> PathBuf {
    let path = dir.join("chart.png");
    let png: &[u8] = &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 1, 2, 3];
    std::fs::write(&path, png).unwrap();
    path
}

#[tokio::test]
async fn template_flow_from_start_to_save() {
    let h = harness().await;
    let user = UserId::from("alice");

    // start → menu, still idle
    let reply = h.machine.on_start(&user).await.unwrap();
    assert!(matches!(reply, SessionReply::Menu(_)));
    assert_eq!(state_of(&h, &user).await, SessionState::Idle);

    // template "business" → deck loaded with the template's slide count
    let reply = h.machine.on_template_choice(&user, "business").await.unwrap();
    assert_eq!(reply, SessionReply::DeckReady { slide_count: 2 });
    assert_eq!(state_of(&h, &user).await, SessionState::DeckLoaded);

    // content slide → count + 1, now editing
    let reply = h
        .machine
        .on_edit_command(
            &user,
            EditCommand::AddContent {
                title: "Q1 Results".to_string(),
                bullets: vec!["Revenue up 10%".to_string(), "Costs down 5%".to_string()],
            },
        )
        .await
        .unwrap();
    assert_eq!(reply, SessionReply::SlideAdded { slide_count: 3 });
    assert_eq!(state_of(&h, &user).await, SessionState::Editing);

    // save → artifact path under the output root, state saved
    let reply = h.machine.on_save(&user).await.unwrap();
    let SessionReply::DeckSaved { path } = reply else {
        panic!("expected DeckSaved");
    };
    assert!(path.starts_with(&h.output_root));
    assert_eq!(state_of(&h, &user).await, SessionState::Saved);

    // the published file round-trips with the edited content
    let saved = package::load(&std::fs::read(&path).unwrap()).unwrap();
    assert_eq!(saved.slide_count(), 3);
    assert_eq!(saved.titles(), vec!["Business Review", "Agenda", "Q1 Results"]);
}

#[tokio::test]
async fn unknown_template_reports_and_stays_idle() {
    let h = harness().await;
    let user = UserId::from("alice");

    let err = h.machine.on_template_choice(&user, "missing").await.unwrap_err();
    assert!(matches!(err, AppError::TemplateNotFound(_)));
    assert_eq!(state_of(&h, &user).await, SessionState::Idle);
}

#[tokio::test]
async fn upload_flow_loads_deck() {
    let h = harness().await;
    let user = UserId::from("bob");

    // menu choice moves the session to awaiting-upload
    let reply = h.machine.handle(&user, SessionEvent::UploadRequested).await.unwrap();
    assert!(matches!(reply, SessionReply::Message(_)));
    assert_eq!(state_of(&h, &user).await, SessionState::AwaitingUpload);

    let bytes = valid_deck_bytes(&["One", "Two", "Three"]);
    let reply = h
        .machine
        .on_document_upload(&user, "quarterly.deck", bytes.len() as u64, stream(bytes))
        .await
        .unwrap();
    assert_eq!(
        reply,
        SessionReply::UploadAccepted {
            filename: "quarterly.deck".to_string(),
            slide_count: 3,
        }
    );
    assert_eq!(state_of(&h, &user).await, SessionState::DeckLoaded);
}

#[tokio::test]
async fn oversize_upload_is_rejected_before_storing() {
    let h = harness().await;
    let user = UserId::from("bob");

    let declared = 600 * 1024 * 1024;
    let err = h
        .machine
        .on_document_upload(&user, "huge.pptx", declared, stream(vec![]))
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::PayloadTooLarge(_)));
    assert_eq!(state_of(&h, &user).await, SessionState::Idle);
    assert!(!h.upload_root.join("uploads/bob/huge.pptx").exists());
}

#[tokio::test]
async fn corrupt_upload_is_reported_and_retained() {
    let h = harness().await;
    let user = UserId::from("bob");

    let err = h
        .machine
        .on_document_upload(&user, "deck.pptx", 10, stream(b"not a deck".to_vec()))
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::CorruptDocument(_)));
    assert_eq!(state_of(&h, &user).await, SessionState::Idle);

    // the artifact stays on disk for diagnostics
    let retained = h.upload_root.join("uploads/bob/deck.pptx");
    assert_eq!(std::fs::read(retained).unwrap(), b"not a deck");
}

#[tokio::test]
async fn repeat_upload_overwrites_previous_artifact() {
    let h = harness().await;
    let user = UserId::from("bob");

    let first = valid_deck_bytes(&["Old"]);
    h.machine
        .on_document_upload(&user, "deck.pptx", first.len() as u64, stream(first))
        .await
        .unwrap();

    let second = valid_deck_bytes(&["New", "Slides"]);
    let reply = h
        .machine
        .on_document_upload(&user, "deck.pptx", second.len() as u64, stream(second.clone()))
        .await
        .unwrap();

    assert_eq!(
        reply,
        SessionReply::UploadAccepted {
            filename: "deck.pptx".to_string(),
            slide_count: 2,
        }
    );
    let stored = std::fs::read(h.upload_root.join("uploads/bob/deck.pptx")).unwrap();
    assert_eq!(stored, second);
}

#[tokio::test]
async fn empty_title_edit_leaves_deck_unchanged() {
    let h = harness().await;
    let user = UserId::from("alice");

    h.machine.on_template_choice(&user, "business").await.unwrap();

    let err = h
        .machine
        .on_edit_command(
            &user,
            EditCommand::AddTitle {
                title: "   ".to_string(),
                subtitle: None,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidInput(_)));

    // deck still has the template's two slides and the state is unchanged
    let handle = h.store.get_or_create(&user);
    let session = handle.lock().await;
    assert_eq!(session.deck.as_ref().unwrap().slide_count(), 2);
    assert_eq!(session.state, SessionState::DeckLoaded);
}

#[tokio::test]
async fn missing_image_edit_reports_resource_not_found() {
    let h = harness().await;
    let user = UserId::from("alice");

    h.machine.on_template_choice(&user, "business").await.unwrap();

    let err = h
        .machine
        .on_edit_command(
            &user,
            EditCommand::AddImage {
                title: "Chart".to_string(),
                image_path: PathBuf::from("/nonexistent/chart.png"),
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::ResourceNotFound(_)));
}

#[tokio::test]
async fn image_edit_embeds_uploaded_image() {
    let h = harness().await;
    let dir = tempdir().unwrap();
    let image_path = write_png(dir.path());
    let user = UserId::from("alice");

    h.machine.on_template_choice(&user, "business").await.unwrap();
    let reply = h
        .machine
        .on_edit_command(
            &user,
            EditCommand::AddImage {
                title: "Chart".to_string(),
                image_path,
            },
        )
        .await
        .unwrap();

    assert_eq!(reply, SessionReply::SlideAdded { slide_count: 3 });
    assert_eq!(state_of(&h, &user).await, SessionState::Editing);
}

#[tokio::test]
async fn concurrent_event_for_same_user_is_rejected_busy() {
    let h = harness().await;
    let user = UserId::from("alice");

    // Simulate an in-flight transition by holding the session claim.
    let guard = h.store.try_begin(&user).unwrap();

    let err = h.machine.on_start(&user).await.unwrap_err();
    assert!(matches!(err, AppError::Busy));

    drop(guard);
    assert!(h.machine.on_start(&user).await.is_ok());
}

#[tokio::test]
async fn different_users_proceed_independently() {
    let h = harness().await;
    let alice = UserId::from("alice");
    let bob = UserId::from("bob");

    let _guard = h.store.try_begin(&alice).unwrap();

    // Bob's whole flow works while Alice's session is claimed.
    let reply = h.machine.on_template_choice(&bob, "business").await.unwrap();
    assert_eq!(reply, SessionReply::DeckReady { slide_count: 2 });
}

#[tokio::test]
async fn saved_session_recycles_on_next_event() {
    let h = harness().await;
    let user = UserId::from("alice");

    h.machine.on_template_choice(&user, "business").await.unwrap();
    h.machine
        .on_edit_command(
            &user,
            EditCommand::AddTitle {
                title: "Closing".to_string(),
                subtitle: None,
            },
        )
        .await
        .unwrap();
    h.machine.on_save(&user).await.unwrap();
    assert_eq!(state_of(&h, &user).await, SessionState::Saved);

    // a template choice after saving starts a fresh deck
    let reply = h.machine.on_template_choice(&user, "business").await.unwrap();
    assert_eq!(reply, SessionReply::DeckReady { slide_count: 2 });
    assert_eq!(state_of(&h, &user).await, SessionState::DeckLoaded);

    // ... and a start command after saving returns to the menu
    h.machine
        .on_edit_command(
            &user,
            EditCommand::AddTitle {
                title: "Again".to_string(),
                subtitle: None,
            },
        )
        .await
        .unwrap();
    h.machine.on_save(&user).await.unwrap();
    let reply = h.machine.on_start(&user).await.unwrap();
    assert!(matches!(reply, SessionReply::Menu(_)));
    assert_eq!(state_of(&h, &user).await, SessionState::Idle);
}

#[tokio::test]
async fn out_of_place_events_leave_state_unchanged() {
    let h = harness().await;
    let user = UserId::from("alice");

    // an edit command before any deck exists
    let reply = h
        .machine
        .on_edit_command(
            &user,
            EditCommand::AddTitle {
                title: "T".to_string(),
                subtitle: None,
            },
        )
        .await
        .unwrap();
    assert!(matches!(reply, SessionReply::Message(_)));
    assert_eq!(state_of(&h, &user).await, SessionState::Idle);

    // save before any deck exists
    let reply = h.machine.on_save(&user).await.unwrap();
    assert!(matches!(reply, SessionReply::Message(_)));
    assert_eq!(state_of(&h, &user).await, SessionState::Idle);
}

#[tokio::test]
async fn saving_twice_overwrites_the_published_deck() {
    let h = harness().await;
    let user = UserId::from("alice");

    h.machine.on_template_choice(&user, "business").await.unwrap();
    h.machine
        .on_edit_command(
            &user,
            EditCommand::AddContent {
                title: "First pass".to_string(),
                bullets: vec![],
            },
        )
        .await
        .unwrap();
    let SessionReply::DeckSaved { path: first_path } = h.machine.on_save(&user).await.unwrap()
    else {
        panic!("expected DeckSaved");
    };

    // recycle, build a different deck, save again
    h.machine.on_template_choice(&user, "business").await.unwrap();
    h.machine
        .on_edit_command(
            &user,
            EditCommand::AddContent {
                title: "Second pass".to_string(),
                bullets: vec![],
            },
        )
        .await
        .unwrap();
    let SessionReply::DeckSaved { path: second_path } = h.machine.on_save(&user).await.unwrap()
    else {
        panic!("expected DeckSaved");
    };

    assert_eq!(first_path, second_path);
    let saved = package::load(&std::fs::read(&second_path).unwrap()).unwrap();
    assert!(saved.titles().contains(&"Second pass"));
    assert!(!saved.titles().contains(&"First pass"));
}
