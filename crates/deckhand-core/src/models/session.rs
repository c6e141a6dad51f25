//! Per-user session state

use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::deck::Deck;

/// Opaque stable identifier of a requester.
///
/// Chat platforms hand out their own id formats (numeric, handles, ...);
/// the core treats them as opaque strings. Storage keys derived from a
/// `UserId` are sanitized before touching the filesystem.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for UserId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for UserId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Assembly stage a session is in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionState {
    Idle,
    AwaitingUpload,
    DeckLoaded,
    Editing,
    Saved,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Idle => "idle",
            SessionState::AwaitingUpload => "awaiting_upload",
            SessionState::DeckLoaded => "deck_loaded",
            SessionState::Editing => "editing",
            SessionState::Saved => "saved",
        };
        write!(f, "{}", name)
    }
}

/// One per user identity. Exclusively owns the in-progress deck.
///
/// Invariant: any state other than `Idle`/`AwaitingUpload` implies
/// `deck.is_some()`. The session store serializes all mutations, so a
/// session is never observed half-updated.
#[derive(Debug, Clone)]
pub struct Session {
    pub user_id: UserId,
    pub state: SessionState,
    pub deck: Option<Deck>,
    /// Last durably stored artifact for this user, if any.
    pub source_path: Option<PathBuf>,
    pub last_activity: DateTime<Utc>,
}

impl Session {
    pub fn new(user_id: UserId) -> Self {
        Self {
            user_id,
            state: SessionState::Idle,
            deck: None,
            source_path: None,
            last_activity: Utc::now(),
        }
    }

    /// Record activity; drives idle expiry.
    pub fn touch(&mut self) {
        self.last_activity = Utc::now();
    }

    /// Release the deck and return to the initial state. Used when a saved
    /// session is recycled and when a session is reclaimed.
    pub fn reset(&mut self) {
        self.state = SessionState::Idle;
        self.deck = None;
    }

    pub fn has_deck(&self) -> bool {
        self.deck.is_some()
    }

    pub fn idle_for(&self) -> chrono::Duration {
        Utc::now().signed_duration_since(self.last_activity)
    }
}
