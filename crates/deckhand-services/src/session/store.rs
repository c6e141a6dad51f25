//! Session store
//!
//! The single point of truth mapping user identity to session state; the
//! only place sessions are created or destroyed. The outer map lock is held
//! only for lookup/insert/sweep, never across I/O; per-session
//! serialization comes from each session's own async mutex, so one user's
//! blocking ingest cannot stall another user's events.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use deckhand_core::models::{Session, UserId};
use deckhand_core::AppError;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

type SessionHandle = Arc<AsyncMutex<Session>>;

#[derive(Default)]
pub struct SessionStore {
    sessions: Mutex<HashMap<UserId, SessionHandle>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up the user's session, creating it in `Idle` if absent.
    pub fn get_or_create(&self, user_id: &UserId) -> SessionHandle {
        let mut sessions = self.lock_map();
        sessions
            .entry(user_id.clone())
            .or_insert_with(|| {
                tracing::debug!(user_id = %user_id, "Creating session");
                Arc::new(AsyncMutex::new(Session::new(user_id.clone())))
            })
            .clone()
    }

    /// Claim the user's session for one state transition.
    ///
    /// At most one transition per user is in flight at a time; a second
    /// concurrent event is rejected with `Busy` rather than queued, so a
    /// stale command can never apply against a deck snapshot it did not
    /// observe.
    pub fn try_begin(&self, user_id: &UserId) -> Result<OwnedMutexGuard<Session>, AppError> {
        let handle = self.get_or_create(user_id);
        handle.try_lock_owned().map_err(|_| AppError::Busy)
    }

    /// Run a closure against the user's session, waiting for any in-flight
    /// transition to finish first. Intended for inspection and small
    /// adjustments; event handling goes through
    /// [`try_begin`](Self::try_begin) so it can reject instead of queue.
    pub async fn update<F, R>(&self, user_id: &UserId, f: F) -> R
    where
        F: FnOnce(&mut Session) -> R,
    {
        let handle = self.get_or_create(user_id);
        let mut session = handle.lock().await;
        f(&mut session)
    }

    pub fn remove(&self, user_id: &UserId) -> bool {
        self.lock_map().remove(user_id).is_some()
    }

    pub fn len(&self) -> usize {
        self.lock_map().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock_map().is_empty()
    }

    /// Reclaim sessions idle longer than `older_than`.
    ///
    /// Sessions with a transition in flight are skipped regardless of
    /// their timestamp. Removing a session releases its deck ownership;
    /// durable artifacts are untouched.
    pub fn expire_idle(&self, older_than: chrono::Duration) -> usize {
        let now = chrono::Utc::now();
        let mut sessions = self.lock_map();
        let before = sessions.len();

        sessions.retain(|user_id, handle| match handle.try_lock() {
            // In flight; definitionally not idle.
            Err(_) => true,
            Ok(session) => {
                let idle = now.signed_duration_since(session.last_activity);
                if idle >= older_than {
                    tracing::info!(
                        user_id = %user_id,
                        state = %session.state,
                        idle_secs = idle.num_seconds(),
                        "Expiring idle session"
                    );
                    false
                } else {
                    true
                }
            }
        });

        before - sessions.len()
    }

    fn lock_map(&self) -> std::sync::MutexGuard<'_, HashMap<UserId, SessionHandle>> {
        // The map is only ever touched inside this module and no panic can
        // occur while the guard is held, so poisoning is unrecoverable
        // program state rather than an expected error.
        self.sessions.lock().expect("session map lock poisoned")
    }
}
