pub mod session;

use crate::catalog::Catalog;
use crate::protocol::ServerMessage;
use crate::types::SessionId;
use session::GameSession;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{broadcast, Mutex, RwLock};

/// One registered session: the game state behind its own lock, plus the
/// broadcast channel every connection in the session subscribes to.
///
/// The mutex is the per-session exclusive-access boundary: one inbound
/// action mutates the game and builds its outbound events before the next
/// is admitted. Unrelated sessions never contend.
pub struct SessionEntry {
    pub id: SessionId,
    pub game: Mutex<GameSession>,
    pub events: broadcast::Sender<ServerMessage>,
}

pub type SessionHandle = Arc<SessionEntry>;

/// Shared application state: the process-wide session registry
pub struct AppState {
    catalog: Catalog,
    sessions: RwLock<HashMap<SessionId, SessionHandle>>,
}

impl AppState {
    pub fn new() -> Self {
        Self::with_catalog(Catalog::builtin())
    }

    pub fn with_catalog(catalog: Catalog) -> Self {
        Self {
            catalog,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Create a new empty session and register it
    pub async fn create_session(&self) -> SessionHandle {
        let id = ulid::Ulid::new().to_string();
        let (events, _rx) = broadcast::channel(100);

        let entry = Arc::new(SessionEntry {
            id: id.clone(),
            game: Mutex::new(GameSession::new(id.clone(), &self.catalog)),
            events,
        });

        self.sessions.write().await.insert(id, entry.clone());
        entry
    }

    pub async fn get_session(&self, session_id: &str) -> Option<SessionHandle> {
        self.sessions.read().await.get(session_id).cloned()
    }

    /// Evict an ended session from the registry
    pub async fn remove_session(&self, session_id: &str) {
        if self.sessions.write().await.remove(session_id).is_some() {
            tracing::info!("Evicted session {}", session_id);
        }
    }

    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_and_lookup_session() {
        let state = AppState::new();
        let entry = state.create_session().await;

        let found = state.get_session(&entry.id).await;
        assert!(found.is_some());
        assert_eq!(found.unwrap().id, entry.id);
        assert_eq!(state.session_count().await, 1);
    }

    #[tokio::test]
    async fn test_lookup_unknown_session() {
        let state = AppState::new();
        assert!(state.get_session("no-such-session").await.is_none());
    }

    #[tokio::test]
    async fn test_remove_session() {
        let state = AppState::new();
        let entry = state.create_session().await;

        state.remove_session(&entry.id).await;
        assert!(state.get_session(&entry.id).await.is_none());
        assert_eq!(state.session_count().await, 0);

        // Removing twice is harmless
        state.remove_session(&entry.id).await;
    }

    #[tokio::test]
    async fn test_sessions_are_independent() {
        let state = AppState::new();
        let a = state.create_session().await;
        let b = state.create_session().await;
        assert_ne!(a.id, b.id);

        {
            let mut game = a.game.lock().await;
            game.add_player("solo".into(), true).unwrap();
        }

        let game_b = b.game.lock().await;
        assert!(game_b.players().is_empty());
    }
}
