//! services/api/src/web/state.rs
//!
//! Defines the application's shared state and the in-memory session registry.

use crate::adapters::OpenAiChatGateway;
use crate::config::Config;
use crate::error::ApiError;
use document_assistant_core::{Assistant, DocumentLoader, ModelChoice, Session};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::info;
use uuid::Uuid;

//=========================================================================================
// AppState (Shared Across All Requests)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
pub struct AppState {
    pub config: Arc<Config>,
    pub sessions: SessionStore,
    pub loader: DocumentLoader,
    /// Empty until an API key is configured; every session route is blocked meanwhile.
    pub assistant: RwLock<Option<Assistant>>,
}

impl AppState {
    pub fn new(config: Arc<Config>, loader: DocumentLoader, assistant: Option<Assistant>) -> Self {
        Self {
            config,
            sessions: SessionStore::default(),
            loader,
            assistant: RwLock::new(assistant),
        }
    }

    /// Replaces the active credential with `api_key`, rebuilding the gateway.
    pub async fn install_api_key(&self, api_key: &str) {
        let gateway = OpenAiChatGateway::from_api_key(api_key, self.config.openai_api_base.as_deref());
        *self.assistant.write().await = Some(Assistant::new(Arc::new(gateway)));
        info!("OpenAI credential installed");
    }

    pub async fn active_assistant(&self) -> Option<Assistant> {
        self.assistant.read().await.clone()
    }
}

//=========================================================================================
// SessionStore (One Entry per User Session)
//=========================================================================================

/// Each session sits behind its own mutex, so a slow model call only blocks its own session.
#[derive(Default)]
pub struct SessionStore {
    sessions: RwLock<HashMap<Uuid, Arc<Mutex<Session>>>>,
}

impl SessionStore {
    /// Registers a fresh session and returns a handle to it.
    pub async fn create(&self, model: ModelChoice) -> Arc<Mutex<Session>> {
        let session = Session::new(model);
        let id = session.id;
        let handle = Arc::new(Mutex::new(session));
        self.sessions.write().await.insert(id, handle.clone());
        info!(session_id = %id, %model, "Session created");
        handle
    }

    pub async fn get(&self, id: Uuid) -> Result<Arc<Mutex<Session>>, ApiError> {
        self.sessions
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(ApiError::SessionNotFound(id))
    }

    pub async fn count(&self) -> usize {
        self.sessions.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn sessions_are_isolated() {
        let store = SessionStore::default();
        let a = store.create(ModelChoice::Gpt4).await;
        let b = store.create(ModelChoice::Gpt35Turbo).await;

        let (a_id, b_id) = (a.lock().await.id, b.lock().await.id);
        assert_ne!(a_id, b_id);
        a.lock().await.summary = Some("only in a".into());

        let b_again = store.get(b_id).await.unwrap();
        assert!(b_again.lock().await.summary.is_none());
        assert_eq!(store.count().await, 2);
    }

    #[tokio::test]
    async fn unknown_session_is_not_found() {
        let store = SessionStore::default();
        assert!(matches!(
            store.get(Uuid::new_v4()).await,
            Err(ApiError::SessionNotFound(_))
        ));
    }
}
