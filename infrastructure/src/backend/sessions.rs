//! Session store adapters
//!
//! - [`HttpSessionGateway`]: the backend's CRUD endpoints under `/api/sessions`
//! - [`InMemorySessionGateway`]: process-local store for offline use and tests

use super::client::BackendClient;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use nurture_application::{PersistenceError, SessionGateway};
use nurture_domain::{Message, Session, SessionId};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::{debug, info};
use uuid::Uuid;

const SESSIONS_PATH: &str = "/api/sessions";

#[derive(Serialize)]
struct CreateSessionBody<'a> {
    title: &'a str,
    user_id: &'a str,
    messages: &'a [Message],
}

#[derive(Serialize)]
struct UpdateSessionBody<'a> {
    messages: &'a [Message],
}

/// Session as returned by the store. Only `id` is required.
#[derive(Deserialize)]
struct SessionRecord {
    id: String,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    messages: Option<Vec<Message>>,
    #[serde(default)]
    updated_at: Option<DateTime<Utc>>,
}

impl SessionRecord {
    fn into_session(
        self,
        fallback_title: &str,
        fallback_messages: &[Message],
    ) -> Result<Session, PersistenceError> {
        let id = SessionId::new(self.id)
            .map_err(|e| PersistenceError::InvalidData(e.to_string()))?;
        let mut session = Session::new(
            id,
            self.title.unwrap_or_else(|| fallback_title.to_string()),
            self.messages
                .unwrap_or_else(|| fallback_messages.to_vec()),
        );
        if let Some(updated_at) = self.updated_at {
            session.updated_at = updated_at;
        }
        Ok(session)
    }
}

/// [`SessionGateway`] backed by the backend's session endpoints
pub struct HttpSessionGateway {
    client: BackendClient,
    user_id: String,
}

impl HttpSessionGateway {
    pub fn new(client: BackendClient, user_id: impl Into<String>) -> Self {
        Self {
            client,
            user_id: user_id.into(),
        }
    }

    fn session_url(&self, id: &SessionId) -> Result<Url, PersistenceError> {
        Ok(self.client.segment_url(SESSIONS_PATH, id.as_str())?)
    }
}

#[async_trait]
impl SessionGateway for HttpSessionGateway {
    async fn create_session(
        &self,
        title: &str,
        messages: &[Message],
    ) -> Result<Session, PersistenceError> {
        let body = CreateSessionBody {
            title,
            user_id: &self.user_id,
            messages,
        };
        let record: SessionRecord = self.client.post_json(SESSIONS_PATH, &body).await?;
        let session = record.into_session(title, messages)?;
        info!("Session created: {}", session.id);
        Ok(session)
    }

    async fn update_session(
        &self,
        id: &SessionId,
        messages: &[Message],
    ) -> Result<(), PersistenceError> {
        self.client
            .put_json_at(self.session_url(id)?, &UpdateSessionBody { messages })
            .await?;
        debug!("Session {} updated ({} messages)", id, messages.len());
        Ok(())
    }

    async fn load_session(&self, id: &SessionId) -> Result<Session, PersistenceError> {
        let record: SessionRecord = self.client.get_json_at(self.session_url(id)?).await?;
        record.into_session("", &[])
    }
}

/// In-process session store
#[derive(Default)]
pub struct InMemorySessionGateway {
    sessions: Mutex<HashMap<SessionId, Session>>,
}

impl InMemorySessionGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.sessions.lock().map(|s| s.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All sessions, most recently updated first.
    pub fn list(&self) -> Vec<Session> {
        let mut sessions: Vec<Session> = self
            .sessions
            .lock()
            .map(|s| s.values().cloned().collect())
            .unwrap_or_default();
        sessions.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        sessions
    }

    fn poisoned() -> PersistenceError {
        PersistenceError::Unavailable("session store lock poisoned".to_string())
    }
}

#[async_trait]
impl SessionGateway for InMemorySessionGateway {
    async fn create_session(
        &self,
        title: &str,
        messages: &[Message],
    ) -> Result<Session, PersistenceError> {
        let id = SessionId::new(Uuid::new_v4().to_string())
            .map_err(|e| PersistenceError::InvalidData(e.to_string()))?;
        let session = Session::new(id.clone(), title, messages.to_vec());
        self.sessions
            .lock()
            .map_err(|_| Self::poisoned())?
            .insert(id, session.clone());
        Ok(session)
    }

    async fn update_session(
        &self,
        id: &SessionId,
        messages: &[Message],
    ) -> Result<(), PersistenceError> {
        let mut sessions = self.sessions.lock().map_err(|_| Self::poisoned())?;
        let session = sessions
            .get_mut(id)
            .ok_or_else(|| PersistenceError::NotFound(id.to_string()))?;
        session.messages = messages.to_vec();
        session.updated_at = Utc::now();
        Ok(())
    }

    async fn load_session(&self, id: &SessionId) -> Result<Session, PersistenceError> {
        self.sessions
            .lock()
            .map_err(|_| Self::poisoned())?
            .get(id)
            .cloned()
            .ok_or_else(|| PersistenceError::NotFound(id.to_string()))
    }
}
