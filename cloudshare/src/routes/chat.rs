use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::json;
use share_axum::ShareAxumError;
use share_core::ShareError;
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

use crate::workflows::{ChatMessage, ChatRelay, LanguageModel};

pub const DEFAULT_MAX_SESSIONS: usize = 1000;

struct Slot {
    relay: Arc<Mutex<ChatRelay>>,
    last_used: u64,
}

#[derive(Default)]
struct SessionTable {
    slots: HashMap<String, Slot>,
    clock: u64,
}

/// Chat transcripts keyed by session id. At most `max_sessions` are kept;
/// opening one more evicts the least recently used.
pub struct ChatSessions {
    model: Arc<dyn LanguageModel>,
    system_instruction: String,
    max_sessions: usize,
    table: RwLock<SessionTable>,
}

impl ChatSessions {
    pub fn new(model: Arc<dyn LanguageModel>, system_instruction: impl Into<String>) -> Self {
        Self {
            model,
            system_instruction: system_instruction.into(),
            max_sessions: DEFAULT_MAX_SESSIONS,
            table: RwLock::new(SessionTable::default()),
        }
    }

    pub fn max_sessions(mut self, max: usize) -> Self {
        self.max_sessions = max.max(1);
        self
    }

    pub async fn len(&self) -> usize {
        self.table.read().await.slots.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    async fn find(&self, id: &str) -> Option<Arc<Mutex<ChatRelay>>> {
        self.table.read().await.slots.get(id).map(|s| Arc::clone(&s.relay))
    }

    /// The requested session when it exists, otherwise a fresh one.
    async fn open(&self, requested: Option<&str>) -> (String, Arc<Mutex<ChatRelay>>) {
        let mut table = self.table.write().await;
        table.clock += 1;
        let now = table.clock;

        if let Some(id) = requested {
            if let Some(slot) = table.slots.get_mut(id) {
                slot.last_used = now;
                return (id.to_string(), Arc::clone(&slot.relay));
            }
        }

        if table.slots.len() >= self.max_sessions {
            let oldest = table
                .slots
                .iter()
                .min_by_key(|(_, slot)| slot.last_used)
                .map(|(id, _)| id.clone());
            if let Some(oldest) = oldest {
                table.slots.remove(&oldest);
                tracing::debug!(session = %oldest, "chat session evicted");
            }
        }

        let id = Uuid::new_v4().to_string();
        let relay = Arc::new(Mutex::new(ChatRelay::new(
            Arc::clone(&self.model),
            self.system_instruction.clone(),
        )));
        table.slots.insert(
            id.clone(),
            Slot {
                relay: Arc::clone(&relay),
                last_used: now,
            },
        );
        tracing::debug!(session = %id, "chat session opened");
        (id, relay)
    }
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub session: Option<String>,
    #[serde(default)]
    pub text: String,
}

/// `session` is null when blank input arrived without a known session.
#[derive(Debug, Serialize)]
pub struct ChatTranscript {
    pub session: Option<String>,
    pub messages: Vec<ChatMessage>,
}

pub fn router(sessions: Arc<ChatSessions>) -> Router<()> {
    Router::new()
        .route("/chat", post(send))
        .route("/chat/{session}", get(transcript))
        .with_state(sessions)
}

async fn send(
    State(sessions): State<Arc<ChatSessions>>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatTranscript>, ShareAxumError> {
    let Json(req) = payload.map_err(|rejection| {
        ShareError::bad_request("Failed to parse the request body as JSON")
            .with_errors(json!({ "_schema": [rejection.body_text()] }))
    })?;

    // Blank input never opens a session.
    if req.text.trim().is_empty() {
        let known = match req.session {
            Some(id) => sessions.find(&id).await.map(|relay| (id, relay)),
            None => None,
        };
        let transcript = match known {
            Some((id, relay)) => ChatTranscript {
                session: Some(id),
                messages: relay.lock().await.messages().to_vec(),
            },
            None => ChatTranscript {
                session: None,
                messages: Vec::new(),
            },
        };
        return Ok(Json(transcript));
    }

    let (session, relay) = sessions.open(req.session.as_deref()).await;
    let mut relay = relay.lock().await;
    relay.submit(&req.text).await;

    Ok(Json(ChatTranscript {
        session: Some(session),
        messages: relay.messages().to_vec(),
    }))
}

async fn transcript(
    State(sessions): State<Arc<ChatSessions>>,
    Path(session): Path<String>,
) -> Result<Json<ChatTranscript>, ShareAxumError> {
    let Some(relay) = sessions.find(&session).await else {
        return Err(ShareError::not_found(format!("Chat session not found: {session}")).into());
    };
    let messages = relay.lock().await.messages().to_vec();
    Ok(Json(ChatTranscript {
        session: Some(session),
        messages,
    }))
}
