//! Chat session orchestration.
//!
//! A [`ChatSession`] wires the pipeline together for one thread view:
//! registration (guarded by a one-shot latch), the gated history load, and
//! per-turn streaming into the reconciler. The rendering boundary reads the
//! reconciled view through [`ChatSession::reconciler`].

use std::sync::Arc;

use serde_json::json;
use tracing::{debug, info, warn};

use crate::config::BackendConfig;
use crate::machina::{MachinaClient, MachinaError};
use crate::reconcile::{MessageReconciler, TurnError, TurnState};
use crate::stream::StreamIngestor;
use crate::traits::HttpClient;

use futures_util::StreamExt;

/// Errors surfaced by session operations.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// No thread is registered; `open` must succeed first
    #[error("Session has no registered thread")]
    NotRegistered,
    /// A turn is already in flight
    #[error(transparent)]
    Turn(#[from] TurnError),
    /// Thread registration failed
    #[error("Registration failed: {0}")]
    Registration(MachinaError),
}

/// One user's conversation with the assistant, bound to a single thread.
pub struct ChatSession<C: HttpClient + 'static> {
    client: MachinaClient<C>,
    ingestor: StreamIngestor<C>,
    reconciler: MessageReconciler,
    user_id: String,
    metadata: serde_json::Value,
    /// One-shot registration latch. The backend has no dedupe, so a session
    /// must never register twice; once set, `open` reuses the thread.
    thread_id: Option<String>,
}

impl<C: HttpClient + 'static> ChatSession<C> {
    /// Create a session over the given HTTP client and backend config.
    ///
    /// Sessions without an explicit user id get a generated anonymous one so
    /// distinct sessions stay distinguishable in store metadata.
    pub fn new(http: Arc<C>, config: BackendConfig) -> Self {
        Self {
            client: MachinaClient::new(http.clone(), config.clone()),
            ingestor: StreamIngestor::new(http, config.clone()),
            reconciler: MessageReconciler::new(config.brand),
            user_id: format!("anon-{}", uuid::Uuid::new_v4()),
            metadata: json!({}),
            thread_id: None,
        }
    }

    /// Use an explicit user id for registration metadata.
    pub fn with_user_id(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = user_id.into();
        self
    }

    /// Attach extra registration metadata.
    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = metadata;
        self
    }

    /// Register the session's thread (at most once) and load its history.
    ///
    /// Returns the thread id. On registration failure nothing else runs: no
    /// history is fetched and no stream may be opened. A failed history load
    /// is absorbed; the chat stays usable with no prior turns.
    pub async fn open(&mut self) -> Result<String, SessionError> {
        let thread_id = match &self.thread_id {
            Some(id) => id.clone(),
            None => {
                let id = self
                    .client
                    .register_thread(&self.user_id, self.metadata.clone())
                    .await
                    .map_err(SessionError::Registration)?;
                self.thread_id = Some(id.clone());
                id
            }
        };

        self.load_history_once(&thread_id).await;
        Ok(thread_id)
    }

    /// Attach to an already registered thread (deep navigation), replacing
    /// any current view. Switching ids mid-stream abandons the partial turn
    /// and discards the old view.
    pub async fn open_existing(&mut self, thread_id: &str) -> String {
        if self.thread_id.as_deref() != Some(thread_id) {
            self.reconciler.abandon_turn();
            self.reconciler.reset();
            self.thread_id = Some(thread_id.to_string());
        }

        self.load_history_once(thread_id).await;
        thread_id.to_string()
    }

    /// Submit one user turn and drive its stream to a terminal state.
    ///
    /// The user message is appended optimistically before the request goes
    /// out. Returns the turn's terminal state; a failed stream leaves an
    /// error message in place of the reply and the session accepts the next
    /// turn. Dropping the returned future cancels consumption of the open
    /// stream; call [`ChatSession::cancel_turn`] afterwards to discard the
    /// partial turn.
    pub async fn send(&mut self, user_text: &str) -> Result<TurnState, SessionError> {
        let thread_id = self
            .thread_id
            .clone()
            .ok_or(SessionError::NotRegistered)?;

        self.reconciler.begin_turn(user_text)?;

        let mut events = self.ingestor.open(&thread_id, user_text).await;
        while let Some(event) = events.next().await {
            self.reconciler.apply_event(event);
        }

        // Some backends close the stream without a terminal record; treat
        // end-of-stream as completion of whatever accumulated.
        if self.reconciler.turn_state().is_in_flight() {
            debug!(thread_id = %thread_id, "stream ended without terminal record");
            self.reconciler.apply_event(crate::stream::StreamEvent::Done);
        }

        Ok(self.reconciler.turn_state())
    }

    /// Discard a partially accumulated turn after cancelling `send`.
    pub fn cancel_turn(&mut self) {
        self.reconciler.abandon_turn();
    }

    /// The registered thread id, if registration succeeded.
    pub fn thread_id(&self) -> Option<&str> {
        self.thread_id.as_deref()
    }

    /// The reconciled view of the conversation.
    pub fn reconciler(&self) -> &MessageReconciler {
        &self.reconciler
    }

    async fn load_history_once(&mut self, thread_id: &str) {
        if !self.reconciler.needs_history(thread_id) {
            return;
        }

        match self.client.fetch_history(thread_id).await {
            Ok(raw_messages) => {
                info!(thread_id, count = raw_messages.len(), "loaded thread history");
                self.reconciler.load_history(thread_id, &raw_messages);
            }
            Err(err) => {
                // Non-fatal: the chat renders with no prior turns
                warn!(thread_id, error = %err, "history load failed, continuing without it");
                self.reconciler.load_empty(thread_id);
            }
        }
    }
}
