//! Message reconciliation.
//!
//! Merges two sources into one ordered view of a thread: the persisted
//! history snapshot (loaded once per thread id) and the live event stream of
//! the current user turn. The reconciler owns the view messages and the
//! side-channel index; the rendering boundary reads both by reference.
//!
//! Two named state machines replace the flag-based latches of typical
//! front-end implementations:
//!
//! - [`LoadState`]: a history fetch already served for a thread id is never
//!   re-issued; re-opening the same id is a no-op.
//! - [`TurnState`]: `Idle -> Requesting -> Streaming -> Completed | Failed`
//!   per user turn. `Objects`/`Suggestions` events do not leave `Streaming`;
//!   the terminal states end the turn and the next turn starts fresh.

use tracing::{debug, warn};

use crate::brand::Brand;
use crate::links::resolve_betting_links;
use crate::models::{Message, MessageRole, RawMessage};
use crate::sidechannel::SideChannelIndex;
use crate::stream::StreamEvent;

/// History load latch, keyed by thread id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadState {
    /// No history has been loaded into this view
    NotLoaded,
    /// History for the given thread id is loaded (possibly empty)
    Ready { thread_id: String },
}

/// Per-turn streaming state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnState {
    /// No turn in flight
    Idle,
    /// Turn submitted, no token received yet
    Requesting,
    /// Tokens are accumulating
    Streaming,
    /// Last turn ended with `Done`
    Completed,
    /// Last turn ended with `Error`
    Failed,
}

impl TurnState {
    /// Whether a turn is currently consuming a stream.
    pub fn is_in_flight(&self) -> bool {
        matches!(self, TurnState::Requesting | TurnState::Streaming)
    }
}

/// Error returned when a turn cannot be started.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TurnError {
    #[error("A turn is already in flight; wait for it to complete")]
    TurnInFlight,
}

/// Reconciles history and live stream events into one ordered message view.
#[derive(Debug)]
pub struct MessageReconciler {
    brand: Brand,
    load_state: LoadState,
    turn_state: TurnState,
    messages: Vec<Message>,
    side_channel: SideChannelIndex,
    /// Next stable message key; never reused within a view
    next_key: u64,
    /// Keys of the active turn's optimistic user message and placeholder
    active_turn: Option<(u64, u64)>,
}

impl MessageReconciler {
    /// Create an empty reconciler for a brand.
    pub fn new(brand: Brand) -> Self {
        Self {
            brand,
            load_state: LoadState::NotLoaded,
            turn_state: TurnState::Idle,
            messages: Vec::new(),
            side_channel: SideChannelIndex::new(),
            next_key: 0,
            active_turn: None,
        }
    }

    /// Whether a history fetch is needed for this thread id.
    ///
    /// False once a load (successful or absorbed-failed) completed for the
    /// same id, making duplicate open effects no-ops.
    pub fn needs_history(&self, thread_id: &str) -> bool {
        !matches!(&self.load_state, LoadState::Ready { thread_id: loaded } if loaded == thread_id)
    }

    /// Seed the view from a history snapshot.
    ///
    /// Messages with roles outside the user/assistant model are skipped.
    /// Link tokens are resolved before the text enters the view. If a turn
    /// raced the load (submitted while history was in flight), its optimistic
    /// user message and streaming placeholder are preserved after the
    /// seeded history.
    ///
    /// A second load for the id already marked ready is a no-op.
    pub fn load_history(&mut self, thread_id: &str, raw_messages: &[RawMessage]) {
        if !self.needs_history(thread_id) {
            debug!(thread_id, "history already loaded, skipping");
            return;
        }

        // Preserve in-flight turn messages (and their live payloads) across
        // the seed
        let mut in_flight: Vec<Message> = Vec::new();
        let mut live_payloads = None;
        if let Some((user_key, assistant_key)) = self.active_turn {
            in_flight = self
                .messages
                .iter()
                .filter(|m| m.key == user_key || m.key == assistant_key)
                .cloned()
                .collect();
            live_payloads = Some((
                assistant_key,
                self.side_channel.objects(assistant_key).to_vec(),
                self.side_channel.suggestions(assistant_key).to_vec(),
            ));
        }

        self.messages.clear();

        let mut keyed: Vec<(u64, &RawMessage)> = Vec::new();
        for raw in raw_messages {
            let Some(role) = raw.role() else {
                debug!(role = %raw.role, "skipping history message with unmodeled role");
                continue;
            };
            let key = self.allocate_key();
            let text = resolve_betting_links(&raw.display_text(), self.brand);
            self.messages.push(Message::finalized(key, role, text));
            keyed.push((key, raw));
        }

        self.side_channel.rebuild(keyed);
        if let Some((assistant_key, objects, suggestions)) = live_payloads {
            self.side_channel.attach_objects(assistant_key, objects);
            self.side_channel.attach_suggestions(assistant_key, suggestions);
        }
        self.messages.extend(in_flight);
        self.load_state = LoadState::Ready {
            thread_id: thread_id.to_string(),
        };
    }

    /// Record a failed history load.
    ///
    /// Non-fatal: the view stays usable with no prior turns, and the latch is
    /// set so the fetch is not re-issued for this id.
    pub fn load_empty(&mut self, thread_id: &str) {
        self.load_history(thread_id, &[]);
    }

    /// Start a user turn: append the user message immediately (before any
    /// network round-trip) plus a streaming assistant placeholder.
    ///
    /// Returns the placeholder's stable key. Fails while another turn is in
    /// flight; turns are strictly sequential.
    pub fn begin_turn(&mut self, user_text: &str) -> Result<u64, TurnError> {
        if self.turn_state.is_in_flight() {
            return Err(TurnError::TurnInFlight);
        }

        let user_key = self.allocate_key();
        let text = resolve_betting_links(user_text, self.brand);
        self.messages
            .push(Message::finalized(user_key, MessageRole::User, text));

        let assistant_key = self.allocate_key();
        self.messages
            .push(Message::streaming_placeholder(assistant_key));

        self.active_turn = Some((user_key, assistant_key));
        self.turn_state = TurnState::Requesting;
        Ok(assistant_key)
    }

    /// Apply one stream event to the active turn.
    ///
    /// Events arriving without an active turn, or after the turn reached a
    /// terminal state, are ignored.
    pub fn apply_event(&mut self, event: StreamEvent) {
        if !self.turn_state.is_in_flight() {
            debug!(
                event = event.event_type_name(),
                "ignoring event outside an active turn"
            );
            return;
        }
        let Some((_, assistant_key)) = self.active_turn else {
            warn!("turn state in flight without an active placeholder");
            self.turn_state = TurnState::Idle;
            return;
        };

        match event {
            StreamEvent::Token { text } => {
                if text.is_empty() {
                    return;
                }
                if let Some(msg) = self.message_mut(assistant_key) {
                    msg.append_token(&text);
                }
                self.turn_state = TurnState::Streaming;
            }
            StreamEvent::Objects { payload } => {
                self.side_channel.attach_objects(assistant_key, payload);
            }
            StreamEvent::Suggestions { payload } => {
                self.side_channel.attach_suggestions(assistant_key, payload);
            }
            StreamEvent::Done => {
                let brand = self.brand;
                if let Some(msg) = self.message_mut(assistant_key) {
                    let text = resolve_betting_links(&msg.partial_content, brand);
                    msg.finalize_with(text);
                }
                self.active_turn = None;
                self.turn_state = TurnState::Completed;
            }
            StreamEvent::Error { message } => {
                if let Some(msg) = self.message_mut(assistant_key) {
                    msg.finalize_with(format!("Error: {}", message));
                }
                self.active_turn = None;
                self.turn_state = TurnState::Failed;
            }
        }
    }

    /// Abandon the active turn (navigation away, stream dropped).
    ///
    /// The optimistic user message and the partially accumulated placeholder
    /// are discarded; nothing of the turn is kept locally.
    pub fn abandon_turn(&mut self) {
        if let Some((user_key, assistant_key)) = self.active_turn.take() {
            self.messages
                .retain(|m| m.key != user_key && m.key != assistant_key);
            self.side_channel.remove(assistant_key);
        }
        if self.turn_state.is_in_flight() {
            self.turn_state = TurnState::Idle;
        }
    }

    /// Discard the whole view (thread switch or unmount).
    pub fn reset(&mut self) {
        self.messages.clear();
        self.side_channel.clear();
        self.load_state = LoadState::NotLoaded;
        self.turn_state = TurnState::Idle;
        self.active_turn = None;
    }

    /// The reconciled, ordered message view.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Side-channel payloads, keyed by message key.
    pub fn side_channel(&self) -> &SideChannelIndex {
        &self.side_channel
    }

    /// Display text for a message: finalized content, or the link-resolved
    /// partial text while streaming.
    pub fn display_text(&self, message: &Message) -> String {
        if message.is_streaming {
            resolve_betting_links(&message.partial_content, self.brand)
        } else {
            message.content.clone()
        }
    }

    /// Current turn state.
    pub fn turn_state(&self) -> TurnState {
        self.turn_state
    }

    /// Current load state.
    pub fn load_state(&self) -> &LoadState {
        &self.load_state
    }

    fn allocate_key(&mut self) -> u64 {
        let key = self.next_key;
        self.next_key += 1;
        key
    }

    fn message_mut(&mut self, key: u64) -> Option<&mut Message> {
        self.messages.iter_mut().find(|m| m.key == key)
    }
}
