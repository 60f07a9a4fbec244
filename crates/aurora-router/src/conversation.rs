//! Conversation state and the stream aggregator that writes into it.
//!
//! At most one assistant turn streams at a time. Aggregators are bound to a
//! turn id, so callbacks from a dispatch whose turn has been superseded are
//! dropped instead of landing in the new turn.

use serde::Serialize;
use std::sync::Arc;
use tokio::sync::watch;

use crate::stream::TokenSink;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// Identity of a turn within one conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TurnId(u64);

/// One user prompt or one assistant response.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConversationTurn {
    #[serde(skip)]
    id: TurnId,
    role: Role,
    text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    rationale: Option<String>,
    is_streaming: bool,
}

impl ConversationTurn {
    pub fn id(&self) -> TurnId {
        self.id
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Routing rationale, rendered before an assistant answer.
    pub fn rationale(&self) -> Option<&str> {
        self.rationale.as_deref()
    }

    pub fn is_streaming(&self) -> bool {
        self.is_streaming
    }
}

/// Ordered, append-only list of turns.
#[derive(Debug, Clone, Default)]
pub struct Conversation {
    turns: Vec<ConversationTurn>,
    next_id: u64,
    streaming: Option<TurnId>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn turns(&self) -> &[ConversationTurn] {
        &self.turns
    }

    pub fn turn(&self, id: TurnId) -> Option<&ConversationTurn> {
        self.turns.iter().rev().find(|t| t.id == id)
    }

    /// The assistant turn currently receiving tokens, if any.
    pub fn streaming_turn(&self) -> Option<&ConversationTurn> {
        self.streaming.and_then(|id| self.turn(id))
    }

    pub fn push_user(&mut self, text: impl Into<String>) -> TurnId {
        self.push(Role::User, text.into(), None, false)
    }

    /// Append a finished assistant notice about turn `about`, e.g. an error.
    ///
    /// Only `about` is finalized; a newer turn that is still streaming keeps
    /// streaming.
    pub fn push_notice(
        &mut self,
        about: TurnId,
        text: impl Into<String>,
        rationale: impl Into<String>,
    ) -> TurnId {
        self.finish(about);
        self.push(Role::Assistant, text.into(), Some(rationale.into()), false)
    }

    /// Open a new streaming assistant turn, finalizing any previous one.
    pub fn begin_assistant(&mut self, rationale: impl Into<String>) -> TurnId {
        self.finish_streaming();
        let id = self.push(Role::Assistant, String::new(), Some(rationale.into()), true);
        self.streaming = Some(id);
        id
    }

    /// Append `chunk` to turn `id` if it is still the streaming turn.
    /// Returns whether anything changed.
    pub fn append(&mut self, id: TurnId, chunk: &str) -> bool {
        if self.streaming != Some(id) || chunk.is_empty() {
            return false;
        }
        match self.turns.iter_mut().rev().find(|t| t.id == id) {
            Some(turn) => {
                turn.text.push_str(chunk);
                true
            }
            None => false,
        }
    }

    /// Mark turn `id` complete. Idempotent; returns whether anything changed.
    pub fn finish(&mut self, id: TurnId) -> bool {
        if self.streaming != Some(id) {
            return false;
        }
        self.finish_streaming();
        true
    }

    fn finish_streaming(&mut self) {
        if let Some(id) = self.streaming.take() {
            if let Some(turn) = self.turns.iter_mut().rev().find(|t| t.id == id) {
                turn.is_streaming = false;
            }
        }
    }

    fn push(&mut self, role: Role, text: String, rationale: Option<String>, is_streaming: bool) -> TurnId {
        let id = TurnId(self.next_id);
        self.next_id += 1;
        self.turns.push(ConversationTurn {
            id,
            role,
            text,
            rationale,
            is_streaming,
        });
        id
    }
}

/// Conversation shared between a session and its observers.
pub type SharedConversation = Arc<watch::Sender<Conversation>>;

/// Create an empty shared conversation.
pub fn shared_conversation() -> SharedConversation {
    Arc::new(watch::Sender::new(Conversation::new()))
}

/// Accumulates one dispatch's tokens into its assistant turn and notifies
/// observers on every change.
pub struct StreamAggregator {
    state: SharedConversation,
    turn: TurnId,
}

impl StreamAggregator {
    /// Open a new streaming assistant turn carrying `rationale`.
    pub fn begin(state: SharedConversation, rationale: impl Into<String>) -> Self {
        let rationale = rationale.into();
        let mut turn = None;
        state.send_modify(|c| turn = Some(c.begin_assistant(rationale)));
        let turn = turn.unwrap_or(TurnId(u64::MAX));
        Self { state, turn }
    }

    pub fn turn_id(&self) -> TurnId {
        self.turn
    }

    /// Text accumulated so far.
    pub fn text(&self) -> String {
        self.state
            .borrow()
            .turn(self.turn)
            .map(|t| t.text.clone())
            .unwrap_or_default()
    }

    pub fn is_streaming(&self) -> bool {
        self.state
            .borrow()
            .turn(self.turn)
            .map_or(false, |t| t.is_streaming)
    }
}

impl TokenSink for StreamAggregator {
    fn on_token(&mut self, chunk: &str) {
        let turn = self.turn;
        self.state.send_if_modified(|c| c.append(turn, chunk));
    }

    fn on_complete(&mut self) {
        let turn = self.turn;
        self.state.send_if_modified(|c| c.finish(turn));
    }
}
