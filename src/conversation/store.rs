//! In-memory conversation store
//!
//! Process-local source of truth for conversation state: bounded message
//! history per conversation (trimmed from the front) and a bounded live
//! conversation count (bulk eviction of the least-recently-updated half).
//! Constructor-injected, interior mutability behind one mutex.

use super::context::{classify, ConversationContext};
use crate::provider::MessageRole;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use thiserror::Error;
use uuid::Uuid;

pub const DEFAULT_MAX_CONVERSATIONS: usize = 1000;
pub const DEFAULT_MAX_MESSAGES: usize = 50;

/// A single chat turn, immutable once appended
#[derive(Debug, Clone, Serialize)]
pub struct Message {
    pub id: String,
    pub role: MessageRole,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone)]
struct Conversation {
    messages: Vec<Message>,
    context: ConversationContext,
    #[allow(dead_code)] // Kept for parity with updated_at; not read yet
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    /// Monotonic update counter; breaks wall-clock ties during eviction
    touch_seq: u64,
}

impl Conversation {
    fn new(now: DateTime<Utc>, touch_seq: u64) -> Self {
        Self {
            messages: Vec::new(),
            context: ConversationContext::default(),
            created_at: now,
            updated_at: now,
            touch_seq,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("Conversation not found: {0}")]
    NotFound(String),
}

/// Bounded in-memory conversation store
pub struct ConversationStore {
    conversations: Mutex<HashMap<String, Conversation>>,
    seq: AtomicU64,
    max_conversations: usize,
    max_messages: usize,
}

impl Default for ConversationStore {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_CONVERSATIONS, DEFAULT_MAX_MESSAGES)
    }
}

impl ConversationStore {
    pub fn new(max_conversations: usize, max_messages: usize) -> Self {
        Self {
            conversations: Mutex::new(HashMap::new()),
            seq: AtomicU64::new(0),
            max_conversations: max_conversations.max(2),
            max_messages: max_messages.max(1),
        }
    }

    /// Create a fresh conversation and return its id
    pub fn create(&self) -> String {
        let id = Uuid::new_v4().to_string();
        self.insert(id.clone());
        id
    }

    /// Resolve a caller-supplied id: an existing id is kept, an unknown one
    /// is created under that id (client-side continuity), `None` gets a
    /// fresh id.
    pub fn ensure(&self, id: Option<&str>) -> String {
        match id {
            Some(id) if !id.is_empty() => {
                self.insert_if_absent(id);
                id.to_string()
            }
            _ => self.create(),
        }
    }

    /// Append a message. User messages re-derive the conversation context.
    /// The one hard invariant: the conversation must exist.
    pub fn add_message(
        &self,
        id: &str,
        role: MessageRole,
        content: impl Into<String>,
    ) -> Result<Message, StoreError> {
        let content = content.into();
        let now = Utc::now();
        let message = Message {
            id: Uuid::new_v4().to_string(),
            role,
            content,
            timestamp: now,
        };

        let mut conversations = self.lock();
        let conversation = conversations
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;

        if role == MessageRole::User {
            conversation.context.apply(&classify(&message.content));
        }

        conversation.messages.push(message.clone());
        if conversation.messages.len() > self.max_messages {
            let excess = conversation.messages.len() - self.max_messages;
            conversation.messages.drain(..excess);
        }
        conversation.updated_at = now;
        conversation.touch_seq = self.next_seq();

        Ok(message)
    }

    /// Last `limit` messages, oldest first
    pub fn messages(&self, id: &str, limit: usize) -> Vec<Message> {
        let conversations = self.lock();
        conversations
            .get(id)
            .map(|c| {
                let skip = c.messages.len().saturating_sub(limit);
                c.messages[skip..].to_vec()
            })
            .unwrap_or_default()
    }

    pub fn context(&self, id: &str) -> Option<ConversationContext> {
        self.lock().get(id).map(|c| c.context.clone())
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    #[cfg(test)]
    pub fn contains(&self, id: &str) -> bool {
        self.lock().contains_key(id)
    }

    fn insert(&self, id: String) {
        let mut conversations = self.lock();
        conversations.insert(id, Conversation::new(Utc::now(), self.next_seq()));
        Self::evict_if_over_capacity(&mut conversations, self.max_conversations);
    }

    fn insert_if_absent(&self, id: &str) {
        let mut conversations = self.lock();
        if conversations.contains_key(id) {
            return;
        }
        conversations.insert(id.to_string(), Conversation::new(Utc::now(), self.next_seq()));
        Self::evict_if_over_capacity(&mut conversations, self.max_conversations);
    }

    /// Bulk sweep: over capacity, keep the most-recently-updated half
    fn evict_if_over_capacity(
        conversations: &mut HashMap<String, Conversation>,
        max_conversations: usize,
    ) {
        if conversations.len() > max_conversations {
            let keep = max_conversations / 2;
            let mut by_recency: Vec<(String, DateTime<Utc>, u64)> = conversations
                .iter()
                .map(|(id, c)| (id.clone(), c.updated_at, c.touch_seq))
                .collect();
            by_recency.sort_by(|a, b| (b.1, b.2).cmp(&(a.1, a.2)));
            let evicted = by_recency.split_off(keep);
            for (id, _, _) in &evicted {
                conversations.remove(id);
            }
            tracing::info!(
                evicted = evicted.len(),
                retained = conversations.len(),
                "conversation store over capacity, evicted least-recently-updated half"
            );
        }
    }

    fn next_seq(&self) -> u64 {
        self.seq.fetch_add(1, Ordering::Relaxed)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Conversation>> {
        self.conversations
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}
