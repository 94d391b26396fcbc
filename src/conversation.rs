//! Conversation state: bounded in-memory store and context classification

mod context;
#[cfg(test)]
mod proptests;
mod store;

#[allow(unused_imports)] // Public API re-exports
pub use context::{
    classify, CircuitType, ContextSignals, ConversationContext, ConversationType, Phase,
    UserExpertise,
};
#[allow(unused_imports)] // Public API re-exports
pub use store::{
    ConversationStore, Message, StoreError, DEFAULT_MAX_CONVERSATIONS, DEFAULT_MAX_MESSAGES,
};
