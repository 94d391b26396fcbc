//! Property tests for the store's capacity invariants

use super::store::ConversationStore;
use crate::provider::MessageRole;
use proptest::prelude::*;

proptest! {
    /// The per-conversation history never exceeds the cap and always keeps
    /// the most recently added messages.
    #[test]
    fn message_history_bounded_and_suffix_preserved(
        cap in 1usize..20,
        contents in prop::collection::vec("[a-z]{1,8}", 1..60),
    ) {
        let store = ConversationStore::new(10, cap);
        let id = store.create();
        for content in &contents {
            store.add_message(&id, MessageRole::Assistant, content.clone()).unwrap();
        }

        let stored = store.messages(&id, usize::MAX);
        prop_assert!(stored.len() <= cap);
        prop_assert_eq!(stored.len(), contents.len().min(cap));

        let expected_tail = &contents[contents.len() - stored.len()..];
        for (message, expected) in stored.iter().zip(expected_tail) {
            prop_assert_eq!(&message.content, expected);
        }
    }

    /// The store never holds more than its configured conversation cap,
    /// however many conversations are created.
    #[test]
    fn conversation_count_bounded(
        cap in 2usize..30,
        creates in 1usize..100,
    ) {
        let store = ConversationStore::new(cap, 10);
        let mut last = String::new();
        for _ in 0..creates {
            last = store.create();
        }
        prop_assert!(store.len() <= cap);
        // The just-created conversation always survives its own eviction sweep
        prop_assert!(store.contains(&last));
    }
}
