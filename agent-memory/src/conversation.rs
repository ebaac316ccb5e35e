//! Conversation storage keyed by conversation id.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

use agent_primitives::ConversationId;
use async_trait::async_trait;
use tracing::debug;

use crate::message::ChatMessage;

/// Storage for ordered, append-only conversations.
///
/// Implementations never fail: reading an unknown conversation yields an
/// empty history and clearing one is a no-op.
#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// Appends `message` to the conversation, creating it on first use.
    async fn append(&self, id: &ConversationId, message: ChatMessage);

    /// Returns a snapshot of the conversation's messages in append order.
    async fn get(&self, id: &ConversationId) -> Vec<ChatMessage>;

    /// Drops the conversation.
    async fn clear(&self, id: &ConversationId);

    /// Returns a snapshot of every conversation.
    async fn list_all(&self) -> HashMap<ConversationId, Vec<ChatMessage>>;

    /// Returns the number of conversations.
    async fn len(&self) -> usize;

    /// Returns `true` when no conversation is stored.
    async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Returns the number of messages in a conversation.
    async fn message_count(&self, id: &ConversationId) -> usize {
        self.get(id).await.len()
    }
}

#[derive(Debug, Default)]
struct Conversation {
    messages: Vec<ChatMessage>,
    // Set when the conversation was cleared while an appender held its handle.
    closed: bool,
}

type Slot = Arc<Mutex<Conversation>>;

/// Process-local [`ConversationStore`].
///
/// Each conversation has its own lock, so appends to different conversations
/// never contend and concurrent appends to one conversation are never lost.
#[derive(Debug, Default)]
pub struct InMemoryConversationStore {
    conversations: RwLock<HashMap<ConversationId, Slot>>,
}

impl InMemoryConversationStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, id: &ConversationId) -> Option<Slot> {
        self.conversations
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned()
    }

    fn slot_or_insert(&self, id: &ConversationId) -> Slot {
        if let Some(slot) = self.slot(id) {
            return slot;
        }

        let mut conversations = self
            .conversations
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        Arc::clone(conversations.entry(id.clone()).or_insert_with(|| {
            debug!(conversation_id = %id, "conversation created");
            Slot::default()
        }))
    }

    fn snapshot(slot: &Slot) -> Option<Vec<ChatMessage>> {
        let conversation = lock(slot);
        (!conversation.closed).then(|| conversation.messages.clone())
    }
}

#[async_trait]
impl ConversationStore for InMemoryConversationStore {
    async fn append(&self, id: &ConversationId, message: ChatMessage) {
        loop {
            let slot = self.slot_or_insert(id);
            let mut conversation = lock(&slot);
            // A concurrent clear detached this slot; retry against a fresh one.
            if conversation.closed {
                continue;
            }
            conversation.messages.push(message);
            return;
        }
    }

    async fn get(&self, id: &ConversationId) -> Vec<ChatMessage> {
        self.slot(id)
            .and_then(|slot| Self::snapshot(&slot))
            .unwrap_or_default()
    }

    async fn clear(&self, id: &ConversationId) {
        let removed = self
            .conversations
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(id);

        if let Some(slot) = removed {
            lock(&slot).closed = true;
            debug!(conversation_id = %id, "conversation cleared");
        }
    }

    async fn list_all(&self) -> HashMap<ConversationId, Vec<ChatMessage>> {
        let slots: Vec<(ConversationId, Slot)> = self
            .conversations
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(id, slot)| (id.clone(), Arc::clone(slot)))
            .collect();

        slots
            .into_iter()
            .filter_map(|(id, slot)| Self::snapshot(&slot).map(|messages| (id, messages)))
            .collect()
    }

    async fn len(&self) -> usize {
        self.conversations
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    async fn message_count(&self, id: &ConversationId) -> usize {
        self.slot(id).map_or(0, |slot| {
            let conversation = lock(&slot);
            if conversation.closed {
                0
            } else {
                conversation.messages.len()
            }
        })
    }
}

fn lock(slot: &Slot) -> MutexGuard<'_, Conversation> {
    slot.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::MessageRole;

    fn id(value: &str) -> ConversationId {
        ConversationId::new(value).unwrap()
    }

    #[tokio::test]
    async fn unknown_conversation_is_empty() {
        let store = InMemoryConversationStore::new();
        assert!(store.get(&id("missing")).await.is_empty());
        assert_eq!(store.message_count(&id("missing")).await, 0);
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn append_preserves_order() {
        let store = InMemoryConversationStore::new();
        let conv = id("c1");
        store.append(&conv, ChatMessage::user("hello")).await;
        store.append(&conv, ChatMessage::assistant("hi there")).await;

        let messages = store.get(&conv).await;
        let roles: Vec<_> = messages.iter().map(ChatMessage::role).collect();
        assert_eq!(roles, [MessageRole::User, MessageRole::Assistant]);
        assert_eq!(messages[1].content(), "hi there");
    }

    #[tokio::test]
    async fn clear_is_idempotent() {
        let store = InMemoryConversationStore::new();
        let conv = id("c1");
        store.clear(&conv).await;

        store.append(&conv, ChatMessage::user("hello")).await;
        store.clear(&conv).await;
        store.clear(&conv).await;
        assert!(store.get(&conv).await.is_empty());
        assert_eq!(store.len().await, 0);

        store.append(&conv, ChatMessage::user("again")).await;
        assert_eq!(store.message_count(&conv).await, 1);
    }

    #[tokio::test]
    async fn list_all_is_a_snapshot() {
        let store = InMemoryConversationStore::new();
        store.append(&id("a"), ChatMessage::user("one")).await;
        store.append(&id("b"), ChatMessage::user("two")).await;

        let snapshot = store.list_all().await;
        store.append(&id("a"), ChatMessage::user("three")).await;

        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot[&id("a")].len(), 1);
        assert_eq!(store.message_count(&id("a")).await, 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_appends_are_not_lost() {
        let store = Arc::new(InMemoryConversationStore::new());
        let conv = id("busy");

        let handles: Vec<_> = (0..200)
            .map(|n| {
                let store = Arc::clone(&store);
                let conv = conv.clone();
                tokio::spawn(async move {
                    store.append(&conv, ChatMessage::user(format!("m{n}"))).await;
                })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(store.message_count(&conv).await, 200);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn appends_racing_clear_land_in_a_live_conversation() {
        let store = Arc::new(InMemoryConversationStore::new());
        let conv = id("racy");

        let appenders: Vec<_> = (0..100)
            .map(|n| {
                let store = Arc::clone(&store);
                let conv = conv.clone();
                tokio::spawn(async move {
                    store.append(&conv, ChatMessage::user(format!("m{n}"))).await;
                })
            })
            .collect();
        let clearer = {
            let store = Arc::clone(&store);
            let conv = conv.clone();
            tokio::spawn(async move { store.clear(&conv).await })
        };

        for handle in appenders {
            handle.await.unwrap();
        }
        clearer.await.unwrap();

        // Every append either preceded the clear or landed after it.
        assert!(store.message_count(&conv).await <= 100);
        store.append(&conv, ChatMessage::user("after")).await;
        let last = store.get(&conv).await.pop().unwrap();
        assert_eq!(last.content(), "after");
    }
}
