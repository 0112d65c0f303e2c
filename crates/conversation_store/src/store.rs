use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use log::warn;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::error::ConversationStoreError;
use crate::paths::{conversations_file, current_pointer_file};
use crate::schema::{Conversation, MessageDraft, StoredMessage};

/// File-backed conversation store rooted at a single directory.
///
/// Two records live under the root: the full conversation collection and the
/// current-conversation pointer, each read and rewritten wholesale per
/// access. Concurrent writers are not coordinated; last write wins.
pub struct ConversationStore {
    root: PathBuf,
}

impl ConversationStore {
    /// Opens a store rooted at `root`, creating the directory when missing.
    ///
    /// Directory creation is best-effort; a failure here surfaces later as
    /// logged write failures rather than an unusable store.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        if let Err(error) = fs::create_dir_all(&root) {
            warn!(
                "failed to create conversation store root {}: {error}",
                root.display()
            );
        }

        Self { root }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns every persisted conversation in stored order.
    ///
    /// Missing or unreadable data is treated as an empty collection.
    #[must_use]
    pub fn list_all(&self) -> Vec<Conversation> {
        match self.read_collection() {
            Ok(conversations) => conversations,
            Err(error) => {
                warn!("reading conversation collection failed, treating as empty: {error}");
                Vec::new()
            }
        }
    }

    /// Looks up one conversation by id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<Conversation> {
        self.list_all()
            .into_iter()
            .find(|conversation| conversation.id == id)
    }

    /// Creates and persists an empty conversation for the given agent.
    ///
    /// Returns `None` only when the collection cannot be written.
    #[must_use]
    pub fn create(&self, agent_id: i64, agent_name: &str) -> Option<Conversation> {
        let now = self.now_rfc3339()?;
        let conversation = Conversation {
            id: new_record_id(),
            agent_id,
            agent_name: agent_name.to_string(),
            messages: Vec::new(),
            created_at: now.clone(),
            updated_at: now,
        };

        self.save(conversation)
    }

    /// Appends a message to a conversation, assigning its id and timestamp.
    ///
    /// The sole mutation path for message sequences. Refreshes `updated_at`
    /// and persists the whole collection. Returns the updated snapshot, or
    /// `None` when the conversation is missing or the write fails.
    #[must_use]
    pub fn append_message(&self, conversation_id: &str, draft: MessageDraft) -> Option<Conversation> {
        let mut conversation = self.get(conversation_id)?;
        let timestamp = self.now_rfc3339()?;

        conversation.messages.push(StoredMessage {
            id: new_record_id(),
            role: draft.role,
            content: draft.content,
            timestamp: timestamp.clone(),
        });
        conversation.updated_at = timestamp;

        self.save(conversation)
    }

    /// Removes a conversation by id.
    ///
    /// Removing an unknown id returns `false` and leaves the collection
    /// untouched. Clears the current pointer when it referenced the removed
    /// conversation.
    pub fn remove(&self, id: &str) -> bool {
        let mut conversations = self.list_all();
        let before = conversations.len();
        conversations.retain(|conversation| conversation.id != id);
        if conversations.len() == before {
            return false;
        }

        if let Err(error) = self.write_collection(&conversations) {
            warn!("removing conversation {id} failed: {error}");
            return false;
        }

        if self.current().as_deref() == Some(id) {
            self.clear_current();
        }

        true
    }

    /// Points the process-wide current-conversation pointer at `id`.
    pub fn set_current(&self, id: &str) {
        let path = current_pointer_file(&self.root);
        if let Err(error) = fs::write(&path, id) {
            warn!(
                "writing current-conversation pointer at {} failed: {error}",
                path.display()
            );
        }
    }

    /// Returns the persisted current-conversation pointer, if any.
    #[must_use]
    pub fn current(&self) -> Option<String> {
        let raw = fs::read_to_string(current_pointer_file(&self.root)).ok()?;
        let id = raw.trim();
        if id.is_empty() {
            None
        } else {
            Some(id.to_string())
        }
    }

    /// Clears the persisted current-conversation pointer.
    pub fn clear_current(&self) {
        let path = current_pointer_file(&self.root);
        if let Err(error) = fs::remove_file(&path) {
            if error.kind() != ErrorKind::NotFound {
                warn!(
                    "clearing current-conversation pointer at {} failed: {error}",
                    path.display()
                );
            }
        }
    }

    /// Inserts or replaces `conversation` in the collection and persists it.
    fn save(&self, conversation: Conversation) -> Option<Conversation> {
        let mut conversations = self.list_all();
        match conversations
            .iter()
            .position(|existing| existing.id == conversation.id)
        {
            Some(index) => conversations[index] = conversation.clone(),
            None => conversations.push(conversation.clone()),
        }

        match self.write_collection(&conversations) {
            Ok(()) => Some(conversation),
            Err(error) => {
                warn!("saving conversation {} failed: {error}", conversation.id);
                None
            }
        }
    }

    fn read_collection(&self) -> Result<Vec<Conversation>, ConversationStoreError> {
        let path = conversations_file(&self.root);
        let data = match fs::read_to_string(&path) {
            Ok(data) => data,
            Err(error) if error.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(error) => {
                return Err(ConversationStoreError::io(
                    "reading conversation collection",
                    &path,
                    error,
                ))
            }
        };

        if data.trim().is_empty() {
            return Ok(Vec::new());
        }

        serde_json::from_str(&data).map_err(|source| ConversationStoreError::json_parse(&path, source))
    }

    fn write_collection(&self, conversations: &[Conversation]) -> Result<(), ConversationStoreError> {
        let path = conversations_file(&self.root);
        let data = serde_json::to_string(conversations)
            .map_err(|source| ConversationStoreError::json_serialize(&path, source))?;

        fs::write(&path, data).map_err(|source| {
            ConversationStoreError::io("writing conversation collection", &path, source)
        })
    }

    fn now_rfc3339(&self) -> Option<String> {
        match OffsetDateTime::now_utc().format(&Rfc3339) {
            Ok(now) => Some(now),
            Err(error) => {
                warn!("{}", ConversationStoreError::ClockFormat(error));
                None
            }
        }
    }
}

/// Allocates a fresh record identifier.
///
/// Identity comes from a dedicated generator rather than wall-clock time;
/// clock-derived ids collide under rapid successive calls.
fn new_record_id() -> String {
    Uuid::new_v4().to_string()
}

#[cfg(test)]
mod tests {
    use super::new_record_id;

    #[test]
    fn record_ids_are_unique_under_rapid_allocation() {
        let mut seen = std::collections::HashSet::new();
        for _ in 0..1000 {
            assert!(seen.insert(new_record_id()));
        }
    }
}
