use chat_api::{ApiMessage, ApiRole};
use conversation_store::{Conversation, ConversationStore, MessageDraft, Role};
use log::warn;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

/// Agent selected for new turns: a denormalized snapshot of the remote
/// record, captured so conversations stay labeled after the agent changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveAgent {
    pub id: i64,
    pub name: String,
}

/// Everything the transport needs to stream one reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnRequest {
    pub conversation_id: String,
    pub agent_id: i64,
    pub messages: Vec<ApiMessage>,
}

/// Transient state for the single in-flight turn.
#[derive(Debug)]
struct TurnState {
    conversation_id: String,
    accumulated: String,
}

/// Deterministic per-turn orchestration over the conversation store.
///
/// Owns the only view of partial streaming output and guarantees that at
/// most one assistant message is committed per turn, no matter how many
/// terminal signals arrive or in what order late events land.
pub struct ChatApp {
    store: ConversationStore,
    active_agent: Option<ActiveAgent>,
    turn: Option<TurnState>,
}

impl ChatApp {
    #[must_use]
    pub fn new(store: ConversationStore) -> Self {
        Self {
            store,
            active_agent: None,
            turn: None,
        }
    }

    #[must_use]
    pub fn store(&self) -> &ConversationStore {
        &self.store
    }

    pub fn select_agent(&mut self, agent: ActiveAgent) {
        self.active_agent = Some(agent);
    }

    #[must_use]
    pub fn active_agent(&self) -> Option<&ActiveAgent> {
        self.active_agent.as_ref()
    }

    /// Conversations ordered by recency, newest first.
    ///
    /// The store keeps insertion order; the recency view is computed here.
    #[must_use]
    pub fn recent_conversations(&self) -> Vec<Conversation> {
        let mut conversations = self.store.list_all();
        conversations.sort_by(|a, b| updated_at_key(b).cmp(&updated_at_key(a)));
        conversations
    }

    /// Makes `id` the current conversation and returns its record.
    pub fn open_conversation(&mut self, id: &str) -> Option<Conversation> {
        let conversation = self.store.get(id)?;
        self.store.set_current(id);
        Some(conversation)
    }

    #[must_use]
    pub fn current_conversation(&self) -> Option<Conversation> {
        self.store.current().and_then(|id| self.store.get(&id))
    }

    pub fn delete_conversation(&mut self, id: &str) -> bool {
        self.store.remove(id)
    }

    #[must_use]
    pub fn is_turn_active(&self) -> bool {
        self.turn.is_some()
    }

    /// Live partial assistant output for the in-flight turn. Never persisted.
    #[must_use]
    pub fn streaming_preview(&self) -> Option<&str> {
        self.turn.as_ref().map(|turn| turn.accumulated.as_str())
    }

    /// Validates and records the user side of a turn.
    ///
    /// Rejections (blank input, no agent selected, a turn already in
    /// flight, or a failed user-message write) return `None` before any
    /// network activity happens.
    #[must_use]
    pub fn begin_turn(&mut self, input: &str) -> Option<TurnRequest> {
        let text = input.trim();
        if text.is_empty() || self.turn.is_some() {
            return None;
        }
        let agent = self.active_agent.clone()?;

        let conversation = self.ensure_conversation(&agent)?;
        let updated = self
            .store
            .append_message(&conversation.id, MessageDraft::user(text))?;

        let messages = api_history(&updated);
        self.turn = Some(TurnState {
            conversation_id: updated.id.clone(),
            accumulated: String::new(),
        });

        Some(TurnRequest {
            conversation_id: updated.id,
            agent_id: agent.id,
            messages,
        })
    }

    /// Applies one streamed fragment to the in-flight turn, in arrival order.
    pub fn apply_delta(&mut self, text: &str) {
        if let Some(turn) = self.turn.as_mut() {
            turn.accumulated.push_str(text);
        }
    }

    /// Finishes the turn normally, committing the accumulated reply once.
    ///
    /// Empty turns commit nothing. Duplicate terminal signals and events
    /// arriving after the commit are no-ops.
    pub fn complete_turn(&mut self) {
        let Some(turn) = self.turn.take() else {
            return;
        };
        if turn.accumulated.is_empty() {
            return;
        }

        if self
            .store
            .append_message(&turn.conversation_id, MessageDraft::assistant(turn.accumulated))
            .is_none()
        {
            warn!(
                "assistant message for conversation {} was not persisted",
                turn.conversation_id
            );
        }
    }

    /// Finishes the turn after every transport failed.
    ///
    /// The failure is committed as a visible assistant message so it lives in
    /// conversation history rather than vanishing with the spinner.
    pub fn fail_turn(&mut self, error: &str) {
        let Some(turn) = self.turn.take() else {
            return;
        };

        let content = format!("Error: {error}");
        if self
            .store
            .append_message(&turn.conversation_id, MessageDraft::assistant(content))
            .is_none()
        {
            warn!(
                "error message for conversation {} was not persisted",
                turn.conversation_id
            );
        }
    }

    /// Discards the turn without committing partial output.
    pub fn cancel_turn(&mut self) {
        self.turn = None;
    }

    fn ensure_conversation(&mut self, agent: &ActiveAgent) -> Option<Conversation> {
        if let Some(conversation) = self.current_conversation() {
            return Some(conversation);
        }

        let conversation = self.store.create(agent.id, &agent.name)?;
        self.store.set_current(&conversation.id);
        Some(conversation)
    }
}

/// Model-facing history: user and assistant roles only, in stored order.
/// System messages are never replayed to the transport.
fn api_history(conversation: &Conversation) -> Vec<ApiMessage> {
    conversation
        .messages
        .iter()
        .filter_map(|message| match message.role {
            Role::User => Some(ApiMessage::new(ApiRole::User, message.content.clone())),
            Role::Assistant => Some(ApiMessage::new(ApiRole::Assistant, message.content.clone())),
            Role::System => None,
        })
        .collect()
}

fn updated_at_key(conversation: &Conversation) -> OffsetDateTime {
    OffsetDateTime::parse(&conversation.updated_at, &Rfc3339)
        .unwrap_or(OffsetDateTime::UNIX_EPOCH)
}

#[cfg(test)]
mod tests {
    use chat_api::{ApiMessage, ApiRole};
    use conversation_store::{ConversationStore, MessageDraft, Role};
    use tempfile::TempDir;

    use super::{ActiveAgent, ChatApp};

    fn new_app() -> (TempDir, ChatApp) {
        let dir = tempfile::tempdir().expect("tempdir should be created");
        let app = ChatApp::new(ConversationStore::new(dir.path()));
        (dir, app)
    }

    fn new_app_with_agent() -> (TempDir, ChatApp) {
        let (dir, mut app) = new_app();
        app.select_agent(ActiveAgent {
            id: 7,
            name: "Helper".to_string(),
        });
        (dir, app)
    }

    #[test]
    fn begin_turn_rejects_blank_input() {
        let (_dir, mut app) = new_app_with_agent();
        assert!(app.begin_turn("   ").is_none());
        assert!(!app.is_turn_active());
    }

    #[test]
    fn begin_turn_rejects_when_no_agent_is_selected() {
        let (_dir, mut app) = new_app();
        assert!(app.begin_turn("hello").is_none());
    }

    #[test]
    fn begin_turn_rejects_while_a_turn_is_in_flight() {
        let (_dir, mut app) = new_app_with_agent();
        assert!(app.begin_turn("first").is_some());
        assert!(app.begin_turn("second").is_none());
    }

    #[test]
    fn begin_turn_creates_a_conversation_and_points_current_at_it() {
        let (_dir, mut app) = new_app_with_agent();

        let turn = app.begin_turn("hello").expect("turn should start");
        assert_eq!(turn.agent_id, 7);
        assert_eq!(
            turn.messages,
            vec![ApiMessage::new(ApiRole::User, "hello")]
        );

        let conversation = app
            .current_conversation()
            .expect("current conversation should exist");
        assert_eq!(conversation.id, turn.conversation_id);
        assert_eq!(conversation.agent_name, "Helper");
        assert_eq!(conversation.messages.len(), 1);
    }

    #[test]
    fn begin_turn_reuses_the_current_conversation() {
        let (_dir, mut app) = new_app_with_agent();

        let first = app.begin_turn("one").expect("first turn");
        app.complete_turn();
        let second = app.begin_turn("two").expect("second turn");

        assert_eq!(first.conversation_id, second.conversation_id);
        assert_eq!(app.recent_conversations().len(), 1);
    }

    #[test]
    fn begin_turn_trims_the_user_message() {
        let (_dir, mut app) = new_app_with_agent();
        let turn = app.begin_turn("  hi there  ").expect("turn should start");
        assert_eq!(
            turn.messages,
            vec![ApiMessage::new(ApiRole::User, "hi there")]
        );
    }

    #[test]
    fn system_messages_are_filtered_from_the_api_history() {
        let (_dir, mut app) = new_app_with_agent();

        let first = app.begin_turn("question").expect("first turn");
        app.apply_delta("answer");
        app.complete_turn();

        app.store()
            .append_message(
                &first.conversation_id,
                MessageDraft::new(Role::System, "internal note"),
            )
            .expect("system append");

        let second = app.begin_turn("follow-up").expect("second turn");
        assert_eq!(
            second.messages,
            vec![
                ApiMessage::new(ApiRole::User, "question"),
                ApiMessage::new(ApiRole::Assistant, "answer"),
                ApiMessage::new(ApiRole::User, "follow-up"),
            ]
        );
    }

    #[test]
    fn deltas_accumulate_into_the_preview_in_arrival_order() {
        let (_dir, mut app) = new_app_with_agent();
        app.begin_turn("hi").expect("turn should start");

        app.apply_delta("Hel");
        app.apply_delta("lo");
        app.apply_delta(" world");

        assert_eq!(app.streaming_preview(), Some("Hello world"));
    }

    #[test]
    fn complete_turn_commits_exactly_once_under_duplicate_terminals() {
        let (_dir, mut app) = new_app_with_agent();
        let turn = app.begin_turn("hi").expect("turn should start");

        app.apply_delta("Hello world");
        app.complete_turn();
        app.complete_turn();
        app.apply_delta("late delta");
        app.complete_turn();

        let conversation = app
            .store()
            .get(&turn.conversation_id)
            .expect("conversation should exist");
        let assistant_messages: Vec<&str> = conversation
            .messages
            .iter()
            .filter(|message| message.role == Role::Assistant)
            .map(|message| message.content.as_str())
            .collect();
        assert_eq!(assistant_messages, vec!["Hello world"]);
        assert_eq!(app.streaming_preview(), None);
    }

    #[test]
    fn empty_turns_commit_no_assistant_message() {
        let (_dir, mut app) = new_app_with_agent();
        let turn = app.begin_turn("hi").expect("turn should start");

        app.complete_turn();

        let conversation = app
            .store()
            .get(&turn.conversation_id)
            .expect("conversation should exist");
        assert_eq!(conversation.messages.len(), 1);
        assert_eq!(conversation.messages[0].role, Role::User);
    }

    #[test]
    fn fail_turn_commits_a_single_visible_error_message() {
        let (_dir, mut app) = new_app_with_agent();
        let turn = app.begin_turn("hi").expect("turn should start");

        app.apply_delta("partial that never finished");
        app.fail_turn("all transports exhausted");
        app.fail_turn("all transports exhausted");

        let conversation = app
            .store()
            .get(&turn.conversation_id)
            .expect("conversation should exist");
        assert_eq!(conversation.messages.len(), 2);
        assert_eq!(
            conversation.messages[1].content,
            "Error: all transports exhausted"
        );
    }

    #[test]
    fn cancel_turn_discards_partial_output_without_committing() {
        let (_dir, mut app) = new_app_with_agent();
        let turn = app.begin_turn("hi").expect("turn should start");

        app.apply_delta("discarded");
        app.cancel_turn();

        let conversation = app
            .store()
            .get(&turn.conversation_id)
            .expect("conversation should exist");
        assert_eq!(conversation.messages.len(), 1);
        assert!(!app.is_turn_active());
    }

    #[test]
    fn recent_conversations_sort_newest_first() {
        let (_dir, mut app) = new_app_with_agent();

        let older = app.begin_turn("first conversation").expect("older turn");
        app.apply_delta("reply");
        app.complete_turn();

        app.store().clear_current();
        let newer = app.begin_turn("second conversation").expect("newer turn");
        app.apply_delta("reply");
        app.complete_turn();

        let recent = app.recent_conversations();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].id, newer.conversation_id);
        assert_eq!(recent[1].id, older.conversation_id);

        // Touching the older conversation moves it back to the front.
        app.store()
            .append_message(&older.conversation_id, MessageDraft::user("bump"))
            .expect("bump append");
        let recent = app.recent_conversations();
        assert_eq!(recent[0].id, older.conversation_id);
    }
}
