use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::Mutex;

use crate::llm::ChatMessage;

pub type SessionHistory = Arc<Mutex<Vec<ChatMessage>>>;

/// Per-caller conversation history. Each session has its own lock, so two
/// requests on one session run one after the other and never interleave.
pub struct ChatSessions {
    sessions: DashMap<String, SessionHistory>,
    max_turns: usize,
}

impl ChatSessions {
    pub fn new(max_turns: usize) -> Self {
        Self {
            sessions: DashMap::new(),
            max_turns,
        }
    }

    pub fn session(&self, session_id: &str) -> SessionHistory {
        self.sessions
            .entry(session_id.to_string())
            .or_default()
            .value()
            .clone()
    }

    /// Append one question/answer turn, dropping the oldest turns past the cap.
    pub fn record_turn(&self, history: &mut Vec<ChatMessage>, question: String, answer: String) {
        history.push(ChatMessage::user(question));
        history.push(ChatMessage::assistant(answer));

        let max_messages = self.max_turns * 2;
        if history.len() > max_messages {
            let excess = history.len() - max_messages;
            history.drain(..excess);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn same_id_shares_history() {
        let sessions = ChatSessions::new(10);
        let a = sessions.session("caller-1");
        a.lock().await.push(ChatMessage::user("hi"));

        let again = sessions.session("caller-1");
        assert!(Arc::ptr_eq(&a, &again));
        assert_eq!(again.lock().await.len(), 1);

        let other = sessions.session("caller-2");
        assert!(!Arc::ptr_eq(&a, &other));
        assert!(other.lock().await.is_empty());
    }

    #[test]
    fn history_is_capped_by_turns() {
        let sessions = ChatSessions::new(2);
        let mut history = Vec::new();
        for i in 0..3 {
            sessions.record_turn(&mut history, format!("q{}", i), format!("a{}", i));
        }
        assert_eq!(history.len(), 4);
        assert_eq!(history[0], ChatMessage::user("q1"));
        assert_eq!(history[3], ChatMessage::assistant("a2"));
    }
}
