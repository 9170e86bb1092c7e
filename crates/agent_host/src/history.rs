use shared::agent_api::Turn;

/// Append-only log of the turns exchanged in one session, replayed verbatim
/// as context on every text request.
///
/// There is no size cap: the log grows for as long as the session lives.
#[derive(Debug, Clone, Default)]
pub struct ConversationHistory {
    turns: Vec<Turn>,
}

impl ConversationHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, turn: Turn) {
        self.turns.push(turn);
    }

    /// Owned copy of every turn, oldest first.
    pub fn snapshot(&self) -> Vec<Turn> {
        self.turns.clone()
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn last(&self) -> Option<&Turn> {
        self.turns.last()
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::agent_api::Role;

    #[test]
    fn test_append_preserves_order() {
        let mut history = ConversationHistory::new();
        assert!(history.is_empty());

        history.append(Turn::user_text("satu"));
        history.append(Turn::model_text("dua"));
        history.append(Turn::user_text("tiga"));

        let texts: Vec<_> = history.turns().iter().filter_map(Turn::text).collect();
        assert_eq!(texts, vec!["satu", "dua", "tiga"]);
        assert_eq!(history.last().map(|t| t.role), Some(Role::User));
    }

    #[test]
    fn test_snapshot_is_detached() {
        let mut history = ConversationHistory::new();
        history.append(Turn::user_text("halo"));

        let snapshot = history.snapshot();
        history.append(Turn::model_text("hai"));

        assert_eq!(snapshot.len(), 1);
        assert_eq!(history.len(), 2);
    }
}
