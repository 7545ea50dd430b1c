use std::collections::HashSet;

/// Word overrides that live only as long as one dictionary handle.
#[derive(Debug, Default)]
pub struct Session {
    added: HashSet<String>,
    removed: HashSet<String>,
}

impl Session {
    pub fn add(&mut self, word: &str) {
        self.removed.remove(word);
        self.added.insert(word.to_string());
    }

    pub fn remove(&mut self, word: &str) {
        self.added.remove(word);
        self.removed.insert(word.to_string());
    }

    /// Forget a session removal without marking the word as added.
    pub fn unremove(&mut self, word: &str) {
        self.removed.remove(word);
    }

    /// Forget a session addition without marking the word as removed.
    pub fn unadd(&mut self, word: &str) {
        self.added.remove(word);
    }

    pub fn is_added(&self, word: &str) -> bool {
        self.added.contains(word)
    }

    pub fn is_removed(&self, word: &str) -> bool {
        self.removed.contains(word)
    }

    pub fn clear(&mut self) {
        self.added.clear();
        self.removed.clear();
    }
}
