use indexmap::IndexSet;

/// Vocabulary: maps each distinct token to a dense id in first-seen order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Alphabet {
    entries: IndexSet<String>,
}

impl Alphabet {
    pub fn new() -> Self {
        Self {
            entries: IndexSet::new(),
        }
    }

    /// Returns the id of `token`, adding it to the vocabulary if unseen.
    pub fn lookup_or_insert(&mut self, token: &str) -> usize {
        match self.entries.get_index_of(token) {
            Some(idx) => idx,
            None => self.entries.insert_full(token.to_owned()).0,
        }
    }

    pub fn lookup_index(&self, token: &str) -> Option<usize> {
        self.entries.get_index_of(token)
    }

    pub fn lookup_token(&self, idx: usize) -> Option<&str> {
        self.entries.get_index(idx).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(String::as_str)
    }
}
