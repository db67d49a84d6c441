//! Text pipeline: lowercase, tokenize, drop stopwords, encode.
//!
//! Tokens are runs that start and end with a letter and contain only letters
//! or punctuation in between, so they are at least three characters long and
//! keep inner apostrophes and hyphens (`don't`, `e-mail`).

use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;
use tracing::debug;

use crate::alphabet::Alphabet;
use crate::config::{StoplistSource, TopicModelConfig};
use crate::error::{Error, Result};
use crate::instance::FeatureSequence;

const TOKEN_PATTERN: &str = r"\p{L}[\p{L}\p{P}]+\p{L}";

fn token_regex() -> &'static Regex {
    static TOKEN: OnceLock<Regex> = OnceLock::new();
    TOKEN.get_or_init(|| Regex::new(TOKEN_PATTERN).expect("token pattern is valid"))
}

/// Case-insensitive set of words to drop.
#[derive(Debug, Clone, Default)]
pub struct StopList {
    words: HashSet<String>,
}

impl StopList {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn english() -> Self {
        stop_words::get(stop_words::LANGUAGE::English)
            .into_iter()
            .collect()
    }

    /// Reads one word per line; surrounding whitespace and blank lines are ignored.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| Error::Stoplist {
            path: path.to_path_buf(),
            source,
        })?;
        let stoplist: Self = text.split_whitespace().collect();
        debug!(path = %path.display(), words = stoplist.len(), "Loaded stoplist");
        Ok(stoplist)
    }

    pub fn load(source: &StoplistSource) -> Result<Self> {
        match source {
            StoplistSource::File(path) => Self::from_file(path),
            StoplistSource::English => Ok(Self::english()),
            StoplistSource::None => Ok(Self::empty()),
        }
    }

    pub fn insert(&mut self, word: &str) {
        self.words.insert(word.to_lowercase());
    }

    pub fn contains(&self, token: &str) -> bool {
        if token.chars().any(char::is_uppercase) {
            self.words.contains(&token.to_lowercase())
        } else {
            self.words.contains(token)
        }
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

impl<S: AsRef<str>> FromIterator<S> for StopList {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut stoplist = Self::empty();
        for word in iter {
            stoplist.insert(word.as_ref());
        }
        stoplist
    }
}

#[derive(Debug, Clone)]
pub struct Pipeline {
    lowercase: bool,
    stoplist: StopList,
}

impl Pipeline {
    pub fn new(lowercase: bool, stoplist: StopList) -> Self {
        Self { lowercase, stoplist }
    }

    pub fn from_config(config: &TopicModelConfig) -> Result<Self> {
        let mut stoplist = StopList::load(&config.stoplist)?;
        for word in &config.extra_stopwords {
            stoplist.insert(word);
        }
        Ok(Self::new(config.lowercase, stoplist))
    }

    pub fn stoplist(&self) -> &StopList {
        &self.stoplist
    }

    /// Lowercases, tokenizes and removes stopwords.
    pub fn tokens(&self, text: &str) -> Vec<String> {
        let text = if self.lowercase {
            text.to_lowercase()
        } else {
            text.to_owned()
        };

        token_regex()
            .find_iter(&text)
            .map(|m| m.as_str())
            .filter(|token| !self.stoplist.contains(token))
            .map(str::to_owned)
            .collect()
    }

    /// Runs the full pipeline, growing `alphabet` with unseen tokens.
    pub fn features(&self, text: &str, alphabet: &mut Alphabet) -> FeatureSequence {
        self.tokens(text)
            .iter()
            .map(|token| alphabet.lookup_or_insert(token))
            .collect()
    }
}
