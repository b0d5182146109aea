//! Dependency tree data structures
//!
//! A `Tree` is one parsed sentence as produced by an external UD parser.
//! Word ids and heads keep the 1-based CoNLL-U numbering, so `head == Some(3)`
//! means "governed by the word whose `id` is 3".

use crate::errors::{Error, Result};
use rustc_hash::FxHashMap;

/// 1-based position of a word within its sentence
pub type WordId = usize;

/// Morphological features (FEATS column), e.g. `Case=Gen|Number=Sing`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Features(FxHashMap<String, String>);

impl Features {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a `key=value|key=value` string; `_` and empty mean no features
    pub fn parse(s: &str) -> Self {
        let mut feats = Self::new();
        if s == "_" {
            return feats;
        }
        for pair in s.split('|') {
            if let Some((key, value)) = pair.split_once('=') {
                feats.insert(key, value);
            }
        }
        feats
    }

    pub fn insert(&mut self, key: &str, value: &str) {
        self.0.insert(key.to_string(), value.to_string());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

/// A word (syntactic token) in a dependency tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Word {
    pub id: WordId,
    pub form: String,
    pub lemma: String,
    pub upos: String,
    pub feats: Features,
    /// Governor id; `None` for the root
    pub head: Option<WordId>,
    pub deprel: String,
}

impl Word {
    /// Create a word with no features
    pub fn new(id: WordId, form: &str, lemma: &str, upos: &str, head: Option<WordId>, deprel: &str) -> Self {
        Self {
            id,
            form: form.to_string(),
            lemma: lemma.to_string(),
            upos: upos.to_string(),
            feats: Features::new(),
            head,
            deprel: deprel.to_string(),
        }
    }

    /// Builder-style helper for attaching features
    pub fn with_feats(mut self, feats: &str) -> Self {
        self.feats = Features::parse(feats);
        self
    }

    /// Is this word governed by `id`? A missing governor matches nothing.
    #[inline]
    pub fn is_dependent_of(&self, id: Option<WordId>) -> bool {
        id.is_some() && self.head == id
    }
}

/// A dependency tree (sentence)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tree {
    pub words: Vec<Word>,
    pub sentence_text: Option<String>,
    pub metadata: FxHashMap<String, String>,
}

impl Tree {
    /// Create a new empty tree
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_metadata(sentence_text: Option<String>, metadata: FxHashMap<String, String>) -> Self {
        Self {
            words: Vec::new(),
            sentence_text,
            metadata,
        }
    }

    pub fn add_word(&mut self, word: Word) -> WordId {
        let id = word.id;
        self.words.push(word);
        id
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Get a word by its 1-based id
    pub fn word(&self, id: WordId) -> Option<&Word> {
        self.words.iter().find(|w| w.id == id)
    }

    /// Whether any word is written exactly as `form`
    pub fn contains_form(&self, form: &str) -> bool {
        self.words.iter().any(|w| w.form == form)
    }

    /// Dependents of `id` in index order
    pub fn children(&self, id: WordId) -> impl Iterator<Item = &Word> + '_ {
        self.words.iter().filter(move |w| w.head == Some(id))
    }

    /// Sentence text from the `# text` comment, or the forms joined by spaces
    pub fn text(&self) -> String {
        match &self.sentence_text {
            Some(text) => text.clone(),
            None => self
                .words
                .iter()
                .map(|w| w.form.as_str())
                .collect::<Vec<_>>()
                .join(" "),
        }
    }

    /// Check that every head points at a word of this tree and that
    /// following heads from any word reaches the root.
    pub fn validate(&self) -> Result<()> {
        let index: FxHashMap<WordId, usize> = self
            .words
            .iter()
            .enumerate()
            .map(|(i, w)| (w.id, i))
            .collect();

        for word in &self.words {
            if let Some(head) = word.head {
                if !index.contains_key(&head) {
                    return Err(Error::MalformedParse(format!(
                        "word {} ({}) has head {} outside the sentence",
                        word.id, word.form, head
                    )));
                }
            }
        }

        // 0 = unvisited, 1 = on current path, 2 = reaches root
        let mut state = vec![0u8; self.words.len()];
        for start in 0..self.words.len() {
            let mut path = Vec::new();
            let mut cur = Some(start);
            while let Some(i) = cur {
                match state[i] {
                    2 => break,
                    1 => {
                        return Err(Error::MalformedParse(format!(
                            "cycle through word {} ({})",
                            self.words[i].id, self.words[i].form
                        )));
                    }
                    _ => {}
                }
                state[i] = 1;
                path.push(i);
                cur = self.words[i].head.map(|h| index[&h]);
            }
            for i in path {
                state[i] = 2;
            }
        }
        Ok(())
    }
}
