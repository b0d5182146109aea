//! Fixed file layout of the two corpus domains
//!
//! Every path is relative to a data directory; there is no per-file override.

use clap::ValueEnum;
use std::fmt;
use std::path::{Path, PathBuf};

pub const VERB_LIST: &str = "verbs_list.txt";
pub const CONTEXTS: &str = "all_found_contexts.txt";
pub const PREFIX_MAP: &str = "verb_prefix_map.json";
pub const DEPENDENCIES: &str = "extracted_dependencies.txt";
/// Optional form-to-lemma table for surface-form matching
pub const LEXICON: &str = "lexicon.tsv";

const WEB_SENTENCES: &str = "ukr-ua_web_2019_1M/ukr-ua_web_2019_1M-sentences.txt";
const FICTION_LEMMATIZED: &str = "fiction.lemmatized.shuffled.txt.bz2";
const FICTION_TOKENIZED: &str = "fiction.tokenized.shuffled.txt.bz2";

/// Corpus domain to collect verb contexts from
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Domain {
    /// Leipzig-style `id<TAB>sentence` web corpus, matched by surface form
    Web,
    /// Parallel lemmatized and tokenized fiction corpus
    Fiction,
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Domain::Web => write!(f, "web"),
            Domain::Fiction => write!(f, "fiction"),
        }
    }
}

/// Resolved input and output paths for one run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    pub data_dir: PathBuf,
}

impl Layout {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.data_dir.join(name)
    }

    pub fn verb_list(&self) -> PathBuf {
        self.path(VERB_LIST)
    }

    pub fn contexts(&self) -> PathBuf {
        self.path(CONTEXTS)
    }

    pub fn prefix_map(&self) -> PathBuf {
        self.path(PREFIX_MAP)
    }

    pub fn dependencies(&self) -> PathBuf {
        self.path(DEPENDENCIES)
    }

    pub fn lexicon(&self) -> PathBuf {
        self.path(LEXICON)
    }

    /// Web corpus sentences file
    pub fn web_sentences(&self) -> PathBuf {
        self.path(WEB_SENTENCES)
    }

    /// Fiction corpus as `(lemmatized, tokenized)` streams
    pub fn fiction(&self) -> (PathBuf, PathBuf) {
        (self.path(FICTION_LEMMATIZED), self.path(FICTION_TOKENIZED))
    }

    /// Resolve a user-supplied path against the data directory
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.data_dir.join(path)
        }
    }
}

impl Default for Layout {
    fn default() -> Self {
        Self::new(".")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_paths() {
        let layout = Layout::new("/data");
        assert_eq!(layout.verb_list(), PathBuf::from("/data/verbs_list.txt"));
        assert_eq!(
            layout.web_sentences(),
            PathBuf::from("/data/ukr-ua_web_2019_1M/ukr-ua_web_2019_1M-sentences.txt")
        );
        let (lemmatized, tokenized) = layout.fiction();
        assert!(lemmatized.ends_with("fiction.lemmatized.shuffled.txt.bz2"));
        assert!(tokenized.ends_with("fiction.tokenized.shuffled.txt.bz2"));
    }

    #[test]
    fn test_resolve() {
        let layout = Layout::new("/data");
        assert_eq!(
            layout.resolve(Path::new("parsed.conllu")),
            PathBuf::from("/data/parsed.conllu")
        );
        assert_eq!(
            layout.resolve(Path::new("/tmp/parsed.conllu")),
            PathBuf::from("/tmp/parsed.conllu")
        );
    }

    #[test]
    fn test_domain_display() {
        assert_eq!(Domain::Web.to_string(), "web");
        assert_eq!(Domain::Fiction.to_string(), "fiction");
    }
}
