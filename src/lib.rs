//! Verbdeps: verb-preposition government contexts from dependency parses
//!
//! Collects sentences containing listed (motion) verbs from large corpora,
//! then finds each verb's oblique argument, its preposition, the subject and
//! the argument's case in a UD dependency parse, together with the verb's
//! prefix/stem decomposition.

pub mod archive; // Plain, bzip2 and tar.gz line streams
pub mod config; // Domain presets and file layout
pub mod conllu; // CoNLL-U parsing
pub mod depparse; // Pre-parsed treebanks and external parser commands
pub mod errors;
pub mod extract; // Verb argument extraction
pub mod matcher; // First listed verb in a line
pub mod pipeline; // Context collection and dependency extraction stages
pub mod prefix; // Prefix/stem lookup
pub mod record; // Tab-separated rows
pub mod tree; // Word and Tree
pub mod verbs; // Verb list loading

// Re-exports for convenience
pub use conllu::CoNLLUReader;
pub use depparse::{DependencyParser, ParserCommand, Treebank};
pub use errors::{Error, Result};
pub use extract::{Extraction, extract, extract_checked, extract_first};
pub use matcher::{Lemmatizer, Lexicon, MatchMode, VerbMatch};
pub use prefix::PrefixMap;
pub use record::{ContextRecord, OutputRow, RecordWriter};
pub use tree::{Features, Tree, Word, WordId};
pub use verbs::VerbSet;
