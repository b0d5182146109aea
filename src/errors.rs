//! Errors and error-related utilities.

use crate::conllu::ParseError;
use std::path::PathBuf;
use std::{fmt, io, result};

/// The result type used throughout this library.
pub type Result<T> = result::Result<T, Error>;

/// Error during corpus reading, parsing or extraction
#[derive(Debug)]
pub enum Error {
    /// A required input file (verb list, corpus, prefix map, treebank) could not be opened
    MissingResource { path: PathBuf, source: io::Error },
    /// A line did not have the expected tab-separated layout
    MalformedLine { line_num: usize, message: String },
    /// Tokenized and lemmatized lines disagree on their token count
    Alignment { surface: usize, lemmas: usize },
    /// A dependency tree is not a tree (head out of range or a cycle)
    MalformedParse(String),
    /// A line is not valid UTF-8
    Encoding { line_num: usize },
    /// CoNLL-U parse failure
    Conllu(ParseError),
    /// The external dependency parser failed
    Parser(String),
    Json(serde_json::Error),
    Io(io::Error),
}

impl Error {
    /// Wrap an open failure with the path that caused it.
    pub fn missing(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Error::MissingResource {
            path: path.into(),
            source,
        }
    }

    pub fn malformed_line(line_num: usize, message: impl Into<String>) -> Self {
        Error::MalformedLine {
            line_num,
            message: message.into(),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::MissingResource { path, source } => {
                write!(f, "cannot open {}: {}", path.display(), source)
            }
            Error::MalformedLine { line_num, message } => {
                write!(f, "malformed line {}: {}", line_num, message)
            }
            Error::Alignment { surface, lemmas } => write!(
                f,
                "token count mismatch: {} surface tokens, {} lemmas",
                surface, lemmas
            ),
            Error::MalformedParse(message) => write!(f, "malformed parse: {}", message),
            Error::Encoding { line_num } => write!(f, "invalid UTF-8 at line {}", line_num),
            Error::Conllu(e) => write!(f, "{}", e),
            Error::Parser(message) => write!(f, "dependency parser failed: {}", message),
            Error::Json(e) => write!(f, "JSON error: {}", e),
            Error::Io(e) => write!(f, "IO error: {}", e),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::MissingResource { source, .. } => Some(source),
            Error::Conllu(e) => Some(e),
            Error::Json(e) => Some(e),
            Error::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Error::Io(e)
    }
}

impl From<ParseError> for Error {
    fn from(e: ParseError) -> Self {
        Error::Conllu(e)
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Json(e)
    }
}
