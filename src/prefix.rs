//! Prefix/stem decomposition of verb lemmas
//!
//! The table is a JSON object mapping a prefixed verb lemma to its
//! `[prefix, stem]` pair, e.g. `{"прийти": ["при", "йти"]}`. A `null` or
//! empty value marks a verb with no known decomposition. Load it once and
//! share it by reference.

use crate::errors::{Error, Result};
use log::debug;
use rustc_hash::FxHashMap;
use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "Option<Vec<String>>")]
enum Decomposition {
    Split(String, String),
    Unknown,
}

impl TryFrom<Option<Vec<String>>> for Decomposition {
    type Error = String;

    fn try_from(value: Option<Vec<String>>) -> std::result::Result<Self, Self::Error> {
        let parts = match value {
            None => return Ok(Decomposition::Unknown),
            Some(parts) if parts.is_empty() => return Ok(Decomposition::Unknown),
            Some(parts) => parts,
        };
        match <[String; 2]>::try_from(parts) {
            Ok([prefix, stem]) => Ok(Decomposition::Split(prefix, stem)),
            Err(parts) => Err(format!(
                "expected [prefix, stem], found {} items",
                parts.len()
            )),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct PrefixMap {
    entries: FxHashMap<String, Decomposition>,
}

impl PrefixMap {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = fs::read_to_string(path).map_err(|e| Error::missing(path, e))?;
        let map = Self::from_json(&data)?;
        debug!("prefix map {}: {} verbs", path.display(), map.len());
        Ok(map)
    }

    pub fn from_json(data: &str) -> Result<Self> {
        Ok(serde_json::from_str(data)?)
    }

    pub fn insert(&mut self, lemma: &str, prefix: &str, stem: &str) {
        self.entries.insert(
            lemma.to_string(),
            Decomposition::Split(prefix.to_string(), stem.to_string()),
        );
    }

    /// `(prefix, stem)` for a lemma, `(None, None)` if it is not in the table
    pub fn resolve(&self, lemma: &str) -> (Option<&str>, Option<&str>) {
        match self.entries.get(lemma) {
            Some(Decomposition::Split(prefix, stem)) => (Some(prefix.as_str()), Some(stem.as_str())),
            Some(Decomposition::Unknown) | None => (None, None),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
