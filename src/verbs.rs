//! Verb list loading

use crate::errors::{Error, Result};
use rustc_hash::FxHashSet;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Parse a verb list file.
///
/// A line containing commas contributes each trimmed comma-separated piece;
/// any other line contributes itself, trimmed, unless it is blank.
pub fn parse_verb_list(path: impl AsRef<Path>) -> Result<Vec<String>> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| Error::missing(path, e))?;
    parse_verb_lines(BufReader::new(file))
}

pub fn parse_verb_lines<R: BufRead>(reader: R) -> Result<Vec<String>> {
    let mut verbs = Vec::new();
    for line in reader.lines() {
        let line = line?;
        if line.contains(',') {
            verbs.extend(line.split(',').map(|verb| verb.trim().to_string()));
            continue;
        }
        let verb = line.trim();
        if !verb.is_empty() {
            verbs.push(verb.to_string());
        }
    }
    Ok(verbs)
}

/// Membership set over a verb list
#[derive(Debug, Clone, Default)]
pub struct VerbSet {
    verbs: FxHashSet<String>,
    entries: usize,
}

impl VerbSet {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        Ok(parse_verb_list(path)?.into_iter().collect())
    }

    #[inline]
    pub fn contains(&self, token: &str) -> bool {
        self.verbs.contains(token)
    }

    /// Number of list entries, duplicates included
    pub fn entries(&self) -> usize {
        self.entries
    }

    /// Number of distinct verbs
    pub fn len(&self) -> usize {
        self.verbs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.verbs.is_empty()
    }
}

impl FromIterator<String> for VerbSet {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        let mut set = VerbSet::default();
        for verb in iter {
            set.entries += 1;
            set.verbs.insert(verb);
        }
        set
    }
}

impl<'a> FromIterator<&'a str> for VerbSet {
    fn from_iter<I: IntoIterator<Item = &'a str>>(iter: I) -> Self {
        iter.into_iter().map(str::to_string).collect()
    }
}
