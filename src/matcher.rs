//! Locating verb-list members in corpus lines
//!
//! Lines are split on single spaces, exactly as the corpora are tokenized.
//! Only the first matching token of a line is ever reported.

use crate::errors::{Error, Result};
use crate::verbs::VerbSet;
use clap::ValueEnum;
use log::debug;
use rustc_hash::FxHashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// How corpus tokens are compared against the verb list
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum MatchMode {
    /// Tokens are already lemmas
    Lemmatized,
    /// Tokens are surface forms and go through a [`Lemmatizer`] first
    Surface,
}

/// Morphological analyzer producing a dictionary (normal) form
pub trait Lemmatizer {
    fn normal_form(&self, token: &str) -> String;
}

/// Form-to-lemma table; unknown forms fall back to their lowercase
#[derive(Debug, Clone, Default)]
pub struct Lexicon {
    lemmas: FxHashMap<String, String>,
}

impl Lexicon {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load `form<TAB>lemma` lines; blank lines and `#` comments are ignored
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| Error::missing(path, e))?;
        Self::from_reader(BufReader::new(file))
    }

    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self> {
        let mut lexicon = Self::new();
        for (i, line) in reader.lines().enumerate() {
            let line = line?;
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let (form, lemma) = line
                .split_once('\t')
                .ok_or_else(|| Error::malformed_line(i + 1, "expected form<TAB>lemma"))?;
            lexicon.insert(form.trim(), lemma.trim());
        }
        debug!("lexicon: {} forms", lexicon.len());
        Ok(lexicon)
    }

    pub fn insert(&mut self, form: &str, lemma: &str) {
        self.lemmas.insert(form.to_lowercase(), lemma.to_string());
    }

    pub fn len(&self) -> usize {
        self.lemmas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lemmas.is_empty()
    }
}

impl Lemmatizer for Lexicon {
    fn normal_form(&self, token: &str) -> String {
        let lower = token.to_lowercase();
        match self.lemmas.get(&lower) {
            Some(lemma) => lemma.clone(),
            None => lower,
        }
    }
}

/// The first verb found in a line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerbMatch {
    /// 0-based position among the space-separated tokens
    pub index: usize,
    /// Token as written in the line
    pub token: String,
    /// Verb-list entry the token matched
    pub lemma: String,
}

/// Match tokens that are already lemmas
pub fn find_lemmatized(line: &str, verbs: &VerbSet) -> Option<VerbMatch> {
    line.split(' ')
        .enumerate()
        .find(|(_, token)| verbs.contains(token))
        .map(|(index, token)| VerbMatch {
            index,
            token: token.to_string(),
            lemma: token.to_string(),
        })
}

/// Match the normal form of each surface token
pub fn find_surface<L: Lemmatizer + ?Sized>(
    line: &str,
    verbs: &VerbSet,
    lemmatizer: &L,
) -> Option<VerbMatch> {
    line.split(' ').enumerate().find_map(|(index, token)| {
        let lemma = lemmatizer.normal_form(token);
        verbs.contains(&lemma).then(|| VerbMatch {
            index,
            token: token.to_string(),
            lemma,
        })
    })
}

/// Dispatch on [`MatchMode`]
pub fn find_verb<L: Lemmatizer + ?Sized>(
    line: &str,
    verbs: &VerbSet,
    mode: MatchMode,
    lemmatizer: &L,
) -> Option<VerbMatch> {
    match mode {
        MatchMode::Lemmatized => find_lemmatized(line, verbs),
        MatchMode::Surface => find_surface(line, verbs, lemmatizer),
    }
}

/// One token of a sentence available both as written and as a lemma
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlignedToken<'a> {
    pub surface: &'a str,
    pub lemma: &'a str,
}

/// A tokenized line paired position-by-position with its lemmatized twin
#[derive(Debug, Clone)]
pub struct AlignedSentence<'a> {
    pub surface: &'a str,
    pub tokens: Vec<AlignedToken<'a>>,
}

impl<'a> AlignedSentence<'a> {
    pub fn new(surface: &'a str, lemmas: &'a str) -> Result<Self> {
        let surface_tokens: Vec<&str> = surface.split(' ').collect();
        let lemma_tokens: Vec<&str> = lemmas.split(' ').collect();
        if surface_tokens.len() != lemma_tokens.len() {
            return Err(Error::Alignment {
                surface: surface_tokens.len(),
                lemmas: lemma_tokens.len(),
            });
        }
        let tokens = surface_tokens
            .into_iter()
            .zip(lemma_tokens)
            .map(|(surface, lemma)| AlignedToken { surface, lemma })
            .collect();
        Ok(Self { surface, tokens })
    }

    /// First token whose lemma is a listed verb
    pub fn find_verb(&self, verbs: &VerbSet) -> Option<VerbMatch> {
        self.tokens
            .iter()
            .enumerate()
            .find(|(_, t)| verbs.contains(t.lemma))
            .map(|(index, t)| VerbMatch {
                index,
                token: t.surface.to_string(),
                lemma: t.lemma.to_string(),
            })
    }
}
