//! Verb argument extraction over a dependency tree
//!
//! Given a tree and the surface form of a verb, find the verb's oblique
//! nominal (`obl`), the adposition attached to it (`case`) and the verb's
//! subject (`nsubj`):
//!
//! 1. the verb is the FIRST word whose form equals the target;
//! 2. among the verb's dependents the LAST `obl` and the LAST `nsubj` win;
//! 3. the preposition is the FIRST `case` dependent of that `obl`.
//!
//! Labels are compared exactly, so subtypes such as `obl:arg` do not count.

use crate::errors::Result;
use crate::tree::{Tree, Word};

pub const OBLIQUE: &str = "obl";
pub const SUBJECT: &str = "nsubj";
pub const CASE_MARKER: &str = "case";

/// Arguments of one verb occurrence; every field is `None` when the verb
/// form does not occur in the tree.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Extraction<'t> {
    pub object: Option<&'t Word>,
    pub preposition: Option<&'t Word>,
    pub subject: Option<&'t Word>,
    pub object_case: Option<&'t str>,
    pub object_lemma: Option<&'t str>,
}

impl<'t> Extraction<'t> {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn object_form(&self) -> Option<&'t str> {
        self.object.map(|w| w.form.as_str())
    }

    pub fn preposition_form(&self) -> Option<&'t str> {
        self.preposition.map(|w| w.form.as_str())
    }

    pub fn subject_form(&self) -> Option<&'t str> {
        self.subject.map(|w| w.form.as_str())
    }
}

/// Extract the arguments of `verb` from `tree`.
pub fn extract<'t>(tree: &'t Tree, verb: &str) -> Extraction<'t> {
    let mut result = Extraction::default();

    let verb_id = tree.words.iter().find(|w| w.form == verb).map(|w| w.id);

    for word in &tree.words {
        if !word.is_dependent_of(verb_id) {
            continue;
        }
        if word.deprel == OBLIQUE {
            result.object = Some(word);
            result.object_lemma = Some(word.lemma.as_str());
            if let Some(case) = word.feats.get("Case").and_then(case_value) {
                result.object_case = Some(case);
            }
        }
        if word.deprel == SUBJECT {
            result.subject = Some(word);
        }
    }

    let noun_id = result.object.map(|w| w.id);
    result.preposition = tree
        .words
        .iter()
        .find(|w| w.is_dependent_of(noun_id) && w.deprel == CASE_MARKER);

    result
}

/// Like [`extract`], but rejects trees with dangling heads or cycles first.
pub fn extract_checked<'t>(tree: &'t Tree, verb: &str) -> Result<Extraction<'t>> {
    tree.validate()?;
    Ok(extract(tree, verb))
}

/// Extract from the first of several trees that contains the verb form.
///
/// A parser may split one input sentence into several trees. Only the tree
/// holding the verb is searched and validated; no tree holding it gives an
/// empty result.
pub fn extract_first<'t>(trees: &'t [Tree], verb: &str) -> Result<Extraction<'t>> {
    match trees.iter().find(|tree| tree.contains_form(verb)) {
        Some(tree) => extract_checked(tree, verb),
        None => Ok(Extraction::default()),
    }
}

/// Leading ASCII-alphabetic part of a `Case` value; `None` if there is none.
fn case_value(value: &str) -> Option<&str> {
    let end = value
        .find(|c: char| !c.is_ascii_alphabetic())
        .unwrap_or(value.len());
    (end > 0).then(|| &value[..end])
}
