//! The two processing stages.
//!
//! 1. Context collection: stream a corpus, find the first listed verb of each
//!    sentence and append a context row.
//! 2. Dependency extraction: parse each context sentence, extract the verb's
//!    arguments, resolve its prefix and write exactly one output row.

use crate::archive;
use crate::depparse::DependencyParser;
use crate::errors::{Error, Result};
use crate::extract::{Extraction, extract_first};
use crate::matcher::{AlignedSentence, Lemmatizer, MatchMode, find_lemmatized, find_verb};
use crate::prefix::PrefixMap;
use crate::record::{ContextRecord, OutputRow, RecordWriter};
use crate::verbs::VerbSet;
use log::{debug, info, trace, warn};
use std::io::Write;
use std::path::Path;

/// Log a progress line every this many corpus lines
const PROGRESS_EVERY: usize = 100_000;

/// Counters reported at the end of a stage
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Stats {
    /// Input lines (or line pairs) consumed
    pub lines: usize,
    /// Lines containing a listed verb
    pub matches: usize,
    /// Lines skipped as malformed or misaligned
    pub skipped: usize,
    /// Rows written
    pub rows: usize,
    /// Contexts where nothing was found: no parse, verb form missing from
    /// the parse, or a verb without subject and oblique
    pub unparsed: usize,
    /// Rows with a subject or an oblique argument
    pub found: usize,
    /// Rows with an oblique argument
    pub objects: usize,
}

/// Split a web corpus line into its sentence id and text
pub fn parse_web_line(line: &str, line_num: usize) -> Result<(&str, &str)> {
    let malformed = || Error::malformed_line(line_num, "expected <id><TAB><sentence>");
    let (id, sentence) = line.split_once('\t').ok_or_else(malformed)?;
    if id.is_empty() || !id.bytes().all(|b| b.is_ascii_digit()) || sentence.is_empty() {
        return Err(malformed());
    }
    Ok((id, sentence))
}

/// Collect contexts from the web corpus.
///
/// Sentences are surface text unless the corpus was lemmatized beforehand;
/// `mode` says which. Malformed lines are logged and skipped.
pub fn collect_web_contexts<I, L, W>(
    lines: I,
    verbs: &VerbSet,
    mode: MatchMode,
    lemmatizer: &L,
    writer: &mut RecordWriter<W>,
) -> Result<Stats>
where
    I: IntoIterator<Item = Result<String>>,
    L: Lemmatizer + ?Sized,
    W: Write,
{
    let mut stats = Stats::default();
    for line in lines {
        let line = line?;
        stats.lines += 1;
        progress(&stats);

        let (id, sentence) = match parse_web_line(&line, stats.lines) {
            Ok(parts) => parts,
            Err(e) => {
                warn!("{}", e);
                stats.skipped += 1;
                continue;
            }
        };
        if let Some(m) = find_verb(sentence, verbs, mode, lemmatizer) {
            trace!("sentence {}: {} ({}) at {}", id, m.token, m.lemma, m.index);
            stats.matches += 1;
            writer.write_context(&ContextRecord {
                sentence: sentence.to_string(),
                sentence_id: m.index.to_string(),
                verb: m.token,
                lemma: m.lemma,
            })?;
            stats.rows += 1;
        }
    }
    writer.flush()?;
    Ok(stats)
}

/// Collect contexts from the parallel fiction corpus.
///
/// The two streams are read in lockstep; the lemmatized line decides the
/// match and the tokenized line supplies the sentence and the verb form.
/// Sentences whose token counts differ are logged and skipped.
pub fn collect_fiction_contexts<I, J, W>(
    lemma_lines: I,
    surface_lines: J,
    verbs: &VerbSet,
    limit: Option<usize>,
    writer: &mut RecordWriter<W>,
) -> Result<Stats>
where
    I: IntoIterator<Item = Result<String>>,
    J: IntoIterator<Item = Result<String>>,
    W: Write,
{
    let mut stats = Stats::default();
    let mut lemma_lines = lemma_lines.into_iter();
    let mut surface_lines = surface_lines.into_iter();

    loop {
        if limit.is_some_and(|limit| stats.lines >= limit) {
            info!("stopping after {} sentences", stats.lines);
            break;
        }
        let (lemmas, surface) = match (lemma_lines.next(), surface_lines.next()) {
            (Some(lemmas), Some(surface)) => (lemmas?, surface?),
            (None, None) => break,
            (Some(_), None) | (None, Some(_)) => {
                warn!(
                    "lemmatized and tokenized corpora differ in length after {} lines",
                    stats.lines
                );
                break;
            }
        };
        stats.lines += 1;
        progress(&stats);

        let sentence = match AlignedSentence::new(&surface, &lemmas) {
            Ok(sentence) => sentence,
            Err(e) => {
                // only a problem when the line would have matched
                if find_lemmatized(&lemmas, verbs).is_some() {
                    warn!("line {}: {}: {}", stats.lines, e, surface);
                    stats.skipped += 1;
                }
                continue;
            }
        };
        if let Some(m) = sentence.find_verb(verbs) {
            stats.matches += 1;
            writer.write_context(&ContextRecord {
                sentence: surface.clone(),
                sentence_id: m.index.to_string(),
                verb: m.token,
                lemma: m.lemma,
            })?;
            stats.rows += 1;
        }
    }
    writer.flush()?;
    Ok(stats)
}

fn progress(stats: &Stats) {
    if stats.lines % PROGRESS_EVERY == 0 {
        info!("{} lines, {} contexts", stats.lines, stats.matches);
    }
}

/// Read a context file written by the collection stage.
///
/// Blank lines are ignored; a row with fewer than four columns is an error.
pub fn read_contexts(path: impl AsRef<Path>) -> Result<Vec<ContextRecord>> {
    let mut contexts = Vec::new();
    for (i, line) in archive::open_lines(path)?.enumerate() {
        let line = line?;
        if line.is_empty() {
            continue;
        }
        contexts.push(ContextRecord::parse(&line, i + 1)?);
    }
    Ok(contexts)
}

/// Extract dependencies for every context, in order, one row each.
///
/// The verb is looked up in the first parse tree holding its form. Parser
/// failures and malformed trees are logged and yield a row with empty
/// fields. `tick` is called once per row written.
pub fn extract_dependencies<P, W, F>(
    contexts: &[ContextRecord],
    parser: &mut P,
    prefixes: &PrefixMap,
    writer: &mut RecordWriter<W>,
    mut tick: F,
) -> Result<Stats>
where
    P: DependencyParser + ?Sized,
    W: Write,
    F: FnMut(),
{
    let mut stats = Stats::default();
    for context in contexts {
        stats.lines += 1;
        let trees = match parser.parse(&context.sentence) {
            Ok(trees) => trees,
            Err(e) => {
                warn!("context {}: {}", stats.lines, e);
                Vec::new()
            }
        };
        let extraction = match extract_first(&trees, &context.verb) {
            Ok(extraction) => extraction,
            Err(e) => {
                warn!("context {}: {}", stats.lines, e);
                Extraction::default()
            }
        };
        if extraction.is_empty() {
            debug!("context {}: nothing found for {}", stats.lines, context.verb);
            stats.unparsed += 1;
        } else {
            stats.found += 1;
        }
        if extraction.object.is_some() {
            stats.objects += 1;
        }

        let row = OutputRow::new(context, prefixes.resolve(&context.lemma), extraction);
        writer.write_row(&row)?;
        stats.rows += 1;
        tick();
    }
    writer.flush()?;
    Ok(stats)
}
