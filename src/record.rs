//! Tab-separated context and output rows
//!
//! Fields are written verbatim: a tab inside a sentence is not escaped and
//! will shift the columns of that row. Absent values are written as `None`.

use crate::errors::{Error, Result};
use crate::extract::Extraction;
use std::io::Write;

pub const NONE: &str = "None";

/// A matched verb in its sentence, one row of the context file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextRecord {
    pub sentence: String,
    /// Second column; the contexts stage writes the matched token index here
    pub sentence_id: String,
    /// Verb as written in the sentence
    pub verb: String,
    /// Verb lemma (or normal form) used for prefix lookup
    pub lemma: String,
}

impl ContextRecord {
    /// Parse a context row; columns past the fourth are ignored
    pub fn parse(line: &str, line_num: usize) -> Result<Self> {
        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() < 4 {
            return Err(Error::malformed_line(
                line_num,
                format!("expected 4 tab-separated columns, found {}", fields.len()),
            ));
        }
        Ok(Self {
            sentence: fields[0].trim().to_string(),
            sentence_id: fields[1].trim().to_string(),
            verb: fields[2].trim().to_string(),
            lemma: fields[3].trim().to_string(),
        })
    }
}

/// One line of the extracted-dependencies file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputRow<'a> {
    pub context: &'a ContextRecord,
    pub prefix: Option<&'a str>,
    pub stem: Option<&'a str>,
    pub extraction: Extraction<'a>,
}

impl<'a> OutputRow<'a> {
    pub fn new(
        context: &'a ContextRecord,
        (prefix, stem): (Option<&'a str>, Option<&'a str>),
        extraction: Extraction<'a>,
    ) -> Self {
        Self {
            context,
            prefix,
            stem,
            extraction,
        }
    }

    /// Column values in output order
    pub fn fields(&self) -> [&'a str; 11] {
        let e = &self.extraction;
        [
            &self.context.sentence,
            &self.context.sentence_id,
            &self.context.verb,
            &self.context.lemma,
            self.prefix.unwrap_or(NONE),
            self.stem.unwrap_or(NONE),
            e.subject_form().unwrap_or(NONE),
            e.preposition_form().unwrap_or(NONE),
            e.object_form().unwrap_or(NONE),
            e.object_case.unwrap_or(NONE),
            e.object_lemma.unwrap_or(NONE),
        ]
    }
}

/// Writes rows to any `Write`, one per line
pub struct RecordWriter<W: Write> {
    inner: W,
    rows: usize,
}

impl<W: Write> RecordWriter<W> {
    pub fn new(inner: W) -> Self {
        Self { inner, rows: 0 }
    }

    pub fn write_context(&mut self, record: &ContextRecord) -> Result<()> {
        self.write_fields(&[
            &record.sentence,
            &record.sentence_id,
            &record.verb,
            &record.lemma,
        ])
    }

    pub fn write_row(&mut self, row: &OutputRow) -> Result<()> {
        self.write_fields(&row.fields())
    }

    fn write_fields(&mut self, fields: &[&str]) -> Result<()> {
        writeln!(self.inner, "{}", fields.join("\t"))?;
        self.rows += 1;
        Ok(())
    }

    /// Rows written so far
    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn flush(&mut self) -> Result<()> {
        self.inner.flush()?;
        Ok(())
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}
