//! CoNLL-U file parsing
//!
//! Parses the output of an external UD parser (Stanza, UDPipe, ...) into
//! `Tree`s. Multiword token ranges and empty nodes are skipped; they carry
//! no basic dependency edges.
//!
//! CoNLL-U format: https://universaldependencies.org/format.html

use crate::tree::{Features, Tree, Word, WordId};
use flate2::read::MultiGzDecoder;
use memchr::memchr_iter;
use rustc_hash::FxHashMap;
use std::fs::File;
use std::io::{BufRead, BufReader, Cursor, Lines};
use std::path::Path;

/// Error during CoNLL-U parsing
#[derive(Debug)]
pub struct ParseError {
    pub line_num: usize,
    pub message: String,
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Parse error at line {}: {}", self.line_num, self.message)
    }
}

impl std::error::Error for ParseError {}

/// CoNLL-U reader that iterates over sentences
pub struct CoNLLUReader<R: BufRead> {
    lines: Lines<R>,
    line_num: usize,
}

impl<R: BufRead> CoNLLUReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
            line_num: 0,
        }
    }
}

impl CoNLLUReader<Box<dyn BufRead>> {
    /// Create a reader from a file path; `.gz` files are decompressed on the fly
    pub fn from_file(path: &Path) -> std::io::Result<Self> {
        let file = File::open(path)?;
        let reader: Box<dyn BufRead> = if path.extension().is_some_and(|ext| ext == "gz") {
            Box::new(BufReader::new(MultiGzDecoder::new(file)))
        } else {
            Box::new(BufReader::new(file))
        };
        Ok(Self::new(reader))
    }
}

impl CoNLLUReader<Cursor<Vec<u8>>> {
    /// Create a reader from a string
    pub fn from_str(text: &str) -> Self {
        Self::new(Cursor::new(text.as_bytes().to_vec()))
    }
}

impl<R: BufRead> Iterator for CoNLLUReader<R> {
    type Item = Result<Tree, ParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut tree_lines = Vec::new();
        let mut metadata = FxHashMap::default();
        let mut sentence_text = None;

        // Read lines until we hit a blank line (sentence boundary) or EOF
        loop {
            match self.lines.next() {
                None => {
                    if tree_lines.is_empty() {
                        return None;
                    }
                    // Last sentence without trailing blank line
                    break;
                }
                Some(Err(e)) => {
                    self.line_num += 1;
                    return Some(Err(ParseError {
                        line_num: self.line_num,
                        message: format!("IO error: {}", e),
                    }));
                }
                Some(Ok(line)) => {
                    self.line_num += 1;
                    let line = line.trim();

                    if line.is_empty() {
                        if !tree_lines.is_empty() {
                            break;
                        }
                        continue;
                    }

                    if let Some(comment) = line.strip_prefix('#') {
                        parse_comment(comment, &mut metadata, &mut sentence_text);
                        continue;
                    }

                    tree_lines.push((self.line_num, line.to_string()));
                }
            }
        }

        Some(parse_tree(tree_lines, sentence_text, metadata))
    }
}

/// Parse a comment line (starts with #)
fn parse_comment(
    comment: &str,
    metadata: &mut FxHashMap<String, String>,
    sentence_text: &mut Option<String>,
) {
    if let Some((key, value)) = comment.split_once('=') {
        let key = key.trim();
        let value = value.trim();

        if key == "text" {
            *sentence_text = Some(value.to_string());
        } else {
            metadata.insert(key.to_string(), value.to_string());
        }
    }
}

/// Parse accumulated lines into a Tree
fn parse_tree(
    lines: Vec<(usize, String)>,
    sentence_text: Option<String>,
    metadata: FxHashMap<String, String>,
) -> Result<Tree, ParseError> {
    let mut tree = Tree::with_metadata(sentence_text, metadata);

    for (line_num, line) in lines {
        if let Some(word) = parse_line(&line, line_num)? {
            tree.add_word(word);
        }
    }

    Ok(tree)
}

/// Split a token line into its ten tab-separated columns
fn split_fields(line: &str, line_num: usize) -> Result<[&str; 10], ParseError> {
    let mut fields = [""; 10];
    let mut start = 0;
    let mut n = 0;
    for pos in memchr_iter(b'\t', line.as_bytes()).chain(std::iter::once(line.len())) {
        if n == 10 {
            n += 1;
            break;
        }
        fields[n] = &line[start..pos];
        n += 1;
        start = pos + 1;
    }
    if n != 10 {
        let found = line.split('\t').count();
        return Err(ParseError {
            line_num,
            message: format!("Expected 10 fields, found {}", found),
        });
    }
    Ok(fields)
}

/// Parse a single CoNLL-U line into a Word
/// Returns None for multiword tokens and empty nodes
fn parse_line(line: &str, line_num: usize) -> Result<Option<Word>, ParseError> {
    let fields = split_fields(line, line_num)?;

    // Field 0: ID; ranges (1-2) and empty nodes (2.1) are skipped
    if fields[0].contains(['-', '.']) {
        return Ok(None);
    }
    let id = parse_id(fields[0], line_num)?;

    let form = fields[1];
    let lemma = if fields[2] == "_" { form } else { fields[2] };

    Ok(Some(Word {
        id,
        form: form.to_string(),
        lemma: lemma.to_string(),
        upos: fields[3].to_string(),
        feats: Features::parse(fields[5]),
        head: parse_head(fields[6], line_num)?,
        deprel: fields[7].to_string(),
    }))
}

fn parse_id(s: &str, line_num: usize) -> Result<WordId, ParseError> {
    match s.parse() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(ParseError {
            line_num,
            message: format!("Invalid ID: {}", s),
        }),
    }
}

/// Parse HEAD field (0 or `_` is the root)
fn parse_head(s: &str, line_num: usize) -> Result<Option<WordId>, ParseError> {
    if s == "0" || s == "_" {
        return Ok(None);
    }
    s.parse().map(Some).map_err(|_| ParseError {
        line_num,
        message: format!("Invalid HEAD: {}", s),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const PISHOV: &str = "# sent_id = 42
# text = він швидко пішов до школи
1\tвін\tвін\tPRON\t_\tCase=Nom|Number=Sing\t3\tnsubj\t_\t_
2\tшвидко\tшвидко\tADV\t_\t_\t3\tadvmod\t_\t_
3\tпішов\tпіти\tVERB\t_\tAspect=Perf\t0\troot\t_\t_
4\tдо\tдо\tADP\t_\t_\t5\tcase\t_\t_
5\tшколи\tшкола\tNOUN\t_\tCase=Gen|Number=Sing\t3\tobl\t_\tSpaceAfter=No

";

    #[test]
    fn test_parse_simple_sentence() {
        let mut reader = CoNLLUReader::from_str(PISHOV);
        let tree = reader.next().unwrap().unwrap();

        assert_eq!(tree.len(), 5);
        assert_eq!(
            tree.sentence_text.as_deref(),
            Some("він швидко пішов до школи")
        );
        assert_eq!(tree.metadata.get("sent_id").map(String::as_str), Some("42"));

        let verb = tree.word(3).unwrap();
        assert_eq!(verb.form, "пішов");
        assert_eq!(verb.lemma, "піти");
        assert_eq!(verb.head, None);

        let noun = tree.word(5).unwrap();
        assert_eq!(noun.head, Some(3));
        assert_eq!(noun.deprel, "obl");
        assert_eq!(noun.feats.get("Case"), Some("Gen"));

        assert!(reader.next().is_none());
    }

    #[test]
    fn test_multiple_sentences_without_trailing_blank() {
        let text = "1\tйде\tйти\tVERB\t_\t_\t0\troot\t_\t_\n\n\
                    1\tбіжить\tбігти\tVERB\t_\t_\t0\troot\t_\t_";
        let trees: Vec<_> = CoNLLUReader::from_str(text)
            .collect::<Result<_, _>>()
            .unwrap();

        assert_eq!(trees.len(), 2);
        assert_eq!(trees[1].words[0].lemma, "бігти");
    }

    #[test]
    fn test_skips_multiword_and_empty_nodes() {
        let text = "1-2\tdel\t_\t_\t_\t_\t_\t_\t_\t_\n\
                    1\tde\tde\tADP\t_\t_\t2\tcase\t_\t_\n\
                    2\tel\tel\tDET\t_\t_\t0\troot\t_\t_\n\
                    2.1\tx\tx\tX\t_\t_\t_\t_\t_\t_\n";
        let tree = CoNLLUReader::from_str(text).next().unwrap().unwrap();

        assert_eq!(tree.len(), 2);
        assert_eq!(tree.words[0].form, "de");
    }

    #[test]
    fn test_wrong_field_count() {
        let text = "# text = broken\n1\tword\tword\n";
        let err = CoNLLUReader::from_str(text).next().unwrap().unwrap_err();

        assert_eq!(err.line_num, 2);
        assert!(err.message.contains("found 3"));
    }

    #[test]
    fn test_lemma_defaults_to_form() {
        let text = "1\tпішов\t_\tVERB\t_\t_\t0\troot\t_\t_\n";
        let tree = CoNLLUReader::from_str(text).next().unwrap().unwrap();
        assert_eq!(tree.words[0].lemma, "пішов");
    }

    #[test]
    fn test_parse_head() {
        assert_eq!(parse_head("0", 1).unwrap(), None);
        assert_eq!(parse_head("_", 1).unwrap(), None);
        assert_eq!(parse_head("5", 1).unwrap(), Some(5));
        assert!(parse_head("x", 1).is_err());
    }

    #[test]
    fn test_from_gzip_file() {
        use flate2::Compression;
        use flate2::write::GzEncoder;
        use std::io::Write;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sample.conllu.gz");
        let mut enc = GzEncoder::new(File::create(&path).unwrap(), Compression::default());
        enc.write_all(PISHOV.as_bytes()).unwrap();
        enc.finish().unwrap();

        let trees: Vec<_> = CoNLLUReader::from_file(&path)
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(trees.len(), 1);
        assert_eq!(trees[0].words[4].form, "школи");
    }
}
