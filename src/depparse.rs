//! Sources of dependency parses
//!
//! Tokenization, tagging, lemmatization and parsing are done by an external
//! UD parser. Its output reaches us as CoNLL-U, either from a treebank file
//! parsed ahead of time or from a parser command run once over all context
//! sentences. A parser may split one input sentence into several trees, so
//! every lookup yields a run of consecutive trees.

use crate::conllu::{CoNLLUReader, ParseError};
use crate::errors::{Error, Result};
use crate::tree::Tree;
use log::{debug, info, warn};
use rustc_hash::FxHashMap;
use std::io::{self, BufRead, BufReader, BufWriter, Cursor, Write};
use std::ops::Range;
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, Command, Stdio};
use std::thread;

/// Longest run of trees one input sentence may be split into
const MAX_SPLIT: usize = 4;

/// Anything that turns sentence text into dependency trees
pub trait DependencyParser {
    /// Every tree the sentence was split into, in order; empty if unparsed
    fn parse(&mut self, sentence: &str) -> Result<Vec<Tree>>;
}

/// Lookup key of a sentence: its text with all whitespace removed.
///
/// Tokenizers differ in where they put spaces (`школи.` vs `школи .`) and
/// split sentences are joined without a separator, so only the
/// non-whitespace characters are compared.
fn text_key(text: &str) -> String {
    text.split_whitespace().collect()
}

/// Pre-parsed sentences looked up by their text
///
/// A tree is found by its `# text` comment, or by its forms when the comment
/// is missing. Runs of up to four consecutive trees are also found by their
/// joined text, which serves sentences the parser split. The first match for
/// a text wins. Sentences with no parse come back as no trees.
#[derive(Debug, Clone, Default)]
pub struct Treebank {
    trees: Vec<Tree>,
    index: FxHashMap<String, Range<usize>>,
    misses: usize,
}

impl Treebank {
    /// Load a CoNLL-U file (`.gz` is decompressed)
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_paths(&[path.as_ref().to_path_buf()])
    }

    /// Load several CoNLL-U files, in the given order
    pub fn from_paths(paths: &[PathBuf]) -> Result<Self> {
        let mut trees = Vec::new();
        for path in paths {
            let reader = CoNLLUReader::from_file(path).map_err(|e| Error::missing(path, e))?;
            let before = trees.len();
            read_trees(reader, &mut trees)?;
            info!("treebank {}: {} sentences", path.display(), trees.len() - before);
        }
        Ok(Self::from_trees(trees))
    }

    pub fn from_conllu(text: &str) -> Result<Self> {
        Self::from_reader(Cursor::new(text.as_bytes()))
    }

    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self> {
        let mut trees = Vec::new();
        read_trees(CoNLLUReader::new(reader), &mut trees)?;
        Ok(Self::from_trees(trees))
    }

    pub fn from_trees(trees: Vec<Tree>) -> Self {
        let keys: Vec<String> = trees.iter().map(|tree| text_key(&tree.text())).collect();
        let mut index = FxHashMap::default();

        // single trees take precedence over joined runs
        for (i, key) in keys.iter().enumerate() {
            if !key.is_empty() {
                index.entry(key.clone()).or_insert(i..i + 1);
            }
        }
        for start in 0..keys.len() {
            let mut joined = keys[start].clone();
            for end in start + 1..keys.len().min(start + MAX_SPLIT) {
                joined.push_str(&keys[end]);
                index.entry(joined.clone()).or_insert(start..end + 1);
            }
        }

        Self {
            trees,
            index,
            misses: 0,
        }
    }

    /// Trees for a sentence, matched on its non-whitespace characters
    pub fn get(&self, sentence: &str) -> Option<&[Tree]> {
        self.index
            .get(&text_key(sentence))
            .map(|range| &self.trees[range.clone()])
    }

    /// Number of trees
    pub fn len(&self) -> usize {
        self.trees.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trees.is_empty()
    }

    /// Lookups that found no parse
    pub fn misses(&self) -> usize {
        self.misses
    }
}

fn read_trees<I>(reader: I, trees: &mut Vec<Tree>) -> Result<()>
where
    I: IntoIterator<Item = std::result::Result<Tree, ParseError>>,
{
    for tree in reader {
        trees.push(tree?);
    }
    Ok(())
}

impl DependencyParser for Treebank {
    fn parse(&mut self, sentence: &str) -> Result<Vec<Tree>> {
        match self.get(sentence) {
            Some(trees) => Ok(trees.to_vec()),
            None => {
                self.misses += 1;
                warn!("no parse for sentence: {}", sentence);
                Ok(Vec::new())
            }
        }
    }
}

/// An external parser process, run once over a batch of sentences
///
/// Sentences are written to the command's stdin, one per line, and CoNLL-U
/// is read from its stdout, e.g. `udpipe --input horizontal --tag --parse
/// ukrainian.udpipe`. The command's stderr goes to ours.
#[derive(Debug, Clone)]
pub struct ParserCommand {
    program: String,
    args: Vec<String>,
}

impl ParserCommand {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// Split a command line on whitespace
    pub fn from_command_line(command: &str) -> Result<Self> {
        let mut parts = command.split_whitespace().map(str::to_string);
        let program = parts
            .next()
            .ok_or_else(|| Error::Parser("empty parser command".to_string()))?;
        Ok(Self::new(program, parts.collect()))
    }

    /// Parse all sentences with one run of the command.
    ///
    /// The output is indexed as a [`Treebank`], so each sentence is found
    /// again by its text whether the parser kept it whole or split it.
    pub fn parse_all<S: AsRef<str> + Sync>(&self, sentences: &[S]) -> Result<Treebank> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|e| Error::Parser(format!("cannot start {}: {}", self.program, e)))?;
        debug!("started {} for {} sentences", self.program, sentences.len());

        let treebank = match self.exchange(&mut child, sentences) {
            Ok(treebank) => treebank,
            Err(e) => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(e);
            }
        };

        let status = child.wait()?;
        if !status.success() {
            return Err(Error::Parser(format!(
                "{} exited with {}",
                self.program, status
            )));
        }
        info!("{}: {} trees", self.program, treebank.len());
        Ok(treebank)
    }

    /// Feed stdin from a second thread while stdout is read, so neither pipe
    /// can fill up and stall the parser.
    fn exchange<S: AsRef<str> + Sync>(&self, child: &mut Child, sentences: &[S]) -> Result<Treebank> {
        let stdin = child.stdin.take();
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| Error::Parser(format!("no stdout from {}", self.program)))?;

        thread::scope(|scope| -> Result<Treebank> {
            let feeder = scope.spawn(move || match stdin {
                Some(stdin) => feed(stdin, sentences),
                None => Ok(()),
            });
            let treebank = Treebank::from_reader(BufReader::new(stdout));
            if treebank.is_err() {
                // unblocks the feeder
                let _ = child.kill();
            }
            let fed = feeder
                .join()
                .map_err(|_| Error::Parser("stdin writer panicked".to_string()))?;
            let treebank = treebank?;
            // a parser that stops reading early is judged by its exit status
            match fed {
                Err(e) if e.kind() != io::ErrorKind::BrokenPipe => Err(e.into()),
                _ => Ok(treebank),
            }
        })
    }
}

fn feed<S: AsRef<str>>(stdin: ChildStdin, sentences: &[S]) -> io::Result<()> {
    let mut stdin = BufWriter::new(stdin);
    for sentence in sentences {
        writeln!(stdin, "{}", sentence.as_ref())?;
    }
    stdin.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::extract_first;

    const TWO_SENTENCES: &str = "# text = він пішов до школи
1\tвін\tвін\tPRON\t_\t_\t2\tnsubj\t_\t_
2\tпішов\tпіти\tVERB\t_\t_\t0\troot\t_\t_
3\tдо\tдо\tADP\t_\t_\t4\tcase\t_\t_
4\tшколи\tшкола\tNOUN\t_\tCase=Gen\t2\tobl\t_\t_

1\tвона\tвона\tPRON\t_\t_\t2\tnsubj\t_\t_
2\tбіжить\tбігти\tVERB\t_\t_\t0\troot\t_\t_

";

    /// One input line the parser split after the abbreviation `р.`
    const SPLIT: &str = "# text = У 2019 р.
1\tУ\tу\tADP\t_\t_\t3\tcase\t_\t_
2\t2019\t2019\tADJ\t_\t_\t3\tamod\t_\t_
3\tр.\tрік\tNOUN\t_\tCase=Loc\t0\troot\t_\t_

# text = він пішов до школи.
1\tвін\tвін\tPRON\t_\tCase=Nom\t2\tnsubj\t_\t_
2\tпішов\tпіти\tVERB\t_\t_\t0\troot\t_\t_
3\tдо\tдо\tADP\t_\t_\t4\tcase\t_\t_
4\tшколи\tшкола\tNOUN\t_\tCase=Gen\t2\tobl\t_\t_
5\t.\t.\tPUNCT\t_\t_\t2\tpunct\t_\t_

";

    #[test]
    fn test_treebank_lookup_by_text() {
        let mut treebank = Treebank::from_conllu(TWO_SENTENCES).unwrap();
        assert_eq!(treebank.len(), 2);

        let trees = treebank.parse("він пішов до школи").unwrap();
        assert_eq!(trees.len(), 1);
        assert_eq!(trees[0].len(), 4);

        // no `# text` comment: keyed by forms
        let trees = treebank.parse("вона біжить").unwrap();
        assert_eq!(trees[0].words[1].lemma, "бігти");
    }

    #[test]
    fn test_treebank_ignores_spacing() {
        let treebank = Treebank::from_conllu(TWO_SENTENCES).unwrap();
        assert!(treebank.get("він  пішов до школи ").is_some());
        assert!(treebank.get("вінпішов до школи").is_some());
    }

    #[test]
    fn test_treebank_serves_split_sentence() {
        let mut treebank = Treebank::from_conllu(SPLIT).unwrap();
        let trees = treebank.parse("У 2019 р. він пішов до школи.").unwrap();
        assert_eq!(trees.len(), 2);

        let r = extract_first(&trees, "пішов").unwrap();
        assert_eq!(r.object_form(), Some("школи"));
        assert_eq!(r.preposition_form(), Some("до"));
        assert_eq!(r.subject_form(), Some("він"));

        // each part is still found on its own
        assert_eq!(treebank.parse("У 2019 р.").unwrap().len(), 1);
        assert_eq!(treebank.misses(), 0);
    }

    #[test]
    fn test_treebank_miss_is_empty() {
        let mut treebank = Treebank::from_conllu(TWO_SENTENCES).unwrap();
        assert!(treebank.parse("вони їдуть").unwrap().is_empty());
        assert_eq!(treebank.misses(), 1);
    }

    #[test]
    fn test_treebank_first_tree_wins() {
        let text = "# text = йди\n1\tйди\tйти\tVERB\t_\t_\t0\troot\t_\t_\n\n\
                    # text = йди\n1\tйди\tйди\tNOUN\t_\t_\t0\troot\t_\t_\n\n";
        let treebank = Treebank::from_conllu(text).unwrap();
        assert_eq!(treebank.len(), 2);
        let trees = treebank.get("йди").unwrap();
        assert_eq!(trees.len(), 1);
        assert_eq!(trees[0].words[0].upos, "VERB");
    }

    #[test]
    fn test_treebank_missing_file() {
        let err = Treebank::from_path("/nonexistent/parsed.conllu").unwrap_err();
        assert!(matches!(err, Error::MissingResource { .. }));
    }

    #[test]
    fn test_parser_command_line() {
        let cmd = ParserCommand::from_command_line("udpipe --tokenize --parse uk.udpipe").unwrap();
        assert_eq!(cmd.program, "udpipe");
        assert_eq!(cmd.args, vec!["--tokenize", "--parse", "uk.udpipe"]);
        assert!(ParserCommand::from_command_line("  ").is_err());
    }

    #[cfg(unix)]
    #[test]
    fn test_parser_command_runs_once_for_all_sentences() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("parsed.conllu");
        std::fs::write(&path, format!("{}{}", SPLIT, TWO_SENTENCES)).unwrap();

        // stands in for a real parser: ignores stdin, prints a fixed parse
        let parser = ParserCommand::new("cat", vec![path.display().to_string()]);
        let sentences = ["У 2019 р. він пішов до школи.", "вона біжить"];
        let mut treebank = parser.parse_all(&sentences).unwrap();
        assert_eq!(treebank.len(), 4);

        let trees = treebank.parse(sentences[0]).unwrap();
        let r = extract_first(&trees, "пішов").unwrap();
        assert_eq!(r.object_form(), Some("школи"));
        assert_eq!(treebank.parse(sentences[1]).unwrap().len(), 1);
    }

    #[cfg(unix)]
    #[test]
    fn test_parser_command_reads_sentences_from_stdin() {
        // `cat` echoes the input, which is not CoNLL-U; the parse error must
        // come back without leaving the child behind
        let parser = ParserCommand::new("cat", Vec::new());
        let err = parser.parse_all(&["він пішов до школи"]).unwrap_err();
        assert!(matches!(err, Error::Conllu(_)));
    }

    #[cfg(unix)]
    #[test]
    fn test_parser_command_failure() {
        let parser = ParserCommand::new("false", Vec::new());
        let err = parser.parse_all(&["він пішов"]).unwrap_err();
        assert!(matches!(err, Error::Parser(_)));

        let parser = ParserCommand::new("/nonexistent/udpipe", Vec::new());
        let err = parser.parse_all(&["він пішов"]).unwrap_err();
        assert!(matches!(err, Error::Parser(_)));
    }
}
