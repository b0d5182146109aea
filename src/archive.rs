//! Streaming line access to corpus files
//!
//! The format is chosen by file name alone:
//! - `*.tar.gz`: every regular file in a gzip-compressed tarball, in archive order
//! - `*.bz2`: a bzip2-compressed text stream
//! - anything else: plain UTF-8 text
//!
//! Lines are decoded and trimmed one at a time; nothing is buffered beyond the
//! decoder's own window. Dropping the iterator closes the file.

use crate::errors::{Error, Result};
use bstr::ByteSlice;
use bzip2::read::MultiBzDecoder;
use flate2::read::GzDecoder;
use log::{debug, trace};
use std::fs::File;
use std::io::{self, BufRead, BufReader, Read, Take};
use std::path::Path;

const BLOCK_SIZE: u64 = 512;

/// Compression and container format of a corpus file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Plain,
    TarGz,
    Bzip2,
}

impl Format {
    pub fn detect(path: &Path) -> Self {
        let name = path.to_string_lossy();
        if name.ends_with(".tar.gz") {
            Format::TarGz
        } else if name.ends_with(".bz2") {
            Format::Bzip2
        } else {
            Format::Plain
        }
    }
}

/// Open a corpus file and stream its lines
pub fn open_lines(path: impl AsRef<Path>) -> Result<CorpusLines> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| Error::missing(path, e))?;
    let format = Format::detect(path);
    debug!("reading {} as {:?}", path.display(), format);

    let source = match format {
        Format::Plain => Source::Text(Box::new(BufReader::new(file))),
        Format::Bzip2 => Source::Text(Box::new(BufReader::new(MultiBzDecoder::new(file)))),
        Format::TarGz => Source::Tar(TarMembers::new(GzDecoder::new(file))),
    };
    Ok(CorpusLines {
        source,
        line_num: 0,
    })
}

enum Source {
    Text(Box<dyn BufRead>),
    Tar(TarMembers<GzDecoder<File>>),
}

/// Lazy sequence of decoded, trimmed lines
pub struct CorpusLines {
    source: Source,
    line_num: usize,
}

impl CorpusLines {
    /// Number of lines yielded so far
    pub fn line_num(&self) -> usize {
        self.line_num
    }
}

impl Iterator for CorpusLines {
    type Item = Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        let next = match &mut self.source {
            Source::Text(reader) => read_line(reader),
            Source::Tar(members) => members.next_line(),
        };
        let bytes = match next? {
            Ok(bytes) => bytes,
            Err(e) => return Some(Err(e.into())),
        };
        self.line_num += 1;
        Some(decode(&bytes, self.line_num))
    }
}

/// Read one `\n`-terminated line, without the terminator
fn read_line<B: BufRead + ?Sized>(reader: &mut B) -> Option<io::Result<Vec<u8>>> {
    let mut line = Vec::new();
    match reader.read_until(b'\n', &mut line) {
        Ok(0) => None,
        Ok(_) => {
            if line.last() == Some(&b'\n') {
                line.pop();
            }
            Some(Ok(line))
        }
        Err(e) => Some(Err(e)),
    }
}

fn decode(bytes: &[u8], line_num: usize) -> Result<String> {
    bytes
        .trim()
        .to_str()
        .map(str::to_string)
        .map_err(|_| Error::Encoding { line_num })
}

/// State of a tar stream between and inside members
enum TarState<R: Read> {
    Header(R),
    Member { reader: BufReader<Take<R>>, padding: u64 },
    Done,
}

/// Walks the regular files of a tar stream, owning the decoder throughout.
///
/// Headers are decoded with `tar::Header`; member bodies are read in place,
/// so the archive never has to be seekable or fully unpacked.
struct TarMembers<R: Read> {
    state: TarState<R>,
}

impl<R: Read> TarMembers<R> {
    fn new(inner: R) -> Self {
        Self {
            state: TarState::Header(inner),
        }
    }

    fn next_line(&mut self) -> Option<io::Result<Vec<u8>>> {
        loop {
            match std::mem::replace(&mut self.state, TarState::Done) {
                TarState::Done => return None,
                TarState::Header(inner) => match next_member(inner) {
                    Ok(Some(state)) => self.state = state,
                    Ok(None) => return None,
                    Err(e) => return Some(Err(e)),
                },
                TarState::Member {
                    mut reader,
                    padding,
                } => match read_line(&mut reader) {
                    None => {
                        let mut inner = reader.into_inner().into_inner();
                        if let Err(e) = skip(&mut inner, padding) {
                            return Some(Err(e));
                        }
                        self.state = TarState::Header(inner);
                    }
                    Some(line) => {
                        self.state = TarState::Member { reader, padding };
                        return Some(line);
                    }
                },
            }
        }
    }
}

/// Read headers until the next regular file, skipping other entry types
fn next_member<R: Read>(mut inner: R) -> io::Result<Option<TarState<R>>> {
    loop {
        let mut block = [0u8; BLOCK_SIZE as usize];
        if !read_block(&mut inner, &mut block)? || block.iter().all(|&b| b == 0) {
            return Ok(None);
        }
        let header = tar::Header::from_byte_slice(&block);
        let size = header.entry_size()?;
        let padding = (BLOCK_SIZE - size % BLOCK_SIZE) % BLOCK_SIZE;

        if header.entry_type().is_file() {
            trace!("tar member {}", String::from_utf8_lossy(&header.path_bytes()));
            let reader = BufReader::new(inner.take(size));
            return Ok(Some(TarState::Member { reader, padding }));
        }
        skip(&mut inner, size + padding)?;
    }
}

/// Fill a header block; `false` on a clean end of stream
fn read_block<R: Read>(inner: &mut R, block: &mut [u8]) -> io::Result<bool> {
    let mut filled = 0;
    while filled < block.len() {
        match inner.read(&mut block[filled..])? {
            0 if filled == 0 => return Ok(false),
            0 => {
                return Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "truncated tar header",
                ));
            }
            n => filled += n,
        }
    }
    Ok(true)
}

fn skip<R: Read>(inner: &mut R, n: u64) -> io::Result<()> {
    let skipped = io::copy(&mut inner.by_ref().take(n), &mut io::sink())?;
    if skipped < n {
        return Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            "truncated tar member",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const TEXT: &str = "  перший рядок\nдругий рядок  \n\nтретій\n";

    fn collect(path: &Path) -> Vec<String> {
        open_lines(path)
            .unwrap()
            .collect::<Result<Vec<_>>>()
            .unwrap()
    }

    #[test]
    fn test_format_detection() {
        assert_eq!(Format::detect(Path::new("a/corpus.tar.gz")), Format::TarGz);
        assert_eq!(Format::detect(Path::new("fiction.txt.bz2")), Format::Bzip2);
        assert_eq!(Format::detect(Path::new("sentences.txt")), Format::Plain);
        assert_eq!(Format::detect(Path::new("corpus.gz")), Format::Plain);
    }

    #[test]
    fn test_plain_lines_are_trimmed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("corpus.txt");
        std::fs::write(&path, TEXT).unwrap();

        assert_eq!(
            collect(&path),
            vec!["перший рядок", "другий рядок", "", "третій"]
        );
    }

    #[test]
    fn test_bzip2_matches_plain() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("corpus.txt.bz2");
        let mut enc = bzip2::write::BzEncoder::new(
            File::create(&path).unwrap(),
            bzip2::Compression::default(),
        );
        enc.write_all(TEXT.as_bytes()).unwrap();
        enc.finish().unwrap();

        assert_eq!(
            collect(&path),
            vec!["перший рядок", "другий рядок", "", "третій"]
        );
    }

    #[test]
    fn test_tar_gz_reads_every_file_member() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("corpus.tar.gz");
        let enc = flate2::write::GzEncoder::new(
            File::create(&path).unwrap(),
            flate2::Compression::default(),
        );
        let mut builder = tar::Builder::new(enc);

        let mut dir_header = tar::Header::new_gnu();
        dir_header.set_entry_type(tar::EntryType::Directory);
        dir_header.set_size(0);
        dir_header.set_mode(0o755);
        dir_header.set_cksum();
        builder
            .append_data(&mut dir_header, "texts/", io::empty())
            .unwrap();

        for (name, body) in [("texts/a.txt", TEXT), ("texts/b.txt", "ще один\nі ще")] {
            let mut header = tar::Header::new_gnu();
            header.set_size(body.len() as u64);
            header.set_mode(0o644);
            header.set_cksum();
            builder.append_data(&mut header, name, body.as_bytes()).unwrap();
        }
        builder.into_inner().unwrap().finish().unwrap();

        assert_eq!(
            collect(&path),
            vec![
                "перший рядок",
                "другий рядок",
                "",
                "третій",
                "ще один",
                "і ще"
            ]
        );
    }

    #[test]
    fn test_invalid_utf8_reports_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.txt");
        std::fs::write(&path, b"ok\n\xff\xfe\n").unwrap();

        let results: Vec<_> = open_lines(&path).unwrap().collect();
        assert!(results[0].is_ok());
        assert!(matches!(results[1], Err(Error::Encoding { line_num: 2 })));
    }

    #[test]
    fn test_missing_file() {
        let err = open_lines("/nonexistent/corpus.txt").err().unwrap();
        assert!(matches!(err, Error::MissingResource { .. }));
    }
}
