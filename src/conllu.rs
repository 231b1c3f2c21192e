//! CoNLL-U file parsing
//!
//! Reads CoNLL-U (plain or gzip-compressed) into [`Tree`]s, one per
//! blank-line separated block. The reader is lenient: rows it cannot score
//! are dropped and counted in [`ReadStats`] instead of failing the sentence.
//!
//! - `#` lines are comments; `# key = value` pairs become sentence metadata
//! - rows whose ID is a range (`3-4`) or decimal (`3.1`) are excluded
//! - rows with fewer than 8 columns, or a non-numeric ID or HEAD, are malformed
//!
//! CoNLL-U format: https://universaldependencies.org/format.html

use crate::bytes::{self, DEPREL, FEATS, FORM, HEAD, ID, MIN_COLUMNS, UPOS};
use crate::tree::{Features, TokenId, Tree, Word};
use bstr::ByteSlice;
use flate2::read::MultiGzDecoder;
use std::collections::HashMap;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Cursor};
use std::path::Path;
use thiserror::Error;

/// Error during CoNLL-U reading
///
/// Only I/O failures are errors; bad rows are counted, not raised.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("I/O error at line {line_num}: {source}")]
    Io {
        line_num: usize,
        #[source]
        source: io::Error,
    },
}

/// Row and sentence counts gathered while reading
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReadStats {
    pub sentences: usize,
    /// Rows turned into words
    pub tokens: usize,
    /// Multiword ranges and empty nodes
    pub excluded_rows: usize,
    /// Rows dropped for missing columns or unparsable numbers
    pub malformed_rows: usize,
    pub comment_lines: usize,
}

impl ReadStats {
    pub fn merge(&mut self, other: &ReadStats) {
        self.sentences += other.sentences;
        self.tokens += other.tokens;
        self.excluded_rows += other.excluded_rows;
        self.malformed_rows += other.malformed_rows;
        self.comment_lines += other.comment_lines;
    }

    /// Every data row read, whatever became of it
    pub fn data_rows(&self) -> usize {
        self.tokens + self.excluded_rows + self.malformed_rows
    }
}

/// CoNLL-U reader that iterates over sentences
pub struct CoNLLUReader<R: BufRead> {
    reader: R,
    buf: Vec<u8>,
    line_num: usize,
    stats: ReadStats,
    done: bool,
}

impl CoNLLUReader<Box<dyn BufRead + Send>> {
    /// Create a reader from a file path
    ///
    /// Files ending in `.gz` are decompressed on the fly.
    pub fn from_file(path: &Path) -> io::Result<Self> {
        let file = File::open(path)?;
        let reader: Box<dyn BufRead + Send> =
            if path.extension().is_some_and(|ext| ext == "gz") {
                Box::new(BufReader::new(MultiGzDecoder::new(file)))
            } else {
                Box::new(BufReader::new(file))
            };
        Ok(Self::new(reader))
    }
}

impl CoNLLUReader<Cursor<Vec<u8>>> {
    /// Create a reader from a string
    pub fn from_string(text: &str) -> Self {
        Self::new(Cursor::new(text.as_bytes().to_vec()))
    }
}

impl<R: BufRead> CoNLLUReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buf: Vec::with_capacity(256),
            line_num: 0,
            stats: ReadStats::default(),
            done: false,
        }
    }

    /// Counts for everything read so far
    pub fn stats(&self) -> &ReadStats {
        &self.stats
    }
}

impl<R: BufRead> Iterator for CoNLLUReader<R> {
    type Item = Result<Tree, ParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let mut tree = Tree::new();
        let mut metadata = HashMap::new();
        let mut sentence_text = None;
        // data rows seen, including dropped ones; a block of only
        // dropped rows still counts as a sentence so positions line up
        let mut rows = 0;

        loop {
            self.buf.clear();
            self.line_num += 1;
            match self.reader.read_until(b'\n', &mut self.buf) {
                Ok(0) => {
                    self.done = true;
                    if rows == 0 {
                        return None;
                    }
                    break;
                }
                Ok(_) => {}
                Err(source) => {
                    self.done = true;
                    return Some(Err(ParseError::Io {
                        line_num: self.line_num,
                        source,
                    }));
                }
            }

            let line = bytes::chomp(&self.buf);

            if bytes::is_blank(line) {
                if rows > 0 {
                    break;
                }
                continue;
            }

            if bytes::is_comment(line) {
                self.stats.comment_lines += 1;
                parse_comment(&line[1..], &mut metadata, &mut sentence_text);
                continue;
            }

            rows += 1;
            match parse_line(line) {
                Row::Word(word) => {
                    self.stats.tokens += 1;
                    tree.words.push(word);
                }
                Row::Excluded => self.stats.excluded_rows += 1,
                Row::Malformed(reason) => {
                    self.stats.malformed_rows += 1;
                    log::warn!("line {}: skipping malformed row ({})", self.line_num, reason);
                }
            }
        }

        self.stats.sentences += 1;
        tree.sentence_text = sentence_text;
        tree.metadata = metadata;
        Some(Ok(tree))
    }
}

/// Outcome of reading one data row
#[derive(Debug)]
enum Row {
    Word(Word),
    Excluded,
    Malformed(String),
}

/// Parse a comment line (after the `#`)
fn parse_comment(
    comment: &[u8],
    metadata: &mut HashMap<String, String>,
    sentence_text: &mut Option<String>,
) {
    if let Some((key, value)) = bytes::bs_split_once(comment, b'=') {
        let key = key.trim().to_str_lossy();
        let value = value.trim().to_str_lossy().into_owned();
        if key == "text" {
            *sentence_text = Some(value);
        } else {
            metadata.insert(key.into_owned(), value);
        }
    }
}

/// Parse a single data row
fn parse_line(line: &[u8]) -> Row {
    let fields = bytes::split_fields(line);

    if fields.len() < MIN_COLUMNS {
        return Row::Malformed(format!(
            "expected at least {} fields, found {}",
            MIN_COLUMNS,
            fields.len()
        ));
    }

    let id = match parse_id(fields[ID]) {
        Some(TokenId::Single(id)) => id,
        Some(_) => return Row::Excluded,
        None => {
            return Row::Malformed(format!("invalid ID {:?}", fields[ID].as_bstr()));
        }
    };

    let Some(head) = bytes::parse_usize(fields[HEAD]) else {
        return Row::Malformed(format!("invalid HEAD {:?}", fields[HEAD].as_bstr()));
    };

    let text = |i: usize| fields[i].to_str_lossy().into_owned();
    let word = Word {
        id,
        form: text(FORM),
        upos: text(UPOS),
        feats: Features::parse(&fields[FEATS].to_str_lossy()),
        head,
        deprel: text(DEPREL),
    };
    Row::Word(word)
}

/// Parse ID field (can be integer, range, or decimal)
fn parse_id(s: &[u8]) -> Option<TokenId> {
    if let Some((start, end)) = bytes::bs_split_once(s, b'-') {
        Some(TokenId::Range(
            bytes::parse_usize(start)?,
            bytes::parse_usize(end)?,
        ))
    } else if let Some((main, sub)) = bytes::bs_split_once(s, b'.') {
        Some(TokenId::Decimal(
            bytes::parse_usize(main)?,
            bytes::parse_usize(sub)?,
        ))
    } else {
        bytes::parse_usize(s).map(TokenId::Single)
    }
}
