//! External dependency parser interface
//!
//! The parser itself lives outside this crate. Anything that turns sentence
//! text into a [`Tree`] can be plugged in through [`DependencyParser`];
//! [`CachedParser`] wraps one so repeated runs over the same corpus parse
//! each distinct sentence once. [`CommandParser`] runs any program that
//! reads a sentence on stdin and writes CoNLL-U on stdout.

use crate::conllu::CoNLLUReader;
use crate::tree::Tree;
use rustc_hash::FxHashMap;
use std::io::{self, Write};
use std::process::{Command, Stdio};
use std::sync::{Arc, Mutex};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParserError {
    /// The model or resource the parser needs is missing; nothing can be parsed
    #[error("parser unavailable: {0}")]
    Unavailable(String),
    /// This one sentence could not be parsed
    #[error("failed to parse {text:?}: {message}")]
    Failed { text: String, message: String },
}

/// Turns plain sentence text into a dependency tree
///
/// Implementations are created once and shared across all sentences of a
/// run, possibly from several threads.
pub trait DependencyParser: Send + Sync {
    fn parse(&self, text: &str) -> Result<Tree, ParserError>;
}

/// Memoizes another parser by input text
///
/// Only successful parses are cached.
pub struct CachedParser<P> {
    inner: P,
    cache: Mutex<FxHashMap<String, Arc<Tree>>>,
}

impl<P: DependencyParser> CachedParser<P> {
    pub fn new(inner: P) -> Self {
        Self {
            inner,
            cache: Mutex::new(FxHashMap::default()),
        }
    }

    /// Number of distinct sentences cached
    pub fn len(&self) -> usize {
        self.cache.lock().map(|c| c.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn cached(&self, text: &str) -> Option<Arc<Tree>> {
        self.cache.lock().ok()?.get(text).cloned()
    }
}

impl<P: DependencyParser> DependencyParser for CachedParser<P> {
    fn parse(&self, text: &str) -> Result<Tree, ParserError> {
        if let Some(tree) = self.cached(text) {
            return Ok((*tree).clone());
        }
        // parse outside the lock; two threads may race on the same text,
        // which only costs a duplicate parse
        let tree = self.inner.parse(text)?;
        if let Ok(mut cache) = self.cache.lock() {
            cache.insert(text.to_string(), Arc::new(tree.clone()));
        }
        Ok(tree)
    }
}

/// Exit status a parser program uses to say its model or resources are
/// missing (`EX_UNAVAILABLE` from sysexits.h)
pub const UNAVAILABLE_STATUS: i32 = 69;

/// Runs an external program per sentence
///
/// The sentence text goes to the program's stdin; the first sentence of the
/// CoNLL-U it prints is the parse. A program that cannot be started, or
/// that exits with [`UNAVAILABLE_STATUS`], makes the parser
/// [`ParserError::Unavailable`]; any other failure is per sentence.
#[derive(Debug, Clone)]
pub struct CommandParser {
    program: String,
    args: Vec<String>,
}

impl CommandParser {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// Build from a whitespace-separated command line
    pub fn from_command_line(command: &str) -> Result<Self, ParserError> {
        let mut parts = command.split_whitespace().map(str::to_string);
        let program = parts
            .next()
            .ok_or_else(|| ParserError::Unavailable("empty parser command".to_string()))?;
        Ok(Self::new(program, parts.collect()))
    }

    fn failed(&self, text: &str, message: impl Into<String>) -> ParserError {
        ParserError::Failed {
            text: text.to_string(),
            message: message.into(),
        }
    }
}

impl DependencyParser for CommandParser {
    fn parse(&self, text: &str) -> Result<Tree, ParserError> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| match e.kind() {
                io::ErrorKind::NotFound | io::ErrorKind::PermissionDenied => {
                    ParserError::Unavailable(format!("{}: {}", self.program, e))
                }
                _ => self.failed(text, e.to_string()),
            })?;

        let written = match child.stdin.take() {
            Some(mut stdin) => stdin
                .write_all(text.as_bytes())
                .and_then(|_| stdin.write_all(b"\n")),
            None => Ok(()),
        };
        if written.is_err() {
            // the child stopped reading; make sure it exits before reaping it
            let _ = child.kill();
        }

        let output = child
            .wait_with_output()
            .map_err(|e| self.failed(text, e.to_string()))?;
        if output.status.code() == Some(UNAVAILABLE_STATUS) {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ParserError::Unavailable(format!(
                "{}: {}",
                self.program,
                stderr.trim()
            )));
        }
        written.map_err(|e| self.failed(text, e.to_string()))?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(self.failed(text, format!("{}: {}", output.status, stderr.trim())));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        match CoNLLUReader::from_string(&stdout).next() {
            Some(Ok(tree)) => Ok(tree),
            Some(Err(e)) => Err(self.failed(text, e.to_string())),
            None => Err(self.failed(text, "no sentence in parser output")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::Word;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Attaches every word to the first one
    struct FlatParser {
        calls: AtomicUsize,
    }

    impl DependencyParser for FlatParser {
        fn parse(&self, text: &str) -> Result<Tree, ParserError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if text.is_empty() {
                return Err(ParserError::Failed {
                    text: text.to_string(),
                    message: "empty input".to_string(),
                });
            }
            let words = text
                .split(' ')
                .enumerate()
                .map(|(i, form)| {
                    let (head, deprel) = if i == 0 { (0, "root") } else { (1, "dep") };
                    Word::new(i + 1, form, "X", head, deprel)
                })
                .collect();
            Ok(Tree::from_words(words))
        }
    }

    #[test]
    fn test_cache_hits() {
        let parser = CachedParser::new(FlatParser {
            calls: AtomicUsize::new(0),
        });

        let first = parser.parse("राम गया").unwrap();
        let second = parser.parse("राम गया").unwrap();
        parser.parse("सीता आई").unwrap();

        assert_eq!(first, second);
        assert_eq!(parser.len(), 2);
        assert_eq!(parser.inner.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_failures_not_cached() {
        let parser = CachedParser::new(FlatParser {
            calls: AtomicUsize::new(0),
        });

        assert!(parser.parse("").is_err());
        assert!(parser.parse("").is_err());
        assert!(parser.is_empty());
        assert_eq!(parser.inner.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_missing_program_is_unavailable() {
        let parser = CommandParser::from_command_line("depscore-no-such-parser --lang hi").unwrap();

        assert!(matches!(
            parser.parse("राम गया"),
            Err(ParserError::Unavailable(_))
        ));
        assert!(CommandParser::from_command_line("   ").is_err());
    }

    #[cfg(unix)]
    #[test]
    fn test_command_output_is_read_as_conllu() {
        // cat echoes the row back, standing in for a real parser
        let parser = CommandParser::from_command_line("cat").unwrap();
        let tree = parser.parse("1\tगया\tजा\tVERB\t_\t_\t0\troot\t_\t_").unwrap();

        assert_eq!(tree.len(), 1);
        assert_eq!(tree.words[0].form, "गया");
        assert!(tree.words[0].is_root());
    }

    #[cfg(unix)]
    #[test]
    fn test_unavailable_exit_status() {
        let script = format!("cat >/dev/null; echo 'hi model missing' >&2; exit {UNAVAILABLE_STATUS}");
        let parser = CommandParser::new("sh", vec!["-c".to_string(), script]);

        match parser.parse("राम गया") {
            Err(ParserError::Unavailable(message)) => assert!(message.contains("hi model missing")),
            other => panic!("expected Unavailable, got {:?}", other),
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_other_exit_status_is_per_sentence() {
        let parser = CommandParser::new("sh", vec!["-c".to_string(), "cat >/dev/null; exit 1".to_string()]);

        assert!(matches!(
            parser.parse("राम गया"),
            Err(ParserError::Failed { .. })
        ));
    }

    #[cfg(unix)]
    #[test]
    fn test_child_that_stops_reading() {
        // `true` exits without reading, so writing a long sentence fails
        let parser = CommandParser::from_command_line("true").unwrap();
        let text = "राम ".repeat(100_000);

        assert!(matches!(parser.parse(&text), Err(ParserError::Failed { .. })));
    }
}
