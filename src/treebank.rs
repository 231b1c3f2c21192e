//! Loading treebanks from strings, files, and glob patterns
//!
//! A [`Treebank`] names where sentences come from; [`Treebank::load`] reads
//! them all into a [`Corpus`] in order. Files matched by a glob are read in
//! sorted order so runs are reproducible.

use crate::conllu::{CoNLLUReader, ReadStats};
use crate::error::EvalError;
use crate::tree::Tree;
use flate2::read::MultiGzDecoder;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Source of trees for a collection
#[derive(Debug, Clone)]
enum TreeSource {
    /// In-memory CoNLL-U text
    String(String),
    /// One or more file paths (from glob or explicit paths)
    Files(Vec<PathBuf>),
}

/// Sentences read from one source, in order
#[derive(Debug, Clone, Default)]
pub struct Corpus {
    pub trees: Vec<Arc<Tree>>,
    pub stats: ReadStats,
}

impl Corpus {
    pub fn len(&self) -> usize {
        self.trees.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trees.is_empty()
    }

    /// Keep only the first `limit` sentences
    ///
    /// `stats` still describe everything that was read.
    pub fn truncate(&mut self, limit: usize) {
        if limit < self.trees.len() {
            log::info!("using the first {} of {} sentences", limit, self.trees.len());
            self.trees.truncate(limit);
        }
    }
}

/// Collection of trees from a string, file, or glob pattern
#[derive(Debug, Clone)]
pub struct Treebank {
    source: TreeSource,
}

impl Treebank {
    /// Create from an in-memory CoNLL-U string
    pub fn from_string(text: &str) -> Self {
        Self {
            source: TreeSource::String(text.to_string()),
        }
    }

    /// Create from a single file path
    pub fn from_file(path: impl AsRef<Path>) -> Self {
        Self::from_paths(vec![path.as_ref().to_path_buf()])
    }

    /// Create from a glob pattern
    ///
    /// Files are processed in sorted order for deterministic results.
    pub fn from_glob(pattern: &str) -> Result<Self, EvalError> {
        let mut file_paths: Vec<PathBuf> = glob::glob(pattern)?.filter_map(Result::ok).collect();
        if file_paths.is_empty() {
            return Err(EvalError::NoMatch(pattern.to_string()));
        }
        file_paths.sort();
        Ok(Self::from_paths(file_paths))
    }

    /// Create from explicit file paths
    pub fn from_paths(file_paths: Vec<PathBuf>) -> Self {
        Self {
            source: TreeSource::Files(file_paths),
        }
    }

    /// A command-line argument: a glob if it has wildcards, else a path
    pub fn from_arg(arg: &str) -> Result<Self, EvalError> {
        if arg.contains(['*', '?', '[']) {
            Self::from_glob(arg)
        } else {
            Ok(Self::from_file(arg))
        }
    }

    /// Read every sentence
    ///
    /// A file that cannot be opened or read fails the whole load.
    pub fn load(&self) -> Result<Corpus, EvalError> {
        let mut corpus = Corpus::default();
        match &self.source {
            TreeSource::String(text) => {
                let mut reader = CoNLLUReader::from_string(text);
                for tree in reader.by_ref() {
                    let tree = tree.map_err(|source| EvalError::Read {
                        path: PathBuf::from("<string>"),
                        source,
                    })?;
                    corpus.trees.push(Arc::new(tree));
                }
                corpus.stats.merge(reader.stats());
            }
            TreeSource::Files(paths) => {
                for path in paths {
                    let mut reader = CoNLLUReader::from_file(path).map_err(|source| {
                        EvalError::Open {
                            path: path.clone(),
                            source,
                        }
                    })?;
                    for tree in reader.by_ref() {
                        let tree = tree.map_err(|source| EvalError::Read {
                            path: path.clone(),
                            source,
                        })?;
                        corpus.trees.push(Arc::new(tree));
                    }
                    log::info!(
                        "{}: {} sentences, {} tokens",
                        path.display(),
                        reader.stats().sentences,
                        reader.stats().tokens
                    );
                    corpus.stats.merge(reader.stats());
                }
            }
        }
        let stats = &corpus.stats;
        if stats.malformed_rows > 0 {
            log::warn!("{} malformed rows skipped", stats.malformed_rows);
        }
        Ok(corpus)
    }

    /// Raw contents, decompressed and concatenated, for line pairing
    pub fn contents(&self) -> Result<Vec<u8>, EvalError> {
        match &self.source {
            TreeSource::String(text) => Ok(text.as_bytes().to_vec()),
            TreeSource::Files(paths) => {
                let mut bytes = Vec::new();
                for path in paths {
                    read_file(path, &mut bytes).map_err(|source| EvalError::Open {
                        path: path.clone(),
                        source,
                    })?;
                }
                Ok(bytes)
            }
        }
    }
}

fn read_file(path: &Path, buf: &mut Vec<u8>) -> std::io::Result<()> {
    let file = File::open(path)?;
    if path.extension().is_some_and(|ext| ext == "gz") {
        MultiGzDecoder::new(file).read_to_end(buf)?;
    } else {
        let mut file = file;
        file.read_to_end(buf)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::io::Write;
    use tempfile::{TempDir, tempdir};

    const TWO_TREE_CONLLU: &str = "# text = राम गया
1\tराम\tराम\tPROPN\t_\t_\t2\tnsubj\t_\t_
2\tगया\tजा\tVERB\t_\t_\t0\troot\t_\t_

1\tसीता\tसीता\tPROPN\t_\t_\t2\tnsubj\t_\t_
2\tआई\tआ\tVERB\t_\t_\t0\troot\t_\t_
";

    /// Helper to create test files with given content
    fn create_test_files(contents: &[(&str, &str)]) -> (TempDir, Vec<PathBuf>) {
        let dir = tempdir().unwrap();
        let mut paths = Vec::new();

        for (filename, content) in contents {
            let path = dir.path().join(filename);
            let mut file = fs::File::create(&path).unwrap();
            write!(file, "{}", content).unwrap();
            paths.push(path);
        }

        (dir, paths)
    }

    #[test]
    fn test_load_from_string() {
        let corpus = Treebank::from_string(TWO_TREE_CONLLU).load().unwrap();

        assert_eq!(corpus.len(), 2);
        assert_eq!(corpus.trees[1].words[0].form, "सीता");
        assert_eq!(corpus.stats.tokens, 4);
    }

    #[test]
    fn test_truncate_keeps_leading_sentences() {
        let mut corpus = Treebank::from_string(TWO_TREE_CONLLU).load().unwrap();
        corpus.truncate(5);
        assert_eq!(corpus.len(), 2);

        corpus.truncate(1);
        assert_eq!(corpus.len(), 1);
        assert_eq!(corpus.trees[0].words[0].form, "राम");
        assert_eq!(corpus.stats.sentences, 2);
    }

    #[test]
    fn test_load_from_glob_sorted() {
        let (dir, _paths) = create_test_files(&[
            ("b.conllu", "1\tb\t_\tX\t_\t_\t0\troot\t_\t_\n"),
            ("a.conllu", "1\ta\t_\tX\t_\t_\t0\troot\t_\t_\n"),
            ("other.txt", "ignored"),
        ]);

        let pattern = format!("{}/*.conllu", dir.path().display());
        let corpus = Treebank::from_arg(&pattern).unwrap().load().unwrap();

        assert_eq!(corpus.len(), 2);
        assert_eq!(corpus.trees[0].words[0].form, "a");
        assert_eq!(corpus.trees[1].words[0].form, "b");
    }

    #[test]
    fn test_glob_without_matches() {
        let dir = tempdir().unwrap();
        let pattern = format!("{}/*.conllu", dir.path().display());

        assert!(matches!(
            Treebank::from_glob(&pattern),
            Err(EvalError::NoMatch(_))
        ));
    }

    #[test]
    fn test_missing_file_is_fatal() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("nonexistent.conllu");

        let err = Treebank::from_file(&missing).load().unwrap_err();
        assert!(matches!(err, EvalError::Open { .. }));
        assert!(err.to_string().contains("nonexistent.conllu"));
        assert!(Treebank::from_file(&missing).contents().is_err());
    }

    #[test]
    fn test_contents_concatenates() {
        let (_dir, paths) = create_test_files(&[
            ("1.conllu", "1\ta\t_\tX\t_\t_\t0\troot\t_\t_\n\n"),
            ("2.conllu", "1\tb\t_\tX\t_\t_\t0\troot\t_\t_\n"),
        ]);

        let bytes = Treebank::from_paths(paths).contents().unwrap();
        assert_eq!(
            bytes,
            b"1\ta\t_\tX\t_\t_\t0\troot\t_\t_\n\n1\tb\t_\tX\t_\t_\t0\troot\t_\t_\n"
        );
    }
}
