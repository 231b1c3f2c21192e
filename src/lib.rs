//! Depscore: Dependency parse evaluation for CoNLL-U treebanks
//!
//! Scores predicted parses against gold trees (UAS, LAS, POS, morphology,
//! exact match, per-label precision) and applies language-specific
//! correction rules to parser output, gated on a morphological split.

pub mod bytes; // Byte-level CoNLL-U column helpers
pub mod conllu; // CoNLL-U file parsing
pub mod error; // Run-level errors
pub mod eval; // Parser + rules + scoring pipeline
pub mod linewise; // Raw line-paired scoring
pub mod morph; // Morphological splitting
pub mod parser; // External dependency parser interface
pub mod report; // Display of scores and comparisons
pub mod rules; // Rule-based corrections
pub mod score; // Sentence-aligned metrics
pub mod tree; // Tree data structures
pub mod treebank; // Loading from files and globs

// Re-exports for convenience
pub use conllu::{CoNLLUReader, ParseError, ReadStats};
pub use error::EvalError;
pub use eval::{EvalConfig, Evaluator, RuleStats, RunComparison, apply_rules};
pub use linewise::score_lines;
pub use morph::{Language, MorphAnalyzer, MorphSplitter, Split};
pub use parser::{CachedParser, CommandParser, DependencyParser, ParserError};
pub use report::Comparison;
pub use rules::{RootPolicy, RuleReport, RuleSet};
pub use score::{Evaluation, Ratio, score_corpus};
pub use tree::{Features, TokenId, Tree, Word};
pub use treebank::{Corpus, Treebank};
