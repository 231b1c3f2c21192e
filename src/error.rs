//! Run-level errors
//!
//! These are the failures that stop an evaluation: an input that cannot be
//! opened, a glob that matches nothing, a parser that is not there. Problems
//! with a single row or sentence never show up here; they are counted in
//! [`crate::ReadStats`] and [`crate::Evaluation`].

use crate::conllu::ParseError;
use crate::parser::ParserError;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EvalError {
    #[error("cannot open {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("error reading {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: ParseError,
    },

    #[error("no files match {0:?}")]
    NoMatch(String),

    #[error(transparent)]
    Glob(#[from] glob::PatternError),

    #[error(transparent)]
    Parser(#[from] ParserError),
}
