//! Morphological splitting for rule gating
//!
//! A split is a best-effort segmentation of a surface form into morphs, e.g.
//! `चित्रकारांनी` → `["चित्रकार", "ांनी"]`. Rules only fire on a marker when the
//! split isolates it as its own element, never on a raw substring match.
//!
//! An external [`MorphAnalyzer`] is tried first. When it returns the token
//! unchanged, a per-language suffix table is consulted: longest suffix first,
//! and only if at least [`MIN_STEM_CHARS`] characters of stem remain.

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Shortest stem a suffix may leave behind, in characters
pub const MIN_STEM_CHARS: usize = 2;

/// Languages with rule sets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Language {
    Hindi,
    Marathi,
}

#[derive(Debug, Error)]
#[error("unsupported language {0:?} (expected \"hi\" or \"mr\")")]
pub struct LanguageError(pub String);

impl Language {
    /// ISO 639-1 code
    pub fn code(&self) -> &'static str {
        match self {
            Language::Hindi => "hi",
            Language::Marathi => "mr",
        }
    }

    /// Fallback suffixes, longest first
    fn suffixes(&self) -> &'static [&'static str] {
        match self {
            Language::Hindi => &["ती", "ते", "ए", "ं"],
            // ergative plural, locative, dative, ergative, locative
            Language::Marathi => &["ांनी", "वर", "ला", "ने", "त"],
        }
    }
}

impl FromStr for Language {
    type Err = LanguageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "hi" | "hin" | "hindi" => Ok(Language::Hindi),
            "mr" | "mar" | "marathi" => Ok(Language::Marathi),
            _ => Err(LanguageError(s.to_string())),
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// External morphological analyzer
///
/// Returns one or more morphs; returning `[token]` means no analysis.
pub trait MorphAnalyzer: Send + Sync {
    fn analyze(&self, token: &str, language: Language) -> Vec<String>;
}

/// Analyzer that never splits, leaving everything to the suffix table
#[derive(Debug, Clone, Copy, Default)]
pub struct NullAnalyzer;

impl MorphAnalyzer for NullAnalyzer {
    fn analyze(&self, token: &str, _language: Language) -> Vec<String> {
        vec![token.to_string()]
    }
}

/// Ordered morphs of one token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Split(Vec<String>);

impl Split {
    pub fn whole(token: &str) -> Self {
        Self(vec![token.to_string()])
    }

    pub fn morphs(&self) -> &[String] {
        &self.0
    }

    /// True when `marker` is one of the morphs
    pub fn isolates(&self, marker: &str) -> bool {
        self.0.iter().any(|m| m == marker)
    }

    /// The final morph, if the token was actually split
    pub fn suffix(&self) -> Option<&str> {
        match self.0.as_slice() {
            [_, .., last] => Some(last.as_str()),
            _ => None,
        }
    }
}

/// Analyzer plus suffix fallback for one language
pub struct MorphSplitter {
    language: Language,
    analyzer: Box<dyn MorphAnalyzer>,
}

impl MorphSplitter {
    /// Suffix table only
    pub fn new(language: Language) -> Self {
        Self::with_analyzer(language, Box::new(NullAnalyzer))
    }

    pub fn with_analyzer(language: Language, analyzer: Box<dyn MorphAnalyzer>) -> Self {
        Self { language, analyzer }
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn split(&self, token: &str) -> Split {
        let morphs = self.analyzer.analyze(token, self.language);
        match morphs.as_slice() {
            [only] if only == token => strip_suffix(token, self.language.suffixes()),
            [] => Split::whole(token),
            _ => Split(morphs),
        }
    }
}

/// Split off the longest matching suffix that leaves a long enough stem
fn strip_suffix(token: &str, suffixes: &[&str]) -> Split {
    let mut candidates: Vec<&str> = suffixes.to_vec();
    candidates.sort_by_key(|s| std::cmp::Reverse(s.chars().count()));

    for suffix in candidates {
        if let Some(stem) = token.strip_suffix(suffix) {
            if stem.chars().count() >= MIN_STEM_CHARS {
                return Split(vec![stem.to_string(), suffix.to_string()]);
            }
        }
    }
    Split::whole(token)
}
