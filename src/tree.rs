//! Sentence data structures
//!
//! A [`Tree`] is one sentence of a treebank or one parser output: an ordered
//! list of [`Word`]s whose `head` fields point at other words by their 1-based
//! `id`. Nothing here validates the tree shape; parser and rule output may
//! contain dangling heads or several roots and every consumer must cope.

use std::collections::HashMap;
use std::fmt;

/// Token identifier as written in the ID column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenId {
    /// Regular token: 1, 2, 3
    Single(usize),
    /// Multiword token range: 1-2
    Range(usize, usize),
    /// Empty node: 2.1
    Decimal(usize, usize),
}

/// Morphological features (FEATS column)
///
/// Keeps pairs in the order they were read so they print back the same way,
/// but equality ignores order: `Case=Ins|Number=Sing` equals
/// `Number=Sing|Case=Ins`.
#[derive(Debug, Clone, Default)]
pub struct Features(Vec<(String, String)>);

impl Features {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Parse a FEATS value (`key=value|key=value`, `_` for none)
    ///
    /// Pairs without `=` are dropped.
    pub fn parse(s: &str) -> Self {
        let mut feats = Self::new();
        if s == "_" || s.is_empty() {
            return feats;
        }
        for pair in s.split('|') {
            if let Some((key, value)) = pair.split_once('=') {
                feats.insert(key, value);
            }
        }
        feats
    }

    /// Set a feature, replacing any previous value for the key
    pub fn insert(&mut self, key: &str, value: &str) {
        match self.0.iter_mut().find(|(k, _)| k == key) {
            Some(slot) => slot.1 = value.to_string(),
            None => self.0.push((key.to_string(), value.to_string())),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// True when the feature `key` has exactly `value`
    pub fn has(&self, key: &str, value: &str) -> bool {
        self.get(key) == Some(value)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    fn sorted(&self) -> Vec<(&str, &str)> {
        let mut pairs: Vec<_> = self.iter().collect();
        pairs.sort_unstable();
        pairs
    }
}

impl PartialEq for Features {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.sorted() == other.sorted()
    }
}

impl Eq for Features {}

impl fmt::Display for Features {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "_");
        }
        for (i, (k, v)) in self.iter().enumerate() {
            if i > 0 {
                write!(f, "|")?;
            }
            write!(f, "{}={}", k, v)?;
        }
        Ok(())
    }
}

/// One token of a sentence
#[derive(Debug, Clone, PartialEq)]
pub struct Word {
    /// 1-based position in the sentence
    pub id: usize,
    pub form: String,
    pub upos: String,
    pub feats: Features,
    /// Governing word id, 0 for the root
    pub head: usize,
    pub deprel: String,
}

impl Word {
    pub fn new(id: usize, form: &str, upos: &str, head: usize, deprel: &str) -> Self {
        Self {
            id,
            form: form.to_string(),
            upos: upos.to_string(),
            feats: Features::new(),
            head,
            deprel: deprel.to_string(),
        }
    }

    pub fn is_root(&self) -> bool {
        self.head == 0
    }
}

/// A sentence: words in order plus comment metadata
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Tree {
    pub words: Vec<Word>,
    pub sentence_text: Option<String>,
    pub metadata: HashMap<String, String>,
}

impl Tree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_words(words: Vec<Word>) -> Self {
        Self {
            words,
            ..Self::default()
        }
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Look up a word by its 1-based id
    ///
    /// Returns `None` for 0 and for ids that do not occur, so a corrupt head
    /// never panics.
    pub fn word(&self, id: usize) -> Option<&Word> {
        // ids are normally contiguous, so try the direct slot first
        match id.checked_sub(1).and_then(|i| self.words.get(i)) {
            Some(w) if w.id == id => Some(w),
            _ => self.words.iter().find(|w| w.id == id),
        }
    }

    /// The word governing `word`, if its head resolves
    pub fn head_of(&self, word: &Word) -> Option<&Word> {
        if word.is_root() {
            None
        } else {
            self.word(word.head)
        }
    }

    /// Ids of all words attached to 0
    pub fn roots(&self) -> Vec<usize> {
        self.words
            .iter()
            .filter(|w| w.is_root())
            .map(|w| w.id)
            .collect()
    }

    /// Forms joined by single spaces, the input handed to a parser
    pub fn text(&self) -> String {
        let forms: Vec<&str> = self.words.iter().map(|w| w.form.as_str()).collect();
        forms.join(" ")
    }
}

impl AsRef<Tree> for Tree {
    fn as_ref(&self) -> &Tree {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ram_gaya() -> Tree {
        Tree::from_words(vec![
            Word::new(1, "राम", "PROPN", 2, "nsubj"),
            Word::new(2, "गया", "VERB", 0, "root"),
        ])
    }

    #[test]
    fn test_tree_lookup() {
        let tree = ram_gaya();

        assert_eq!(tree.len(), 2);
        assert_eq!(tree.word(2).unwrap().form, "गया");
        assert_eq!(tree.head_of(&tree.words[0]).unwrap().id, 2);
        assert!(tree.head_of(&tree.words[1]).is_none());
        assert_eq!(tree.roots(), vec![2]);
        assert_eq!(tree.text(), "राम गया");
    }

    #[test]
    fn test_dangling_head() {
        let tree = Tree::from_words(vec![Word::new(1, "x", "X", 7, "dep")]);

        assert!(tree.word(0).is_none());
        assert!(tree.head_of(&tree.words[0]).is_none());
        assert!(tree.roots().is_empty());
    }

    #[test]
    fn test_features_order_insensitive() {
        let a = Features::parse("Case=Ins|Number=Sing");
        let b = Features::parse("Number=Sing|Case=Ins");
        let c = Features::parse("Case=Ins");

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.to_string(), "Case=Ins|Number=Sing");
        assert_eq!(b.to_string(), "Number=Sing|Case=Ins");
        assert!(a.has("Case", "Ins"));
    }

    #[test]
    fn test_features_empty() {
        let feats = Features::parse("_");

        assert!(feats.is_empty());
        assert_eq!(feats, Features::new());
        assert_eq!(feats.to_string(), "_");
    }
}
