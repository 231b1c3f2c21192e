//! Attachment scoring of predicted trees against gold trees
//!
//! Sentences are paired by position. A pair whose token counts differ is
//! skipped as a whole: it is counted in [`Evaluation::skipped`] and adds
//! nothing to any numerator or denominator. Every other pair is compared
//! word by word.

use crate::tree::Tree;
use rustc_hash::FxHashMap;

/// A count of correct items out of a total
///
/// `value()` is 0.0 when nothing was scored; use `is_empty()` to tell that
/// apart from a real zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Ratio {
    pub correct: usize,
    pub total: usize,
}

impl Ratio {
    pub fn new(correct: usize, total: usize) -> Self {
        Self { correct, total }
    }

    #[inline]
    pub fn record(&mut self, hit: bool) {
        self.total += 1;
        self.correct += usize::from(hit);
    }

    pub fn value(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.correct as f64 / self.total as f64
        }
    }

    pub fn percent(&self) -> f64 {
        100.0 * self.value()
    }

    pub fn is_empty(&self) -> bool {
        self.total == 0
    }

    pub fn merge(&mut self, other: &Ratio) {
        self.correct += other.correct;
        self.total += other.total;
    }
}

/// What happened to one sentence pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PairOutcome {
    Scored { tokens: usize, exact: bool },
    /// Token counts differ
    Skipped { gold: usize, predicted: usize },
    /// Both sides have no scorable tokens
    Empty,
}

/// Aggregate scores for a run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Evaluation {
    /// Sentence pairs scored word by word
    pub processed: usize,
    /// Sentence pairs dropped for a length mismatch
    pub skipped: usize,
    /// Sentences the parser could not handle
    pub parse_failures: usize,
    /// Sentences (corpus mode) or lines (line mode) with no counterpart
    pub unpaired: usize,
    /// Multiword ranges and empty nodes left out of every total
    pub excluded_rows: usize,
    /// Rows with too few columns or bad numbers, left out of every total
    pub malformed_rows: usize,
    pub uas: Ratio,
    pub las: Ratio,
    pub upos: Ratio,
    pub feats: Ratio,
    pub exact_match: Ratio,
    /// Per gold label: words whose head and label both match
    pub labels: FxHashMap<String, Ratio>,
}

impl Evaluation {
    pub fn new() -> Self {
        Self::default()
    }

    /// All sentence pairs seen, scored or not
    pub fn sentences(&self) -> usize {
        self.processed + self.skipped + self.parse_failures
    }

    /// Words that entered the denominators
    pub fn tokens(&self) -> usize {
        self.uas.total
    }

    /// Compare one aligned pair and add it to the totals
    pub fn score_pair(&mut self, gold: &Tree, predicted: &Tree) -> PairOutcome {
        if gold.len() != predicted.len() {
            self.skipped += 1;
            log::warn!(
                "skipping sentence {:?}: {} gold tokens, {} predicted",
                gold.text(),
                gold.len(),
                predicted.len()
            );
            return PairOutcome::Skipped {
                gold: gold.len(),
                predicted: predicted.len(),
            };
        }
        if gold.is_empty() {
            return PairOutcome::Empty;
        }

        self.processed += 1;
        let mut exact = true;
        for (g, p) in gold.words.iter().zip(&predicted.words) {
            let head = g.head == p.head;
            let both = head && g.deprel == p.deprel;
            self.uas.record(head);
            self.las.record(both);
            self.upos.record(g.upos == p.upos);
            self.feats.record(g.feats == p.feats);
            self.record_label(&g.deprel, both);
            exact &= both;
        }
        self.exact_match.record(exact);

        PairOutcome::Scored {
            tokens: gold.len(),
            exact,
        }
    }

    pub(crate) fn record_label(&mut self, label: &str, hit: bool) {
        match self.labels.get_mut(label) {
            Some(ratio) => ratio.record(hit),
            None => {
                let mut ratio = Ratio::default();
                ratio.record(hit);
                self.labels.insert(label.to_string(), ratio);
            }
        }
    }

    /// Add another evaluation's counts to this one
    pub fn merge(&mut self, other: &Evaluation) {
        self.processed += other.processed;
        self.skipped += other.skipped;
        self.parse_failures += other.parse_failures;
        self.unpaired += other.unpaired;
        self.excluded_rows += other.excluded_rows;
        self.malformed_rows += other.malformed_rows;
        self.uas.merge(&other.uas);
        self.las.merge(&other.las);
        self.upos.merge(&other.upos);
        self.feats.merge(&other.feats);
        self.exact_match.merge(&other.exact_match);
        for (label, ratio) in &other.labels {
            self.labels.entry(label.clone()).or_default().merge(ratio);
        }
    }

    /// Per-label precision, sorted by label
    pub fn label_precision(&self) -> Vec<(&str, Ratio)> {
        let mut labels: Vec<_> = self
            .labels
            .iter()
            .map(|(label, ratio)| (label.as_str(), *ratio))
            .collect();
        labels.sort_unstable_by(|a, b| a.0.cmp(b.0));
        labels
    }
}

/// Score two corpora pair by pair
///
/// Sentences beyond the shorter corpus are counted in `unpaired`.
pub fn score_corpus<G, P>(gold: &[G], predicted: &[P]) -> Evaluation
where
    G: AsRef<Tree>,
    P: AsRef<Tree>,
{
    let mut eval = Evaluation::new();
    for (g, p) in gold.iter().zip(predicted) {
        eval.score_pair(g.as_ref(), p.as_ref());
    }
    eval.unpaired = gold.len().abs_diff(predicted.len());
    if eval.unpaired > 0 {
        log::warn!(
            "{} gold and {} predicted sentences; {} left unpaired",
            gold.len(),
            predicted.len(),
            eval.unpaired
        );
    }
    eval
}
