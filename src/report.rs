//! Human-readable output
//!
//! Metric summaries (`UAS: 87.50%`), per-label precision, baseline versus
//! corrected deltas, and a side-by-side table of one predicted sentence
//! against its gold tree.

use crate::eval::RunComparison;
use crate::score::{Evaluation, Ratio};
use crate::tree::Tree;
use std::fmt;

impl fmt::Display for Ratio {
    /// `87.50%`, or `n/a` when nothing was scored
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            write!(f, "n/a")
        } else {
            write!(f, "{:.2}%", self.percent())
        }
    }
}

impl fmt::Display for Evaluation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Processed {}, Skipped {} of {} sentences",
            self.processed,
            self.skipped,
            self.sentences()
        )?;
        if self.parse_failures > 0 {
            writeln!(f, "Parser failures: {}", self.parse_failures)?;
        }
        if self.unpaired > 0 {
            writeln!(f, "Unpaired: {}", self.unpaired)?;
        }
        if self.malformed_rows > 0 {
            writeln!(f, "Malformed rows skipped: {}", self.malformed_rows)?;
        }
        writeln!(f, "Tokens: {}", self.tokens())?;
        writeln!(f, "UAS: {}", self.uas)?;
        writeln!(f, "LAS: {}", self.las)?;
        writeln!(f, "POS Accuracy: {}", self.upos)?;
        writeln!(f, "Morph Accuracy: {}", self.feats)?;
        write!(f, "Exact Match: {}", self.exact_match)
    }
}

/// Per-label precision lines, sorted by label
pub struct LabelReport<'a>(&'a Evaluation);

impl Evaluation {
    pub fn label_report(&self) -> LabelReport<'_> {
        LabelReport(self)
    }
}

impl fmt::Display for LabelReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (label, ratio) in self.0.label_precision() {
            writeln!(f, "{}: Precision = {} ({}/{})", label, ratio, ratio.correct, ratio.total)?;
        }
        Ok(())
    }
}

fn fmt_delta(delta: Option<f64>) -> String {
    match delta {
        Some(d) => format!("{:+.2}", d),
        None => "n/a".to_string(),
    }
}

impl fmt::Display for RunComparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Baseline → UAS: {}, LAS: {}",
            self.baseline.uas, self.baseline.las
        )?;
        writeln!(
            f,
            "Hybrid   → UAS: {}, LAS: {}",
            self.corrected.uas, self.corrected.las
        )?;
        writeln!(
            f,
            "ΔUAS: {}, ΔLAS: {}",
            fmt_delta(self.delta_uas()),
            fmt_delta(self.delta_las())
        )?;
        write!(
            f,
            "Rule edits: {}, root conflicts: {}",
            self.rules.edits, self.rules.root_conflicts
        )
    }
}

/// One row of a [`Comparison`]: (form, head, deprel) on each side
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComparisonRow {
    pub predicted: Option<(String, usize, String)>,
    pub gold: Option<(String, usize, String)>,
}

impl ComparisonRow {
    /// Head and label agree on both sides
    pub fn matches(&self) -> bool {
        match (&self.predicted, &self.gold) {
            (Some((_, ph, pr)), Some((_, gh, gr))) => ph == gh && pr == gr,
            _ => false,
        }
    }
}

/// Predicted and gold attachments side by side
///
/// Rows pair words by position. When one side is longer, its extra words
/// get rows with an empty counterpart.
#[derive(Debug, Clone)]
pub struct Comparison {
    pub text: String,
    pub rows: Vec<ComparisonRow>,
}

impl Comparison {
    pub fn new(predicted: &Tree, gold: &Tree) -> Self {
        let triple = |tree: &Tree, i: usize| {
            tree.words
                .get(i)
                .map(|w| (w.form.clone(), w.head, w.deprel.clone()))
        };
        let rows = (0..predicted.len().max(gold.len()))
            .map(|i| ComparisonRow {
                predicted: triple(predicted, i),
                gold: triple(gold, i),
            })
            .collect();
        Self {
            text: gold.sentence_text.clone().unwrap_or_else(|| gold.text()),
            rows,
        }
    }

    pub fn matched(&self) -> usize {
        self.rows.iter().filter(|r| r.matches()).count()
    }
}

impl fmt::Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Sentence: {}", self.text)?;
        writeln!(f, "  {:<15}{:<25}{}", "Token", "Predicted (Head,Rel)", "Gold (Head,Rel)")?;
        writeln!(f, "{}", "-".repeat(60))?;
        for row in &self.rows {
            let mark = if row.matches() { '✓' } else { '✗' };
            let form = row
                .predicted
                .as_ref()
                .or(row.gold.as_ref())
                .map_or("", |(form, _, _)| form.as_str());
            let side = |t: &Option<(String, usize, String)>| match t {
                Some((_, head, rel)) => format!("({}, {})", head, rel),
                None => "-".to_string(),
            };
            writeln!(
                f,
                "{} {:<15}{:<25}{}",
                mark,
                form,
                side(&row.predicted),
                side(&row.gold)
            )?;
        }
        write!(f, "{}/{} tokens match", self.matched(), self.rows.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eval::RuleStats;
    use crate::score::score_corpus;
    use crate::tree::Word;

    fn tree(words: &[(&str, usize, &str)]) -> Tree {
        Tree::from_words(
            words
                .iter()
                .enumerate()
                .map(|(i, (form, head, deprel))| Word::new(i + 1, form, "X", *head, deprel))
                .collect(),
        )
    }

    #[test]
    fn test_ratio_display() {
        assert_eq!(Ratio::new(7, 8).to_string(), "87.50%");
        assert_eq!(Ratio::new(0, 4).to_string(), "0.00%");
        assert_eq!(Ratio::default().to_string(), "n/a");
    }

    #[test]
    fn test_evaluation_display() {
        let gold = tree(&[("राम", 2, "nsubj"), ("गया", 0, "root")]);
        let predicted = tree(&[("राम", 0, "nsubj"), ("गया", 0, "root")]);
        let text = score_corpus(&[gold], &[predicted]).to_string();

        assert!(text.starts_with("Processed 1, Skipped 0 of 1 sentences"));
        assert!(text.contains("UAS: 50.00%"));
        assert!(text.contains("LAS: 50.00%"));
        assert!(text.contains("Exact Match: 0.00%"));
    }

    #[test]
    fn test_no_data_display() {
        let text = Evaluation::new().to_string();

        assert!(text.contains("UAS: n/a"));
        assert!(text.contains("Exact Match: n/a"));
    }

    #[test]
    fn test_label_report_sorted() {
        let gold = tree(&[("a", 2, "obj"), ("b", 0, "root"), ("c", 2, "nsubj")]);
        let report = score_corpus(&[gold.clone()], &[gold]).label_report().to_string();
        let labels: Vec<&str> = report.lines().map(|l| l.split(':').next().unwrap()).collect();

        assert_eq!(labels, vec!["nsubj", "obj", "root"]);
        assert!(report.contains("root: Precision = 100.00% (1/1)"));
    }

    #[test]
    fn test_run_comparison_display() {
        let gold = tree(&[("a", 2, "obj"), ("b", 0, "root")]);
        let wrong = tree(&[("a", 2, "nsubj"), ("b", 0, "root")]);
        let runs = RunComparison {
            baseline: score_corpus(&[gold.clone()], &[wrong]),
            corrected: score_corpus(&[gold.clone()], &[gold]),
            rules: RuleStats {
                edits: 1,
                root_conflicts: 0,
            },
        };
        let text = runs.to_string();

        assert!(text.contains("Baseline → UAS: 100.00%, LAS: 50.00%"));
        assert!(text.contains("ΔUAS: +0.00, ΔLAS: +50.00"));
    }

    #[test]
    fn test_comparison_table() {
        let gold = tree(&[("पुस्तक", 3, "nsubj"), ("टेबलावर", 3, "obl"), ("आहे", 0, "root")]);
        let predicted = tree(&[("पुस्तक", 3, "nsubj"), ("टेबलावर", 3, "obj")]);
        let comparison = Comparison::new(&predicted, &gold);

        assert_eq!(comparison.rows.len(), 3);
        assert_eq!(comparison.matched(), 1);
        assert!(comparison.rows[2].predicted.is_none());

        let table = comparison.to_string();
        assert!(table.starts_with("Sentence: पुस्तक टेबलावर आहे"));
        assert!(table.contains("✓ पुस्तक"));
        assert!(table.contains("✗ टेबलावर"));
        assert!(table.ends_with("1/3 tokens match"));
    }
}
