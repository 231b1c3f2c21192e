//! End-to-end evaluation: parse gold text, optionally correct, then score
//!
//! The [`Evaluator`] owns the run's collaborators: one parser and an optional
//! rule set, both created once and shared by every sentence. Sentences are
//! independent, so they are processed in parallel, but results are reduced
//! in corpus order so the totals and the log are the same on every run.

use crate::error::EvalError;
use crate::morph::Language;
use crate::parser::{DependencyParser, ParserError};
use crate::rules::{RootPolicy, RuleReport, RuleSet};
use crate::score::{Evaluation, Ratio};
use crate::tree::Tree;
use pariter::IteratorExt as _;
use std::sync::Arc;

/// How a run is set up: which rules, if any, and how sentences are scheduled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EvalConfig {
    pub language: Language,
    pub apply_rules: bool,
    pub root_policy: RootPolicy,
    pub parallel: bool,
}

impl EvalConfig {
    pub fn new(language: Language) -> Self {
        Self {
            language,
            apply_rules: false,
            root_policy: RootPolicy::default(),
            parallel: true,
        }
    }

    /// The rule set for this run, or `None` when rules are off
    pub fn rule_set(&self) -> Option<RuleSet> {
        self.apply_rules
            .then(|| RuleSet::for_language(self.language).root_policy(self.root_policy))
    }

    pub fn evaluator(&self, parser: Arc<dyn DependencyParser>) -> Evaluator {
        let evaluator = Evaluator::new(parser).parallel(self.parallel);
        match self.rule_set() {
            Some(rules) => evaluator.with_rules(rules),
            None => evaluator,
        }
    }
}

/// Edits made by a rule set over a corpus
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RuleStats {
    /// Words whose head or label changed
    pub edits: usize,
    /// Sentences left with zero or several roots after the rules ran
    pub root_conflicts: usize,
}

impl RuleStats {
    fn add(&mut self, report: &RuleReport) {
        self.edits += report.changed();
        self.root_conflicts += usize::from(report.root_conflict.is_some());
    }
}

/// Apply a rule set to every predicted tree in place
pub fn apply_rules(rules: &RuleSet, trees: &mut [Arc<Tree>]) -> RuleStats {
    let mut stats = RuleStats::default();
    for tree in trees {
        let report = rules.apply(Arc::make_mut(tree));
        stats.add(&report);
    }
    log::info!(
        "{} rules: {} edits, {} root conflicts",
        rules.language(),
        stats.edits,
        stats.root_conflicts
    );
    stats
}

/// Baseline and rule-corrected scores for the same corpus
#[derive(Debug, Clone)]
pub struct RunComparison {
    pub baseline: Evaluation,
    pub corrected: Evaluation,
    pub rules: RuleStats,
}

impl RunComparison {
    /// Change in UAS, in percentage points; `None` if either run scored nothing
    pub fn delta_uas(&self) -> Option<f64> {
        delta(&self.baseline.uas, &self.corrected.uas)
    }

    /// Change in LAS, in percentage points
    pub fn delta_las(&self) -> Option<f64> {
        delta(&self.baseline.las, &self.corrected.las)
    }
}

fn delta(before: &Ratio, after: &Ratio) -> Option<f64> {
    if before.is_empty() || after.is_empty() {
        None
    } else {
        Some(after.percent() - before.percent())
    }
}

/// Parses gold sentence text and scores the result against the gold trees
pub struct Evaluator {
    parser: Arc<dyn DependencyParser>,
    rules: Option<Arc<RuleSet>>,
    parallel: bool,
}

/// Result of one sentence's trip through the pipeline
type Processed = (Arc<Tree>, Result<Tree, ParserError>, Option<RuleReport>);

impl Evaluator {
    pub fn new(parser: Arc<dyn DependencyParser>) -> Self {
        Self {
            parser,
            rules: None,
            parallel: true,
        }
    }

    pub fn with_rules(mut self, rules: RuleSet) -> Self {
        self.rules = Some(Arc::new(rules));
        self
    }

    /// Process sentences on worker threads (default) or in the calling thread
    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Score the configured pipeline against `gold`
    ///
    /// A sentence the parser fails on is counted and skipped; an
    /// unavailable parser stops the run.
    pub fn evaluate(&self, gold: &[Arc<Tree>]) -> Result<(Evaluation, RuleStats), EvalError> {
        self.run(gold, self.rules.clone())
    }

    /// Score without rules, then with them
    pub fn compare_runs(&self, gold: &[Arc<Tree>]) -> Result<RunComparison, EvalError> {
        let (baseline, _) = self.run(gold, None)?;
        let (corrected, rules) = self.evaluate(gold)?;
        Ok(RunComparison {
            baseline,
            corrected,
            rules,
        })
    }

    fn run(
        &self,
        gold: &[Arc<Tree>],
        rules: Option<Arc<RuleSet>>,
    ) -> Result<(Evaluation, RuleStats), EvalError> {
        let parser = self.parser.clone();
        let task = move |gold: Arc<Tree>| process(&*parser, rules.as_deref(), gold);

        let results: Box<dyn Iterator<Item = Processed> + '_> = if self.parallel {
            Box::new(gold.to_vec().into_iter().parallel_map(task))
        } else {
            Box::new(gold.iter().cloned().map(task))
        };

        let mut eval = Evaluation::new();
        let mut stats = RuleStats::default();
        for (gold, predicted, report) in results {
            match predicted {
                Ok(predicted) => {
                    eval.score_pair(&gold, &predicted);
                }
                Err(ParserError::Failed { text, message }) => {
                    eval.parse_failures += 1;
                    log::warn!("parser failed on {:?}: {}", text, message);
                }
                Err(e @ ParserError::Unavailable(_)) => return Err(e.into()),
            }
            if let Some(report) = report {
                stats.add(&report);
            }
        }

        log::info!(
            "Processed {}, Skipped {} of {} sentences",
            eval.processed,
            eval.skipped,
            eval.sentences()
        );
        Ok((eval, stats))
    }
}

/// Parse one gold sentence's text and run the rules over the result
fn process(
    parser: &dyn DependencyParser,
    rules: Option<&RuleSet>,
    gold: Arc<Tree>,
) -> Processed {
    let predicted = parser.parse(&gold.text());
    let mut report = None;
    let predicted = predicted.map(|mut tree| {
        if let Some(rules) = rules {
            report = Some(rules.apply(&mut tree));
        }
        tree
    });
    (gold, predicted, report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::CachedParser;
    use crate::tree::Word;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Replays fixed parses by sentence text
    struct ReplayParser {
        parses: Vec<Tree>,
        calls: AtomicUsize,
    }

    impl DependencyParser for ReplayParser {
        fn parse(&self, text: &str) -> Result<Tree, ParserError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.parses
                .iter()
                .find(|t| t.text() == text)
                .cloned()
                .ok_or_else(|| ParserError::Failed {
                    text: text.to_string(),
                    message: "unknown sentence".to_string(),
                })
        }
    }

    struct MissingModel;

    impl DependencyParser for MissingModel {
        fn parse(&self, _text: &str) -> Result<Tree, ParserError> {
            Err(ParserError::Unavailable("hi model not downloaded".to_string()))
        }
    }

    fn tree(words: &[(&str, &str, usize, &str)]) -> Tree {
        Tree::from_words(
            words
                .iter()
                .enumerate()
                .map(|(i, (form, upos, head, deprel))| Word::new(i + 1, form, upos, *head, deprel))
                .collect(),
        )
    }

    fn gold() -> Vec<Arc<Tree>> {
        vec![
            Arc::new(tree(&[("राम", "PROPN", 2, "nsubj"), ("गया", "VERB", 0, "root")])),
            Arc::new(tree(&[
                ("रमेश", "PROPN", 3, "nsubj"),
                ("को", "ADP", 3, "iobj"),
                ("बुलाया", "VERB", 0, "root"),
            ])),
            Arc::new(tree(&[("अज्ञात", "X", 0, "root")])),
        ]
    }

    fn replay() -> ReplayParser {
        ReplayParser {
            parses: vec![
                tree(&[("राम", "PROPN", 2, "nsubj"), ("गया", "VERB", 0, "root")]),
                tree(&[
                    ("रमेश", "PROPN", 3, "nsubj"),
                    ("को", "ADP", 3, "obj"),
                    ("बुलाया", "VERB", 0, "root"),
                ]),
            ],
            calls: AtomicUsize::new(0),
        }
    }

    #[test]
    fn test_evaluate_counts_parse_failures() {
        let evaluator = Evaluator::new(Arc::new(replay()));
        let (eval, stats) = evaluator.evaluate(&gold()).unwrap();

        assert_eq!(eval.processed, 2);
        assert_eq!(eval.parse_failures, 1);
        assert_eq!(eval.uas, Ratio::new(5, 5));
        assert_eq!(eval.las, Ratio::new(4, 5));
        assert_eq!(stats, RuleStats::default());
    }

    #[test]
    fn test_rules_improve_las() {
        let parser = Arc::new(CachedParser::new(replay()));
        let evaluator = Evaluator::new(parser.clone())
            .with_rules(RuleSet::for_language(Language::Hindi).root_policy(RootPolicy::KeepPromoted));
        let runs = evaluator.compare_runs(&gold()).unwrap();

        assert_eq!(runs.baseline.las, Ratio::new(4, 5));
        assert_eq!(runs.corrected.las, Ratio::new(5, 5));
        assert_eq!(runs.delta_uas(), Some(0.0));
        assert!((runs.delta_las().unwrap() - 20.0).abs() < 1e-9);
        assert_eq!(runs.rules.edits, 1);
        // the second run is served from the cache
        assert_eq!(parser.len(), 2);
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let sentences: Vec<Arc<Tree>> = gold().into_iter().cycle().take(60).collect();
        let parallel = Evaluator::new(Arc::new(replay()))
            .evaluate(&sentences)
            .unwrap();
        let sequential = Evaluator::new(Arc::new(replay()))
            .parallel(false)
            .evaluate(&sentences)
            .unwrap();

        assert_eq!(parallel, sequential);
        assert_eq!(parallel.0.parse_failures, 20);
    }

    #[test]
    fn test_unavailable_parser_is_fatal() {
        let evaluator = Evaluator::new(Arc::new(MissingModel)).parallel(false);

        assert!(matches!(
            evaluator.evaluate(&gold()),
            Err(EvalError::Parser(ParserError::Unavailable(_)))
        ));
    }

    #[test]
    fn test_empty_gold() {
        let (eval, _) = Evaluator::new(Arc::new(replay())).evaluate(&[]).unwrap();

        assert_eq!(eval.sentences(), 0);
        assert_eq!(eval.uas.value(), 0.0);
        assert!(eval.las.is_empty());
    }

    #[test]
    fn test_config_builds_pipeline() {
        let mut config = EvalConfig::new(Language::Marathi);
        assert!(config.rule_set().is_none());

        config.apply_rules = true;
        config.root_policy = RootPolicy::Preserve;
        let rules = config.rule_set().unwrap();
        assert_eq!(rules.language(), Language::Marathi);
        assert_eq!(
            rules.rule_names(),
            vec!["instrumental-oblique", "possessive-marker", "ergative-subject"]
        );

        config.language = Language::Hindi;
        config.parallel = false;
        let runs = config.evaluator(Arc::new(replay())).compare_runs(&gold()).unwrap();
        assert_eq!(runs.rules.edits, 1);
    }

    #[test]
    fn test_apply_rules_in_place() {
        let mut predicted = vec![Arc::new(replay().parses[1].clone())];
        let stats = apply_rules(&RuleSet::for_language(Language::Hindi), &mut predicted);

        assert_eq!(stats.edits, 1);
        assert_eq!(predicted[0].words[1].deprel, "iobj");
    }
}
