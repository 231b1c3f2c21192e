//! Rule-based correction of parser output
//!
//! A [`RuleSet`] runs an ordered list of [`Rule`]s over a predicted sentence.
//! Rules do not mutate the sentence themselves: each one inspects the tree
//! and proposes [`Edit`]s, which can only touch `head` and `deprel`. The set
//! applies a rule's edits before running the next rule, so later rules see
//! what earlier ones did. There is one pass and no reordering.
//!
//! Every rule must be idempotent: running the set on its own output changes
//! nothing. Rules key off form, tag and morphological split, which no rule
//! rewrites.

use crate::morph::{Language, MorphAnalyzer, MorphSplitter, Split};
use crate::tree::{Tree, Word};

/// A change to one word's attachment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edit {
    /// Position in `tree.words`
    pub index: usize,
    pub head: Option<usize>,
    pub deprel: Option<&'static str>,
}

impl Edit {
    pub fn relabel(index: usize, deprel: &'static str) -> Self {
        Self {
            index,
            head: None,
            deprel: Some(deprel),
        }
    }

    pub fn attach(index: usize, head: usize, deprel: &'static str) -> Self {
        Self {
            index,
            head: Some(head),
            deprel: Some(deprel),
        }
    }

    /// Apply to a word; false when it already had these values
    fn apply_to(&self, word: &mut Word) -> bool {
        let mut changed = false;
        if let Some(head) = self.head {
            changed |= word.head != head;
            word.head = head;
        }
        if let Some(deprel) = self.deprel {
            changed |= word.deprel != deprel;
            word.deprel = deprel.to_string();
        }
        changed
    }
}

/// A correction rule
///
/// `splits[i]` is the morphological split of `tree.words[i].form`. A rule
/// must return no edit for words it does not apply to.
pub trait Rule: Send + Sync {
    fn name(&self) -> &'static str;

    fn edits(&self, tree: &Tree, splits: &[Split]) -> Vec<Edit>;
}

/// What to do when a sentence does not have exactly one root after rules
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RootPolicy {
    /// Keep the root a rule promoted (else the first root); attach the
    /// others to it as `dep`
    #[default]
    KeepPromoted,
    /// Leave the sentence as the rules produced it, only warn
    Preserve,
}

/// Root count problem found after rule application
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RootConflict {
    /// No word is attached to 0
    Missing,
    /// Ids of all words attached to 0, in order
    Multiple(Vec<usize>),
}

/// Rule firings for one sentence
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleReport {
    /// (rule name, words changed), in rule order
    pub fired: Vec<(&'static str, usize)>,
    pub root_conflict: Option<RootConflict>,
}

impl RuleReport {
    pub fn changed(&self) -> usize {
        self.fired.iter().map(|(_, n)| n).sum()
    }
}

/// Ordered rules for one language plus the splitter that gates them
pub struct RuleSet {
    splitter: MorphSplitter,
    rules: Vec<Box<dyn Rule>>,
    root_policy: RootPolicy,
}

impl RuleSet {
    pub fn new(splitter: MorphSplitter, rules: Vec<Box<dyn Rule>>) -> Self {
        Self {
            splitter,
            rules,
            root_policy: RootPolicy::default(),
        }
    }

    /// Built-in rules for a language, gated by the suffix table alone
    pub fn for_language(language: Language) -> Self {
        Self::new(MorphSplitter::new(language), default_rules(language))
    }

    /// Built-in rules with an external analyzer in front of the suffix table
    pub fn with_analyzer(language: Language, analyzer: Box<dyn MorphAnalyzer>) -> Self {
        Self::new(
            MorphSplitter::with_analyzer(language, analyzer),
            default_rules(language),
        )
    }

    pub fn root_policy(mut self, policy: RootPolicy) -> Self {
        self.root_policy = policy;
        self
    }

    pub fn language(&self) -> Language {
        self.splitter.language()
    }

    pub fn rule_names(&self) -> Vec<&'static str> {
        self.rules.iter().map(|r| r.name()).collect()
    }

    /// Run every rule in order, then check the root
    pub fn apply(&self, tree: &mut Tree) -> RuleReport {
        let roots_before = tree.roots();
        let splits: Vec<Split> = tree
            .words
            .iter()
            .map(|w| self.splitter.split(&w.form))
            .collect();

        let mut report = RuleReport::default();
        for rule in &self.rules {
            let mut changed = 0;
            for edit in rule.edits(tree, &splits) {
                if let Some(word) = tree.words.get_mut(edit.index) {
                    if edit.apply_to(word) {
                        log::debug!("{}: {} -> {} {}", rule.name(), word.form, word.head, word.deprel);
                        changed += 1;
                    }
                }
            }
            if changed > 0 {
                report.fired.push((rule.name(), changed));
            }
        }

        report.root_conflict = check_root(tree, self.root_policy, &roots_before);
        report
    }
}

/// Enforce the single-root invariant according to `policy`
///
/// `roots_before` are the roots the sentence had before any rule ran; a
/// root not among them was promoted by a rule and wins over older ones.
pub fn check_root(
    tree: &mut Tree,
    policy: RootPolicy,
    roots_before: &[usize],
) -> Option<RootConflict> {
    if tree.is_empty() {
        return None;
    }
    let roots = tree.roots();
    match roots.len() {
        1 => None,
        0 => {
            log::warn!("sentence {:?} has no root", tree.text());
            Some(RootConflict::Missing)
        }
        _ => {
            log::warn!("sentence {:?} has roots {:?}", tree.text(), roots);
            if policy == RootPolicy::KeepPromoted {
                let keep = roots
                    .iter()
                    .copied()
                    .find(|id| !roots_before.contains(id))
                    .unwrap_or(roots[0]);
                for word in tree.words.iter_mut().filter(|w| w.is_root() && w.id != keep) {
                    word.head = keep;
                    word.deprel = "dep".to_string();
                }
            }
            Some(RootConflict::Multiple(roots))
        }
    }
}

fn default_rules(language: Language) -> Vec<Box<dyn Rule>> {
    match language {
        Language::Hindi => vec![
            Box::new(DativeObject),
            Box::new(Coordination),
            Box::new(RelativeMarker),
            Box::new(CopulaRoot),
            Box::new(FocusParticle),
        ],
        Language::Marathi => vec![
            Box::new(InstrumentalOblique),
            Box::new(PossessiveMarker),
            Box::new(ErgativeSubject),
        ],
    }
}

/// `obj` → `iobj` when the dative `को` is split off
pub struct DativeObject;

impl Rule for DativeObject {
    fn name(&self) -> &'static str {
        "dative-object"
    }

    fn edits(&self, tree: &Tree, splits: &[Split]) -> Vec<Edit> {
        tree.words
            .iter()
            .zip(splits)
            .enumerate()
            .filter(|(_, (w, s))| w.deprel == "obj" && s.isolates("को"))
            .map(|(i, _)| Edit::relabel(i, "iobj"))
            .collect()
    }
}

/// `और` becomes `cc`; a proper noun after it becomes `conj` of the first conjunct
pub struct Coordination;

impl Rule for Coordination {
    fn name(&self) -> &'static str {
        "coordination"
    }

    fn edits(&self, tree: &Tree, _splits: &[Split]) -> Vec<Edit> {
        let words = &tree.words;
        let mut edits = Vec::new();
        for (i, word) in words.iter().enumerate() {
            if word.form == "और" && word.upos == "CCONJ" {
                edits.push(Edit::relabel(i, "cc"));
            }
            if i > 0 && words[i - 1].form == "और" && word.upos == "PROPN" {
                match i.checked_sub(2).map(|j| &words[j]) {
                    Some(first) => edits.push(Edit::attach(i, first.id, "conj")),
                    None => edits.push(Edit::relabel(i, "conj")),
                }
            }
        }
        edits
    }
}

/// Relative pronouns `जो`, `जिसने` become `mark` of the first verb
pub struct RelativeMarker;

impl Rule for RelativeMarker {
    fn name(&self) -> &'static str {
        "relative-marker"
    }

    fn edits(&self, tree: &Tree, _splits: &[Split]) -> Vec<Edit> {
        let Some(verb) = tree.words.iter().find(|w| w.upos == "VERB") else {
            return Vec::new();
        };
        tree.words
            .iter()
            .enumerate()
            .filter(|(_, w)| w.upos == "PRON" && matches!(w.form.as_str(), "जो" | "जिसने"))
            .map(|(i, _)| Edit::attach(i, verb.id, "mark"))
            .collect()
    }
}

/// The copula `है` becomes the root
pub struct CopulaRoot;

impl Rule for CopulaRoot {
    fn name(&self) -> &'static str {
        "copula-root"
    }

    fn edits(&self, tree: &Tree, _splits: &[Split]) -> Vec<Edit> {
        tree.words
            .iter()
            .enumerate()
            .filter(|(_, w)| w.form == "है" && w.upos == "AUX" && w.deprel != "root")
            .map(|(i, _)| Edit::attach(i, 0, "root"))
            .collect()
    }
}

/// A standalone `भी` labelled `dep` becomes `advmod`
pub struct FocusParticle;

impl Rule for FocusParticle {
    fn name(&self) -> &'static str {
        "focus-particle"
    }

    fn edits(&self, tree: &Tree, splits: &[Split]) -> Vec<Edit> {
        tree.words
            .iter()
            .zip(splits)
            .enumerate()
            .filter(|(_, (w, s))| w.deprel == "dep" && s.isolates("भी"))
            .map(|(i, _)| Edit::relabel(i, "advmod"))
            .collect()
    }
}

/// Instrumental case (`Case=Ins`) becomes `obl`
pub struct InstrumentalOblique;

impl Rule for InstrumentalOblique {
    fn name(&self) -> &'static str {
        "instrumental-oblique"
    }

    fn edits(&self, tree: &Tree, _splits: &[Split]) -> Vec<Edit> {
        tree.words
            .iter()
            .enumerate()
            .filter(|(_, w)| w.feats.has("Case", "Ins"))
            .map(|(i, _)| Edit::relabel(i, "obl"))
            .collect()
    }
}

/// Possessive markers `चा`, `चे`, `ची` attach to the preceding word as `case`
pub struct PossessiveMarker;

impl Rule for PossessiveMarker {
    fn name(&self) -> &'static str {
        "possessive-marker"
    }

    fn edits(&self, tree: &Tree, _splits: &[Split]) -> Vec<Edit> {
        tree.words
            .windows(2)
            .enumerate()
            .filter(|(_, pair)| matches!(pair[1].form.as_str(), "चा" | "चे" | "ची"))
            .map(|(i, pair)| Edit::attach(i + 1, pair[0].id, "case"))
            .collect()
    }
}

/// An `nsubj` carrying a split-off ergative marker becomes `nsubj:erg`
pub struct ErgativeSubject;

impl Rule for ErgativeSubject {
    fn name(&self) -> &'static str {
        "ergative-subject"
    }

    fn edits(&self, tree: &Tree, splits: &[Split]) -> Vec<Edit> {
        tree.words
            .iter()
            .zip(splits)
            .enumerate()
            .filter(|(_, (w, s))| {
                w.deprel == "nsubj" && matches!(s.suffix(), Some("ांनी" | "ने"))
            })
            .map(|(i, _)| Edit::relabel(i, "nsubj:erg"))
            .collect()
    }
}
