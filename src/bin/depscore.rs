//! depscore: score dependency parses against a gold treebank
//!
//! Usage:
//!   depscore score gold.conllu predicted.conllu --lang hi --rules --labels
//!   depscore lines gold.conllu predicted.conllu
//!   depscore compare gold.conllu predicted.conllu --sentence 3
//!   depscore split mr चित्रकारांनी टेबलावर
//!   depscore eval gold.conllu --parser "my-parser --lang mr" --lang mr --rules --limit 100

use clap::{Parser, Subcommand, ValueEnum};
use depscore::{
    CachedParser, CommandParser, Comparison, EvalConfig, EvalError, Evaluation, Language,
    MorphSplitter, ReadStats, RootPolicy, Treebank, apply_rules, score_corpus, score_lines,
};
use mimalloc::MiMalloc;
use std::process::ExitCode;
use std::sync::Arc;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[derive(Parser)]
#[command(name = "depscore")]
#[command(version, about = "Dependency parse evaluation and rule-based correction")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Score predicted trees against gold trees, sentence by sentence
    Score {
        /// Gold CoNLL-U file or glob pattern
        gold: String,
        /// Predicted CoNLL-U file or glob pattern
        predicted: String,
        #[command(flatten)]
        rules: RuleArgs,
        /// Print per-label precision
        #[arg(long)]
        labels: bool,
    },

    /// Score two files by pairing their lines
    Lines {
        gold: String,
        predicted: String,
        #[arg(long)]
        labels: bool,
    },

    /// Show predicted and gold attachments side by side
    Compare {
        gold: String,
        predicted: String,
        /// 1-based sentence number
        #[arg(short, long, default_value_t = 1)]
        sentence: usize,
    },

    /// Print morphological splits of tokens
    Split {
        language: Language,
        #[arg(required = true)]
        tokens: Vec<String>,
    },

    /// Parse gold sentence text with an external command and score the output
    Eval {
        gold: String,
        /// Command that reads a sentence on stdin and prints CoNLL-U
        #[arg(short, long)]
        parser: String,
        #[command(flatten)]
        rules: RuleArgs,
        /// Process sentences in the calling thread
        #[arg(long)]
        sequential: bool,
        /// Evaluate only the first N gold sentences
        #[arg(short = 'n', long)]
        limit: Option<usize>,
        #[arg(long)]
        labels: bool,
    },
}

#[derive(clap::Args)]
struct RuleArgs {
    /// Language of the treebank
    #[arg(short, long, default_value = "hi")]
    lang: Language,
    /// Apply the language's correction rules to the predicted trees
    #[arg(long)]
    rules: bool,
    #[arg(long, value_enum, default_value_t = PolicyArg::KeepPromoted)]
    root_policy: PolicyArg,
}

#[derive(Clone, Copy, ValueEnum)]
enum PolicyArg {
    KeepPromoted,
    Preserve,
}

impl From<PolicyArg> for RootPolicy {
    fn from(arg: PolicyArg) -> Self {
        match arg {
            PolicyArg::KeepPromoted => RootPolicy::KeepPromoted,
            PolicyArg::Preserve => RootPolicy::Preserve,
        }
    }
}

impl RuleArgs {
    fn config(&self) -> EvalConfig {
        EvalConfig {
            apply_rules: self.rules,
            root_policy: self.root_policy.into(),
            ..EvalConfig::new(self.lang)
        }
    }
}

fn init_logging() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
}

fn add_read_stats(eval: &mut Evaluation, stats: &ReadStats) {
    eval.excluded_rows += stats.excluded_rows;
    eval.malformed_rows += stats.malformed_rows;
}

fn print_evaluation(eval: &Evaluation, labels: bool) {
    println!("{}", eval);
    if labels {
        println!();
        print!("{}", eval.label_report());
    }
}

fn run(cli: Cli) -> Result<(), EvalError> {
    match cli.command {
        Commands::Score {
            gold,
            predicted,
            rules,
            labels,
        } => {
            let gold = Treebank::from_arg(&gold)?.load()?;
            let mut predicted = Treebank::from_arg(&predicted)?.load()?;
            if let Some(rule_set) = rules.config().rule_set() {
                apply_rules(&rule_set, &mut predicted.trees);
            }
            let mut eval = score_corpus(&gold.trees, &predicted.trees);
            add_read_stats(&mut eval, &gold.stats);
            add_read_stats(&mut eval, &predicted.stats);
            print_evaluation(&eval, labels);
        }
        Commands::Lines {
            gold,
            predicted,
            labels,
        } => {
            let gold = Treebank::from_arg(&gold)?.contents()?;
            let predicted = Treebank::from_arg(&predicted)?.contents()?;
            print_evaluation(&score_lines(&gold, &predicted), labels);
        }
        Commands::Compare {
            gold,
            predicted,
            sentence,
        } => {
            let gold = Treebank::from_arg(&gold)?.load()?;
            let predicted = Treebank::from_arg(&predicted)?.load()?;
            let index = sentence.saturating_sub(1);
            match (gold.trees.get(index), predicted.trees.get(index)) {
                (Some(gold), Some(predicted)) => println!("{}", Comparison::new(predicted, gold)),
                _ => log::warn!(
                    "sentence {} not found ({} gold, {} predicted)",
                    sentence,
                    gold.len(),
                    predicted.len()
                ),
            }
        }
        Commands::Split { language, tokens } => {
            let splitter = MorphSplitter::new(language);
            for token in tokens {
                println!("{}\t{}", token, splitter.split(&token).morphs().join(" + "));
            }
        }
        Commands::Eval {
            gold,
            parser,
            rules,
            sequential,
            limit,
            labels,
        } => {
            let mut corpus = Treebank::from_arg(&gold)?.load()?;
            if let Some(limit) = limit {
                corpus.truncate(limit);
            }
            let parser = Arc::new(CachedParser::new(CommandParser::from_command_line(&parser)?));
            let config = EvalConfig {
                parallel: !sequential,
                ..rules.config()
            };
            let evaluator = config.evaluator(parser);
            if config.apply_rules {
                let mut runs = evaluator.compare_runs(&corpus.trees)?;
                add_read_stats(&mut runs.baseline, &corpus.stats);
                add_read_stats(&mut runs.corrected, &corpus.stats);
                print_evaluation(&runs.corrected, labels);
                println!();
                println!("{}", runs);
            } else {
                let (mut eval, _) = evaluator.evaluate(&corpus.trees)?;
                add_read_stats(&mut eval, &corpus.stats);
                print_evaluation(&eval, labels);
            }
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    init_logging();
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
