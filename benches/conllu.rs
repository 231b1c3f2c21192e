use divan::{Bencher, black_box};
use depscore::conllu::CoNLLUReader;
use depscore::{Language, RuleSet, Treebank, apply_rules};

fn main() {
    divan::main();
}

/// Repeats a small Hindi treebank to the given number of sentences
fn corpus(sentences: usize) -> String {
    const SENTENCE: &str = "# text = राम और सीता ने रमेश को किताब दी है
1\tराम\tराम\tPROPN\t_\tCase=Nom\t9\tnsubj\t_\t_
2\tऔर\tऔर\tCCONJ\t_\t_\t3\tcc\t_\t_
3\tसीता\tसीता\tPROPN\t_\t_\t1\tconj\t_\t_
4\tने\tने\tADP\t_\t_\t3\tcase\t_\t_
5\tरमेश\tरमेश\tPROPN\t_\t_\t8\tobj\t_\t_
6\tको\tको\tADP\t_\t_\t5\tcase\t_\t_
7\tकिताब\tकिताब\tNOUN\t_\tGender=Fem\t8\tobj\t_\t_
8\tदी\tदे\tVERB\t_\t_\t0\troot\t_\t_
9\tहै\tहै\tAUX\t_\t_\t8\taux\t_\t_

";
    SENTENCE.repeat(sentences)
}

#[divan::bench(args = [100, 1000])]
fn read_string(bencher: Bencher, sentences: usize) {
    let text = corpus(sentences);
    bencher.bench_local(|| {
        for result in CoNLLUReader::from_string(black_box(&text)) {
            black_box(result.unwrap());
        }
    });
}

#[divan::bench(args = [100, 1000])]
fn apply_hindi_rules(bencher: Bencher, sentences: usize) {
    let trees = Treebank::from_string(&corpus(sentences)).load().unwrap().trees;
    let rules = RuleSet::for_language(Language::Hindi);
    bencher
        .with_inputs(|| trees.clone())
        .bench_local_values(|mut trees| black_box(apply_rules(&rules, &mut trees)));
}
