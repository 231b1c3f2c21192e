//! Scoring by raw line pairing
//!
//! The weaker of the two scoring modes: the gold and predicted files are
//! zipped line by line with no sentence re-alignment. A gold blank line ends
//! a sentence (for exact match), gold comments are passed over, and rows are
//! compared column by column as raw text. Use it on system output written
//! line-for-line against the gold file; use [`crate::score`] otherwise.

use crate::bytes::{self, DEPREL, FEATS, HEAD, ID, MIN_COLUMNS, UPOS};
use crate::score::Evaluation;
use crate::tree::Features;
use bstr::ByteSlice;

/// Score two CoNLL-U texts line by line
pub fn score_lines(gold: &[u8], predicted: &[u8]) -> Evaluation {
    let mut eval = Evaluation::new();
    // (tokens in the open sentence, all of them matched so far)
    let mut sentence = (0usize, true);

    let mut gold_lines = gold.lines();
    let mut pred_lines = predicted.lines();
    let mut line_num = 0;

    loop {
        let (g, p) = match (gold_lines.next(), pred_lines.next()) {
            (Some(g), Some(p)) => (g, p),
            (None, None) => break,
            (rest_g, rest_p) => {
                let extra = usize::from(rest_g.is_some()) + usize::from(rest_p.is_some());
                eval.unpaired = extra + gold_lines.by_ref().count() + pred_lines.by_ref().count();
                log::warn!(
                    "files differ in length; {} trailing lines not compared",
                    eval.unpaired
                );
                break;
            }
        };
        line_num += 1;

        if bytes::is_blank(g) {
            if !bytes::is_blank(p) {
                log::warn!("line {}: gold sentence ends but prediction does not", line_num);
            }
            close_sentence(&mut eval, &mut sentence);
            continue;
        }
        if bytes::is_comment(g) {
            continue;
        }

        let gf = bytes::split_fields(g);
        let pf = bytes::split_fields(p);
        if gf.len() < MIN_COLUMNS || pf.len() < MIN_COLUMNS {
            eval.malformed_rows += 1;
            log::warn!(
                "line {}: skipping row with {} gold / {} predicted columns",
                line_num,
                gf.len(),
                pf.len()
            );
            continue;
        }
        if bytes::is_excluded_id(gf[ID]) {
            eval.excluded_rows += 1;
            continue;
        }

        let head = gf[HEAD] == pf[HEAD];
        let both = head && gf[DEPREL] == pf[DEPREL];
        eval.uas.record(head);
        eval.las.record(both);
        eval.upos.record(gf[UPOS] == pf[UPOS]);
        eval.feats.record(
            Features::parse(&gf[FEATS].to_str_lossy()) == Features::parse(&pf[FEATS].to_str_lossy()),
        );
        eval.record_label(&gf[DEPREL].to_str_lossy(), both);

        sentence.0 += 1;
        sentence.1 &= both;
    }

    close_sentence(&mut eval, &mut sentence);
    eval
}

fn close_sentence(eval: &mut Evaluation, sentence: &mut (usize, bool)) {
    if sentence.0 > 0 {
        eval.processed += 1;
        eval.exact_match.record(sentence.1);
    }
    *sentence = (0, true);
}
