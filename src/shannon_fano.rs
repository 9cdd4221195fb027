//! Shannon-Fano coding.
//!
//! The ordered symbol list is split recursively into a prefix and a suffix
//! whose probability masses are as close to equal as possible; the prefix
//! side gets a `0` bit, the suffix side a `1` bit. The result is prefix-free
//! but not always optimal.

use crate::code::{Code, CodeTable};
use crate::frequency::ProbabilityModel;
use num::{BigRational, Signed, Zero};
use std::ops::Range;
use tracing::{debug, trace};

/// Build a Shannon-Fano code table from an ordered probability model.
///
/// The table lists symbols in model order. An empty model yields an empty
/// table; a single-symbol model gets the code `0`.
pub fn build(model: &ProbabilityModel) -> CodeTable {
    let probabilities: Vec<&BigRational> =
        model.entries().iter().map(|e| &e.probability).collect();
    let mut codes = vec![Code::new(); probabilities.len()];
    split(&probabilities, 0..probabilities.len(), &mut codes);

    let mut table = CodeTable::new();
    for (entry, mut code) in model.entries().iter().zip(codes) {
        if code.is_empty() {
            code.push(false);
        }
        table.insert(entry.symbol, code);
    }
    debug!(symbols = table.len(), "built shannon-fano table");
    table
}

fn split(probabilities: &[&BigRational], range: Range<usize>, codes: &mut [Code]) {
    if range.len() < 2 {
        return;
    }
    let boundary = range.start + split_index(&probabilities[range.clone()]) + 1;
    trace!(start = range.start, boundary, end = range.end, "shannon-fano split");

    for code in &mut codes[range.start..boundary] {
        code.push(false);
    }
    for code in &mut codes[boundary..range.end] {
        code.push(true);
    }
    split(probabilities, range.start..boundary, codes);
    split(probabilities, boundary..range.end, codes);
}

/// Index of the last element of the left part: the first index minimizing
/// `|mass(0..=i) - mass(i+1..)|`. The right part is never empty.
fn split_index(probabilities: &[&BigRational]) -> usize {
    let total = probabilities
        .iter()
        .fold(BigRational::zero(), |acc, &p| acc + p);

    let mut left = BigRational::zero();
    let mut best_index = 0;
    let mut best_diff: Option<BigRational> = None;
    for (i, &p) in probabilities[..probabilities.len() - 1].iter().enumerate() {
        left += p;
        let right = &total - &left;
        let diff = (&left - right).abs();
        if best_diff.as_ref().map_or(true, |best| diff < *best) {
            best_diff = Some(diff);
            best_index = i;
        }
    }
    best_index
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frequency::analyze;

    fn code_of(table: &CodeTable, symbol: char) -> String {
        table.get(symbol).unwrap().to_string()
    }

    #[test]
    fn test_single_symbol() {
        let model = analyze("aaaa").unwrap().model;
        let table = build(&model);
        assert_eq!(code_of(&table, 'a'), "0");
    }

    #[test]
    fn test_two_symbols() {
        let model = analyze("aabb").unwrap().model;
        let table = build(&model);
        assert_eq!(code_of(&table, 'a'), "0");
        assert_eq!(code_of(&table, 'b'), "1");
    }

    #[test]
    fn test_empty_model() {
        assert!(build(&ProbabilityModel::default()).is_empty());
    }

    #[test]
    fn test_classic_example() {
        // a:15 b:7 c:6 d:6 e:5
        let text = format!(
            "{}{}{}{}{}",
            "a".repeat(15),
            "b".repeat(7),
            "c".repeat(6),
            "d".repeat(6),
            "e".repeat(5)
        );
        let model = analyze(&text).unwrap().model;
        let table = build(&model);
        assert_eq!(code_of(&table, 'a'), "00");
        assert_eq!(code_of(&table, 'b'), "01");
        assert_eq!(code_of(&table, 'c'), "10");
        assert_eq!(code_of(&table, 'd'), "110");
        assert_eq!(code_of(&table, 'e'), "111");
        assert!(table.is_prefix_free());
    }

    #[test]
    fn test_tie_takes_first_index() {
        // |1/3 - 2/3| == |2/3 - 1/3|, so the first index wins.
        let model = analyze("abc").unwrap().model;
        let table = build(&model);
        assert_eq!(code_of(&table, 'a'), "0");
        assert_eq!(code_of(&table, 'b'), "10");
        assert_eq!(code_of(&table, 'c'), "11");
    }

    #[test]
    fn test_table_follows_model_order() {
        let model = analyze("aaabbbccccc").unwrap().model;
        let table = build(&model);
        let symbols: Vec<_> = table.iter().map(|(s, _)| s).collect();
        assert_eq!(symbols, vec!['c', 'a', 'b']);
    }
}
