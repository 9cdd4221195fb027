//! Source entropy and per-scheme code statistics.

use crate::code::CodeTable;
use crate::frequency::ProbabilityModel;
use serde::Serialize;

/// Shannon entropy in bits, `-Σ p·log2(p)`; zero probabilities contribute 0.
pub fn entropy(model: &ProbabilityModel) -> f64 {
    entropy_of(model.entries().iter().map(|e| e.probability_f64()))
}

pub(crate) fn entropy_of(probabilities: impl IntoIterator<Item = f64>) -> f64 {
    probabilities
        .into_iter()
        .filter(|&p| p > 0.0)
        .map(|p| -p * p.log2())
        .sum()
}

/// Expected code length `Σ p·len(code)`. Symbols missing from the table
/// contribute nothing.
pub fn average_length(table: &CodeTable, model: &ProbabilityModel) -> f64 {
    model
        .entries()
        .iter()
        .filter_map(|e| table.get(e.symbol).map(|c| e.probability_f64() * c.len() as f64))
        .sum()
}

/// Fractional excess of the average length over the entropy. Zero when the
/// average length is zero.
pub fn redundancy(average_length: f64, entropy: f64) -> f64 {
    if average_length == 0.0 {
        return 0.0;
    }
    (average_length - entropy) / average_length
}

/// Kraft sum `Σ 2^-len(code)`; at most 1 for any prefix code.
pub fn kraft_sum(table: &CodeTable) -> f64 {
    table.iter().map(|(_, c)| (-(c.len() as f64)).exp2()).sum()
}

/// Statistics of one prefix code on one model.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SchemeMetrics {
    pub average_length: f64,
    pub redundancy: f64,
    pub kraft_sum: f64,
}

impl SchemeMetrics {
    pub fn compute(table: &CodeTable, model: &ProbabilityModel, entropy: f64) -> Self {
        let average_length = average_length(table, model);
        Self {
            average_length,
            redundancy: redundancy(average_length, entropy),
            kraft_sum: kraft_sum(table),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frequency::analyze;
    use crate::{huffman, shannon_fano};

    const EPS: f64 = 1e-9;

    #[test]
    fn test_single_symbol() {
        let analysis = analyze("aaaa").unwrap();
        let table = huffman::build(&analysis.frequencies);
        let h = entropy(&analysis.model);
        let avg = average_length(&table, &analysis.model);
        assert!(h.abs() < EPS);
        assert!((avg - 1.0).abs() < EPS);
        assert!((redundancy(avg, h) - 1.0).abs() < EPS);
    }

    #[test]
    fn test_two_equal_symbols() {
        let analysis = analyze("aabb").unwrap();
        let h = entropy(&analysis.model);
        assert!((h - 1.0).abs() < EPS);
        for table in [
            huffman::build(&analysis.frequencies),
            shannon_fano::build(&analysis.model),
        ] {
            let avg = average_length(&table, &analysis.model);
            assert!((avg - 1.0).abs() < EPS);
            assert!(redundancy(avg, h).abs() < EPS);
        }
    }

    #[test]
    fn test_three_symbols() {
        let analysis = analyze("aaabbbccccc").unwrap();
        let table = huffman::build(&analysis.frequencies);
        let h = entropy(&analysis.model);
        let avg = average_length(&table, &analysis.model);
        assert!((avg - 17.0 / 11.0).abs() < EPS);
        assert!((h - 1.5395).abs() < 1e-3);
        let r = redundancy(avg, h);
        assert!(r > 0.0 && r < 0.01);
    }

    #[test]
    fn test_redundancy_zero_length() {
        assert_eq!(redundancy(0.0, 0.0), 0.0);
    }

    #[test]
    fn test_missing_symbols_contribute_nothing() {
        let analysis = analyze("aabb").unwrap();
        let mut table = CodeTable::new();
        table.insert('a', "01".parse().unwrap());
        assert!((average_length(&table, &analysis.model) - 1.0).abs() < EPS);
    }

    #[test]
    fn test_kraft_sum() {
        let analysis = analyze("aaabbbccccc").unwrap();
        let metrics = SchemeMetrics::compute(
            &huffman::build(&analysis.frequencies),
            &analysis.model,
            entropy(&analysis.model),
        );
        assert!((metrics.kraft_sum - 1.0).abs() < EPS);
    }
}
