//! Frequency model: symbol counts, probabilities and cumulative intervals.
//!
//! Every coder consumes the [`ProbabilityModel`] ordering: descending
//! probability, ties broken by ascending symbol value.

use crate::error::{CodingError, Result};
use num::{BigInt, BigRational, One, Signed, ToPrimitive, Zero};
use std::collections::{HashMap, HashSet};
use tracing::{debug, warn};

/// One character of input text.
pub type Symbol = char;

/// Occurrence counts over one input text, kept in first-occurrence order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrequencyTable {
    counts: Vec<(Symbol, u64)>,
    total: u64,
}

impl FrequencyTable {
    pub fn from_text(text: &str) -> Self {
        let mut index: HashMap<Symbol, usize> = HashMap::new();
        let mut counts: Vec<(Symbol, u64)> = Vec::new();
        for ch in text.chars() {
            match index.get(&ch) {
                Some(&i) => counts[i].1 += 1,
                None => {
                    index.insert(ch, counts.len());
                    counts.push((ch, 1));
                }
            }
        }
        let total = counts.iter().map(|&(_, c)| c).sum();
        Self { counts, total }
    }

    pub fn count(&self, symbol: Symbol) -> Option<u64> {
        self.counts
            .iter()
            .find(|&&(s, _)| s == symbol)
            .map(|&(_, c)| c)
    }

    /// Symbols with their counts, in order of first occurrence.
    pub fn iter(&self) -> impl Iterator<Item = (Symbol, u64)> + '_ {
        self.counts.iter().copied()
    }

    /// Number of distinct symbols.
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Sum of all counts, equal to the text length in characters.
    pub fn total(&self) -> u64 {
        self.total
    }
}

/// A symbol together with its probability and its cumulative interval
/// `[low, high)` within the model ordering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbabilityEntry {
    pub symbol: Symbol,
    /// Occurrence count when the entry was derived from text.
    pub count: Option<u64>,
    pub probability: BigRational,
    pub low: BigRational,
    pub high: BigRational,
}

impl ProbabilityEntry {
    pub fn probability_f64(&self) -> f64 {
        to_f64(&self.probability)
    }

    pub fn low_f64(&self) -> f64 {
        to_f64(&self.low)
    }

    pub fn high_f64(&self) -> f64 {
        to_f64(&self.high)
    }

    /// Whether `value` lies in `[low, high)`.
    pub fn contains(&self, value: &BigRational) -> bool {
        &self.low <= value && value < &self.high
    }
}

/// Ordered probability entries with cumulative bounds partitioning `[0, 1)`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProbabilityModel {
    entries: Vec<ProbabilityEntry>,
    index: HashMap<Symbol, usize>,
}

impl ProbabilityModel {
    /// Derive the model from counted frequencies. Probabilities are exact.
    pub fn from_frequencies(frequencies: &FrequencyTable) -> Self {
        let total = BigInt::from(frequencies.total());
        let probabilities = frequencies
            .iter()
            .map(|(symbol, count)| {
                let p = BigRational::new(BigInt::from(count), total.clone());
                (symbol, Some(count), p)
            })
            .collect();
        Self::from_probabilities(probabilities)
    }

    /// Build a model from externally supplied weights.
    ///
    /// Weights are normalized so that the probabilities sum to exactly 1;
    /// a sum deviating from 1 by more than `tolerance` is logged. Zero
    /// weights are kept and get an empty interval.
    pub fn from_weights(weights: &[(Symbol, f64)], tolerance: f64) -> Result<Self> {
        if weights.is_empty() {
            return Ok(Self::default());
        }

        let mut seen = HashSet::with_capacity(weights.len());
        let mut exact = Vec::with_capacity(weights.len());
        for &(symbol, weight) in weights {
            if !seen.insert(symbol) {
                return Err(CodingError::InvalidProbabilityTable(format!(
                    "duplicate symbol {symbol:?}"
                )));
            }
            if !weight.is_finite() || weight < 0.0 {
                return Err(CodingError::InvalidProbabilityTable(format!(
                    "weight {weight} for {symbol:?} is not a finite non-negative number"
                )));
            }
            let value = BigRational::from_float(weight).ok_or_else(|| {
                CodingError::InvalidProbabilityTable(format!(
                    "weight {weight} is not representable"
                ))
            })?;
            exact.push((symbol, value));
        }

        let sum = exact
            .iter()
            .fold(BigRational::zero(), |acc, (_, w)| acc + w);
        if sum.is_zero() {
            return Err(CodingError::InvalidProbabilityTable("weights sum to zero".into()));
        }
        let sum_f64 = to_f64(&sum);
        if (sum_f64 - 1.0).abs() > tolerance {
            warn!(sum = sum_f64, "probability table does not sum to 1, normalizing");
        }

        let probabilities = exact
            .into_iter()
            .map(|(symbol, w)| (symbol, None, w / &sum))
            .collect();
        Ok(Self::from_probabilities(probabilities))
    }

    fn from_probabilities(mut probabilities: Vec<(Symbol, Option<u64>, BigRational)>) -> Self {
        probabilities.sort_by(|a, b| b.2.cmp(&a.2).then(a.0.cmp(&b.0)));

        let mut cumulative = BigRational::zero();
        let mut entries = Vec::with_capacity(probabilities.len());
        let mut index = HashMap::with_capacity(probabilities.len());
        for (symbol, count, probability) in probabilities {
            let low = cumulative.clone();
            cumulative += &probability;
            index.insert(symbol, entries.len());
            entries.push(ProbabilityEntry {
                symbol,
                count,
                probability,
                low,
                high: cumulative.clone(),
            });
        }
        Self { entries, index }
    }

    pub fn entries(&self) -> &[ProbabilityEntry] {
        &self.entries
    }

    pub fn get(&self, symbol: Symbol) -> Option<&ProbabilityEntry> {
        self.index.get(&symbol).map(|&i| &self.entries[i])
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Check the partition invariant: non-negative probabilities, contiguous
    /// bounds starting at 0, last bound exactly 1.
    pub fn validate(&self) -> Result<()> {
        let mut expected_low = BigRational::zero();
        for entry in &self.entries {
            if entry.probability.is_negative() {
                return Err(CodingError::InvalidProbabilityTable(format!(
                    "negative probability for {:?}",
                    entry.symbol
                )));
            }
            if entry.low != expected_low || entry.high != &entry.low + &entry.probability {
                return Err(CodingError::InvalidProbabilityTable(format!(
                    "interval of {:?} is not contiguous",
                    entry.symbol
                )));
            }
            expected_low = entry.high.clone();
        }
        if !self.entries.is_empty() && !expected_low.is_one() {
            return Err(CodingError::InvalidProbabilityTable(format!(
                "probabilities sum to {expected_low}, not 1"
            )));
        }
        Ok(())
    }
}

/// Result of [`analyze`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Analysis {
    pub frequencies: FrequencyTable,
    pub model: ProbabilityModel,
}

/// Count the symbols of `text` and derive the ordered probability model.
pub fn analyze(text: &str) -> Result<Analysis> {
    if text.is_empty() {
        return Err(CodingError::EmptyInput);
    }
    let frequencies = FrequencyTable::from_text(text);
    let model = ProbabilityModel::from_frequencies(&frequencies);
    debug!(
        length = frequencies.total(),
        alphabet = frequencies.len(),
        "analyzed text"
    );
    Ok(Analysis { frequencies, model })
}

pub(crate) fn to_f64(value: &BigRational) -> f64 {
    value.to_f64().unwrap_or(f64::NAN)
}
