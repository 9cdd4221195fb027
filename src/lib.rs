//! source-coding: information-theoretic statistics and entropy coding of text.
//!
//! Derives three classical codes from the symbol distribution of one text:
//! - Shannon-Fano coding by recursive probability-balanced splitting
//! - Huffman coding by priority-queue merging
//! - Arithmetic coding by interval narrowing with configurable precision
//!
//! and reports entropy, average code lengths and redundancy for each.

pub mod arithmetic;
pub mod code;
pub mod config;
pub mod error;
pub mod frequency;
pub mod huffman;
pub mod joint;
pub mod metrics;
pub mod shannon_fano;

use crate::arithmetic::{
    format_decimal, parse_code, ArithmeticCoder, ArithmeticDecoding, ArithmeticEncoding,
};
use crate::code::{decode_bits, encode_text, BitSequence, CodeTable, PackedBits};
use crate::config::CodingConfig;
use crate::error::{CodingError, Result};
use crate::frequency::{analyze, Analysis, ProbabilityModel, Symbol};
use crate::metrics::SchemeMetrics;
use serde::{Deserialize, Serialize};
use tracing::debug;

pub use crate::error::CodingError as Error;

/// Fractional digits used when rendering trace intervals.
const TRACE_DIGITS: u32 = 28;

/// Prefix coding scheme selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CodingScheme {
    ShannonFano,
    Huffman,
}

/// One row of the symbol table, in model order.
#[derive(Debug, Clone, Serialize)]
pub struct SymbolRow {
    pub symbol: Symbol,
    pub count: Option<u64>,
    pub probability: f64,
    pub low: f64,
    pub high: f64,
    pub shannon_fano: Option<BitSequence>,
    pub huffman: Option<BitSequence>,
}

/// A prefix code and the text encoded with it.
#[derive(Debug, Clone, Serialize)]
pub struct SchemeReport {
    pub scheme: CodingScheme,
    pub table: CodeTable,
    pub encoded: BitSequence,
    pub packed: PackedBits,
    pub metrics: SchemeMetrics,
}

/// One narrowing step rendered for display.
#[derive(Debug, Clone, Serialize)]
pub struct StepRow {
    pub step: usize,
    /// The text encoded so far.
    pub chain: String,
    pub low: String,
    pub high: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ArithmeticReport {
    /// Decimal rendering of the code value, readable by [`parse_code`].
    pub code: String,
    pub length: usize,
    pub ideal_bits: f64,
    pub bits_per_symbol: f64,
    pub steps: Vec<StepRow>,
    #[serde(skip)]
    pub encoding: ArithmeticEncoding,
}

/// Everything the engine derives from one text.
#[derive(Debug, Clone, Serialize)]
pub struct SourceReport {
    pub length: usize,
    pub alphabet_size: usize,
    pub entropy: f64,
    pub symbols: Vec<SymbolRow>,
    pub shannon_fano: SchemeReport,
    pub huffman: SchemeReport,
    pub arithmetic: ArithmeticReport,
    #[serde(skip)]
    pub analysis: Analysis,
}

impl SourceReport {
    pub fn scheme(&self, scheme: CodingScheme) -> &SchemeReport {
        match scheme {
            CodingScheme::ShannonFano => &self.shannon_fano,
            CodingScheme::Huffman => &self.huffman,
        }
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| CodingError::SerializationError(e.to_string()))
    }
}

/// The main coding engine
#[derive(Debug, Clone)]
pub struct SourceCoder {
    config: CodingConfig,
    arithmetic: ArithmeticCoder,
}

impl SourceCoder {
    /// Create a coder with the given configuration
    pub fn new(config: CodingConfig) -> Self {
        let arithmetic = ArithmeticCoder::new(config.arithmetic).with_traces(config.record_traces);
        Self { config, arithmetic }
    }

    pub fn config(&self) -> &CodingConfig {
        &self.config
    }

    /// Run the frequency model, both prefix coders, the arithmetic coder and
    /// all metrics on `text`.
    pub fn analyze(&self, text: &str) -> Result<SourceReport> {
        let analysis = analyze(text)?;
        let model = &analysis.model;
        let entropy = metrics::entropy(model);

        let shannon_fano = self.scheme_report(CodingScheme::ShannonFano, text, &analysis, entropy)?;
        let huffman = self.scheme_report(CodingScheme::Huffman, text, &analysis, entropy)?;
        let arithmetic = self.arithmetic_report(text, model)?;

        let symbols = model
            .entries()
            .iter()
            .map(|e| SymbolRow {
                symbol: e.symbol,
                count: e.count,
                probability: e.probability_f64(),
                low: e.low_f64(),
                high: e.high_f64(),
                shannon_fano: shannon_fano.table.get(e.symbol).cloned(),
                huffman: huffman.table.get(e.symbol).cloned(),
            })
            .collect();

        debug!(
            length = analysis.frequencies.total(),
            entropy,
            fano = shannon_fano.metrics.average_length,
            huffman = huffman.metrics.average_length,
            "source analyzed"
        );
        Ok(SourceReport {
            length: analysis.frequencies.total() as usize,
            alphabet_size: model.len(),
            entropy,
            symbols,
            shannon_fano,
            huffman,
            arithmetic,
            analysis,
        })
    }

    /// Build the code table of `scheme` for an analyzed text.
    pub fn build_table(&self, scheme: CodingScheme, analysis: &Analysis) -> CodeTable {
        match scheme {
            CodingScheme::ShannonFano => shannon_fano::build(&analysis.model),
            CodingScheme::Huffman => huffman::build(&analysis.frequencies),
        }
    }

    /// Build the code table of `scheme` for a model given by weights.
    pub fn build_table_for_model(
        &self,
        scheme: CodingScheme,
        model: &ProbabilityModel,
    ) -> CodeTable {
        match scheme {
            CodingScheme::ShannonFano => shannon_fano::build(model),
            CodingScheme::Huffman => huffman::build_weighted(model),
        }
    }

    /// Build a probability model from externally supplied weights,
    /// normalizing with the configured tolerance.
    pub fn model_from_weights(&self, weights: &[(Symbol, f64)]) -> Result<ProbabilityModel> {
        ProbabilityModel::from_weights(weights, self.config.normalization_tolerance)
    }

    pub fn decode_prefix(&self, bits: &BitSequence, table: &CodeTable) -> Result<String> {
        decode_bits(bits, table)
    }

    pub fn encode_arithmetic(
        &self,
        text: &str,
        model: &ProbabilityModel,
    ) -> Result<ArithmeticEncoding> {
        self.arithmetic.encode(text, model)
    }

    /// Decode a textual code value (`0.375`, `0,375` or `3/8`).
    pub fn decode_arithmetic(
        &self,
        code: &str,
        length: usize,
        model: &ProbabilityModel,
    ) -> Result<ArithmeticDecoding> {
        let code = parse_code(code)?;
        self.arithmetic.decode(&code, length, model)
    }

    fn scheme_report(
        &self,
        scheme: CodingScheme,
        text: &str,
        analysis: &Analysis,
        entropy: f64,
    ) -> Result<SchemeReport> {
        let table = self.build_table(scheme, analysis);
        let encoded = encode_text(text, &table)?;
        let packed = encoded.pack()?;
        let metrics = SchemeMetrics::compute(&table, &analysis.model, entropy);
        Ok(SchemeReport {
            scheme,
            table,
            encoded,
            packed,
            metrics,
        })
    }

    fn arithmetic_report(&self, text: &str, model: &ProbabilityModel) -> Result<ArithmeticReport> {
        let encoding = self.arithmetic.encode(text, model)?;
        let mut chain = String::new();
        let steps = encoding
            .trace
            .iter()
            .map(|step| {
                chain.push(step.symbol);
                StepRow {
                    step: step.step,
                    chain: chain.clone(),
                    low: format_decimal(&step.interval.low, TRACE_DIGITS),
                    high: format_decimal(&step.interval.high, TRACE_DIGITS),
                }
            })
            .collect();
        Ok(ArithmeticReport {
            code: encoding.code_decimal(),
            length: encoding.length,
            ideal_bits: encoding.ideal_bits(),
            bits_per_symbol: encoding.bits_per_symbol(),
            steps,
            encoding,
        })
    }
}

impl Default for SourceCoder {
    fn default() -> Self {
        Self::new(CodingConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_analyze_report() {
        let coder = SourceCoder::default();
        let report = coder.analyze("aaabbbccccc").unwrap();
        assert_eq!(report.length, 11);
        assert_eq!(report.alphabet_size, 3);
        assert_eq!(report.symbols[0].symbol, 'c');
        assert_eq!(report.symbols[0].count, Some(5));
        assert_eq!(report.huffman.table.get('c').unwrap().to_string(), "0");
        assert_eq!(report.huffman.encoded.len(), 17);
        assert_eq!(report.huffman.packed.bytes.len(), 3);
        assert_eq!(report.arithmetic.steps.len(), 11);
        assert_eq!(report.arithmetic.steps[2].chain, "aaa");
    }

    #[test]
    fn test_analyze_empty() {
        let coder = SourceCoder::default();
        assert!(matches!(coder.analyze(""), Err(CodingError::EmptyInput)));
    }

    #[test]
    fn test_roundtrip_prefix_schemes() {
        let coder = SourceCoder::default();
        let text = "the quick brown fox jumps over the lazy dog";
        let report = coder.analyze(text).unwrap();
        for scheme in [CodingScheme::ShannonFano, CodingScheme::Huffman] {
            let scheme_report = report.scheme(scheme);
            let decoded = coder
                .decode_prefix(&scheme_report.encoded, &scheme_report.table)
                .unwrap();
            assert_eq!(decoded, text, "roundtrip failed for {:?}", scheme);
        }
    }

    #[test]
    fn test_roundtrip_arithmetic_text_code() {
        let coder = SourceCoder::default();
        let text = "arithmetic coding";
        let report = coder.analyze(text).unwrap();
        let decoded = coder
            .decode_arithmetic(&report.arithmetic.code, report.length, &report.analysis.model)
            .unwrap();
        assert_eq!(decoded.text, text);
    }

    #[test]
    fn test_traces_disabled() {
        let config = CodingConfig {
            record_traces: false,
            ..CodingConfig::default()
        };
        let report = SourceCoder::new(config).analyze("abcabc").unwrap();
        assert!(report.arithmetic.steps.is_empty());
        assert_eq!(report.arithmetic.length, 6);
    }

    #[test]
    fn test_weighted_model_tables() {
        let coder = SourceCoder::default();
        let model = coder.model_from_weights(&[('a', 0.3), ('b', 0.3), ('c', 0.3)]).unwrap();
        let fano = coder.build_table_for_model(CodingScheme::ShannonFano, &model);
        let huffman = coder.build_table_for_model(CodingScheme::Huffman, &model);
        assert!(fano.is_prefix_free());
        assert!(huffman.is_prefix_free());
        assert_eq!(huffman.len(), 3);
    }

    #[test]
    fn test_report_json() {
        let report = SourceCoder::default().analyze("aabb").unwrap();
        let json = report.to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["length"], 4);
        assert_eq!(value["huffman"]["table"]["a"], "0");
        assert_eq!(value["huffman"]["scheme"], "Huffman");
        assert_eq!(value["arithmetic"]["steps"][0]["chain"], "a");
    }
}
