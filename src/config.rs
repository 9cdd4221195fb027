//! Configuration for source-coding

use crate::error::{CodingError, Result};
use serde::{Deserialize, Serialize};

/// Numeric representation used by the arithmetic coder for every
/// intermediate interval bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum Precision {
    /// Exact rational arithmetic. Never collapses.
    Exact,
    /// Round every intermediate value to `digits` fractional decimal digits.
    Decimal { digits: u32 },
    /// Round every intermediate value to the nearest `f64`.
    ///
    /// Precision-limited: the interval collapses after roughly a thousand
    /// symbols for a two-symbol alphabet, far sooner for larger ones.
    Float64,
}

/// How arithmetic decode maps the code value back onto symbols.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecodeStrategy {
    /// Replay the encoder's narrowing and compare the raw code against the
    /// running interval.
    TrackInterval,
    /// Rescale the code into `[0, 1)` after every decoded symbol.
    Rescale,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArithmeticConfig {
    pub precision: Precision,
    pub strategy: DecodeStrategy,
}

impl Default for ArithmeticConfig {
    fn default() -> Self {
        Self {
            precision: Precision::Exact,
            strategy: DecodeStrategy::TrackInterval,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CodingConfig {
    /// Allowed deviation of a probability sum from 1 before normalization is logged.
    pub normalization_tolerance: f64,
    pub record_traces: bool,
    pub arithmetic: ArithmeticConfig,
}

impl Default for CodingConfig {
    fn default() -> Self {
        Self {
            normalization_tolerance: 1e-6,
            record_traces: true,
            arithmetic: ArithmeticConfig::default(),
        }
    }
}

impl CodingConfig {
    /// Parse a configuration from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| CodingError::SerializationError(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = CodingConfig::default();
        assert_eq!(config.arithmetic.precision, Precision::Exact);
        assert_eq!(config.arithmetic.strategy, DecodeStrategy::TrackInterval);
        assert!(config.record_traces);
    }

    #[test]
    fn test_from_json_partial() {
        let config = CodingConfig::from_json(
            r#"{"arithmetic": {"precision": {"mode": "decimal", "digits": 30}, "strategy": "rescale"}}"#,
        )
        .unwrap();
        assert_eq!(config.arithmetic.precision, Precision::Decimal { digits: 30 });
        assert_eq!(config.arithmetic.strategy, DecodeStrategy::Rescale);
        assert_eq!(config.normalization_tolerance, 1e-6);
    }

    #[test]
    fn test_from_json_invalid() {
        let result = CodingConfig::from_json("{not json");
        assert!(matches!(result, Err(CodingError::SerializationError(_))));
    }
}
