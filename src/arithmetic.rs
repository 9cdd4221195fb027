//! Arithmetic (range) coding over the cumulative intervals of a
//! [`ProbabilityModel`].
//!
//! Encoding narrows `[low, high)` once per symbol and emits the midpoint of
//! the final interval. Decoding needs the code value, the text length and the
//! same model. All arithmetic is carried out on `BigRational`; the
//! configured [`Precision`] decides whether intermediate values are rounded.
//!
//! Under a bounded precision the coder refuses to continue once the current
//! interval can no longer give every symbol of the model a non-empty
//! sub-interval. Encode reports this as `PrecisionExhausted`, decode as
//! `AmbiguousInterval`; both check the same intervals, so anything encode
//! accepts decodes.

use crate::config::{ArithmeticConfig, DecodeStrategy, Precision};
use crate::error::{CodingError, Result};
use crate::frequency::{ProbabilityEntry, ProbabilityModel, Symbol};
use num::{BigInt, BigRational, Integer, One, Signed, ToPrimitive, Zero};
use tracing::debug;

/// Current coding state `[low, high)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interval {
    pub low: BigRational,
    pub high: BigRational,
}

impl Interval {
    pub fn unit() -> Self {
        Self {
            low: BigRational::zero(),
            high: BigRational::one(),
        }
    }

    pub fn width(&self) -> BigRational {
        &self.high - &self.low
    }

    pub fn midpoint(&self) -> BigRational {
        (&self.low + &self.high) / BigRational::from_integer(BigInt::from(2))
    }

    pub fn contains(&self, value: &BigRational) -> bool {
        &self.low <= value && value < &self.high
    }

    pub fn is_empty(&self) -> bool {
        self.low >= self.high
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodeStep {
    /// 1-based step number.
    pub step: usize,
    pub symbol: Symbol,
    /// Interval after narrowing by `symbol`.
    pub interval: Interval,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeStep {
    pub step: usize,
    pub symbol: Symbol,
    /// Value that was looked up: the raw code when tracking the interval,
    /// the rescaled code when rescaling.
    pub value: BigRational,
    pub interval: Interval,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArithmeticEncoding {
    pub code: BigRational,
    /// Number of encoded symbols; decode needs it.
    pub length: usize,
    pub interval: Interval,
    pub trace: Vec<EncodeStep>,
}

impl ArithmeticEncoding {
    /// Information content of the final interval, `-log2(high - low)`.
    pub fn ideal_bits(&self) -> f64 {
        let width = self.interval.width();
        if width.is_zero() {
            return f64::INFINITY;
        }
        -(log2_int(width.numer()) - log2_int(width.denom()))
    }

    pub fn bits_per_symbol(&self) -> f64 {
        if self.length == 0 {
            return 0.0;
        }
        self.ideal_bits() / self.length as f64
    }

    /// The code rendered with just enough decimal digits to stay inside the
    /// final interval; [`parse_code`] reads it back.
    pub fn code_decimal(&self) -> String {
        let digits = (self.ideal_bits() * std::f64::consts::LOG10_2).ceil().max(0.0) as u32 + 2;
        format_decimal(&self.code, digits)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArithmeticDecoding {
    pub text: String,
    pub trace: Vec<DecodeStep>,
}

/// Arithmetic coder bound to one precision and decode strategy.
#[derive(Debug, Clone)]
pub struct ArithmeticCoder {
    config: ArithmeticConfig,
    record_traces: bool,
}

impl ArithmeticCoder {
    pub fn new(config: ArithmeticConfig) -> Self {
        Self {
            config,
            record_traces: true,
        }
    }

    /// Enable or disable per-step traces. Exact-precision traces grow
    /// quadratically with the input length.
    pub fn with_traces(mut self, record_traces: bool) -> Self {
        self.record_traces = record_traces;
        self
    }

    pub fn config(&self) -> &ArithmeticConfig {
        &self.config
    }

    /// Encode `text` against `model`.
    pub fn encode(&self, text: &str, model: &ProbabilityModel) -> Result<ArithmeticEncoding> {
        model.validate()?;

        let mut interval = Interval::unit();
        let mut trace = Vec::new();
        let mut length = 0;
        for (i, symbol) in text.chars().enumerate() {
            let step = i + 1;
            let entry = model
                .get(symbol)
                .filter(|e| e.probability.is_positive())
                .ok_or(CodingError::UnknownSymbol(symbol))?;
            if !self.resolves_all(&interval, model) {
                return Err(CodingError::PrecisionExhausted { step });
            }
            interval = self.narrow(&interval, entry);
            if interval.is_empty() {
                return Err(CodingError::PrecisionExhausted { step });
            }
            if self.record_traces {
                trace.push(EncodeStep {
                    step,
                    symbol,
                    interval: interval.clone(),
                });
            }
            length = step;
        }

        let code = self.quantize(interval.midpoint());
        if !interval.contains(&code) {
            return Err(CodingError::PrecisionExhausted { step: length });
        }
        if self.config.strategy == DecodeStrategy::Rescale
            && self.config.precision != Precision::Exact
        {
            self.verify_rescale(&code, text, length, model)?;
        }
        debug!(length, precision = ?self.config.precision, "arithmetic encode");
        Ok(ArithmeticEncoding {
            code,
            length,
            interval,
            trace,
        })
    }

    /// Recover `length` symbols from `code`.
    pub fn decode(
        &self,
        code: &BigRational,
        length: usize,
        model: &ProbabilityModel,
    ) -> Result<ArithmeticDecoding> {
        model.validate()?;
        let ambiguous = |step: usize, value: &BigRational| CodingError::AmbiguousInterval {
            step,
            code: format_decimal(value, 12),
        };
        if code.is_negative() || code >= &BigRational::one() {
            return Err(ambiguous(1, code));
        }

        let mut interval = Interval::unit();
        let mut value = code.clone();
        let mut text = String::with_capacity(length);
        let mut trace = Vec::new();
        for step in 1..=length {
            if !self.resolves_all(&interval, model) {
                return Err(ambiguous(step, &value));
            }
            let tracked = self.locate_in_interval(&interval, code, model);
            let entry = match self.config.strategy {
                DecodeStrategy::TrackInterval => tracked,
                DecodeStrategy::Rescale => {
                    let rescaled = locate(&value, model);
                    // Rounded rescaling can drift away from the rounded narrowing.
                    if self.config.precision != Precision::Exact
                        && rescaled.map(|e| e.symbol) != tracked.map(|e| e.symbol)
                    {
                        return Err(ambiguous(step, &value));
                    }
                    rescaled
                }
            }
            .ok_or_else(|| ambiguous(step, &value))?;

            interval = self.narrow(&interval, entry);
            if interval.is_empty() {
                return Err(ambiguous(step, &value));
            }
            text.push(entry.symbol);
            if self.record_traces {
                trace.push(DecodeStep {
                    step,
                    symbol: entry.symbol,
                    value: value.clone(),
                    interval: interval.clone(),
                });
            }
            if self.config.strategy == DecodeStrategy::Rescale {
                let offset = self.quantize(&value - &entry.low);
                value = self.quantize(offset / &entry.probability);
            }
        }

        debug!(length, strategy = ?self.config.strategy, "arithmetic decode");
        Ok(ArithmeticDecoding { text, trace })
    }

    /// Replay a rescaling decode of a fresh code and report where it stops
    /// reproducing `text`.
    fn verify_rescale(
        &self,
        code: &BigRational,
        text: &str,
        length: usize,
        model: &ProbabilityModel,
    ) -> Result<()> {
        let replay = self.clone().with_traces(false);
        match replay.decode(code, length, model) {
            Ok(decoded) if decoded.text == text => Ok(()),
            Ok(decoded) => {
                let step = decoded
                    .text
                    .chars()
                    .zip(text.chars())
                    .position(|(a, b)| a != b)
                    .map_or(length, |i| i + 1);
                Err(CodingError::PrecisionExhausted { step })
            }
            Err(CodingError::AmbiguousInterval { step, .. }) => {
                Err(CodingError::PrecisionExhausted { step })
            }
            Err(e) => Err(e),
        }
    }

    fn quantize(&self, value: BigRational) -> BigRational {
        match self.config.precision {
            Precision::Exact => value,
            Precision::Decimal { digits } => {
                let scale = BigRational::from_integer(BigInt::from(10u32).pow(digits));
                (value * &scale).round() / scale
            }
            Precision::Float64 => value
                .to_f64()
                .and_then(BigRational::from_float)
                .unwrap_or(value),
        }
    }

    /// `low + width * bound`, rounded after every operation.
    fn scale_into(
        &self,
        interval: &Interval,
        width: &BigRational,
        bound: &BigRational,
    ) -> BigRational {
        let offset = self.quantize(width * bound);
        self.quantize(&interval.low + offset)
    }

    fn narrow(&self, interval: &Interval, entry: &ProbabilityEntry) -> Interval {
        let width = self.quantize(interval.width());
        Interval {
            low: self.scale_into(interval, &width, &entry.low),
            high: self.scale_into(interval, &width, &entry.high),
        }
    }

    /// Whether every symbol with positive probability still maps to a
    /// non-empty sub-interval of `interval`.
    fn resolves_all(&self, interval: &Interval, model: &ProbabilityModel) -> bool {
        if self.config.precision == Precision::Exact {
            return true;
        }
        model
            .entries()
            .iter()
            .filter(|e| e.probability.is_positive())
            .all(|e| !self.narrow(interval, e).is_empty())
    }

    /// Find the entry whose narrowed sub-interval of `interval` holds `code`.
    fn locate_in_interval<'m>(
        &self,
        interval: &Interval,
        code: &BigRational,
        model: &'m ProbabilityModel,
    ) -> Option<&'m ProbabilityEntry> {
        let width = self.quantize(interval.width());
        let entries = model.entries();
        let i = entries.partition_point(|e| &self.scale_into(interval, &width, &e.high) <= code);
        let entry = entries.get(i)?;
        (&self.scale_into(interval, &width, &entry.low) <= code).then_some(entry)
    }
}

impl Default for ArithmeticCoder {
    fn default() -> Self {
        Self::new(ArithmeticConfig::default())
    }
}

/// Find the entry whose cumulative interval holds `value`. Bounds are
/// non-decreasing in model order, so a binary search over upper bounds
/// finds the same entry as a linear scan.
fn locate<'m>(value: &BigRational, model: &'m ProbabilityModel) -> Option<&'m ProbabilityEntry> {
    let entries = model.entries();
    let i = entries.partition_point(|e| &e.high <= value);
    entries.get(i).filter(|e| e.contains(value))
}

fn log2_int(n: &BigInt) -> f64 {
    let bits = n.bits();
    let shift = bits.saturating_sub(64);
    let top = (n >> shift).to_f64().unwrap_or(f64::NAN);
    top.log2() + shift as f64
}

/// Parse a code value written as a decimal fraction (`.` or `,` separator)
/// or as an exact ratio `numerator/denominator`.
pub fn parse_code(text: &str) -> Result<BigRational> {
    let invalid = || CodingError::InvalidCode(text.to_string());
    let normalized = text.trim().replace(',', ".");

    if let Some((numer, denom)) = normalized.split_once('/') {
        let numer: BigInt = numer.trim().parse().map_err(|_| invalid())?;
        let denom: BigInt = denom.trim().parse().map_err(|_| invalid())?;
        if denom.is_zero() {
            return Err(invalid());
        }
        return Ok(BigRational::new(numer, denom));
    }

    let (int_part, frac_part) = normalized
        .split_once('.')
        .unwrap_or((normalized.as_str(), ""));
    let all_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
    if (int_part.is_empty() && frac_part.is_empty())
        || !all_digits(int_part)
        || !all_digits(frac_part)
    {
        return Err(invalid());
    }
    let digits = format!("{int_part}{frac_part}");
    let numer = BigInt::parse_bytes(digits.as_bytes(), 10).ok_or_else(invalid)?;
    let denom = BigInt::from(10u32).pow(frac_part.len() as u32);
    Ok(BigRational::new(numer, denom))
}

/// Render `value` with exactly `digits` fractional decimal digits, rounding
/// half away from zero.
pub fn format_decimal(value: &BigRational, digits: u32) -> String {
    let scale = BigInt::from(10u32).pow(digits);
    let scaled = (value.abs() * BigRational::from_integer(scale.clone()))
        .round()
        .to_integer();
    let (int_part, frac_part) = scaled.div_rem(&scale);
    let sign = if value.is_negative() && !scaled.is_zero() { "-" } else { "" };
    if digits == 0 {
        return format!("{sign}{int_part}");
    }
    let frac_part = frac_part.to_string();
    format!("{sign}{int_part}.{frac_part:0>width$}", width = digits as usize)
}
