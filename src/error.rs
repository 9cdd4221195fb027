//! Error types for source-coding

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CodingError {
    #[error("empty input")]
    EmptyInput,

    #[error("invalid probability table: {0}")]
    InvalidProbabilityTable(String),

    #[error("code value {code} falls outside every symbol interval at step {step}")]
    AmbiguousInterval { step: usize, code: String },

    #[error("symbol {0:?} is not part of the alphabet")]
    UnknownSymbol(char),

    #[error("interval collapsed at step {step}: precision bound too small for this input")]
    PrecisionExhausted { step: usize },

    #[error("invalid bit {0:?}: expected '0' or '1'")]
    InvalidBit(char),

    #[error("bit sequence ends inside a codeword ({trailing} trailing bits)")]
    TruncatedBitSequence { trailing: usize },

    #[error("invalid code value: {0}")]
    InvalidCode(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    SerializationError(String),
}

pub type Result<T> = std::result::Result<T, CodingError>;
