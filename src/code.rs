//! Prefix code tables, bit sequences and the encode/decode transforms shared
//! by the Shannon-Fano and Huffman coders.

use crate::error::{CodingError, Result};
use crate::frequency::Symbol;
use bitstream_io::{BigEndian, BitRead, BitReader, BitWrite, BitWriter};
use serde::{Serialize, Serializer};
use std::collections::HashMap;
use std::fmt;
use std::io::Cursor;
use std::str::FromStr;

/// An ordered sequence of bits. Displays as a string of `0` and `1`.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BitSequence(Vec<bool>);

/// A single codeword.
pub type Code = BitSequence;

impl BitSequence {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn from_bits(bits: Vec<bool>) -> Self {
        Self(bits)
    }

    pub fn push(&mut self, bit: bool) {
        self.0.push(bit);
    }

    pub fn extend_from(&mut self, other: &BitSequence) {
        self.0.extend_from_slice(&other.0);
    }

    pub fn bits(&self) -> &[bool] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn starts_with(&self, prefix: &BitSequence) -> bool {
        self.0.starts_with(&prefix.0)
    }

    /// Pack into bytes, most significant bit first, zero-padded to a byte
    /// boundary.
    pub fn pack(&self) -> Result<PackedBits> {
        let mut bytes = Vec::with_capacity((self.0.len() + 7) / 8);
        {
            let mut writer = BitWriter::endian(&mut bytes, BigEndian);
            for &bit in &self.0 {
                writer.write_bit(bit)?;
            }
            writer.byte_align()?;
        }
        Ok(PackedBits {
            bytes,
            bit_len: self.0.len(),
        })
    }
}

impl fmt::Display for BitSequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &bit in &self.0 {
            f.write_str(if bit { "1" } else { "0" })?;
        }
        Ok(())
    }
}

impl FromStr for BitSequence {
    type Err = CodingError;

    fn from_str(s: &str) -> Result<Self> {
        s.chars()
            .map(|c| match c {
                '0' => Ok(false),
                '1' => Ok(true),
                other => Err(CodingError::InvalidBit(other)),
            })
            .collect::<Result<Vec<_>>>()
            .map(Self)
    }
}

impl Serialize for BitSequence {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// A bit sequence packed into bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PackedBits {
    pub bytes: Vec<u8>,
    /// Number of meaningful bits; the rest of the last byte is padding.
    pub bit_len: usize,
}

impl PackedBits {
    pub fn unpack(&self) -> Result<BitSequence> {
        let mut reader = BitReader::endian(Cursor::new(&self.bytes), BigEndian);
        let mut bits = Vec::with_capacity(self.bit_len);
        for _ in 0..self.bit_len {
            bits.push(reader.read_bit()?);
        }
        Ok(BitSequence(bits))
    }
}

/// Mapping from symbol to codeword, kept in the order the coder assigned
/// the codes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CodeTable {
    codes: Vec<(Symbol, Code)>,
    index: HashMap<Symbol, usize>,
}

impl CodeTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the code of `symbol`.
    pub fn insert(&mut self, symbol: Symbol, code: Code) {
        match self.index.get(&symbol) {
            Some(&i) => self.codes[i].1 = code,
            None => {
                self.index.insert(symbol, self.codes.len());
                self.codes.push((symbol, code));
            }
        }
    }

    pub fn get(&self, symbol: Symbol) -> Option<&Code> {
        self.index.get(&symbol).map(|&i| &self.codes[i].1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Symbol, &Code)> + '_ {
        self.codes.iter().map(|(s, c)| (*s, c))
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    /// Whether no codeword is a prefix of another (duplicates included).
    pub fn is_prefix_free(&self) -> bool {
        let mut sorted: Vec<&Code> = self.codes.iter().map(|(_, c)| c).collect();
        sorted.sort();
        // In lexicographic order a prefix sorts immediately before some
        // extension of itself, so adjacent pairs suffice.
        sorted.windows(2).all(|pair| !pair[1].starts_with(pair[0]))
    }
}

impl Serialize for CodeTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_map(self.iter().map(|(s, c)| (s.to_string(), c)))
    }
}

/// Concatenate the codewords of every symbol of `text`.
pub fn encode_text(text: &str, table: &CodeTable) -> Result<BitSequence> {
    let mut bits = BitSequence::new();
    for ch in text.chars() {
        let code = table.get(ch).ok_or(CodingError::UnknownSymbol(ch))?;
        bits.extend_from(code);
    }
    Ok(bits)
}

/// Decode a concatenation of codewords by scanning for the first codeword
/// matching the bits read so far.
pub fn decode_bits(bits: &BitSequence, table: &CodeTable) -> Result<String> {
    let code_to_symbol: HashMap<&[bool], Symbol> =
        table.iter().map(|(s, c)| (c.bits(), s)).collect();

    let mut output = String::new();
    let mut start = 0;
    for end in 1..=bits.len() {
        if let Some(&symbol) = code_to_symbol.get(&bits.bits()[start..end]) {
            output.push(symbol);
            start = end;
        }
    }

    if start != bits.len() {
        return Err(CodingError::TruncatedBitSequence {
            trailing: bits.len() - start,
        });
    }
    Ok(output)
}
