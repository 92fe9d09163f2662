//! Field codecs: how words of a cropped grid turn into payload strings.
//!
//! Every codec works in both directions. Decoding fails closed: a bit pattern
//! that a table does not know yields no candidate at all.

use std::ops::RangeInclusive;

use yellowdots_core::BinaryMatrix;

use crate::layout::Word;
use crate::tables::manufacturers_for;

/// Bit pattern to digit table.
pub type DigitTable = &'static [(&'static str, char)];
/// Manufacturer code to vendor names table.
pub type VendorTable = &'static [(&'static str, &'static [&'static str])];

/// Errors raised while writing a payload into a grid.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("unknown pattern {0:?}")]
    UnknownPattern(String),
    #[error("no value given for field {field:?}")]
    MissingField { field: String },
    #[error("field {field:?} cannot encode {value:?}: {reason}")]
    Unencodable {
        field: String,
        value: String,
        reason: String,
    },
}

/// Replace the first `digits` decoded digits with letters.
#[derive(Clone, Copy, Debug)]
pub struct LetterPrefix {
    pub digits: usize,
    pub table: &'static [(char, char)],
}

/// How a field's words map to its string value.
#[derive(Clone, Debug)]
pub enum FieldCodec {
    /// Words concatenated into one unsigned number, plus `offset`,
    /// zero-padded to `pad` digits. Values outside `range` fail closed.
    Binary {
        offset: u32,
        pad: usize,
        range: Option<RangeInclusive<u32>>,
    },
    /// One decimal digit per one-hot word: the index of its set bit.
    OneHotDigits,
    /// Word pairs looked up in `table`, prefixed with `prefix`.
    DigitTable {
        table: DigitTable,
        prefix: &'static str,
        letters: Option<LetterPrefix>,
    },
    /// One-hot words form a code looked up in `table`.
    Manufacturer { table: VendorTable },
    /// A serial stored twice: as two-digit decimal words followed by the
    /// remaining words read as one binary number.
    DualSerial { decimal_words: usize },
}

/// One named payload field.
#[derive(Clone, Debug)]
pub struct FieldSpec {
    pub name: &'static str,
    pub words: Vec<Word>,
    pub codec: FieldCodec,
    /// Serial numbers and timestamps. Anonymisation must change these.
    pub identifying: bool,
}

impl FieldSpec {
    pub fn new(name: &'static str, words: Vec<Word>, codec: FieldCodec) -> Self {
        Self {
            name,
            words,
            codec,
            identifying: true,
        }
    }

    /// Mark the field as carrying no identifying information.
    pub fn opaque(mut self) -> Self {
        self.identifying = false;
        self
    }

    /// Every reading of the field. Empty when the bits are not decodable.
    pub fn candidates(&self, m: &BinaryMatrix) -> Vec<String> {
        match &self.codec {
            FieldCodec::Binary { offset, pad, range } => {
                let pad = *pad;
                let value = read_number(&self.words, m) + u64::from(*offset);
                let in_range = range
                    .as_ref()
                    .is_none_or(|r| u32::try_from(value).is_ok_and(|v| r.contains(&v)));
                if in_range {
                    vec![format!("{value:0pad$}")]
                } else {
                    Vec::new()
                }
            }
            FieldCodec::OneHotDigits => one_hot_digits(&self.words, m).into_iter().collect(),
            FieldCodec::DigitTable {
                table,
                prefix,
                letters,
            } => decode_digit_table(&self.words, m, *table, letters.as_ref())
                .map(|s| format!("{prefix}{s}"))
                .into_iter()
                .collect(),
            FieldCodec::Manufacturer { table } => one_hot_digits(&self.words, m)
                .and_then(|code| manufacturers_for(table, &code))
                .map(|vendors| vendors.iter().map(|v| v.to_string()).collect())
                .unwrap_or_default(),
            FieldCodec::DualSerial { decimal_words } => {
                let split = (*decimal_words).min(self.words.len());
                let (decimal, binary) = self.words.split_at(split);
                let width = 2 * split;
                let mut out = Vec::with_capacity(2);
                if let Some(d) = decode_decimal_pairs(decimal, m) {
                    out.push(d);
                }
                let b = format!("{:0width$}", read_number(binary, m));
                if !out.contains(&b) {
                    out.push(b);
                }
                out
            }
        }
    }

    /// Decoded value; several readings are joined as `"A or B"`.
    pub fn value(&self, m: &BinaryMatrix) -> Option<String> {
        let candidates = self.candidates(m);
        (!candidates.is_empty()).then(|| candidates.join(" or "))
    }

    /// Write `value` into the field's words.
    pub fn encode(&self, m: &mut BinaryMatrix, value: &str) -> Result<(), CodecError> {
        let value = value.trim();
        let fail = |reason: &str| CodecError::Unencodable {
            field: self.name.to_string(),
            value: value.to_string(),
            reason: reason.to_string(),
        };

        match &self.codec {
            FieldCodec::Binary { offset, range, .. } => {
                let v: u32 = value.parse().map_err(|_| fail("not a number"))?;
                if range.as_ref().is_some_and(|r| !r.contains(&v)) {
                    return Err(fail("out of range"));
                }
                let raw = v.checked_sub(*offset).ok_or_else(|| fail("below offset"))?;
                write_number(&self.words, m, u64::from(raw)).ok_or_else(|| fail("too large"))
            }
            FieldCodec::OneHotDigits => write_one_hot_digits(&self.words, m, value)
                .ok_or_else(|| fail("expected one digit per word")),
            FieldCodec::DigitTable {
                table,
                prefix,
                letters,
            } => {
                let body = value
                    .strip_prefix(prefix)
                    .ok_or_else(|| fail("missing prefix"))?;
                encode_digit_table(&self.words, m, body, *table, letters.as_ref())
                    .ok_or_else(|| fail("digit or letter not in table"))
            }
            FieldCodec::Manufacturer { table } => {
                let code = manufacturer_code(*table, value, self.words.len())
                    .ok_or_else(|| fail("unknown manufacturer"))?;
                write_one_hot_digits(&self.words, m, &code)
                    .ok_or_else(|| fail("code does not fit the words"))
            }
            FieldCodec::DualSerial { decimal_words } => {
                let split = (*decimal_words).min(self.words.len());
                let (decimal, binary) = self.words.split_at(split);
                let width = 2 * split;
                if value.len() > width || !value.chars().all(|c| c.is_ascii_digit()) {
                    return Err(fail("expected a decimal serial"));
                }
                let n: u64 = value.parse().map_err(|_| fail("not a number"))?;
                let padded = format!("{n:0width$}");
                for (word, pair) in decimal.iter().zip(padded.as_bytes().chunks(2)) {
                    let v = u32::from(pair[0] - b'0') * 10 + u32::from(pair[1] - b'0');
                    if word.len < 32 && v >> word.len != 0 {
                        return Err(fail("decimal word too narrow"));
                    }
                    word.write_value(m, v);
                }
                write_number(binary, m, n).ok_or_else(|| fail("too large"))
            }
        }
    }
}

fn total_bits(words: &[Word]) -> usize {
    words.iter().map(|w| w.len).sum()
}

fn read_number(words: &[Word], m: &BinaryMatrix) -> u64 {
    words
        .iter()
        .flat_map(|w| w.cells())
        .fold(0u64, |acc, (i, j)| (acc << 1) | u64::from(m.get(i, j)))
}

/// Write `value` across `words`, most significant word first.
fn write_number(words: &[Word], m: &mut BinaryMatrix, value: u64) -> Option<()> {
    let bits = total_bits(words);
    if bits < 64 && value >> bits != 0 {
        return None;
    }
    let mut rest = value;
    for word in words.iter().rev() {
        let mask = (1u64 << word.len) - 1;
        word.write_value(m, (rest & mask) as u32);
        rest >>= word.len;
    }
    Some(())
}

fn one_hot_digits(words: &[Word], m: &BinaryMatrix) -> Option<String> {
    words
        .iter()
        .map(|w| w.one_hot(m).and_then(|k| char::from_digit(k as u32, 10)))
        .collect()
}

fn write_one_hot_digits(words: &[Word], m: &mut BinaryMatrix, digits: &str) -> Option<()> {
    if digits.chars().count() != words.len() {
        return None;
    }
    let indices: Vec<usize> = digits
        .chars()
        .map(|c| c.to_digit(10).map(|d| d as usize))
        .collect::<Option<_>>()?;
    if words.iter().zip(&indices).any(|(w, &k)| k >= w.len) {
        return None;
    }
    for (word, k) in words.iter().zip(indices) {
        word.write_one_hot(m, k);
    }
    Some(())
}

fn decode_digit_table(
    words: &[Word],
    m: &BinaryMatrix,
    table: DigitTable,
    letters: Option<&LetterPrefix>,
) -> Option<String> {
    let mut out = String::with_capacity(words.len() / 2);
    for (idx, pair) in words.chunks(2).enumerate() {
        let bits: String = pair.iter().map(|w| w.bit_string(m)).collect();
        let digit = table.iter().find(|(b, _)| *b == bits).map(|(_, d)| *d)?;
        match letters {
            Some(l) if idx < l.digits => {
                let letter = l.table.iter().find(|(d, _)| *d == digit).map(|(_, c)| *c)?;
                out.push(letter);
            }
            _ => out.push(digit),
        }
    }
    Some(out)
}

fn encode_digit_table(
    words: &[Word],
    m: &mut BinaryMatrix,
    body: &str,
    table: DigitTable,
    letters: Option<&LetterPrefix>,
) -> Option<()> {
    let pairs: Vec<&[Word]> = words.chunks(2).collect();
    if body.chars().count() != pairs.len() {
        return None;
    }
    let mut patterns = Vec::with_capacity(pairs.len());
    for (idx, ch) in body.chars().enumerate() {
        let digit = match letters {
            Some(l) if idx < l.digits => l
                .table
                .iter()
                .find(|(_, c)| c.eq_ignore_ascii_case(&ch))
                .map(|(d, _)| *d)?,
            _ => ch,
        };
        let bits = table.iter().find(|(_, d)| *d == digit).map(|(b, _)| *b)?;
        patterns.push(bits);
    }
    for (pair, bits) in pairs.into_iter().zip(patterns) {
        let mut offset = 0;
        for word in pair {
            word.write_bits(m, bits.get(offset..)?);
            offset += word.len;
        }
    }
    Some(())
}

fn decode_decimal_pairs(words: &[Word], m: &BinaryMatrix) -> Option<String> {
    words
        .iter()
        .map(|w| {
            let v = w.value(m);
            (v <= 99).then(|| format!("{v:02}"))
        })
        .collect()
}

/// Resolve a code or vendor label to a code of `len` digits.
fn manufacturer_code(table: VendorTable, value: &str, len: usize) -> Option<String> {
    if value.len() == len && value.chars().all(|c| c.is_ascii_digit()) {
        return Some(value.to_string());
    }
    table
        .iter()
        .find(|(_, vendors)| {
            vendors.iter().any(|v| v.eq_ignore_ascii_case(value))
                || vendors.join(" or ").eq_ignore_ascii_case(value)
        })
        .map(|(code, _)| code.to_string())
}

/// How the `raw` summary string of a payload is produced.
#[derive(Clone, Debug)]
pub enum RawFormat {
    /// Each word as lowercase hex, space separated.
    LineHex(Vec<Word>),
    /// Each band as a run of one-hot digits, bands space separated.
    OneHotDigits(Vec<Vec<Word>>),
}

impl RawFormat {
    pub fn render(&self, m: &BinaryMatrix) -> String {
        match self {
            RawFormat::LineHex(words) => words
                .iter()
                .map(|w| format!("{:0width$x}", w.value(m), width = w.len.div_ceil(4)))
                .collect::<Vec<_>>()
                .join(" "),
            RawFormat::OneHotDigits(bands) => bands
                .iter()
                .map(|band| {
                    band.iter()
                        .map(|w| {
                            w.one_hot(m)
                                .and_then(|k| char::from_digit(k as u32, 10))
                                .unwrap_or('?')
                        })
                        .collect::<String>()
                })
                .collect::<Vec<_>>()
                .join(" "),
        }
    }
}
