use ::std::collections::HashMap;

use self::error::LzwErrorCode;
use super::predictor::Predictor;
use super::Filter;
use crate::context::Context;
use crate::object::Dictionary;
use crate::object::ObjectKind;
use crate::process::filter::error::FilterErr;
use crate::process::filter::error::FilterErrorCode;
use crate::process::filter::error::FilterResult;
use crate::Byte;
use crate::DECODED_LIMIT;

const KEY_EARLY_CHANGE: &str = "EarlyChange";
const MIN_CODE_SIZE: u32 = 9;
const MAX_CODE_SIZE: u32 = 12;
const CLEAR_CODE: u16 = 256;
const EOD_CODE: u16 = 257;
const FIRST_CODE: u16 = 258;
const TABLE_SIZE: usize = 1 << MAX_CODE_SIZE;

/// REFERENCE: [7.4.4 LZWDecode and FlateDecode filters, p38] and [[Adobe TIFF
/// Revision 6.0; Final (TIFF)] 7.4.4.2 "Details of LZW encoding"]
/// The LZW (Lempel-Ziv-Welch) adaptive compression filter.
#[derive(Debug, PartialEq, Clone, Copy)]
pub struct Lzw {
    predictor: Predictor,
    /// REFERENCE: [Table 8 — Optional parameters for LZWDecode and
    /// FlateDecode filters, p40]
    /// Code widths grow one code early when set, the default.
    early_change: bool,
}

impl Default for Lzw {
    fn default() -> Self {
        Self {
            predictor: Predictor::default(),
            early_change: true,
        }
    }
}

impl Lzw {
    pub fn with_early_change(early_change: bool) -> Self {
        Self {
            early_change,
            ..Self::default()
        }
    }

    /// The code width to use after the table holds `len` entries
    fn code_size(&self, len: usize, code_size: u32) -> u32 {
        if len + usize::from(self.early_change) >= 1 << code_size && code_size < MAX_CODE_SIZE {
            code_size + 1
        } else {
            code_size
        }
    }
}

impl Filter for Lzw {
    /// REFERENCE: [7.4.4.2 Details of LZW encoding, p38-40]
    fn filter(&self, bytes: impl Into<Vec<Byte>> + AsRef<[Byte]>) -> FilterResult<Vec<Byte>> {
        let bytes = self.predictor.filter(bytes)?;

        let mut writer = BitWriter::default();
        let mut table = HashMap::<(u16, Byte), u16>::new();
        let mut next_code = FIRST_CODE;
        // Codes emitted since the last clear-table code. The decoder adds an
        // entry for every code but the first, so its table trails ours by
        // one entry and the width has to follow its size.
        let mut emitted = 0usize;
        let mut code_size = MIN_CODE_SIZE;
        writer.write(CLEAR_CODE, code_size);

        let mut prefix: Option<u16> = None;
        for &byte in bytes.iter() {
            let Some(code) = prefix else {
                prefix = Some(u16::from(byte));
                continue;
            };
            if let Some(&extended) = table.get(&(code, byte)) {
                prefix = Some(extended);
                continue;
            }

            writer.write(code, code_size);
            emitted += 1;
            let decoder_len = usize::from(FIRST_CODE) + emitted - 1;
            code_size = self.code_size(decoder_len, code_size);

            table.insert((code, byte), next_code);
            next_code += 1;
            prefix = Some(u16::from(byte));

            if usize::from(next_code) == TABLE_SIZE {
                writer.write(CLEAR_CODE, code_size);
                table.clear();
                next_code = FIRST_CODE;
                emitted = 0;
                code_size = MIN_CODE_SIZE;
            }
        }

        if let Some(code) = prefix {
            writer.write(code, code_size);
            emitted += 1;
            let decoder_len = usize::from(FIRST_CODE) + emitted - 1;
            code_size = self.code_size(decoder_len, code_size);
        }
        writer.write(EOD_CODE, code_size);

        Ok(writer.finish())
    }

    fn defilter(&self, bytes: impl Into<Vec<Byte>> + AsRef<[Byte]>) -> FilterResult<Vec<Byte>> {
        let bytes = bytes.as_ref();

        let mut reader = BitReader::new(bytes);
        let mut table = initial_table();
        let mut code_size = MIN_CODE_SIZE;
        let mut prev: Option<Vec<Byte>> = None;
        let mut defiltered = Vec::with_capacity(bytes.len() * 2);

        while let Some(code) = reader.read(code_size) {
            if code == CLEAR_CODE {
                table.truncate(usize::from(FIRST_CODE));
                code_size = MIN_CODE_SIZE;
                prev = None;
                continue;
            }
            if code == EOD_CODE {
                break;
            }

            let entry = match (table.get(usize::from(code)), &prev) {
                (Some(entry), _) => entry.clone(),
                // The code being defined by this very step
                (None, Some(prev)) if usize::from(code) == table.len() => {
                    let mut entry = prev.clone();
                    entry.push(prev[0]);
                    entry
                }
                _ => {
                    return Err(LzwErrorCode::OutOfBounds {
                        code,
                        len: table.len(),
                    }
                    .into())
                }
            };

            defiltered.extend_from_slice(&entry);
            if defiltered.len() > DECODED_LIMIT {
                return Err(FilterErr::new(
                    stringify!(Lzw),
                    FilterErrorCode::DecodedLimit(DECODED_LIMIT),
                ));
            }

            if let Some(mut prev) = prev.take() {
                if table.len() < TABLE_SIZE {
                    prev.push(entry[0]);
                    table.push(prev);
                }
            }
            code_size = self.code_size(table.len(), code_size);
            prev = Some(entry);
        }

        self.predictor.defilter(defiltered)
    }
}

fn initial_table() -> Vec<Vec<Byte>> {
    let mut table = Vec::with_capacity(TABLE_SIZE);
    table.extend((0..=u8::MAX).map(|byte| vec![byte]));
    // The clear-table and EOD codes have no byte sequence
    table.push(vec![]);
    table.push(vec![]);
    table
}

/// Packs codes most significant bit first
#[derive(Debug, Default)]
struct BitWriter {
    bytes: Vec<Byte>,
    buffer: u32,
    bits: u32,
}

impl BitWriter {
    fn write(&mut self, code: u16, code_size: u32) {
        self.buffer = (self.buffer << code_size) | u32::from(code);
        self.bits += code_size;
        while self.bits >= 8 {
            self.bits -= 8;
            self.bytes.push((self.buffer >> self.bits) as Byte);
        }
        self.buffer &= (1 << self.bits) - 1;
    }

    fn finish(mut self) -> Vec<Byte> {
        if self.bits > 0 {
            self.bytes.push((self.buffer << (8 - self.bits)) as Byte);
        }
        self.bytes
    }
}

#[derive(Debug)]
struct BitReader<'a> {
    bytes: &'a [Byte],
    position: usize,
    buffer: u32,
    bits: u32,
}

impl<'a> BitReader<'a> {
    fn new(bytes: &'a [Byte]) -> Self {
        Self {
            bytes,
            position: 0,
            buffer: 0,
            bits: 0,
        }
    }

    /// The next code, or `None` once fewer than `code_size` bits remain
    fn read(&mut self, code_size: u32) -> Option<u16> {
        while self.bits < code_size {
            let byte = *self.bytes.get(self.position)?;
            self.position += 1;
            self.buffer = (self.buffer << 8) | u32::from(byte);
            self.bits += 8;
        }
        self.bits -= code_size;
        let code = (self.buffer >> self.bits) as u16;
        self.buffer &= (1 << self.bits) - 1;
        Some(code)
    }
}

mod convert {
    use super::*;

    impl Lzw {
        pub(in crate::process::filter) fn new(
            decode_parms: Option<&Dictionary>,
            context: &Context,
        ) -> FilterResult<Self> {
            let Some(decode_parms) = decode_parms else {
                return Ok(Self::default());
            };
            let predictor = Predictor::new(decode_parms, context)?;
            let early_change = match decode_parms
                .lookup_maybe(KEY_EARLY_CHANGE, context, &[ObjectKind::Number])
                .and_then(|value| value.as_i64())
            {
                None | Some(1) => true,
                Some(0) => false,
                Some(value) => {
                    return Err(FilterErr::new(
                        stringify!(Lzw),
                        FilterErrorCode::UnsupportedParameter(KEY_EARLY_CHANGE, value),
                    ))
                }
            };
            Ok(Self {
                predictor,
                early_change,
            })
        }
    }
}

pub(in crate::process::filter) mod error {
    use ::thiserror::Error;

    #[derive(Debug, Error, PartialEq, Clone, Copy)]
    pub enum LzwErrorCode {
        #[error("Out of bounds code: {code}. Table length: {len}")]
        OutOfBounds { code: u16, len: usize },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assert_err_eq;
    use crate::process::filter::tests::assert_round_trip;
    use crate::process::filter::tests::random_bytes;

    #[test]
    fn lzw_valid() {
        // REFERENCE: [7.4.4.2 Details of LZW encoding, p39]
        let filtered = b"\x80\x0B\x60\x50\x22\x0C\x0C\x85\x01";
        let expected = b"\x2D\x2D\x2D\x2D\x2D\x41\x2D\x2D\x2D\x42";
        let lzw = Lzw::default();
        let defiltered = lzw.defilter(filtered.as_slice()).unwrap();
        assert_eq!(defiltered, expected);
        let refiltered = lzw.filter(defiltered).unwrap();
        assert_eq!(refiltered, filtered);
    }

    #[test]
    fn lzw_round_trip() {
        assert_round_trip(&Lzw::with_early_change(true));
        assert_round_trip(&Lzw::with_early_change(false));
    }

    #[test]
    fn lzw_table_reset() {
        // Enough distinct sequences to fill the table several times
        let input = random_bytes(300_000, 3);
        for early_change in [true, false] {
            let lzw = Lzw::with_early_change(early_change);
            let filtered = lzw.filter(input.as_slice()).unwrap();
            assert_eq!(lzw.defilter(filtered).unwrap(), input);
        }
    }

    #[test]
    fn lzw_early_change_differs() {
        let input = random_bytes(4_000, 5);
        let early = Lzw::with_early_change(true).filter(input.as_slice()).unwrap();
        let late = Lzw::with_early_change(false).filter(input.as_slice()).unwrap();
        assert_ne!(early, late);
    }

    #[test]
    fn lzw_invalid() {
        // Clear-table followed by code 300 while the table holds 258 entries
        let mut writer = BitWriter::default();
        writer.write(CLEAR_CODE, 9);
        writer.write(300, 9);
        let result = Lzw::default().defilter(writer.finish());
        let expected_error = LzwErrorCode::OutOfBounds {
            code: 300,
            len: 258,
        };
        assert_err_eq!(result, expected_error);

        let dictionary = Dictionary::from_iter([(KEY_EARLY_CHANGE, 2)]);
        let result = Lzw::new(Some(&dictionary), &Context::new());
        let expected_error = FilterErr::new(
            stringify!(Lzw),
            FilterErrorCode::UnsupportedParameter(KEY_EARLY_CHANGE, 2),
        );
        assert_err_eq!(result, expected_error);
    }
}
