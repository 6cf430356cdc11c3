use self::error::AHxErrorCode;
use super::Filter;
use crate::parse::character_set::is_white_space;
use crate::parse::num::hex_val;
use crate::process::filter::error::FilterResult;
use crate::Byte;

/// REFERENCE: [7.4.2 ASCIIHexDecode filter, p37]
/// ASCII hexadecimal filter.
#[derive(Debug, PartialEq, Clone, Copy)]
pub struct AHx;

impl Filter for AHx {
    fn filter(&self, bytes: impl Into<Vec<Byte>> + AsRef<[Byte]>) -> FilterResult<Vec<Byte>> {
        let bytes = bytes.as_ref();
        let mut encoded = Vec::with_capacity(bytes.len() * 2 + 1);
        for &byte in bytes {
            encoded.push(hex_digit(byte >> 4));
            encoded.push(hex_digit(byte & 0x0F));
        }
        encoded.push(b'>');
        Ok(encoded)
    }

    fn defilter(&self, bytes: impl Into<Vec<Byte>> + AsRef<[Byte]>) -> FilterResult<Vec<Byte>> {
        let bytes = bytes.as_ref();
        let mut defiltered = Vec::with_capacity(bytes.len() / 2 + 1);
        let mut eod = false;
        let mut prev = None;
        for &byte in bytes.iter() {
            if is_white_space(byte) {
                continue;
            }
            if eod {
                return Err(AHxErrorCode::AfterEod(char::from(byte)).into());
            }
            if byte == b'>' {
                eod = true;
                continue;
            }
            let value =
                hex_val(byte).ok_or_else(|| AHxErrorCode::InvalidHexDigit(char::from(byte)))?;
            if let Some(high) = prev.take() {
                defiltered.push(high << 4 | value);
            } else {
                prev = Some(value);
            }
        }
        // An odd final digit is followed by an implicit 0
        if let Some(high) = prev {
            defiltered.push(high << 4);
        }

        Ok(defiltered)
    }
}

const fn hex_digit(value: Byte) -> Byte {
    if value < 10 {
        b'0' + value
    } else {
        b'A' + value - 10
    }
}

pub(in crate::process::filter) mod error {
    use ::thiserror::Error;

    #[derive(Debug, Error, PartialEq, Clone, Copy)]
    pub enum AHxErrorCode {
        #[error("Invalid ASCII hexadecimal digit: {0}")]
        InvalidHexDigit(char),
        #[error("Unexpected character after the EOD marker: {0}")]
        AfterEod(char),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assert_err_eq;
    use crate::process::filter::tests::assert_round_trip;

    #[test]
    fn ascii_hex_valid() {
        // Synthetic tests

        let filtered = b"412048657861646563696D616C20537472696E67>";
        let defiltered = AHx.defilter(filtered.as_slice()).unwrap();
        let expected = b"A Hexadecimal String";
        assert_eq!(defiltered, expected);
        let refiltered = AHx.filter(defiltered).unwrap();
        assert_eq!(refiltered, filtered);

        let filtered = b"41 20 48";
        let defiltered = AHx.defilter(filtered.as_slice()).unwrap();
        assert_eq!(defiltered, b"\x41\x20\x48");

        let filtered = b"41 20 4";
        let defiltered = AHx.defilter(filtered.as_slice()).unwrap();
        assert_eq!(defiltered, b"\x41\x20\x40");

        let filtered = b"41 20 4> ";
        let defiltered = AHx.defilter(filtered.as_slice()).unwrap();
        assert_eq!(defiltered, b"\x41\x20\x40");

        let filtered = b"6c6F";
        let defiltered = AHx.defilter(filtered.as_slice()).unwrap();
        assert_eq!(defiltered, b"lo");

        assert_round_trip(&AHx);
    }

    #[test]
    fn ascii_hex_invalid() {
        // Synthetic tests

        // Invalid ASCII hexadecimal digit
        let filtered = b"41204X";
        let defiltered_result = AHx.defilter(filtered.as_slice());
        let expected_error = AHxErrorCode::InvalidHexDigit('X');
        assert_err_eq!(defiltered_result, expected_error);

        // Unexpected character after the EOD marker
        let filtered = b"41204>1";
        let defiltered_result = AHx.defilter(filtered.as_slice());
        let expected_error = AHxErrorCode::AfterEod('1');
        assert_err_eq!(defiltered_result, expected_error);
    }
}
