use self::error::A85ErrorCode;
use super::Filter;
use crate::parse::character_set::is_white_space;
use crate::process::filter::error::FilterResult;
use crate::Byte;

const EOD: &[Byte] = b"~>";

/// REFERENCE: [7.4.3 ASCII85Decode filter, p37-39]
/// ASCII base-85 filter.
#[derive(Debug, PartialEq, Clone, Copy)]
pub struct A85;

impl Filter for A85 {
    fn filter(&self, bytes: impl Into<Vec<Byte>> + AsRef<[Byte]>) -> FilterResult<Vec<Byte>> {
        let bytes = bytes.as_ref();
        let mut encoded = Vec::with_capacity(bytes.len() * 5 / 4 + 3);

        let groups = bytes.chunks_exact(4);
        let remainder = groups.remainder();
        for group in groups {
            let value = u32::from_be_bytes([group[0], group[1], group[2], group[3]]);
            if value == 0 {
                encoded.push(b'z');
            } else {
                encoded.extend_from_slice(&encode_group(value));
            }
        }
        // A final partial group of n bytes is padded with zeros and written
        // as its first n + 1 characters
        if !remainder.is_empty() {
            let mut group = [0; 4];
            group[..remainder.len()].copy_from_slice(remainder);
            let digits = encode_group(u32::from_be_bytes(group));
            encoded.extend_from_slice(&digits[..remainder.len() + 1]);
        }
        encoded.extend_from_slice(EOD);
        Ok(encoded)
    }

    fn defilter(&self, bytes: impl Into<Vec<Byte>> + AsRef<[Byte]>) -> FilterResult<Vec<Byte>> {
        let mut bytes = bytes.as_ref();
        // Tolerate the `<~` prefix used outside of PDF
        if let Some(rest) = bytes.strip_prefix(b"<~") {
            bytes = rest;
        }
        let mut defiltered = Vec::with_capacity(bytes.len() * 4 / 5 + 4);
        let mut group = [0u8; 5];
        let mut len = 0;
        let mut iter = bytes.iter();
        while let Some(&byte) = iter.next() {
            match byte {
                _ if is_white_space(byte) => {}
                b'~' => {
                    match iter.find(|&&byte| !is_white_space(byte)) {
                        Some(b'>') | None => {}
                        Some(&other) => return Err(A85ErrorCode::InvalidEod(char::from(other)).into()),
                    }
                    if let Some(&other) = iter.find(|&&byte| !is_white_space(byte)) {
                        return Err(A85ErrorCode::AfterEod(char::from(other)).into());
                    }
                    break;
                }
                b'z' if len == 0 => defiltered.extend_from_slice(&[0; 4]),
                b'z' => return Err(A85ErrorCode::ZInMiddle.into()),
                b'!'..=b'u' => {
                    group[len] = byte - b'!';
                    len += 1;
                    if len == 5 {
                        defiltered.extend_from_slice(&decode_group(&group)?);
                        len = 0;
                    }
                }
                _ => return Err(A85ErrorCode::InvalidCharacter(char::from(byte)).into()),
            }
        }
        match len {
            0 => {}
            1 => return Err(A85ErrorCode::SingleCharacterGroup.into()),
            _ => {
                // Pad with the highest digit and keep len - 1 bytes
                group[len..].fill(b'u' - b'!');
                let decoded = decode_group(&group)?;
                defiltered.extend_from_slice(&decoded[..len - 1]);
            }
        }
        Ok(defiltered)
    }
}

fn encode_group(mut value: u32) -> [Byte; 5] {
    let mut digits = [0; 5];
    for digit in digits.iter_mut().rev() {
        *digit = (value % 85) as Byte + b'!';
        value /= 85;
    }
    digits
}

fn decode_group(digits: &[Byte; 5]) -> Result<[Byte; 4], A85ErrorCode> {
    let value = digits.iter().try_fold(0u32, |value, &digit| {
        value
            .checked_mul(85)
            .and_then(|value| value.checked_add(u32::from(digit)))
    });
    value
        .map(u32::to_be_bytes)
        .ok_or(A85ErrorCode::Overflow)
}

pub(in crate::process::filter) mod error {
    use ::thiserror::Error;

    #[derive(Debug, Error, PartialEq, Clone, Copy)]
    pub enum A85ErrorCode {
        #[error("Invalid character: {0}")]
        InvalidCharacter(char),
        #[error("Group value exceeds 2^32 - 1")]
        Overflow,
        #[error("z in the middle of a group")]
        ZInMiddle,
        #[error("Final group with a single character")]
        SingleCharacterGroup,
        #[error("Expected > after ~. Found: {0}")]
        InvalidEod(char),
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
    fn ascii_85_valid() {
        // Synthetic tests
        let filtered = b"87cURD]i,\"Ebo80~>";
        let defiltered = A85.defilter(filtered.as_slice()).unwrap();
        assert_eq!(defiltered, b"Hello World!");
        assert_eq!(A85.filter(defiltered).unwrap(), filtered);

        let defiltered = A85.defilter(b"z!!*-'~>".as_slice()).unwrap();
        assert_eq!(defiltered, b"\x00\x00\x00\x00\x00\x01\x02\x03");

        // Full group directly followed by z
        let defiltered = A85.defilter(b"!!!!#z~>".as_slice()).unwrap();
        assert_eq!(defiltered, b"\x00\x00\x00\x02\x00\x00\x00\x00");

        let defiltered = A85.defilter(b"<~87cURD]i,\"Ebo80\n~ >\n".as_slice()).unwrap();
        assert_eq!(defiltered, b"Hello World!");

        assert_round_trip(&A85);
    }

    #[test]
    fn ascii_85_invalid() {
        // Synthetic tests
        assert_err_eq!(
            A85.defilter(b"87cUR{~>".as_slice()),
            A85ErrorCode::InvalidCharacter('{')
        );
        assert_err_eq!(A85.defilter(b"87z~>".as_slice()), A85ErrorCode::ZInMiddle);
        assert_err_eq!(A85.defilter(b"uuuuu~>".as_slice()), A85ErrorCode::Overflow);
        assert_err_eq!(
            A85.defilter(b"87cUR8~>".as_slice()),
            A85ErrorCode::SingleCharacterGroup
        );
        assert_err_eq!(
            A85.defilter(b"87cUR~>z".as_slice()),
            A85ErrorCode::AfterEod('z')
        );
    }
}
