use self::error::RLErrorCode;
use super::Filter;
use crate::process::filter::error::FilterResult;
use crate::Byte;

const EOD: Byte = 128;
const MAX_RUN: usize = 128;

/// REFERENCE: [7.4.5 RunLengthDecode filter, p42]
/// Run-length filter.
#[derive(Debug, PartialEq, Clone, Copy)]
pub struct RL;

impl Filter for RL {
    fn filter(&self, bytes: impl Into<Vec<Byte>> + AsRef<[Byte]>) -> FilterResult<Vec<Byte>> {
        let bytes = bytes.as_ref();
        let mut encoded = Vec::with_capacity(bytes.len() + bytes.len() / MAX_RUN + 2);
        let mut literal_start = 0;
        let mut index = 0;
        while index < bytes.len() {
            let byte = bytes[index];
            let run = bytes[index..]
                .iter()
                .take(MAX_RUN)
                .take_while(|&&next| next == byte)
                .count();
            if run >= 2 {
                write_literals(&mut encoded, &bytes[literal_start..index]);
                // A length byte of 257 - n repeats the next byte n times
                encoded.push((257 - run) as Byte);
                encoded.push(byte);
                index += run;
                literal_start = index;
            } else {
                index += 1;
            }
        }
        write_literals(&mut encoded, &bytes[literal_start..]);
        encoded.push(EOD);
        Ok(encoded)
    }

    fn defilter(&self, bytes: impl Into<Vec<Byte>> + AsRef<[Byte]>) -> FilterResult<Vec<Byte>> {
        let bytes = bytes.as_ref();
        let mut defiltered = Vec::with_capacity(bytes.len() * 2);
        let mut index = 0;
        while let Some(&length) = bytes.get(index) {
            index += 1;
            match length {
                EOD => break,
                0..=127 => {
                    let count = usize::from(length) + 1;
                    let literals = bytes
                        .get(index..index + count)
                        .ok_or(RLErrorCode::Truncated(index - 1))?;
                    defiltered.extend_from_slice(literals);
                    index += count;
                }
                _ => {
                    let byte = *bytes.get(index).ok_or(RLErrorCode::Truncated(index - 1))?;
                    defiltered.extend(::std::iter::repeat(byte).take(257 - usize::from(length)));
                    index += 1;
                }
            }
        }
        Ok(defiltered)
    }
}

/// Writes literal runs of at most 128 bytes, each preceded by its length - 1
fn write_literals(encoded: &mut Vec<Byte>, literals: &[Byte]) {
    for chunk in literals.chunks(MAX_RUN) {
        encoded.push((chunk.len() - 1) as Byte);
        encoded.extend_from_slice(chunk);
    }
}

pub(in crate::process::filter) mod error {
    use ::thiserror::Error;

    #[derive(Debug, Error, PartialEq, Clone, Copy)]
    pub enum RLErrorCode {
        #[error("Run at byte {0} is truncated")]
        Truncated(usize),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assert_err_eq;
    use crate::process::filter::tests::assert_round_trip;

    #[test]
    fn run_length_valid() {
        // Synthetic tests
        let defiltered = b"abbbbbc";
        let filtered = RL.filter(defiltered.as_slice()).unwrap();
        assert_eq!(filtered, b"\x00a\xFCb\x00c\x80");
        assert_eq!(RL.defilter(filtered).unwrap(), defiltered);

        let filtered = RL.filter([7; 300].as_slice()).unwrap();
        assert_eq!(filtered, b"\x81\x07\x81\x07\xD5\x07\x80");

        // The EOD marker is optional
        assert_eq!(RL.defilter(b"\x02xyz".as_slice()).unwrap(), b"xyz");
        assert_eq!(RL.defilter(b"\x00a\x80trailing".as_slice()).unwrap(), b"a");

        assert_round_trip(&RL);
    }

    #[test]
    fn run_length_invalid() {
        // Synthetic tests
        assert_err_eq!(RL.defilter(b"\x05ab".as_slice()), RLErrorCode::Truncated(0));
        assert_err_eq!(RL.defilter(b"\x00a\xFE".as_slice()), RLErrorCode::Truncated(2));
    }
}
