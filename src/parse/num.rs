use super::character_set::regular_token;
use super::character_set::skip_white_space_or_comment;
use crate::Byte;

macro_rules! ascii_to_unsigned {
    ($name:ident, $ty:ty) => {
        pub(crate) fn $name(bytes: &[Byte]) -> Option<$ty> {
            if bytes.is_empty() {
                return None;
            }
            let mut number: $ty = 0;
            for &byte in bytes {
                if let b'0'..=b'9' = byte {
                    number = number
                        .checked_mul(10)?
                        .checked_add(<$ty>::from(byte - b'0'))?;
                } else {
                    return None;
                }
            }
            Some(number)
        }
    };
}

ascii_to_unsigned!(ascii_to_u16, u16);
ascii_to_unsigned!(ascii_to_u32, u32);
ascii_to_unsigned!(ascii_to_u64, u64);
ascii_to_unsigned!(ascii_to_usize, usize);

/// Skips white space and comments and converts the next regular token
pub(crate) fn number_token<T>(
    buffer: &[Byte],
    convert: impl Fn(&[Byte]) -> Option<T>,
) -> Option<(&[Byte], T)> {
    let (remains, token) = regular_token(skip_white_space_or_comment(buffer)).ok()?;
    convert(token).map(|value| (remains, value))
}

fn sign(bytes: &[Byte]) -> (bool, &[Byte]) {
    match bytes.first() {
        Some(b'-') => (true, &bytes[1..]),
        Some(b'+') => (false, &bytes[1..]),
        _ => (false, bytes),
    }
}

/// REFERENCE: [7.3.3 Numeric objects, p24]
pub(crate) fn ascii_to_i64(bytes: &[Byte]) -> Option<i64> {
    let (negative, digits) = sign(bytes);
    if digits.is_empty() {
        return None;
    }
    let mut number = 0i64;
    for &byte in digits {
        let digit = match byte {
            b'0'..=b'9' => i64::from(byte - b'0'),
            _ => return None,
        };
        number = number.checked_mul(10)?;
        number = if negative {
            number.checked_sub(digit)?
        } else {
            number.checked_add(digit)?
        };
    }
    Some(number)
}

/// REFERENCE: [7.3.3 Numeric objects, p24]
/// More restrictive than str::parse::<f64> as the exponent notation is not
/// part of the PDF syntax. Accepts a leading or trailing period, e.g. `.5`,
/// `-.002` and `4.`
pub(crate) fn ascii_to_f64(bytes: &[Byte]) -> Option<f64> {
    let (negative, digits) = sign(bytes);
    // Accumulate all digits as one mantissa and divide once, so that short
    // decimals round the same way as their literal counterparts
    let mut mantissa = 0f64;
    let mut fraction_digits = 0i32;
    let mut decimal = false;
    let mut any_digit = false;
    for &byte in digits {
        match byte {
            b'0'..=b'9' => {
                any_digit = true;
                mantissa = mantissa * 10.0 + f64::from(byte - b'0');
                if decimal {
                    fraction_digits += 1;
                }
            }
            b'.' if !decimal => decimal = true,
            _ => return None,
        }
    }
    if !any_digit {
        return None;
    }
    let value = mantissa / 10f64.powi(fraction_digits);
    Some(if negative { -value } else { value })
}

/// Big-endian unsigned value of up to 8 bytes
pub(crate) fn bytes_to_u64(bytes: &[Byte]) -> Option<u64> {
    let mut number = Some(0u64);
    for &byte in bytes {
        number = number
            .and_then(|number| number.checked_mul(256))
            .and_then(|number| number.checked_add(u64::from(byte)));
    }
    number
}

pub(crate) fn hex_val(byte: Byte) -> Option<Byte> {
    match byte {
        b'0'..=b'9' => Some(byte - b'0'),
        b'A'..=b'F' => Some(byte - b'A' + 10),
        b'a'..=b'f' => Some(byte - b'a' + 10),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ascii_to_unsigned_valid() {
        assert_eq!(ascii_to_u16(b"65535"), Some(65535));
        assert_eq!(ascii_to_u16(b"65536"), None);
        assert_eq!(ascii_to_u64(b"0000000017"), Some(17));
        assert_eq!(ascii_to_u32(b""), None);
        assert_eq!(ascii_to_u32(b"1a"), None);
    }

    #[test]
    fn ascii_to_i64_valid() {
        assert_eq!(ascii_to_i64(b"+17"), Some(17));
        assert_eq!(ascii_to_i64(b"-98"), Some(-98));
        assert_eq!(ascii_to_i64(b"-9223372036854775808"), Some(i64::MIN));
        assert_eq!(ascii_to_i64(b"9223372036854775808"), None);
        assert_eq!(ascii_to_i64(b"-"), None);
        assert_eq!(ascii_to_i64(b"1.0"), None);
    }

    #[test]
    fn ascii_to_f64_valid() {
        assert_eq!(ascii_to_f64(b"34.5"), Some(34.5));
        assert_eq!(ascii_to_f64(b"-3.62"), Some(-3.62));
        assert_eq!(ascii_to_f64(b"+123.6"), Some(123.6));
        assert_eq!(ascii_to_f64(b"4."), Some(4.0));
        assert_eq!(ascii_to_f64(b"-.002"), Some(-0.002));
        assert_eq!(ascii_to_f64(b"0.0"), Some(0.0));
        assert_eq!(ascii_to_f64(b"."), None);
        assert_eq!(ascii_to_f64(b"1.2.3"), None);
        assert_eq!(ascii_to_f64(b"1e5"), None);
    }

    #[test]
    fn number_token_valid() {
        assert_eq!(
            number_token(b" % size\n 42 0 R", ascii_to_usize),
            Some((b" 0 R".as_slice(), 42))
        );
        assert_eq!(number_token(b"obj", ascii_to_usize), None);
        assert_eq!(number_token(b"", ascii_to_usize), None);
    }

    #[test]
    fn bytes_to_u64_valid() {
        assert_eq!(bytes_to_u64(b""), Some(0));
        assert_eq!(bytes_to_u64(&[0x01, 0x00]), Some(256));
        assert_eq!(bytes_to_u64(&[0xFF; 9]), None);
    }
}
