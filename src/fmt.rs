use crate::parse::character_set::is_white_space;
use crate::Byte;
use crate::MAX_DEBUG_BYTES;

/// Printable form of a byte buffer for error messages and logs
pub(crate) fn debug_bytes(bytes: &[Byte]) -> String {
    let mut result = String::new();
    for &byte in bytes.iter().take(MAX_DEBUG_BYTES) {
        if byte.is_ascii_graphic() || is_white_space(byte) {
            // Preserve ASCII printable and white-space characters
            result.push(char::from(byte));
        } else {
            // Hexadecimal representation of other bytes
            result.push_str(&format!("\\x{:02X}", byte));
        }
    }
    if MAX_DEBUG_BYTES < bytes.len() {
        result.push_str("...");
    }
    result
}

/// Upper-case hexadecimal digits of `bytes`
pub(crate) fn hex_upper(bytes: &[Byte]) -> String {
    let mut result = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        result.push_str(&format!("{:02X}", byte));
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_bytes_valid() {
        assert_eq!(debug_bytes(b"obj\x01"), "obj\\x01");
        let long = vec![b'a'; MAX_DEBUG_BYTES + 1];
        assert!(debug_bytes(&long).ends_with("..."));
        assert_eq!(hex_upper(b"\x00\xAB"), "00AB");
    }
}
