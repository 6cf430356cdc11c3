use ::std::fmt::Debug;
use ::std::fmt::Display;
use ::std::fmt::Formatter;
use ::std::fmt::Result as FmtResult;

use crate::fmt::debug_bytes;
use crate::fmt::hex_upper;
use crate::Byte;

const UTF16_BOM: &[Byte] = b"\xFE\xFF";

/// REFERENCE: [7.3.4.2 Literal strings, p25-27]
/// The bytes are stored with escape sequences resolved.
#[derive(Clone, PartialEq, Eq, Hash, Default)]
pub struct PdfString(Vec<Byte>);

/// REFERENCE: [7.3.4.3 Hexadecimal strings, p27]
/// The same semantic type as [`PdfString`], written in hexadecimal form.
#[derive(Clone, PartialEq, Eq, Hash, Default)]
pub struct HexString(Vec<Byte>);

impl PdfString {
    pub fn new(bytes: impl Into<Vec<Byte>>) -> Self {
        Self(bytes.into())
    }

    /// Encodes the text as PDFDocEncoding when it is ASCII, UTF-16BE with a
    /// byte order mark otherwise
    pub fn from_text(text: &str) -> Self {
        Self(encode_text(text))
    }

    pub fn as_bytes(&self) -> &[Byte] {
        &self.0
    }

    pub fn decode_text(&self) -> String {
        decode_text(&self.0)
    }

    /// The literal form with `\`, `(`, `)` and carriage returns escaped
    pub(crate) fn escaped(&self) -> Vec<Byte> {
        let mut escaped = Vec::with_capacity(self.0.len() + 2);
        escaped.push(b'(');
        for &byte in self.0.iter() {
            match byte {
                b'\\' | b'(' | b')' => escaped.extend_from_slice(&[b'\\', byte]),
                // An unescaped carriage return would be read back as a line feed
                b'\r' => escaped.extend_from_slice(b"\\r"),
                _ => escaped.push(byte),
            }
        }
        escaped.push(b')');
        escaped
    }
}

impl HexString {
    pub fn new(bytes: impl Into<Vec<Byte>>) -> Self {
        Self(bytes.into())
    }

    pub fn from_text(text: &str) -> Self {
        Self(encode_text(text))
    }

    pub fn as_bytes(&self) -> &[Byte] {
        &self.0
    }

    pub fn decode_text(&self) -> String {
        decode_text(&self.0)
    }

    pub(crate) fn escaped(&self) -> Vec<Byte> {
        format!("<{}>", hex_upper(&self.0)).into_bytes()
    }
}

impl Display for PdfString {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", debug_bytes(&self.escaped()))
    }
}

impl Debug for PdfString {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "({})", debug_bytes(&self.0))
    }
}

impl Display for HexString {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "<{}>", hex_upper(&self.0))
    }
}

impl Debug for HexString {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "<{}>", hex_upper(&self.0))
    }
}

/// REFERENCE: [7.9.2.2 Text string type, p86]
fn encode_text(text: &str) -> Vec<Byte> {
    if text.is_ascii() {
        return text.as_bytes().to_vec();
    }
    let mut bytes = UTF16_BOM.to_vec();
    for unit in text.encode_utf16() {
        bytes.extend_from_slice(&unit.to_be_bytes());
    }
    bytes
}

/// PDFDocEncoding is decoded as Latin-1, which agrees with it on every
/// printable character a form value is likely to contain.
fn decode_text(bytes: &[Byte]) -> String {
    if let Some(rest) = bytes.strip_prefix(UTF16_BOM) {
        let units = rest
            .chunks(2)
            .map(|pair| match *pair {
                [high, low] => u16::from_be_bytes([high, low]),
                [high] => u16::from_be_bytes([high, 0]),
                _ => 0,
            })
            .collect::<Vec<_>>();
        String::from_utf16_lossy(&units)
    } else {
        bytes.iter().map(|&byte| char::from(byte)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_escaped() {
        let string = PdfString::new(b"a(b)\\c\rd".to_vec());
        assert_eq!(string.escaped(), b"(a\\(b\\)\\\\c\\rd)");
        let string = HexString::new(b"\x01\xAB".to_vec());
        assert_eq!(string.escaped(), b"<01AB>");
    }

    #[test]
    fn string_text() {
        assert_eq!(PdfString::from_text("plain").as_bytes(), b"plain");
        let string = PdfString::from_text("é€");
        assert_eq!(string.as_bytes(), b"\xFE\xFF\x00\xE9\x20\xAC");
        assert_eq!(string.decode_text(), "é€");
        assert_eq!(HexString::new(b"\xE9t\xE9".to_vec()).decode_text(), "été");
    }
}
