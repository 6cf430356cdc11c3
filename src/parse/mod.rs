//! Reads PDF bytes into a [`Context`](crate::Context).
//!
//! The building blocks are nom-based parsers implementing [`Parser`] for
//! objects, indirect objects and cross-reference sections. The
//! [`DocumentParser`] ties them together and can suspend between indirect
//! objects.

pub(crate) mod character_set;
pub mod document;
pub mod error;
pub(crate) mod indirect;
pub(crate) mod num;
pub(crate) mod object;
pub mod object_stream;
pub(crate) mod xref;
pub(crate) mod xref_stream;

pub use self::document::DocumentParser;
pub use self::document::ParseOptions;
pub use self::object_stream::ObjectStreamParser;

use self::error::ParseResult;
use crate::Byte;

pub(crate) const MARKER_PDF: &str = "%PDF-";
pub(crate) const EOF: &str = "%%EOF";
pub(crate) const KW_ENDOBJ: &str = "endobj";
pub(crate) const KW_ENDSTREAM: &str = "endstream";
pub(crate) const KW_FALSE: &str = "false";
pub(crate) const KW_NULL: &str = "null";
pub(crate) const KW_OBJ: &str = "obj";
pub(crate) const KW_R: &str = "R";
pub(crate) const KW_STARTXREF: &str = "startxref";
pub(crate) const KW_STREAM: &str = "stream";
pub(crate) const KW_TRAILER: &str = "trailer";
pub(crate) const KW_TRUE: &str = "true";
pub(crate) const KW_XREF: &str = "xref";

/// Outcome of one cooperative step of a long-running parse or write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Progress {
    /// The yield predicate asked to suspend; call `resume` again to continue
    Yielded,
    Complete,
}

pub(crate) trait Parser: Sized {
    fn parse(buffer: &[Byte]) -> ParseResult<(&[Byte], Self)>;
}

#[cfg(test)]
mod tests {
    #[macro_export]
    macro_rules! parse_assert_eq {
        ($buffer:expr, $expected_parsed:expr, $expected_remains:expr) => {
            assert_eq!(
                Parser::parse($buffer).unwrap(),
                ($expected_remains, $expected_parsed)
            );
        };
        // The two patterns differ only in the trailing comma
        ($buffer:expr, $expected_parsed:expr, $expected_remains:expr,) => {
            assert_eq!(
                Parser::parse($buffer).unwrap(),
                ($expected_remains, $expected_parsed)
            );
        };
    }
}
