use ::nom::error::ErrorKind;
use ::thiserror::Error;

use crate::fmt::debug_bytes;
use crate::Byte;
use crate::Offset;
use crate::MAX_DEBUG_BYTES;

pub type ParseResult<T> = Result<T, ParseErr>;
/// Recoverable parsing error
/// This error is used when the parser is unable to determine the value type
/// and the buffer needs to be reprocessed with a different parser
pub type ParseRecoverable = ParseError<true>;
/// Unrecoverable parsing error
/// This error is used when the parser is able to determine the value type
/// but fails to parse it completely
pub type ParseFailure = ParseError<false>;

#[derive(Debug, Error, PartialEq, Clone)]
pub enum ParseErr {
    #[error("Parse Recoverable: {0}")]
    Recoverable(ParseRecoverable),
    #[error("Parse Failure: {0}")]
    Failure(ParseFailure),
}

/// Errors keep the length of the unparsed remainder rather than borrowing the
/// buffer, so they outlive the bytes being parsed. The offset of the error is
/// the length of the whole buffer minus `remaining`.
#[derive(Debug, Error, PartialEq, Clone)]
#[error("{object}. Error: {code}. Buffer: {}", debug_bytes(.snippet))]
pub struct ParseError<const RECOVERABLE: bool> {
    remaining: usize,
    snippet: Vec<Byte>,
    object: &'static str,
    code: ParseErrorCode,
}

#[derive(Debug, Error, PartialEq, Clone)]
pub enum ParseErrorCode {
    // Whole buffer errors
    #[error("Buffer is too small")]
    TooSmallBuffer,
    // Whole object errors
    #[error("Wrong object type")]
    WrongObjectType,
    #[error("Not found. Nom: {}", .0.description())]
    NotFound(ErrorKind),
    #[error("Stream data. Nom: {}", .0.description())]
    StreamData(ErrorKind),
    #[error("Missing closing. Nom: {}", .0.description())]
    MissingClosing(ErrorKind),
    // Collection Errors
    #[error("Missing value. Key: {0}")]
    MissingValue(String),
    #[error("Key is not a name. Found: {0}")]
    KeyType(String),
    #[error("Unexpected token: {0}")]
    UnexpectedToken(String),
    #[error("Nesting deeper than {0}")]
    Depth(usize),
    // Cross-reference errors
    #[error(
        "Entry number {} in subsection {} {}",
        index,
        first_object_number,
        entry_count
    )]
    SubsectionEntry {
        index: usize,
        first_object_number: u64,
        entry_count: usize,
    },
    #[error("Object number")]
    ObjectNumber,
    #[error("Generation number")]
    GenerationNumber,
    #[error("First object number")]
    FirstObjectNumber,
    #[error("Offset")]
    Offset,
    #[error("Entry type")]
    EntryType,
    #[error("Entry count")]
    EntryCount,
    #[error("Parse as i64")]
    ParseIntError,
    #[error("Parse as f64")]
    ParseFloatError,
    #[error("Version")]
    Version,
}

#[macro_export]
macro_rules! parse_failure {
    ($e:ident, $failure:expr) => {
        |err| match err {
            NomErr::Incomplete(_) => unreachable!(
                "::nom::complete functions do not return the Incomplete error variant."
            ),
            NomErr::Error($e) | NomErr::Failure($e) => ParseErr::Failure($failure),
        }
    };
}

#[macro_export]
macro_rules! parse_recoverable {
    ($e:ident, $error:expr) => {
        |err| match err {
            NomErr::Incomplete(_) => unreachable!(
                "::nom::complete functions do not return the Incomplete error variant."
            ),
            NomErr::Error($e) | NomErr::Failure($e) => ParseErr::Recoverable($error),
        }
    };
}

mod convert {
    use super::*;
    use crate::impl_from;

    impl_from!(ParseFailure, Failure, ParseErr);
    impl_from!(ParseRecoverable, Recoverable, ParseErr);

    impl<const RECOVERABLE: bool> ParseError<RECOVERABLE> {
        pub fn new(buffer: &[Byte], object: &'static str, code: ParseErrorCode) -> Self {
            Self {
                remaining: buffer.len(),
                snippet: buffer[..buffer.len().min(MAX_DEBUG_BYTES)].to_vec(),
                object,
                code,
            }
        }

        pub fn code(&self) -> &ParseErrorCode {
            &self.code
        }

        pub fn object(&self) -> &'static str {
            self.object
        }
    }

    impl ParseRecoverable {
        pub fn into_failure(self) -> ParseFailure {
            ParseError {
                remaining: self.remaining,
                snippet: self.snippet,
                object: self.object,
                code: self.code,
            }
        }
    }

    impl ParseErr {
        /// Once the type of an object is known, errors in its parts can no
        /// longer be recovered by another parser
        pub fn into_failure(self) -> Self {
            match self {
                Self::Recoverable(err) => Self::Failure(err.into_failure()),
                failure => failure,
            }
        }

        /// Length of the unparsed remainder when the error occurred
        pub fn remaining(&self) -> usize {
            match self {
                Self::Recoverable(err) => err.remaining,
                Self::Failure(err) => err.remaining,
            }
        }

        /// Absolute offset of the error within a buffer of `total` bytes
        pub fn offset_in(&self, total: usize) -> Offset {
            total.saturating_sub(self.remaining())
        }

        pub fn code(&self) -> &ParseErrorCode {
            match self {
                Self::Recoverable(err) => &err.code,
                Self::Failure(err) => &err.code,
            }
        }

        pub fn is_recoverable(&self) -> bool {
            matches!(self, Self::Recoverable(_))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_err_offset() {
        let buffer = b"1 0 obj\n<< /Type /Catalog";
        let err: ParseErr = ParseFailure::new(
            &buffer[8..],
            stringify!(Dictionary),
            ParseErrorCode::MissingClosing(ErrorKind::Tag),
        )
        .into();
        assert_eq!(err.offset_in(buffer.len()), 8);
        assert!(!err.is_recoverable());
        assert_eq!(err.code(), &ParseErrorCode::MissingClosing(ErrorKind::Tag));
    }
}
