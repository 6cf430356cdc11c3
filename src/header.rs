use ::nom::bytes::complete::tag;
use ::nom::bytes::complete::take;
use ::nom::error::Error as NomError;
use ::nom::sequence::preceded;
use ::nom::Err as NomErr;
use ::std::fmt::Display;
use ::std::fmt::Formatter;
use ::std::fmt::Result as FmtResult;

use crate::parse::error::ParseErr;
use crate::parse::error::ParseErrorCode;
use crate::parse::error::ParseFailure;
use crate::parse::error::ParseRecoverable;
use crate::parse::error::ParseResult;
use crate::parse::Parser;
use crate::parse::MARKER_PDF;
use crate::parse_recoverable;
use crate::Byte;

/// REFERENCE: [7.5.2 File header, p54-55]
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone, Copy, Default)]
pub enum Version {
    V1_0,
    V1_1,
    V1_2,
    V1_3,
    V1_4,
    V1_5,
    V1_6,
    #[default]
    V1_7,
    V2_0,
}

impl Display for Version {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let version = match self {
            Version::V1_0 => "1.0",
            Version::V1_1 => "1.1",
            Version::V1_2 => "1.2",
            Version::V1_3 => "1.3",
            Version::V1_4 => "1.4",
            Version::V1_5 => "1.5",
            Version::V1_6 => "1.6",
            Version::V1_7 => "1.7",
            Version::V2_0 => "2.0",
        };

        write!(f, "{}{}", MARKER_PDF, version)
    }
}

impl Parser for Version {
    /// Reads `%PDF-x.y` at the start of the buffer
    fn parse(buffer: &[Byte]) -> ParseResult<(&[Byte], Self)> {
        let (remains, version) =
            preceded(tag::<_, _, NomError<_>>(MARKER_PDF.as_bytes()), take(3usize))(buffer)
                .map_err(parse_recoverable!(
                    e,
                    ParseRecoverable::new(
                        e.input,
                        stringify!(Version),
                        ParseErrorCode::NotFound(e.code)
                    )
                ))?;
        let version = match version {
            b"1.0" => Version::V1_0,
            b"1.1" => Version::V1_1,
            b"1.2" => Version::V1_2,
            b"1.3" => Version::V1_3,
            b"1.4" => Version::V1_4,
            b"1.5" => Version::V1_5,
            b"1.6" => Version::V1_6,
            b"1.7" => Version::V1_7,
            b"2.0" => Version::V2_0,
            _ => {
                return Err(
                    ParseFailure::new(version, stringify!(Version), ParseErrorCode::Version).into(),
                )
            }
        };

        Ok((remains, version))
    }
}
