use ::thiserror::Error;

use crate::cmap::error::CMapErr;
use crate::object::error::ObjectErr;
use crate::object::Reference;
use crate::parse::error::ParseErr;
use crate::process::filter::error::FilterErr;
use crate::process::filter::error::FilterErrorCode;
use crate::write::error::WriteErr;
use crate::Offset;

pub type PdfResult<T> = Result<T, PdfError>;

/// Failures surfaced to consumers, naming the stage and the object or offset
/// involved.
#[derive(Debug, Error, PartialEq, Clone)]
pub enum PdfError {
    #[error("Parse. Offset: {offset}. {err}")]
    Parse { offset: Offset, err: ParseErr },
    #[error("Structure: {0}")]
    Structure(String),
    #[error("Invalid object {reference}. Offset: {offset}")]
    InvalidObject {
        reference: Reference,
        offset: Offset,
    },
    #[error("Decode{}. {err}", display_reference(.reference))]
    Decode {
        reference: Option<Reference>,
        err: FilterErr,
    },
    #[error("Unsupported encoding: {0}")]
    UnsupportedEncoding(String),
    #[error("Write{}. {err}", display_reference(.reference))]
    Write {
        reference: Option<Reference>,
        err: WriteErr,
    },
    #[error("Object: {0}")]
    Object(#[from] ObjectErr),
    #[error("Reparse. {parser} can only be invoked once")]
    Reparse { parser: &'static str },
    #[error("Method not implemented. {type_name}::{method}")]
    MethodNotImplemented {
        type_name: &'static str,
        method: &'static str,
    },
    #[error("Invalid value for field {field}: {value}. Expected one of [{}]", .expected.join(", "))]
    InvalidFieldValue {
        field: Reference,
        value: String,
        expected: Vec<String>,
    },
    #[error("CMap: {0}")]
    CMap(#[from] CMapErr),
    #[error("Unsupported image: {0}")]
    UnsupportedImage(String),
}

fn display_reference(reference: &Option<Reference>) -> String {
    reference
        .map(|reference| format!(" {}", reference))
        .unwrap_or_default()
}

impl PdfError {
    pub(crate) fn decode(reference: Option<Reference>, err: FilterErr) -> Self {
        if let FilterErrorCode::Unsupported(name) = &err.code {
            return Self::UnsupportedEncoding(name.clone());
        }
        Self::Decode { reference, err }
    }

    pub(crate) fn write(reference: Option<Reference>, err: impl Into<WriteErr>) -> Self {
        Self::Write {
            reference,
            err: err.into(),
        }
    }
}

impl From<FilterErr> for PdfError {
    fn from(err: FilterErr) -> Self {
        Self::decode(None, err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = PdfError::decode(
            Some(Reference::new(4, 0)),
            FilterErr::new(
                stringify!(FilteringChain),
                FilterErrorCode::Unsupported("JBIG2Decode".to_string()),
            ),
        );
        assert_eq!(
            err,
            PdfError::UnsupportedEncoding("JBIG2Decode".to_string())
        );
        assert_eq!(err.to_string(), "Unsupported encoding: JBIG2Decode");

        let err = PdfError::Reparse {
            parser: "ObjectStreamParser",
        };
        assert_eq!(
            err.to_string(),
            "Reparse. ObjectStreamParser can only be invoked once"
        );
    }
}
