use ::thiserror::Error;

use super::ObjectKind;

pub type ObjectResult<T> = Result<T, ObjectErr>;

#[derive(Debug, Error, PartialEq, Clone)]
pub enum ObjectErr {
    #[error("Unexpected object type. Expected one of {}. Found: {found}", display_kinds(.expected))]
    UnexpectedType {
        expected: Vec<ObjectKind>,
        found: ObjectKind,
    },
    #[error("Array is not a rectangle. Expected 4 numbers. Found {0} entries")]
    NotARectangle(usize),
    #[error("Missing required entry: {0}")]
    MissingEntry(&'static str),
    #[error("Invalid value for entry {0}: {1}")]
    InvalidValue(&'static str, String),
}

fn display_kinds(kinds: &[ObjectKind]) -> String {
    let kinds = kinds
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" | ");
    format!("[{}]", kinds)
}
