use ::thiserror::Error;

use crate::process::filter::error::FilterErr;

#[derive(Debug, Error, PartialEq, Clone)]
pub enum WriteErr {
    /// The serialization pass disagrees with the layout pass. Offsets in the
    /// cross-reference data would be wrong.
    #[error("Size mismatch. Laid out: {expected} bytes. Written: {actual} bytes")]
    SizeMismatch { expected: usize, actual: usize },
    #[error("Object number {0} cannot hold an object stream")]
    ObjectNumberOverflow(u64),
    #[error("Encoding. {0}")]
    Filter(#[from] FilterErr),
}
