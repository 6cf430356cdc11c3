//! Reading, editing and writing PDF documents.
//!
//! A document is loaded into a [`Context`], an arena of indirect objects
//! keyed by [`Reference`]. Consumers edit the arena directly or through the
//! [`Document`] and [`form`] helpers and serialize it back with a
//! [`write::PdfWriter`].

mod convert;
mod fmt;
mod header;
mod process;

pub mod cmap;
pub mod context;
pub mod document;
pub mod error;
pub mod form;
pub mod object;
pub mod parse;
pub mod write;

pub use self::context::Context;
pub use self::context::TrailerInfo;
pub use self::document::Document;
pub use self::error::PdfError;
pub use self::error::PdfResult;
pub use self::header::Version;
pub use self::object::Object;
pub use self::object::ObjectKind;
pub use self::object::Reference;
pub use self::parse::Progress;

/// Stream codecs and the chain that applies them.
pub mod filter {
    pub use crate::process::filter::error::FilterErr;
    pub use crate::process::filter::error::FilterErrorCode;
    pub use crate::process::filter::Filter;
    pub use crate::process::filter::Filtering;
    pub use crate::process::filter::FilteringChain;
}

// Limit the size of the decoded stream to 1 GiB.
const DECODED_LIMIT: usize = 1 << 30;
const MAX_DEBUG_BYTES: usize = 100;

/// [7.5.4 Cross-reference table, p56] restricts byte offsets to 10 digits,
/// which fits in a u64. We need `usize` to index the buffer in any case.
pub type Offset = usize;
/// REFERENCE: [3.33 indirect object, p10]
/// Object number zero is reserved for the head of the free list.
pub type ObjectNumber = u32;
/// REFERENCE:
/// - [3.33 indirect object, p10]
/// - [7.5.4 Cross-reference table, p56-57]
/// Generation numbers are restricted to 5 digits with a maximum of 65,535.
pub type GenerationNumber = u16;
/// REFERENCE: [4.7 byte, p7]
pub type Byte = u8;
