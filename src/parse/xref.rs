use ::nom::bytes::complete::tag;
use ::nom::error::Error as NomError;
use ::nom::Err as NomErr;

use super::character_set::regular_token;
use super::character_set::skip_white_space_or_comment;
use super::error::ParseErr;
use super::error::ParseErrorCode;
use super::error::ParseFailure;
use super::error::ParseRecoverable;
use super::error::ParseResult;
use super::num::ascii_to_u16;
use super::num::ascii_to_u32;
use super::num::ascii_to_u64;
use super::num::ascii_to_usize;
use super::num::number_token;
use super::Parser;
use super::KW_STARTXREF;
use super::KW_TRAILER;
use super::KW_XREF;
use crate::object::Dictionary;
use crate::parse_recoverable;
use crate::Byte;
use crate::GenerationNumber;
use crate::ObjectNumber;
use crate::Offset;

/// REFERENCE: [7.5.5 File trailer, p58] requires `startxref` within the last
/// bytes of the file. Readers commonly search the last 1024 bytes.
const STARTXREF_WINDOW: usize = 1024;

/// An entry of a cross-reference table or stream
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub(crate) enum Entry {
    Free {
        next: ObjectNumber,
        generation: GenerationNumber,
    },
    InUse {
        offset: Offset,
        generation: GenerationNumber,
    },
    /// REFERENCE: [Table 18 — Entries in a cross-reference stream, p69]
    /// Objects stored in object streams always have generation 0.
    Compressed {
        stream: ObjectNumber,
        index: usize,
    },
}

/// One section of the cross-reference chain with the dictionary that ends
/// it: the trailer of a table or the dictionary of a stream.
#[derive(Debug, PartialEq, Clone)]
pub(crate) struct XrefSection {
    pub(crate) entries: Vec<(ObjectNumber, Entry)>,
    pub(crate) trailer: Dictionary,
}

/// REFERENCE: [7.5.4 Cross-reference table, p55-58] and [7.5.5 File trailer,
/// p58-60]
impl Parser for XrefSection {
    fn parse(buffer: &[Byte]) -> ParseResult<(&[Byte], Self)> {
        let buffer = skip_white_space_or_comment(buffer);
        let (mut remains, _) = tag::<_, _, NomError<_>>(KW_XREF.as_bytes())(buffer).map_err(
            parse_recoverable!(
                e,
                ParseRecoverable::new(
                    e.input,
                    stringify!(XrefSection),
                    ParseErrorCode::NotFound(e.code)
                )
            ),
        )?;

        let mut entries = Vec::new();
        loop {
            remains = skip_white_space_or_comment(remains);
            if let Some(rest) = remains.strip_prefix(KW_TRAILER.as_bytes()) {
                remains = rest;
                break;
            }
            let (rest, first_object_number) = number_token(remains, ascii_to_u32)
                .ok_or_else(|| failure(remains, ParseErrorCode::FirstObjectNumber))?;
            let (rest, entry_count) = number_token(rest, ascii_to_usize)
                .ok_or_else(|| failure(rest, ParseErrorCode::EntryCount))?;
            remains = rest;
            for index in 0..entry_count {
                let subsection_err = || {
                    failure(
                        remains,
                        ParseErrorCode::SubsectionEntry {
                            index,
                            first_object_number: u64::from(first_object_number),
                            entry_count,
                        },
                    )
                };
                let (rest, entry) = entry(remains).ok_or_else(subsection_err)?;
                let object_number = u32::try_from(index)
                    .ok()
                    .and_then(|index| first_object_number.checked_add(index))
                    .ok_or_else(subsection_err)?;
                entries.push((object_number, entry));
                remains = rest;
            }
        }

        let (remains, trailer) = Dictionary::parse(remains).map_err(ParseErr::into_failure)?;
        Ok((remains, Self { entries, trailer }))
    }
}

fn failure(buffer: &[Byte], code: ParseErrorCode) -> ParseErr {
    ParseFailure::new(buffer, stringify!(XrefSection), code).into()
}

/// `nnnnnnnnnn ggggg n` or `f`. The records are meant to be exactly 20 bytes
/// but writers are inconsistent with their separators, so entries are read
/// token by token.
fn entry(buffer: &[Byte]) -> Option<(&[Byte], Entry)> {
    let (remains, offset) = number_token(buffer, ascii_to_u64)?;
    let (remains, generation) = number_token(remains, ascii_to_u16)?;
    let (remains, kind) = regular_token(skip_white_space_or_comment(remains)).ok()?;
    let entry = match kind {
        b"n" => Entry::InUse {
            offset: Offset::try_from(offset).ok()?,
            generation,
        },
        b"f" => Entry::Free {
            next: ObjectNumber::try_from(offset).ok()?,
            generation,
        },
        _ => return None,
    };
    Some((remains, entry))
}

/// The offset recorded after the last `startxref` keyword
pub(crate) fn startxref(buffer: &[Byte]) -> Option<Offset> {
    let tail = &buffer[buffer.len().saturating_sub(STARTXREF_WINDOW)..];
    let position = rfind(tail, KW_STARTXREF.as_bytes())?;
    let (_, offset) = number_token(&tail[position + KW_STARTXREF.len()..], ascii_to_usize)?;
    Some(offset)
}

pub(crate) fn rfind(haystack: &[Byte], needle: &[Byte]) -> Option<usize> {
    if needle.is_empty() || haystack.len() < needle.len() {
        return None;
    }
    haystack.windows(needle.len()).rposition(|window| window == needle)
}
