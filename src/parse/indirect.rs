use ::log::debug;
use ::nom::bytes::complete::take_until;
use ::nom::error::Error as NomError;
use ::nom::Err as NomErr;

use super::character_set::is_white_space;
use super::character_set::regular_token;
use super::character_set::skip_white_space_or_comment;
use super::error::ParseErr;
use super::error::ParseErrorCode;
use super::error::ParseFailure;
use super::error::ParseRecoverable;
use super::error::ParseResult;
use super::num::ascii_to_u16;
use super::num::ascii_to_u32;
use super::num::number_token;
use super::Parser;
use super::KW_ENDOBJ;
use super::KW_ENDSTREAM;
use super::KW_OBJ;
use super::KW_STREAM;
use crate::object::dictionary::KEY_LENGTH;
use crate::object::Dictionary;
use crate::object::Object;
use crate::object::Reference;
use crate::object::Stream;
use crate::parse_failure;
use crate::Byte;

/// REFERENCE: [7.3.10 Indirect objects, p33]
#[derive(Debug, PartialEq, Clone)]
pub(crate) struct IndirectObject {
    pub(crate) reference: Reference,
    pub(crate) object: Object,
}

impl Parser for IndirectObject {
    fn parse(buffer: &[Byte]) -> ParseResult<(&[Byte], Self)> {
        let (remains, reference) = header(buffer)?;
        // Once the header is found, the object is known to be indirect
        let (remains, object) = Object::parse(remains).map_err(ParseErr::into_failure)?;

        let after_object = skip_white_space_or_comment(remains);
        let (remains, object) = match object {
            Object::Dictionary(dictionary) if starts_with_keyword(after_object, KW_STREAM) => {
                let (remains, data) =
                    stream_data(&after_object[KW_STREAM.len()..], &dictionary)?;
                (remains, Stream::raw(dictionary, data).into())
            }
            object => (remains, object),
        };

        let after_object = skip_white_space_or_comment(remains);
        let remains = if starts_with_keyword(after_object, KW_ENDOBJ) {
            &after_object[KW_ENDOBJ.len()..]
        } else {
            debug!("Missing {} after object {}", KW_ENDOBJ, reference);
            remains
        };
        Ok((remains, Self { reference, object }))
    }
}

/// `N G obj`. Fails recoverably when the buffer does not start with an
/// indirect object header.
pub(crate) fn header(buffer: &[Byte]) -> ParseResult<(&[Byte], Reference)> {
    let buffer = skip_white_space_or_comment(buffer);
    let not_found = |code: ParseErrorCode| -> ParseErr {
        ParseRecoverable::new(buffer, stringify!(IndirectObject), code).into()
    };
    let (remains, object_number) =
        number_token(buffer, ascii_to_u32).ok_or_else(|| not_found(ParseErrorCode::ObjectNumber))?;
    let (remains, generation_number) = number_token(remains, ascii_to_u16)
        .ok_or_else(|| not_found(ParseErrorCode::GenerationNumber))?;
    let remains = skip_white_space_or_comment(remains);
    if !starts_with_keyword(remains, KW_OBJ) {
        return Err(not_found(ParseErrorCode::UnexpectedToken(KW_OBJ.to_string())));
    }
    Ok((
        &remains[KW_OBJ.len()..],
        Reference::new(object_number, generation_number),
    ))
}

/// The bytes between an indirect object header and its `endobj`, trimmed of
/// white space. Used to keep objects that fail to parse.
pub(crate) fn body(buffer: &[Byte]) -> Option<&[Byte]> {
    let (remains, _) = header(buffer).ok()?;
    let body = take_until::<_, _, NomError<_>>(KW_ENDOBJ.as_bytes())(remains)
        .map(|(_, body)| body)
        .unwrap_or(remains);
    Some(trim_white_space(body))
}

pub(crate) fn trim_white_space(bytes: &[Byte]) -> &[Byte] {
    let start = bytes
        .iter()
        .position(|&byte| !is_white_space(byte))
        .unwrap_or(bytes.len());
    let end = bytes
        .iter()
        .rposition(|&byte| !is_white_space(byte))
        .map_or(start, |end| end + 1);
    &bytes[start..end]
}

fn starts_with_keyword(buffer: &[Byte], keyword: &str) -> bool {
    matches!(regular_token(buffer), Ok((_, token)) if token == keyword.as_bytes())
}

/// REFERENCE: [7.3.8.1 General, p31-32]
/// A direct `/Length` is trusted when `endstream` follows the data it
/// delimits. Otherwise, including for an indirect `/Length`, the data extends
/// to the next `endstream` keyword.
fn stream_data<'buffer>(
    buffer: &'buffer [Byte],
    dictionary: &Dictionary,
) -> ParseResult<(&'buffer [Byte], Vec<Byte>)> {
    // The keyword stream is followed by CRLF or LF. A lone CR is tolerated.
    let data = match buffer {
        [b'\r', b'\n', rest @ ..] | [b'\n', rest @ ..] | [b'\r', rest @ ..] => rest,
        _ => buffer,
    };

    if let Some(length) = dictionary.get(KEY_LENGTH).and_then(Object::as_usize) {
        if let Some((content, after)) = data.get(..length).zip(data.get(length..)) {
            let after = skip_white_space_or_comment(after);
            if starts_with_keyword(after, KW_ENDSTREAM) {
                return Ok((&after[KW_ENDSTREAM.len()..], content.to_vec()));
            }
        }
        debug!("Stream /Length {} does not end at {}", length, KW_ENDSTREAM);
    }

    let (remains, content) = take_until::<_, _, NomError<_>>(KW_ENDSTREAM.as_bytes())(data)
        .map_err(parse_failure!(
            e,
            ParseFailure::new(
                e.input,
                stringify!(Stream),
                ParseErrorCode::StreamData(e.code)
            )
        ))?;
    // The end-of-line marker before endstream is not part of the data
    let content = content
        .strip_suffix(b"\r\n")
        .or_else(|| content.strip_suffix(b"\n"))
        .or_else(|| content.strip_suffix(b"\r"))
        .unwrap_or(content);
    Ok((&remains[KW_ENDSTREAM.len()..], content.to_vec()))
}
