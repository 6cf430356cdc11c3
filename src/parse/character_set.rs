use ::log::trace;
use ::nom::branch::alt;
use ::nom::bytes::complete::take_till;
use ::nom::bytes::complete::take_while1;
use ::nom::character::complete::char;
use ::nom::combinator::recognize;
use ::nom::multi::many1;
use ::nom::sequence::preceded;
use ::nom::IResult;

use crate::fmt::debug_bytes;
use crate::Byte;

/// REFERENCE: [3.68 white-space character, p14] and ["Table 1 — White-space
/// characters" in 7.2.3, "Character set", p22]
pub(crate) const fn is_white_space(byte: Byte) -> bool {
    byte == b'\x09' // HORIZONTAL TABULATION
        || byte == b'\x0A' // LINE FEED
        || byte == b'\x0C' // FORM FEED
        || byte == b'\x0D' // CARRIAGE RETURN
        || byte == b'\x20' // SPACE
        || byte == b'\x00' // NULL
}

/// REFERENCE: [7.2.3 Character set, p22]
pub(crate) fn white_space(buffer: &[Byte]) -> IResult<&[Byte], &[Byte]> {
    take_while1(is_white_space)(buffer)
}

/// REFERENCE: [7.2.4 Comments, p23]
pub(crate) fn comment(buffer: &[Byte]) -> IResult<&[Byte], &[Byte]> {
    let (buffer, comment) =
        preceded(char('%'), take_till(|byte| byte == b'\n' || byte == b'\r'))(buffer)?;
    trace!("Comment: {}", debug_bytes(comment));
    Ok((buffer, comment))
}

/// REFERENCE: [7.2.4 Comments, p23]
pub(crate) fn white_space_or_comment(buffer: &[Byte]) -> IResult<&[Byte], &[Byte]> {
    // A comment is treated as a single white-space character.
    recognize(many1(alt((white_space, comment))))(buffer)
}

/// Skips any run of white space and comments, possibly empty
pub(crate) fn skip_white_space_or_comment(buffer: &[Byte]) -> &[Byte] {
    white_space_or_comment(buffer)
        .map(|(remains, _)| remains)
        .unwrap_or(buffer)
}

/// REFERENCE: [7.2.3 Character set, p22]
pub(crate) const fn is_delimiter(byte: Byte) -> bool {
    byte == b'('
        || byte == b')'
        || byte == b'<'
        || byte == b'>'
        || byte == b'['
        || byte == b']'
        || byte == b'{'
        || byte == b'}'
        || byte == b'/'
        || byte == b'%'
}

/// REFERENCE: [7.2.3 Character set, p23] indicates that regular characters are
/// not restricted to the ASCII range.
pub(crate) const fn is_regular(byte: Byte) -> bool {
    !is_white_space(byte) && !is_delimiter(byte)
}

/// A run of regular characters: a number, a keyword or the body of a name
pub(crate) fn regular_token(buffer: &[Byte]) -> IResult<&[Byte], &[Byte]> {
    take_while1(is_regular)(buffer)
}
