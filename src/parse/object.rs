use ::nom::bytes::complete::tag;
use ::nom::bytes::complete::take_while;
use ::nom::character::complete::char;
use ::nom::error::Error as NomError;
use ::nom::error::ErrorKind;
use ::nom::sequence::preceded;
use ::nom::Err as NomErr;

use super::character_set::is_regular;
use super::character_set::is_white_space;
use super::character_set::regular_token;
use super::character_set::skip_white_space_or_comment;
use super::character_set::white_space_or_comment;
use super::error::ParseErr;
use super::error::ParseErrorCode;
use super::error::ParseFailure;
use super::error::ParseRecoverable;
use super::error::ParseResult;
use super::num::ascii_to_f64;
use super::num::ascii_to_i64;
use super::num::ascii_to_u16;
use super::num::ascii_to_u32;
use super::num::hex_val;
use super::Parser;
use super::KW_FALSE;
use super::KW_NULL;
use super::KW_R;
use super::KW_TRUE;
use crate::fmt::debug_bytes;
use crate::object::Array;
use crate::object::Dictionary;
use crate::object::HexString;
use crate::object::Name;
use crate::object::Number;
use crate::object::Object;
use crate::object::PdfString;
use crate::object::Reference;
use crate::parse_recoverable;
use crate::Byte;
use crate::GenerationNumber;

/// Arrays and dictionaries nested deeper than this are rejected rather than
/// exhausting the stack
pub(crate) const MAX_DEPTH: usize = 256;

/// REFERENCE: [7.3 Objects, p24]
/// Direct objects, including references. Streams are only recognised as the
/// body of an indirect object.
impl Parser for Object {
    fn parse(buffer: &[Byte]) -> ParseResult<(&[Byte], Self)> {
        parse::object(buffer, 0)
    }
}

/// REFERENCE: [7.3.5 Name objects, p27-28]
impl Parser for Name {
    fn parse(buffer: &[Byte]) -> ParseResult<(&[Byte], Self)> {
        parse::name(skip_white_space_or_comment(buffer))
    }
}

/// REFERENCE: [7.3.4.2 Literal strings, p25-27]
impl Parser for PdfString {
    fn parse(buffer: &[Byte]) -> ParseResult<(&[Byte], Self)> {
        parse::literal(skip_white_space_or_comment(buffer))
    }
}

/// REFERENCE: [7.3.4.3 Hexadecimal strings, p27]
impl Parser for HexString {
    fn parse(buffer: &[Byte]) -> ParseResult<(&[Byte], Self)> {
        parse::hexadecimal(skip_white_space_or_comment(buffer))
    }
}

/// REFERENCE: [7.3.6 Array objects, p28]
impl Parser for Array {
    fn parse(buffer: &[Byte]) -> ParseResult<(&[Byte], Self)> {
        parse::array(skip_white_space_or_comment(buffer), 0)
    }
}

/// REFERENCE: [7.3.7 Dictionary objects, p28-29]
impl Parser for Dictionary {
    fn parse(buffer: &[Byte]) -> ParseResult<(&[Byte], Self)> {
        parse::dictionary(skip_white_space_or_comment(buffer), 0)
    }
}

mod parse {
    use super::*;

    fn missing_closing(buffer: &[Byte], object: &'static str) -> ParseErr {
        ParseFailure::new(buffer, object, ParseErrorCode::MissingClosing(ErrorKind::Char)).into()
    }

    pub(super) fn object(buffer: &[Byte], depth: usize) -> ParseResult<(&[Byte], Object)> {
        let buffer = skip_white_space_or_comment(buffer);
        if depth > MAX_DEPTH {
            return Err(
                ParseFailure::new(buffer, stringify!(Object), ParseErrorCode::Depth(MAX_DEPTH))
                    .into(),
            );
        }
        match buffer {
            [] => Err(ParseRecoverable::new(
                buffer,
                stringify!(Object),
                ParseErrorCode::TooSmallBuffer,
            )
            .into()),
            [b'/', ..] => name(buffer).map(|(remains, name)| (remains, name.into())),
            [b'(', ..] => literal(buffer).map(|(remains, string)| (remains, string.into())),
            [b'<', b'<', ..] => dictionary(buffer, depth)
                .map(|(remains, dictionary)| (remains, dictionary.into())),
            [b'<', ..] => hexadecimal(buffer).map(|(remains, string)| (remains, string.into())),
            [b'[', ..] => array(buffer, depth).map(|(remains, array)| (remains, array.into())),
            [byte, ..] if byte.is_ascii_digit() || matches!(byte, b'+' | b'-' | b'.') => {
                numeric_or_reference(buffer)
            }
            _ => keyword(buffer),
        }
    }

    /// `true`, `false` and `null`. Any other token, e.g. `endobj`, is left for
    /// the caller.
    fn keyword(buffer: &[Byte]) -> ParseResult<(&[Byte], Object)> {
        let (remains, token) = regular_token(buffer).map_err(parse_recoverable!(
            e,
            ParseRecoverable::new(
                e.input,
                stringify!(Object),
                ParseErrorCode::UnexpectedToken(debug_bytes(&e.input[..e.input.len().min(1)]))
            )
        ))?;
        let object = match token {
            _ if token == KW_TRUE.as_bytes() => Object::Boolean(true),
            _ if token == KW_FALSE.as_bytes() => Object::Boolean(false),
            _ if token == KW_NULL.as_bytes() => Object::Null,
            _ => {
                return Err(ParseRecoverable::new(
                    buffer,
                    stringify!(Object),
                    ParseErrorCode::UnexpectedToken(debug_bytes(token)),
                )
                .into())
            }
        };
        Ok((remains, object))
    }

    /// REFERENCE: [7.3.3 Numeric objects, p24] and [7.3.10 Indirect objects,
    /// p33]
    fn numeric_or_reference(buffer: &[Byte]) -> ParseResult<(&[Byte], Object)> {
        let (remains, token) = regular_token(buffer).map_err(parse_recoverable!(
            e,
            ParseRecoverable::new(e.input, stringify!(Number), ParseErrorCode::NotFound(e.code))
        ))?;
        if let Some(object_number) = ascii_to_u32(token) {
            if let Some((remains, generation_number)) = reference_tail(remains) {
                let reference = Reference::new(object_number, generation_number);
                return Ok((remains, reference.into()));
            }
        }
        let number = if token.contains(&b'.') {
            ascii_to_f64(token)
                .map(Number::Real)
                .ok_or(ParseErrorCode::ParseFloatError)
        } else {
            // Integers beyond the i64 range are kept as reals
            ascii_to_i64(token)
                .map(Number::Integer)
                .or_else(|| ascii_to_f64(token).map(Number::Real))
                .ok_or(ParseErrorCode::ParseIntError)
        };
        let number =
            number.map_err(|code| ParseFailure::new(buffer, stringify!(Number), code))?;
        Ok((remains, number.into()))
    }

    /// The `G R` following an object number
    fn reference_tail(buffer: &[Byte]) -> Option<(&[Byte], GenerationNumber)> {
        let (buffer, _) = white_space_or_comment(buffer).ok()?;
        let (buffer, generation_number) = regular_token(buffer).ok()?;
        let generation_number = ascii_to_u16(generation_number)?;
        let (buffer, _) = white_space_or_comment(buffer).ok()?;
        let (buffer, keyword) = regular_token(buffer).ok()?;
        (keyword == KW_R.as_bytes()).then_some((buffer, generation_number))
    }

    pub(super) fn name(buffer: &[Byte]) -> ParseResult<(&[Byte], Name)> {
        let (remains, token) = preceded(char::<_, NomError<_>>('/'), take_while(is_regular))(buffer).map_err(
            parse_recoverable!(
                e,
                ParseRecoverable::new(e.input, stringify!(Name), ParseErrorCode::NotFound(e.code))
            ),
        )?;
        Ok((remains, Name::new(decode_name(token))))
    }

    /// Resolves `#xx` escapes. A `#` not followed by two hexadecimal digits
    /// is kept as is.
    fn decode_name(token: &[Byte]) -> Vec<Byte> {
        let mut decoded = Vec::with_capacity(token.len());
        let mut index = 0;
        while index < token.len() {
            if let &[b'#', high, low, ..] = &token[index..] {
                if let (Some(high), Some(low)) = (hex_val(high), hex_val(low)) {
                    decoded.push(high << 4 | low);
                    index += 3;
                    continue;
                }
            }
            decoded.push(token[index]);
            index += 1;
        }
        decoded
    }

    pub(super) fn literal(buffer: &[Byte]) -> ParseResult<(&[Byte], PdfString)> {
        let (mut remains, _) = char::<_, NomError<_>>('(')(buffer).map_err(parse_recoverable!(
            e,
            ParseRecoverable::new(
                e.input,
                stringify!(PdfString),
                ParseErrorCode::NotFound(e.code)
            )
        ))?;
        // Here, we know that the buffer starts with a literal string, and
        // the following errors are failures
        let mut bytes = Vec::new();
        let mut depth = 0usize;
        loop {
            let (&byte, rest) = remains
                .split_first()
                .ok_or_else(|| missing_closing(remains, stringify!(PdfString)))?;
            remains = rest;
            match byte {
                b'(' => {
                    depth += 1;
                    bytes.push(byte);
                }
                b')' if depth == 0 => break,
                b')' => {
                    depth -= 1;
                    bytes.push(byte);
                }
                b'\\' => remains = escape(remains, &mut bytes),
                // An end-of-line marker within the string is read as a single
                // line feed
                b'\r' => {
                    if let [b'\n', rest @ ..] = remains {
                        remains = rest;
                    }
                    bytes.push(b'\n');
                }
                _ => bytes.push(byte),
            }
        }
        Ok((remains, PdfString::new(bytes)))
    }

    /// REFERENCE: [Table 3 — Escape sequences in literal strings, p26]
    fn escape<'buffer>(buffer: &'buffer [Byte], bytes: &mut Vec<Byte>) -> &'buffer [Byte] {
        match buffer {
            [b'n', rest @ ..] => {
                bytes.push(b'\n');
                rest
            }
            [b'r', rest @ ..] => {
                bytes.push(b'\r');
                rest
            }
            [b't', rest @ ..] => {
                bytes.push(b'\t');
                rest
            }
            [b'b', rest @ ..] => {
                bytes.push(b'\x08');
                rest
            }
            [b'f', rest @ ..] => {
                bytes.push(b'\x0C');
                rest
            }
            // Line continuation
            [b'\r', b'\n', rest @ ..] | [b'\r', rest @ ..] | [b'\n', rest @ ..] => rest,
            [b'0'..=b'7', ..] => {
                let count = buffer
                    .iter()
                    .take(3)
                    .take_while(|byte| matches!(byte, b'0'..=b'7'))
                    .count();
                let value = buffer[..count]
                    .iter()
                    .fold(0u16, |value, digit| value * 8 + u16::from(digit - b'0'));
                // High-order overflow is ignored
                bytes.push(value as Byte);
                &buffer[count..]
            }
            // Covers `\(`, `\)` and `\\`. For any other byte the backslash is
            // ignored.
            [byte, rest @ ..] => {
                bytes.push(*byte);
                rest
            }
            [] => buffer,
        }
    }

    pub(super) fn hexadecimal(buffer: &[Byte]) -> ParseResult<(&[Byte], HexString)> {
        let (mut remains, _) = char::<_, NomError<_>>('<')(buffer).map_err(parse_recoverable!(
            e,
            ParseRecoverable::new(
                e.input,
                stringify!(HexString),
                ParseErrorCode::NotFound(e.code)
            )
        ))?;
        let mut bytes = Vec::new();
        let mut high = None;
        loop {
            let (&byte, rest) = remains
                .split_first()
                .ok_or_else(|| missing_closing(remains, stringify!(HexString)))?;
            if byte == b'>' {
                remains = rest;
                break;
            }
            if !is_white_space(byte) {
                let value = hex_val(byte).ok_or_else(|| {
                    ParseFailure::new(
                        remains,
                        stringify!(HexString),
                        ParseErrorCode::UnexpectedToken(char::from(byte).to_string()),
                    )
                })?;
                match high.take() {
                    Some(high) => bytes.push(high << 4 | value),
                    None => high = Some(value),
                }
            }
            remains = rest;
        }
        // An odd final digit is followed by an implicit 0
        if let Some(high) = high {
            bytes.push(high << 4);
        }
        Ok((remains, HexString::new(bytes)))
    }

    pub(super) fn array(buffer: &[Byte], depth: usize) -> ParseResult<(&[Byte], Array)> {
        let (mut remains, _) = char::<_, NomError<_>>('[')(buffer).map_err(parse_recoverable!(
            e,
            ParseRecoverable::new(e.input, stringify!(Array), ParseErrorCode::NotFound(e.code))
        ))?;
        let mut array = Array::new();
        loop {
            remains = skip_white_space_or_comment(remains);
            match remains {
                [] => return Err(missing_closing(remains, stringify!(Array))),
                [b']', rest @ ..] => return Ok((rest, array)),
                _ => {
                    let (rest, object) =
                        object(remains, depth + 1).map_err(ParseErr::into_failure)?;
                    array.push(object);
                    remains = rest;
                }
            }
        }
    }

    pub(super) fn dictionary(
        buffer: &[Byte],
        depth: usize,
    ) -> ParseResult<(&[Byte], Dictionary)> {
        let (mut remains, _) = tag::<_, _, NomError<_>>(b"<<".as_slice())(buffer).map_err(
            parse_recoverable!(
                e,
                ParseRecoverable::new(
                    e.input,
                    stringify!(Dictionary),
                    ParseErrorCode::NotFound(e.code)
                )
            ),
        )?;
        let mut dictionary = Dictionary::new();
        loop {
            remains = skip_white_space_or_comment(remains);
            match remains {
                [] => return Err(missing_closing(remains, stringify!(Dictionary))),
                [b'>', b'>', rest @ ..] => return Ok((rest, dictionary)),
                [b'/', ..] => {
                    let (rest, key) = name(remains).map_err(ParseErr::into_failure)?;
                    let rest = skip_white_space_or_comment(rest);
                    let (rest, value) = object(rest, depth + 1).map_err(|err| match err {
                        ParseErr::Recoverable(_) => ParseFailure::new(
                            rest,
                            stringify!(Dictionary),
                            ParseErrorCode::MissingValue(key.to_string()),
                        )
                        .into(),
                        failure => failure,
                    })?;
                    dictionary.set(key, value);
                    remains = rest;
                }
                [byte, ..] => {
                    return Err(ParseFailure::new(
                        remains,
                        stringify!(Dictionary),
                        ParseErrorCode::KeyType(char::from(*byte).to_string()),
                    )
                    .into())
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse_assert_eq;

    #[test]
    fn object_numeric_valid() {
        parse_assert_eq!(b"123 ", Object::from(123), b" ".as_slice());
        parse_assert_eq!(b"-98]", Object::from(-98), b"]".as_slice());
        parse_assert_eq!(b"+.5 ", Object::from(0.5), b" ".as_slice());
        parse_assert_eq!(b"-.002", Object::from(-0.002), b"".as_slice());
        // Two numbers are not a reference
        parse_assert_eq!(b"1 0 obj", Object::from(1), b" 0 obj".as_slice());
        parse_assert_eq!(b"1 0]", Object::from(1), b" 0]".as_slice());
    }

    #[test]
    fn object_reference_valid() {
        parse_assert_eq!(
            b"12 0 R/Next",
            Object::from(Reference::new(12, 0)),
            b"/Next".as_slice(),
        );
        parse_assert_eq!(
            b"7 %comment\n 2\nR>>",
            Object::from(Reference::new(7, 2)),
            b">>".as_slice(),
        );
    }

    #[test]
    fn object_keyword_valid() {
        parse_assert_eq!(b"true ", Object::Boolean(true), b" ".as_slice());
        parse_assert_eq!(b"  false]", Object::Boolean(false), b"]".as_slice());
        parse_assert_eq!(b"null/A", Object::Null, b"/A".as_slice());
    }

    #[test]
    fn object_invalid() {
        let result: ParseResult<(&[Byte], Object)> = Parser::parse(b"endobj".as_slice());
        assert!(matches!(result, Err(ParseErr::Recoverable(_))));
        let result: ParseResult<(&[Byte], Object)> = Parser::parse(b"  ".as_slice());
        assert!(matches!(result, Err(ParseErr::Recoverable(_))));
        let result: ParseResult<(&[Byte], Object)> = Parser::parse(b"1.2.3".as_slice());
        assert!(matches!(result, Err(ParseErr::Failure(_))));
        let result: ParseResult<(&[Byte], Object)> = Parser::parse(b">>".as_slice());
        assert!(matches!(result, Err(ParseErr::Recoverable(_))));
    }

    #[test]
    fn name_valid() {
        parse_assert_eq!(b"/Type/Page", Name::from("Type"), b"/Page".as_slice());
        parse_assert_eq!(b"/A#20B ", Name::from("A B"), b" ".as_slice());
        parse_assert_eq!(b"/#2Fslash", Name::from("/slash"), b"".as_slice());
        // Invalid escapes are kept
        parse_assert_eq!(b"/A#G1", Name::from("A#G1"), b"".as_slice());
        // The empty name is valid
        parse_assert_eq!(b"/ 1", Name::from(""), b" 1".as_slice());
    }

    #[test]
    fn literal_valid() {
        parse_assert_eq!(
            b"(Strings may contain (balanced) parentheses)",
            PdfString::new(b"Strings may contain (balanced) parentheses".to_vec()),
            b"".as_slice(),
        );
        parse_assert_eq!(
            b"(\\(unbalanced\\) \\\\ \\n\\t)",
            PdfString::new(b"(unbalanced) \\ \n\t".to_vec()),
            b"".as_slice(),
        );
        // Octal escapes of one to three digits
        parse_assert_eq!(
            b"(\\0533\\53\\5x)",
            PdfString::new(b"+3+\x05x".to_vec()),
            b"".as_slice(),
        );
        // Line continuation and end-of-line normalisation
        parse_assert_eq!(
            b"(one\\\r\ntwo\r\nthree\rfour)",
            PdfString::new(b"onetwo\nthree\nfour".to_vec()),
            b"".as_slice(),
        );
        // Unknown escapes drop the backslash
        parse_assert_eq!(b"(\\q)", PdfString::new(b"q".to_vec()), b"".as_slice());
    }

    #[test]
    fn literal_invalid() {
        let result: ParseResult<(&[Byte], PdfString)> = Parser::parse(b"(open (nested)".as_slice());
        assert!(matches!(result, Err(ParseErr::Failure(_))));
    }

    #[test]
    fn hexadecimal_valid() {
        parse_assert_eq!(
            b"<48 65 6c6C6F>",
            HexString::new(b"Hello".to_vec()),
            b"".as_slice(),
        );
        parse_assert_eq!(b"<901FA>", HexString::new(vec![0x90, 0x1F, 0xA0]), b"".as_slice());
        parse_assert_eq!(b"<>", HexString::new(vec![]), b"".as_slice());
    }

    #[test]
    fn hexadecimal_invalid() {
        let result: ParseResult<(&[Byte], HexString)> = Parser::parse(b"<4G>".as_slice());
        assert!(matches!(result, Err(ParseErr::Failure(_))));
        let result: ParseResult<(&[Byte], HexString)> = Parser::parse(b"<48".as_slice());
        assert!(matches!(result, Err(ParseErr::Failure(_))));
    }

    #[test]
    fn array_valid() {
        let expected = Array::from_iter([
            Object::from(549),
            Object::from(3.5),
            Object::Boolean(false),
            Object::from(PdfString::new(b"Ralph".to_vec())),
            Object::from("SomeName"),
            Object::from(Reference::new(3, 0)),
            Object::from(Array::from_iter([1, 2])),
        ]);
        parse_assert_eq!(
            b"[549 3.5 false (Ralph) /SomeName 3 0 R [1 2]] ",
            expected,
            b" ".as_slice(),
        );
        parse_assert_eq!(b"[]", Array::new(), b"".as_slice());
    }

    #[test]
    fn array_invalid() {
        let result: ParseResult<(&[Byte], Array)> = Parser::parse(b"[1 2".as_slice());
        assert!(matches!(result, Err(ParseErr::Failure(_))));
        // A keyword inside an array cannot be recovered by another parser
        let result: ParseResult<(&[Byte], Array)> = Parser::parse(b"[1 obj]".as_slice());
        assert!(matches!(result, Err(ParseErr::Failure(_))));

        let nested = format!("{}{}", "[".repeat(MAX_DEPTH + 2), "]".repeat(MAX_DEPTH + 2));
        let result: ParseResult<(&[Byte], Array)> = Parser::parse(nested.as_bytes());
        assert!(matches!(result, Err(ParseErr::Failure(_))));
    }

    #[test]
    fn dictionary_valid() {
        let buffer = b"<</Type /Example\n/Version 0.01 /IntegerItem 12\n/Subdictionary << /Item1 0.4 /Item2 true >> /Ref 4 0 R>>";
        let (remains, dictionary) = Dictionary::parse(buffer.as_slice()).unwrap();
        assert!(remains.is_empty());
        assert!(dictionary.has_type("Example"));
        assert_eq!(dictionary.get("IntegerItem"), Some(&Object::from(12)));
        assert_eq!(dictionary.get("Ref"), Some(&Object::from(Reference::new(4, 0))));
        let subdictionary = dictionary
            .get("Subdictionary")
            .and_then(Object::as_dictionary)
            .unwrap();
        assert_eq!(subdictionary.get("Item2"), Some(&Object::Boolean(true)));
        assert_eq!(
            dictionary.keys().map(|key| key.to_string()).collect::<Vec<_>>(),
            ["/Type", "/Version", "/IntegerItem", "/Subdictionary", "/Ref"]
        );
    }

    #[test]
    fn dictionary_invalid() {
        let expected_error = ParseFailure::new(
            b">>",
            stringify!(Dictionary),
            ParseErrorCode::MissingValue("/Key".to_string()),
        );
        assert_eq!(
            Dictionary::parse(b"<< /Key >>".as_slice()),
            Err(expected_error.into())
        );
        let result = Dictionary::parse(b"<< 1 2 >>".as_slice());
        assert!(matches!(result, Err(ParseErr::Failure(_))));
        let result = Dictionary::parse(b"<< /A 1".as_slice());
        assert!(matches!(result, Err(ParseErr::Failure(_))));
    }
}
