use ::log::debug;
use ::log::warn;
use ::std::collections::BTreeSet;

use super::indirect::trim_white_space;
use super::num::ascii_to_u32;
use super::num::ascii_to_usize;
use super::num::number_token;
use super::Parser;
use crate::context::Context;
use crate::error::PdfError;
use crate::error::PdfResult;
use crate::object::Invalid;
use crate::object::Object;
use crate::object::ObjectErr;
use crate::object::Reference;
use crate::object::Stream;
use crate::ObjectNumber;
use crate::Offset;

pub(crate) const KEY_N: &str = "N";
pub(crate) const KEY_FIRST: &str = "First";

/// Expands one object stream into the context it belongs to.
///
/// REFERENCE: [7.5.7 Object streams, p64-65]
/// Every object stored in an object stream has generation 0. The parser can
/// run once; later calls fail with [`PdfError::Reparse`].
#[derive(Debug)]
pub struct ObjectStreamParser {
    reference: Reference,
    stream: Stream,
    members: Option<BTreeSet<ObjectNumber>>,
    capture_invalid: bool,
    parsed: bool,
}

impl ObjectStreamParser {
    pub fn new(reference: Reference, stream: Stream) -> Self {
        Self {
            reference,
            stream,
            members: None,
            capture_invalid: true,
            parsed: false,
        }
    }

    /// Restricts expansion to the objects the cross-reference data locates in
    /// this stream. Without a member set, objects already in the context are
    /// left untouched.
    pub(crate) fn with_members(mut self, members: BTreeSet<ObjectNumber>) -> Self {
        self.members = Some(members);
        self
    }

    pub fn with_capture_invalid(mut self, capture_invalid: bool) -> Self {
        self.capture_invalid = capture_invalid;
        self
    }

    /// Assigns the objects of the stream and returns their references in
    /// stream order
    pub fn parse_into_context(&mut self, context: &mut Context) -> PdfResult<Vec<Reference>> {
        if self.parsed {
            return Err(PdfError::Reparse {
                parser: stringify!(ObjectStreamParser),
            });
        }
        self.parsed = true;

        let dictionary = self.stream.dictionary();
        let count = dictionary
            .get(KEY_N)
            .and_then(Object::as_usize)
            .ok_or(ObjectErr::MissingEntry(KEY_N))?;
        let first = dictionary
            .get(KEY_FIRST)
            .and_then(Object::as_usize)
            .ok_or(ObjectErr::MissingEntry(KEY_FIRST))?;
        let data = self
            .stream
            .decode(context)
            .map_err(|err| PdfError::decode(Some(self.reference), err))?;

        let header = data.get(..first).ok_or_else(|| {
            PdfError::Structure(format!(
                "Object stream {}: /First {} is past the end of {} decoded bytes",
                self.reference,
                first,
                data.len()
            ))
        })?;
        let offsets = header_pairs(header, count, self.reference)?;

        let mut references = Vec::with_capacity(offsets.len());
        for (index, &(object_number, offset)) in offsets.iter().enumerate() {
            let reference = Reference::new(object_number, 0);
            let is_member = match &self.members {
                Some(members) => members.contains(&object_number),
                None => !context.contains(reference),
            };
            if !is_member {
                debug!(
                    "Object {} in object stream {} is superseded",
                    reference, self.reference
                );
                continue;
            }

            let start = first.saturating_add(offset);
            // An object ends where the next one starts
            let end = offsets
                .get(index + 1)
                .map_or(data.len(), |&(_, next)| first.saturating_add(next))
                .min(data.len());
            let body = data.get(start..end.max(start)).unwrap_or_default();
            let object = match Object::parse(body) {
                Ok((_, object)) => object,
                Err(err) if self.capture_invalid => {
                    warn!(
                        "Object {} in object stream {} is invalid: {}",
                        reference, self.reference, err
                    );
                    Invalid::new(trim_white_space(body)).into()
                }
                Err(err) => {
                    return Err(PdfError::Parse {
                        offset: start,
                        err,
                    })
                }
            };
            context.assign(reference, object);
            references.push(reference);
        }
        Ok(references)
    }
}

/// `N` pairs of object number and offset relative to `/First`
fn header_pairs(
    header: &[u8],
    count: usize,
    reference: Reference,
) -> PdfResult<Vec<(ObjectNumber, Offset)>> {
    let mut remains = header;
    let mut pairs = Vec::with_capacity(count.min(header.len()));
    for index in 0..count {
        let pair = number_token(remains, ascii_to_u32).and_then(|(rest, object_number)| {
            number_token(rest, ascii_to_usize).map(|(rest, offset)| (rest, (object_number, offset)))
        });
        match pair {
            Some((rest, pair)) => {
                pairs.push(pair);
                remains = rest;
            }
            None => {
                return Err(PdfError::Structure(format!(
                    "Object stream {}: header pair {} of {} is malformed",
                    reference, index, count
                )))
            }
        }
    }
    Ok(pairs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::Dictionary;
    use crate::object::PdfString;

    fn object_stream(count: usize, header: &str, body: &str) -> Stream {
        let dictionary = Dictionary::from_iter([
            ("Type", Object::from("ObjStm")),
            ("N", Object::from(count)),
            ("First", Object::from(header.len())),
        ]);
        Stream::raw(dictionary, format!("{}{}", header, body).into_bytes())
    }

    #[test]
    fn object_stream_expand() {
        let stream = object_stream(3, "11 0 12 7 13 15 ", "(Hello) [1 2 3]<< /A 1 >>");
        let mut context = Context::new();
        let mut parser = ObjectStreamParser::new(Reference::new(20, 0), stream);
        let references = parser.parse_into_context(&mut context).unwrap();
        assert_eq!(
            references,
            vec![
                Reference::new(11, 0),
                Reference::new(12, 0),
                Reference::new(13, 0)
            ]
        );
        assert_eq!(
            context.get(Reference::new(11, 0)),
            Some(&Object::from(PdfString::new(b"Hello".to_vec())))
        );
        assert_eq!(
            context
                .get(Reference::new(13, 0))
                .and_then(|object| object.as_dictionary())
                .and_then(|dictionary| dictionary.get("A")),
            Some(&Object::from(1))
        );

        // Single use
        assert_eq!(
            parser.parse_into_context(&mut context),
            Err(PdfError::Reparse {
                parser: "ObjectStreamParser"
            })
        );
    }

    #[test]
    fn object_stream_members() {
        let stream = object_stream(2, "1 0 2 2 ", "10 20");
        let mut context = Context::new();
        context.assign(Reference::new(2, 0), "Newer");
        let mut parser = ObjectStreamParser::new(Reference::new(5, 0), stream.clone());
        let references = parser.parse_into_context(&mut context).unwrap();
        assert_eq!(references, vec![Reference::new(1, 0)]);
        assert_eq!(
            context.get(Reference::new(2, 0)),
            Some(&Object::from("Newer"))
        );

        let mut context = Context::new();
        let mut parser = ObjectStreamParser::new(Reference::new(5, 0), stream)
            .with_members(BTreeSet::from([2]));
        let references = parser.parse_into_context(&mut context).unwrap();
        assert_eq!(references, vec![Reference::new(2, 0)]);
        assert_eq!(context.get(Reference::new(2, 0)), Some(&Object::from(20)));
        assert!(!context.contains(Reference::new(1, 0)));
    }

    #[test]
    fn object_stream_invalid_member() {
        let stream = object_stream(2, "1 0 2 4 ", "(ab ]>>");
        let mut context = Context::new();
        ObjectStreamParser::new(Reference::new(5, 0), stream.clone())
            .parse_into_context(&mut context)
            .unwrap();
        assert_eq!(
            context.get(Reference::new(1, 0)),
            Some(&Object::from(Invalid::new(b"(ab".to_vec())))
        );
        assert_eq!(
            context.get(Reference::new(2, 0)),
            Some(&Object::from(Invalid::new(b"]>>".to_vec())))
        );

        let mut context = Context::new();
        let result = ObjectStreamParser::new(Reference::new(5, 0), stream)
            .with_capture_invalid(false)
            .parse_into_context(&mut context);
        assert!(matches!(result, Err(PdfError::Parse { offset: 8, .. })));
    }

    #[test]
    fn object_stream_malformed_header() {
        let stream = object_stream(2, "1 0 ", "10 20");
        let result =
            ObjectStreamParser::new(Reference::new(5, 0), stream).parse_into_context(&mut Context::new());
        assert!(matches!(result, Err(PdfError::Structure(_))));
    }
}
