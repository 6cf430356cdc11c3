use ::log::debug;

use super::error::WriteErr;
use super::serialize::Serializer;
use super::xref::trailer_entries;
use super::xref::Location;
use super::xref::StreamRows;
use super::Strategy;
use crate::context::Context;
use crate::error::PdfError;
use crate::error::PdfResult;
use crate::object::dictionary::KEY_TYPE;
use crate::object::Array;
use crate::object::Name;
use crate::object::Object;
use crate::object::Reference;
use crate::object::Stream;
use crate::parse::document::TYPE_XREF;
use crate::parse::xref_stream::KEY_INDEX;
use crate::parse::xref_stream::KEY_W;
use crate::parse::EOF;
use crate::parse::KW_STARTXREF;
use crate::Byte;
use crate::ObjectNumber;
use crate::Offset;

/// One object stream of the compressed layout
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub reference: Reference,
    pub members: Vec<Reference>,
}

/// How the objects of a context are spread over the written file: objects
/// written at their own offset and objects grouped into object streams.
///
/// REFERENCE: [7.5.7 Object streams, p64-65]
/// Stream objects, objects with a non-zero generation and the encryption
/// dictionary cannot be stored in an object stream. Invalid placeholders are
/// written back as they were read, so they stay outside as well.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CompressionPlan {
    pub direct: Vec<Reference>,
    pub chunks: Vec<Chunk>,
    /// The reference of the cross-reference stream, following the chunks
    pub xref: Option<Reference>,
}

impl CompressionPlan {
    /// Groups the eligible objects into chunks of at most `objects_per_stream`
    pub fn for_context(context: &Context, objects_per_stream: usize) -> PdfResult<Self> {
        let objects_per_stream = objects_per_stream.max(1);
        let encrypt = context.trailer_info.encrypt;
        let objects = live_objects(context);
        let mut direct = Vec::new();
        let mut eligible = Vec::new();
        for &(reference, object) in &objects {
            if is_eligible(reference, object, encrypt) {
                eligible.push(reference);
            } else {
                direct.push(reference);
            }
        }

        let mut next = objects
            .last()
            .map_or(0, |(reference, _)| reference.object_number)
            .max(context.largest_object_number());
        let mut allocate = || {
            next = next.checked_add(1).ok_or_else(|| {
                PdfError::write(None, WriteErr::ObjectNumberOverflow(u64::from(next) + 1))
            })?;
            Ok::<_, PdfError>(Reference::new(next, 0))
        };
        let mut chunks = Vec::with_capacity(eligible.len().div_ceil(objects_per_stream));
        for members in eligible.chunks(objects_per_stream) {
            chunks.push(Chunk {
                reference: allocate()?,
                members: members.to_vec(),
            });
        }
        let xref = Some(allocate()?);
        debug!(
            "Compression plan: {} direct objects, {} object streams",
            direct.len(),
            chunks.len()
        );
        Ok(Self {
            direct,
            chunks,
            xref,
        })
    }

    /// Every object written at its own offset
    pub(crate) fn uncompressed(context: &Context) -> Self {
        Self {
            direct: live_objects(context)
                .into_iter()
                .map(|(reference, _)| reference)
                .collect(),
            chunks: Vec::new(),
            xref: None,
        }
    }
}

/// Eligible objects packed into object streams, located by a
/// cross-reference stream.
///
/// REFERENCE: [7.5.8 Cross-reference streams, p65-70]
#[derive(Debug, Clone, Copy)]
pub(crate) struct ObjectStreams {
    pub(crate) objects_per_stream: usize,
}

impl Strategy for ObjectStreams {
    fn plan(&self, context: &Context) -> PdfResult<CompressionPlan> {
        CompressionPlan::for_context(context, self.objects_per_stream)
    }

    fn finish(
        &self,
        serializer: &Serializer,
        context: &Context,
        plan: &CompressionPlan,
        mut locations: Vec<(ObjectNumber, Location)>,
        offset: Offset,
    ) -> PdfResult<Vec<Byte>> {
        let reference = plan.xref.ok_or_else(|| {
            PdfError::Structure("No reference planned for the cross-reference stream".to_string())
        })?;
        locations.insert(0, (0, Location::FreeHead));
        // The plan numbers the cross-reference stream after every other object
        locations.push((
            reference.object_number,
            Location::Offset {
                offset,
                generation: reference.generation_number,
            },
        ));

        let StreamRows {
            widths,
            index,
            rows,
        } = StreamRows::new(&locations);
        let mut dictionary =
            trailer_entries(&context.trailer_info, u64::from(reference.object_number) + 1);
        dictionary.set(KEY_TYPE, Name::from(TYPE_XREF));
        dictionary.set(KEY_W, Array::from_iter(widths));
        dictionary.set(KEY_INDEX, index);
        let stream = Stream::flate(dictionary, rows, serializer.encode_streams);

        let mut tail = Vec::new();
        serializer
            .indirect(&mut tail, reference, &stream.into())
            .map_err(|err| PdfError::write(Some(reference), err))?;
        tail.extend_from_slice(format!("{}\n{}\n{}\n", KW_STARTXREF, offset, EOF).as_bytes());
        Ok(tail)
    }
}

fn is_eligible(reference: Reference, object: &Object, encrypt: Option<Reference>) -> bool {
    reference.generation_number == 0
        && Some(reference) != encrypt
        && !matches!(object, Object::Stream(_) | Object::Invalid(_))
}

/// The objects to write in object number order. A cross-reference entry
/// addresses one generation per object number, so the highest one wins.
pub(crate) fn live_objects(context: &Context) -> Vec<(Reference, &Object)> {
    let mut objects: Vec<(Reference, &Object)> = Vec::with_capacity(context.object_count());
    for (reference, object) in context.enumerate_indirect_objects() {
        if reference.object_number == ObjectNumber::default() {
            debug!("Skipping object {}, reserved for the free list", reference);
            continue;
        }
        match objects.last_mut() {
            Some(last) if last.0.object_number == reference.object_number => {
                debug!("Object {} supersedes {}", reference, last.0);
                *last = (reference, object);
            }
            _ => objects.push((reference, object)),
        }
    }
    objects
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::Dictionary;
    use crate::object::Invalid;
    use crate::parse::indirect::IndirectObject;
    use crate::parse::xref::Entry;
    use crate::parse::xref_stream::entries;
    use crate::parse::Parser;

    #[test]
    fn compression_plan_eligibility() {
        let mut context = Context::new();
        let catalog = context.register(Dictionary::from_iter([("Type", "Catalog")]));
        let stream = context.register(Stream::raw(Dictionary::new(), b"q Q".to_vec()));
        let invalid = context.register(Invalid::new(b"<< /A (".to_vec()));
        let encrypt = context.register(Dictionary::from_iter([("Filter", "Standard")]));
        context.trailer_info.encrypt = Some(encrypt);
        context.assign(Reference::new(9, 2), 9);
        let number = context.register(42);

        let plan = CompressionPlan::for_context(&context, 50).unwrap();
        assert_eq!(
            plan.direct,
            vec![stream, invalid, encrypt, Reference::new(9, 2)]
        );
        assert_eq!(
            plan.chunks,
            vec![Chunk {
                reference: Reference::new(11, 0),
                members: vec![catalog, number],
            }]
        );
        assert_eq!(plan.xref, Some(Reference::new(12, 0)));
    }

    #[test]
    fn compression_plan_chunks() {
        let mut context = Context::new();
        for value in 0..5 {
            context.register(value);
        }
        let plan = CompressionPlan::for_context(&context, 2).unwrap();
        let sizes = plan
            .chunks
            .iter()
            .map(|chunk| chunk.members.len())
            .collect::<Vec<_>>();
        assert_eq!(sizes, vec![2, 2, 1]);
        assert_eq!(plan.chunks[2].reference, Reference::new(8, 0));
        assert!(plan.direct.is_empty());

        let plan = CompressionPlan::for_context(&Context::new(), 50).unwrap();
        assert!(plan.chunks.is_empty());
        assert_eq!(plan.xref, Some(Reference::new(1, 0)));
    }

    #[test]
    fn live_objects_highest_generation() {
        let mut context = Context::new();
        context.assign(Reference::new(3, 0), "Old");
        context.assign(Reference::new(3, 1), "New");
        context.assign(Reference::new(0, 0), "Free");
        let objects = live_objects(&context);
        assert_eq!(objects, vec![(Reference::new(3, 1), &Object::from("New"))]);
        assert_eq!(
            CompressionPlan::uncompressed(&context).direct,
            vec![Reference::new(3, 1)]
        );
    }

    #[test]
    fn object_streams_finish() {
        let mut context = Context::new();
        context.trailer_info.root = Some(Reference::new(1, 0));
        let plan = CompressionPlan {
            direct: Vec::new(),
            chunks: Vec::new(),
            xref: Some(Reference::new(3, 0)),
        };
        let locations = vec![
            (1, Location::Compressed { stream: 2, index: 0 }),
            (
                2,
                Location::Offset {
                    offset: 15,
                    generation: 0,
                },
            ),
        ];
        let tail = ObjectStreams {
            objects_per_stream: 50,
        }
        .finish(&Serializer::new(true), &context, &plan, locations, 120)
        .unwrap();
        assert!(tail.starts_with(b"3 0 obj\n"));
        assert!(tail.ends_with(b"endobj\n\nstartxref\n120\n%%EOF\n"));

        // The rows decode to the locations written
        let (_, indirect) = IndirectObject::parse(&tail).unwrap();
        assert_eq!(indirect.reference, Reference::new(3, 0));
        let stream = indirect.object.as_stream().unwrap();
        assert_eq!(stream.dictionary().get("Size"), Some(&Object::from(4)));
        assert_eq!(
            stream.dictionary().get(KEY_TYPE),
            Some(&Object::from(TYPE_XREF))
        );
        let entries = entries(Reference::new(3, 0), stream, &context).unwrap();
        assert_eq!(
            entries,
            vec![
                (
                    0,
                    Entry::Free {
                        next: 0,
                        generation: 65535
                    }
                ),
                (1, Entry::Compressed { stream: 2, index: 0 }),
                (
                    2,
                    Entry::InUse {
                        offset: 15,
                        generation: 0
                    }
                ),
                (
                    3,
                    Entry::InUse {
                        offset: 120,
                        generation: 0
                    }
                ),
            ]
        );
    }
}
