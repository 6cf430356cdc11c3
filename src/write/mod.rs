//! Serializes a [`Context`] back into PDF bytes.
//!
//! Writing runs in two passes over the same code: a layout pass that sizes
//! every indirect object to compute its offset, and a serialization pass that
//! copies the bytes and checks each size against the layout.

pub mod error;
mod object_stream;
mod plain;
pub(crate) mod serialize;
mod stream;
mod xref;

pub use self::stream::Chunk;
pub use self::stream::CompressionPlan;

use ::log::debug;
use ::log::trace;
use ::std::borrow::Cow;
use ::std::collections::BTreeMap;
use ::std::fmt::Debug;
use ::std::fmt::Formatter;
use ::std::fmt::Result as FmtResult;
use ::std::mem;

use self::error::WriteErr;
use self::plain::Plain;
use self::serialize::Serializer;
use self::stream::ObjectStreams;
use self::xref::Location;
use crate::context::Context;
use crate::error::PdfError;
use crate::error::PdfResult;
use crate::header::Version;
use crate::object::Object;
use crate::object::Reference;
use crate::parse::Progress;
use crate::Byte;
use crate::ObjectNumber;
use crate::Offset;

/// REFERENCE: [7.5.2 File header, p54] A comment of four bytes above 127
/// marks the file as binary.
const BINARY_MARKER: &[Byte] = b"%\x81\x81\x81\x81\n\n";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteOptions {
    /// Pack eligible objects into object streams and end with a
    /// cross-reference stream instead of a table
    pub use_object_streams: bool,
    pub objects_per_stream: usize,
    /// Deflate the streams built in memory. Streams read from a file are
    /// always written as read.
    pub encode_streams: bool,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            use_object_streams: false,
            objects_per_stream: 50,
            encode_streams: true,
        }
    }
}

/// The layout of a written file: which objects go where, and what follows
/// the last one
pub(crate) trait Strategy: Debug {
    fn plan(&self, context: &Context) -> PdfResult<CompressionPlan>;

    /// The cross-reference data and the end of the file. `locations` is
    /// sorted by object number and `offset` is where the returned bytes start.
    fn finish(
        &self,
        serializer: &Serializer,
        context: &Context,
        plan: &CompressionPlan,
        locations: Vec<(ObjectNumber, Location)>,
        offset: Offset,
    ) -> PdfResult<Vec<Byte>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Plan,
    Chunks,
    Layout,
    Finish,
    Serialize,
    Complete,
}

/// Writes one context.
///
/// Like [`DocumentParser`](crate::parse::DocumentParser), the writer can
/// suspend: the predicate installed with [`PdfWriter::with_yield`] is
/// checked after each object-stream chunk and after each object of the
/// layout pass.
pub struct PdfWriter<'context> {
    context: &'context Context,
    serializer: Serializer,
    strategy: Box<dyn Strategy>,
    should_yield: Option<Box<dyn FnMut() -> bool + 'context>>,
    stage: Stage,
    plan: CompressionPlan,
    next_chunk: usize,
    /// Objects in file order, borrowed from the context or built for it
    objects: Vec<(Reference, Cow<'context, Object>)>,
    sizes: Vec<usize>,
    locations: BTreeMap<ObjectNumber, Location>,
    header: Vec<Byte>,
    offset: Offset,
    tail: Vec<Byte>,
    output: Vec<Byte>,
}

impl Debug for PdfWriter<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct(stringify!(PdfWriter))
            .field("strategy", &self.strategy)
            .field("stage", &self.stage)
            .field("objects", &self.objects.len())
            .field("offset", &self.offset)
            .finish()
    }
}

impl<'context> PdfWriter<'context> {
    pub fn new(context: &'context Context, options: WriteOptions) -> Self {
        let strategy: Box<dyn Strategy> = if options.use_object_streams {
            Box::new(ObjectStreams {
                objects_per_stream: options.objects_per_stream,
            })
        } else {
            Box::new(Plain)
        };
        let header = header(context.version());
        Self {
            context,
            serializer: Serializer::new(options.encode_streams)
                .with_cipher(context.cipher().cloned(), context.trailer_info.encrypt),
            strategy,
            should_yield: None,
            stage: Stage::Plan,
            plan: CompressionPlan::default(),
            next_chunk: 0,
            objects: Vec::new(),
            sizes: Vec::new(),
            locations: BTreeMap::new(),
            offset: header.len(),
            header,
            tail: Vec::new(),
            output: Vec::new(),
        }
    }

    pub fn with_yield(mut self, should_yield: impl FnMut() -> bool + 'context) -> Self {
        self.should_yield = Some(Box::new(should_yield));
        self
    }

    /// Runs until the yield predicate asks to suspend or the output is
    /// complete
    pub fn resume(&mut self) -> PdfResult<Progress> {
        loop {
            match self.stage {
                Stage::Plan => {
                    self.plan = self.strategy.plan(self.context)?;
                    let context = self.context;
                    self.objects = self
                        .plan
                        .direct
                        .iter()
                        .map(|&reference| {
                            let object = context.get(reference).unwrap_or(context.null());
                            (reference, Cow::Borrowed(object))
                        })
                        .collect();
                    self.stage = Stage::Chunks;
                }
                Stage::Chunks => {
                    while let Some(chunk) = self.plan.chunks.get(self.next_chunk) {
                        let stream = object_stream::build(&self.serializer, chunk, self.context)?;
                        for (index, member) in chunk.members.iter().enumerate() {
                            self.locations.insert(
                                member.object_number,
                                Location::Compressed {
                                    stream: chunk.reference.object_number,
                                    index,
                                },
                            );
                        }
                        trace!(
                            "Object stream {} holds {} objects",
                            chunk.reference,
                            chunk.members.len()
                        );
                        self.objects
                            .push((chunk.reference, Cow::Owned(stream.into())));
                        self.next_chunk += 1;
                        if self.yield_now() {
                            return Ok(Progress::Yielded);
                        }
                    }
                    self.stage = Stage::Layout;
                }
                Stage::Layout => {
                    while let Some((reference, object)) = self.objects.get(self.sizes.len()) {
                        let reference = *reference;
                        let size = self
                            .serializer
                            .indirect_size(reference, object)
                            .map_err(|err| PdfError::write(Some(reference), err))?;
                        self.locations.insert(
                            reference.object_number,
                            Location::Offset {
                                offset: self.offset,
                                generation: reference.generation_number,
                            },
                        );
                        self.sizes.push(size);
                        self.offset += size;
                        if self.yield_now() {
                            return Ok(Progress::Yielded);
                        }
                    }
                    self.stage = Stage::Finish;
                }
                Stage::Finish => {
                    let locations = mem::take(&mut self.locations).into_iter().collect();
                    self.tail = self.strategy.finish(
                        &self.serializer,
                        self.context,
                        &self.plan,
                        locations,
                        self.offset,
                    )?;
                    self.stage = Stage::Serialize;
                }
                Stage::Serialize => {
                    self.serialize()?;
                    self.stage = Stage::Complete;
                }
                Stage::Complete => return Ok(Progress::Complete),
            }
        }
    }

    /// Drives the write to completion, ignoring the yield predicate
    pub fn write(mut self) -> PdfResult<Vec<Byte>> {
        while self.resume()? == Progress::Yielded {}
        Ok(self.output)
    }

    fn yield_now(&mut self) -> bool {
        self.should_yield
            .as_mut()
            .is_some_and(|should_yield| should_yield())
    }

    fn serialize(&mut self) -> PdfResult<()> {
        let mut output = Vec::with_capacity(self.offset + self.tail.len());
        output.extend_from_slice(&self.header);
        for ((reference, object), &expected) in self.objects.iter().zip(&self.sizes) {
            let start = output.len();
            self.serializer
                .indirect(&mut output, *reference, object)
                .map_err(|err| PdfError::write(Some(*reference), err))?;
            let actual = output.len() - start;
            if actual != expected {
                return Err(PdfError::write(
                    Some(*reference),
                    WriteErr::SizeMismatch { expected, actual },
                ));
            }
        }
        if output.len() != self.offset {
            return Err(PdfError::write(
                None,
                WriteErr::SizeMismatch {
                    expected: self.offset,
                    actual: output.len(),
                },
            ));
        }
        output.append(&mut self.tail);
        debug!(
            "Wrote {} objects in {} bytes",
            self.objects.len(),
            output.len()
        );
        self.output = output;
        Ok(())
    }
}

/// `%PDF-x.y` and the binary marker. Object streams need 1.5, so older
/// versions are raised to 1.7.
fn header(version: Version) -> Vec<Byte> {
    let mut header = version.max(Version::V1_7).to_string().into_bytes();
    header.push(b'\n');
    header.extend_from_slice(BINARY_MARKER);
    header
}

#[cfg(test)]
mod tests {
    use ::std::sync::Arc;

    use super::*;
    use crate::object::Array;
    use crate::object::CipherTransform;
    use crate::object::CipherTransformFactory;
    use crate::object::Dictionary;
    use crate::object::PdfString;
    use crate::object::Stream;
    use crate::parse::DocumentParser;
    use crate::parse::ParseOptions;

    fn sample_context() -> Context {
        let mut context = Context::new();
        let pages = context.next_reference();
        let page = context.register(Dictionary::from_iter([
            ("Type", Object::from("Page")),
            ("Parent", pages.into()),
        ]));
        context.assign(
            pages,
            Dictionary::from_iter([
                ("Type", Object::from("Pages")),
                ("Kids", Array::from_iter([page]).into()),
                ("Count", 1.into()),
            ]),
        );
        let contents = context.register(Stream::flate(
            Dictionary::new(),
            b"BT /F1 12 Tf (Hi) Tj ET".to_vec(),
            true,
        ));
        let catalog = context.register(Dictionary::from_iter([
            ("Type", Object::from("Catalog")),
            ("Pages", pages.into()),
        ]));
        context
            .dictionary_mut(page)
            .unwrap()
            .set("Contents", contents);
        context.trailer_info.root = Some(catalog);
        context
    }

    fn read(bytes: &[Byte]) -> Context {
        let options = ParseOptions {
            capture_invalid: false,
            ..Default::default()
        };
        DocumentParser::new(bytes, options).parse().unwrap()
    }

    fn assert_same_objects(lhs: &Context, rhs: &Context) {
        let lhs = lhs.enumerate_indirect_objects().collect::<Vec<_>>();
        let rhs = rhs.enumerate_indirect_objects().collect::<Vec<_>>();
        assert_eq!(lhs.len(), rhs.len());
        for ((lhs_reference, lhs_object), (rhs_reference, rhs_object)) in lhs.iter().zip(&rhs) {
            assert_eq!(lhs_reference, rhs_reference);
            match (lhs_object, rhs_object) {
                (Object::Stream(lhs), Object::Stream(rhs)) => {
                    assert_eq!(
                        lhs.decode(&Context::new()).unwrap(),
                        rhs.decode(&Context::new()).unwrap()
                    );
                }
                (lhs, rhs) => assert_eq!(lhs, rhs),
            }
        }
    }

    #[test]
    fn writer_plain_round_trip() {
        let context = sample_context();
        let bytes = PdfWriter::new(&context, WriteOptions::default())
            .write()
            .unwrap();
        assert!(bytes.starts_with(b"%PDF-1.7\n%\x81\x81\x81\x81\n\n1 0 obj\n"));
        assert!(bytes.ends_with(b"%%EOF\n"));

        let read = read(&bytes);
        assert_eq!(read.trailer_info.root, context.trailer_info.root);
        assert_same_objects(&context, &read);
    }

    #[test]
    fn writer_object_streams_round_trip() {
        let context = sample_context();
        let options = WriteOptions {
            use_object_streams: true,
            objects_per_stream: 2,
            ..Default::default()
        };
        let bytes = PdfWriter::new(&context, options).write().unwrap();
        let read = read(&bytes);
        assert_eq!(read.trailer_info.root, context.trailer_info.root);
        // Object streams are expanded and dropped on read
        assert_same_objects(&context, &read);
    }

    #[test]
    fn writer_offsets() {
        let context = sample_context();
        let bytes = PdfWriter::new(&context, WriteOptions::default())
            .write()
            .unwrap();
        for (reference, _) in context.enumerate_indirect_objects() {
            let header = format!("{} {} obj\n", reference.object_number, reference.generation_number);
            let offset = bytes
                .windows(header.len())
                .position(|window| window == header.as_bytes())
                .unwrap();
            let record = format!("{:010} {:05} n\r\n", offset, reference.generation_number);
            assert!(bytes
                .windows(record.len())
                .any(|window| window == record.as_bytes()));
        }
    }

    #[test]
    fn writer_yield_resume() {
        let context = sample_context();
        let options = WriteOptions {
            use_object_streams: true,
            objects_per_stream: 1,
            ..Default::default()
        };
        let expected = PdfWriter::new(&context, options).write().unwrap();

        let mut writer = PdfWriter::new(&context, options).with_yield(|| true);
        let mut yields = 0;
        while writer.resume().unwrap() == Progress::Yielded {
            yields += 1;
        }
        // Three chunks, then the stream object and three object streams laid out
        assert_eq!(yields, 3 + 4);
        assert_eq!(writer.output, expected);
        assert_eq!(writer.resume(), Ok(Progress::Complete));
    }

    #[derive(Debug)]
    struct Xor(Byte);

    impl CipherTransform for Xor {
        fn decrypt(&self, bytes: &[Byte]) -> Vec<Byte> {
            bytes.iter().map(|byte| byte ^ self.0).collect()
        }

        fn encrypt(&self, bytes: &[Byte]) -> Vec<Byte> {
            self.decrypt(bytes)
        }
    }

    /// A different key for every object, as real handlers derive
    #[derive(Debug)]
    struct XorByNumber;

    impl CipherTransformFactory for XorByNumber {
        fn for_object(&self, reference: Reference) -> Arc<dyn CipherTransform> {
            Arc::new(Xor(reference.object_number as Byte))
        }
    }

    #[test]
    fn writer_encrypted_round_trip() {
        let mut context = sample_context();
        let encrypt = context.register(Dictionary::from_iter([
            ("Filter", Object::from("Standard")),
            ("O", PdfString::new(b"owner".to_vec()).into()),
        ]));
        let info = context.register(Dictionary::from_iter([(
            "Title",
            PdfString::new(b"Secret".to_vec()),
        )]));
        context.trailer_info.encrypt = Some(encrypt);
        context.trailer_info.info = Some(info);
        context.set_cipher(Some(Arc::new(XorByNumber)));

        let read_encrypted = |bytes: &[Byte]| {
            let options = ParseOptions {
                capture_invalid: false,
                cipher: Some(Arc::new(XorByNumber)),
            };
            DocumentParser::new(bytes, options).parse().unwrap()
        };
        for use_object_streams in [false, true] {
            let options = WriteOptions {
                use_object_streams,
                objects_per_stream: 2,
                ..Default::default()
            };
            let bytes = PdfWriter::new(&context, options).write().unwrap();
            let contains =
                |needle: &[Byte]| bytes.windows(needle.len()).any(|window| window == needle);
            assert!(!contains(b"(Secret)"));
            assert!(contains(b"(owner)"));

            let read = read_encrypted(&bytes);
            assert_eq!(read.trailer_info.encrypt, Some(encrypt));
            assert_same_objects(&context, &read);

            // Streams read from the file are written back still encrypted
            let again = PdfWriter::new(&read, options).write().unwrap();
            assert_same_objects(&context, &read_encrypted(&again));
        }
    }

    #[test]
    fn writer_header_version() {
        assert_eq!(header(Version::V1_4), b"%PDF-1.7\n%\x81\x81\x81\x81\n\n");
        assert_eq!(header(Version::V2_0), b"%PDF-2.0\n%\x81\x81\x81\x81\n\n");
    }
}
