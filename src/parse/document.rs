use ::log::debug;
use ::log::trace;
use ::log::warn;
use ::once_cell::unsync::OnceCell;
use ::std::collections::BTreeMap;
use ::std::collections::BTreeSet;
use ::std::collections::HashMap;
use ::std::collections::HashSet;
use ::std::collections::VecDeque;
use ::std::fmt::Debug;
use ::std::fmt::Formatter;
use ::std::fmt::Result as FmtResult;
use ::std::sync::Arc;

use super::character_set::is_white_space;
use super::error::ParseErr;
use super::indirect;
use super::indirect::IndirectObject;
use super::object_stream::ObjectStreamParser;
use super::xref::startxref;
use super::xref::Entry;
use super::xref::XrefSection;
use super::xref_stream;
use super::Parser;
use super::Progress;
use super::KW_TRAILER;
use super::MARKER_PDF;
use crate::context::Context;
use crate::context::TrailerInfo;
use crate::error::PdfError;
use crate::error::PdfResult;
use crate::header::Version;
use crate::object::CipherTransformFactory;
use crate::object::Dictionary;
use crate::object::Invalid;
use crate::object::Object;
use crate::object::Reference;
use crate::Byte;
use crate::ObjectNumber;
use crate::Offset;

pub(crate) const KEY_ROOT: &str = "Root";
pub(crate) const KEY_ENCRYPT: &str = "Encrypt";
pub(crate) const KEY_INFO: &str = "Info";
pub(crate) const KEY_ID: &str = "ID";
pub(crate) const KEY_PREV: &str = "Prev";
pub(crate) const KEY_XREF_STM: &str = "XRefStm";
pub(crate) const TYPE_XREF: &str = "XRef";
pub(crate) const TYPE_OBJSTM: &str = "ObjStm";
pub(crate) const TYPE_CATALOG: &str = "Catalog";

/// REFERENCE: [7.5.2 File header, p54] The header is expected at the start,
/// but readers accept leading garbage within the first kilobyte.
const HEADER_WINDOW: usize = 1024;

#[derive(Clone)]
pub struct ParseOptions {
    /// Keep malformed indirect objects as [`Invalid`] placeholders instead of
    /// failing the whole parse
    pub capture_invalid: bool,
    /// Supplies the decryption of strings and streams in encrypted documents.
    /// It is kept in the context so that writing encrypts them again.
    pub cipher: Option<Arc<dyn CipherTransformFactory>>,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            capture_invalid: true,
            cipher: None,
        }
    }
}

impl Debug for ParseOptions {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct(stringify!(ParseOptions))
            .field("capture_invalid", &self.capture_invalid)
            .field("cipher", &self.cipher.is_some())
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Header,
    CrossReferences,
    Objects,
    ObjectStreams,
    Trailer,
    Complete,
}

/// Offsets of every `N G obj` header and `trailer` keyword in the file.
/// Built only when the cross-reference data cannot be trusted.
#[derive(Debug, Default)]
struct ScanIndex {
    /// The last header of each object, as incremental updates append newer
    /// revisions
    objects: HashMap<Reference, Offset>,
    offsets: Vec<Offset>,
    trailers: Vec<Offset>,
}

impl ScanIndex {
    fn new(buffer: &[Byte]) -> Self {
        let mut index = Self::default();
        for offset in 0..buffer.len() {
            let at_token_start = offset == 0 || is_white_space(buffer[offset - 1]);
            if !at_token_start {
                continue;
            }
            match buffer[offset] {
                b'0'..=b'9' => {
                    if let Ok((_, reference)) = indirect::header(&buffer[offset..]) {
                        index.objects.insert(reference, offset);
                        index.offsets.push(offset);
                    }
                }
                b't' if buffer[offset..].starts_with(KW_TRAILER.as_bytes()) => {
                    index.trailers.push(offset);
                }
                _ => {}
            }
        }
        debug!(
            "Scanned {} object headers and {} trailers",
            index.offsets.len(),
            index.trailers.len()
        );
        index
    }

    /// The start of the first object header after `offset`
    fn next_offset(&self, offset: Offset) -> Option<Offset> {
        let position = self.offsets.partition_point(|&scanned| scanned <= offset);
        self.offsets.get(position).copied()
    }
}

/// Reads a whole document into a [`Context`].
///
/// Parsing runs in stages and can suspend between indirect objects: when the
/// predicate installed with [`DocumentParser::with_yield`] returns true,
/// [`DocumentParser::resume`] returns [`Progress::Yielded`] and a later call
/// continues where it stopped.
pub struct DocumentParser<'buffer> {
    buffer: &'buffer [Byte],
    options: ParseOptions,
    should_yield: Option<Box<dyn FnMut() -> bool + 'buffer>>,
    stage: Stage,
    context: Context,
    /// The newest entry of each object number
    xref: BTreeMap<ObjectNumber, Entry>,
    /// Trailer keys from all sections, newer sections taking precedence
    trailer: Dictionary,
    /// Dictionaries of cross-reference streams, which are not kept as objects
    xref_dictionaries: Vec<Dictionary>,
    pending: VecDeque<(Reference, Offset)>,
    /// Object streams to expand, with the members the cross-reference data
    /// locates in each. `None` expands every object not otherwise present.
    object_streams: BTreeMap<ObjectNumber, Option<BTreeSet<ObjectNumber>>>,
    containers: HashMap<ObjectNumber, Reference>,
    scan: OnceCell<ScanIndex>,
    reconstructed: bool,
}

impl Debug for DocumentParser<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct(stringify!(DocumentParser))
            .field("len", &self.buffer.len())
            .field("stage", &self.stage)
            .field("pending", &self.pending.len())
            .field("reconstructed", &self.reconstructed)
            .finish()
    }
}

impl<'buffer> DocumentParser<'buffer> {
    pub fn new(buffer: &'buffer [Byte], options: ParseOptions) -> Self {
        let mut context = Context::new();
        context.set_cipher(options.cipher.clone());
        Self {
            buffer,
            options,
            should_yield: None,
            stage: Stage::Header,
            context,
            xref: BTreeMap::new(),
            trailer: Dictionary::new(),
            xref_dictionaries: Vec::new(),
            pending: VecDeque::new(),
            object_streams: BTreeMap::new(),
            containers: HashMap::new(),
            scan: OnceCell::new(),
            reconstructed: false,
        }
    }

    /// Installs the predicate checked after every indirect object and every
    /// object stream
    pub fn with_yield(mut self, should_yield: impl FnMut() -> bool + 'buffer) -> Self {
        self.should_yield = Some(Box::new(should_yield));
        self
    }

    /// Runs until the yield predicate asks to suspend or the document is
    /// read completely
    pub fn resume(&mut self) -> PdfResult<Progress> {
        loop {
            match self.stage {
                Stage::Header => {
                    self.read_header();
                    self.stage = Stage::CrossReferences;
                }
                Stage::CrossReferences => {
                    self.read_cross_references();
                    self.stage = Stage::Objects;
                }
                Stage::Objects => {
                    while let Some((reference, offset)) = self.pending.pop_front() {
                        self.read_object(reference, offset)?;
                        if self.yield_now() {
                            return Ok(Progress::Yielded);
                        }
                    }
                    self.stage = Stage::ObjectStreams;
                }
                Stage::ObjectStreams => {
                    while let Some((object_number, members)) = self.object_streams.pop_first() {
                        self.expand_object_stream(object_number, members)?;
                        if self.yield_now() {
                            return Ok(Progress::Yielded);
                        }
                    }
                    self.stage = Stage::Trailer;
                }
                Stage::Trailer => {
                    self.finish_trailer()?;
                    self.stage = Stage::Complete;
                }
                Stage::Complete => return Ok(Progress::Complete),
            }
        }
    }

    /// Drives the parse to completion, ignoring the yield predicate
    pub fn parse(mut self) -> PdfResult<Context> {
        while self.resume()? == Progress::Yielded {}
        Ok(self.context)
    }

    fn yield_now(&mut self) -> bool {
        self.should_yield
            .as_mut()
            .is_some_and(|should_yield| should_yield())
    }

    fn scan(&self) -> &ScanIndex {
        let buffer = self.buffer;
        self.scan.get_or_init(|| ScanIndex::new(buffer))
    }

    fn read_header(&mut self) {
        let window = &self.buffer[..self.buffer.len().min(HEADER_WINDOW)];
        let marker = MARKER_PDF.as_bytes();
        let version = window
            .windows(marker.len())
            .position(|candidate| candidate == marker)
            .and_then(|position| Version::parse(&window[position..]).ok())
            .map(|(_, version)| version);
        match version {
            Some(version) => self.context.version = version,
            None => warn!(
                "Missing or unknown header. Assuming {}",
                self.context.version
            ),
        }
    }

    fn read_cross_references(&mut self) {
        let start = startxref(self.buffer);
        let first_section = start.map(|offset| self.read_section(offset));
        match (start, first_section) {
            (Some(offset), Some(Ok(section))) => {
                self.apply_section(offset, section);
                self.follow_chain();
            }
            (_, Some(Err(err))) => {
                warn!("Unreadable cross-reference section: {}. Reconstructing", err);
                self.reconstruct();
            }
            _ => {
                warn!("Missing startxref. Reconstructing");
                self.reconstruct();
            }
        }
        self.schedule();
    }

    /// A classic section or a cross-reference stream at `offset`
    fn read_section(&self, offset: Offset) -> PdfResult<XrefSection> {
        let buffer = self.buffer;
        let buffer = buffer.get(offset..).unwrap_or_default();
        match XrefSection::parse(buffer) {
            Ok((_, section)) => return Ok(section),
            Err(err @ ParseErr::Failure(_)) => {
                return Err(PdfError::Parse {
                    offset: err.offset_in(self.buffer.len()),
                    err,
                });
            }
            Err(ParseErr::Recoverable(_)) => {}
        }

        let (_, IndirectObject { reference, object }) =
            IndirectObject::parse(buffer).map_err(|err| PdfError::Parse {
                offset: err.offset_in(self.buffer.len()),
                err,
            })?;
        match object {
            Object::Stream(stream) if stream.dictionary().has_type(TYPE_XREF) => {
                let entries = xref_stream::entries(reference, &stream, &self.context)?;
                trace!(
                    "Cross-reference stream {} at {} with {} entries",
                    reference,
                    offset,
                    entries.len()
                );
                Ok(XrefSection {
                    entries,
                    trailer: stream.dictionary().clone(),
                })
            }
            object => Err(PdfError::Structure(format!(
                "Expected a cross-reference section at offset {}. Found {} object {}",
                offset,
                object.kind(),
                reference
            ))),
        }
    }

    /// Walks `/Prev` links from the newest section. A broken link ends the
    /// walk, keeping the sections already read.
    fn follow_chain(&mut self) {
        let mut visited = HashSet::new();
        let mut next = self.trailer.get(KEY_PREV).and_then(Object::as_usize);
        if let Some(start) = startxref(self.buffer) {
            visited.insert(start);
        }
        while let Some(offset) = next.take() {
            if !visited.insert(offset) {
                warn!("Cross-reference chain loops back to offset {}", offset);
                break;
            }
            match self.read_section(offset) {
                Ok(section) => {
                    next = section.trailer.get(KEY_PREV).and_then(Object::as_usize);
                    self.apply_section(offset, section);
                }
                Err(err) => warn!("Ignoring cross-reference section at {}: {}", offset, err),
            }
        }
    }

    /// Merges one section, older than every section applied before it. For
    /// hybrid files, the entries of `/XRefStm` sit between the in-use and the
    /// free entries of the table.
    fn apply_section(&mut self, offset: Offset, section: XrefSection) {
        let XrefSection { entries, trailer } = section;
        trace!("Cross-reference section at {} with {} entries", offset, entries.len());
        let (free, in_use): (Vec<_>, Vec<_>) = entries
            .into_iter()
            .partition(|(_, entry)| matches!(entry, Entry::Free { .. }));
        self.insert_entries(in_use);

        if let Some(stream_offset) = trailer.get(KEY_XREF_STM).and_then(Object::as_usize) {
            match self.read_section(stream_offset) {
                Ok(stream_section) => {
                    self.insert_entries(stream_section.entries);
                    self.xref_dictionaries.push(stream_section.trailer);
                }
                Err(err) => warn!(
                    "Ignoring /{} section at {}: {}",
                    KEY_XREF_STM, stream_offset, err
                ),
            }
        }
        self.insert_entries(free);
        self.merge_trailer(trailer);
    }

    fn insert_entries(&mut self, entries: Vec<(ObjectNumber, Entry)>) {
        for (object_number, entry) in entries {
            self.xref.entry(object_number).or_insert(entry);
        }
    }

    /// Keys of older trailers only fill the gaps of newer ones
    fn merge_trailer(&mut self, trailer: Dictionary) {
        for (key, value) in trailer {
            if self.trailer.get_name(&key).is_none() {
                self.trailer.set(key, value);
            }
        }
    }

    /// Rebuilds the cross-reference data from a scan of the whole file
    fn reconstruct(&mut self) {
        self.reconstructed = true;
        self.xref.clear();
        let buffer = self.buffer;
        let scan = self.scan();
        let mut objects = scan
            .objects
            .iter()
            .map(|(&reference, &offset)| (offset, reference))
            .collect::<Vec<_>>();
        let trailers = scan
            .trailers
            .iter()
            .rev()
            .filter_map(|&offset| {
                let after = &buffer[offset + KW_TRAILER.len()..];
                Dictionary::parse(after).ok().map(|(_, trailer)| trailer)
            })
            .collect::<Vec<_>>();

        // The same object number may be scanned under several generations.
        // The last one in the file wins.
        objects.sort_unstable();
        for (offset, reference) in objects {
            self.xref.insert(
                reference.object_number,
                Entry::InUse {
                    offset,
                    generation: reference.generation_number,
                },
            );
        }
        for trailer in trailers {
            self.merge_trailer(trailer);
        }
    }

    /// Turns the merged cross-reference entries into parsing jobs
    fn schedule(&mut self) {
        for (&object_number, entry) in self.xref.iter() {
            match *entry {
                Entry::InUse { offset, generation } if object_number != 0 => {
                    self.pending
                        .push_back((Reference::new(object_number, generation), offset));
                }
                Entry::Compressed { stream, .. } => {
                    if let Some(members) = self
                        .object_streams
                        .entry(stream)
                        .or_insert_with(|| Some(BTreeSet::new()))
                    {
                        members.insert(object_number);
                    }
                }
                _ => {}
            }
        }
        // Reading in file order keeps the cursor moving forward
        self.pending.make_contiguous().sort_by_key(|&(_, offset)| offset);
        debug!(
            "{} objects at offsets, {} object streams",
            self.pending.len(),
            self.object_streams.len()
        );
    }

    fn read_object(&mut self, reference: Reference, offset: Offset) -> PdfResult<()> {
        let mut err = match self.parse_at(reference, offset) {
            Ok(object) => {
                self.store(reference, object);
                return Ok(());
            }
            Err(err) => err,
        };
        debug!("Object {} is not readable at offset {}", reference, offset);

        // Relocate through a scan of the file
        let scanned = self.scan().objects.get(&reference).copied();
        if let Some(scanned) = scanned.filter(|&scanned| scanned != offset) {
            match self.parse_at(reference, scanned) {
                Ok(object) => {
                    debug!("Object {} relocated to offset {}", reference, scanned);
                    self.store(reference, object);
                    return Ok(());
                }
                Err(relocated_err) => err = relocated_err.or(err),
            }
        }
        let offset = scanned.unwrap_or(offset);

        if !self.options.capture_invalid {
            return Err(match err {
                Some(err) => PdfError::Parse {
                    offset: err.offset_in(self.buffer.len()),
                    err,
                },
                None => PdfError::InvalidObject { reference, offset },
            });
        }

        let buffer = self.buffer;
        let end = self.scan().next_offset(offset).unwrap_or(buffer.len());
        let found = buffer
            .get(offset..end)
            .filter(|bytes| matches!(indirect::header(bytes), Ok((_, found)) if found == reference))
            .and_then(indirect::body);
        match found {
            Some(body) => {
                warn!("Object {} at offset {} is invalid", reference, offset);
                self.context.assign(reference, Invalid::new(body));
            }
            None => warn!("Object {} is missing from offset {}", reference, offset),
        }
        Ok(())
    }

    /// The object at `offset` if its header names `reference`. The error is
    /// `None` for a header mismatch.
    fn parse_at(&self, reference: Reference, offset: Offset) -> Result<Object, Option<ParseErr>> {
        let buffer = self.buffer;
        let buffer = buffer.get(offset..).ok_or(None)?;
        match IndirectObject::parse(buffer) {
            Ok((_, indirect)) if indirect.reference == reference => Ok(indirect.object),
            Ok(_) => Err(None),
            Err(err) => Err(Some(err)),
        }
    }

    /// Objects read from an encrypted file are decrypted with the transform
    /// of their own reference. The encryption dictionary and cross-reference
    /// streams are never encrypted.
    fn store(&mut self, reference: Reference, mut object: Object) {
        if let Object::Stream(stream) = &object {
            if stream.dictionary().has_type(TYPE_XREF) {
                trace!("Dropping cross-reference stream {}", reference);
                self.xref_dictionaries.push(stream.dictionary().clone());
                return;
            }
            if stream.dictionary().has_type(TYPE_OBJSTM) {
                self.containers.insert(reference.object_number, reference);
                if self.reconstructed {
                    self.object_streams
                        .entry(reference.object_number)
                        .or_insert(None);
                }
            }
        }
        let encrypt = self.trailer.get(KEY_ENCRYPT).and_then(Object::as_reference);
        if let Some(cipher) = &self.options.cipher {
            if encrypt != Some(reference) {
                let transform = cipher.for_object(reference);
                object.decrypt_strings(transform.as_ref());
                object = match object {
                    Object::Stream(stream) => stream.with_transform(transform).into(),
                    object => object,
                };
            }
        }
        self.context.assign(reference, object);
    }

    fn expand_object_stream(
        &mut self,
        object_number: ObjectNumber,
        members: Option<BTreeSet<ObjectNumber>>,
    ) -> PdfResult<()> {
        let container = self.containers.get(&object_number).copied();
        let (reference, stream) = match container
            .and_then(|reference| Some((reference, self.context.remove(reference)?)))
        {
            Some((reference, Object::Stream(stream))) => (reference, stream),
            Some((reference, object)) => {
                self.context.assign(reference, object);
                warn!("Object {} is not an object stream", reference);
                return Ok(());
            }
            None => {
                warn!("Object stream {} is missing", object_number);
                return Ok(());
            }
        };

        let mut parser = ObjectStreamParser::new(reference, stream.clone())
            .with_capture_invalid(self.options.capture_invalid);
        if let Some(members) = members {
            parser = parser.with_members(members);
        }
        match parser.parse_into_context(&mut self.context) {
            Ok(references) => {
                trace!(
                    "Expanded {} objects from object stream {}",
                    references.len(),
                    reference
                );
                Ok(())
            }
            Err(err) if self.options.capture_invalid => {
                warn!("Keeping object stream {} unexpanded: {}", reference, err);
                self.context.assign(reference, stream);
                Ok(())
            }
            Err(err) => Err(err),
        }
    }

    /// Resolves the catalog from the trailer, the cross-reference stream
    /// dictionaries or, failing both, an object of type Catalog
    fn finish_trailer(&mut self) -> PdfResult<()> {
        let dictionaries = || {
            ::std::iter::once(&self.trailer).chain(self.xref_dictionaries.iter())
        };
        let reference = |key: &str| {
            dictionaries().find_map(|dictionary| dictionary.get(key).and_then(Object::as_reference))
        };
        let root = reference(KEY_ROOT).or_else(|| {
            self.context
                .enumerate_indirect_objects()
                .find(|(_, object)| {
                    matches!(object, Object::Dictionary(dictionary) if dictionary.has_type(TYPE_CATALOG))
                })
                .map(|(reference, _)| reference)
        });
        let root = root.ok_or_else(|| {
            PdfError::Structure("No trailer /Root and no catalog object".to_string())
        })?;
        let trailer_info = TrailerInfo {
            root: Some(root),
            encrypt: reference(KEY_ENCRYPT),
            info: reference(KEY_INFO),
            id: dictionaries().find_map(|dictionary| dictionary.get(KEY_ID).cloned()),
        };
        self.context.trailer_info = trailer_info;
        Ok(())
    }
}
