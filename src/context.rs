use ::std::collections::BTreeMap;
use ::std::sync::Arc;

use crate::header::Version;
use crate::object::error::ObjectResult;
use crate::object::Array;
use crate::object::CipherTransformFactory;
use crate::object::Dictionary;
use crate::object::Name;
use crate::object::Object;
use crate::object::ObjectErr;
use crate::object::ObjectKind;
use crate::object::Reference;
use crate::object::Stream;
use crate::ObjectNumber;

/// Trailer entries the writer emits again
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TrailerInfo {
    pub root: Option<Reference>,
    pub encrypt: Option<Reference>,
    pub info: Option<Reference>,
    pub id: Option<Object>,
}

/// The arena of indirect objects of one document.
///
/// Objects are owned by the context and addressed by [`Reference`]. They are
/// replaced through [`Context::assign`].
#[derive(Debug, Default)]
pub struct Context {
    objects: BTreeMap<Reference, Object>,
    largest_object_number: ObjectNumber,
    pub trailer_info: TrailerInfo,
    pub(crate) version: Version,
    /// Set for encrypted documents. Strings are held decrypted and encrypted
    /// again on write.
    cipher: Option<Arc<dyn CipherTransformFactory>>,
    null: Object,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn version(&self) -> Version {
        self.version
    }

    /// The largest object number assigned so far, never decreasing
    pub fn largest_object_number(&self) -> ObjectNumber {
        self.largest_object_number
    }

    pub fn cipher(&self) -> Option<&Arc<dyn CipherTransformFactory>> {
        self.cipher.as_ref()
    }

    pub fn set_cipher(&mut self, cipher: Option<Arc<dyn CipherTransformFactory>>) {
        self.cipher = cipher;
    }

    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    /// Allocates a fresh reference with generation 0
    pub fn next_reference(&mut self) -> Reference {
        self.largest_object_number += 1;
        Reference::new(self.largest_object_number, 0)
    }

    /// Stores `object` under a fresh reference
    pub fn register(&mut self, object: impl Into<Object>) -> Reference {
        let reference = self.next_reference();
        self.objects.insert(reference, object.into());
        reference
    }

    /// Stores `object` under `reference`, replacing any previous object
    pub fn assign(&mut self, reference: Reference, object: impl Into<Object>) {
        self.largest_object_number = self.largest_object_number.max(reference.object_number);
        self.objects.insert(reference, object.into());
    }

    pub fn get(&self, reference: Reference) -> Option<&Object> {
        self.objects.get(&reference)
    }

    pub fn get_mut(&mut self, reference: Reference) -> Option<&mut Object> {
        self.objects.get_mut(&reference)
    }

    pub fn contains(&self, reference: Reference) -> bool {
        self.objects.contains_key(&reference)
    }

    /// Takes a container out of the arena once its contents are expanded.
    /// The object number is not reused.
    pub(crate) fn remove(&mut self, reference: Reference) -> Option<Object> {
        self.objects.remove(&reference)
    }

    /// The shared null object dangling references resolve to
    pub(crate) fn null(&self) -> &Object {
        &self.null
    }

    /// Follows at most one reference and checks the result against `kinds`.
    /// A dangling reference resolves to null. An empty `kinds` accepts any
    /// object.
    pub fn lookup<'a>(&'a self, value: &'a Object, kinds: &[ObjectKind]) -> ObjectResult<&'a Object> {
        self.resolve(value).expect(kinds)
    }

    /// Like [`Context::lookup`], yielding `None` instead of failing when the
    /// reference dangles or the object is of another kind
    pub fn lookup_maybe<'a>(&'a self, value: &'a Object, kinds: &[ObjectKind]) -> Option<&'a Object> {
        let object = match value {
            Object::Reference(reference) => self.get(*reference)?,
            value => value,
        };
        (kinds.is_empty() || kinds.contains(&object.kind())).then_some(object)
    }

    /// Follows at most one reference
    pub fn resolve<'a>(&'a self, value: &'a Object) -> &'a Object {
        match value {
            Object::Reference(reference) => self.get(*reference).unwrap_or(&self.null),
            value => value,
        }
    }

    pub fn lookup_dictionary<'a>(&'a self, value: &'a Object) -> ObjectResult<&'a Dictionary> {
        self.lookup(value, &[ObjectKind::Dictionary])?.try_into()
    }

    pub fn lookup_array<'a>(&'a self, value: &'a Object) -> ObjectResult<&'a Array> {
        self.lookup(value, &[ObjectKind::Array])?.try_into()
    }

    pub fn lookup_name<'a>(&'a self, value: &'a Object) -> ObjectResult<&'a Name> {
        self.lookup(value, &[ObjectKind::Name])?.try_into()
    }

    pub fn lookup_stream<'a>(&'a self, value: &'a Object) -> ObjectResult<&'a Stream> {
        self.lookup(value, &[ObjectKind::Stream])?.try_into()
    }

    pub fn lookup_number(&self, value: &Object) -> ObjectResult<f64> {
        let number = self.lookup(value, &[ObjectKind::Number])?;
        Ok(number.as_f64().unwrap_or_default())
    }

    /// The dictionary stored under `reference`, including a stream's
    pub fn dictionary(&self, reference: Reference) -> ObjectResult<&Dictionary> {
        let object = self.get(reference).unwrap_or(&self.null);
        object
            .as_dictionary()
            .ok_or_else(|| ObjectErr::UnexpectedType {
                expected: vec![ObjectKind::Dictionary, ObjectKind::Stream],
                found: object.kind(),
            })
    }

    pub fn dictionary_mut(&mut self, reference: Reference) -> ObjectResult<&mut Dictionary> {
        let found = self
            .get(reference)
            .map(Object::kind)
            .unwrap_or(ObjectKind::Null);
        self.objects
            .get_mut(&reference)
            .and_then(Object::as_dictionary_mut)
            .ok_or(ObjectErr::UnexpectedType {
                expected: vec![ObjectKind::Dictionary, ObjectKind::Stream],
                found,
            })
    }

    /// Every indirect object in ascending reference order
    pub fn enumerate_indirect_objects(&self) -> impl Iterator<Item = (Reference, &Object)> {
        self.objects.iter().map(|(reference, object)| (*reference, object))
    }

    /// The document catalog named by the trailer
    pub fn catalog(&self) -> ObjectResult<&Dictionary> {
        match self.trailer_info.root {
            Some(root) => self.dictionary(root),
            None => Err(ObjectErr::MissingEntry("Root")),
        }
    }
}
