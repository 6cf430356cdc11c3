pub mod array;
pub mod dictionary;
pub mod error;
pub mod name;
pub mod number;
pub mod reference;
pub mod stream;
pub mod string;

use ::std::fmt::Display;
use ::std::fmt::Formatter;
use ::std::fmt::Result as FmtResult;

pub use self::array::Array;
pub use self::array::Rectangle;
pub use self::dictionary::Dictionary;
pub use self::error::ObjectErr;
pub use self::error::ObjectResult;
pub use self::name::Name;
pub use self::number::Number;
pub use self::reference::Reference;
pub use self::stream::CipherTransform;
pub use self::stream::CipherTransformFactory;
pub use self::stream::Stream;
pub use self::stream::StreamContents;
pub use self::string::HexString;
pub use self::string::PdfString;
use crate::fmt::debug_bytes;
use crate::impl_object_variant;
use crate::Byte;

/// REFERENCE: [7.3 Objects, p24]
/// The closed set of values an indirect object or a container entry can hold.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Object {
    #[default]
    Null,
    Boolean(bool),
    Number(Number),
    String(PdfString),
    HexString(HexString),
    Name(Name),
    Array(Array),
    Dictionary(Dictionary),
    Stream(Stream),
    Reference(Reference),
    Invalid(Invalid),
}

/// The variants of [`Object`], used to describe expected types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    Null,
    Boolean,
    Number,
    String,
    HexString,
    Name,
    Array,
    Dictionary,
    Stream,
    Reference,
    Invalid,
}

impl Display for ObjectKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let kind = match self {
            Self::Null => stringify!(Null),
            Self::Boolean => stringify!(Boolean),
            Self::Number => stringify!(Number),
            Self::String => stringify!(String),
            Self::HexString => stringify!(HexString),
            Self::Name => stringify!(Name),
            Self::Array => stringify!(Array),
            Self::Dictionary => stringify!(Dictionary),
            Self::Stream => stringify!(Stream),
            Self::Reference => stringify!(Reference),
            Self::Invalid => stringify!(Invalid),
        };
        write!(f, "{}", kind)
    }
}

/// Placeholder for an indirect object whose body could not be parsed. It
/// keeps the original bytes so they can be written back unchanged.
#[derive(Clone, PartialEq, Default)]
pub struct Invalid(pub(crate) Vec<Byte>);

impl ::std::fmt::Debug for Invalid {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "Invalid({})", debug_bytes(&self.0))
    }
}

impl Invalid {
    pub fn new(bytes: impl Into<Vec<Byte>>) -> Self {
        Self(bytes.into())
    }

    pub fn as_bytes(&self) -> &[Byte] {
        &self.0
    }
}

impl Object {
    pub fn kind(&self) -> ObjectKind {
        match self {
            Self::Null => ObjectKind::Null,
            Self::Boolean(_) => ObjectKind::Boolean,
            Self::Number(_) => ObjectKind::Number,
            Self::String(_) => ObjectKind::String,
            Self::HexString(_) => ObjectKind::HexString,
            Self::Name(_) => ObjectKind::Name,
            Self::Array(_) => ObjectKind::Array,
            Self::Dictionary(_) => ObjectKind::Dictionary,
            Self::Stream(_) => ObjectKind::Stream,
            Self::Reference(_) => ObjectKind::Reference,
            Self::Invalid(_) => ObjectKind::Invalid,
        }
    }

    /// Checks the variant against a set of expected kinds. An empty set
    /// accepts any object.
    pub fn expect(&self, kinds: &[ObjectKind]) -> ObjectResult<&Self> {
        if kinds.is_empty() || kinds.contains(&self.kind()) {
            Ok(self)
        } else {
            Err(ObjectErr::UnexpectedType {
                expected: kinds.to_vec(),
                found: self.kind(),
            })
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        if let Self::Boolean(value) = self {
            Some(*value)
        } else {
            None
        }
    }

    pub fn as_number(&self) -> Option<Number> {
        if let Self::Number(value) = self {
            Some(*value)
        } else {
            None
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        self.as_number().map(|number| number.as_f64())
    }

    pub fn as_i64(&self) -> Option<i64> {
        self.as_number().and_then(|number| number.as_i64())
    }

    pub fn as_usize(&self) -> Option<usize> {
        self.as_i64().and_then(|value| usize::try_from(value).ok())
    }

    pub fn as_name(&self) -> Option<&Name> {
        if let Self::Name(value) = self {
            Some(value)
        } else {
            None
        }
    }

    /// The decoded bytes of either string form
    pub fn as_string_bytes(&self) -> Option<&[Byte]> {
        match self {
            Self::String(value) => Some(value.as_bytes()),
            Self::HexString(value) => Some(value.as_bytes()),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&Array> {
        if let Self::Array(value) = self {
            Some(value)
        } else {
            None
        }
    }

    pub fn as_array_mut(&mut self) -> Option<&mut Array> {
        if let Self::Array(value) = self {
            Some(value)
        } else {
            None
        }
    }

    /// The dictionary of a dictionary object or of a stream
    pub fn as_dictionary(&self) -> Option<&Dictionary> {
        match self {
            Self::Dictionary(value) => Some(value),
            Self::Stream(stream) => Some(stream.dictionary()),
            _ => None,
        }
    }

    pub fn as_dictionary_mut(&mut self) -> Option<&mut Dictionary> {
        match self {
            Self::Dictionary(value) => Some(value),
            Self::Stream(stream) => Some(stream.dictionary_mut()),
            _ => None,
        }
    }

    pub fn as_stream(&self) -> Option<&Stream> {
        if let Self::Stream(value) = self {
            Some(value)
        } else {
            None
        }
    }

    pub fn as_reference(&self) -> Option<Reference> {
        if let Self::Reference(value) = self {
            Some(*value)
        } else {
            None
        }
    }

    /// Decrypts every string inside the object, including those in the
    /// dictionary of a stream. Stream contents are left alone.
    pub(crate) fn decrypt_strings(&mut self, transform: &dyn CipherTransform) {
        match self {
            Self::String(value) => *value = PdfString::new(transform.decrypt(value.as_bytes())),
            Self::HexString(value) => *value = HexString::new(transform.decrypt(value.as_bytes())),
            Self::Array(array) => array
                .iter_mut()
                .for_each(|value| value.decrypt_strings(transform)),
            Self::Dictionary(dictionary) => dictionary
                .values_mut()
                .for_each(|value| value.decrypt_strings(transform)),
            Self::Stream(stream) => stream
                .dictionary_mut()
                .values_mut()
                .for_each(|value| value.decrypt_strings(transform)),
            _ => {}
        }
    }
}

mod convert {
    use super::*;

    impl_object_variant!(Number, Number);
    impl_object_variant!(PdfString, String);
    impl_object_variant!(HexString, HexString);
    impl_object_variant!(Name, Name);
    impl_object_variant!(Array, Array);
    impl_object_variant!(Dictionary, Dictionary);
    impl_object_variant!(Stream, Stream);
    impl_object_variant!(Reference, Reference);
    impl_object_variant!(Invalid, Invalid);

    impl From<bool> for Object {
        fn from(value: bool) -> Self {
            Self::Boolean(value)
        }
    }

    impl From<i64> for Object {
        fn from(value: i64) -> Self {
            Self::Number(Number::Integer(value))
        }
    }

    impl From<i32> for Object {
        fn from(value: i32) -> Self {
            Self::Number(Number::Integer(i64::from(value)))
        }
    }

    impl From<u32> for Object {
        fn from(value: u32) -> Self {
            Self::Number(Number::Integer(i64::from(value)))
        }
    }

    impl From<usize> for Object {
        fn from(value: usize) -> Self {
            Self::Number(Number::from(value))
        }
    }

    impl From<f64> for Object {
        fn from(value: f64) -> Self {
            Self::Number(Number::Real(value))
        }
    }

    impl From<&str> for Object {
        /// Interprets the text as a name
        fn from(value: &str) -> Self {
            Self::Name(Name::from(value))
        }
    }

    impl<T> From<Option<T>> for Object
    where
        T: Into<Object>,
    {
        fn from(value: Option<T>) -> Self {
            value.map(Into::into).unwrap_or(Self::Null)
        }
    }
}
