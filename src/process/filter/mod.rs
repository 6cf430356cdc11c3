pub(crate) mod ascii_85;
pub(crate) mod ascii_hex;
pub(crate) mod error;
pub(crate) mod flate;
pub(crate) mod lzw;
pub(crate) mod predictor;
pub(crate) mod run_length;

use ::log::warn;

use self::ascii_85::A85;
use self::ascii_hex::AHx;
use self::error::FilterErr;
use self::error::FilterErrorCode;
use self::error::FilterResult;
use self::flate::Fl;
use self::lzw::Lzw;
use self::run_length::RL;
use crate::context::Context;
use crate::object::dictionary::KEY_DECODEPARMS;
use crate::object::dictionary::KEY_FILTER;
use crate::object::Dictionary;
use crate::object::Name;
use crate::object::Object;
use crate::object::ObjectKind;
use crate::Byte;

/// A reversible byte transformation. `filter` encodes, `defilter` decodes.
pub trait Filter {
    fn filter(&self, bytes: impl Into<Vec<Byte>> + AsRef<[Byte]>) -> FilterResult<Vec<Byte>>;

    fn defilter(&self, bytes: impl Into<Vec<Byte>> + AsRef<[Byte]>) -> FilterResult<Vec<Byte>>;
}

/// The filters named by a stream dictionary, in decoding order.
#[derive(Debug, PartialEq, Clone, Default)]
pub struct FilteringChain(Vec<Filtering>);

impl Filter for FilteringChain {
    fn filter(&self, bytes: impl Into<Vec<Byte>> + AsRef<[Byte]>) -> FilterResult<Vec<Byte>> {
        // The filters in the stream dictionary are in the order they need to
        // be applied to defilter the data. Filter the data by applying the
        // filters in the reverse order.
        let mut filtered: Vec<_>;
        if let [rest @ .., last] = self.0.as_slice() {
            filtered = last.filter(bytes)?;
            for filtering in rest.iter().rev() {
                filtered = filtering.filter(filtered)?;
            }
        } else {
            filtered = bytes.into();
        }
        Ok(filtered)
    }

    /// REFERENCE: [7.3.8.2 Stream extent, p31-33] and [7.4 Filters, p34]
    fn defilter(&self, bytes: impl Into<Vec<Byte>> + AsRef<[Byte]>) -> FilterResult<Vec<Byte>> {
        // Avoid converting to Vec<Byte> before the first filter
        let mut defiltered: Vec<_>;
        if let [first, rest @ ..] = self.0.as_slice() {
            defiltered = first.defilter(bytes)?;
            for filtering in rest {
                defiltered = filtering.defilter(defiltered)?;
            }
        } else {
            defiltered = bytes.into();
        }
        Ok(defiltered)
    }
}

/// REFERENCE: [Table 6: Standard filters, p35-36]
/// Named `Filtering` to avoid a clash with the `Filter` trait.
#[derive(Debug, PartialEq, Clone, Copy)]
pub enum Filtering {
    AHx(AHx),
    A85(A85),
    Lzw(Lzw),
    Fl(Fl),
    RL(RL),
}

impl Filtering {
    /// Builds the codec for a `/Filter` name. `decode_parms` entries may be
    /// references resolved through `context`.
    pub fn new(
        name: &Name,
        decode_parms: Option<&Dictionary>,
        context: &Context,
    ) -> FilterResult<Self> {
        // REFERENCE: [Table 92 — Additional abbreviations in an inline image
        // object, p269]
        match name.as_bytes() {
            b"AHx" | b"ASCIIHexDecode" => Ok(Self::AHx(AHx)),
            b"A85" | b"ASCII85Decode" => Ok(Self::A85(A85)),
            b"LZW" | b"LZWDecode" => Ok(Self::Lzw(Lzw::new(decode_parms, context)?)),
            b"Fl" | b"FlateDecode" => Ok(Self::Fl(Fl::new(decode_parms, context)?)),
            b"RL" | b"RunLengthDecode" => Ok(Self::RL(RL)),
            _ => Err(FilterErr::new(
                stringify!(Filtering),
                FilterErrorCode::Unsupported(String::from_utf8_lossy(name.as_bytes()).into()),
            )),
        }
    }
}

impl Filter for Filtering {
    fn filter(&self, bytes: impl Into<Vec<Byte>> + AsRef<[Byte]>) -> FilterResult<Vec<Byte>> {
        match self {
            Self::AHx(filtering) => filtering.filter(bytes),
            Self::A85(filtering) => filtering.filter(bytes),
            Self::Lzw(filtering) => filtering.filter(bytes),
            Self::Fl(filtering) => filtering.filter(bytes),
            Self::RL(filtering) => filtering.filter(bytes),
        }
    }

    fn defilter(&self, bytes: impl Into<Vec<Byte>> + AsRef<[Byte]>) -> FilterResult<Vec<Byte>> {
        match self {
            Self::AHx(filtering) => filtering.defilter(bytes),
            Self::A85(filtering) => filtering.defilter(bytes),
            Self::Lzw(filtering) => filtering.defilter(bytes),
            Self::Fl(filtering) => filtering.defilter(bytes),
            Self::RL(filtering) => filtering.defilter(bytes),
        }
    }
}

mod convert {
    use super::*;

    impl FilteringChain {
        /// REFERENCE: [7.3.8.2 Stream extent, p31-33]
        /// `/Filter` is a name or an array of names; `/DecodeParms` is a
        /// dictionary or an array running parallel to it.
        pub fn new(dictionary: &Dictionary, context: &Context) -> FilterResult<Self> {
            let filtering = dictionary
                .lookup(
                    KEY_FILTER,
                    context,
                    &[ObjectKind::Name, ObjectKind::Array, ObjectKind::Null],
                )
                .map_err(|err| value_type_err(KEY_FILTER, err))?;
            let decode_parms = dictionary
                .lookup(
                    KEY_DECODEPARMS,
                    context,
                    &[ObjectKind::Dictionary, ObjectKind::Array, ObjectKind::Null],
                )
                .map_err(|err| value_type_err(KEY_DECODEPARMS, err))?;

            let chain = match filtering {
                Object::Null => vec![],
                Object::Name(name) => {
                    let decode_parms = match decode_parms {
                        Object::Dictionary(decode_parms) => Some(decode_parms),
                        Object::Array(array) => array
                            .lookup_maybe(0, context, &[ObjectKind::Dictionary])
                            .and_then(Object::as_dictionary),
                        _ => None,
                    };
                    vec![Filtering::new(name, decode_parms, context)?]
                }
                Object::Array(names) => {
                    let decode_parms = decode_parms.as_array();
                    if let Some(decode_parms) = decode_parms {
                        if decode_parms.len() != names.len() {
                            warn!(
                                "Mismatching number of filters {} and decode parameters {}",
                                names.len(),
                                decode_parms.len()
                            );
                        }
                    }
                    let mut chain = Vec::with_capacity(names.len());
                    for index in 0..names.len() {
                        let name = names
                            .lookup(index, context, &[ObjectKind::Name])
                            .map_err(|err| value_type_err(KEY_FILTER, err))?;
                        let name = name.as_name().ok_or_else(|| {
                            FilterErr::new(
                                stringify!(FilteringChain),
                                FilterErrorCode::ValueType(KEY_FILTER, name.kind()),
                            )
                        })?;
                        let parms = decode_parms
                            .and_then(|array| {
                                array.lookup_maybe(index, context, &[ObjectKind::Dictionary])
                            })
                            .and_then(Object::as_dictionary);
                        chain.push(Filtering::new(name, parms, context)?);
                    }
                    chain
                }
                other => {
                    return Err(FilterErr::new(
                        stringify!(FilteringChain),
                        FilterErrorCode::ValueType(KEY_FILTER, other.kind()),
                    ))
                }
            };
            Ok(Self(chain))
        }

        pub fn len(&self) -> usize {
            self.0.len()
        }

        pub fn is_empty(&self) -> bool {
            self.0.is_empty()
        }
    }

    impl From<Vec<Filtering>> for FilteringChain {
        fn from(value: Vec<Filtering>) -> Self {
            Self(value)
        }
    }

    fn value_type_err(key: &'static str, err: crate::object::ObjectErr) -> FilterErr {
        let found = match err {
            crate::object::ObjectErr::UnexpectedType { found, .. } => found,
            _ => ObjectKind::Invalid,
        };
        FilterErr::new(
            stringify!(FilteringChain),
            FilterErrorCode::ValueType(key, found),
        )
    }
}
