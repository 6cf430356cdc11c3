use ::once_cell::unsync::OnceCell;
use ::std::fmt::Debug;
use ::std::fmt::Formatter;
use ::std::fmt::Result as FmtResult;
use ::std::sync::Arc;

use super::dictionary::Dictionary;
use super::dictionary::KEY_FILTER;
use super::dictionary::KEY_LENGTH;
use super::name::Name;
use super::reference::Reference;
use crate::context::Context;
use crate::process::filter::error::FilterResult;
use crate::process::filter::flate::Fl;
use crate::process::filter::Filter;
use crate::process::filter::FilteringChain;
use crate::Byte;

/// Decrypts and encrypts the strings and streams of one indirect object.
/// Key derivation happens elsewhere. The parser decrypts with it and the
/// writer encrypts again.
pub trait CipherTransform: Debug + Send + Sync {
    fn decrypt(&self, bytes: &[Byte]) -> Vec<Byte>;

    fn encrypt(&self, bytes: &[Byte]) -> Vec<Byte>;
}

/// Produces the transform that applies to a given indirect object.
pub trait CipherTransformFactory: Debug + Send + Sync {
    fn for_object(&self, reference: Reference) -> Arc<dyn CipherTransform>;
}

/// REFERENCE: [7.3.8 Stream objects, p31-34]
#[derive(Debug, Clone)]
pub struct Stream {
    dictionary: Dictionary,
    contents: StreamContents,
}

#[derive(Clone)]
pub enum StreamContents {
    /// Bytes exactly as read from a file, still encoded by the filters the
    /// dictionary names and, for encrypted files, still encrypted.
    Raw {
        data: Vec<Byte>,
        transform: Option<Arc<dyn CipherTransform>>,
    },
    /// Contents built in memory. When `encode` is set they are deflated once,
    /// on first use, and the result is reused for every later write.
    Flate {
        unencoded: Vec<Byte>,
        encode: bool,
        encoded: OnceCell<Vec<Byte>>,
    },
}

impl Debug for StreamContents {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Self::Raw { data, transform } => f
                .debug_struct(stringify!(Raw))
                .field("len", &data.len())
                .field("transform", &transform.is_some())
                .finish(),
            Self::Flate {
                unencoded, encode, ..
            } => f
                .debug_struct(stringify!(Flate))
                .field("len", &unencoded.len())
                .field("encode", encode)
                .finish(),
        }
    }
}

impl PartialEq for StreamContents {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Raw { data: lhs, .. }, Self::Raw { data: rhs, .. }) => lhs == rhs,
            (
                Self::Flate {
                    unencoded: lhs,
                    encode: lhs_encode,
                    ..
                },
                Self::Flate {
                    unencoded: rhs,
                    encode: rhs_encode,
                    ..
                },
            ) => lhs == rhs && lhs_encode == rhs_encode,
            _ => false,
        }
    }
}

/// Streams compare by dictionary and encoded contents. `/Length` is ignored
/// as the writer recomputes it.
impl PartialEq for Stream {
    fn eq(&self, other: &Self) -> bool {
        let without_length = |dictionary: &Dictionary| {
            let mut dictionary = dictionary.clone();
            dictionary.delete(KEY_LENGTH);
            dictionary
        };
        without_length(&self.dictionary) == without_length(&other.dictionary)
            && self.contents == other.contents
    }
}

impl Stream {
    pub fn raw(dictionary: Dictionary, data: impl Into<Vec<Byte>>) -> Self {
        Self {
            dictionary,
            contents: StreamContents::Raw {
                data: data.into(),
                transform: None,
            },
        }
    }

    /// A stream whose contents are deflated on write when `encode` is set
    pub fn flate(mut dictionary: Dictionary, unencoded: impl Into<Vec<Byte>>, encode: bool) -> Self {
        if encode {
            dictionary.set(KEY_FILTER, Name::from("FlateDecode"));
        }
        Self {
            dictionary,
            contents: StreamContents::Flate {
                unencoded: unencoded.into(),
                encode,
                encoded: OnceCell::new(),
            },
        }
    }

    /// Attaches the transform applied before the filters when decoding
    pub fn with_transform(mut self, cipher: Arc<dyn CipherTransform>) -> Self {
        if let StreamContents::Raw { transform, .. } = &mut self.contents {
            *transform = Some(cipher);
        }
        self
    }

    pub fn dictionary(&self) -> &Dictionary {
        &self.dictionary
    }

    pub fn dictionary_mut(&mut self) -> &mut Dictionary {
        &mut self.dictionary
    }

    pub fn stream_contents(&self) -> &StreamContents {
        &self.contents
    }

    /// Whether the contents are still encrypted as read from a file
    pub fn is_encrypted(&self) -> bool {
        matches!(
            self.contents,
            StreamContents::Raw {
                transform: Some(_),
                ..
            }
        )
    }

    /// The bytes written between `stream` and `endstream`
    pub fn contents(&self) -> FilterResult<&[Byte]> {
        match &self.contents {
            StreamContents::Raw { data, .. } => Ok(data),
            StreamContents::Flate {
                unencoded,
                encode: false,
                ..
            } => Ok(unencoded),
            StreamContents::Flate {
                unencoded,
                encode: true,
                encoded,
            } => encoded
                .get_or_try_init(|| Fl::default().filter(unencoded.as_slice()))
                .map(Vec::as_slice),
        }
    }

    /// The dictionary as written, with `/Length` matching [`Stream::contents`]
    pub(crate) fn dictionary_for_write(&self) -> FilterResult<Dictionary> {
        let length = self.contents()?.len();
        let mut dictionary = self.dictionary.clone();
        dictionary.set(KEY_LENGTH, length);
        Ok(dictionary)
    }

    /// Decrypts and applies the filter chain named by the dictionary
    pub fn decode(&self, context: &Context) -> FilterResult<Vec<Byte>> {
        match &self.contents {
            StreamContents::Raw { data, transform } => {
                let chain = FilteringChain::new(&self.dictionary, context)?;
                match transform {
                    Some(transform) => chain.defilter(transform.decrypt(data)),
                    None => chain.defilter(data.as_slice()),
                }
            }
            StreamContents::Flate { unencoded, .. } => Ok(unencoded.clone()),
        }
    }
}
