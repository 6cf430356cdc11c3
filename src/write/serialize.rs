use ::std::sync::Arc;

use crate::object::dictionary::KEY_FILTER;
use crate::object::dictionary::KEY_LENGTH;
use crate::object::Array;
use crate::object::CipherTransform;
use crate::object::CipherTransformFactory;
use crate::object::Dictionary;
use crate::object::HexString;
use crate::object::Object;
use crate::object::PdfString;
use crate::object::Reference;
use crate::object::Stream;
use crate::object::StreamContents;
use crate::parse::document::TYPE_XREF;
use crate::parse::KW_ENDOBJ;
use crate::parse::KW_ENDSTREAM;
use crate::parse::KW_FALSE;
use crate::parse::KW_NULL;
use crate::parse::KW_OBJ;
use crate::parse::KW_STREAM;
use crate::parse::KW_TRUE;
use crate::process::filter::error::FilterResult;
use crate::Byte;

/// Destination of serialized bytes. The layout pass counts, the
/// serialization pass copies, and both run the same code.
pub(crate) trait Output {
    fn put(&mut self, bytes: &[Byte]);
}

impl Output for Vec<Byte> {
    fn put(&mut self, bytes: &[Byte]) {
        self.extend_from_slice(bytes);
    }
}

/// Counts bytes without storing them
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ByteCount(pub(crate) usize);

impl Output for ByteCount {
    fn put(&mut self, bytes: &[Byte]) {
        self.0 += bytes.len();
    }
}

#[derive(Debug, Clone)]
pub(crate) struct Serializer {
    /// When unset, contents built in memory are written without deflating
    pub(crate) encode_streams: bool,
    cipher: Option<Arc<dyn CipherTransformFactory>>,
    /// The encryption dictionary, which is written in the clear
    encrypt: Option<Reference>,
}

impl Serializer {
    pub(crate) fn new(encode_streams: bool) -> Self {
        Self {
            encode_streams,
            cipher: None,
            encrypt: None,
        }
    }

    /// Encrypts the strings and streams of indirect objects. Objects packed
    /// into object streams are written through [`Serializer::object`] and
    /// only the containing stream is encrypted.
    pub(crate) fn with_cipher(
        mut self,
        cipher: Option<Arc<dyn CipherTransformFactory>>,
        encrypt: Option<Reference>,
    ) -> Self {
        self.cipher = cipher;
        self.encrypt = encrypt;
        self
    }

    fn transform(&self, reference: Reference, object: &Object) -> Option<Arc<dyn CipherTransform>> {
        let cipher = self.cipher.as_ref()?;
        let is_xref_stream = object
            .as_stream()
            .is_some_and(|stream| stream.dictionary().has_type(TYPE_XREF));
        (Some(reference) != self.encrypt && !is_xref_stream)
            .then(|| cipher.for_object(reference))
    }

    /// `n g obj`, the object and `endobj`, followed by a blank line
    pub(crate) fn indirect(
        &self,
        output: &mut impl Output,
        reference: Reference,
        object: &Object,
    ) -> FilterResult<()> {
        output.put(
            format!(
                "{} {} {}\n",
                reference.object_number, reference.generation_number, KW_OBJ
            )
            .as_bytes(),
        );
        let transform = self.transform(reference, object);
        self.value(output, object, transform.as_deref())?;
        output.put(b"\n");
        output.put(KW_ENDOBJ.as_bytes());
        output.put(b"\n\n");
        Ok(())
    }

    pub(crate) fn indirect_size(&self, reference: Reference, object: &Object) -> FilterResult<usize> {
        let mut count = ByteCount::default();
        self.indirect(&mut count, reference, object)?;
        Ok(count.0)
    }

    /// A direct object, never encrypted
    pub(crate) fn object(&self, output: &mut impl Output, object: &Object) -> FilterResult<()> {
        self.value(output, object, None)
    }

    fn value(
        &self,
        output: &mut impl Output,
        object: &Object,
        transform: Option<&dyn CipherTransform>,
    ) -> FilterResult<()> {
        match object {
            Object::Null => output.put(KW_NULL.as_bytes()),
            Object::Boolean(true) => output.put(KW_TRUE.as_bytes()),
            Object::Boolean(false) => output.put(KW_FALSE.as_bytes()),
            Object::Number(number) => output.put(number.to_string().as_bytes()),
            Object::String(string) => match transform {
                Some(transform) => {
                    output.put(&PdfString::new(transform.encrypt(string.as_bytes())).escaped())
                }
                None => output.put(&string.escaped()),
            },
            Object::HexString(string) => match transform {
                Some(transform) => {
                    output.put(&HexString::new(transform.encrypt(string.as_bytes())).escaped())
                }
                None => output.put(&string.escaped()),
            },
            Object::Name(name) => output.put(&name.escaped()),
            Object::Array(array) => self.array(output, array, transform)?,
            Object::Dictionary(dictionary) => self.dictionary(output, dictionary, transform)?,
            Object::Stream(stream) => self.stream(output, stream, transform)?,
            Object::Reference(reference) => output.put(reference.to_string().as_bytes()),
            // Written back exactly as read
            Object::Invalid(invalid) => output.put(invalid.as_bytes()),
        }
        Ok(())
    }

    fn array(
        &self,
        output: &mut impl Output,
        array: &Array,
        transform: Option<&dyn CipherTransform>,
    ) -> FilterResult<()> {
        output.put(b"[");
        for value in array.iter() {
            output.put(b" ");
            self.value(output, value, transform)?;
        }
        output.put(b" ]");
        Ok(())
    }

    fn dictionary(
        &self,
        output: &mut impl Output,
        dictionary: &Dictionary,
        transform: Option<&dyn CipherTransform>,
    ) -> FilterResult<()> {
        output.put(b"<<\n");
        for (key, value) in dictionary.iter() {
            output.put(&key.escaped());
            output.put(b" ");
            self.value(output, value, transform)?;
            output.put(b"\n");
        }
        output.put(b">>");
        Ok(())
    }

    fn stream(
        &self,
        output: &mut impl Output,
        stream: &Stream,
        transform: Option<&dyn CipherTransform>,
    ) -> FilterResult<()> {
        let (mut dictionary, contents) = self.stream_parts(stream)?;
        let encrypted;
        let contents = match transform {
            // Contents read from an encrypted file are written as read
            Some(transform) if !stream.is_encrypted() => {
                encrypted = transform.encrypt(contents);
                dictionary.set(KEY_LENGTH, encrypted.len());
                encrypted.as_slice()
            }
            _ => contents,
        };
        self.dictionary(output, &dictionary, transform)?;
        output.put(b"\n");
        output.put(KW_STREAM.as_bytes());
        output.put(b"\n");
        output.put(contents);
        output.put(b"\n");
        output.put(KW_ENDSTREAM.as_bytes());
        Ok(())
    }

    /// The dictionary with a matching `/Length` and the bytes written
    fn stream_parts<'stream>(
        &self,
        stream: &'stream Stream,
    ) -> FilterResult<(Dictionary, &'stream [Byte])> {
        match stream.stream_contents() {
            StreamContents::Flate {
                unencoded,
                encode: true,
                ..
            } if !self.encode_streams => {
                let mut dictionary = stream.dictionary().clone();
                dictionary.delete(KEY_FILTER);
                dictionary.set(KEY_LENGTH, unencoded.len());
                Ok((dictionary, unencoded))
            }
            _ => Ok((stream.dictionary_for_write()?, stream.contents()?)),
        }
    }
}
