use super::serialize::Serializer;
use super::stream::Chunk;
use crate::context::Context;
use crate::error::PdfError;
use crate::error::PdfResult;
use crate::object::dictionary::KEY_TYPE;
use crate::object::Dictionary;
use crate::object::Name;
use crate::object::Object;
use crate::object::Stream;
use crate::parse::document::TYPE_OBJSTM;
use crate::parse::object_stream::KEY_FIRST;
use crate::parse::object_stream::KEY_N;
use crate::Byte;

/// Packs the members of a chunk into one object stream.
///
/// REFERENCE: [7.5.7 Object streams, p64-65]
/// The header lists `N` pairs of object number and offset relative to
/// `/First`, followed by the objects themselves, without `obj` wrappers.
pub(crate) fn build(serializer: &Serializer, chunk: &Chunk, context: &Context) -> PdfResult<Stream> {
    let mut header = Vec::new();
    let mut body: Vec<Byte> = Vec::new();
    for (index, &member) in chunk.members.iter().enumerate() {
        if index > 0 {
            header.push(b' ');
            body.push(b'\n');
        }
        header.extend_from_slice(format!("{} {}", member.object_number, body.len()).as_bytes());
        let object = context.get(member).unwrap_or(context.null());
        serializer
            .object(&mut body, object)
            .map_err(|err| PdfError::write(Some(member), err))?;
    }
    header.push(b'\n');

    let dictionary = Dictionary::from_iter([
        (KEY_TYPE, Object::from(Name::from(TYPE_OBJSTM))),
        (KEY_N, Object::from(chunk.members.len())),
        (KEY_FIRST, Object::from(header.len())),
    ]);
    header.extend_from_slice(&body);
    Ok(Stream::flate(dictionary, header, serializer.encode_streams))
}
