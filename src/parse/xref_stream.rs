use ::log::warn;

use super::num::bytes_to_u64;
use super::xref::Entry;
use crate::context::Context;
use crate::error::PdfError;
use crate::error::PdfResult;
use crate::object::Array;
use crate::object::ObjectErr;
use crate::object::Reference;
use crate::object::Stream;
use crate::GenerationNumber;
use crate::ObjectNumber;
use crate::Offset;

pub(crate) const KEY_W: &str = "W";
pub(crate) const KEY_INDEX: &str = "Index";
pub(crate) const KEY_SIZE: &str = "Size";

/// REFERENCE: [7.5.8.3 Cross-reference stream data, p68-69]
/// Entries wider than 8 bytes do not fit any offset a buffer can hold.
const MAX_FIELD_WIDTH: usize = 8;

/// Decodes the rows of a cross-reference stream.
///
/// REFERENCE: [7.5.8 Cross-reference streams, p65-70]
pub(crate) fn entries(
    reference: Reference,
    stream: &Stream,
    context: &Context,
) -> PdfResult<Vec<(ObjectNumber, Entry)>> {
    let dictionary = stream.dictionary();
    let widths = field_widths(dictionary.get(KEY_W).and_then(|w| w.as_array()))?;
    let size = dictionary
        .get(KEY_SIZE)
        .and_then(|size| size.as_i64())
        .and_then(|size| ObjectNumber::try_from(size).ok())
        .ok_or(ObjectErr::MissingEntry(KEY_SIZE))?;
    let subsections = subsections(dictionary.get(KEY_INDEX).and_then(|i| i.as_array()), size)?;

    let data = stream
        .decode(context)
        .map_err(|err| PdfError::decode(Some(reference), err))?;
    let row_width = widths.iter().sum::<usize>();
    if row_width == 0 {
        return Err(ObjectErr::InvalidValue(KEY_W, "all fields are empty".to_string()).into());
    }

    let mut rows = data.chunks_exact(row_width);
    let mut entries = Vec::new();
    'subsections: for (first, count) in subsections {
        for index in 0..count {
            let row = match rows.next() {
                Some(row) => row,
                None => {
                    warn!(
                        "Cross-reference stream {} ends before subsection {} {}",
                        reference, first, count
                    );
                    break 'subsections;
                }
            };
            let (field_1, rest) = row.split_at(widths[0]);
            let (field_2, field_3) = rest.split_at(widths[1]);
            // A missing type field means every entry is in use
            let entry_type = if widths[0] == 0 {
                1
            } else {
                bytes_to_u64(field_1).unwrap_or(u64::MAX)
            };
            let field_2 = bytes_to_u64(field_2).unwrap_or(u64::MAX);
            let field_3 = bytes_to_u64(field_3).unwrap_or(u64::MAX);
            let entry = match entry(entry_type, field_2, field_3) {
                Some(entry) => entry,
                None => continue,
            };
            let object_number = first.checked_add(index).ok_or(ObjectErr::InvalidValue(
                KEY_INDEX,
                format!("{} {}", first, count),
            ))?;
            entries.push((object_number, entry));
        }
    }
    if !rows.remainder().is_empty() {
        warn!(
            "Cross-reference stream {} has {} trailing bytes",
            reference,
            rows.remainder().len()
        );
    }
    Ok(entries)
}

/// Unknown types are references to the null object and carry no entry
fn entry(entry_type: u64, field_2: u64, field_3: u64) -> Option<Entry> {
    match entry_type {
        0 => Some(Entry::Free {
            next: ObjectNumber::try_from(field_2).ok()?,
            generation: GenerationNumber::try_from(field_3).unwrap_or(GenerationNumber::MAX),
        }),
        1 => Some(Entry::InUse {
            offset: Offset::try_from(field_2).ok()?,
            generation: GenerationNumber::try_from(field_3).ok()?,
        }),
        2 => Some(Entry::Compressed {
            stream: ObjectNumber::try_from(field_2).ok()?,
            index: usize::try_from(field_3).ok()?,
        }),
        _ => None,
    }
}

fn field_widths(w: Option<&Array>) -> PdfResult<[usize; 3]> {
    let w = w.ok_or(ObjectErr::MissingEntry(KEY_W))?;
    let invalid = || ObjectErr::InvalidValue(KEY_W, format!("{:?}", w));
    if w.len() != 3 {
        return Err(invalid().into());
    }
    let mut widths = [0; 3];
    for (width, value) in widths.iter_mut().zip(w.iter()) {
        *width = value
            .as_usize()
            .filter(|&width| width <= MAX_FIELD_WIDTH)
            .ok_or_else(invalid)?;
    }
    Ok(widths)
}

/// `/Index` pairs of first object number and count, defaulting to `[0 Size]`
fn subsections(index: Option<&Array>, size: ObjectNumber) -> PdfResult<Vec<(ObjectNumber, u32)>> {
    let index = match index {
        Some(index) => index,
        None => return Ok(vec![(0, size)]),
    };
    let invalid = || ObjectErr::InvalidValue(KEY_INDEX, format!("{:?}", index));
    if index.len() % 2 != 0 {
        return Err(invalid().into());
    }
    let numbers = index
        .iter()
        .map(|value| {
            value
                .as_i64()
                .and_then(|value| u32::try_from(value).ok())
                .ok_or_else(invalid)
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(numbers
        .chunks_exact(2)
        .map(|pair| (pair[0], pair[1]))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::Dictionary;
    use crate::object::Object;

    fn xref_stream(dictionary: Dictionary, data: &[u8]) -> Stream {
        Stream::raw(dictionary, data.to_vec())
    }

    #[test]
    fn xref_stream_entries() {
        let dictionary = Dictionary::from_iter([
            ("Type", Object::from("XRef")),
            ("Size", Object::from(6)),
            ("W", Array::from_iter([1, 2, 1]).into()),
            ("Index", Array::from_iter([0, 2, 4, 2]).into()),
        ]);
        let data = [
            0, 0x00, 0x00, 0xFF, // free head
            1, 0x01, 0x0F, 0x00, // in use at 271
            2, 0x00, 0x05, 0x03, // 3rd object of stream 5
            9, 0x00, 0x00, 0x00, // unknown type
        ];
        let stream = xref_stream(dictionary, &data);
        let entries = entries(Reference::new(6, 0), &stream, &Context::new()).unwrap();
        assert_eq!(
            entries,
            vec![
                (
                    0,
                    Entry::Free {
                        next: 0,
                        generation: 255
                    }
                ),
                (
                    1,
                    Entry::InUse {
                        offset: 271,
                        generation: 0
                    }
                ),
                (4, Entry::Compressed { stream: 5, index: 3 }),
            ]
        );
    }

    #[test]
    fn xref_stream_default_type_and_index() {
        let dictionary = Dictionary::from_iter([
            ("Size", Object::from(2)),
            ("W", Array::from_iter([0, 1, 0]).into()),
        ]);
        // The second row is missing
        let stream = xref_stream(dictionary, &[0x2A]);
        let entries = entries(Reference::new(3, 0), &stream, &Context::new()).unwrap();
        assert_eq!(
            entries,
            vec![(
                0,
                Entry::InUse {
                    offset: 42,
                    generation: 0
                }
            )]
        );
    }

    #[test]
    fn xref_stream_invalid() {
        let context = Context::new();
        let dictionary = Dictionary::from_iter([
            ("Size", Object::from(2)),
            ("W", Array::from_iter([1, 9, 1]).into()),
        ]);
        let result = entries(Reference::new(3, 0), &xref_stream(dictionary, &[]), &context);
        assert!(matches!(
            result,
            Err(PdfError::Object(ObjectErr::InvalidValue(KEY_W, _)))
        ));

        let dictionary = Dictionary::from_iter([("W", Array::from_iter([1, 2, 1]))]);
        let result = entries(Reference::new(3, 0), &xref_stream(dictionary, &[]), &context);
        assert_eq!(
            result,
            Err(PdfError::Object(ObjectErr::MissingEntry(KEY_SIZE)))
        );
    }
}
