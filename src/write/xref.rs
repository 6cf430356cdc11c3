use crate::context::TrailerInfo;
use crate::object::Array;
use crate::object::Dictionary;
use crate::parse::document::KEY_ENCRYPT;
use crate::parse::document::KEY_ID;
use crate::parse::document::KEY_INFO;
use crate::parse::document::KEY_ROOT;
use crate::parse::xref_stream::KEY_SIZE;
use crate::GenerationNumber;
use crate::ObjectNumber;
use crate::Offset;

/// REFERENCE: [7.5.4 Cross-reference table, p57] The head of the free list.
const FREE_HEAD_GENERATION: GenerationNumber = 65535;

/// Where an object of the written file can be found
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Location {
    FreeHead,
    Offset {
        offset: Offset,
        generation: GenerationNumber,
    },
    Compressed {
        stream: ObjectNumber,
        index: usize,
    },
}

impl Location {
    /// The three fields of a cross-reference stream row
    fn fields(&self) -> (u64, u64, u64) {
        match *self {
            Self::FreeHead => (0, 0, u64::from(FREE_HEAD_GENERATION)),
            Self::Offset { offset, generation } => (1, offset as u64, u64::from(generation)),
            Self::Compressed { stream, index } => (2, u64::from(stream), index as u64),
        }
    }
}

/// Runs of consecutive object numbers as `(first, count)`. `locations` must
/// be sorted by object number.
pub(crate) fn runs(locations: &[(ObjectNumber, Location)]) -> Vec<(ObjectNumber, usize)> {
    let mut runs: Vec<(ObjectNumber, usize)> = Vec::new();
    for &(object_number, _) in locations {
        match runs.last_mut() {
            Some((first, count)) if u64::from(*first) + *count as u64 == u64::from(object_number) => {
                *count += 1
            }
            _ => runs.push((object_number, 1)),
        }
    }
    runs
}

/// REFERENCE: [7.5.4 Cross-reference table, p55-57]
/// One subsection per run, each record exactly 20 bytes.
pub(crate) fn table(locations: &[(ObjectNumber, Location)]) -> Vec<u8> {
    let mut table = b"xref\n".to_vec();
    let mut remaining = locations;
    for (first, count) in runs(locations) {
        table.extend_from_slice(format!("{} {}\n", first, count).as_bytes());
        let (run, rest) = remaining.split_at(count);
        for (_, location) in run {
            let record = match *location {
                Location::FreeHead => format!("{:010} {:05} f\r\n", 0, FREE_HEAD_GENERATION),
                Location::Offset { offset, generation } => {
                    format!("{:010} {:05} n\r\n", offset, generation)
                }
                // Not representable in a table
                Location::Compressed { .. } => format!("{:010} {:05} f\r\n", 0, 0),
            };
            table.extend_from_slice(record.as_bytes());
        }
        remaining = rest;
    }
    table
}

/// `Size` and the document-level entries shared by trailers and
/// cross-reference stream dictionaries
pub(crate) fn trailer_entries(trailer_info: &TrailerInfo, size: u64) -> Dictionary {
    let mut dictionary = Dictionary::new();
    dictionary.set(KEY_SIZE, size as i64);
    for (key, value) in [
        (KEY_ROOT, trailer_info.root),
        (KEY_ENCRYPT, trailer_info.encrypt),
        (KEY_INFO, trailer_info.info),
    ] {
        if let Some(reference) = value {
            dictionary.set(key, reference);
        }
    }
    if let Some(id) = &trailer_info.id {
        dictionary.set(KEY_ID, id.clone());
    }
    dictionary
}

/// The object number following the largest one listed
pub(crate) fn size(locations: &[(ObjectNumber, Location)]) -> u64 {
    locations
        .last()
        .map_or(1, |(object_number, _)| u64::from(*object_number) + 1)
}

/// Bytes needed for the largest value, at least one
fn width(value: u64) -> usize {
    let bits = u64::BITS - value.leading_zeros();
    (bits as usize).div_ceil(8).max(1)
}

/// The rows of a cross-reference stream with its `/W` and `/Index` arrays
///
/// REFERENCE: [7.5.8 Cross-reference streams, p65-70]
pub(crate) struct StreamRows {
    pub(crate) widths: [usize; 3],
    pub(crate) index: Array,
    pub(crate) rows: Vec<u8>,
}

impl StreamRows {
    pub(crate) fn new(locations: &[(ObjectNumber, Location)]) -> Self {
        let fields = locations
            .iter()
            .map(|(_, location)| location.fields())
            .collect::<Vec<_>>();
        let widths = [
            1,
            width(fields.iter().map(|f| f.1).max().unwrap_or_default()),
            width(fields.iter().map(|f| f.2).max().unwrap_or_default()),
        ];
        let mut rows = Vec::with_capacity(fields.len() * widths.iter().sum::<usize>());
        for (entry_type, field_2, field_3) in fields {
            for (value, width) in [entry_type, field_2, field_3].into_iter().zip(widths) {
                rows.extend_from_slice(&value.to_be_bytes()[8 - width..]);
            }
        }
        let index = runs(locations)
            .into_iter()
            .flat_map(|(first, count)| [first as usize, count])
            .collect();
        Self {
            widths,
            index,
            rows,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::Object;
    use crate::object::Reference;

    fn locations() -> Vec<(ObjectNumber, Location)> {
        vec![
            (0, Location::FreeHead),
            (
                1,
                Location::Offset {
                    offset: 17,
                    generation: 0,
                },
            ),
            (
                2,
                Location::Offset {
                    offset: 300,
                    generation: 1,
                },
            ),
            (5, Location::Compressed { stream: 6, index: 0 }),
            (
                6,
                Location::Offset {
                    offset: 70000,
                    generation: 0,
                },
            ),
        ]
    }

    #[test]
    fn xref_runs() {
        assert_eq!(runs(&locations()), vec![(0, 3), (5, 2)]);
        assert_eq!(runs(&[]), vec![]);
    }

    #[test]
    fn xref_table() {
        let locations = &locations()[..3];
        let table = table(locations);
        assert_eq!(
            table,
            b"xref\n0 3\n0000000000 65535 f\r\n0000000017 00000 n\r\n0000000300 00001 n\r\n"
        );
    }

    #[test]
    fn xref_trailer_entries() {
        let trailer_info = TrailerInfo {
            root: Some(Reference::new(1, 0)),
            info: Some(Reference::new(7, 0)),
            ..Default::default()
        };
        let dictionary = trailer_entries(&trailer_info, size(&locations()));
        assert_eq!(dictionary.get(KEY_SIZE), Some(&Object::from(7)));
        assert_eq!(
            dictionary.get(KEY_ROOT),
            Some(&Object::from(Reference::new(1, 0)))
        );
        assert!(!dictionary.has(KEY_ENCRYPT));
        assert!(!dictionary.has(KEY_ID));
    }

    #[test]
    fn xref_stream_rows() {
        assert_eq!(width(0), 1);
        assert_eq!(width(255), 1);
        assert_eq!(width(256), 2);
        assert_eq!(width(70000), 3);

        let stream_rows = StreamRows::new(&locations());
        assert_eq!(stream_rows.widths, [1, 3, 2]);
        assert_eq!(
            stream_rows.index,
            Array::from_iter([0, 3, 5, 2].map(Object::from))
        );
        assert_eq!(stream_rows.rows.len(), 5 * 6);
        assert_eq!(&stream_rows.rows[..6], &[0, 0, 0, 0, 0xFF, 0xFF]);
        assert_eq!(&stream_rows.rows[18..24], &[2, 0, 0, 6, 0, 0]);
        assert_eq!(&stream_rows.rows[24..], &[1, 0x01, 0x11, 0x70, 0, 0]);
    }
}
