use ::std::collections::BTreeMap;
use ::std::fs;
use ::std::path::PathBuf;

use ::pdfdoc::document::ContentStream;
use ::pdfdoc::document::Paint;
use ::pdfdoc::object::Dictionary;
use ::pdfdoc::parse::DocumentParser;
use ::pdfdoc::parse::ParseOptions;
use ::pdfdoc::write::CompressionPlan;
use ::pdfdoc::write::PdfWriter;
use ::pdfdoc::write::WriteOptions;
use ::pdfdoc::Context;
use ::pdfdoc::Document;
use ::pdfdoc::Object;
use ::pdfdoc::Reference;

fn fixture(name: &str) -> Vec<u8> {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("data")
        .join(name);
    fs::read(&path).unwrap_or_else(|err| panic!("{}: {}", path.display(), err))
}

fn parse(buffer: &[u8]) -> Context {
    DocumentParser::new(buffer, ParseOptions::default())
        .parse()
        .unwrap()
}

fn options(use_object_streams: bool) -> WriteOptions {
    WriteOptions {
        use_object_streams,
        objects_per_stream: 3,
        encode_streams: false,
    }
}

fn objects(context: &Context) -> BTreeMap<Reference, Object> {
    context
        .enumerate_indirect_objects()
        .map(|(reference, object)| (reference, object.clone()))
        .collect()
}

fn assert_same_document(original: &Context, reparsed: &Context) {
    assert_eq!(objects(original), objects(reparsed));
    assert_eq!(original.trailer_info.root, reparsed.trailer_info.root);
    assert_eq!(original.trailer_info.info, reparsed.trailer_info.info);
    assert_eq!(original.trailer_info.id, reparsed.trailer_info.id);
}

fn number_after(buffer: &[u8], keyword: &[u8]) -> usize {
    let start = buffer
        .windows(keyword.len())
        .rposition(|window| window == keyword)
        .unwrap()
        + keyword.len();
    let digits = buffer[start..]
        .iter()
        .skip_while(|byte| byte.is_ascii_whitespace())
        .take_while(|byte| byte.is_ascii_digit())
        .map(|&byte| char::from(byte))
        .collect::<String>();
    digits.parse().unwrap()
}

fn assert_object_at(buffer: &[u8], offset: usize, object_number: u64, generation: u64) {
    let expected = format!("{} {} obj", object_number, generation);
    assert_eq!(
        &buffer[offset..offset + expected.len()],
        expected.as_bytes(),
        "object {} at offset {}",
        object_number,
        offset
    );
}

/// `(object number, generation, offset)` of each in-use entry of the
/// cross-reference table
fn table_entries(buffer: &[u8]) -> Vec<(u64, u64, usize)> {
    let start = number_after(buffer, b"startxref");
    let text = String::from_utf8_lossy(&buffer[start..]).into_owned();
    let mut lines = text.lines();
    assert_eq!(lines.next(), Some("xref"));
    let mut entries = Vec::new();
    while let Some(line) = lines.next() {
        if line == "trailer" {
            break;
        }
        let mut header = line.split_whitespace().map(|field| field.parse::<u64>().unwrap());
        let (first, count) = (header.next().unwrap(), header.next().unwrap());
        for object_number in first..first + count {
            let fields = lines.next().unwrap().split_whitespace().collect::<Vec<_>>();
            if fields[2] == "n" {
                entries.push((object_number, fields[1].parse().unwrap(), fields[0].parse().unwrap()));
            }
        }
    }
    entries
}

/// The unencoded rows of the cross-reference stream as
/// `(object number, type, field 2, field 3)`
fn stream_entries(buffer: &[u8]) -> Vec<(u64, u64, u64, u64)> {
    let start = number_after(buffer, b"startxref");
    let text = String::from_utf8_lossy(&buffer[start..]).into_owned();
    let integers = |key: &str| -> Vec<u64> {
        let line = text
            .lines()
            .find(|line| line.starts_with(key))
            .unwrap_or_else(|| panic!("{} is missing", key));
        line[key.len()..]
            .split_whitespace()
            .filter_map(|field| field.parse().ok())
            .collect()
    };
    let widths = integers("/W ");
    let index = integers("/Index ");
    let length = integers("/Length ")[0] as usize;
    let data_start = start + text.find("stream\n").unwrap() + "stream\n".len();
    let data = &buffer[data_start..data_start + length];

    let object_numbers = index
        .chunks(2)
        .flat_map(|run| run[0]..run[0] + run[1])
        .collect::<Vec<_>>();
    let row_width = widths.iter().sum::<u64>() as usize;
    assert_eq!(data.len(), row_width * object_numbers.len());
    data.chunks(row_width)
        .zip(object_numbers)
        .map(|(row, object_number)| {
            let mut fields = [0u64; 3];
            let mut position = 0;
            for (field, &width) in fields.iter_mut().zip(&widths) {
                for &byte in &row[position..position + width as usize] {
                    *field = (*field << 8) | u64::from(byte);
                }
                position += width as usize;
            }
            (object_number, fields[0], fields[1], fields[2])
        })
        .collect()
}

#[test]
fn round_trip_classic_fixture() {
    let original = parse(&fixture("form.pdf"));
    assert_eq!(original.object_count(), 16);
    for use_object_streams in [false, true] {
        let bytes = PdfWriter::new(&original, options(use_object_streams))
            .write()
            .unwrap();
        assert_same_document(&original, &parse(&bytes));
    }
}

#[test]
fn round_trip_compressed_fixture() {
    let original = parse(&fixture("compressed.pdf"));
    // The object stream and the cross-reference stream are not kept
    assert_eq!(original.object_count(), 5);
    assert_eq!(original.trailer_info.root, Some(Reference::new(1, 0)));
    for use_object_streams in [false, true] {
        let bytes = PdfWriter::new(&original, options(use_object_streams))
            .write()
            .unwrap();
        assert_same_document(&original, &parse(&bytes));
    }
}

#[test]
fn round_trip_created_document() {
    let mut document = Document::create();
    for size in [[612.0, 792.0], [595.0, 842.0]] {
        let page = document.add_page(size).unwrap();
        let mut content = ContentStream::new();
        content
            .set_line_width(2.0)
            .draw_line([0.0, 0.0], size)
            .draw_ellipse([100.0, 100.0], 50.0, 25.0, Paint::FillAndStroke);
        document.add_content(page, content).unwrap();
    }
    for use_object_streams in [false, true] {
        let bytes = document.save(options(use_object_streams)).unwrap();
        let first = parse(&bytes);
        let again = PdfWriter::new(&first, options(use_object_streams))
            .write()
            .unwrap();
        assert_same_document(&first, &parse(&again));

        let loaded = Document::from_context(first);
        assert_eq!(loaded.pages().len(), 2);
    }
}

#[test]
fn offsets_classic_table() {
    let context = parse(&fixture("form.pdf"));
    let bytes = PdfWriter::new(&context, WriteOptions::default())
        .write()
        .unwrap();
    assert!(bytes.starts_with(b"%PDF-1.7\n"));
    let entries = table_entries(&bytes);
    assert_eq!(entries.len(), context.object_count());
    for (object_number, generation, offset) in entries {
        assert_object_at(&bytes, offset, object_number, generation);
    }
}

#[test]
fn offsets_cross_reference_stream() {
    let context = parse(&fixture("form.pdf"));
    let bytes = PdfWriter::new(&context, options(true)).write().unwrap();
    let entries = stream_entries(&bytes);

    let offsets = entries
        .iter()
        .filter(|entry| entry.1 == 1)
        .map(|&(object_number, _, offset, _)| (object_number, offset as usize))
        .collect::<BTreeMap<_, _>>();
    for (&object_number, &offset) in &offsets {
        assert_object_at(&bytes, offset, object_number, 0);
    }
    let mut compressed = 0;
    for &(object_number, _, stream, index) in entries.iter().filter(|entry| entry.1 == 2) {
        assert!(offsets.contains_key(&stream), "object {}", object_number);
        assert!(index < 3);
        compressed += 1;
    }
    // Every dictionary of the fixture fits in an object stream
    assert_eq!(compressed, 13);
    assert_eq!(entries[0], (0, 0, 0, 65535));
}

#[test]
fn object_stream_eligibility() {
    let mut context = Context::new();
    let dictionary = context.register(Dictionary::new());
    let number = context.register(7);
    let stream = context.register(::pdfdoc::object::Stream::raw(Dictionary::new(), b"q Q".to_vec()));
    let old = Reference::new(20, 1);
    context.assign(old, Dictionary::new());
    let encrypt = context.register(Dictionary::new());
    context.trailer_info.encrypt = Some(encrypt);

    let plan = CompressionPlan::for_context(&context, 1).unwrap();
    assert_eq!(plan.direct, vec![stream, old, encrypt]);
    let members = plan
        .chunks
        .iter()
        .flat_map(|chunk| chunk.members.iter().copied())
        .collect::<Vec<_>>();
    assert_eq!(members, vec![dictionary, number]);
    assert_eq!(plan.chunks.len(), 2);

    // New numbers follow every existing one
    let largest = context.largest_object_number();
    let mut allocated = plan
        .chunks
        .iter()
        .map(|chunk| chunk.reference)
        .chain(plan.xref)
        .map(|reference| reference.object_number())
        .collect::<Vec<_>>();
    assert!(allocated.iter().all(|&number| number > largest));
    allocated.dedup();
    assert_eq!(allocated.len(), 3);
}
