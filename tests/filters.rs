use ::rand::rngs::StdRng;
use ::rand::Rng;
use ::rand::SeedableRng;

use ::pdfdoc::filter::Filter;
use ::pdfdoc::filter::FilteringChain;
use ::pdfdoc::object::Array;
use ::pdfdoc::object::Dictionary;
use ::pdfdoc::object::Name;
use ::pdfdoc::Context;
use ::pdfdoc::Object;

const LARGE: usize = (1 << 16) + 17;
const SIZES: [usize; 3] = [0, 1, LARGE];

fn chain(filter: Object, decode_parms: Option<Object>) -> FilteringChain {
    let mut dictionary = Dictionary::from_iter([("Filter", filter)]);
    if let Some(decode_parms) = decode_parms {
        dictionary.set("DecodeParms", decode_parms);
    }
    FilteringChain::new(&dictionary, &Context::new()).unwrap()
}

fn named(name: &str) -> FilteringChain {
    chain(Name::from(name).into(), None)
}

/// Zero-filled and random buffers of each size
fn samples() -> Vec<Vec<u8>> {
    let mut rng = StdRng::seed_from_u64(0x5EED);
    SIZES
        .iter()
        .flat_map(|&size| {
            let random = (0..size).map(|_| rng.gen::<u8>()).collect::<Vec<_>>();
            [vec![0; size], random]
        })
        .collect()
}

fn assert_round_trip(chain: &FilteringChain, label: &str) {
    for data in samples() {
        let encoded = chain.filter(data.as_slice()).unwrap();
        let decoded = chain.defilter(encoded).unwrap();
        assert!(
            decoded == data,
            "{} failed on {} bytes",
            label,
            data.len()
        );
    }
}

#[test]
fn filter_round_trip_each() {
    for name in [
        "ASCIIHexDecode",
        "ASCII85Decode",
        "LZWDecode",
        "FlateDecode",
        "RunLengthDecode",
        "AHx",
        "A85",
        "LZW",
        "Fl",
        "RL",
    ] {
        assert_round_trip(&named(name), name);
    }
}

#[test]
fn filter_round_trip_lzw_early_change() {
    for early_change in [0, 1] {
        let parms = Dictionary::from_iter([("EarlyChange", early_change)]);
        let lzw = chain(Name::from("LZWDecode").into(), Some(parms.into()));
        assert_round_trip(&lzw, &format!("LZW EarlyChange {}", early_change));
    }
}

#[test]
fn filter_round_trip_lzw_early_change_differs() {
    // Enough distinct sequences to pass the first code width change
    let mut rng = StdRng::seed_from_u64(7);
    let data = (0..4096).map(|_| rng.gen::<u8>()).collect::<Vec<_>>();
    let encode = |early_change: i32| {
        let parms = Dictionary::from_iter([("EarlyChange", early_change)]);
        chain(Name::from("LZWDecode").into(), Some(parms.into()))
            .filter(data.as_slice())
            .unwrap()
    };
    assert_ne!(encode(0), encode(1));
}

#[test]
fn filter_round_trip_chain() {
    let filters = Array::from_iter([
        Object::from("ASCII85Decode"),
        "LZWDecode".into(),
        "FlateDecode".into(),
    ]);
    let parms = Array::from_iter([
        Object::Null,
        Dictionary::from_iter([("EarlyChange", 0)]).into(),
        Object::Null,
    ]);
    assert_round_trip(&chain(filters.into(), Some(parms.into())), "chain");

    let encoded = named("ASCIIHexDecode").filter(b"\x00\xFF".as_slice()).unwrap();
    assert!(encoded.iter().all(u8::is_ascii));
}

#[test]
fn filter_round_trip_png_predictor() {
    let columns = 16;
    let parms = Dictionary::from_iter([
        ("Predictor", 12),
        ("Columns", columns),
        ("Colors", 1),
        ("BitsPerComponent", 8),
    ]);
    let flate = chain(Name::from("FlateDecode").into(), Some(parms.into()));
    let mut rng = StdRng::seed_from_u64(12);
    for rows in [0, 1, 4096] {
        let data = (0..rows * columns as usize)
            .map(|_| rng.gen::<u8>())
            .collect::<Vec<_>>();
        let encoded = flate.filter(data.as_slice()).unwrap();
        assert_eq!(flate.defilter(encoded).unwrap(), data);
    }
}

#[test]
fn filter_empty_and_unsupported() {
    let empty = FilteringChain::new(&Dictionary::new(), &Context::new()).unwrap();
    assert!(empty.is_empty());
    assert_eq!(empty.defilter(b"raw".as_slice()).unwrap(), b"raw");

    let dictionary = Dictionary::from_iter([("Filter", "JBIG2Decode")]);
    let err = FilteringChain::new(&dictionary, &Context::new()).unwrap_err();
    assert!(err.to_string().contains("JBIG2Decode"));
}

#[test]
fn filter_corrupt_input() {
    // A zlib header followed by a reserved block type
    assert!(named("FlateDecode")
        .defilter(b"\x78\x9C\xFF\xFF\xFF\xFF".as_slice())
        .is_err());
    assert!(named("ASCIIHexDecode").defilter(b"0G>".as_slice()).is_err());
}
