use ::flate2::read::DeflateDecoder;
use ::flate2::read::ZlibDecoder;
use ::flate2::read::ZlibEncoder;
use ::flate2::Compression;
use ::std::io::Read;

use self::error::FlErrorCode;
use super::predictor::Predictor;
use super::Filter;
use crate::context::Context;
use crate::object::Dictionary;
use crate::process::filter::error::FilterErr;
use crate::process::filter::error::FilterErrorCode;
use crate::process::filter::error::FilterResult;
use crate::Byte;
use crate::DECODED_LIMIT;

/// REFERENCE: [7.4.4 LZWDecode and FlateDecode filters, p38]
/// zlib/deflate compression filter.
#[derive(Debug, Default, PartialEq, Clone, Copy)]
pub struct Fl {
    predictor: Predictor,
}

impl Filter for Fl {
    fn filter(&self, bytes: impl Into<Vec<Byte>> + AsRef<[Byte]>) -> FilterResult<Vec<Byte>> {
        let bytes = self.predictor.filter(bytes)?;
        let mut filtered = Vec::default();

        let mut filter = ZlibEncoder::new(bytes.as_slice(), Compression::default());
        filter
            .read_to_end(&mut filtered)
            .map_err(|err| FlErrorCode::Filter(err.to_string()))?;

        Ok(filtered)
    }

    /// Producers do not always emit the zlib header, so raw deflate data is
    /// accepted as well.
    fn defilter(&self, bytes: impl Into<Vec<Byte>> + AsRef<[Byte]>) -> FilterResult<Vec<Byte>> {
        let bytes = bytes.as_ref();
        let mut defiltered = Vec::default();

        // Read one byte past the limit to detect oversized output
        let limit = DECODED_LIMIT as u64 + 1;
        let result = if has_zlib_header(bytes) {
            ZlibDecoder::new(bytes)
                .take(limit)
                .read_to_end(&mut defiltered)
        } else {
            DeflateDecoder::new(bytes)
                .take(limit)
                .read_to_end(&mut defiltered)
        };
        result.map_err(|err| FlErrorCode::Defilter(err.to_string()))?;
        if defiltered.len() > DECODED_LIMIT {
            return Err(FilterErr::new(
                stringify!(Fl),
                FilterErrorCode::DecodedLimit(DECODED_LIMIT),
            ));
        }

        self.predictor.defilter(defiltered)
    }
}

/// REFERENCE: [RFC 1950, 2.2 Data format]
/// Compression method 8 with a header checksum divisible by 31.
fn has_zlib_header(bytes: &[Byte]) -> bool {
    match bytes {
        [cmf, flg, ..] => cmf & 0x0F == 8 && (u16::from(*cmf) << 8 | u16::from(*flg)) % 31 == 0,
        _ => false,
    }
}

mod convert {
    use super::*;

    impl Fl {
        pub(in crate::process::filter) fn new(
            decode_parms: Option<&Dictionary>,
            context: &Context,
        ) -> FilterResult<Self> {
            let predictor = decode_parms
                .map(|decode_parms| Predictor::new(decode_parms, context))
                .transpose()?
                .unwrap_or_default();
            Ok(Self { predictor })
        }
    }
}

pub(in crate::process::filter) mod error {
    use ::thiserror::Error;

    #[derive(Debug, Error, PartialEq, Clone)]
    pub enum FlErrorCode {
        #[error("Filtering: {0}")]
        Filter(String),
        #[error("Defiltering: {0}")]
        Defilter(String),
    }
}
