pub(in crate::process) mod png;

use self::png::Png;
use self::png::PngAlgorithm;
use super::Filter;
use crate::context::Context;
use crate::object::Dictionary;
use crate::object::ObjectKind;
use crate::process::filter::error::FilterErr;
use crate::process::filter::error::FilterErrorCode;
use crate::process::filter::error::FilterResult;
use crate::Byte;

const KEY_PREDICTOR: &str = "Predictor";
const KEY_BITS_PER_COMPONENT: &str = "BitsPerComponent";
const KEY_COLORS: &str = "Colors";
const KEY_COLUMNS: &str = "Columns";

/// REFERENCE: [Table 8 — Optional parameters for LZWDecode and FlateDecode
/// filters, p40] and [Table 10 — Predictor values. p42]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) enum Predictor {
    #[default]
    None,
    Png(Png),
}

impl Filter for Predictor {
    fn filter(&self, bytes: impl Into<Vec<Byte>> + AsRef<[Byte]>) -> FilterResult<Vec<Byte>> {
        match self {
            Self::None => Ok(bytes.into()),
            Self::Png(png) => png.filter(bytes),
        }
    }

    fn defilter(&self, bytes: impl Into<Vec<Byte>> + AsRef<[Byte]>) -> FilterResult<Vec<Byte>> {
        match self {
            Self::None => Ok(bytes.into()),
            Self::Png(png) => png.defilter(bytes),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct PredictorParms {
    bits_per_component: usize,
    colors: usize,
    columns: usize,
}

impl Default for PredictorParms {
    fn default() -> Self {
        Self {
            bits_per_component: 8,
            colors: 1,
            columns: 1,
        }
    }
}

impl PredictorParms {
    /// Bytes per row, rounding partial bytes up
    pub(crate) fn bytes_per_row(&self) -> usize {
        (self.columns * self.colors * self.bits_per_component + 7) / 8
    }

    /// Bytes per complete pixel, at least one
    pub(crate) fn bytes_per_pixel(&self) -> usize {
        ((self.colors * self.bits_per_component + 7) / 8).max(1)
    }
}

mod convert {
    use super::*;

    fn parameter(
        decode_parms: &Dictionary,
        key: &'static str,
        context: &Context,
        allowed: &[i64],
        default: i64,
    ) -> FilterResult<i64> {
        let value = match decode_parms.get(key) {
            None => return Ok(default),
            Some(value) => context.resolve(value),
        };
        let number = value.as_i64().ok_or_else(|| {
            FilterErr::new(
                stringify!(Predictor),
                FilterErrorCode::ValueType(key, value.kind()),
            )
        })?;
        if allowed.is_empty() && number > 0 || allowed.contains(&number) {
            Ok(number)
        } else {
            Err(FilterErr::new(
                stringify!(Predictor),
                FilterErrorCode::UnsupportedParameter(key, number),
            ))
        }
    }

    impl Predictor {
        pub(in crate::process::filter) fn new(
            decode_parms: &Dictionary,
            context: &Context,
        ) -> FilterResult<Self> {
            let predictor = match decode_parms.lookup_maybe(KEY_PREDICTOR, context, &[ObjectKind::Number]) {
                None => return Ok(Self::None),
                Some(value) => value.as_i64().unwrap_or(-1),
            };
            let algorithm = match predictor {
                1 => return Ok(Self::None),
                10 => PngAlgorithm::None,
                11 => PngAlgorithm::Sub,
                12 => PngAlgorithm::Up,
                13 => PngAlgorithm::Average,
                14 => PngAlgorithm::Paeth,
                15 => PngAlgorithm::Optimum,
                // TIFF predictor 2 is not supported
                _ => {
                    return Err(FilterErr::new(
                        stringify!(Predictor),
                        FilterErrorCode::UnsupportedParameter(KEY_PREDICTOR, predictor),
                    ))
                }
            };
            let parms = PredictorParms {
                bits_per_component: parameter(
                    decode_parms,
                    KEY_BITS_PER_COMPONENT,
                    context,
                    &[1, 2, 4, 8, 16],
                    8,
                )? as usize,
                colors: parameter(decode_parms, KEY_COLORS, context, &[], 1)? as usize,
                columns: parameter(decode_parms, KEY_COLUMNS, context, &[], 1)? as usize,
            };
            Ok(Self::Png(Png::new(algorithm, parms)))
        }
    }
}
