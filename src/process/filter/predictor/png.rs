use self::error::PngErrorCode;
use super::PredictorParms;
use crate::process::filter::error::FilterResult;
use crate::process::filter::Filter;
use crate::Byte;

/// REFERENCE:
/// - [7.4.4.4 LZW and Flate predictor functions, p41]
/// - [[https://www.w3.org/TR/PNG-Filters.html]]
/// The World Wide Web Consortium’s Portable Network Graphics filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Png {
    algorithm: PngAlgorithm,
    parms: PredictorParms,
}

/// REFERENCE: [Table 10 — Predictor values. p42]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PngAlgorithm {
    None,
    Sub,
    Up,
    Average,
    Paeth,
    /// Each row carries its own algorithm tag
    Optimum,
}

impl Filter for Png {
    fn filter(&self, bytes: impl Into<Vec<Byte>> + AsRef<[Byte]>) -> FilterResult<Vec<Byte>> {
        let bytes = bytes.as_ref();
        let bytes_per_row = self.parms.bytes_per_row();
        let bytes_per_pixel = self.parms.bytes_per_pixel();

        let rows = bytes.chunks_exact(bytes_per_row);
        if !rows.remainder().is_empty() {
            return Err(PngErrorCode::NumBytes(bytes.len(), bytes_per_row).into());
        }
        // The optimum predictor may pick any algorithm per row; Paeth is
        // a good general choice
        let algorithm = match self.algorithm {
            PngAlgorithm::Optimum => PngAlgorithm::Paeth,
            algorithm => algorithm,
        };

        let mut filtered = Vec::with_capacity(bytes.len() + bytes.len() / bytes_per_row.max(1));
        let mut prior = vec![0; bytes_per_row];
        for row in rows {
            filtered.push(algorithm.tag());
            for x in 0..row.len() {
                let left = if x >= bytes_per_pixel { row[x - bytes_per_pixel] } else { 0 };
                let up = prior[x];
                let up_left = if x >= bytes_per_pixel { prior[x - bytes_per_pixel] } else { 0 };
                filtered.push(row[x].wrapping_sub(algorithm.predict(left, up, up_left)));
            }
            prior.copy_from_slice(row);
        }
        Ok(filtered)
    }

    fn defilter(&self, bytes: impl Into<Vec<Byte>> + AsRef<[Byte]>) -> FilterResult<Vec<Byte>> {
        let bytes = bytes.as_ref();
        let bytes_per_row = self.parms.bytes_per_row();
        let bytes_per_pixel = self.parms.bytes_per_pixel();
        // The row length in the filtered data includes the algorithm tag
        let encoded_bytes_per_row = bytes_per_row + 1;

        let rows = bytes.chunks_exact(encoded_bytes_per_row);
        if !rows.remainder().is_empty() {
            return Err(PngErrorCode::EncodedNumBytes(bytes.len(), encoded_bytes_per_row).into());
        }

        let mut defiltered = Vec::with_capacity(bytes.len());
        let mut prior = vec![0; bytes_per_row];
        let mut row = vec![0; bytes_per_row];
        for encoded in rows {
            // REFERENCE: [7.4.4.4 LZW and Flate predictor functions, p42]
            // The tag of each row takes precedence over the predictor value
            let algorithm = PngAlgorithm::try_from(encoded[0])?;
            for x in 0..bytes_per_row {
                let left = if x >= bytes_per_pixel { row[x - bytes_per_pixel] } else { 0 };
                let up = prior[x];
                let up_left = if x >= bytes_per_pixel { prior[x - bytes_per_pixel] } else { 0 };
                row[x] = encoded[x + 1].wrapping_add(algorithm.predict(left, up, up_left));
            }
            defiltered.extend_from_slice(&row);
            prior.copy_from_slice(&row);
        }
        Ok(defiltered)
    }
}

mod process {
    use super::*;

    impl PngAlgorithm {
        /// REFERENCE: [[https://www.w3.org/TR/PNG-Filters.html] 6. Filter
        /// Algorithms]
        pub(super) fn predict(&self, left: Byte, up: Byte, up_left: Byte) -> Byte {
            match self {
                Self::None | Self::Optimum => 0,
                Self::Sub => left,
                Self::Up => up,
                Self::Average => ((u16::from(left) + u16::from(up)) / 2) as Byte,
                Self::Paeth => paeth_predictor(left, up, up_left),
            }
        }
    }

    /// REFERENCE: [[https://www.w3.org/TR/PNG-Filters.html] 6.6. Filter type
    /// 4: Paeth]
    fn paeth_predictor(left: Byte, up: Byte, up_left: Byte) -> Byte {
        let p = i16::from(left) + i16::from(up) - i16::from(up_left);
        let p_left = (p - i16::from(left)).abs();
        let p_up = (p - i16::from(up)).abs();
        let p_up_left = (p - i16::from(up_left)).abs();
        if p_left <= p_up && p_left <= p_up_left {
            left
        } else if p_up <= p_up_left {
            up
        } else {
            up_left
        }
    }
}

mod convert {
    use super::*;

    impl Png {
        pub(in crate::process::filter::predictor) fn new(
            algorithm: PngAlgorithm,
            parms: PredictorParms,
        ) -> Self {
            Self { algorithm, parms }
        }
    }

    impl PngAlgorithm {
        pub(super) fn tag(&self) -> Byte {
            match self {
                Self::None | Self::Optimum => 0,
                Self::Sub => 1,
                Self::Up => 2,
                Self::Average => 3,
                Self::Paeth => 4,
            }
        }
    }

    impl TryFrom<Byte> for PngAlgorithm {
        type Error = PngErrorCode;

        fn try_from(value: Byte) -> Result<Self, Self::Error> {
            match value {
                0 => Ok(Self::None),
                1 => Ok(Self::Sub),
                2 => Ok(Self::Up),
                3 => Ok(Self::Average),
                4 => Ok(Self::Paeth),
                _ => Err(PngErrorCode::Unsupported(value)),
            }
        }
    }
}

pub(in crate::process) mod error {
    use ::thiserror::Error;

    use crate::Byte;

    #[derive(Debug, Error, PartialEq, Clone)]
    pub enum PngErrorCode {
        #[error("Unsupported PNG filter. Type: {0}")]
        Unsupported(Byte),
        #[error("Number of bytes: {0} is not a multiple of {1} bytes per encoded row")]
        EncodedNumBytes(usize, usize),
        #[error("Number of bytes: {0} is not a multiple of {1} bytes per row")]
        NumBytes(usize, usize),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assert_err_eq;
    use crate::process::filter::tests::random_bytes;

    fn parms(colors: usize, columns: usize) -> PredictorParms {
        PredictorParms {
            bits_per_component: 8,
            colors,
            columns,
        }
    }

    #[test]
    fn png_valid() {
        // Cross-reference stream rows with /Columns 4 and the Up predictor
        let png = Png::new(PngAlgorithm::Up, parms(1, 4));
        let filtered = b"\x02\x01\x00\x10\x00\x02\x00\x00\x05\x00";
        let defiltered = png.defilter(filtered.as_slice()).unwrap();
        assert_eq!(defiltered, b"\x01\x00\x10\x00\x01\x00\x15\x00");
        assert_eq!(png.filter(defiltered).unwrap(), filtered);

        let input = random_bytes(3 * 64 * 16, 13);
        for algorithm in [
            PngAlgorithm::None,
            PngAlgorithm::Sub,
            PngAlgorithm::Up,
            PngAlgorithm::Average,
            PngAlgorithm::Paeth,
            PngAlgorithm::Optimum,
        ] {
            let png = Png::new(algorithm, parms(3, 64));
            let filtered = png.filter(input.as_slice()).unwrap();
            assert_eq!(png.defilter(filtered).unwrap(), input);
        }
    }

    #[test]
    fn png_invalid() {
        let png = Png::new(PngAlgorithm::Up, parms(1, 4));
        assert_err_eq!(
            png.defilter(b"\x02\x01\x00".as_slice()),
            PngErrorCode::EncodedNumBytes(3, 5)
        );
        assert_err_eq!(
            png.defilter(b"\x07\x01\x00\x00\x00".as_slice()),
            PngErrorCode::Unsupported(7)
        );
        assert_err_eq!(
            png.filter(b"\x01\x02\x03".as_slice()),
            PngErrorCode::NumBytes(3, 4)
        );
    }
}
