use ::image::ColorType;
use ::image::ImageFormat;

use crate::error::PdfError;
use crate::error::PdfResult;
use crate::object::dictionary::KEY_FILTER;
use crate::object::dictionary::KEY_SUBTYPE;
use crate::object::dictionary::KEY_TYPE;
use crate::object::Array;
use crate::object::Dictionary;
use crate::object::Name;
use crate::object::Object;
use crate::object::Reference;
use crate::object::Stream;
use crate::Byte;

const SOI: [Byte; 2] = [0xFF, 0xD8];
const PNG_SIGNATURE: [Byte; 8] = [0x89, b'P', b'N', b'G', b'\r', b'\n', 0x1A, b'\n'];
/// Start-of-frame markers of every coding process. `C4`, `C8` and `CC` share
/// the range but are not frames.
const SOF_MARKERS: [Byte; 13] = [
    0xC0, 0xC1, 0xC2, 0xC3, 0xC5, 0xC6, 0xC7, 0xC9, 0xCA, 0xCB, 0xCD, 0xCE, 0xCF,
];

/// An image XObject and the resource name content streams draw it by
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRef {
    reference: Reference,
    name: Name,
    width: u32,
    height: u32,
}

impl ImageRef {
    pub(crate) fn new(reference: Reference, name: Name, width: u32, height: u32) -> Self {
        Self {
            reference,
            name,
            width,
            height,
        }
    }

    pub fn reference(&self) -> Reference {
        self.reference
    }

    pub fn name(&self) -> &Name {
        &self.name
    }

    /// In pixels
    pub fn width(&self) -> u32 {
        self.width
    }

    /// In pixels
    pub fn height(&self) -> u32 {
        self.height
    }
}

/// The formats [`Document::embed_image`](crate::Document::embed_image)
/// recognises by their leading bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Format {
    Jpeg,
    Png,
}

impl Format {
    pub(crate) fn sniff(bytes: &[Byte]) -> Option<Self> {
        if bytes.starts_with(&SOI) {
            Some(Self::Jpeg)
        } else if bytes.starts_with(&PNG_SIGNATURE) {
            Some(Self::Png)
        } else {
            None
        }
    }
}

/// The frame header of a baseline or progressive JPEG
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct JpegFrame {
    pub(crate) bits_per_component: u8,
    pub(crate) height: u16,
    pub(crate) width: u16,
    pub(crate) components: u8,
}

impl JpegFrame {
    /// Walks the marker segments up to the first start-of-frame
    pub(crate) fn read(bytes: &[Byte]) -> PdfResult<Self> {
        if bytes.starts_with(&PNG_SIGNATURE) {
            return Err(PdfError::UnsupportedImage("PNG".to_string()));
        }
        if !bytes.starts_with(&SOI) {
            return Err(PdfError::UnsupportedImage(
                "Missing JPEG start-of-image marker".to_string(),
            ));
        }
        let truncated = || PdfError::UnsupportedImage("Truncated JPEG".to_string());
        let mut position = SOI.len();
        loop {
            let (&prefix, &marker) = bytes
                .get(position)
                .zip(bytes.get(position + 1))
                .ok_or_else(truncated)?;
            if prefix != 0xFF {
                return Err(PdfError::UnsupportedImage(format!(
                    "Invalid JPEG marker at offset {}",
                    position
                )));
            }
            // Fill bytes
            if marker == 0xFF {
                position += 1;
                continue;
            }
            position += 2;
            let segment = bytes.get(position..position + 2).ok_or_else(truncated)?;
            let length = usize::from(u16::from_be_bytes([segment[0], segment[1]]));
            if SOF_MARKERS.contains(&marker) {
                let frame = bytes.get(position..position + 8).ok_or_else(truncated)?;
                return Ok(Self {
                    bits_per_component: frame[2],
                    height: u16::from_be_bytes([frame[3], frame[4]]),
                    width: u16::from_be_bytes([frame[5], frame[6]]),
                    components: frame[7],
                });
            }
            position += length;
        }
    }

    /// REFERENCE: [8.6.4 Device colour spaces, p147-149]
    fn color_space(&self) -> PdfResult<&'static str> {
        match self.components {
            1 => Ok("DeviceGray"),
            3 => Ok("DeviceRGB"),
            4 => Ok("DeviceCMYK"),
            components => Err(PdfError::UnsupportedImage(format!(
                "JPEG with {} components",
                components
            ))),
        }
    }

    /// The image XObject holding the JPEG unchanged
    ///
    /// REFERENCE: [8.9.5 Image dictionaries, p203-209]
    pub(crate) fn xobject(&self, bytes: &[Byte]) -> PdfResult<Stream> {
        let mut dictionary = Dictionary::from_iter([
            (KEY_TYPE, Object::from("XObject")),
            (KEY_SUBTYPE, "Image".into()),
            ("Width", u32::from(self.width).into()),
            ("Height", u32::from(self.height).into()),
            ("BitsPerComponent", u32::from(self.bits_per_component).into()),
            ("ColorSpace", self.color_space()?.into()),
            (KEY_FILTER, "DCTDecode".into()),
        ]);
        // Adobe CMYK JPEGs store inverted components
        if self.components == 4 {
            dictionary.set("Decode", Array::from_iter([1, 0, 1, 0, 1, 0, 1, 0]));
        }
        Ok(Stream::raw(dictionary, bytes))
    }
}

/// A PNG decoded to 8-bit samples, with the alpha channel split off
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct PngImage {
    pub(crate) width: u32,
    pub(crate) height: u32,
    gray: bool,
    samples: Vec<Byte>,
    alpha: Option<Vec<Byte>>,
}

impl PngImage {
    /// Decodes every PNG colour type and bit depth. An alpha channel that is
    /// opaque throughout is dropped.
    pub(crate) fn read(bytes: &[Byte]) -> PdfResult<Self> {
        if !bytes.starts_with(&PNG_SIGNATURE) {
            return Err(PdfError::UnsupportedImage(
                "Missing PNG signature".to_string(),
            ));
        }
        let image = ::image::load_from_memory_with_format(bytes, ImageFormat::Png)
            .map_err(|err| PdfError::UnsupportedImage(format!("PNG. {}", err)))?;
        let color: ColorType = image.color();
        let gray = !color.has_color();
        let (samples, alpha) = match (gray, color.has_alpha()) {
            (true, false) => (image.to_luma8().into_raw(), None),
            (false, false) => (image.to_rgb8().into_raw(), None),
            (true, true) => split_alpha(image.to_luma_alpha8().into_raw(), 2),
            (false, true) => split_alpha(image.to_rgba8().into_raw(), 4),
        };
        Ok(Self {
            width: image.width(),
            height: image.height(),
            gray,
            samples,
            alpha: alpha.filter(|alpha| alpha.iter().any(|&value| value != u8::MAX)),
        })
    }

    fn dictionary(&self, color_space: &str) -> Dictionary {
        Dictionary::from_iter([
            (KEY_TYPE, Object::from("XObject")),
            (KEY_SUBTYPE, "Image".into()),
            ("Width", self.width.into()),
            ("Height", self.height.into()),
            ("BitsPerComponent", 8.into()),
            ("ColorSpace", color_space.into()),
        ])
    }

    /// REFERENCE: [11.6.5.3 Soft-mask images, p347-348]
    /// The alpha channel as a `DeviceGray` image, if any
    pub(crate) fn soft_mask(&self) -> Option<Stream> {
        let alpha = self.alpha.as_ref()?;
        Some(Stream::flate(
            self.dictionary("DeviceGray"),
            alpha.as_slice(),
            true,
        ))
    }

    /// The colour samples as a deflated image XObject. `soft_mask` is the
    /// stream [`PngImage::soft_mask`] was registered under.
    ///
    /// REFERENCE: [8.9.5 Image dictionaries, p203-209]
    pub(crate) fn xobject(&self, soft_mask: Option<Reference>) -> Stream {
        let color_space = if self.gray { "DeviceGray" } else { "DeviceRGB" };
        let mut dictionary = self.dictionary(color_space);
        if let Some(soft_mask) = soft_mask {
            dictionary.set("SMask", soft_mask);
        }
        Stream::flate(dictionary, self.samples.as_slice(), true)
    }
}

/// Separates interleaved samples whose last channel is alpha
fn split_alpha(interleaved: Vec<Byte>, channels: usize) -> (Vec<Byte>, Option<Vec<Byte>>) {
    let pixels = interleaved.len() / channels;
    let mut samples = Vec::with_capacity(pixels * (channels - 1));
    let mut alpha = Vec::with_capacity(pixels);
    for pixel in interleaved.chunks_exact(channels) {
        samples.extend_from_slice(&pixel[..channels - 1]);
        alpha.push(pixel[channels - 1]);
    }
    (samples, Some(alpha))
}
