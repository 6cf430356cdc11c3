//! A document-level surface over a [`Context`]: creation, loading, saving,
//! pages, content streams, fonts and images.

mod content;
mod font;
mod image;
mod page;

pub use self::content::Color;
pub use self::content::ContentStream;
pub use self::content::Paint;
pub use self::font::EmbedFontOptions;
pub use self::font::FontMetrics;
pub use self::font::FontProgram;
pub use self::font::FontRef;
pub use self::font::Glyph;
pub use self::image::ImageRef;
pub use self::page::PageRef;

use ::log::debug;

use self::font::EmbeddedFont;
use self::image::Format;
use self::image::JpegFrame;
use self::image::PngImage;
use self::page::KEY_COUNT;
use self::page::KEY_PAGES;
use self::page::TYPE_PAGES;
use crate::context::Context;
use crate::error::PdfError;
use crate::error::PdfResult;
use crate::form::AcroForm;
use crate::object::dictionary::KEY_KIDS;
use crate::object::dictionary::KEY_TYPE;
use crate::object::Array;
use crate::object::Dictionary;
use crate::object::HexString;
use crate::object::Name;
use crate::object::Object;
use crate::object::PdfString;
use crate::object::Reference;
use crate::parse::document::TYPE_CATALOG;
use crate::parse::DocumentParser;
use crate::parse::ParseOptions;
use crate::write::PdfWriter;
use crate::write::WriteOptions;
use crate::Byte;

const KEY_PRODUCER: &str = "Producer";
const PRODUCER: &str = concat!("pdfdoc ", env!("CARGO_PKG_VERSION"));

#[derive(Debug)]
pub struct Document {
    context: Context,
    fonts: Vec<EmbeddedFont>,
    image_count: usize,
}

impl Document {
    /// An empty document: a catalog, an empty page tree and an information
    /// dictionary
    pub fn create() -> Self {
        let mut context = Context::new();
        let pages = context.register(Dictionary::from_iter([
            (KEY_TYPE, Object::from(TYPE_PAGES)),
            (KEY_KIDS, Array::new().into()),
            (KEY_COUNT, 0.into()),
        ]));
        let catalog = context.register(Dictionary::from_iter([
            (KEY_TYPE, Object::from(TYPE_CATALOG)),
            (KEY_PAGES, pages.into()),
        ]));
        let info = context.register(Dictionary::from_iter([(
            KEY_PRODUCER,
            PdfString::from_text(PRODUCER),
        )]));
        context.trailer_info.root = Some(catalog);
        context.trailer_info.info = Some(info);
        Self::from_context(context)
    }

    pub fn load(buffer: &[Byte], options: ParseOptions) -> PdfResult<Self> {
        let context = DocumentParser::new(buffer, options).parse()?;
        debug!("Loaded {} objects", context.object_count());
        Ok(Self::from_context(context))
    }

    pub fn from_context(context: Context) -> Self {
        Self {
            context,
            fonts: Vec::new(),
            image_count: 0,
        }
    }

    pub fn context(&self) -> &Context {
        &self.context
    }

    pub fn context_mut(&mut self) -> &mut Context {
        &mut self.context
    }

    pub fn into_context(self) -> Context {
        self.context
    }

    /// Completes the embedded fonts and serializes the document
    pub fn save(&mut self, options: WriteOptions) -> PdfResult<Vec<Byte>> {
        for font in self.fonts.iter() {
            font.finish(&mut self.context)?;
        }
        PdfWriter::new(&self.context, options).write()
    }

    /// The interactive form, if the catalog names one
    pub fn form(&self) -> PdfResult<Option<AcroForm>> {
        AcroForm::from_context(&self.context)
    }

    /// The interactive form, created when missing
    pub fn form_or_create(&mut self) -> PdfResult<AcroForm> {
        match AcroForm::from_context(&self.context)? {
            Some(form) => Ok(form),
            None => AcroForm::create(&mut self.context),
        }
    }

    /// Embeds a TrueType program as a Type0 font with Identity-H encoding
    ///
    /// REFERENCE: [9.7 Composite fonts, p270-280]
    pub fn embed_font(&mut self, program: FontProgram, options: EmbedFontOptions) -> PdfResult<FontRef> {
        let index = self.fonts.len() + 1;
        let font = EmbeddedFont::embed(&mut self.context, program, options, index)?;
        let font_ref = font.font().clone();
        self.fonts.push(font);
        Ok(font_ref)
    }

    fn embedded_font(&mut self, font: &FontRef) -> PdfResult<&mut EmbeddedFont> {
        self.fonts
            .iter_mut()
            .find(|embedded| embedded.font() == font)
            .ok_or_else(|| PdfError::Structure(format!("Font {} is not embedded in this document", font.name())))
    }

    /// The glyph codes of `text` for [`ContentStream::draw_text`]. The glyphs
    /// are remembered for the font's widths and ToUnicode CMap.
    pub fn encode_text(&mut self, font: &FontRef, text: &str) -> PdfResult<HexString> {
        Ok(self.embedded_font(font)?.encode(text))
    }

    /// The advance of `text` in text space units at `size`
    pub fn width_of_text(&mut self, font: &FontRef, text: &str, size: f64) -> PdfResult<f64> {
        Ok(self.embedded_font(font)?.width_of_text(text, size))
    }

    /// Embeds JPEG bytes as a `DCTDecode` image XObject. Other formats fail
    /// with [`PdfError::UnsupportedImage`].
    pub fn embed_jpeg(&mut self, bytes: &[Byte]) -> PdfResult<ImageRef> {
        let frame = JpegFrame::read(bytes)?;
        let reference = self.context.register(frame.xobject(bytes)?);
        Ok(self.image_ref(
            reference,
            u32::from(frame.width),
            u32::from(frame.height),
        ))
    }

    /// Embeds a PNG as a deflated image XObject of 8-bit samples. Transparency
    /// becomes a soft mask.
    pub fn embed_png(&mut self, bytes: &[Byte]) -> PdfResult<ImageRef> {
        let png = PngImage::read(bytes)?;
        let soft_mask = png
            .soft_mask()
            .map(|soft_mask| self.context.register(soft_mask));
        let reference = self.context.register(png.xobject(soft_mask));
        debug!(
            "Embedded a {}x{} PNG as {}{}",
            png.width,
            png.height,
            reference,
            if soft_mask.is_some() { " with a soft mask" } else { "" }
        );
        Ok(self.image_ref(reference, png.width, png.height))
    }

    /// Embeds a JPEG or a PNG, told apart by their leading bytes
    pub fn embed_image(&mut self, bytes: &[Byte]) -> PdfResult<ImageRef> {
        match Format::sniff(bytes) {
            Some(Format::Jpeg) => self.embed_jpeg(bytes),
            Some(Format::Png) => self.embed_png(bytes),
            None => Err(PdfError::UnsupportedImage(
                "Neither a JPEG nor a PNG".to_string(),
            )),
        }
    }

    fn image_ref(&mut self, reference: Reference, width: u32, height: u32) -> ImageRef {
        self.image_count += 1;
        let name = Name::from(format!("Im{}", self.image_count));
        ImageRef::new(reference, name, width, height)
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::create()
    }
}
