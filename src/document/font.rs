use ::log::debug;
use ::std::collections::BTreeSet;
use ::std::collections::HashMap;

use crate::cmap::create_cmap;
use crate::cmap::CodePoints;
use crate::context::Context;
use crate::error::PdfResult;
use crate::object::dictionary::KEY_SUBTYPE;
use crate::object::dictionary::KEY_TYPE;
use crate::object::Array;
use crate::object::Dictionary;
use crate::object::HexString;
use crate::object::Name;
use crate::object::Object;
use crate::object::ObjectErr;
use crate::object::PdfString;
use crate::object::Reference;
use crate::object::Stream;
use crate::Byte;

const KEY_BASE_FONT: &str = "BaseFont";
const KEY_DESCENDANT_FONTS: &str = "DescendantFonts";
const KEY_TO_UNICODE: &str = "ToUnicode";
const KEY_FONT_DESCRIPTOR: &str = "FontDescriptor";
const KEY_FONT_FILE2: &str = "FontFile2";
const KEY_W: &str = "W";
/// The glyph space of the `W` array is 1000 units per em
const GLYPH_SPACE: f64 = 1000.0;
/// REFERENCE: [9.8.2 Font descriptor flags, p283] Symbolic
const FLAG_SYMBOLIC: u32 = 1 << 2;

/// A glyph of an embedded font program, as reported by the caller's font
/// parser
#[derive(Debug, Clone, PartialEq)]
pub struct Glyph {
    pub id: u16,
    pub code_points: Vec<u32>,
    /// In font units
    pub advance_width: f64,
}

impl CodePoints for Glyph {
    fn code_points(&self) -> &[u32] {
        &self.code_points
    }
}

/// REFERENCE: [9.8 Font descriptors, p281-285]
#[derive(Debug, Clone, PartialEq)]
pub struct FontMetrics {
    pub units_per_em: f64,
    pub ascent: f64,
    pub descent: f64,
    pub cap_height: f64,
    pub italic_angle: f64,
    /// `[llx lly urx ury]` in font units
    pub bbox: [f64; 4],
    pub flags: u32,
}

impl Default for FontMetrics {
    fn default() -> Self {
        Self {
            units_per_em: GLYPH_SPACE,
            ascent: 0.0,
            descent: 0.0,
            cap_height: 0.0,
            italic_angle: 0.0,
            bbox: [0.0; 4],
            flags: FLAG_SYMBOLIC,
        }
    }
}

/// A TrueType font program together with what a font parser extracted from
/// it
#[derive(Debug, Clone, PartialEq)]
pub struct FontProgram {
    pub postscript_name: String,
    pub data: Vec<Byte>,
    pub glyphs: Vec<Glyph>,
    pub metrics: FontMetrics,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EmbedFontOptions {
    /// Describe only the glyphs text was encoded with. The base font name is
    /// tagged as a subset.
    pub subset: bool,
}

/// An embedded font and the resource name content streams select it by
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FontRef {
    reference: Reference,
    name: Name,
}

impl FontRef {
    pub(crate) fn new(reference: Reference, name: Name) -> Self {
        Self { reference, name }
    }

    /// The Type0 font dictionary
    pub fn reference(&self) -> Reference {
        self.reference
    }

    pub fn name(&self) -> &Name {
        &self.name
    }
}

/// A Type0 font whose widths and ToUnicode CMap are written once the glyphs
/// in use are known
///
/// REFERENCE: [9.7.6 Type 0 font dictionaries, p279-280]
#[derive(Debug)]
pub(crate) struct EmbeddedFont {
    font: FontRef,
    program: FontProgram,
    options: EmbedFontOptions,
    cid_font: Reference,
    to_unicode: Reference,
    by_code_point: HashMap<u32, usize>,
    used: BTreeSet<u16>,
}

/// Six upper-case letters unique to the font's position in the document
///
/// REFERENCE: [9.6.4 Font subsets, p268]
fn subset_tag(index: usize) -> String {
    let mut remaining = index;
    let mut tag = vec![b'A'; 6];
    for letter in tag.iter_mut().rev() {
        *letter += (remaining % 26) as u8;
        remaining /= 26;
    }
    String::from_utf8_lossy(&tag).into_owned()
}

impl EmbeddedFont {
    /// Registers the font dictionaries. `index` numbers the fonts of the
    /// document from 1.
    pub(crate) fn embed(
        context: &mut Context,
        program: FontProgram,
        options: EmbedFontOptions,
        index: usize,
    ) -> PdfResult<Self> {
        let metrics = &program.metrics;
        if !(metrics.units_per_em > 0.0) {
            return Err(ObjectErr::InvalidValue("UnitsPerEm", metrics.units_per_em.to_string()).into());
        }
        let base_font = if options.subset {
            format!("{}+{}", subset_tag(index), program.postscript_name)
        } else {
            program.postscript_name.clone()
        };
        let base_font = Name::from(base_font);
        let scale = GLYPH_SPACE / metrics.units_per_em;

        let font_file = context.register(Stream::flate(
            Dictionary::from_iter([("Length1", program.data.len())]),
            program.data.clone(),
            true,
        ));
        let descriptor = context.register(Dictionary::from_iter([
            (KEY_TYPE, Object::from("FontDescriptor")),
            ("FontName", base_font.clone().into()),
            ("Flags", metrics.flags.into()),
            (
                "FontBBox",
                Array::from_iter(metrics.bbox.map(|value| value * scale)).into(),
            ),
            ("ItalicAngle", metrics.italic_angle.into()),
            ("Ascent", (metrics.ascent * scale).into()),
            ("Descent", (metrics.descent * scale).into()),
            ("CapHeight", (metrics.cap_height * scale).into()),
            ("StemV", 0.into()),
            (KEY_FONT_FILE2, font_file.into()),
        ]));
        let cid_font = context.register(Dictionary::from_iter([
            (KEY_TYPE, Object::from("Font")),
            (KEY_SUBTYPE, "CIDFontType2".into()),
            (KEY_BASE_FONT, base_font.clone().into()),
            (
                "CIDSystemInfo",
                Dictionary::from_iter([
                    ("Registry", Object::from(PdfString::from_text("Adobe"))),
                    ("Ordering", PdfString::from_text("Identity").into()),
                    ("Supplement", 0.into()),
                ])
                .into(),
            ),
            (KEY_FONT_DESCRIPTOR, descriptor.into()),
            (KEY_W, Array::new().into()),
            ("CIDToGIDMap", "Identity".into()),
        ]));
        let to_unicode = context.register(Stream::flate(Dictionary::new(), Vec::new(), true));
        let reference = context.register(Dictionary::from_iter([
            (KEY_TYPE, Object::from("Font")),
            (KEY_SUBTYPE, "Type0".into()),
            (KEY_BASE_FONT, base_font.into()),
            ("Encoding", "Identity-H".into()),
            (KEY_DESCENDANT_FONTS, Array::from_iter([cid_font]).into()),
            (KEY_TO_UNICODE, to_unicode.into()),
        ]));

        let mut by_code_point = HashMap::new();
        for (position, glyph) in program.glyphs.iter().enumerate() {
            if let [code_point] = glyph.code_points[..] {
                by_code_point.entry(code_point).or_insert(position);
            }
        }
        let name = Name::from(format!("F{}", index));
        Ok(Self {
            font: FontRef::new(reference, name),
            program,
            options,
            cid_font,
            to_unicode,
            by_code_point,
            used: BTreeSet::new(),
        })
    }

    pub(crate) fn font(&self) -> &FontRef {
        &self.font
    }

    /// Two-byte glyph ids for `text`. Characters the font lacks map to the
    /// `.notdef` glyph 0.
    pub(crate) fn encode(&mut self, text: &str) -> HexString {
        let mut bytes = Vec::with_capacity(text.len() * 2);
        for character in text.chars() {
            let id = match self.by_code_point.get(&u32::from(character)) {
                Some(&position) => self.program.glyphs[position].id,
                None => {
                    debug!(
                        "{} has no glyph for {:?}",
                        self.program.postscript_name, character
                    );
                    0
                }
            };
            self.used.insert(id);
            bytes.extend_from_slice(&id.to_be_bytes());
        }
        HexString::new(bytes)
    }

    /// The advance of `text` in text space units at `size`
    pub(crate) fn width_of_text(&self, text: &str, size: f64) -> f64 {
        let units = text
            .chars()
            .filter_map(|character| self.by_code_point.get(&u32::from(character)))
            .map(|&position| self.program.glyphs[position].advance_width)
            .sum::<f64>();
        units * size / self.program.metrics.units_per_em
    }

    /// The glyphs described by `W` and `ToUnicode`, by ascending id
    fn described_glyphs(&self) -> Vec<&Glyph> {
        let mut glyphs = self
            .program
            .glyphs
            .iter()
            .filter(|glyph| !self.options.subset || self.used.contains(&glyph.id))
            .collect::<Vec<_>>();
        glyphs.sort_by_key(|glyph| glyph.id);
        glyphs.dedup_by_key(|glyph| glyph.id);
        glyphs
    }

    /// REFERENCE: [9.7.4.3 Glyph metrics in CIDFonts, p275-276] Runs of
    /// consecutive ids share one `c [w1 w2 ...]` entry.
    fn widths(&self, glyphs: &[&Glyph]) -> Array {
        let scale = GLYPH_SPACE / self.program.metrics.units_per_em;
        let mut widths = Array::new();
        let mut run: Option<(u16, Array)> = None;
        for glyph in glyphs {
            let width = glyph.advance_width * scale;
            match run.as_mut() {
                Some((first, run_widths))
                    if usize::from(*first) + run_widths.len() == usize::from(glyph.id) =>
                {
                    run_widths.push(width);
                }
                _ => {
                    if let Some((first, run_widths)) = run.replace((glyph.id, Array::from_iter([width]))) {
                        widths.push(u32::from(first));
                        widths.push(run_widths);
                    }
                }
            }
        }
        if let Some((first, run_widths)) = run {
            widths.push(u32::from(first));
            widths.push(run_widths);
        }
        widths
    }

    /// Writes `W` and the `ToUnicode` stream for the glyphs in use so far
    pub(crate) fn finish(&self, context: &mut Context) -> PdfResult<()> {
        let glyphs = self.described_glyphs();
        let widths = self.widths(&glyphs);
        context.dictionary_mut(self.cid_font)?.set(KEY_W, widths);

        let mapped = glyphs
            .into_iter()
            .filter(|glyph| !glyph.code_points.is_empty())
            .collect::<Vec<_>>();
        let cmap = create_cmap(&mapped, |glyph| u32::from(glyph.id))?;
        context.assign(
            self.to_unicode,
            Stream::flate(Dictionary::new(), cmap.into_bytes(), true),
        );
        Ok(())
    }
}
