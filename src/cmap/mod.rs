//! ToUnicode CMaps for embedded fonts.
//!
//! REFERENCE: [9.10.3 ToUnicode CMaps, p293-295]

pub mod error;

use self::error::CMapErr;

/// REFERENCE: [Adobe Technical Note #5411, 1.4 bfchar] A `beginbfchar`
/// block holds at most 100 mappings.
const BF_CHAR_LIMIT: usize = 100;
const BMP_MAX: u32 = 0xFFFF;
const SUPPLEMENTARY_MIN: u32 = 0x1_0000;
const SUPPLEMENTARY_MAX: u32 = 0x10_FFFF;
const HIGH_SURROGATE: u32 = 0xD800;
const LOW_SURROGATE: u32 = 0xDC00;

const PROLOGUE: &str = "\
/CIDInit /ProcSet findresource begin
12 dict begin
begincmap
/CIDSystemInfo <<
  /Registry (Adobe)
  /Ordering (UCS)
  /Supplement 0
>> def
/CMapName /Adobe-Identity-UCS def
/CMapType 2 def
1 begincodespacerange
<0000><ffff>
endcodespacerange
";

const EPILOGUE: &str = "\
endcmap
CMapName currentdict /CMap defineresource pop
end
end";

/// The Unicode code points a glyph stands for, usually one
pub trait CodePoints {
    fn code_points(&self) -> &[u32];
}

impl<T: CodePoints> CodePoints for &T {
    fn code_points(&self) -> &[u32] {
        (**self).code_points()
    }
}

/// Builds the ToUnicode CMap program mapping each glyph id to the UTF-16BE
/// encoding of its code points.
///
/// Glyphs are ordered by id and repeated ids are dropped before the program
/// is written, so the output depends only on the set of glyphs.
pub fn create_cmap<G, F>(glyphs: &[G], glyph_id: F) -> Result<String, CMapErr>
where
    G: CodePoints,
    F: Fn(&G) -> u32,
{
    let mut entries = glyphs
        .iter()
        .map(|glyph| (glyph_id(glyph), glyph.code_points()))
        .collect::<Vec<_>>();
    entries.sort();
    entries.dedup_by_key(|entry| entry.0);

    let bf_chars = entries
        .into_iter()
        .map(|(id, code_points)| -> Result<String, CMapErr> {
            let unicode = code_points
                .iter()
                .map(|&code_point| utf16_hex(code_point))
                .collect::<Result<String, _>>()?;
            Ok(format!("<{}> <{}>", hex(id), unicode))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let mut cmap = String::from(PROLOGUE);
    for block in bf_chars.chunks(BF_CHAR_LIMIT) {
        cmap.push_str(&format!("{} beginbfchar\n", block.len()));
        cmap.push_str(&block.join("\n"));
        cmap.push_str("\nendbfchar\n");
    }
    cmap.push_str(EPILOGUE);
    Ok(cmap)
}

fn hex(value: u32) -> String {
    format!("{:04X}", value)
}

/// Code points beyond the BMP become a surrogate pair
fn utf16_hex(code_point: u32) -> Result<String, CMapErr> {
    match code_point {
        0..=BMP_MAX => Ok(hex(code_point)),
        SUPPLEMENTARY_MIN..=SUPPLEMENTARY_MAX => {
            let offset = code_point - SUPPLEMENTARY_MIN;
            Ok(format!(
                "{}{}",
                hex(HIGH_SURROGATE + (offset >> 10)),
                hex(LOW_SURROGATE + (offset & 0x3FF))
            ))
        }
        _ => Err(CMapErr::InvalidCodePoint(code_point)),
    }
}
