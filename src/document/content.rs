use ::indexmap::IndexMap;
use ::log::warn;

use super::font::FontRef;
use super::image::ImageRef;
use crate::object::HexString;
use crate::object::Name;
use crate::object::Object;
use crate::object::Reference;
use crate::write::serialize::Serializer;
use crate::Byte;

/// REFERENCE: [8.5.2.2 Cubic Bézier curves, p133] The control point offset,
/// relative to the radius, of a quarter ellipse drawn as one curve.
const KAPPA: f64 = 0.552_284_749_830_793_4;

/// REFERENCE: [8.6.8 Colour operators, p182-184]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Color {
    Gray(f64),
    Rgb(f64, f64, f64),
    Cmyk(f64, f64, f64, f64),
}

/// How a path is painted once constructed
///
/// REFERENCE: [8.5.3 Path-painting operators, p134-137]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Paint {
    #[default]
    Stroke,
    Fill,
    FillAndStroke,
}

impl Paint {
    fn operator(self) -> &'static str {
        match self {
            Self::Stroke => "S",
            Self::Fill => "f",
            Self::FillAndStroke => "B",
        }
    }
}

/// A page content stream built operator by operator.
///
/// Fonts and images drawn through the builder are recorded so that
/// [`Document::add_content`](super::Document::add_content) can list them in
/// the page resources.
///
/// REFERENCE: [8.2 Graphics objects, p111-114]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContentStream {
    bytes: Vec<Byte>,
    pub(crate) fonts: IndexMap<Name, Reference>,
    pub(crate) images: IndexMap<Name, Reference>,
}

impl ContentStream {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn as_bytes(&self) -> &[Byte] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<Byte> {
        self.bytes
    }

    /// Appends `operands operator` on a line of its own. Stream operands
    /// cannot appear in content and are dropped.
    pub fn push(&mut self, operator: &str, operands: impl IntoIterator<Item = Object>) -> &mut Self {
        let serializer = Serializer::new(false);
        for operand in operands {
            if let Err(err) = serializer.object(&mut self.bytes, &operand) {
                warn!("Dropped operand of {}: {}", operator, err);
                continue;
            }
            self.bytes.push(b' ');
        }
        self.bytes.extend_from_slice(operator.as_bytes());
        self.bytes.push(b'\n');
        self
    }

    fn numbers<const N: usize>(&mut self, operator: &str, operands: [f64; N]) -> &mut Self {
        self.push(operator, operands.into_iter().map(Object::from))
    }

    pub fn save_state(&mut self) -> &mut Self {
        self.push("q", [])
    }

    pub fn restore_state(&mut self) -> &mut Self {
        self.push("Q", [])
    }

    /// Concatenates `[a b c d e f]` to the current transformation matrix
    pub fn transform(&mut self, matrix: [f64; 6]) -> &mut Self {
        self.numbers("cm", matrix)
    }

    pub fn set_line_width(&mut self, width: f64) -> &mut Self {
        self.numbers("w", [width])
    }

    pub fn set_fill_color(&mut self, color: Color) -> &mut Self {
        match color {
            Color::Gray(gray) => self.numbers("g", [gray]),
            Color::Rgb(red, green, blue) => self.numbers("rg", [red, green, blue]),
            Color::Cmyk(cyan, magenta, yellow, key) => {
                self.numbers("k", [cyan, magenta, yellow, key])
            }
        }
    }

    pub fn set_stroke_color(&mut self, color: Color) -> &mut Self {
        match color {
            Color::Gray(gray) => self.numbers("G", [gray]),
            Color::Rgb(red, green, blue) => self.numbers("RG", [red, green, blue]),
            Color::Cmyk(cyan, magenta, yellow, key) => {
                self.numbers("K", [cyan, magenta, yellow, key])
            }
        }
    }

    pub fn move_to(&mut self, x: f64, y: f64) -> &mut Self {
        self.numbers("m", [x, y])
    }

    pub fn line_to(&mut self, x: f64, y: f64) -> &mut Self {
        self.numbers("l", [x, y])
    }

    pub fn curve_to(&mut self, control1: [f64; 2], control2: [f64; 2], end: [f64; 2]) -> &mut Self {
        self.numbers(
            "c",
            [control1[0], control1[1], control2[0], control2[1], end[0], end[1]],
        )
    }

    pub fn close_path(&mut self) -> &mut Self {
        self.push("h", [])
    }

    pub fn paint(&mut self, paint: Paint) -> &mut Self {
        self.push(paint.operator(), [])
    }

    pub fn draw_line(&mut self, from: [f64; 2], to: [f64; 2]) -> &mut Self {
        self.move_to(from[0], from[1])
            .line_to(to[0], to[1])
            .paint(Paint::Stroke)
    }

    /// `(x, y)` is the lower left corner
    pub fn draw_rectangle(&mut self, x: f64, y: f64, width: f64, height: f64, paint: Paint) -> &mut Self {
        self.numbers("re", [x, y, width, height]).paint(paint)
    }

    /// Four Bézier curves around `center`, one per quadrant, starting at the
    /// leftmost point
    pub fn draw_ellipse(&mut self, center: [f64; 2], x_radius: f64, y_radius: f64, paint: Paint) -> &mut Self {
        let [x, y] = center;
        let (ox, oy) = (x_radius * KAPPA, y_radius * KAPPA);
        let (left, right) = (x - x_radius, x + x_radius);
        let (bottom, top) = (y - y_radius, y + y_radius);
        self.move_to(left, y)
            .curve_to([left, y - oy], [x - ox, bottom], [x, bottom])
            .curve_to([x + ox, bottom], [right, y - oy], [right, y])
            .curve_to([right, y + oy], [x + ox, top], [x, top])
            .curve_to([x - ox, top], [left, y + oy], [left, y])
            .close_path()
            .paint(paint)
    }

    /// Shows glyph codes produced by
    /// [`Document::encode_text`](super::Document::encode_text) at `(x, y)`
    ///
    /// REFERENCE: [9.4 Text objects, p256-262]
    pub fn draw_text(&mut self, font: &FontRef, size: f64, position: [f64; 2], text: HexString) -> &mut Self {
        self.fonts.insert(font.name().clone(), font.reference());
        self.push("BT", [])
            .push("Tf", [Object::from(font.name().clone()), Object::from(size)])
            .numbers("Td", position)
            .push("Tj", [Object::from(text)])
            .push("ET", [])
    }

    /// Scales the unit square of the image to `width` by `height` with its
    /// lower left corner at `(x, y)`
    ///
    /// REFERENCE: [8.9.5 Image dictionaries, p203-209]
    pub fn draw_image(&mut self, image: &ImageRef, x: f64, y: f64, width: f64, height: f64) -> &mut Self {
        self.images.insert(image.name().clone(), image.reference());
        self.save_state()
            .transform([width, 0.0, 0.0, height, x, y])
            .push("Do", [Object::from(image.name().clone())])
            .restore_state()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(content: &ContentStream) -> String {
        String::from_utf8_lossy(content.as_bytes()).into_owned()
    }

    #[test]
    fn content_stream_path() {
        let mut content = ContentStream::new();
        content
            .set_line_width(2.5)
            .set_stroke_color(Color::Rgb(1.0, 0.0, 0.5))
            .set_fill_color(Color::Gray(0.0))
            .draw_line([0.0, 0.0], [100.0, 50.0])
            .draw_rectangle(10.0, 10.0, 20.0, 30.0, Paint::FillAndStroke);
        assert_eq!(
            text(&content),
            "2.5 w\n1 0 0.5 RG\n0 g\n0 0 m\n100 50 l\nS\n10 10 20 30 re\nB\n"
        );
    }

    #[test]
    fn content_stream_ellipse() {
        let mut content = ContentStream::new();
        content.draw_ellipse([0.0, 0.0], 1.0, 1.0, Paint::Fill);
        let content = text(&content);
        let lines = content.lines().collect::<Vec<_>>();
        assert_eq!(lines.len(), 7);
        assert_eq!(lines[0], "-1 0 m");
        assert!(lines[1..5].iter().all(|line| line.ends_with(" c")));
        assert!(lines[1].starts_with("-1 -0.5522847498"));
        assert!(lines[4].ends_with(" -1 0 c"));
        assert_eq!(&lines[5..], ["h", "f"]);
    }

    #[test]
    fn content_stream_resources() {
        let font = FontRef::new(Reference::new(4, 0), Name::from("F1"));
        let image = ImageRef::new(Reference::new(5, 0), Name::from("Im1"), 640, 480);
        let mut content = ContentStream::new();
        content
            .draw_text(&font, 12.0, [72.0, 720.0], HexString::new([0x00, 0x2B]))
            .draw_image(&image, 0.0, 0.0, 64.0, 48.0);
        assert_eq!(
            text(&content),
            "BT\n/F1 12 Tf\n72 720 Td\n<002B> Tj\nET\nq\n64 0 0 48 0 0 cm\n/Im1 Do\nQ\n"
        );
        assert_eq!(content.fonts.get(&Name::from("F1")), Some(&Reference::new(4, 0)));
        assert_eq!(
            content.images.get(&Name::from("Im1")),
            Some(&Reference::new(5, 0))
        );
    }

    #[test]
    fn content_stream_raw_operator() {
        let mut content = ContentStream::new();
        content.push("d", [Object::from(crate::object::Array::from_iter([3, 2])), 0.into()]);
        assert_eq!(text(&content), "[ 3 2 ] 0 d\n");
    }
}
