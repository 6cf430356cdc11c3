use ::thiserror::Error;

#[derive(Debug, Error, PartialEq, Clone)]
pub enum CMapErr {
    /// Neither a BMP code point nor one that UTF-16 can encode as a surrogate
    /// pair
    #[error("0x{0:X} is not a valid UTF-8 or UTF-16 code point")]
    InvalidCodePoint(u32),
}
