//! The 16-color palette and the two native attribute encodings.
//!
//! [`Color`] is the public enumeration callers pass around. Its numeric
//! values are fixed: callers cast to and from integers, so the order must
//! never change. Values 0-7 are base hues; 8-15 are the same hues with the
//! bright modifier.

use std::fmt;

use crate::error::ConioError;

/// A color from the classic 16-color console palette.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Color {
    Black = 0,
    Blue = 1,
    Green = 2,
    Cyan = 3,
    Red = 4,
    Magenta = 5,
    Yellow = 6,
    White = 7,
    BrightBlack = 8,
    BrightBlue = 9,
    BrightGreen = 10,
    BrightCyan = 11,
    BrightRed = 12,
    BrightMagenta = 13,
    BrightYellow = 14,
    BrightWhite = 15,
}

impl Color {
    /// All sixteen colors in numeric order.
    pub const ALL: [Color; 16] = [
        Color::Black,
        Color::Blue,
        Color::Green,
        Color::Cyan,
        Color::Red,
        Color::Magenta,
        Color::Yellow,
        Color::White,
        Color::BrightBlack,
        Color::BrightBlue,
        Color::BrightGreen,
        Color::BrightCyan,
        Color::BrightRed,
        Color::BrightMagenta,
        Color::BrightYellow,
        Color::BrightWhite,
    ];

    /// Look up a color by its numeric value.
    pub fn from_index(index: u8) -> Option<Self> {
        Self::ALL.get(index as usize).copied()
    }

    /// Numeric value in `0..=15`.
    pub const fn index(self) -> u8 {
        self as u8
    }

    /// The hue without the bright modifier.
    pub fn base(self) -> BaseColor {
        BaseColor::ALL[(self.index() % 8) as usize]
    }

    /// Whether this is one of the bright variants (8-15).
    pub const fn is_bright(self) -> bool {
        self.index() >= 8
    }

    /// Inverse of ([`base`](Self::base), [`is_bright`](Self::is_bright)).
    pub fn compose(base: BaseColor, bright: bool) -> Self {
        let offset = if bright { 8 } else { 0 };
        Self::ALL[(base.index() + offset) as usize]
    }

    /// Lowercase display name, e.g. `bright-red`.
    pub fn name(self) -> &'static str {
        match self {
            Color::Black => "black",
            Color::Blue => "blue",
            Color::Green => "green",
            Color::Cyan => "cyan",
            Color::Red => "red",
            Color::Magenta => "magenta",
            Color::Yellow => "yellow",
            Color::White => "white",
            Color::BrightBlack => "bright-black",
            Color::BrightBlue => "bright-blue",
            Color::BrightGreen => "bright-green",
            Color::BrightCyan => "bright-cyan",
            Color::BrightRed => "bright-red",
            Color::BrightMagenta => "bright-magenta",
            Color::BrightYellow => "bright-yellow",
            Color::BrightWhite => "bright-white",
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl From<Color> for u8 {
    fn from(color: Color) -> u8 {
        color.index()
    }
}

impl TryFrom<u8> for Color {
    type Error = ConioError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Color::from_index(value).ok_or_else(|| {
            ConioError::InvalidArgument(format!("color index {} outside 0..=15", value))
        })
    }
}

impl TryFrom<i32> for Color {
    type Error = ConioError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        u8::try_from(value)
            .ok()
            .and_then(Color::from_index)
            .ok_or_else(|| {
                ConioError::InvalidArgument(format!("color index {} outside 0..=15", value))
            })
    }
}

/// One of the eight base hues, in palette order.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BaseColor {
    Black = 0,
    Blue = 1,
    Green = 2,
    Cyan = 3,
    Red = 4,
    Magenta = 5,
    Yellow = 6,
    White = 7,
}

impl BaseColor {
    pub const ALL: [BaseColor; 8] = [
        BaseColor::Black,
        BaseColor::Blue,
        BaseColor::Green,
        BaseColor::Cyan,
        BaseColor::Red,
        BaseColor::Magenta,
        BaseColor::Yellow,
        BaseColor::White,
    ];

    pub const fn index(self) -> u8 {
        self as u8
    }

    /// Index in ANSI/curses order (black, red, green, yellow, blue,
    /// magenta, cyan, white). The palette order swaps red/blue and
    /// yellow/cyan relative to it.
    pub const fn ansi_index(self) -> u8 {
        match self {
            BaseColor::Black => 0,
            BaseColor::Red => 1,
            BaseColor::Green => 2,
            BaseColor::Yellow => 3,
            BaseColor::Blue => 4,
            BaseColor::Magenta => 5,
            BaseColor::Cyan => 6,
            BaseColor::White => 7,
        }
    }

    /// Convert to crossterm's named dark color
    pub fn to_crossterm(self) -> crossterm::style::Color {
        use crossterm::style::Color as C;
        match self {
            BaseColor::Black => C::Black,
            BaseColor::Blue => C::DarkBlue,
            BaseColor::Green => C::DarkGreen,
            BaseColor::Cyan => C::DarkCyan,
            BaseColor::Red => C::DarkRed,
            BaseColor::Magenta => C::DarkMagenta,
            BaseColor::Yellow => C::DarkYellow,
            BaseColor::White => C::Grey,
        }
    }
}

impl From<BaseColor> for Color {
    fn from(base: BaseColor) -> Self {
        Color::compose(base, false)
    }
}

/// The active foreground/background combination.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct AttributePair {
    pub fg: Color,
    pub bg: Color,
}

impl AttributePair {
    /// Light grey on black, the console's normal rendition.
    pub const DEFAULT: AttributePair = AttributePair {
        fg: Color::White,
        bg: Color::Black,
    };

    pub const fn new(fg: Color, bg: Color) -> Self {
        Self { fg, bg }
    }

    /// Same background, different foreground.
    pub const fn with_fg(self, fg: Color) -> Self {
        Self { fg, bg: self.bg }
    }

    /// Same foreground, different background.
    pub const fn with_bg(self, bg: Color) -> Self {
        Self { fg: self.fg, bg }
    }
}

impl Default for AttributePair {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Console attribute byte: foreground in the low nibble, background in the
/// high nibble. Bit 3 of each nibble is the intensity bit, which is exactly
/// the palette's bright modifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PackedAttr(pub u8);

impl PackedAttr {
    /// Light grey on black (`0x07`).
    pub const NORMAL: PackedAttr = PackedAttr(0x07);

    pub const FG_MASK: u8 = 0x0F;
    pub const BG_MASK: u8 = 0xF0;

    pub const fn pack(pair: AttributePair) -> Self {
        PackedAttr(pair.fg.index() | (pair.bg.index() << 4))
    }

    pub fn unpack(self) -> AttributePair {
        AttributePair {
            fg: Color::ALL[(self.0 & Self::FG_MASK) as usize],
            bg: Color::ALL[(self.0 >> 4) as usize],
        }
    }

    /// Replace the foreground nibble, keeping the background bits.
    pub const fn with_fg(self, fg: Color) -> Self {
        PackedAttr((self.0 & Self::BG_MASK) | fg.index())
    }

    /// Replace the background nibble, keeping the foreground bits.
    pub const fn with_bg(self, bg: Color) -> Self {
        PackedAttr((self.0 & Self::FG_MASK) | (bg.index() << 4))
    }

    /// Widen to the 16-bit console attribute word.
    pub const fn word(self) -> u16 {
        self.0 as u16
    }

    /// Take the color bits of a 16-bit console attribute word.
    pub const fn from_word(word: u16) -> Self {
        PackedAttr((word & 0xFF) as u8)
    }
}

impl From<AttributePair> for PackedAttr {
    fn from(pair: AttributePair) -> Self {
        PackedAttr::pack(pair)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_published_order() {
        assert_eq!(Color::Black as u8, 0);
        assert_eq!(Color::Blue as u8, 1);
        assert_eq!(Color::Cyan as u8, 3);
        assert_eq!(Color::Red as u8, 4);
        assert_eq!(Color::Yellow as u8, 6);
        assert_eq!(Color::White as u8, 7);
        assert_eq!(Color::BrightBlack as u8, 8);
        assert_eq!(Color::BrightRed as u8, 12);
        assert_eq!(Color::BrightWhite as u8, 15);
        for (i, color) in Color::ALL.iter().enumerate() {
            assert_eq!(color.index() as usize, i);
        }
    }

    #[test]
    fn test_decompose_recompose() {
        for v in 0u8..16 {
            let color = Color::from_index(v).unwrap();
            assert_eq!(color.base().index(), v % 8);
            assert_eq!(color.is_bright(), v >= 8);
            assert_eq!(Color::compose(color.base(), color.is_bright()), color);
        }
    }

    #[test]
    fn test_out_of_range() {
        assert!(Color::from_index(16).is_none());
        assert!(matches!(
            Color::try_from(16u8),
            Err(ConioError::InvalidArgument(_))
        ));
        assert!(Color::try_from(-1i32).is_err());
        assert!(Color::try_from(300i32).is_err());
        assert_eq!(Color::try_from(12i32).unwrap(), Color::BrightRed);
    }

    #[test]
    fn test_ansi_order() {
        assert_eq!(BaseColor::Blue.ansi_index(), 4);
        assert_eq!(BaseColor::Red.ansi_index(), 1);
        assert_eq!(BaseColor::Cyan.ansi_index(), 6);
        assert_eq!(BaseColor::Yellow.ansi_index(), 3);
        assert_eq!(BaseColor::Green.ansi_index(), 2);
    }

    #[test]
    fn test_packed_nibbles() {
        let attr = PackedAttr::pack(AttributePair::new(Color::BrightYellow, Color::Blue));
        assert_eq!(attr.0, 0x1E);
        assert_eq!(
            attr.unpack(),
            AttributePair::new(Color::BrightYellow, Color::Blue)
        );

        // Changing one half leaves the other untouched.
        assert_eq!(attr.with_fg(Color::Red).0, 0x14);
        assert_eq!(attr.with_bg(Color::BrightWhite).0, 0xFE);
        assert_eq!(PackedAttr::NORMAL.unpack(), AttributePair::DEFAULT);
    }

    #[test]
    fn test_word_roundtrip_drops_high_bits() {
        assert_eq!(PackedAttr::from_word(0x8047), PackedAttr(0x47));
        assert_eq!(PackedAttr(0x47).word(), 0x0047);
    }

    #[test]
    fn test_display() {
        assert_eq!(Color::BrightMagenta.to_string(), "bright-magenta");
        assert_eq!(Color::from(BaseColor::Cyan), Color::Cyan);
    }
}
