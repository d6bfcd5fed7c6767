//! Seven-segment rendering of temperature readings.

pub mod tm1638;

use crate::thermometer::{Reading, Tenths, Unit};

/// Number of digits on the display
pub const DIGITS: usize = 8;

/// Digits given to each unit when showing a reading
pub const HALF: usize = DIGITS / 2;

/// Segment pattern of a single digit. Bits 0-6 are segments a-g, bit 7 is the decimal point.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(transparent)]
pub struct Glyph(pub u8);

/// Glyphs for `0`-`9`, then `0.`-`9.` at [`POINT_OFFSET`], then [`MINUS`] and [`BLANK`].
pub const GLYPHS: [Glyph; 22] = [
    Glyph(0x3F), // 0
    Glyph(0x06), // 1
    Glyph(0x5B), // 2
    Glyph(0x4F), // 3
    Glyph(0x66), // 4
    Glyph(0x6D), // 5
    Glyph(0x7D), // 6
    Glyph(0x07), // 7
    Glyph(0x7F), // 8
    Glyph(0x6F), // 9
    Glyph(0xBF), // 0.
    Glyph(0x86), // 1.
    Glyph(0xDB), // 2.
    Glyph(0xCF), // 3.
    Glyph(0xE6), // 4.
    Glyph(0xED), // 5.
    Glyph(0xFD), // 6.
    Glyph(0x87), // 7.
    Glyph(0xFF), // 8.
    Glyph(0xEF), // 9.
    Glyph(0x40), // -
    Glyph(0x00), // blank
];

pub const POINT_OFFSET: usize = 10;
pub const MINUS: usize = 20;
pub const BLANK: usize = 21;

static_assertions::assert_eq_size!(Glyph, u8);
static_assertions::assert_eq_size!(DigitSequence, u64);

impl Glyph {
    pub const MINUS: Self = GLYPHS[MINUS];
    pub const BLANK: Self = GLYPHS[BLANK];

    /// # Panics
    /// If `digit` is not a decimal digit.
    pub const fn digit(digit: u8) -> Self {
        GLYPHS[digit as usize]
    }

    /// # Panics
    /// If `digit` is not a decimal digit.
    pub const fn digit_with_point(digit: u8) -> Self {
        GLYPHS[digit as usize + POINT_OFFSET]
    }

    pub const fn bits(self) -> u8 {
        self.0
    }
}

/// Display contents, least significant digit first
pub type DigitSequence = [Glyph; DIGITS];

/// Something that shows glyphs, such as a display driver.
pub trait DisplaySink {
    type Error;

    /// Show `glyph` at `position`. Position 0 is the rightmost digit.
    fn put(&mut self, position: u8, glyph: Glyph) -> Result<(), Self::Error>;
}

/// Packs the decimal digits of `n` into nibbles, least significant digit in the lowest nibble.
pub fn to_bcd(n: u16) -> u32 {
    let mut n = n;
    let mut bcd = 0u32;
    let mut shift = 0;
    while n != 0 {
        bcd |= u32::from(n % 10) << shift;
        n /= 10;
        shift += 4;
    }
    bcd
}

/// Renders a sign and magnitude as glyphs.
///
/// `decimals` is the number of digits after the decimal point, 0 for none. Leading zeros are blanked
/// down to the first significant digit or the digit carrying the point, whichever is higher, but the
/// rightmost digit always stays. The minus sign goes right above the highest digit shown.
///
/// # Panics
/// If `negative` is set and the digits shown already fill the display, which takes `decimals` of 7.
pub fn encode(magnitude: u16, negative: bool, decimals: u8) -> DigitSequence {
    let mut bcd = to_bcd(magnitude);
    let point = usize::from(decimals);

    let mut glyphs = [Glyph::BLANK; DIGITS];
    for (i, glyph) in glyphs.iter_mut().enumerate() {
        let digit = (bcd & 0x0F) as usize;
        *glyph = if point != 0 && i == point {
            GLYPHS[digit + POINT_OFFSET]
        } else {
            GLYPHS[digit]
        };
        bcd >>= 4;
    }

    // Blank leading zeros. A zero with a point doesn't match, so it stops the scan.
    let mut first = 0;
    for i in (1..DIGITS).rev() {
        if glyphs[i] == Glyph::digit(0) {
            glyphs[i] = Glyph::BLANK;
        } else {
            first = i;
            break;
        }
    }

    if negative {
        glyphs[first + 1] = Glyph::MINUS;
    }

    glyphs
}

/// Shows a reading in Celsius on positions 0-3 and in Fahrenheit on positions 4-7.
pub fn show_reading<S: DisplaySink>(sink: &mut S, reading: Reading, decimals: u8) -> Result<(), S::Error> {
    for (unit, offset) in [(Unit::Celsius, 0), (Unit::Fahrenheit, HALF)] {
        let Tenths { magnitude, negative } = reading.tenths(unit);
        let glyphs = encode(magnitude, negative, decimals);
        for (i, glyph) in glyphs[..HALF].iter().enumerate() {
            sink.put((offset + i) as u8, *glyph)?;
        }
    }
    Ok(())
}
