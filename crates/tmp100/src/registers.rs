use core::fmt::Write;
use core::str::FromStr;

use byteorder::{BigEndian, ByteOrder};
use heapless::String;

use crate::errors::ParseTemperatureError;

/// Longest rendered reading, `"-128.9\n"`, rounded up.
pub const RENDERED_MAX: usize = 8;

/// Register pointer values.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Register {
    /// Read-only temperature result.
    Temperature = 0x00,
}

impl Register {
    pub const fn addr(self) -> u8 {
        self as u8
    }
}

/// A temperature register word as sent on the wire (MSB first).
///
/// Bits 15..8: integer degrees, two's complement.
/// Bits 7..4: sixteenths of a degree.
/// Bits 3..0: reserved.
///
/// This is not the layout `i2c_smbus_read_word_data` returns: SMBus words are
/// little-endian, so the integer byte lands in bits 7..0 there. Swap such a
/// word with [`u16::swap_bytes`] before wrapping it.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RawReading(pub u16);

impl RawReading {
    pub fn from_be_bytes(bytes: [u8; 2]) -> Self {
        Self(BigEndian::read_u16(&bytes))
    }

    pub const fn bits(self) -> u16 {
        self.0
    }

    pub const fn integer_byte(self) -> u8 {
        (self.0 >> 8) as u8
    }

    /// The 4-bit fractional field, in sixteenths of a degree.
    pub const fn fraction_nibble(self) -> u8 {
        ((self.0 >> 4) & 0xF) as u8
    }

    /// Sign-extend the integer byte and scale the fractional field to one
    /// decimal digit, truncating.
    pub const fn decode(self) -> DecodedTemperature {
        DecodedTemperature {
            integer_part: self.integer_byte() as i8,
            fraction_digit: (self.fraction_nibble() * 10) >> 4,
        }
    }
}

impl From<u16> for RawReading {
    fn from(bits: u16) -> Self {
        Self(bits)
    }
}

/// A reading split into whole degrees and tenths.
///
/// The two fields are rendered side by side: `integer_part = -4`,
/// `fraction_digit = 2` is shown as `-4.2`.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DecodedTemperature {
    pub integer_part: i8,
    /// Tenths of a degree, `0..=9`.
    pub fraction_digit: u8,
}

impl DecodedTemperature {
    /// Text served by the device node: `"<integer>.<digit>\n"`.
    pub fn render(&self) -> String<RENDERED_MAX> {
        let mut text = String::new();
        // At most 7 bytes, always fits.
        let _ = writeln!(text, "{}", self);
        text
    }
}

impl core::fmt::Display for DecodedTemperature {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}.{}", self.integer_part, self.fraction_digit)
    }
}

impl FromStr for DecodedTemperature {
    type Err = ParseTemperatureError;

    /// Parse the rendered form, with or without the trailing newline.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.strip_suffix('\n').unwrap_or(s);
        let (integer, fraction) =
            s.split_once('.').ok_or(ParseTemperatureError::MissingPoint)?;

        let integer_part = integer.parse::<i8>()?;
        let fraction_digit = match fraction.as_bytes() {
            [digit @ b'0'..=b'9'] => digit - b'0',
            _ => return Err(ParseTemperatureError::InvalidDigit),
        };

        Ok(Self { integer_part, fraction_digit })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sign_extend8(byte: u8) -> i8 {
        byte as i8
    }

    #[test]
    fn decode_matches_formula_for_every_word() {
        for bits in 0..=u16::MAX {
            let raw = RawReading(bits);
            let decoded = raw.decode();
            assert_eq!(decoded.integer_part, sign_extend8((bits >> 8) as u8));
            assert_eq!(
                decoded.fraction_digit as u16,
                ((bits >> 4) & 0xF) * 10 >> 4
            );
            assert!(decoded.fraction_digit <= 9);
        }
    }

    #[test]
    fn render_has_one_point_and_trailing_newline() {
        for bits in (0..=u16::MAX).step_by(7) {
            let text = RawReading(bits).decode().render();
            assert!(text.ends_with('\n'));
            assert_eq!(text.matches('.').count(), 1);
        }
    }

    #[test]
    fn positive_reading() {
        let decoded = RawReading(0x17E0).decode();
        assert_eq!(
            decoded,
            DecodedTemperature { integer_part: 23, fraction_digit: 8 }
        );
        assert_eq!(decoded.render().as_str(), "23.8\n");
    }

    #[test]
    fn negative_readings() {
        assert_eq!(RawReading(0xFC00).decode().render().as_str(), "-4.0\n");
        assert_eq!(RawReading(0xF800).decode().integer_part, -8);
        assert_eq!(RawReading(0x8000).decode().render().as_str(), "-128.0\n");
        assert_eq!(RawReading(0x80F0).decode().render().as_str(), "-128.9\n");
    }

    #[test]
    fn fraction_truncates() {
        // 15/16 = 0.9375
        assert_eq!(RawReading(0x00F0).decode().fraction_digit, 9);
        // 1/16 = 0.0625
        assert_eq!(RawReading(0x0010).decode().fraction_digit, 0);
        // 8/16 = 0.5
        assert_eq!(RawReading(0x0080).decode().fraction_digit, 5);
        // Reserved bits are ignored.
        assert_eq!(RawReading(0x190F).decode(), RawReading(0x1900).decode());
    }

    #[test]
    fn from_be_bytes_puts_first_byte_high() {
        assert_eq!(RawReading::from_be_bytes([0x17, 0xE0]), RawReading(0x17E0));
    }

    #[test]
    fn smbus_word_is_byte_swapped() {
        // SMBus puts the first wire byte in the low half.
        let smbus_word: u16 = 0xE017;
        let raw = RawReading(smbus_word.swap_bytes());
        assert_eq!(raw.decode().render().as_str(), "23.8\n");
        assert_eq!(RawReading(smbus_word).decode().integer_part, -32);
    }

    #[test]
    fn parse_rendered_text() {
        let decoded: DecodedTemperature = "-4.2\n".parse().unwrap();
        assert_eq!(
            decoded,
            DecodedTemperature { integer_part: -4, fraction_digit: 2 }
        );
        let decoded: DecodedTemperature = "23.8".parse().unwrap();
        assert_eq!(decoded.integer_part, 23);

        assert_eq!(
            "23".parse::<DecodedTemperature>(),
            Err(ParseTemperatureError::MissingPoint)
        );
        assert_eq!(
            "23.75".parse::<DecodedTemperature>(),
            Err(ParseTemperatureError::InvalidDigit)
        );
        assert!(matches!(
            "300.1".parse::<DecodedTemperature>(),
            Err(ParseTemperatureError::Integer(_))
        ));
    }
}
