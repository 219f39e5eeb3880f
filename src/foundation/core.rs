use crate::foundation::error::{VersecastError, VersecastResult};
use serde::{Deserialize, Serialize};

/// Output canvas dimensions in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Canvas {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Canvas {
    /// 9:16 full-HD vertical canvas.
    pub const VERTICAL_HD: Self = Self {
        width: 1080,
        height: 1920,
    };

    /// Validate dimensions for yuv420p MP4 output.
    pub fn validate(self) -> VersecastResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(VersecastError::validation(
                "canvas width/height must be non-zero",
            ));
        }
        if self.width > u32::from(u16::MAX) || self.height > u32::from(u16::MAX) {
            return Err(VersecastError::validation(
                "canvas width/height must fit in 16 bits",
            ));
        }
        if !self.width.is_multiple_of(2) || !self.height.is_multiple_of(2) {
            return Err(VersecastError::validation(
                "canvas width/height must be even (required for yuv420p mp4 output)",
            ));
        }
        Ok(())
    }
}

impl Default for Canvas {
    fn default() -> Self {
        Self::VERTICAL_HD
    }
}

/// Margins kept free of content so social-app overlays do not cover text.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SafeArea {
    /// Top margin in pixels.
    pub top: u32,
    /// Left margin in pixels.
    pub left: u32,
    /// Right margin in pixels.
    pub right: u32,
    /// Bottom margin in pixels.
    pub bottom: u32,
}

impl SafeArea {
    /// Social-app safe margins measured on an 850x1512 reference frame, scaled to `canvas`.
    pub fn social(canvas: Canvas) -> Self {
        fn scale(len: u32, num: u32, den: u32) -> u32 {
            (f64::from(len) * f64::from(num) / f64::from(den)).round() as u32
        }

        Self {
            top: scale(canvas.height, 108, 1512),
            left: scale(canvas.width, 60, 850),
            right: scale(canvas.width, 120, 850),
            bottom: scale(canvas.height, 320, 1512),
        }
    }
}

impl Default for SafeArea {
    fn default() -> Self {
        Self::social(Canvas::default())
    }
}

/// Straight-alpha RGBA8 colour, written as `#RRGGBB` or `#RRGGBBAA` in configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rgba8 {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
    /// Alpha channel.
    pub a: u8,
}

impl Rgba8 {
    /// Opaque colour from its channels.
    pub const fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Parse `#RRGGBB` / `#RRGGBBAA` (case-insensitive, `#` optional).
    pub fn parse_hex(s: &str) -> VersecastResult<Self> {
        let s = s.trim();
        let s = s.strip_prefix('#').unwrap_or(s);

        fn hex_byte(pair: &str) -> VersecastResult<u8> {
            u8::from_str_radix(pair, 16)
                .map_err(|_| VersecastError::validation(format!("invalid hex byte \"{pair}\"")))
        }

        if !s.is_ascii() {
            return Err(VersecastError::validation("hex color must be ASCII"));
        }
        match s.len() {
            6 => Ok(Self::opaque(
                hex_byte(&s[0..2])?,
                hex_byte(&s[2..4])?,
                hex_byte(&s[4..6])?,
            )),
            8 => Ok(Self {
                r: hex_byte(&s[0..2])?,
                g: hex_byte(&s[2..4])?,
                b: hex_byte(&s[4..6])?,
                a: hex_byte(&s[6..8])?,
            }),
            _ => Err(VersecastError::validation(
                "hex color must be #RRGGBB or #RRGGBBAA (case-insensitive)",
            )),
        }
    }

    /// Format as `#RRGGBB`, or `#RRGGBBAA` when not opaque.
    pub fn to_hex(self) -> String {
        if self.a == 255 {
            format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
        } else {
            format!("#{:02X}{:02X}{:02X}{:02X}", self.r, self.g, self.b, self.a)
        }
    }
}

impl Serialize for Rgba8 {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Rgba8 {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::parse_hex(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
