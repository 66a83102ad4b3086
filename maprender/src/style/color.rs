//! CSS-style colour parsing.

use std::fmt;
use std::str::FromStr;

use crate::error::MapError;

/// Straight (non-premultiplied) RGBA colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

const NAMED: &[(&str, Color)] = &[
    ("black", Color::rgb(0, 0, 0)),
    ("white", Color::rgb(255, 255, 255)),
    ("red", Color::rgb(255, 0, 0)),
    ("green", Color::rgb(0, 128, 0)),
    ("lime", Color::rgb(0, 255, 0)),
    ("blue", Color::rgb(0, 0, 255)),
    ("yellow", Color::rgb(255, 255, 0)),
    ("orange", Color::rgb(255, 165, 0)),
    ("purple", Color::rgb(128, 0, 128)),
    ("gray", Color::rgb(128, 128, 128)),
    ("grey", Color::rgb(128, 128, 128)),
    ("silver", Color::rgb(192, 192, 192)),
    ("steelblue", Color::rgb(70, 130, 180)),
    ("transparent", Color::rgba(0, 0, 0, 0)),
];

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Returns this colour with its alpha multiplied by `opacity` (0..=1).
    pub fn with_opacity(self, opacity: f32) -> Self {
        let a = (self.a as f32 * opacity.clamp(0.0, 1.0)).round() as u8;
        Self { a, ..self }
    }

    pub fn to_skia(self) -> tiny_skia::Color {
        tiny_skia::Color::from_rgba8(self.r, self.g, self.b, self.a)
    }

    /// `#rrggbb`, used by document writers alongside a separate opacity.
    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    pub fn opacity(self) -> f32 {
        self.a as f32 / 255.0
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.a == 255 {
            f.write_str(&self.to_hex())
        } else {
            write!(
                f,
                "rgba({},{},{},{})",
                self.r,
                self.g,
                self.b,
                (self.opacity() * 1000.0).round() / 1000.0
            )
        }
    }
}

impl FromStr for Color {
    type Err = MapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let text = s.trim().to_ascii_lowercase();
        let invalid = || MapError::Config(format!("failed to parse color: \"{}\"", s));

        if let Some(hex) = text.strip_prefix('#') {
            return parse_hex(hex).ok_or_else(invalid);
        }

        if let Some(args) = text
            .strip_prefix("rgba(")
            .or_else(|| text.strip_prefix("rgb("))
            .and_then(|rest| rest.strip_suffix(')'))
        {
            let parts: Vec<&str> = args.split(',').map(str::trim).collect();
            let channel = |p: &str| p.parse::<u8>().ok();
            return match parts.as_slice() {
                [r, g, b] => Some(Color::rgb(
                    channel(*r).ok_or_else(invalid)?,
                    channel(*g).ok_or_else(invalid)?,
                    channel(*b).ok_or_else(invalid)?,
                )),
                [r, g, b, a] => {
                    let alpha = a.parse::<f32>().map_err(|_| invalid())?;
                    Some(Color::rgba(
                        channel(*r).ok_or_else(invalid)?,
                        channel(*g).ok_or_else(invalid)?,
                        channel(*b).ok_or_else(invalid)?,
                        (alpha.clamp(0.0, 1.0) * 255.0).round() as u8,
                    ))
                }
                _ => None,
            }
            .ok_or_else(invalid);
        }

        NAMED
            .iter()
            .find(|(name, _)| *name == text)
            .map(|(_, c)| *c)
            .ok_or_else(invalid)
    }
}

fn parse_hex(hex: &str) -> Option<Color> {
    let digit = |i: usize| u8::from_str_radix(hex.get(i..i + 1)?, 16).ok();
    let pair = |i: usize| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok();
    match hex.len() {
        3 => Some(Color::rgb(
            digit(0)? * 17,
            digit(1)? * 17,
            digit(2)? * 17,
        )),
        6 => Some(Color::rgb(pair(0)?, pair(2)?, pair(4)?)),
        8 => Some(Color::rgba(pair(0)?, pair(2)?, pair(4)?, pair(6)?)),
        _ => None,
    }
}
