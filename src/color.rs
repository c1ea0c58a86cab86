use palette::{Mix, Srgba};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// RGBA color with float components in 0.0..=1.0.
///
/// Config files and gradient stops use CSS-like string forms: `"#42b6ff"`,
/// `"#42b6ff80"`, `"rgba(100, 100, 100, 0.5)"`, `"rgb(255, 255, 255)"` or
/// `"transparent"`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgba {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Rgba {
    pub const TRANSPARENT: Rgba = Rgba { r: 0.0, g: 0.0, b: 0.0, a: 0.0 };
    pub const WHITE: Rgba = Rgba { r: 1.0, g: 1.0, b: 1.0, a: 1.0 };

    pub fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub fn from_rgb8(r: u8, g: u8, b: u8) -> Self {
        Self::new(r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0, 1.0)
    }

    /// Parse from hex string like "#42b6ff" or "#42b6ff80" (leading '#' optional)
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.trim_start_matches('#');
        if hex.len() != 6 && hex.len() != 8 {
            return None;
        }
        let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
        let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
        let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
        let a = if hex.len() == 8 {
            u8::from_str_radix(&hex[6..8], 16).ok()? as f32 / 255.0
        } else {
            1.0
        };
        Some(Self::new(r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0, a))
    }

    /// Same color with the alpha channel replaced.
    pub fn with_opacity(self, a: f32) -> Self {
        Self { a, ..self }
    }

    /// Interpolate in linear light so gradient midpoints don't go muddy.
    pub fn lerp(self, other: Rgba, t: f32) -> Rgba {
        let t = t.clamp(0.0, 1.0);
        let a = Srgba::new(self.r, self.g, self.b, self.a).into_linear();
        let b = Srgba::new(other.r, other.g, other.b, other.a).into_linear();
        let mixed = Srgba::from_linear(a.mix(b, t));
        Rgba::new(mixed.red, mixed.green, mixed.blue, mixed.alpha)
    }

    pub fn to_rgb8(self) -> (u8, u8, u8) {
        (
            (self.r.clamp(0.0, 1.0) * 255.0).round() as u8,
            (self.g.clamp(0.0, 1.0) * 255.0).round() as u8,
            (self.b.clamp(0.0, 1.0) * 255.0).round() as u8,
        )
    }

    /// Composite over an opaque black background, as a terminal cell color.
    pub fn over_black(self) -> (u8, u8, u8) {
        let a = self.a.clamp(0.0, 1.0);
        Rgba::new(self.r * a, self.g * a, self.b * a, 1.0).to_rgb8()
    }
}

impl FromStr for Rgba {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("transparent") {
            return Ok(Rgba::TRANSPARENT);
        }
        if s.starts_with('#') {
            return Rgba::from_hex(s).ok_or_else(|| format!("Invalid hex color: {}", s));
        }
        let (body, has_alpha) = if let Some(rest) = s.strip_prefix("rgba(") {
            (rest.strip_suffix(')'), true)
        } else if let Some(rest) = s.strip_prefix("rgb(") {
            (rest.strip_suffix(')'), false)
        } else {
            (None, false)
        };
        let body = body.ok_or_else(|| format!("Invalid color: {}", s))?;
        let parts: Vec<&str> = body.split(',').map(str::trim).collect();
        let expected = if has_alpha { 4 } else { 3 };
        if parts.len() != expected {
            return Err(format!("Invalid color: {}", s));
        }
        let channel = |p: &str| -> Result<f32, String> {
            let v: f32 = p.parse().map_err(|_| format!("Invalid color channel: {}", p))?;
            Ok((v / 255.0).clamp(0.0, 1.0))
        };
        let r = channel(parts[0])?;
        let g = channel(parts[1])?;
        let b = channel(parts[2])?;
        let a = if has_alpha {
            let v: f32 = parts[3]
                .parse()
                .map_err(|_| format!("Invalid alpha: {}", parts[3]))?;
            v.clamp(0.0, 1.0)
        } else {
            1.0
        };
        Ok(Rgba::new(r, g, b, a))
    }
}

impl fmt::Display for Rgba {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (r, g, b) = self.to_rgb8();
        if self.a >= 1.0 {
            write!(f, "#{:02x}{:02x}{:02x}", r, g, b)
        } else {
            write!(f, "rgba({}, {}, {}, {})", r, g, b, self.a)
        }
    }
}

impl Serialize for Rgba {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Rgba {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Rgba::from_str(&s).map_err(serde::de::Error::custom)
    }
}
