//! Color ramp for choropleth maps.

use std::fmt;

/// Simple RGB color.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Rgb {
    pub(crate) r: u8,
    pub(crate) g: u8,
    pub(crate) b: u8,
}

impl fmt::Display for Rgb {
    /// Format as a CSS hex color.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// Fill for records without a value.
pub(crate) const MISSING: Rgb = Rgb { r: 0xbd, g: 0xbd, b: 0xbd };

// Light (#deebf7) → dark (#08519c) blue.
const LOW: Rgb = Rgb { r: 0xde, g: 0xeb, b: 0xf7 };
const HIGH: Rgb = Rgb { r: 0x08, g: 0x51, b: 0x9c };

fn lerp(a: u8, b: u8, t: f64) -> u8 {
    (a as f64 + (b as f64 - a as f64) * t)
        .round()
        .clamp(0.0, 255.0) as u8
}

/// Color of `t` in [0, 1] on the ramp.
pub(crate) fn ramp(t: f64) -> Rgb {
    let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 0.0 };
    Rgb { r: lerp(LOW.r, HIGH.r, t), g: lerp(LOW.g, HIGH.g, t), b: lerp(LOW.b, HIGH.b, t) }
}

/// One color per value, scaled over the min–max range of the non-null values.
pub(crate) fn fill_colors(values: &[Option<f64>]) -> Vec<Rgb> {
    let finite = || values.iter().flatten().copied().filter(|v| v.is_finite());
    let (Some(min), Some(max)) = (finite().reduce(f64::min), finite().reduce(f64::max)) else {
        return vec![MISSING; values.len()];
    };
    let range = if max > min { max - min } else { 1.0 };

    values.iter()
        .map(|value| match value {
            Some(v) if v.is_finite() => ramp((v - min) / range),
            _ => MISSING,
        })
        .collect()
}
